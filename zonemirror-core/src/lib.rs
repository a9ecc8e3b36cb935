//! Shared foundation for the zonemirror crates: the configuration model
//! and the domain types and errors the other crates exchange.
//!
//! Public API surface:
//! - [`types`]: newtypes and upstream payload structs
//! - [`config`]: YAML model + [`load_config`]
//! - [`error`]: [`ConfigError`] and [`EncodeError`]

pub mod config;
pub mod error;
pub mod types;

pub use config::{load_config, Config, DefaultSection, FileEncoding, MregSection};
pub use error::{ConfigError, EncodeError};
pub use types::{ListingPage, ListingRecord, ZoneName, ZoneSummary};
