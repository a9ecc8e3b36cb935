//! # zonemirror-sync
//!
//! Locked, stateful mirror passes over upstream zonefiles.
//!
//! Call [`run`] to execute one full pass: lock, inventory, per-zone change
//! decisions, staged writes with rotation, state persistence, and the
//! optional postcommand. [`listing_updated`] is the standalone change check
//! for generic listing endpoints.

pub mod error;
pub mod hook;
pub mod lock;
pub mod observe;
pub mod pipeline;
pub mod resource;
pub mod state;
pub mod writer;

pub use error::SyncError;
pub use lock::ProcessLock;
pub use observe::timed;
pub use pipeline::{run, RunOptions, RunOutcome, RunReport};
pub use resource::listing_updated;
pub use writer::{read_extra_data, write_text_artifact, write_zonefile};
