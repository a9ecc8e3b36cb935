//! Mreg API client for zonemirror.
//!
//! [`MregClient`] is the blocking HTTP connection (token auth, DRF
//! pagination); [`ZoneSource`] is the seam the sync engine consumes.

pub mod client;
pub mod error;

pub use client::{MregClient, ZoneSource};
pub use error::ApiError;
