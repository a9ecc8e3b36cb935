//! Error types for zonemirror-sync.

use std::path::PathBuf;

use thiserror::Error;

use zonemirror_core::error::EncodeError;
use zonemirror_detector::DetectError;
use zonemirror_mreg::ApiError;

/// All errors that can arise from a mirror pass.
#[derive(Debug, Error)]
pub enum SyncError {
    /// An error from the mreg API client.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// A configured zone does not exist upstream.
    #[error("zone '{zone}' not found upstream")]
    ZoneMissing { zone: String },

    /// A listing endpoint returned an unusable first page.
    #[error("listing {path}: {source}")]
    Listing {
        path: String,
        #[source]
        source: DetectError,
    },

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error (state store).
    #[error("state store JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A text artifact contains characters the configured encoding cannot hold.
    #[error(transparent)]
    Encode(#[from] EncodeError),
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}
