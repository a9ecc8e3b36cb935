//! Error types for the mreg API client.

use thiserror::Error;

/// All errors that can arise from talking to the mreg API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The token endpoint rejected the configured credentials.
    #[error("authentication failed against {url} (HTTP {status})")]
    Auth { url: String, status: u16 },

    /// The API answered with a non-success status.
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// Connection-level failure (DNS, TLS, refused, timed out).
    #[error("transport error for {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: ureq::Transport,
    },

    /// The response body did not match the expected shape.
    #[error("failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// The response body could not be read to completion.
    #[error("failed to read response body from {url}: {source}")]
    Read {
        url: String,
        #[source]
        source: std::io::Error,
    },
}

impl ApiError {
    pub(crate) fn from_ureq(url: &str, err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(status, _) => ApiError::Status {
                url: url.to_string(),
                status,
            },
            ureq::Error::Transport(source) => ApiError::Transport {
                url: url.to_string(),
                source,
            },
        }
    }
}
