//! Error types for zonemirror-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from loading and validating the configuration.
///
/// Every variant here maps to the `EX_CONFIG` exit class in the binary.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file did not exist at the expected path.
    #[error("no configuration file at {path}")]
    NotFound { path: PathBuf },

    /// The file exists but could not be read.
    #[error("failed to read configuration at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse error on load; the message carries serde_yaml's line context.
    #[error("failed to parse configuration at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// A required top-level section (`default`, `mreg`, `zones`) was absent.
    #[error("missing section '{section}' in configuration at {path}")]
    MissingSection {
        path: PathBuf,
        section: &'static str,
    },
}

/// A character in the output text has no representation in the configured
/// file encoding.
#[derive(Debug, Error)]
#[error("cannot encode {ch:?} as {encoding}")]
pub struct EncodeError {
    pub ch: char,
    pub encoding: &'static str,
}
