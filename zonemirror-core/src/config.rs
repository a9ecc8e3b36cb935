//! YAML configuration: model, loading, validation.
//!
//! # File layout
//!
//! ```yaml
//! default:
//!   destdir: /var/named/zones
//!   workdir: /var/lib/zonemirror
//!   extradir: /etc/zonemirror/extra   # optional
//!   fileencoding: utf-8               # optional, utf-8 | latin-1
//!   postcommand: ["rndc", "reload"]   # optional
//! mreg:
//!   url: https://mreg.example.org
//!   user: zonetransfer
//!   password: hunter2
//! zones:
//!   example.org:                      # null -> filename is the zone name
//!   0.192.in-addr.arpa: db.192.0      # explicit local filename
//! ```
//!
//! All three top-level sections are required; a missing one is reported as
//! [`ConfigError::MissingSection`] rather than a generic parse error. Zones
//! are kept in a `BTreeMap` so every run processes them in the same order.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, EncodeError};

// ---------------------------------------------------------------------------
// 1. Model
// ---------------------------------------------------------------------------

/// The `default` section: local filesystem layout and output behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaultSection {
    /// Where finished zonefiles land.
    pub destdir: PathBuf,
    /// Scratch space: state JSON files and the lockfile.
    pub workdir: PathBuf,
    /// Directory holding `<filename>_extra` suffix files. Absent disables
    /// extra data entirely.
    #[serde(default)]
    pub extradir: Option<PathBuf>,
    /// Byte encoding applied when writing text artifacts.
    #[serde(default)]
    pub fileencoding: FileEncoding,
    /// Argument vector run after a pass that updated at least one zone.
    /// Absent disables the hook.
    #[serde(default)]
    pub postcommand: Option<Vec<String>>,
}

/// The `mreg` section: upstream endpoint and credentials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MregSection {
    pub url: String,
    pub user: String,
    pub password: String,
}

/// Validated configuration. Construct via [`load_config`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub default: DefaultSection,
    pub mreg: MregSection,
    /// Zone name -> optional local filename override. `None` means the file
    /// is named after the zone itself.
    pub zones: BTreeMap<String, Option<String>>,
}

impl Config {
    /// Effective local filename for `zone`: the configured override when one
    /// is set, otherwise the zone name.
    pub fn zone_filename<'a>(&'a self, zone: &'a str) -> &'a str {
        self.zones
            .get(zone)
            .and_then(|o| o.as_deref())
            .unwrap_or(zone)
    }
}

// ---------------------------------------------------------------------------
// 2. File encoding
// ---------------------------------------------------------------------------

/// Output byte encoding for written text artifacts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileEncoding {
    #[default]
    #[serde(rename = "utf-8")]
    Utf8,
    #[serde(rename = "latin-1")]
    Latin1,
}

impl FileEncoding {
    /// Encode `text` into bytes. Latin-1 covers exactly U+0000..=U+00FF;
    /// anything beyond is an [`EncodeError`].
    pub fn encode(&self, text: &str) -> Result<Vec<u8>, EncodeError> {
        match self {
            FileEncoding::Utf8 => Ok(text.as_bytes().to_vec()),
            FileEncoding::Latin1 => {
                let mut out = Vec::with_capacity(text.len());
                for ch in text.chars() {
                    let cp = ch as u32;
                    if cp > 0xFF {
                        return Err(EncodeError { ch, encoding: "latin-1" });
                    }
                    out.push(cp as u8);
                }
                Ok(out)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// 3. Loading
// ---------------------------------------------------------------------------

/// Pre-validation shape: every section optional, so absence can be reported
/// per section instead of as a serde "missing field" at offset zero.
#[derive(Debug, Deserialize)]
struct RawConfig {
    default: Option<DefaultSection>,
    mreg: Option<MregSection>,
    zones: Option<BTreeMap<String, Option<String>>>,
}

impl RawConfig {
    fn validate(self, path: &Path) -> Result<Config, ConfigError> {
        let missing = |section| ConfigError::MissingSection {
            path: path.to_path_buf(),
            section,
        };
        Ok(Config {
            default: self.default.ok_or_else(|| missing("default"))?,
            mreg: self.mreg.ok_or_else(|| missing("mreg"))?,
            zones: self.zones.ok_or_else(|| missing("zones"))?,
        })
    }
}

/// Load and validate the configuration at `path`.
///
/// Returns `ConfigError::NotFound` if absent, `ConfigError::Parse` (with
/// path + line context) if malformed, `ConfigError::MissingSection` if a
/// required top-level section is absent.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    let raw: RawConfig = serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        source: e,
    })?;
    raw.validate(path)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zone_filename_prefers_override() {
        let yaml = "\
default:
  destdir: /dest
  workdir: /work
mreg:
  url: https://mreg.example.org
  user: u
  password: p
zones:
  example.org:
  0.192.in-addr.arpa: db.192.0
";
        let raw: RawConfig = serde_yaml::from_str(yaml).expect("parse");
        let config = raw.validate(Path::new("test.yaml")).expect("validate");
        assert_eq!(config.zone_filename("example.org"), "example.org");
        assert_eq!(config.zone_filename("0.192.in-addr.arpa"), "db.192.0");
    }

    #[test]
    fn optional_default_fields_default_off() {
        let yaml = "\
default:
  destdir: /dest
  workdir: /work
mreg:
  url: https://mreg.example.org
  user: u
  password: p
zones: {}
";
        let raw: RawConfig = serde_yaml::from_str(yaml).expect("parse");
        let config = raw.validate(Path::new("test.yaml")).expect("validate");
        assert_eq!(config.default.extradir, None);
        assert_eq!(config.default.postcommand, None);
        assert_eq!(config.default.fileencoding, FileEncoding::Utf8);
    }

    #[test]
    fn missing_section_is_reported_by_name() {
        let yaml = "\
default:
  destdir: /dest
  workdir: /work
zones: {}
";
        let raw: RawConfig = serde_yaml::from_str(yaml).expect("parse");
        let err = raw.validate(Path::new("test.yaml")).unwrap_err();
        match err {
            ConfigError::MissingSection { section, .. } => assert_eq!(section, "mreg"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn latin1_encodes_high_bytes() {
        let encoded = FileEncoding::Latin1.encode("blåbærsyltetøy").expect("encode");
        assert_eq!(encoded.len(), "blåbærsyltetøy".chars().count());
        assert!(encoded.contains(&0xE5)); // å
    }

    #[test]
    fn latin1_rejects_characters_above_u00ff() {
        let err = FileEncoding::Latin1.encode("snow\u{2603}man").unwrap_err();
        assert_eq!(err.ch, '\u{2603}');
        assert!(err.to_string().contains("latin-1"));
    }

    #[test]
    fn utf8_passes_text_through() {
        assert_eq!(
            FileEncoding::Utf8.encode("zonefile \u{2603}").expect("encode"),
            "zonefile \u{2603}".as_bytes()
        );
    }
}
