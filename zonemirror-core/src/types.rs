//! Domain types shared across the zonemirror crates.
//!
//! All timestamps are `DateTime<FixedOffset>`: upstream reports RFC 3339
//! with its own UTC offset, and comparisons must stay instant-based rather
//! than assume the mirror host shares that offset. All path fields use
//! `PathBuf`; never `&str` or `String` for filesystem paths.

use std::fmt;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A strongly-typed DNS zone name, e.g. `example.org` or `0.192.in-addr.arpa`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ZoneName(pub String);

impl ZoneName {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is a reverse zone (`.arpa` suffix). Reverse zones live
    /// under a separate listing endpoint upstream.
    pub fn is_reverse(&self) -> bool {
        self.0.ends_with(".arpa")
    }
}

impl fmt::Display for ZoneName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for ZoneName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ZoneName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Zone metadata
// ---------------------------------------------------------------------------

/// Upstream's change-relevant view of one zone.
///
/// Fetched fresh each run, compared against the previously persisted copy,
/// and written back to the state store after a successful zonefile fetch.
/// Upstream sends more fields than these; only the change-relevant ones are
/// modeled and persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneSummary {
    pub name: String,
    /// DNS serial, `YYYYMMDDnn` upstream; bumped at most once per minute.
    pub serialno: i64,
    /// Explicit server-side "zonefile changed" signal. Overrides every
    /// timestamp-based check when set.
    pub updated: bool,
    pub updated_at: DateTime<FixedOffset>,
    pub serialno_updated_at: DateTime<FixedOffset>,
}

// ---------------------------------------------------------------------------
// Generic listing snapshots
// ---------------------------------------------------------------------------

/// First page of a paginated listing endpoint, persisted as the change
/// snapshot for generic (non-zone) resources.
///
/// Invariant: `results` is non-empty whenever `count > 0`; the detector
/// treats a violation as a fatal upstream fault.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingPage {
    pub count: u64,
    pub results: Vec<ListingRecord>,
}

/// One record of a [`ListingPage`]. Only `id` and `updated_at` participate
/// in change detection; all remaining upstream fields ride along so the
/// persisted snapshot round-trips the payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingRecord {
    pub id: i64,
    pub updated_at: DateTime<FixedOffset>,
    #[serde(flatten)]
    pub rest: serde_json::Map<String, serde_json::Value>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zone_name_display_and_equality() {
        assert_eq!(ZoneName::from("example.org").to_string(), "example.org");
        assert_eq!(
            ZoneName::from("example.org"),
            ZoneName::from(String::from("example.org"))
        );
    }

    #[test]
    fn reverse_zones_end_in_arpa() {
        assert!(ZoneName::from("0.192.in-addr.arpa").is_reverse());
        assert!(ZoneName::from("8.b.d.0.1.0.0.2.ip6.arpa").is_reverse());
        assert!(!ZoneName::from("example.org").is_reverse());
        assert!(!ZoneName::from("arpa.example.org").is_reverse());
    }

    #[test]
    fn zone_summary_parses_upstream_payload() {
        // Trimmed from a real mreg zone object; unknown fields are ignored.
        let json = r#"{
            "id": 7,
            "name": "example.org",
            "updated_at": "2023-11-01T13:06:01.661835+01:00",
            "updated": false,
            "primary_ns": "ns1.example.org",
            "email": "hostmaster@example.org",
            "serialno": 2023110101,
            "serialno_updated_at": "2023-11-01T13:06:01.596010+01:00",
            "refresh": 10800,
            "retry": 3600,
            "expire": 1814400,
            "soa_ttl": 43200
        }"#;
        let summary: ZoneSummary = serde_json::from_str(json).expect("parse");
        assert_eq!(summary.name, "example.org");
        assert_eq!(summary.serialno, 2023110101);
        assert!(!summary.updated);
        assert_eq!(summary.updated_at.offset().local_minus_utc(), 3600);
    }

    #[test]
    fn zone_summary_json_roundtrip() {
        let json = r#"{
            "name": "example.org",
            "serialno": 2023110199,
            "updated": true,
            "updated_at": "2023-11-01T13:06:01+01:00",
            "serialno_updated_at": "2023-11-01T13:06:01+01:00"
        }"#;
        let summary: ZoneSummary = serde_json::from_str(json).expect("parse");
        let reparsed: ZoneSummary =
            serde_json::from_str(&serde_json::to_string(&summary).expect("serialize"))
                .expect("reparse");
        assert_eq!(reparsed, summary);
    }

    #[test]
    fn listing_record_keeps_unknown_fields() {
        let json = r#"{
            "id": 42,
            "updated_at": "2023-11-01T13:06:01+01:00",
            "name": "host1.example.org",
            "contact": "ops@example.org"
        }"#;
        let record: ListingRecord = serde_json::from_str(json).expect("parse");
        assert_eq!(record.id, 42);
        assert_eq!(
            record.rest.get("name").and_then(|v| v.as_str()),
            Some("host1.example.org")
        );

        let out = serde_json::to_value(&record).expect("serialize");
        assert_eq!(
            out.get("contact").and_then(|v| v.as_str()),
            Some("ops@example.org")
        );
    }
}
