//! Change detection for `zonemirror-detector`.
//!
//! Pure decision logic, no I/O. Two entry points:
//! - [`should_update_at`]: per-zone fetch/skip decision from the stored and
//!   freshly fetched [`ZoneSummary`]
//! - [`listing_changed`]: snapshot comparison for generic paginated listings
//!
//! Decision precedence for zones:
//! 1. `FirstRun` (no stored snapshot)
//! 2. `UpstreamFlagged` (`updated` set; overrides every timestamp check)
//! 3. `Unchanged` (`updated_at` identical)
//! 4. `SerialRateLimited` (serial bumped less than a minute before `now`)
//! 5. `TimestampAdvanced`

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use zonemirror_core::types::{ListingPage, ZoneSummary};

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Outcome of the per-zone check, carrying the reason for the run log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateDecision {
    /// No stored snapshot for this zone.
    FirstRun,
    /// Upstream set the `updated` flag on the zone.
    UpstreamFlagged,
    /// `updated_at` matches the stored snapshot.
    Unchanged,
    /// The serial moved less than a minute ago; upstream bumps it at most
    /// once per minute, so a re-fetch cannot observe anything new yet.
    SerialRateLimited,
    /// `updated_at` differs and the serial cooldown has passed.
    TimestampAdvanced,
}

impl UpdateDecision {
    /// Whether the coordinator should fetch and rewrite the zonefile.
    pub fn fetch_needed(&self) -> bool {
        matches!(
            self,
            UpdateDecision::FirstRun
                | UpdateDecision::UpstreamFlagged
                | UpdateDecision::TimestampAdvanced
        )
    }

    /// One-line reason for log output.
    pub fn reason(&self) -> &'static str {
        match self {
            UpdateDecision::FirstRun => "no stored state",
            UpdateDecision::UpstreamFlagged => "flagged updated upstream",
            UpdateDecision::Unchanged => "updated_at unchanged",
            UpdateDecision::SerialRateLimited => "serial changed less than a minute ago",
            UpdateDecision::TimestampAdvanced => "updated_at advanced",
        }
    }
}

impl std::fmt::Display for UpdateDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.reason())
    }
}

/// Errors from listing comparison.
#[derive(Debug, Error)]
pub enum DetectError {
    /// The listing endpoint reported zero entries. A watched listing is
    /// expected to have content; an empty one means a misconfigured path,
    /// not "no changes".
    #[error("listing returned no entries")]
    EmptyListing,

    /// `count` was positive but the page carried no records.
    #[error("listing reports {count} entries but the page carried none")]
    MissingRecords { count: u64 },
}

// ---------------------------------------------------------------------------
// Zone decision
// ---------------------------------------------------------------------------

/// Decide whether a zone needs a fresh fetch, evaluating the serial cooldown
/// against `now`. Timestamps keep their upstream offsets; comparisons are
/// instant-based.
pub fn should_update_at(
    previous: Option<&ZoneSummary>,
    current: &ZoneSummary,
    now: DateTime<Utc>,
) -> UpdateDecision {
    let Some(previous) = previous else {
        return UpdateDecision::FirstRun;
    };
    if current.updated {
        return UpdateDecision::UpstreamFlagged;
    }
    if previous.updated_at == current.updated_at {
        return UpdateDecision::Unchanged;
    }
    if now.signed_duration_since(previous.serialno_updated_at) < Duration::minutes(1) {
        return UpdateDecision::SerialRateLimited;
    }
    UpdateDecision::TimestampAdvanced
}

/// [`should_update_at`] evaluated at `Utc::now()`.
pub fn should_update(previous: Option<&ZoneSummary>, current: &ZoneSummary) -> UpdateDecision {
    should_update_at(previous, current, Utc::now())
}

// ---------------------------------------------------------------------------
// Listing comparison
// ---------------------------------------------------------------------------

/// Compare the freshly fetched first page of a listing against the stored
/// snapshot. Listings are fetched ordered newest-first with one record per
/// page, so `count`, the head record's `id`, and its `updated_at` together
/// witness any insert, delete, or edit.
///
/// A tie or an *older* head `updated_at` is "unchanged"; only a strictly
/// newer one counts, so a stale or out-of-order response never triggers
/// re-processing.
pub fn listing_changed(
    previous: Option<&ListingPage>,
    current: &ListingPage,
) -> Result<bool, DetectError> {
    if current.count == 0 {
        return Err(DetectError::EmptyListing);
    }
    let Some(head) = current.results.first() else {
        return Err(DetectError::MissingRecords { count: current.count });
    };

    let Some(previous) = previous else {
        return Ok(true);
    };
    // A stored snapshot without records cannot be compared; treat as absent.
    let Some(prev_head) = previous.results.first() else {
        return Ok(true);
    };

    Ok(previous.count != current.count
        || prev_head.id != head.id
        || prev_head.updated_at < head.updated_at)
}
