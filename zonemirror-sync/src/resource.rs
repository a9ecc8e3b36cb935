//! Change check for paginated listing endpoints.
//!
//! Fetches the newest-first first page of a listing and compares it against
//! the snapshot from the previous run. The witnesses are the total count,
//! the head record's id, and its `updated_at`; a change in any of them
//! replaces the snapshot and reports true. An unchanged listing leaves the
//! snapshot alone.

use std::path::Path;

use zonemirror_detector::listing_changed;
use zonemirror_mreg::ZoneSource;

use crate::error::SyncError;
use crate::observe::timed;
use crate::state;

/// Check whether the listing at `path` changed since the last run.
///
/// The snapshot is stored at `<workdir>/<name>.json`.
pub fn listing_updated<S: ZoneSource>(
    workdir: &Path,
    source: &S,
    path: &str,
    name: &str,
) -> Result<bool, SyncError> {
    let current = timed("listing fetch", || source.first_page(path))?;
    let previous = state::load_listing_state(workdir, name);
    let changed =
        listing_changed(previous.as_ref(), &current).map_err(|source| SyncError::Listing {
            path: path.to_string(),
            source,
        })?;
    if changed {
        state::save_listing_state(workdir, name, &current)?;
        tracing::info!("listing {path} changed");
    }
    Ok(changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tempfile::TempDir;
    use zonemirror_core::{ListingPage, ZoneName, ZoneSummary};
    use zonemirror_mreg::ApiError;

    struct PageSource(ListingPage);

    impl ZoneSource for PageSource {
        fn zone_inventory(&self) -> Result<BTreeMap<String, ZoneSummary>, ApiError> {
            unreachable!("not used by listing checks")
        }

        fn zonefile(&self, _zone: &ZoneName) -> Result<String, ApiError> {
            unreachable!("not used by listing checks")
        }

        fn zone_summary(&self, _zone: &ZoneName) -> Result<ZoneSummary, ApiError> {
            unreachable!("not used by listing checks")
        }

        fn first_page(&self, _path: &str) -> Result<ListingPage, ApiError> {
            Ok(self.0.clone())
        }
    }

    fn page(count: u64, id: i64, updated_at: &str) -> ListingPage {
        serde_json::from_str(&format!(
            r#"{{"count": {count}, "results": [{{"id": {id}, "updated_at": "{updated_at}"}}]}}"#
        ))
        .unwrap()
    }

    #[test]
    fn first_check_reports_change_and_saves_snapshot() {
        let tmp = TempDir::new().unwrap();
        let source = PageSource(page(41, 7, "2024-03-01T11:00:00+01:00"));
        let changed = listing_updated(tmp.path(), &source, "/api/v1/hosts/", "hosts").unwrap();
        assert!(changed);
        assert!(state::load_listing_state(tmp.path(), "hosts").is_some());
    }

    #[test]
    fn unchanged_listing_reports_false_and_keeps_snapshot() {
        let tmp = TempDir::new().unwrap();
        let source = PageSource(page(41, 7, "2024-03-01T11:00:00+01:00"));
        assert!(listing_updated(tmp.path(), &source, "/api/v1/hosts/", "hosts").unwrap());
        assert!(!listing_updated(tmp.path(), &source, "/api/v1/hosts/", "hosts").unwrap());
    }

    #[test]
    fn new_head_record_reports_change() {
        let tmp = TempDir::new().unwrap();
        let source = PageSource(page(41, 7, "2024-03-01T11:00:00+01:00"));
        assert!(listing_updated(tmp.path(), &source, "/api/v1/hosts/", "hosts").unwrap());
        let source = PageSource(page(42, 8, "2024-03-01T11:05:00+01:00"));
        assert!(listing_updated(tmp.path(), &source, "/api/v1/hosts/", "hosts").unwrap());
    }

    #[test]
    fn empty_listing_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let source = PageSource(ListingPage {
            count: 0,
            results: vec![],
        });
        let err = listing_updated(tmp.path(), &source, "/api/v1/hosts/", "hosts").unwrap_err();
        assert!(matches!(err, SyncError::Listing { .. }));
        assert!(err.to_string().contains("/api/v1/hosts/"));
    }
}
