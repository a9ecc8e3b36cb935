//! Blocking, token-authenticated client for the mreg HTTP API.
//!
//! # Protocol
//!
//! - `POST /api/token-auth/` with `{username, password}` yields a token;
//!   data requests carry it as `Authorization: Token <token>`. Login happens
//!   lazily on the first data request, and once more if a token is rejected
//!   mid-session (401).
//! - Listing endpoints are Django-REST-framework paginated: `{count, next,
//!   previous, results}` with absolute `next` URLs.
//!
//! No retry or backoff beyond the single 401 re-login; a run either gets a
//! clean pass against the API or fails it.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::io::Read;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use zonemirror_core::types::{ListingPage, ZoneName, ZoneSummary};
use zonemirror_core::MregSection;

use crate::error::ApiError;

const TOKEN_AUTH: &str = "/api/token-auth/";
const FORWARD_ZONES: &str = "/api/v1/zones/forward/";
const REVERSE_ZONES: &str = "/api/v1/zones/reverse/";
const ZONEFILES: &str = "/api/v1/zonefiles/";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// ---------------------------------------------------------------------------
// ZoneSource seam
// ---------------------------------------------------------------------------

/// Zone data provider consumed by the sync engine. Implemented by
/// [`MregClient`]; test suites substitute in-memory fakes.
pub trait ZoneSource {
    /// Every zone upstream serves, forward and reverse listings merged,
    /// keyed by zone name.
    fn zone_inventory(&self) -> Result<BTreeMap<String, ZoneSummary>, ApiError>;

    /// The rendered zonefile body for `zone`.
    fn zonefile(&self, zone: &ZoneName) -> Result<String, ApiError>;

    /// A fresh summary for `zone`.
    fn zone_summary(&self, zone: &ZoneName) -> Result<ZoneSummary, ApiError>;

    /// First page of the listing at `path`, newest entry first, one record
    /// per page.
    fn first_page(&self, path: &str) -> Result<ListingPage, ApiError>;
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Authenticated blocking connection to one mreg server.
pub struct MregClient {
    agent: ureq::Agent,
    base: String,
    user: String,
    password: String,
    // Session token, filled by the first request. The tool is single-threaded;
    // interior mutability keeps &self signatures on the trait.
    token: RefCell<Option<String>>,
}

impl MregClient {
    pub fn new(section: &MregSection) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(REQUEST_TIMEOUT).build();
        Self {
            agent,
            base: section.url.trim_end_matches('/').to_string(),
            user: section.user.clone(),
            password: section.password.clone(),
            token: RefCell::new(None),
        }
    }

    /// `<base><path>`; `path` must start with `/`.
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    // -- authentication -----------------------------------------------------

    fn login(&self) -> Result<String, ApiError> {
        let url = self.url(TOKEN_AUTH);

        #[derive(Deserialize)]
        struct TokenResponse {
            token: String,
        }

        let response = self
            .agent
            .post(&url)
            .send_json(serde_json::json!({
                "username": self.user,
                "password": self.password,
            }))
            .map_err(|e| match e {
                ureq::Error::Status(status, _) => ApiError::Auth {
                    url: url.clone(),
                    status,
                },
                other => ApiError::from_ureq(&url, other),
            })?;
        let body: TokenResponse = serde_json::from_reader(response.into_reader())
            .map_err(|e| ApiError::Decode { url, source: e })?;
        tracing::debug!(user = %self.user, "authenticated against mreg");
        Ok(body.token)
    }

    fn ensure_token(&self) -> Result<String, ApiError> {
        if let Some(token) = self.token.borrow().as_ref() {
            return Ok(token.clone());
        }
        let token = self.login()?;
        self.token.replace(Some(token.clone()));
        Ok(token)
    }

    fn get_with_token(&self, url: &str, token: &str) -> Result<ureq::Response, ureq::Error> {
        self.agent
            .get(url)
            .set("Authorization", &format!("Token {token}"))
            .call()
    }

    /// Authenticated GET. A 401 means the session token expired server-side;
    /// log in again and retry exactly once.
    fn request(&self, url: &str) -> Result<ureq::Response, ApiError> {
        let token = self.ensure_token()?;
        match self.get_with_token(url, &token) {
            Err(ureq::Error::Status(401, _)) => {
                tracing::debug!(url, "token rejected, re-authenticating");
                self.token.replace(None);
                let token = self.ensure_token()?;
                self.get_with_token(url, &token)
                    .map_err(|e| ApiError::from_ureq(url, e))
            }
            other => other.map_err(|e| ApiError::from_ureq(url, e)),
        }
    }

    // -- typed accessors ----------------------------------------------------

    /// GET `path` and decode the JSON body.
    pub fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.get_json_url(&self.url(path))
    }

    fn get_json_url<T: DeserializeOwned>(&self, url: &str) -> Result<T, ApiError> {
        let response = self.request(url)?;
        serde_json::from_reader(response.into_reader()).map_err(|e| ApiError::Decode {
            url: url.to_string(),
            source: e,
        })
    }

    /// GET `path` as plain text, streamed. Zonefiles routinely exceed the
    /// response-size cap of `into_string`, so the body is read through
    /// `into_reader`.
    pub fn get_text(&self, path: &str) -> Result<String, ApiError> {
        let url = self.url(path);
        let response = self.request(&url)?;
        let mut body = String::new();
        response
            .into_reader()
            .read_to_string(&mut body)
            .map_err(|e| ApiError::Read { url, source: e })?;
        Ok(body)
    }

    /// GET a paginated listing, following `next` links until exhausted.
    pub fn get_list(&self, path: &str) -> Result<Vec<serde_json::Value>, ApiError> {
        #[derive(Deserialize)]
        struct Page {
            next: Option<String>,
            results: Vec<serde_json::Value>,
        }

        let mut url = self.url(path);
        let mut entries = Vec::new();
        loop {
            let page: Page = self.get_json_url(&url)?;
            entries.extend(page.results);
            match page.next {
                // `next` is an absolute URL in DRF payloads.
                Some(next) => url = next,
                None => break,
            }
        }
        Ok(entries)
    }
}

impl ZoneSource for MregClient {
    fn zone_inventory(&self) -> Result<BTreeMap<String, ZoneSummary>, ApiError> {
        let mut inventory = BTreeMap::new();
        for path in [FORWARD_ZONES, REVERSE_ZONES] {
            let url = self.url(path);
            for entry in self.get_list(path)? {
                let summary: ZoneSummary =
                    serde_json::from_value(entry).map_err(|e| ApiError::Decode {
                        url: url.clone(),
                        source: e,
                    })?;
                inventory.insert(summary.name.clone(), summary);
            }
        }
        tracing::debug!(zones = inventory.len(), "fetched zone inventory");
        Ok(inventory)
    }

    fn zonefile(&self, zone: &ZoneName) -> Result<String, ApiError> {
        self.get_text(&format!("{ZONEFILES}{zone}"))
    }

    fn zone_summary(&self, zone: &ZoneName) -> Result<ZoneSummary, ApiError> {
        self.get_json(&zone_detail_path(zone))
    }

    fn first_page(&self, path: &str) -> Result<ListingPage, ApiError> {
        self.get_json(&first_page_query(path))
    }
}

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

/// Detail endpoint for one zone; reverse zones live under their own
/// collection.
fn zone_detail_path(zone: &ZoneName) -> String {
    let collection = if zone.is_reverse() {
        REVERSE_ZONES
    } else {
        FORWARD_ZONES
    };
    format!("{collection}{zone}")
}

/// Restrict a listing to its single most recently updated entry.
fn first_page_query(path: &str) -> String {
    let sep = if path.contains('?') { '&' } else { '?' };
    format!("{path}{sep}page_size=1&ordering=-updated_at")
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
