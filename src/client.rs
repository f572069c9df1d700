//! USGS Earthquake feed client.
//!
//! Provides async HTTP access to the three trailing-window summary feeds.
//! Uses reqwest with rustls for TLS. One GET per load, no retry.

use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::errors::QuakeError;
use crate::feed;
use crate::models::EventRecord;

/// Default request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// User agent string for API requests.
const USER_AGENT: &str = concat!("quakescope/", env!("CARGO_PKG_VERSION"));

/// USGS base URL for earthquake feeds.
const USGS_BASE_URL: &str = "https://earthquake.usgs.gov";

/// Trailing time window of a feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedRange {
    #[default]
    Day,
    Week,
    Month,
}

impl FeedRange {
    /// Range key as used on the command line and over the API.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
        }
    }

    /// Summary feed file name for this window.
    #[must_use]
    pub const fn feed_name(self) -> &'static str {
        match self {
            Self::Day => "all_day",
            Self::Week => "all_week",
            Self::Month => "all_month",
        }
    }
}

impl std::str::FromStr for FeedRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            _ => Err(format!("unknown range: {s} (expected: day, week, month)")),
        }
    }
}

/// Anything that can produce the records for a range.
///
/// Implemented by [`UsgsClient`]; tests and the session server substitute
/// their own sources.
pub trait FeedSource: Send + Sync + 'static {
    /// Load and parse the feed for `range`.
    fn fetch(
        &self,
        range: FeedRange,
    ) -> impl Future<Output = Result<Vec<EventRecord>, QuakeError>> + Send;
}

/// Client for USGS earthquake feeds.
#[derive(Debug, Clone)]
pub struct UsgsClient {
    client: Client,
    base_url: String,
}

impl UsgsClient {
    /// Create a new USGS client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn new() -> Result<Self, QuakeError> {
        Self::with_base_url(USGS_BASE_URL)
    }

    /// Create a client pointed at a different host (mirrors, local fixtures).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, QuakeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Full URL of the summary feed for `range`.
    #[must_use]
    pub fn feed_url(&self, range: FeedRange) -> String {
        format!(
            "{}/earthquakes/feed/v1.0/summary/{}.geojson",
            self.base_url,
            range.feed_name()
        )
    }

    /// Fetch the raw feed body.
    ///
    /// # Errors
    ///
    /// Returns [`QuakeError::FeedFetch`] on a non-success status and
    /// [`QuakeError::Http`] on transport failure.
    #[instrument(skip(self), fields(range = range.as_str()))]
    pub async fn fetch_raw(&self, range: FeedRange) -> Result<String, QuakeError> {
        let url = self.feed_url(range);
        debug!("fetching feed from {}", url);

        let response = self.client.get(&url).send().await?;

        // Check status before reading the body
        let status = response.status();
        if !status.is_success() {
            return Err(QuakeError::FeedFetch {
                status: status.as_u16(),
                url,
            });
        }

        Ok(response.text().await?)
    }

    /// Fetch and parse the feed for `range`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the payload is not a feature
    /// collection.
    pub async fn fetch_feed(&self, range: FeedRange) -> Result<Vec<EventRecord>, QuakeError> {
        let body = self.fetch_raw(range).await?;
        let records = feed::parse(&body)?;
        debug!("fetched {} events", records.len());
        Ok(records)
    }
}

impl FeedSource for UsgsClient {
    async fn fetch(&self, range: FeedRange) -> Result<Vec<EventRecord>, QuakeError> {
        self.fetch_feed(range).await
    }
}
