//! Error types for quakescope.
//!
//! Uses `thiserror` for library-style error definitions.

use thiserror::Error;

/// Errors that can occur while loading a feed.
///
/// Both variants are terminal for the load attempt that produced them only;
/// previously loaded records stay in place.
#[derive(Error, Debug)]
pub enum QuakeError {
    /// Upstream answered with a non-success status
    #[error("USGS request failed (HTTP {status}): {url}")]
    FeedFetch { status: u16, url: String },

    /// Transport-level failure (DNS, TLS, timeout, ...)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Payload is not a recognizable feature collection
    #[error("unrecognized feed payload: {0}")]
    FeedFormat(String),
}

impl From<serde_json::Error> for QuakeError {
    fn from(e: serde_json::Error) -> Self {
        Self::FeedFormat(e.to_string())
    }
}

impl QuakeError {
    /// HTTP status carried by a fetch failure, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::FeedFetch { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            Self::FeedFormat(_) => None,
        }
    }
}
