use thiserror::Error;

/// Hard failures of the scraper crate.
///
/// Ordinary HTTP trouble (timeouts, non-2xx, challenge pages) is not an error:
/// it ends in a [`crate::FetchResult`] with empty HTML. Only misconfiguration
/// and malformed input URLs surface here.
#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid target URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("invalid proxy endpoint \"{endpoint}\": {reason}")]
    InvalidProxyEndpoint { endpoint: String, reason: String },

    #[error("invalid search URL template \"{template}\": {reason}")]
    InvalidSearchTemplate { template: String, reason: String },
}
