//! Fetch and extract product prices from retail pages.
//!
//! [`Fetcher`] retrieves HTML with retries, user-agent rotation, a per-host
//! concurrency cap and an optional proxy hop past challenge pages.
//! [`extract`] turns that HTML into a [`ProductSnapshot`].

pub mod error;
pub mod extract;
pub mod fetch;
pub mod price;
pub mod search;

pub use error::ScraperError;
pub use extract::{extract, MAX_HTML_BYTES};
pub use fetch::{
    pick_user_agent, AttemptFailure, AttemptOutcome, BackoffPolicy, FetchOptions, FetchPhase,
    FetchResult, Fetcher, FetcherConfig, MAX_BODY_BYTES, USER_AGENT_POOL,
};
pub use price::{parse_amount, parse_number, parse_price_text, PriceToken};
pub use search::{extract_product_links, search_url, ProductLink};

use pricewatch_core::ProductSnapshot;

/// Fetch `url` and extract a snapshot from it.
///
/// A page that cannot be fetched yields [`ProductSnapshot::unavailable`].
///
/// # Errors
///
/// Only configuration problems and malformed URLs; see [`Fetcher::fetch`].
pub async fn scrape_product_page(
    fetcher: &Fetcher,
    url: &str,
    options: &FetchOptions,
) -> Result<ProductSnapshot, ScraperError> {
    let fetched = fetcher.fetch(url, options).await?;
    if !fetched.is_usable() {
        tracing::warn!(
            url,
            attempts = fetched.attempts,
            status = fetched.status,
            challenge_detected = fetched.challenge_detected,
            "no usable HTML; returning unavailable snapshot"
        );
        return Ok(ProductSnapshot::unavailable());
    }

    let snapshot = extract(&fetched.html);
    if !snapshot.has_price() {
        tracing::warn!(url, name = %snapshot.name, "price not found on page");
    } else {
        tracing::info!(
            url,
            final_url = %fetched.final_url,
            via_proxy = fetched.via_proxy,
            price = snapshot.price,
            currency = snapshot.currency.as_deref(),
            source = ?snapshot.source,
            "product page scraped"
        );
    }
    Ok(snapshot)
}
