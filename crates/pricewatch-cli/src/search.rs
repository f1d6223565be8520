use futures::stream::{self, StreamExt};
use pricewatch_core::AppConfig;
use pricewatch_scraper::{extract_product_links, scrape_product_page, search_url, FetchOptions};

use crate::check::{build_fetcher, render_snapshot};

/// Fetch the store's search page for `query` and check up to `limit`
/// product links found on it, printing results in page order.
pub(crate) async fn run_search(config: &AppConfig, query: &str, limit: usize) -> anyhow::Result<()> {
    let url = search_url(&config.search_url_template, query)?;
    let fetcher = build_fetcher(config)?;
    let options = FetchOptions::default();

    let page = fetcher.fetch(&url, &options).await?;
    if !page.is_usable() {
        anyhow::bail!(
            "search page {url} could not be fetched after {} attempts",
            page.attempts
        );
    }

    let links = extract_product_links(&page.html, &page.final_url, limit);
    if links.is_empty() {
        println!("no products found for \"{query}\"");
        return Ok(());
    }
    tracing::info!(query, found = links.len(), "checking search results");

    let fetcher = &fetcher;
    let options = &options;
    let results: Vec<_> = stream::iter(&links)
        .map(|link| async move { (link, scrape_product_page(fetcher, &link.url, options).await) })
        .buffered(config.max_concurrent_checks.max(1))
        .collect()
        .await;

    for (link, result) in results {
        match result {
            Ok(snapshot) => println!("{}", render_snapshot(&link.url, &snapshot)),
            Err(e) => tracing::error!(url = %link.url, error = %e, "search result check failed"),
        }
    }
    Ok(())
}
