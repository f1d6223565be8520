//! Single-page commands: `check` fetches and extracts, `extract` parses a
//! local file.

use std::path::Path;

use pricewatch_core::{AppConfig, ProductSnapshot};
use pricewatch_scraper::{extract, scrape_product_page, FetchOptions, Fetcher, FetcherConfig};

pub(crate) fn build_fetcher(config: &AppConfig) -> anyhow::Result<Fetcher> {
    Fetcher::new(FetcherConfig::from_app_config(config))
        .map_err(|e| anyhow::anyhow!("failed to build fetcher: {e}"))
}

pub(crate) async fn run_check(
    config: &AppConfig,
    url: &str,
    use_proxy: bool,
    user_agent: Option<String>,
) -> anyhow::Result<()> {
    let fetcher = build_fetcher(config)?;
    let options = FetchOptions {
        user_agent,
        use_proxy,
    };
    let snapshot = scrape_product_page(&fetcher, url, &options).await?;
    println!("{}", render_snapshot(url, &snapshot));
    Ok(())
}

pub(crate) fn run_extract(path: &Path) -> anyhow::Result<()> {
    let html = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let snapshot = extract(&html);
    println!("{}", render_snapshot(&path.display().to_string(), &snapshot));
    Ok(())
}

pub(crate) fn render_snapshot(label: &str, snapshot: &ProductSnapshot) -> String {
    match snapshot.source {
        Some(source) => format!("{label}\n  {snapshot}\n  source: {source}"),
        None => format!("{label}\n  {snapshot}"),
    }
}
