//! The `watch` loop: check every watchlist item with bounded concurrency,
//! fold results into in-memory [`WatchedItem`] state, and repeat on the
//! configured interval.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use pricewatch_core::{
    load_watchlist, AppConfig, CheckOutcome, PricePoint, ProductSnapshot, WatchedItem,
    WatchlistEntry,
};
use pricewatch_scraper::{scrape_product_page, FetchOptions, Fetcher};
use tokio::time::MissedTickBehavior;

use crate::check::build_fetcher;

/// Per-round counters logged after every pass over the watchlist.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct RoundSummary {
    pub checked: usize,
    pub first_prices: usize,
    pub changed: usize,
    pub unchanged: usize,
    pub no_price: usize,
    pub failed: usize,
}

impl RoundSummary {
    fn record(&mut self, outcome: &CheckOutcome) {
        self.checked += 1;
        match outcome {
            CheckOutcome::NoPrice => self.no_price += 1,
            CheckOutcome::FirstPrice { .. } => self.first_prices += 1,
            CheckOutcome::Unchanged { .. } => self.unchanged += 1,
            CheckOutcome::Changed { .. } => self.changed += 1,
        }
    }

    fn record_failure(&mut self) {
        self.checked += 1;
        self.failed += 1;
    }
}

pub(crate) async fn run_watch(
    config: &AppConfig,
    watchlist_path: Option<&Path>,
    once: bool,
) -> anyhow::Result<()> {
    let path = watchlist_path.unwrap_or(config.watchlist_path.as_path());
    let watchlist = load_watchlist(path)
        .map_err(|e| anyhow::anyhow!("failed to load watchlist {}: {e}", path.display()))?;
    if watchlist.items.is_empty() {
        tracing::warn!(path = %path.display(), "watchlist is empty; nothing to check");
        return Ok(());
    }

    let fetcher = build_fetcher(config)?;
    let mut state: HashMap<String, WatchedItem> = HashMap::new();
    let period = Duration::from_secs(config.check_interval_minutes.saturating_mul(60));
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    tracing::info!(
        items = watchlist.items.len(),
        interval_minutes = config.check_interval_minutes,
        once,
        "starting watch"
    );

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupted; stopping watch");
                return Ok(());
            }
        }

        let summary = run_round(&fetcher, config, &watchlist.items, &mut state).await;
        tracing::info!(
            checked = summary.checked,
            first_prices = summary.first_prices,
            changed = summary.changed,
            unchanged = summary.unchanged,
            no_price = summary.no_price,
            failed = summary.failed,
            "watch round complete"
        );

        if once {
            return Ok(());
        }
    }
}

async fn run_round(
    fetcher: &Fetcher,
    config: &AppConfig,
    items: &[WatchlistEntry],
    state: &mut HashMap<String, WatchedItem>,
) -> RoundSummary {
    let max_concurrent = config.max_concurrent_checks.max(1);
    let timeout = Duration::from_secs(config.check_timeout_secs);

    let results: Vec<(&WatchlistEntry, anyhow::Result<ProductSnapshot>)> = stream::iter(items)
        .map(|entry| async move { (entry, check_entry(fetcher, entry, timeout).await) })
        .buffer_unordered(max_concurrent)
        .collect()
        .await;

    let now = Utc::now();
    let mut summary = RoundSummary::default();
    for (entry, result) in results {
        match result {
            Ok(snapshot) => {
                let item = state
                    .entry(entry.dedup_key())
                    .or_insert_with(|| WatchedItem::new(entry.url.clone()));
                let outcome = item.apply(&snapshot, now);
                if outcome.should_record() {
                    println!(
                        "{}",
                        describe_outcome(
                            entry.display_name(),
                            &snapshot,
                            &outcome,
                            item.lowest.as_ref()
                        )
                    );
                }
                tracing::debug!(url = %entry.url, ?outcome, "item checked");
                summary.record(&outcome);
            }
            Err(e) => {
                tracing::error!(url = %entry.url, error = %e, "watch check failed");
                summary.record_failure();
            }
        }
    }
    summary
}

async fn check_entry(
    fetcher: &Fetcher,
    entry: &WatchlistEntry,
    timeout: Duration,
) -> anyhow::Result<ProductSnapshot> {
    let options = FetchOptions {
        user_agent: None,
        use_proxy: entry.use_proxy,
    };
    let snapshot = tokio::time::timeout(timeout, scrape_product_page(fetcher, &entry.url, &options))
        .await
        .map_err(|_| anyhow::anyhow!("check timed out after {}s", timeout.as_secs()))??;
    Ok(snapshot)
}

/// One-line, human-readable summary of a check outcome. Price changes also
/// report the lowest price recorded so far.
pub(crate) fn describe_outcome(
    label: &str,
    snapshot: &ProductSnapshot,
    outcome: &CheckOutcome,
    lowest: Option<&PricePoint>,
) -> String {
    let currency = snapshot.currency.as_deref();
    match outcome {
        CheckOutcome::NoPrice => format!("{label}: price not found"),
        CheckOutcome::FirstPrice { current } => {
            format!("{label}: now tracking at {}", money(*current, currency))
        }
        CheckOutcome::Unchanged { current } => {
            format!("{label}: unchanged at {}", money(*current, currency))
        }
        CheckOutcome::Changed {
            previous,
            previous_currency,
            current,
            percent,
        } => {
            let change = percent.map_or_else(|| "n/a".to_owned(), |p| format!("{p:+.2}%"));
            let mut line = format!(
                "{label}: {} -> {} ({change})",
                money(*previous, previous_currency.as_deref()),
                money(*current, currency)
            );
            if let Some(low) = lowest {
                line.push_str(&format!(
                    "; lowest {} on {}",
                    money(low.price, low.currency.as_deref()),
                    low.observed_at.format("%Y-%m-%d")
                ));
            }
            line
        }
    }
}

fn money(amount: f64, currency: Option<&str>) -> String {
    match currency {
        Some(c) => format!("{amount:.2} {c}"),
        None => format!("{amount:.2}"),
    }
}
