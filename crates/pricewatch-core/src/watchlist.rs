use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchlistEntry {
    pub url: String,
    pub label: Option<String>,
    /// Allow the proxy hop for this URL when a challenge page persists.
    #[serde(default)]
    pub use_proxy: bool,
}

impl WatchlistEntry {
    /// Key used for duplicate detection: lowercase, no trailing slash.
    #[must_use]
    pub fn dedup_key(&self) -> String {
        self.url.trim().trim_end_matches('/').to_lowercase()
    }

    /// Human-readable label, falling back to the URL.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.url)
    }
}

#[derive(Debug, Deserialize)]
pub struct WatchlistFile {
    #[serde(default)]
    pub items: Vec<WatchlistEntry>,
}

/// Load and validate the watchlist from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_watchlist(path: &Path) -> Result<WatchlistFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::WatchlistIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let watchlist: WatchlistFile =
        serde_yaml::from_str(&content).map_err(ConfigError::WatchlistParse)?;

    validate_watchlist(&watchlist)?;

    Ok(watchlist)
}

fn validate_watchlist(watchlist: &WatchlistFile) -> Result<(), ConfigError> {
    let mut seen_urls = HashSet::new();

    for entry in &watchlist.items {
        let url = entry.url.trim();
        let has_scheme = url.starts_with("http://") || url.starts_with("https://");
        let has_host = url
            .split_once("://")
            .is_some_and(|(_, rest)| !rest.trim_start_matches('/').is_empty());
        if !has_scheme || !has_host {
            return Err(ConfigError::Validation(format!(
                "watchlist url '{}' must be an absolute http(s) URL",
                entry.url
            )));
        }

        if let Some(label) = &entry.label {
            if label.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "watchlist entry '{}' has an empty label",
                    entry.url
                )));
            }
        }

        if !seen_urls.insert(entry.dedup_key()) {
            return Err(ConfigError::Validation(format!(
                "duplicate watchlist url: '{}'",
                entry.url
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "watchlist_test.rs"]
mod tests;
