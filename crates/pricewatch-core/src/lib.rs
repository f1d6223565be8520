//! Shared types and configuration for the price watcher.
//!
//! Nothing in this crate touches the network: it owns environment-driven
//! configuration, the watchlist file, the [`ProductSnapshot`] produced by the
//! scraper, and the change evaluation applied to a [`WatchedItem`].

mod app_config;
mod config;
mod snapshot;
mod watched;
mod watchlist;

use thiserror::Error;

pub use app_config::{AppConfig, Environment, ProxyCredentials, DEFAULT_PROXY_ENDPOINT};
pub use config::{load_app_config, load_app_config_from_env};
pub use snapshot::{PriceSource, ProductSnapshot, UNTITLED};
pub use watched::{percent_change, CheckOutcome, PricePoint, WatchedItem};
pub use watchlist::{load_watchlist, WatchlistEntry, WatchlistFile};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read watchlist file {path}: {source}")]
    WatchlistIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse watchlist file: {0}")]
    WatchlistParse(#[from] serde_yaml::Error),

    #[error("watchlist validation failed: {0}")]
    Validation(String),
}
