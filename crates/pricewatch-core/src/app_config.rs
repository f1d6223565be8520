use std::path::PathBuf;

/// Proxy fetch service used when the default endpoint is not overridden.
pub const DEFAULT_PROXY_ENDPOINT: &str = "http://api.scraperapi.com/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Credential and endpoint for the third-party fetch proxy.
///
/// The proxy is addressed as `endpoint?api_key=<key>&url=<target>`.
#[derive(Clone, PartialEq, Eq)]
pub struct ProxyCredentials {
    pub endpoint: String,
    pub api_key: String,
}

impl std::fmt::Debug for ProxyCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyCredentials")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"[redacted]")
            .finish()
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    pub watchlist_path: PathBuf,
    pub check_interval_minutes: u64,
    /// Caller-level timeout around one fetch + extract.
    pub check_timeout_secs: u64,
    pub max_concurrent_checks: usize,
    /// Fixed `User-Agent`; `None` rotates through the built-in pool.
    pub scraper_user_agent: Option<String>,
    pub scraper_accept_language: String,
    pub scraper_request_timeout_secs: u64,
    pub scraper_max_attempts: u32,
    pub scraper_backoff_base_secs: f64,
    pub scraper_backoff_jitter_ms: u64,
    pub scraper_max_connections_per_host: usize,
    pub proxy: Option<ProxyCredentials>,
    /// Search page URL with a `{query}` placeholder.
    pub search_url_template: String,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("watchlist_path", &self.watchlist_path)
            .field("check_interval_minutes", &self.check_interval_minutes)
            .field("check_timeout_secs", &self.check_timeout_secs)
            .field("max_concurrent_checks", &self.max_concurrent_checks)
            .field("scraper_user_agent", &self.scraper_user_agent)
            .field("scraper_accept_language", &self.scraper_accept_language)
            .field(
                "scraper_request_timeout_secs",
                &self.scraper_request_timeout_secs,
            )
            .field("scraper_max_attempts", &self.scraper_max_attempts)
            .field("scraper_backoff_base_secs", &self.scraper_backoff_base_secs)
            .field("scraper_backoff_jitter_ms", &self.scraper_backoff_jitter_ms)
            .field(
                "scraper_max_connections_per_host",
                &self.scraper_max_connections_per_host,
            )
            .field("proxy", &self.proxy)
            .field("search_url_template", &self.search_url_template)
            .finish()
    }
}
