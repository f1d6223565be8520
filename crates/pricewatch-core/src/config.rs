use crate::app_config::{AppConfig, Environment, ProxyCredentials, DEFAULT_PROXY_ENDPOINT};
use crate::ConfigError;

const DEFAULT_ACCEPT_LANGUAGE: &str = "pt-BR,pt;q=0.9,en-US;q=0.8,en;q=0.7";
const DEFAULT_SEARCH_URL_TEMPLATE: &str = "https://www.comprasparaguai.com.br/busca/?s={query}";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so it can be tested with a `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    // Blank values are treated the same as unset ones.
    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_f64 = |var: &str, default: &str| -> Result<f64, ConfigError> {
        or_default(var, default)
            .parse::<f64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let env = parse_environment(&or_default("PRICEWATCH_ENV", "development"))?;
    let log_level = or_default("PRICEWATCH_LOG_LEVEL", "info");
    let watchlist_path = PathBuf::from(or_default(
        "PRICEWATCH_WATCHLIST_PATH",
        "./config/watchlist.yaml",
    ));

    let check_interval_minutes = parse_u64("PRICEWATCH_CHECK_INTERVAL_MINUTES", "1440")?;
    if check_interval_minutes == 0 {
        return Err(invalid(
            "PRICEWATCH_CHECK_INTERVAL_MINUTES",
            "must be at least 1".to_string(),
        ));
    }
    let check_timeout_secs = parse_u64("PRICEWATCH_CHECK_TIMEOUT_SECS", "180")?;
    let max_concurrent_checks = parse_usize("PRICEWATCH_MAX_CONCURRENT_CHECKS", "4")?;

    let scraper_user_agent = optional("PRICEWATCH_USER_AGENT");
    let scraper_accept_language = or_default("PRICEWATCH_ACCEPT_LANGUAGE", DEFAULT_ACCEPT_LANGUAGE);
    let scraper_request_timeout_secs = parse_u64("PRICEWATCH_REQUEST_TIMEOUT_SECS", "25")?;

    let scraper_max_attempts = parse_u32("PRICEWATCH_MAX_ATTEMPTS", "3")?;
    if scraper_max_attempts == 0 {
        return Err(invalid(
            "PRICEWATCH_MAX_ATTEMPTS",
            "must be at least 1".to_string(),
        ));
    }

    let scraper_backoff_base_secs = parse_f64("PRICEWATCH_BACKOFF_BASE_SECS", "1.2")?;
    if !scraper_backoff_base_secs.is_finite() || scraper_backoff_base_secs < 0.0 {
        return Err(invalid(
            "PRICEWATCH_BACKOFF_BASE_SECS",
            "must be a finite, non-negative number".to_string(),
        ));
    }
    let scraper_backoff_jitter_ms = parse_u64("PRICEWATCH_BACKOFF_JITTER_MS", "500")?;

    let scraper_max_connections_per_host = parse_usize("PRICEWATCH_MAX_CONNECTIONS_PER_HOST", "4")?;
    if scraper_max_connections_per_host == 0 {
        return Err(invalid(
            "PRICEWATCH_MAX_CONNECTIONS_PER_HOST",
            "must be at least 1".to_string(),
        ));
    }

    let proxy = parse_proxy(
        optional("PRICEWATCH_PROXY_API_KEY"),
        optional("PRICEWATCH_PROXY_ENDPOINT"),
    )?;

    let search_url_template =
        or_default("PRICEWATCH_SEARCH_URL_TEMPLATE", DEFAULT_SEARCH_URL_TEMPLATE);
    if !search_url_template.contains("{query}") {
        return Err(invalid(
            "PRICEWATCH_SEARCH_URL_TEMPLATE",
            "must contain a {query} placeholder".to_string(),
        ));
    }

    Ok(AppConfig {
        env,
        log_level,
        watchlist_path,
        check_interval_minutes,
        check_timeout_secs,
        max_concurrent_checks,
        scraper_user_agent,
        scraper_accept_language,
        scraper_request_timeout_secs,
        scraper_max_attempts,
        scraper_backoff_base_secs,
        scraper_backoff_jitter_ms,
        scraper_max_connections_per_host,
        proxy,
        search_url_template,
    })
}

/// Combine the proxy key and endpoint variables.
///
/// A key alone uses [`DEFAULT_PROXY_ENDPOINT`]; an endpoint without a key is
/// rejected rather than silently ignored.
fn parse_proxy(
    api_key: Option<String>,
    endpoint: Option<String>,
) -> Result<Option<ProxyCredentials>, ConfigError> {
    match (api_key, endpoint) {
        (None, None) => Ok(None),
        (None, Some(_)) => Err(ConfigError::MissingEnvVar(
            "PRICEWATCH_PROXY_API_KEY".to_string(),
        )),
        (Some(api_key), endpoint) => {
            let endpoint = endpoint.unwrap_or_else(|| DEFAULT_PROXY_ENDPOINT.to_string());
            let has_scheme = endpoint.starts_with("http://") || endpoint.starts_with("https://");
            let has_host = endpoint
                .split_once("://")
                .is_some_and(|(_, rest)| !rest.trim_start_matches('/').is_empty());
            if !has_scheme || !has_host {
                return Err(ConfigError::InvalidEnvVar {
                    var: "PRICEWATCH_PROXY_ENDPOINT".to_string(),
                    reason: format!("\"{endpoint}\" is not an http(s) URL"),
                });
            }
            Ok(Some(ProxyCredentials { endpoint, api_key }))
        }
    }
}

/// Parse a string into an `Environment` variant.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` for unrecognized values.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "PRICEWATCH_ENV".to_string(),
            reason: format!("unknown environment \"{other}\""),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
