//! Resilient HTTP retrieval of product pages.
//!
//! [`Fetcher::fetch`] drives the [`FetchPhase`] state machine: direct
//! attempts with rotating user-agents and backoff, then at most one proxy hop
//! when a challenge page persists. Transport and status failures end in a
//! [`FetchResult`] with empty HTML; only a bad target URL or configuration is
//! an `Err`.

mod backoff;
mod challenge;
mod host_limit;
mod proxy;
mod state;
mod user_agent;

use std::time::Duration;

use pricewatch_core::{AppConfig, ProxyCredentials};
use rand::Rng;
use reqwest::{header, Client, Response, Url};

use crate::error::ScraperError;
use host_limit::HostLimiter;
use proxy::{redact_api_key, ProxyRoute};
use state::classify_response;

pub use backoff::{BackoffPolicy, BackoffSchedule};
pub use state::{AttemptFailure, AttemptOutcome, FetchPhase};
pub use user_agent::{pick_user_agent, USER_AGENT_POOL};

const DEFAULT_ACCEPT: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8";
const DEFAULT_ACCEPT_LANGUAGE: &str = "pt-BR,pt;q=0.9,en-US;q=0.8,en;q=0.7";
const DEFAULT_REFERER: &str = "https://www.google.com/";
/// Bodies larger than this are abandoned mid-download.
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Total per-request timeout.
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
    /// Direct attempts before giving up or escalating to the proxy.
    pub max_attempts: u32,
    pub backoff: BackoffPolicy,
    pub max_connections_per_host: usize,
    /// Responses larger than this count as a failed attempt.
    pub max_body_bytes: usize,
    pub accept_language: String,
    pub referer: String,
    /// Fixed `User-Agent`; `None` rotates through [`USER_AGENT_POOL`].
    pub user_agent: Option<String>,
    /// Send `Cache-Control`, `DNT` and `Upgrade-Insecure-Requests`.
    pub privacy_headers: bool,
    pub proxy: Option<ProxyCredentials>,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 25,
            connect_timeout_secs: 10,
            max_attempts: 3,
            backoff: BackoffPolicy::default(),
            max_connections_per_host: 4,
            max_body_bytes: MAX_BODY_BYTES,
            accept_language: DEFAULT_ACCEPT_LANGUAGE.to_owned(),
            referer: DEFAULT_REFERER.to_owned(),
            user_agent: None,
            privacy_headers: true,
            proxy: None,
        }
    }
}

impl FetcherConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            timeout_secs: config.scraper_request_timeout_secs,
            max_attempts: config.scraper_max_attempts,
            backoff: BackoffPolicy {
                base_secs: config.scraper_backoff_base_secs,
                jitter_ms: config.scraper_backoff_jitter_ms,
            },
            max_connections_per_host: config.scraper_max_connections_per_host,
            accept_language: config.scraper_accept_language.clone(),
            user_agent: config.scraper_user_agent.clone(),
            proxy: config.proxy.clone(),
            ..Self::default()
        }
    }
}

/// Per-call options.
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    /// Overrides both the configured user-agent and the rotation pool.
    pub user_agent: Option<String>,
    /// Allow the single proxy hop when the direct attempts end on a challenge.
    pub use_proxy: bool,
}

#[derive(Debug, Clone)]
pub struct FetchResult {
    /// Page body; empty unless `phase` is [`FetchPhase::Succeeded`].
    pub html: String,
    /// Status of the last response received, if any.
    pub status: Option<u16>,
    /// URL actually retrieved. After a redirect this is the final location;
    /// after the proxy hop it is the proxy URL with the API key masked.
    pub final_url: String,
    /// Any attempt hit an anti-bot challenge page.
    pub challenge_detected: bool,
    /// Requests made, the proxy hop included.
    pub attempts: u32,
    pub phase: FetchPhase,
    pub via_proxy: bool,
}

impl FetchResult {
    #[must_use]
    pub fn is_usable(&self) -> bool {
        self.phase == FetchPhase::Succeeded && !self.html.is_empty()
    }
}

/// Result of one HTTP request.
struct AttemptReport {
    outcome: AttemptOutcome,
    status: Option<u16>,
    final_url: Option<Url>,
}

/// Shared, cheaply reusable page fetcher. One instance should serve every
/// concurrent caller so the per-host cap applies across them.
#[derive(Debug)]
pub struct Fetcher {
    client: Client,
    config: FetcherConfig,
    hosts: HostLimiter,
    proxy: Option<ProxyRoute>,
}

impl Fetcher {
    /// # Errors
    ///
    /// - [`ScraperError::InvalidProxyEndpoint`] if proxy credentials are set
    ///   but the endpoint is not an absolute `http(s)` URL.
    /// - [`ScraperError::Http`] if the HTTP client cannot be built.
    pub fn new(config: FetcherConfig) -> Result<Self, ScraperError> {
        let proxy = config
            .proxy
            .as_ref()
            .map(|p| ProxyRoute::parse(&p.endpoint, &p.api_key))
            .transpose()?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .pool_max_idle_per_host(config.max_connections_per_host)
            .build()?;
        Ok(Self {
            client,
            hosts: HostLimiter::new(config.max_connections_per_host),
            config,
            proxy,
        })
    }

    /// Fetch `url`, retrying and escalating as configured.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidUrl`] if `url` is not an absolute
    /// `http(s)` URL. Network and HTTP failures never produce an `Err`.
    pub async fn fetch(
        &self,
        url: &str,
        options: &FetchOptions,
    ) -> Result<FetchResult, ScraperError> {
        let target = parse_target(url)?;
        let proxy = self.proxy.as_ref().filter(|_| options.use_proxy);
        let max_attempts = self.config.max_attempts.max(1);
        let mut schedule = self.config.backoff.schedule();

        let mut phase = FetchPhase::Direct;
        let mut attempts = 0u32;
        let mut status = None;
        let mut challenge_detected = false;
        let mut via_proxy = false;
        let mut final_url = target.to_string();

        while !phase.is_terminal() {
            let report = match (phase, proxy) {
                (FetchPhase::ProxyFallback, Some(route)) => {
                    let proxy_url = route.request_url(target.as_str());
                    final_url = redact_api_key(&proxy_url);
                    via_proxy = true;
                    tracing::warn!(url, attempts, proxy_url = %final_url, "challenge persisted; retrying once through proxy");

                    attempts += 1;
                    let user_agent = choose_user_agent(options, &self.config, &mut rand::rng());
                    self.attempt(&proxy_url, user_agent).await
                }
                _ => {
                    if attempts > 0 {
                        let delay = schedule.next_delay(attempts, &mut rand::rng());
                        tracing::warn!(
                            url,
                            attempt = attempts + 1,
                            max_attempts,
                            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                            phase = %phase,
                            "retrying page fetch after backoff"
                        );
                        tokio::time::sleep(delay).await;
                    }
                    attempts += 1;

                    let user_agent = choose_user_agent(options, &self.config, &mut rand::rng());
                    self.attempt(&target, user_agent).await
                }
            };

            // A transport failure carries no status; keep the last one seen.
            status = report.status.or(status);
            challenge_detected |= matches!(report.outcome, AttemptOutcome::Challenge { .. });
            let attempt_budget = if via_proxy {
                max_attempts.saturating_add(1)
            } else {
                max_attempts
            };
            log_attempt(url, attempts, attempt_budget, &report.outcome);

            phase = phase.next(&report.outcome, attempts, max_attempts, proxy.is_some());
            if let AttemptOutcome::Usable(html) = report.outcome {
                if let (false, Some(redirected)) = (via_proxy, report.final_url) {
                    final_url = redirected.to_string();
                }
                return Ok(FetchResult {
                    html,
                    status,
                    final_url,
                    challenge_detected,
                    attempts,
                    phase,
                    via_proxy,
                });
            }
        }

        if via_proxy {
            tracing::warn!(url, attempts, "proxy fallback did not return usable HTML");
        } else {
            tracing::warn!(
                url,
                attempts,
                challenge_detected,
                proxy_allowed = options.use_proxy,
                proxy_configured = self.proxy.is_some(),
                "page fetch failed after all attempts"
            );
        }
        Ok(FetchResult {
            html: String::new(),
            status,
            final_url,
            challenge_detected,
            attempts,
            phase,
            via_proxy,
        })
    }

    async fn attempt(&self, request_url: &Url, user_agent: &str) -> AttemptReport {
        let host = request_url.host_str().unwrap_or_default();
        let _permit = self.hosts.acquire(host).await;

        let mut request = self
            .client
            .get(request_url.clone())
            .header(header::USER_AGENT, user_agent)
            .header(header::ACCEPT, DEFAULT_ACCEPT)
            .header(header::ACCEPT_LANGUAGE, &self.config.accept_language)
            .header(header::REFERER, &self.config.referer)
            .header(header::CONNECTION, "keep-alive");
        if self.config.privacy_headers {
            request = request
                .header(header::CACHE_CONTROL, "no-cache")
                .header(header::DNT, "1")
                .header(header::UPGRADE_INSECURE_REQUESTS, "1");
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(err) => {
                return AttemptReport {
                    outcome: AttemptOutcome::Failed(transport_failure(&err)),
                    status: None,
                    final_url: None,
                }
            }
        };

        let status = response.status().as_u16();
        let final_url = response.url().clone();
        let outcome = match read_body(response, self.config.max_body_bytes).await {
            Ok(body) => classify_response(status, body),
            Err(failure) => AttemptOutcome::Failed(failure),
        };
        AttemptReport {
            outcome,
            status: Some(status),
            final_url: Some(final_url),
        }
    }
}

/// Per-call override, then configured agent, then a pick from the pool.
fn choose_user_agent<'a, R: Rng + ?Sized>(
    options: &'a FetchOptions,
    config: &'a FetcherConfig,
    rng: &mut R,
) -> &'a str {
    options
        .user_agent
        .as_deref()
        .or(config.user_agent.as_deref())
        .unwrap_or_else(|| pick_user_agent(rng))
}

fn parse_target(url: &str) -> Result<Url, ScraperError> {
    let invalid = |reason: String| ScraperError::InvalidUrl {
        url: url.to_owned(),
        reason,
    };
    let parsed = Url::parse(url.trim()).map_err(|e| invalid(e.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme \"{}\"", parsed.scheme())));
    }
    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(invalid("missing host".to_owned()));
    }
    Ok(parsed)
}

fn transport_failure(err: &reqwest::Error) -> AttemptFailure {
    AttemptFailure::Transport {
        timeout: err.is_timeout(),
        message: err.to_string(),
    }
}

/// Read the body chunk by chunk, giving up once it passes `limit` bytes.
async fn read_body(mut response: Response, limit: usize) -> Result<String, AttemptFailure> {
    let declared = response
        .content_length()
        .map(|len| usize::try_from(len).unwrap_or(usize::MAX));
    if declared.is_some_and(|len| len > limit) {
        return Err(AttemptFailure::Oversized { limit });
    }

    let mut body = Vec::with_capacity(declared.unwrap_or_default());
    while let Some(chunk) = response.chunk().await.map_err(|e| transport_failure(&e))? {
        if body.len().saturating_add(chunk.len()) > limit {
            return Err(AttemptFailure::Oversized { limit });
        }
        body.extend_from_slice(&chunk);
    }
    Ok(String::from_utf8_lossy(&body).into_owned())
}

fn log_attempt(url: &str, attempt: u32, max_attempts: u32, outcome: &AttemptOutcome) {
    match outcome {
        AttemptOutcome::Usable(html) => {
            tracing::debug!(url, attempt, bytes = html.len(), "page fetched");
        }
        AttemptOutcome::Challenge { status } => {
            tracing::warn!(url, attempt, max_attempts, status, "anti-bot challenge page detected");
        }
        AttemptOutcome::Failed(AttemptFailure::Status(status @ (403 | 429))) => {
            tracing::warn!(
                url,
                attempt,
                max_attempts,
                status,
                "request refused, likely bot mitigation"
            );
        }
        AttemptOutcome::Failed(failure) => {
            tracing::warn!(url, attempt, max_attempts, error = %failure, "page fetch attempt failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn user_agent_override_wins() {
        let options = FetchOptions {
            user_agent: Some("custom/1.0".to_owned()),
            use_proxy: false,
        };
        let config = FetcherConfig {
            user_agent: Some("configured/1.0".to_owned()),
            ..FetcherConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(choose_user_agent(&options, &config, &mut rng), "custom/1.0");
    }

    #[test]
    fn configured_user_agent_beats_rotation() {
        let config = FetcherConfig {
            user_agent: Some("configured/1.0".to_owned()),
            ..FetcherConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(
            choose_user_agent(&FetchOptions::default(), &config, &mut rng),
            "configured/1.0"
        );
    }

    #[test]
    fn rotation_used_without_overrides() {
        let mut rng = StdRng::seed_from_u64(0);
        let options = FetchOptions::default();
        let config = FetcherConfig::default();
        let ua = choose_user_agent(&options, &config, &mut rng);
        assert!(USER_AGENT_POOL.contains(&ua));
    }

    #[test]
    fn parse_target_accepts_http_and_https() {
        assert!(parse_target("https://shop.example.com/produto/1").is_ok());
        assert!(parse_target(" http://shop.example.com ").is_ok());
    }

    #[test]
    fn parse_target_rejects_relative_and_other_schemes() {
        assert!(matches!(
            parse_target("/produto/1"),
            Err(ScraperError::InvalidUrl { .. })
        ));
        assert!(matches!(
            parse_target("file:///etc/passwd"),
            Err(ScraperError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn config_defaults_match_documented_values() {
        let config = FetcherConfig::default();
        assert_eq!(config.timeout_secs, 25);
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.max_connections_per_host, 4);
        assert_eq!(config.max_body_bytes, 10 * 1024 * 1024);
        assert!(config.proxy.is_none());
    }

    #[test]
    fn new_rejects_bad_proxy_endpoint() {
        let config = FetcherConfig {
            proxy: Some(ProxyCredentials {
                endpoint: "not a url".to_owned(),
                api_key: "k".to_owned(),
            }),
            ..FetcherConfig::default()
        };
        assert!(matches!(
            Fetcher::new(config),
            Err(ScraperError::InvalidProxyEndpoint { .. })
        ));
    }
}
