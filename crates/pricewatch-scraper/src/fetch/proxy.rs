//! Proxy fallback URL handling.

use reqwest::Url;

use crate::error::ScraperError;

/// Parsed proxy endpoint with its credential.
#[derive(Clone)]
pub(crate) struct ProxyRoute {
    endpoint: Url,
    api_key: String,
}

impl std::fmt::Debug for ProxyRoute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyRoute")
            .field("endpoint", &self.endpoint.as_str())
            .field("api_key", &"[redacted]")
            .finish()
    }
}

impl ProxyRoute {
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidProxyEndpoint`] unless `endpoint` is an
    /// absolute `http`/`https` URL with a host, or when the key is blank.
    pub(crate) fn parse(endpoint: &str, api_key: &str) -> Result<Self, ScraperError> {
        let invalid = |reason: String| ScraperError::InvalidProxyEndpoint {
            endpoint: endpoint.to_owned(),
            reason,
        };
        let url = Url::parse(endpoint).map_err(|e| invalid(e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme \"{}\"", url.scheme())));
        }
        if url.host_str().is_none_or(str::is_empty) {
            return Err(invalid("missing host".to_owned()));
        }
        if api_key.trim().is_empty() {
            return Err(invalid("API key is empty".to_owned()));
        }
        Ok(Self {
            endpoint: url,
            api_key: api_key.to_owned(),
        })
    }

    /// `endpoint?api_key=<key>&url=<target>`, keeping any query the endpoint
    /// already carries.
    pub(crate) fn request_url(&self, target: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("api_key", &self.api_key)
            .append_pair("url", target);
        url
    }
}

/// Render a proxy request URL with the credential masked, for results and logs.
pub(crate) fn redact_api_key(url: &Url) -> String {
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let value = if k == "api_key" {
                "REDACTED".to_owned()
            } else {
                v.into_owned()
            };
            (k.into_owned(), value)
        })
        .collect();
    let mut redacted = url.clone();
    redacted.query_pairs_mut().clear().extend_pairs(pairs);
    redacted.to_string()
}
