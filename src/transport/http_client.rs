//! Default `HttpTransport` implementation, backed by `reqwest`.
use crate::error::{AcmeError, Result};
use crate::transport::{HttpMethod, HttpRequest, HttpResponseMessage, HttpTransport};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_CHARSET, ACCEPT_LANGUAGE};
use std::time::Duration;

/// Configuration for the default transport.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    pub timeout: Duration,
    pub user_agent: String,
    pub proxy: Option<String>,
    /// RFC 5646 locale tag sent as `Accept-Language` on every request
    /// (§4.4, §6 Configuration options).
    pub locale: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: format!("acmex-core/{}", env!("CARGO_PKG_VERSION")),
            proxy: None,
            locale: "en".to_string(),
        }
    }
}

impl HttpClientConfig {
    /// Build transport settings from an application [`Config`](crate::config::Config).
    pub fn from_config(config: &crate::config::Config) -> Self {
        Self {
            timeout: config.timeout(),
            proxy: config.network.proxy.clone(),
            locale: config.acme.locale.clone(),
            ..Self::default()
        }
    }
}

/// `HttpTransport` backed by a shared `reqwest::Client`.
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(config: HttpClientConfig) -> Result<Self> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_str(&config.locale)
                .map_err(|e| AcmeError::configuration(format!("invalid locale '{}': {e}", config.locale)))?,
        );
        default_headers.insert(ACCEPT_CHARSET, HeaderValue::from_static("utf-8"));

        let mut builder = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent)
            .default_headers(default_headers);
        if let Some(proxy) = &config.proxy {
            let proxy = reqwest::Proxy::all(proxy)
                .map_err(|e| AcmeError::configuration(format!("invalid proxy URL: {e}")))?;
            builder = builder.proxy(proxy);
        }
        let client = builder
            .build()
            .map_err(|e| AcmeError::transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new(HttpClientConfig::default()).expect("default HTTP client config is always valid")
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponseMessage> {
        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(&request.url),
            HttpMethod::Head => self.client.head(&request.url),
            HttpMethod::Post => self.client.post(&request.url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        tracing::debug!(method = ?request.method, url = %request.url, "sending ACME request");

        let response = builder
            .send()
            .await
            .map_err(|e| AcmeError::transport(format!("request to {} failed: {e}", request.url)))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or_default().to_string()))
            .collect();
        let body = response
            .bytes()
            .await
            .map_err(|e| AcmeError::transport(format!("failed to read response body: {e}")))?
            .to_vec();

        tracing::debug!(status, "received ACME response");

        Ok(HttpResponseMessage {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_sane_timeout() {
        let config = HttpClientConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[tokio::test]
    async fn reqwest_transport_builds_with_default_config() {
        let transport = ReqwestTransport::new(HttpClientConfig::default());
        assert!(transport.is_ok());
    }

    #[test]
    fn from_config_carries_locale_and_proxy() {
        let mut config = crate::config::Config::default();
        config.acme.locale = "fr-CH".to_string();
        config.network.proxy = Some("http://proxy.example:8080".to_string());
        let client_config = HttpClientConfig::from_config(&config);
        assert_eq!(client_config.locale, "fr-CH");
        assert_eq!(client_config.proxy.as_deref(), Some("http://proxy.example:8080"));
    }

    #[tokio::test]
    async fn non_default_locale_still_builds_a_client() {
        let mut config = HttpClientConfig::default();
        config.locale = "de-DE".to_string();
        assert!(ReqwestTransport::new(config).is_ok());
    }
}
