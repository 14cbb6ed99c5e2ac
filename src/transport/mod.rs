//! Transport layer: the `HttpTransport` seam ACME requests are issued
//! through, its default `reqwest` implementation, retry/backoff
//! policy, and RFC 8288/`Retry-After` header parsing.
pub mod headers;
pub mod http_client;
pub mod retry;

pub use headers::{parse_link_header, parse_retry_after, LinkRelation};
pub use http_client::ReqwestTransport;
pub use retry::RetryStrategy;

use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;

/// An outbound HTTP request, shaped for what a signed ACME call needs:
/// a method, a URL, a JSON body (already JOSE-enveloped by the caller),
/// and headers (namely `Content-Type: application/jose+json`).
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Head,
    Post,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn head(url: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Head,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn post_jose(url: impl Into<String>, body: Vec<u8>) -> Self {
        Self {
            method: HttpMethod::Post,
            url: url.into(),
            headers: vec![(
                "content-type".to_string(),
                "application/jose+json".to_string(),
            )],
            body: Some(body),
        }
    }

    pub fn conditional_get(url: impl Into<String>, if_modified_since: Option<&str>) -> Self {
        let mut req = Self::get(url);
        if let Some(ims) = if_modified_since {
            req.headers
                .push(("if-modified-since".to_string(), ims.to_string()));
        }
        req
    }

    /// Override the `Accept` header on an already-built request — used
    /// by the certificate-GET request, which asks for
    /// `application/pem-certificate-chain` instead of JSON.
    pub fn with_accept(mut self, accept: impl Into<String>) -> Self {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case("accept"));
        self.headers.push(("accept".to_string(), accept.into()));
        self
    }
}

/// Response counterpart of [`HttpRequest`]. Headers are matched
/// case-insensitively via [`HttpResponseMessage::header`].
#[derive(Debug, Clone)]
pub struct HttpResponseMessage {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponseMessage {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn headers_named(&self, name: &str) -> Vec<&str> {
        self.headers
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
            .collect()
    }

    pub fn as_map(&self) -> HashMap<String, String> {
        self.headers.iter().cloned().collect()
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_not_modified(&self) -> bool {
        self.status == 304
    }

    pub fn json_body(&self) -> Result<serde_json::Value> {
        serde_json::from_slice(&self.body).map_err(crate::error::AcmeError::Json)
    }
}

/// The pluggable external collaborator for issuing HTTP requests. The
/// default implementation wraps `reqwest`; tests and embedders supply
/// their own.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponseMessage>;

    async fn get(&self, url: &str) -> Result<HttpResponseMessage> {
        self.execute(HttpRequest::get(url)).await
    }

    async fn head(&self, url: &str) -> Result<HttpResponseMessage> {
        self.execute(HttpRequest::head(url)).await
    }

    async fn post_jose(&self, url: &str, body: Vec<u8>) -> Result<HttpResponseMessage> {
        self.execute(HttpRequest::post_jose(url, body)).await
    }
}
