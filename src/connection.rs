//! Request/response contract for ACME calls: nonce management,
//! `badNonce` retry-once, and RFC 7807 problem classification.
use crate::crypto::jws::SignedBody;
use crate::error::{AcmeError, Problem, Result};
use crate::json::JsonView;
use crate::protocol::NonceCell;
use crate::transport::{parse_link_header, parse_retry_after, HttpRequest, HttpResponseMessage, HttpTransport};
use std::sync::Arc;

/// Issues signed and unsigned requests against one ACME server,
/// owning the nonce cell for that server.
pub struct Connection {
    transport: Arc<dyn HttpTransport>,
    nonce: NonceCell,
}

impl Connection {
    pub fn new(transport: Arc<dyn HttpTransport>, new_nonce_url: &str) -> Self {
        Self {
            nonce: NonceCell::new(new_nonce_url, transport.clone()),
            transport,
        }
    }

    /// Plain, unsigned GET (used for the directory and for plain
    /// resource fetches — e.g. the certificate chain — that are
    /// exceptions to the POST-as-GET rule).
    pub async fn get(&self, url: &str) -> Result<JsonView> {
        let response = self.transport.get(url).await?;
        if !response.is_success() {
            return Err(self.classify_error(&response, url));
        }
        Ok(JsonView::new(
            response.json_body().unwrap_or(serde_json::Value::Null),
            url.to_string(),
        ))
    }

    /// Download a raw body (e.g. a PEM certificate chain) over an
    /// unsigned GET.
    pub async fn get_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.transport.get(url).await?;
        if !response.is_success() {
            return Err(self.classify_error(&response, url));
        }
        Ok(response.body)
    }

    /// Issue a signed POST, retrying exactly once if the server
    /// rejects the first nonce with `badNonce` (RFC 8555 §6.5).
    /// `sign` receives the nonce to embed and returns a ready
    /// envelope; it is re-invoked on the retry with the fresh nonce.
    pub async fn post_signed(
        &self,
        url: &str,
        sign: impl Fn(&str) -> Result<SignedBody>,
    ) -> Result<(JsonView, HttpResponseMessage)> {
        for attempt in 0..2u8 {
            let nonce = self.nonce.take().await?;
            let body = sign(&nonce)?;
            let payload = serde_json::to_vec(&body.to_json()).map_err(AcmeError::Json)?;
            let response = self.transport.post_jose(url, payload).await?;

            if let Some(fresh_nonce) = response.header("replay-nonce") {
                self.nonce.store(fresh_nonce.to_string()).await;
            }

            if response.is_success() {
                return Ok((
                    JsonView::new(response.json_body().unwrap_or(serde_json::Value::Null), url.to_string()),
                    response,
                ));
            }

            let error = self.classify_error(&response, url);
            if attempt == 0 && error.is_bad_nonce() {
                continue;
            }
            return Err(error);
        }
        unreachable!("post_signed always returns within two attempts")
    }

    /// Certificate-GET (RFC 8555 §7.4.2, §4.4 table row): a signed
    /// POST-as-GET that asks for `Accept:
    /// application/pem-certificate-chain` instead of JSON, returning
    /// the raw PEM body rather than a parsed document.
    pub async fn certificate_fetch(
        &self,
        url: &str,
        sign: impl Fn(&str) -> Result<SignedBody>,
    ) -> Result<(Vec<u8>, HttpResponseMessage)> {
        for attempt in 0..2u8 {
            let nonce = self.nonce.take().await?;
            let body = sign(&nonce)?;
            let payload = serde_json::to_vec(&body.to_json()).map_err(AcmeError::Json)?;
            let request = HttpRequest::post_jose(url, payload).with_accept("application/pem-certificate-chain");
            let response = self.transport.execute(request).await?;

            if let Some(fresh_nonce) = response.header("replay-nonce") {
                self.nonce.store(fresh_nonce.to_string()).await;
            }

            if response.is_success() {
                return Ok((response.body.clone(), response));
            }

            let error = self.classify_error(&response, url);
            if attempt == 0 && error.is_bad_nonce() {
                continue;
            }
            return Err(error);
        }
        unreachable!("certificate_fetch always returns within two attempts")
    }

    fn classify_error(&self, response: &HttpResponseMessage, request_url: &str) -> AcmeError {
        let links = parse_link_header(&response.headers_named("link"));
        let help_docs: Vec<String> = links
            .iter()
            .filter(|l| l.rel == "help")
            .map(|l| l.target.clone())
            .collect();
        let terms_of_service = links
            .iter()
            .find(|l| l.rel == "termsOfService")
            .map(|l| l.target.clone());
        let retry_after = response
            .header("retry-after")
            .and_then(|v| parse_retry_after(v, jiff::Timestamp::now()));

        let is_problem_json = response
            .header("content-type")
            .is_some_and(|ct| ct.starts_with("application/problem+json"));

        if is_problem_json {
            if let Ok(raw) = response.json_body() {
                let problem = Problem::from_json(raw, request_url);
                return AcmeError::from_problem(problem, retry_after, help_docs, terms_of_service);
            }
        }

        AcmeError::ServerError {
            status: response.status,
            status_text: String::from_utf8_lossy(&response.body).into_owned(),
        }
    }
}
