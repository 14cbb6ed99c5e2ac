//! Anti-replay nonce handling, RFC 8555 §6.5.
//!
//! A single cached nonce is held at a time — nonces are never
//! prefetched ahead of a request, since a speculative nonce that goes
//! unused is simply wasted on the next `badNonce` the server hands out
//! instead.
use crate::error::{AcmeError, Result};
use crate::transport::HttpTransport;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Holds at most one unused nonce, refilled from the `newNonce`
/// endpoint via `HEAD` on demand.
pub struct NonceCell {
    new_nonce_url: String,
    transport: Arc<dyn HttpTransport>,
    cached: Mutex<Option<String>>,
}

impl NonceCell {
    pub fn new(new_nonce_url: impl Into<String>, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            new_nonce_url: new_nonce_url.into(),
            transport,
            cached: Mutex::new(None),
        }
    }

    /// Take the cached nonce if one is available, otherwise fetch a
    /// fresh one with `HEAD newNonce`.
    pub async fn take(&self) -> Result<String> {
        {
            let mut cached = self.cached.lock().await;
            if let Some(nonce) = cached.take() {
                return Ok(nonce);
            }
        }
        self.fetch().await
    }

    /// Store a nonce handed back on a response (every ACME response
    /// carries a fresh `Replay-Nonce`), so the next request need not
    /// round-trip for one.
    pub async fn store(&self, nonce: String) {
        let mut cached = self.cached.lock().await;
        *cached = Some(nonce);
    }

    async fn fetch(&self) -> Result<String> {
        let response = self.transport.head(&self.new_nonce_url).await?;
        response
            .header("replay-nonce")
            .map(|s| s.to_string())
            .ok_or_else(|| AcmeError::protocol("newNonce response missing Replay-Nonce header"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{HttpRequest, HttpResponseMessage};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingTransport {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl HttpTransport for CountingTransport {
        async fn execute(&self, _request: HttpRequest) -> Result<HttpResponseMessage> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(HttpResponseMessage {
                status: 200,
                headers: vec![("replay-nonce".to_string(), "fetched-nonce".to_string())],
                body: Vec::new(),
            })
        }
    }

    #[tokio::test]
    async fn take_without_cache_fetches() {
        let transport = Arc::new(CountingTransport {
            calls: AtomicUsize::new(0),
        });
        let cell = NonceCell::new("https://ca.example/new-nonce", transport.clone());
        let nonce = cell.take().await.unwrap();
        assert_eq!(nonce, "fetched-nonce");
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn store_then_take_avoids_a_fetch() {
        let transport = Arc::new(CountingTransport {
            calls: AtomicUsize::new(0),
        });
        let cell = NonceCell::new("https://ca.example/new-nonce", transport.clone());
        cell.store("cached-nonce".to_string()).await;
        let nonce = cell.take().await.unwrap();
        assert_eq!(nonce, "cached-nonce");
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }
}
