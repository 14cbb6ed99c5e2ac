//! Challenge resources (RFC 8555 §8): a closed, data-only
//! representation of whatever validation methods the CA offers for an
//! authorization, with the common `trigger`/`update` lifecycle every
//! type shares. Solving a challenge (serving the HTTP token, publishing
//! the DNS record) is an application-layer concern this crate does not
//! perform.
use crate::crypto::encoding::Base64Encoding;
use crate::crypto::hash::Sha256Hash;
use crate::error::{AcmeError, Result};
use crate::login::Login;
use crate::resource::HasStatus;
use crate::transport::RetryStrategy;
use crate::types::Status;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::Mutex;

/// The challenge's JSON representation, as returned by the server.
/// Fields not relevant to a given `type` are simply absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengeWire {
    #[serde(rename = "type")]
    pub challenge_type: String,
    pub url: String,
    pub status: Status,
    #[serde(default)]
    pub validated: Option<Timestamp>,
    #[serde(default)]
    pub error: Option<Value>,
    #[serde(default)]
    pub token: Option<String>,
    /// `email-reply-00`'s expected sender address.
    #[serde(default)]
    pub from: Option<String>,
}

impl HasStatus for ChallengeWire {
    fn status(&self) -> Status {
        self.status
    }
}

/// The closed set of challenge types RFC 8555 and its extensions
/// define. An unrecognized `type` string classifies as `Generic`
/// rather than failing to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChallengeKind {
    Http01,
    Dns01,
    TlsAlpn01,
    DnsAccount01,
    EmailReply00,
    Generic,
}

impl ChallengeKind {
    pub fn classify(type_str: &str) -> Self {
        match type_str {
            "http-01" => ChallengeKind::Http01,
            "dns-01" => ChallengeKind::Dns01,
            "tls-alpn-01" => ChallengeKind::TlsAlpn01,
            "dns-account-01" => ChallengeKind::DnsAccount01,
            "email-reply-00" => ChallengeKind::EmailReply00,
            _ => ChallengeKind::Generic,
        }
    }
}

/// A bound challenge: header fields common to every type, plus the
/// type-specific key material (§8) derived from the account key and
/// token rather than modeled as separate Rust types per kind.
pub struct Challenge {
    location: String,
    login: Login,
    cached: Mutex<Option<ChallengeWire>>,
}

impl Challenge {
    pub fn bind(location: impl Into<String>, login: Login) -> Self {
        Self {
            location: location.into(),
            login,
            cached: Mutex::new(None),
        }
    }

    /// Build a challenge from a JSON object already fetched as part of
    /// its owning authorization, with no extra round trip.
    pub fn from_wire(wire: ChallengeWire, login: Login) -> Self {
        let location = wire.url.clone();
        Self {
            location,
            login,
            cached: Mutex::new(Some(wire)),
        }
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn login(&self) -> &Login {
        &self.login
    }

    pub async fn get(&self) -> Result<ChallengeWire> {
        {
            let cached = self.cached.lock().await;
            if let Some(wire) = cached.as_ref() {
                return Ok(wire.clone());
            }
        }
        self.update().await
    }

    pub async fn update(&self) -> Result<ChallengeWire> {
        let (view, _response) = self.login.post_as_get(&self.location).await?;
        let data: ChallengeWire = view.as_typed()?;
        let mut cached = self.cached.lock().await;
        *cached = Some(data.clone());
        Ok(data)
    }

    pub async fn kind(&self) -> Result<ChallengeKind> {
        Ok(ChallengeKind::classify(&self.get().await?.challenge_type))
    }

    pub async fn token(&self) -> Result<String> {
        self.get()
            .await?
            .token
            .ok_or_else(|| AcmeError::protocol("challenge has no token"))
    }

    /// `token + "." + thumbprint(accountKey)` (§8.1), the proof
    /// material `http-01`/`tls-alpn-01` validation checks for.
    pub async fn key_authorization(&self) -> Result<String> {
        let token = self.token().await?;
        let key = self.login.key_snapshot().await;
        let jwk = key.public_jwk()?;
        let thumbprint = jwk.thumbprint_sha256()?;
        Ok(format!("{token}.{thumbprint}"))
    }

    /// `base64url(sha256(keyAuthorization))` (§8.4), the value a
    /// `dns-01` TXT record publishes.
    pub async fn digest(&self) -> Result<String> {
        let key_authorization = self.key_authorization().await?;
        Ok(Base64Encoding::encode(&Sha256Hash::hash(
            key_authorization.as_bytes(),
        )))
    }

    /// POST an empty object to the challenge URL, asking the server to
    /// begin validation (§7.5.1). The challenge must be `pending`
    /// beforehand.
    pub async fn trigger(&self) -> Result<ChallengeWire> {
        let current = self.get().await?;
        if current.status != Status::Pending {
            return Err(AcmeError::invalid_argument(format!(
                "challenge must be pending to trigger, was {}",
                current.status
            )));
        }
        let (view, _response) = self.login.post(&self.location, &json!({})).await?;
        let data: ChallengeWire = view.as_typed()?;
        let mut cached = self.cached.lock().await;
        *cached = Some(data.clone());
        Ok(data)
    }

    /// Poll until the challenge reaches `valid` or any terminal status,
    /// or `timeout` elapses.
    pub async fn wait_for_completion(&self, timeout: std::time::Duration) -> Result<ChallengeWire> {
        let clock = self.login.session.clock().clone();
        let start = clock.now();
        let deadline = start
            .checked_add(jiff::Span::new().seconds(timeout.as_secs() as i64))
            .unwrap_or(start);
        if start >= deadline {
            return Err(AcmeError::TimeoutExceeded);
        }
        let strategy = RetryStrategy::polling();
        let mut attempt = 0u32;
        loop {
            let data = self.update().await?;
            if data.status == Status::Valid || data.status.is_terminal() {
                return Ok(data);
            }
            if clock.now() >= deadline {
                return Err(AcmeError::TimeoutExceeded);
            }
            clock.sleep(strategy.delay(attempt)).await;
            attempt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_recognizes_known_types() {
        assert_eq!(ChallengeKind::classify("http-01"), ChallengeKind::Http01);
        assert_eq!(ChallengeKind::classify("dns-01"), ChallengeKind::Dns01);
        assert_eq!(
            ChallengeKind::classify("tls-alpn-01"),
            ChallengeKind::TlsAlpn01
        );
        assert_eq!(
            ChallengeKind::classify("vendor-custom-01"),
            ChallengeKind::Generic
        );
    }

    #[test]
    fn wire_parses_http01_with_token() {
        let json = r#"{"type": "http-01", "url": "https://ca.example/chall/1", "status": "pending", "token": "tok"}"#;
        let wire: ChallengeWire = serde_json::from_str(json).unwrap();
        assert_eq!(wire.token.as_deref(), Some("tok"));
        assert_eq!(wire.status(), Status::Pending);
    }

    #[tokio::test]
    async fn wait_for_completion_with_zero_timeout_makes_no_network_call() {
        use crate::crypto::{KeyPair, KeyType};
        use crate::session::Session;
        use crate::transport::{HttpRequest, HttpResponseMessage, HttpTransport};
        use async_trait::async_trait;
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        struct PanicTransport {
            calls: AtomicUsize,
        }

        #[async_trait]
        impl HttpTransport for PanicTransport {
            async fn execute(&self, _request: HttpRequest) -> Result<HttpResponseMessage> {
                self.calls.fetch_add(1, Ordering::SeqCst);
                panic!("network call made despite a zero timeout");
            }
        }

        let transport = Arc::new(PanicTransport {
            calls: AtomicUsize::new(0),
        });
        let session = Arc::new(Session::new("https://ca.example/directory", transport.clone()));
        let key = KeyPair::generate(KeyType::EcdsaP256).unwrap();
        let login = Login::new(session, "https://ca.example/acct/1", key);
        let challenge = Challenge::bind("https://ca.example/chall/1", login);

        let err = challenge
            .wait_for_completion(std::time::Duration::ZERO)
            .await
            .unwrap_err();
        assert!(matches!(err, AcmeError::TimeoutExceeded));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }
}
