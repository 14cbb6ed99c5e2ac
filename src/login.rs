//! A login pairs an authenticated [`Session`] with the account's key
//! and URL, the unit every resource method signs requests against.
use crate::crypto::jws::{sign_post_as_get, sign_with_kid};
use crate::crypto::KeyPair;
use crate::error::Result;
use crate::json::JsonView;
use crate::session::Session;
use crate::transport::HttpResponseMessage;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::RwLock;

/// An authenticated binding to an ACME account: its URL (the `kid`
/// used in every signed request) and the key currently proving
/// control of it. The key is held behind a lock so a key rollover can
/// swap it in place without invalidating outstanding clones of the
/// login.
#[derive(Clone)]
pub struct Login {
    pub session: Arc<Session>,
    pub account_url: String,
    key: Arc<RwLock<KeyPair>>,
}

impl Login {
    pub fn new(session: Arc<Session>, account_url: impl Into<String>, key: KeyPair) -> Self {
        Self {
            session,
            account_url: account_url.into(),
            key: Arc::new(RwLock::new(key)),
        }
    }

    /// Replace the signing key in place, used after a successful key
    /// rollover (RFC 8555 §7.3.5) so existing `Login` clones keep
    /// working under the new key.
    pub async fn rekey(&self, new_key: KeyPair) {
        let mut guard = self.key.write().await;
        *guard = new_key;
    }

    pub async fn key_snapshot(&self) -> KeyPair {
        self.key.read().await.clone()
    }

    /// POST-as-GET: the form RFC 8555 §6.3 requires for reading any
    /// resource except the directory and certificate downloads.
    pub async fn post_as_get(&self, url: &str) -> Result<(JsonView, HttpResponseMessage)> {
        let connection = self.session.connection().await?;
        let key = self.key.read().await;
        let account_url = self.account_url.as_str();
        connection
            .post_signed(url, |nonce| sign_post_as_get(&key, account_url, nonce, url))
            .await
    }

    /// A signed POST carrying `payload`, authenticated by `kid`.
    pub async fn post(&self, url: &str, payload: &Value) -> Result<(JsonView, HttpResponseMessage)> {
        let connection = self.session.connection().await?;
        let key = self.key.read().await;
        let account_url = self.account_url.as_str();
        connection
            .post_signed(url, |nonce| sign_with_kid(&key, account_url, payload, nonce, url))
            .await
    }
}
