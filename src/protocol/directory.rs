//! ACME directory resource (RFC 8555 §7.1.1) with HTTP freshness-aware
//! caching.
use crate::error::{AcmeError, Result};
use crate::transport::HttpTransport;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

/// The directory object, naming every other endpoint in the ACME API.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Directory {
    #[serde(rename = "newNonce")]
    pub new_nonce: String,
    #[serde(rename = "newAccount")]
    pub new_account: String,
    #[serde(rename = "newOrder")]
    pub new_order: String,
    #[serde(rename = "newAuthz", skip_serializing_if = "Option::is_none")]
    pub new_authz: Option<String>,
    #[serde(rename = "revokeCert")]
    pub revoke_cert: String,
    #[serde(rename = "keyChange")]
    pub key_change: String,
    #[serde(rename = "renewalInfo", skip_serializing_if = "Option::is_none")]
    pub renewal_info: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<DirectoryMeta>,
}

impl Directory {
    pub fn supports_ari(&self) -> bool {
        self.renewal_info.is_some()
    }

    pub fn supports_auto_renewal(&self) -> bool {
        self.meta.as_ref().is_some_and(|m| m.auto_renewal.is_some())
    }

    pub fn supports_external_account_binding(&self) -> bool {
        self.meta
            .as_ref()
            .and_then(|m| m.external_account_required)
            .unwrap_or(false)
    }

    pub fn supports_profile(&self, name: &str) -> bool {
        self.meta
            .as_ref()
            .and_then(|m| m.profiles.as_ref())
            .is_some_and(|profiles| profiles.contains_key(name))
    }
}

/// Directory `meta` members, including the STAR auto-renewal (RFC 9773)
/// and subdomain-auth extension fields and the `profiles` map an ACME
/// CA advertises.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct DirectoryMeta {
    #[serde(rename = "termsOfService", skip_serializing_if = "Option::is_none")]
    pub terms_of_service: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(rename = "caaIdentities", skip_serializing_if = "Option::is_none")]
    pub caa_identities: Option<Vec<String>>,
    #[serde(rename = "externalAccountRequired", skip_serializing_if = "Option::is_none")]
    pub external_account_required: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profiles: Option<std::collections::HashMap<String, String>>,
    #[serde(rename = "subdomainAuthAllowed", skip_serializing_if = "Option::is_none")]
    pub subdomain_auth_allowed: Option<bool>,
    #[serde(rename = "autoRenewal", skip_serializing_if = "Option::is_none")]
    pub auto_renewal: Option<AutoRenewalMeta>,
}

/// STAR (RFC 9773) auto-renewal capability advertisement.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AutoRenewalMeta {
    #[serde(rename = "minLifetime", skip_serializing_if = "Option::is_none")]
    pub min_lifetime: Option<u64>,
    #[serde(rename = "maxDuration", skip_serializing_if = "Option::is_none")]
    pub max_duration: Option<u64>,
    #[serde(rename = "allowCertGet", skip_serializing_if = "Option::is_none")]
    pub allow_cert_get: Option<bool>,
}

struct CachedDirectory {
    directory: Directory,
    etag_or_last_modified: Option<String>,
    expires_at: Option<jiff::Timestamp>,
}

/// Caches the directory in memory, honoring `Cache-Control: max-age`
/// and `Expires` for freshness, and `Last-Modified`/`ETag` for a
/// conditional `If-Modified-Since` re-fetch once the cache goes stale.
pub struct DirectoryCache {
    url: String,
    transport: Arc<dyn HttpTransport>,
    cached: RwLock<Option<CachedDirectory>>,
}

impl DirectoryCache {
    pub fn new(url: impl Into<String>, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            url: url.into(),
            transport,
            cached: RwLock::new(None),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Return the cached directory if still fresh, otherwise
    /// conditionally re-fetch (or fetch cold).
    pub async fn get(&self, now: jiff::Timestamp) -> Result<Directory> {
        {
            let cached = self.cached.read().await;
            if let Some(entry) = cached.as_ref() {
                if entry.expires_at.is_none_or(|exp| now < exp) {
                    return Ok(entry.directory.clone());
                }
            }
        }
        self.revalidate().await
    }

    pub async fn invalidate(&self) {
        let mut cached = self.cached.write().await;
        *cached = None;
    }

    async fn revalidate(&self) -> Result<Directory> {
        let conditional = {
            let cached = self.cached.read().await;
            cached.as_ref().and_then(|e| e.etag_or_last_modified.clone())
        };

        let response = self
            .transport
            .execute(crate::transport::HttpRequest::conditional_get(
                self.url.clone(),
                conditional.as_deref(),
            ))
            .await?;

        if response.is_not_modified() {
            let cached = self.cached.read().await;
            if let Some(entry) = cached.as_ref() {
                return Ok(entry.directory.clone());
            }
        }

        if !response.is_success() {
            return Err(AcmeError::protocol(format!(
                "failed to fetch directory: HTTP {}",
                response.status
            )));
        }

        let directory: Directory = response
            .json_body()
            .and_then(|v| serde_json::from_value(v).map_err(AcmeError::Json))?;

        let expires_at = freshness_deadline(&response);
        let etag_or_last_modified = response
            .header("last-modified")
            .map(String::from)
            .or_else(|| response.header("etag").map(String::from));

        let mut cached = self.cached.write().await;
        *cached = Some(CachedDirectory {
            directory: directory.clone(),
            etag_or_last_modified,
            expires_at,
        });

        Ok(directory)
    }
}

/// Compute when a directory response should be considered stale,
/// preferring `Cache-Control: max-age`, then `Expires`, matching
/// standard HTTP freshness calculation (RFC 9111 §4.2).
fn freshness_deadline(response: &crate::transport::HttpResponseMessage) -> Option<jiff::Timestamp> {
    if let Some(cache_control) = response.header("cache-control") {
        for directive in cache_control.split(',') {
            let directive = directive.trim();
            if let Some(age) = directive.strip_prefix("max-age=") {
                if let Ok(seconds) = age.parse::<i64>() {
                    return jiff::Timestamp::now()
                        .checked_add(jiff::Span::new().seconds(seconds))
                        .ok();
                }
            }
            if directive.eq_ignore_ascii_case("no-store") || directive.eq_ignore_ascii_case("no-cache") {
                return Some(jiff::Timestamp::now());
            }
        }
    }
    if let Some(expires) = response.header("expires") {
        return crate::transport::parse_retry_after(expires, jiff::Timestamp::now());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_parses_ari_and_eab_meta() {
        let json = r#"{
            "newNonce": "https://ca.example/new-nonce",
            "newAccount": "https://ca.example/new-account",
            "newOrder": "https://ca.example/new-order",
            "revokeCert": "https://ca.example/revoke-cert",
            "keyChange": "https://ca.example/key-change",
            "renewalInfo": "https://ca.example/renewal-info",
            "meta": { "externalAccountRequired": true }
        }"#;
        let dir: Directory = serde_json::from_str(json).unwrap();
        assert!(dir.supports_ari());
        assert!(dir.supports_external_account_binding());
    }

    #[test]
    fn directory_without_meta_defaults_closed() {
        let json = r#"{
            "newNonce": "https://ca.example/new-nonce",
            "newAccount": "https://ca.example/new-account",
            "newOrder": "https://ca.example/new-order",
            "revokeCert": "https://ca.example/revoke-cert",
            "keyChange": "https://ca.example/key-change"
        }"#;
        let dir: Directory = serde_json::from_str(json).unwrap();
        assert!(!dir.supports_ari());
        assert!(!dir.supports_external_account_binding());
    }
}
