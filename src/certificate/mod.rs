//! The certificate resource (RFC 8555 §7.4.2): download, revocation,
//! and the ARI (Renewal Information) certificate identifier.
pub mod chain;

pub use chain::CertificateChain;

use crate::crypto::encoding::{Base64Encoding, PemEncoding};
use crate::crypto::jws;
use crate::crypto::KeyPair;
use crate::error::{AcmeError, Result};
use crate::login::Login;
use crate::renewal::RenewalInfo;
use crate::session::Session;
use crate::transport::parse_link_header;
use crate::types::RevocationReason;
use serde_json::json;
use std::io::Write;
use std::sync::Arc;
use x509_parser::certificate::X509Certificate;
use x509_parser::extensions::ParsedExtension;
use x509_parser::prelude::FromDer;

/// A downloaded certificate: the leaf plus whatever intermediates the
/// server sent in the same PEM response, and any alternate chains it
/// advertised.
pub struct Certificate {
    location: String,
    login: Login,
    chain: tokio::sync::Mutex<Option<CertificateChain>>,
    alternates: tokio::sync::Mutex<Vec<String>>,
}

impl Certificate {
    pub fn bind(location: impl Into<String>, login: Login) -> Self {
        Self {
            location: location.into(),
            login,
            chain: tokio::sync::Mutex::new(None),
            alternates: tokio::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    /// Certificate-GET (§7.4.2, §4.4): a signed POST-as-GET asking for
    /// `Accept: application/pem-certificate-chain` instead of JSON.
    /// Alternate chains are captured from `Link: rel="alternate"`.
    pub async fn download(&self) -> Result<CertificateChain> {
        let connection = self.login.session.connection().await?;
        let key = self.login.key_snapshot().await;
        let account_url = self.login.account_url.clone();
        let location = self.location.to_string();
        let (body, response) = connection
            .certificate_fetch(&location, |nonce| {
                jws::sign_post_as_get(&key, &account_url, nonce, &location)
            })
            .await?;

        let chain = CertificateChain::from_pem(&body)?;
        let alternates: Vec<String> = parse_link_header(&response.headers_named("link"))
            .into_iter()
            .filter(|l| l.rel == "alternate")
            .map(|l| l.target)
            .collect();

        *self.chain.lock().await = Some(chain.clone());
        *self.alternates.lock().await = alternates;
        Ok(chain)
    }

    pub async fn chain(&self) -> Result<CertificateChain> {
        {
            let cached = self.chain.lock().await;
            if let Some(chain) = cached.as_ref() {
                return Ok(chain.clone());
            }
        }
        self.download().await
    }

    /// The alternate chain URLs the last `download()` advertised via
    /// `Link: rel="alternate"`.
    pub async fn alternates(&self) -> Vec<String> {
        self.alternates.lock().await.clone()
    }

    pub async fn write_pem(&self, writer: &mut impl Write) -> Result<()> {
        let chain = self.chain().await?;
        chain.write_pem(writer)
    }

    /// Find an alternate chain whose leaf issuer common name matches
    /// `name`, downloading each candidate until one matches.
    pub async fn find_issuer(&self, name: &str) -> Result<Option<CertificateChain>> {
        for url in self.alternates().await {
            let connection = self.login.session.connection().await?;
            let key = self.login.key_snapshot().await;
            let account_url = self.login.account_url.clone();
            let (body, _response) = connection
                .certificate_fetch(&url, |nonce| jws::sign_post_as_get(&key, &account_url, nonce, &url))
                .await?;
            let candidate = CertificateChain::from_pem(&body)?;
            if candidate.issuer_common_name()?.as_deref() == Some(name) {
                return Ok(Some(candidate));
            }
        }
        Ok(None)
    }

    /// Revoke via the account that owns this certificate (§7.6).
    pub async fn revoke(&self, reason: Option<RevocationReason>) -> Result<()> {
        let chain = self.chain().await?;
        let mut payload = serde_json::Map::new();
        payload.insert(
            "certificate".to_string(),
            json!(Base64Encoding::encode(&chain.leaf)),
        );
        if let Some(reason) = reason {
            payload.insert("reason".to_string(), json!(reason.as_u8()));
        }
        let directory = self.login.session.directory().await?;
        self.login
            .post(&directory.revoke_cert, &serde_json::Value::Object(payload))
            .await?;
        Ok(())
    }

    /// ARI certificate id (RFC 9773-ish): `base64url(AKI)` and
    /// `base64url(serial)` of the leaf, joined by `.`.
    pub async fn ari_cert_id(&self) -> Result<String> {
        let chain = self.chain().await?;
        ari_cert_id_from_der(&chain.leaf)
    }

    /// Bind the RenewalInfo resource for this certificate, requiring
    /// the CA to advertise `renewalInfo` in its directory.
    pub async fn get_renewal_info(&self) -> Result<RenewalInfo> {
        let directory = self.login.session.directory().await?;
        let renewal_info_url = directory
            .renewal_info
            .ok_or_else(|| AcmeError::not_supported("this CA does not advertise renewalInfo"))?;
        let cert_id = self.ari_cert_id().await?;
        let location = format!("{}/{cert_id}", renewal_info_url.trim_end_matches('/'));
        Ok(RenewalInfo::bind(location, self.login.clone()))
    }
}

/// Revoke a certificate with no account at all (§7.6): the outer JWS
/// is signed with the certificate's own key pair via a `jwk` header.
pub async fn revoke_with_certificate_key(
    session: Arc<Session>,
    certificate_key: &KeyPair,
    certificate_der: &[u8],
    reason: Option<RevocationReason>,
) -> Result<()> {
    let directory = session.directory().await?;
    let jwk = certificate_key.public_jwk()?;

    let mut payload = serde_json::Map::new();
    payload.insert(
        "certificate".to_string(),
        json!(Base64Encoding::encode(certificate_der)),
    );
    if let Some(reason) = reason {
        payload.insert("reason".to_string(), json!(reason.as_u8()));
    }
    let payload_value = serde_json::Value::Object(payload);

    let connection = session.connection().await?;
    connection
        .post_signed(&directory.revoke_cert, |nonce| {
            jws::sign_with_jwk(certificate_key, &jwk, &payload_value, nonce, &directory.revoke_cert)
        })
        .await?;
    Ok(())
}

/// Derive the ARI certificate id from a DER-encoded leaf certificate's
/// Authority Key Identifier and serial number.
fn ari_cert_id_from_der(der: &[u8]) -> Result<String> {
    let (_, cert) =
        X509Certificate::from_der(der).map_err(|e| AcmeError::crypto(format!("invalid leaf certificate: {e}")))?;
    let aki = cert
        .extensions()
        .iter()
        .find_map(|ext| match ext.parsed_extension() {
            ParsedExtension::AuthorityKeyIdentifier(aki) => aki.key_identifier.as_ref(),
            _ => None,
        })
        .ok_or_else(|| AcmeError::crypto("leaf certificate has no Authority Key Identifier"))?;
    let aki_b64 = Base64Encoding::encode(aki.0);
    let serial_b64 = Base64Encoding::encode(cert.raw_serial());
    Ok(format!("{aki_b64}.{serial_b64}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ari_cert_id_requires_authority_key_identifier() {
        let params = rcgen::CertificateParams::new(vec!["example.com".to_string()]).unwrap();
        let key_pair = rcgen::KeyPair::generate().unwrap();
        let cert = params.self_signed(&key_pair).unwrap();
        // Self-signed test certs from rcgen's default params carry no AKI.
        assert!(ari_cert_id_from_der(cert.der()).is_err());
    }
}
