//! JSON Web Key representation and RFC 7638 thumbprints.
use crate::error::{AcmeError, Result};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// A JSON Web Key. Only the public-key members a JWS header or
/// account-key thumbprint needs are modeled explicitly; anything else
/// the server sends back is preserved in `params`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Jwk {
    pub kty: String,
    #[serde(rename = "use", skip_serializing_if = "Option::is_none")]
    pub use_: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_ops: Option<Vec<String>>,
    #[serde(flatten)]
    pub params: HashMap<String, Value>,
}

impl Jwk {
    pub fn new_okp(crv: impl Into<String>, x: impl Into<String>) -> Self {
        let mut params = HashMap::new();
        params.insert("crv".to_string(), Value::String(crv.into()));
        params.insert("x".to_string(), Value::String(x.into()));
        Self {
            kty: "OKP".to_string(),
            use_: Some("sig".to_string()),
            key_ops: None,
            params,
        }
    }

    pub fn new_rsa(n: impl Into<String>, e: impl Into<String>) -> Self {
        let mut params = HashMap::new();
        params.insert("n".to_string(), Value::String(n.into()));
        params.insert("e".to_string(), Value::String(e.into()));
        Self {
            kty: "RSA".to_string(),
            use_: Some("sig".to_string()),
            key_ops: None,
            params,
        }
    }

    pub fn new_ec(crv: impl Into<String>, x: impl Into<String>, y: impl Into<String>) -> Self {
        let mut params = HashMap::new();
        params.insert("crv".to_string(), Value::String(crv.into()));
        params.insert("x".to_string(), Value::String(x.into()));
        params.insert("y".to_string(), Value::String(y.into()));
        Self {
            kty: "EC".to_string(),
            use_: Some("sig".to_string()),
            key_ops: None,
            params,
        }
    }

    pub fn param_str(&self, key: &str) -> Option<&str> {
        self.params.get(key).and_then(|v| v.as_str())
    }

    fn require_param(&self, key: &str) -> Result<&str> {
        self.param_str(key)
            .ok_or_else(|| AcmeError::crypto(format!("JWK missing '{key}' parameter")))
    }

    /// RFC 7638 thumbprint: SHA-256 over the JCS-minimal JSON object
    /// of the key's *required* members, each key type's member set and
    /// order defined by RFC 7638 §3.2-3.3.
    pub fn thumbprint_sha256(&self) -> Result<String> {
        let required = match self.kty.as_str() {
            "RSA" => json!({
                "e": self.require_param("e")?,
                "kty": "RSA",
                "n": self.require_param("n")?,
            }),
            "EC" => json!({
                "crv": self.require_param("crv")?,
                "kty": "EC",
                "x": self.require_param("x")?,
                "y": self.require_param("y")?,
            }),
            "OKP" => json!({
                "crv": self.require_param("crv")?,
                "kty": "OKP",
                "x": self.require_param("x")?,
            }),
            other => return Err(AcmeError::crypto(format!("unsupported JWK key type: {other}"))),
        };
        let mut hasher = Sha256::new();
        hasher.update(required.to_string().as_bytes());
        Ok(URL_SAFE_NO_PAD.encode(hasher.finalize()))
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ec_thumbprint_is_stable() {
        let jwk = Jwk::new_ec("P-256", "AAAA", "BBBB");
        let tp1 = jwk.thumbprint_sha256().unwrap();
        let tp2 = jwk.thumbprint_sha256().unwrap();
        assert_eq!(tp1, tp2);
        assert!(!tp1.is_empty());
    }

    #[test]
    fn rsa_missing_param_is_an_error() {
        let jwk = Jwk {
            kty: "RSA".to_string(),
            use_: None,
            key_ops: None,
            params: HashMap::new(),
        };
        assert!(jwk.thumbprint_sha256().is_err());
    }
}
