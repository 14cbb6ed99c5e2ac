//! Flattened JSON Web Signature envelopes for signed ACME requests.
use crate::crypto::hash::HashAlgorithm;
use crate::crypto::jwk::Jwk;
use crate::crypto::keypair::KeyPair;
use crate::error::Result;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::Serialize;
use serde_json::{json, Value};

/// A signed request body in RFC 8555 §6.2 flattened JSON serialization.
#[derive(Debug, Clone, Serialize)]
pub struct SignedBody {
    pub protected: String,
    pub payload: String,
    pub signature: String,
}

impl SignedBody {
    pub fn to_json(&self) -> Value {
        json!({
            "protected": self.protected,
            "payload": self.payload,
            "signature": self.signature,
        })
    }
}

fn b64_json(value: &Value) -> String {
    URL_SAFE_NO_PAD.encode(value.to_string().as_bytes())
}

fn sign_envelope(key: &KeyPair, protected: &Value, payload_b64: &str) -> Result<SignedBody> {
    let protected_b64 = b64_json(protected);
    let signing_input = format!("{protected_b64}.{payload_b64}");
    let signature = key.sign(signing_input.as_bytes())?;
    Ok(SignedBody {
        protected: protected_b64,
        payload: payload_b64.to_string(),
        signature: URL_SAFE_NO_PAD.encode(signature),
    })
}

/// Sign a request body with the account's full public key embedded
/// (`jwk` header member) — used for `newAccount` and the outer
/// `keyChange` envelope, where the server has no `kid` to look up yet.
pub fn sign_with_jwk(
    key: &KeyPair,
    jwk: &Jwk,
    payload: &Value,
    nonce: &str,
    url: &str,
) -> Result<SignedBody> {
    let protected = json!({
        "alg": key.jwa_algorithm(),
        "jwk": jwk.to_value(),
        "nonce": nonce,
        "url": url,
    });
    sign_envelope(key, &protected, &b64_json(payload))
}

/// Sign a request body referencing the account by its `kid` URL — the
/// form almost every authenticated ACME request uses once an account
/// exists.
pub fn sign_with_kid(
    key: &KeyPair,
    kid: &str,
    payload: &Value,
    nonce: &str,
    url: &str,
) -> Result<SignedBody> {
    let protected = json!({
        "alg": key.jwa_algorithm(),
        "kid": kid,
        "nonce": nonce,
        "url": url,
    });
    sign_envelope(key, &protected, &b64_json(payload))
}

/// Sign a POST-as-GET request: same as [`sign_with_kid`] but with an
/// empty string payload, per RFC 8555 §6.3.
pub fn sign_post_as_get(key: &KeyPair, kid: &str, nonce: &str, url: &str) -> Result<SignedBody> {
    let protected = json!({
        "alg": key.jwa_algorithm(),
        "kid": kid,
        "nonce": nonce,
        "url": url,
    });
    sign_envelope(key, &protected, "")
}

/// Build the inner JWS of a key-change request (RFC 8555 §7.3.5): the
/// *new* key signs over `{ account, oldKey }`, with no `nonce` member
/// (the inner JWS is never sent directly, only embedded as the outer
/// envelope's payload) and its own `jwk` header rather than a `kid`.
pub fn sign_key_change_inner(
    new_key: &KeyPair,
    new_key_jwk: &Jwk,
    account_url: &str,
    old_key_jwk: &Jwk,
    key_change_url: &str,
) -> Result<SignedBody> {
    let payload = json!({
        "account": account_url,
        "oldKey": old_key_jwk.to_value(),
    });
    let protected = json!({
        "alg": new_key.jwa_algorithm(),
        "jwk": new_key_jwk.to_value(),
        "url": key_change_url,
    });
    sign_envelope(new_key, &protected, &b64_json(&payload))
}

/// Build the inner JWS of an External Account Binding payload (RFC
/// 8555 §7.3.4): an HMAC over the new account's public key, keyed by
/// the CA-issued MAC key and the opaque `kid` it hands out alongside
/// it. No `nonce` member, same as the key-change inner JWS — it's
/// embedded, never sent alone.
pub fn sign_eab_inner(
    mac_key: &[u8],
    mac_algorithm: HashAlgorithm,
    eab_key_id: &str,
    new_key_jwk: &Jwk,
    new_account_url: &str,
) -> Result<SignedBody> {
    let alg_name = match mac_algorithm {
        HashAlgorithm::Sha256 => "HS256",
        HashAlgorithm::Sha384 => "HS384",
        HashAlgorithm::Sha512 => "HS512",
    };
    let protected = json!({
        "alg": alg_name,
        "kid": eab_key_id,
        "url": new_account_url,
    });
    let payload_b64 = b64_json(&new_key_jwk.to_value());
    let protected_b64 = b64_json(&protected);
    let signing_input = format!("{protected_b64}.{payload_b64}");
    let signature = crate::crypto::hash::hmac_sign(mac_algorithm, mac_key, signing_input.as_bytes())?;
    Ok(SignedBody {
        protected: protected_b64,
        payload: payload_b64,
        signature: URL_SAFE_NO_PAD.encode(signature),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keypair::KeyType;

    #[test]
    fn sign_with_jwk_produces_three_valid_segments() {
        let key = KeyPair::generate(KeyType::EcdsaP256).unwrap();
        let jwk = key.public_jwk().unwrap();
        let body = sign_with_jwk(
            &key,
            &jwk,
            &json!({"termsOfServiceAgreed": true}),
            "nonce-1",
            "https://ca.example/new-account",
        )
        .unwrap();
        assert!(URL_SAFE_NO_PAD.decode(&body.protected).is_ok());
        assert!(URL_SAFE_NO_PAD.decode(&body.payload).is_ok());
        assert!(URL_SAFE_NO_PAD.decode(&body.signature).is_ok());
    }

    #[test]
    fn post_as_get_has_empty_payload() {
        let key = KeyPair::generate(KeyType::Ed25519).unwrap();
        let body =
            sign_post_as_get(&key, "https://ca.example/acct/1", "nonce-2", "https://ca.example/order/1")
                .unwrap();
        assert_eq!(body.payload, "");
    }

    #[test]
    fn eab_inner_has_no_nonce_member() {
        let key = KeyPair::generate(KeyType::EcdsaP256).unwrap();
        let jwk = key.public_jwk().unwrap();
        let body = sign_eab_inner(
            b"mac-key-material",
            HashAlgorithm::Sha256,
            "kid-1",
            &jwk,
            "https://ca.example/new-account",
        )
        .unwrap();
        let protected_json = URL_SAFE_NO_PAD.decode(&body.protected).unwrap();
        let protected: Value = serde_json::from_slice(&protected_json).unwrap();
        assert!(protected.get("nonce").is_none());
        assert_eq!(protected.get("alg").and_then(Value::as_str), Some("HS256"));
    }
}
