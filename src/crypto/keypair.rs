//! Account key material: generation, PKCS#8 persistence, and signing.
//!
//! The signing backend is whichever of `aws-lc-rs` / `ring` is enabled
//! — both expose the same `signature` API, so one code path serves
//! either feature.
use crate::crypto::jwk::Jwk;
use crate::error::{AcmeError, Result};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use std::sync::Arc;

#[cfg(feature = "aws-lc-rs")]
use aws_lc_rs as backend;
#[cfg(all(feature = "ring-crypto", not(feature = "aws-lc-rs")))]
use ring as backend;

use backend::rand::SystemRandom;
use backend::signature::{self, EcdsaKeyPair, Ed25519KeyPair, KeyPair as _, RsaKeyPair};

/// Key type an account or order CSR key may use, per RFC 8555 §6.2.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyType {
    Ed25519,
    EcdsaP256,
    EcdsaP384,
    /// ECDSA P-521 (`ES512`). Only available with the `aws-lc-rs`
    /// backend — `ring` has no P-521 signing algorithm.
    EcdsaP521,
    Rsa2048,
    Rsa4096,
}

impl KeyType {
    /// JWA `alg` identifier used in the JWS protected header.
    pub fn jwa_algorithm(&self) -> &'static str {
        match self {
            KeyType::Ed25519 => "EdDSA",
            KeyType::EcdsaP256 => "ES256",
            KeyType::EcdsaP384 => "ES384",
            KeyType::EcdsaP521 => "ES512",
            KeyType::Rsa2048 | KeyType::Rsa4096 => "RS256",
        }
    }
}

impl std::fmt::Display for KeyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            KeyType::Ed25519 => "Ed25519",
            KeyType::EcdsaP256 => "ECDSA-P256",
            KeyType::EcdsaP384 => "ECDSA-P384",
            KeyType::EcdsaP521 => "ECDSA-P521",
            KeyType::Rsa2048 => "RSA-2048",
            KeyType::Rsa4096 => "RSA-4096",
        };
        write!(f, "{s}")
    }
}

fn ecdsa_signing_alg(key_type: KeyType) -> Result<&'static signature::EcdsaSigningAlgorithm> {
    match key_type {
        KeyType::EcdsaP256 => Ok(&signature::ECDSA_P256_SHA256_FIXED_SIGNING),
        KeyType::EcdsaP384 => Ok(&signature::ECDSA_P384_SHA384_FIXED_SIGNING),
        #[cfg(feature = "aws-lc-rs")]
        KeyType::EcdsaP521 => Ok(&signature::ECDSA_P521_SHA512_FIXED_SIGNING),
        #[cfg(not(feature = "aws-lc-rs"))]
        KeyType::EcdsaP521 => Err(AcmeError::not_supported(
            "ECDSA P-521 requires the aws-lc-rs crypto backend",
        )),
        _ => unreachable!("ecdsa_signing_alg called with a non-ECDSA key type"),
    }
}

enum Signing {
    Ecdsa(Arc<EcdsaKeyPair>),
    Ed25519(Arc<Ed25519KeyPair>),
    Rsa(Arc<RsaKeyPair>),
}

/// An account (or CSR) key pair: private material plus a ready signer.
pub struct KeyPair {
    key_type: KeyType,
    pkcs8: Vec<u8>,
    signing: Signing,
    rng: SystemRandom,
}

impl KeyPair {
    /// Generate a fresh key. RSA keys are not generated here — ring's
    /// backend has no RSA keygen — load one with [`KeyPair::from_pkcs8`]
    /// instead.
    pub fn generate(key_type: KeyType) -> Result<Self> {
        let rng = SystemRandom::new();
        match key_type {
            KeyType::Ed25519 => {
                let pkcs8 = Ed25519KeyPair::generate_pkcs8(&rng)
                    .map_err(|_| AcmeError::crypto("Ed25519 key generation failed"))?;
                let kp = Ed25519KeyPair::from_pkcs8(pkcs8.as_ref())
                    .map_err(|_| AcmeError::crypto("Ed25519 key parse failed"))?;
                Ok(Self {
                    key_type,
                    pkcs8: pkcs8.as_ref().to_vec(),
                    signing: Signing::Ed25519(Arc::new(kp)),
                    rng,
                })
            }
            KeyType::EcdsaP256 | KeyType::EcdsaP384 | KeyType::EcdsaP521 => {
                let alg = ecdsa_signing_alg(key_type)?;
                let pkcs8 = EcdsaKeyPair::generate_pkcs8(alg, &rng)
                    .map_err(|_| AcmeError::crypto("ECDSA key generation failed"))?;
                let kp = EcdsaKeyPair::from_pkcs8(alg, pkcs8.as_ref(), &rng)
                    .map_err(|_| AcmeError::crypto("ECDSA key parse failed"))?;
                Ok(Self {
                    key_type,
                    pkcs8: pkcs8.as_ref().to_vec(),
                    signing: Signing::Ecdsa(Arc::new(kp)),
                    rng,
                })
            }
            KeyType::Rsa2048 | KeyType::Rsa4096 => Err(AcmeError::not_supported(
                "RSA key generation is unsupported; load an existing key via from_pkcs8",
            )),
        }
    }

    /// Load a key from PKCS#8 DER, the on-disk format account keys are
    /// persisted in.
    pub fn from_pkcs8(key_type: KeyType, pkcs8: &[u8]) -> Result<Self> {
        let rng = SystemRandom::new();
        let signing = match key_type {
            KeyType::Ed25519 => Signing::Ed25519(Arc::new(
                Ed25519KeyPair::from_pkcs8(pkcs8)
                    .map_err(|_| AcmeError::crypto("invalid Ed25519 PKCS#8 key"))?,
            )),
            KeyType::EcdsaP256 | KeyType::EcdsaP384 | KeyType::EcdsaP521 => {
                let alg = ecdsa_signing_alg(key_type)?;
                Signing::Ecdsa(Arc::new(
                    EcdsaKeyPair::from_pkcs8(alg, pkcs8, &rng)
                        .map_err(|_| AcmeError::crypto("invalid ECDSA PKCS#8 key"))?,
                ))
            }
            KeyType::Rsa2048 | KeyType::Rsa4096 => Signing::Rsa(Arc::new(
                RsaKeyPair::from_pkcs8(pkcs8)
                    .map_err(|_| AcmeError::crypto("invalid RSA PKCS#8 key"))?,
            )),
        };
        Ok(Self {
            key_type,
            pkcs8: pkcs8.to_vec(),
            signing,
            rng,
        })
    }

    /// Load a key from a PEM-encoded PKCS#8 private key block.
    pub fn from_pem(key_type: KeyType, pem: &str) -> Result<Self> {
        let (_, der) = crate::crypto::encoding::PemEncoding::decode(pem)?;
        Self::from_pkcs8(key_type, &der)
    }

    /// PEM-encode the PKCS#8 private key for persistence.
    pub fn to_pem(&self) -> String {
        crate::crypto::encoding::PemEncoding::encode(&self.pkcs8, "PRIVATE KEY")
    }

    pub fn pkcs8_der(&self) -> &[u8] {
        &self.pkcs8
    }

    pub fn key_type(&self) -> KeyType {
        self.key_type
    }

    pub fn jwa_algorithm(&self) -> &'static str {
        self.key_type.jwa_algorithm()
    }

    /// Sign `message`, returning the raw (not base64url-encoded)
    /// signature bytes in the format the JWA algorithm expects (fixed
    /// R||S for ECDSA, not ASN.1 DER).
    pub fn sign(&self, message: &[u8]) -> Result<Vec<u8>> {
        match &self.signing {
            Signing::Ecdsa(kp) => kp
                .sign(&self.rng, message)
                .map(|sig| sig.as_ref().to_vec())
                .map_err(|_| AcmeError::crypto("ECDSA signing failed")),
            Signing::Ed25519(kp) => Ok(kp.sign(message).as_ref().to_vec()),
            Signing::Rsa(kp) => {
                let mut sig = vec![0u8; kp.public_modulus_len()];
                kp.sign(&signature::RSA_PKCS1_SHA256, &self.rng, message, &mut sig)
                    .map_err(|_| AcmeError::crypto("RSA signing failed"))?;
                Ok(sig)
            }
        }
    }

    /// The public key as a JWK, per RFC 7518 §6.
    pub fn public_jwk(&self) -> Result<Jwk> {
        match &self.signing {
            Signing::Ecdsa(kp) => {
                let pub_key = kp.public_key().as_ref();
                // Uncompressed SEC1 point: 0x04 || X || Y.
                let coord_len = (pub_key.len() - 1) / 2;
                let x = &pub_key[1..1 + coord_len];
                let y = &pub_key[1 + coord_len..];
                let crv = match self.key_type {
                    KeyType::EcdsaP256 => "P-256",
                    KeyType::EcdsaP384 => "P-384",
                    KeyType::EcdsaP521 => "P-521",
                    _ => unreachable!(),
                };
                Ok(Jwk::new_ec(
                    crv,
                    URL_SAFE_NO_PAD.encode(x),
                    URL_SAFE_NO_PAD.encode(y),
                ))
            }
            Signing::Ed25519(kp) => Ok(Jwk::new_okp(
                "Ed25519",
                URL_SAFE_NO_PAD.encode(kp.public_key().as_ref()),
            )),
            Signing::Rsa(kp) => {
                let (n, e) = rsa_modulus_and_exponent(kp.public_key().as_ref())?;
                Ok(Jwk::new_rsa(
                    URL_SAFE_NO_PAD.encode(n),
                    URL_SAFE_NO_PAD.encode(e),
                ))
            }
        }
    }
}

impl Clone for KeyPair {
    fn clone(&self) -> Self {
        Self::from_pkcs8(self.key_type, &self.pkcs8).expect("already-valid key material")
    }
}

/// Extract the RSA modulus and public exponent from a DER
/// SubjectPublicKeyInfo. RSA's SPKI wraps the `RSAPublicKey` DER
/// (`SEQUENCE { INTEGER n, INTEGER e }`) in a BIT STRING; both
/// messages are simple enough to walk by hand rather than pull in a
/// full ASN.1 crate for two integers.
fn rsa_modulus_and_exponent(spki_der: &[u8]) -> Result<(Vec<u8>, Vec<u8>)> {
    let bit_string = find_bit_string(spki_der)
        .ok_or_else(|| AcmeError::crypto("malformed RSA public key: no BIT STRING"))?;
    // BIT STRING content starts with a one-byte "unused bits" count.
    let inner = bit_string
        .get(1..)
        .ok_or_else(|| AcmeError::crypto("malformed RSA public key: empty BIT STRING"))?;
    let mut cursor = inner;
    let seq = read_tlv(&mut cursor, 0x30)
        .ok_or_else(|| AcmeError::crypto("malformed RSA public key: expected SEQUENCE"))?;
    let mut seq_cursor = seq;
    let n = read_tlv(&mut seq_cursor, 0x02)
        .ok_or_else(|| AcmeError::crypto("malformed RSA public key: expected modulus"))?;
    let e = read_tlv(&mut seq_cursor, 0x02)
        .ok_or_else(|| AcmeError::crypto("malformed RSA public key: expected exponent"))?;
    Ok((strip_leading_zero(n), strip_leading_zero(e)))
}

fn strip_leading_zero(bytes: &[u8]) -> Vec<u8> {
    match bytes {
        [0x00, rest @ ..] if !rest.is_empty() => rest.to_vec(),
        other => other.to_vec(),
    }
}

/// Find the first top-level BIT STRING (tag `0x03`) in a DER document.
fn find_bit_string(der: &[u8]) -> Option<&[u8]> {
    let mut cursor = der;
    let outer = read_tlv(&mut cursor, 0x30)?;
    let mut inner = outer;
    loop {
        let (tag, content, rest) = read_any_tlv(inner)?;
        if tag == 0x03 {
            return Some(content);
        }
        inner = rest;
        if inner.is_empty() {
            return None;
        }
    }
}

/// Read one DER TLV whose tag matches `expected_tag`, advancing
/// `cursor` past it. Supports short- and long-form lengths.
fn read_tlv<'a>(cursor: &mut &'a [u8], expected_tag: u8) -> Option<&'a [u8]> {
    let (tag, content, rest) = read_any_tlv(cursor)?;
    if tag != expected_tag {
        return None;
    }
    *cursor = rest;
    Some(content)
}

fn read_any_tlv(data: &[u8]) -> Option<(u8, &[u8], &[u8])> {
    let tag = *data.first()?;
    let len_byte = *data.get(1)?;
    let (len, header_len) = if len_byte & 0x80 == 0 {
        (len_byte as usize, 2usize)
    } else {
        let num_bytes = (len_byte & 0x7f) as usize;
        if num_bytes == 0 || num_bytes > 4 {
            return None;
        }
        let mut len = 0usize;
        for i in 0..num_bytes {
            len = (len << 8) | *data.get(2 + i)? as usize;
        }
        (len, 2 + num_bytes)
    };
    let content = data.get(header_len..header_len + len)?;
    let rest = data.get(header_len + len..)?;
    Some((tag, content, rest))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_ed25519_round_trips_through_pkcs8() {
        let kp = KeyPair::generate(KeyType::Ed25519).expect("keygen");
        let der = kp.pkcs8_der().to_vec();
        let reloaded = KeyPair::from_pkcs8(KeyType::Ed25519, &der).expect("reload");
        assert_eq!(reloaded.jwa_algorithm(), "EdDSA");
    }

    #[test]
    fn generate_ecdsa_p256_signs() {
        let kp = KeyPair::generate(KeyType::EcdsaP256).expect("keygen");
        let sig = kp.sign(b"hello").expect("sign");
        assert!(!sig.is_empty());
    }

    #[test]
    fn public_jwk_ecdsa_has_xy() {
        let kp = KeyPair::generate(KeyType::EcdsaP256).expect("keygen");
        let jwk = kp.public_jwk().expect("jwk");
        assert_eq!(jwk.kty, "EC");
        assert!(jwk.param_str("x").is_some());
        assert!(jwk.param_str("y").is_some());
    }

    #[test]
    fn rsa_keygen_is_not_supported() {
        assert!(KeyPair::generate(KeyType::Rsa2048).is_err());
    }
}
