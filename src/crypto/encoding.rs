//! Base64 and PEM encoding helpers.

use crate::error::{AcmeError, Result};
use base64::Engine;

/// URL-safe, unpadded base64 — the encoding every JOSE member uses.
pub struct Base64Encoding;

impl Base64Encoding {
    pub fn encode(data: &[u8]) -> String {
        base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(data)
    }

    /// Decode unpadded base64url, re-padding first since some general
    /// purpose decoders expect padded input.
    pub fn decode(data: &str) -> Result<Vec<u8>> {
        let padded = match data.len() % 4 {
            2 => format!("{data}=="),
            3 => format!("{data}="),
            _ => data.to_string(),
        };
        base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(&padded)
            .map_err(|e| AcmeError::crypto(format!("base64 decode error: {e}")))
    }

    pub fn encode_standard(data: &[u8]) -> String {
        base64::engine::general_purpose::STANDARD.encode(data)
    }

    pub fn decode_standard(data: &str) -> Result<Vec<u8>> {
        base64::engine::general_purpose::STANDARD
            .decode(data)
            .map_err(|e| AcmeError::crypto(format!("base64 decode error: {e}")))
    }
}

/// PEM encode/decode for private keys and certificates.
pub struct PemEncoding;

impl PemEncoding {
    pub fn encode(data: &[u8], label: &str) -> String {
        let pem = pem::Pem::new(label.to_string(), data.to_vec());
        pem::encode(&pem)
    }

    pub fn decode(pem_data: &str) -> Result<(String, Vec<u8>)> {
        let pem = pem::parse(pem_data)
            .map_err(|e| AcmeError::crypto(format!("PEM parse error: {e}")))?;
        Ok((pem.tag().to_string(), pem.contents().to_vec()))
    }

    pub fn is_valid(data: &str) -> bool {
        pem::parse(data).is_ok()
    }

    pub fn extract_data(pem_data: &str, expected_label: Option<&str>) -> Result<Vec<u8>> {
        let (label, data) = Self::decode(pem_data)?;
        if let Some(expected) = expected_label {
            if label != expected {
                return Err(AcmeError::crypto(format!(
                    "expected PEM label '{expected}', got '{label}'"
                )));
            }
        }
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base64_round_trip() {
        let data = b"hello world";
        let encoded = Base64Encoding::encode(data);
        let decoded = Base64Encoding::decode(&encoded).unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn base64_is_url_safe() {
        let data = b"\xfb\xff\xfe";
        let encoded = Base64Encoding::encode(data);
        assert!(!encoded.contains('+'));
        assert!(!encoded.contains('/'));
    }

    #[test]
    fn pem_round_trip() {
        let data = b"test data";
        let pem = PemEncoding::encode(data, "TEST");
        assert!(pem.contains("-----BEGIN TEST-----"));
        let (label, decoded) = PemEncoding::decode(&pem).unwrap();
        assert_eq!(label, "TEST");
        assert_eq!(decoded, data);
    }
}
