//! Hash and HMAC helpers: digests for challenge key authorizations and
//! the External Account Binding MAC.
use crate::error::{AcmeError, Result};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256, Sha384, Sha512};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlgorithm {
    Sha256,
    Sha384,
    Sha512,
}

impl HashAlgorithm {
    pub fn hash(&self, data: &[u8]) -> Vec<u8> {
        match self {
            HashAlgorithm::Sha256 => Sha256::digest(data).to_vec(),
            HashAlgorithm::Sha384 => Sha384::digest(data).to_vec(),
            HashAlgorithm::Sha512 => Sha512::digest(data).to_vec(),
        }
    }

    /// Output size in bytes — used to pick the EAB MAC algorithm.
    pub fn output_len(&self) -> usize {
        match self {
            HashAlgorithm::Sha256 => 32,
            HashAlgorithm::Sha384 => 48,
            HashAlgorithm::Sha512 => 64,
        }
    }
}

impl std::fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            HashAlgorithm::Sha256 => "SHA256",
            HashAlgorithm::Sha384 => "SHA384",
            HashAlgorithm::Sha512 => "SHA512",
        };
        write!(f, "{s}")
    }
}

pub struct Sha256Hash;

impl Sha256Hash {
    pub fn hash(data: &[u8]) -> Vec<u8> {
        HashAlgorithm::Sha256.hash(data)
    }

    pub fn hash_base64(data: &[u8]) -> String {
        crate::crypto::encoding::Base64Encoding::encode(&Self::hash(data))
    }
}

/// Pick the EAB MAC algorithm per the key size the CA's HMAC key
/// provides: the largest HMAC-SHA2 variant the key is long enough to
/// key securely, ties broken toward the larger digest. Spec leaves the
/// choice to the client when the CA doesn't dictate one out of band.
pub fn eab_mac_algorithm_for_key_len(key_len: usize) -> HashAlgorithm {
    if key_len >= 64 {
        HashAlgorithm::Sha512
    } else if key_len >= 48 {
        HashAlgorithm::Sha384
    } else {
        HashAlgorithm::Sha256
    }
}

/// Compute an HMAC over `message` using the chosen algorithm's
/// HMAC-SHA2 construction, per RFC 8555 §7.3.4.
pub fn hmac_sign(algorithm: HashAlgorithm, key: &[u8], message: &[u8]) -> Result<Vec<u8>> {
    match algorithm {
        HashAlgorithm::Sha256 => {
            let mut mac = Hmac::<Sha256>::new_from_slice(key)
                .map_err(|e| AcmeError::crypto(format!("invalid HMAC key: {e}")))?;
            mac.update(message);
            Ok(mac.finalize().into_bytes().to_vec())
        }
        HashAlgorithm::Sha384 => {
            let mut mac = Hmac::<Sha384>::new_from_slice(key)
                .map_err(|e| AcmeError::crypto(format!("invalid HMAC key: {e}")))?;
            mac.update(message);
            Ok(mac.finalize().into_bytes().to_vec())
        }
        HashAlgorithm::Sha512 => {
            let mut mac = Hmac::<Sha512>::new_from_slice(key)
                .map_err(|e| AcmeError::crypto(format!("invalid HMAC key: {e}")))?;
            mac.update(message);
            Ok(mac.finalize().into_bytes().to_vec())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_matches_known_vector() {
        let data = b"test data";
        let hash = Sha256Hash::hash(data);
        let expected: [u8; 32] = [
            0x91, 0x6f, 0x00, 0x27, 0xa5, 0x75, 0x07, 0x4c, 0xe7, 0x2a, 0x33, 0x17, 0x77, 0xc3,
            0x47, 0x8d, 0x65, 0x13, 0xf7, 0x86, 0xa5, 0x91, 0xbd, 0x89, 0x2d, 0xa1, 0xa5, 0x77,
            0xbf, 0x23, 0x35, 0xf9,
        ];
        assert_eq!(hash, expected);
    }

    #[test]
    fn eab_mac_algorithm_scales_with_key_len() {
        assert_eq!(eab_mac_algorithm_for_key_len(32), HashAlgorithm::Sha256);
        assert_eq!(eab_mac_algorithm_for_key_len(48), HashAlgorithm::Sha384);
        assert_eq!(eab_mac_algorithm_for_key_len(64), HashAlgorithm::Sha512);
    }

    #[test]
    fn hmac_sign_is_deterministic() {
        let a = hmac_sign(HashAlgorithm::Sha256, b"key", b"message").unwrap();
        let b = hmac_sign(HashAlgorithm::Sha256, b"key", b"message").unwrap();
        assert_eq!(a, b);
    }
}
