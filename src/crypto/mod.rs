//! Cryptographic primitives: key management, JOSE envelopes, hashing,
//! and encoding helpers.

pub mod encoding;
pub mod hash;
pub mod jwk;
pub mod jws;
pub mod keypair;

pub use encoding::{Base64Encoding, PemEncoding};
pub use hash::{HashAlgorithm, Sha256Hash};
pub use jwk::Jwk;
pub use keypair::{KeyPair, KeyType};
