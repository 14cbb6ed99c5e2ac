//! RFC 8555 wire-level building blocks: the directory resource and
//! nonce handling.
pub mod directory;
pub mod nonce;

pub use directory::{AutoRenewalMeta, Directory, DirectoryCache, DirectoryMeta};
pub use nonce::NonceCell;
