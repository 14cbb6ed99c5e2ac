//! # AcmeX - ACME v2 Client Library
//!
//! An async Rust client library for ACME v2 servers (RFC 8555), covering
//! account registration and key rollover, order creation and
//! finalization, authorization and challenge polling, certificate
//! download and revocation, External Account Binding, and Renewal
//! Information (ARI).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use acmex::prelude::*;
//! use acmex::transport::ReqwestTransport;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> acmex::Result<()> {
//!     let session = Arc::new(Session::new(
//!         "https://acme-staging-v02.api.letsencrypt.org/directory",
//!         Arc::new(ReqwestTransport::default()),
//!     ));
//!
//!     let key = KeyPair::generate(KeyType::EcdsaP256)?;
//!     let login = AccountBuilder::new()
//!         .add_contact(Contact::email("admin@example.com"))
//!         .agree_to_terms_of_service()
//!         .use_key_pair(key)
//!         .create_login(session)
//!         .await?;
//!
//!     let account = Account::bind(login.account_url.clone(), login.clone());
//!     let order = account.new_order().domain("example.com").create().await?;
//!     let _ = order;
//!     Ok(())
//! }
//! ```

pub mod account;
pub mod certificate;
pub mod challenge;
pub mod config;
pub mod connection;
pub mod crypto;
pub mod error;
pub mod json;
pub mod login;
pub mod order;
pub mod protocol;
pub mod provider;
pub mod renewal;
pub mod resource;
pub mod session;
pub mod time;
pub mod transport;
pub mod types;

pub use account::{Account, AccountBuilder, AccountData};
pub use certificate::{Certificate, CertificateChain};
pub use challenge::{Challenge, ChallengeKind, ChallengeWire};
pub use config::Config;
pub use connection::Connection;
pub use crypto::{Base64Encoding, HashAlgorithm, Jwk, KeyPair, KeyType, Sha256Hash};
pub use error::{AcmeError, Result};
pub use login::Login;
pub use order::{Authorization, Order, OrderBuilder, OrderData};
pub use protocol::Directory;
pub use provider::{GenericHttpProvider, Provider, ProviderRegistry};
pub use renewal::{RenewalInfo, RenewalInfoData, SuggestedWindow};
pub use session::Session;
pub use types::{Contact, Identifier, RevocationReason, Status};

/// Commonly used types, re-exported for a single `use acmex::prelude::*;`.
pub mod prelude {
    pub use crate::{
        account::{Account, AccountBuilder},
        certificate::{Certificate, CertificateChain},
        challenge::{Challenge, ChallengeKind},
        config::Config,
        crypto::{Base64Encoding, Jwk, KeyPair, KeyType, Sha256Hash},
        error::{AcmeError, Result},
        login::Login,
        order::{Authorization, Order, OrderBuilder},
        protocol::Directory,
        provider::{Provider, ProviderRegistry},
        renewal::RenewalInfo,
        session::Session,
        types::{Contact, Identifier, RevocationReason, Status},
    };
}
