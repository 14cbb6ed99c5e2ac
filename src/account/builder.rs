//! Builds a `newAccount` request (RFC 8555 §7.3) and the [`Login`] it
//! produces.
use crate::crypto::hash::{eab_mac_algorithm_for_key_len, HashAlgorithm};
use crate::crypto::jws;
use crate::crypto::KeyPair;
use crate::error::{AcmeError, Result};
use crate::login::Login;
use crate::session::Session;
use crate::types::Contact;
use serde_json::{json, Map, Value};
use std::sync::Arc;

/// External Account Binding configuration (§7.3.4).
struct Eab {
    key_identifier: String,
    mac_key: Vec<u8>,
    mac_algorithm: Option<HashAlgorithm>,
}

/// Accumulates `newAccount` request fields, committed by
/// [`AccountBuilder::create_login`].
pub struct AccountBuilder {
    key_pair: Option<KeyPair>,
    contacts: Vec<Contact>,
    terms_of_service_agreed: bool,
    only_existing: bool,
    eab: Option<Eab>,
}

impl Default for AccountBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AccountBuilder {
    pub fn new() -> Self {
        Self {
            key_pair: None,
            contacts: Vec::new(),
            terms_of_service_agreed: false,
            only_existing: false,
            eab: None,
        }
    }

    pub fn add_contact(mut self, contact: Contact) -> Self {
        self.contacts.push(contact);
        self
    }

    /// A bare email address, wrapped `mailto:` automatically.
    pub fn add_email(mut self, email: impl Into<String>) -> Self {
        self.contacts.push(Contact::email(email.into()));
        self
    }

    /// A contact URI already in `scheme:` form (`mailto:`, `tel:`, or
    /// any other the CA accepts).
    pub fn add_contact_uri(mut self, uri: impl Into<String>) -> Self {
        self.contacts.push(Contact::from_uri(&uri.into()));
        self
    }

    pub fn agree_to_terms_of_service(mut self) -> Self {
        self.terms_of_service_agreed = true;
        self
    }

    pub fn use_key_pair(mut self, key_pair: KeyPair) -> Self {
        self.key_pair = Some(key_pair);
        self
    }

    /// `onlyReturnExisting`: fail rather than create an account if none
    /// is already registered under this key.
    pub fn only_existing(mut self) -> Self {
        self.only_existing = true;
        self
    }

    /// Enable External Account Binding (§7.3.4). `mac_key_b64url` is
    /// the base64url-encoded MAC key the CA hands out alongside
    /// `key_id`.
    pub fn with_key_identifier(mut self, key_id: impl Into<String>, mac_key_b64url: &str) -> Result<Self> {
        let mac_key = crate::crypto::encoding::Base64Encoding::decode(mac_key_b64url)?;
        let existing_alg = self.eab.as_ref().and_then(|e| e.mac_algorithm);
        self.eab = Some(Eab {
            key_identifier: key_id.into(),
            mac_key,
            mac_algorithm: existing_alg,
        });
        Ok(self)
    }

    /// Override the MAC algorithm EAB signing uses instead of the
    /// key-length heuristic. Requires `with_key_identifier` first.
    pub fn with_mac_algorithm(mut self, alg: &str) -> Result<Self> {
        let algorithm = match alg {
            "HS256" => HashAlgorithm::Sha256,
            "HS384" => HashAlgorithm::Sha384,
            "HS512" => HashAlgorithm::Sha512,
            other => return Err(AcmeError::invalid_argument(format!("unsupported MAC algorithm '{other}'"))),
        };
        match &mut self.eab {
            Some(eab) => eab.mac_algorithm = Some(algorithm),
            None => return Err(AcmeError::invalid_argument("with_mac_algorithm requires with_key_identifier first")),
        }
        Ok(self)
    }

    /// POST `newAccount`, signed with the account's `jwk` header, and
    /// bind the resulting [`Login`].
    pub async fn create_login(self, session: Arc<Session>) -> Result<Login> {
        let key_pair = self
            .key_pair
            .ok_or_else(|| AcmeError::invalid_argument("an account requires a key pair"))?;
        let directory = session.directory().await?;
        let jwk = key_pair.public_jwk()?;

        let mut payload = Map::new();
        if !self.contacts.is_empty() {
            let uris: Vec<String> = self.contacts.iter().map(Contact::to_uri).collect();
            payload.insert("contact".to_string(), json!(uris));
        }
        if self.terms_of_service_agreed {
            payload.insert("termsOfServiceAgreed".to_string(), json!(true));
        }
        if self.only_existing {
            payload.insert("onlyReturnExisting".to_string(), json!(true));
        }
        if let Some(eab) = &self.eab {
            let algorithm = eab
                .mac_algorithm
                .unwrap_or_else(|| eab_mac_algorithm_for_key_len(eab.mac_key.len()));
            let inner = jws::sign_eab_inner(&eab.mac_key, algorithm, &eab.key_identifier, &jwk, &directory.new_account)?;
            payload.insert("externalAccountBinding".to_string(), inner.to_json());
        }

        let connection = session.connection().await?;
        let payload_value = Value::Object(payload);
        let (view, response) = connection
            .post_signed(&directory.new_account, |nonce| {
                jws::sign_with_jwk(&key_pair, &jwk, &payload_value, nonce, &directory.new_account)
            })
            .await?;

        let account_url = response
            .header("location")
            .ok_or_else(|| AcmeError::protocol("newAccount response missing Location header"))?
            .to_string();

        let login = Login::new(session, account_url.clone(), key_pair);
        let account = crate::account::Account::bind(account_url, login.clone());
        let data: crate::account::AccountData = view.as_typed()?;
        account.set_cached(data).await;
        Ok(login)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_mac_algorithm_without_key_identifier_is_an_error() {
        let builder = AccountBuilder::new();
        assert!(builder.with_mac_algorithm("HS256").is_err());
    }

    #[test]
    fn with_mac_algorithm_rejects_unknown_algorithm() {
        let builder = AccountBuilder::new()
            .with_key_identifier("kid-1", "YWJjZA")
            .unwrap();
        assert!(builder.with_mac_algorithm("HS1024").is_err());
    }
}
