//! The ACME account resource: registration state, the contact/ToS
//! editor, and key rollover.
pub mod builder;

use crate::error::{AcmeError, Result};
use crate::login::Login;
use crate::order::builder::OrderBuilder;
use crate::order::authorization::Authorization;
use crate::resource::{HasStatus, Resource};
use crate::types::{Contact, Status};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub use builder::AccountBuilder;

/// The account's JSON representation, as returned by the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountData {
    pub status: Status,
    #[serde(default)]
    pub contact: Vec<String>,
    #[serde(rename = "termsOfServiceAgreed", default)]
    pub terms_of_service_agreed: Option<bool>,
    #[serde(rename = "externalAccountBinding", default, skip_serializing_if = "Option::is_none")]
    pub external_account_binding: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orders: Option<String>,
}

impl AccountData {
    pub fn contacts(&self) -> Vec<Contact> {
        self.contact.iter().map(|uri| Contact::from_uri(uri)).collect()
    }

    pub fn has_external_account_binding(&self) -> bool {
        self.external_account_binding.is_some()
    }
}

impl HasStatus for AccountData {
    fn status(&self) -> Status {
        self.status
    }
}

/// A bound ACME account: a lazily-loaded [`AccountData`] behind a
/// [`Login`], plus the account-level operations RFC 8555 §7.3 defines.
pub struct Account {
    resource: Resource<AccountData>,
}

impl Account {
    /// Bind an Account to a known location with no round-trip.
    pub fn bind(location: impl Into<String>, login: Login) -> Self {
        Self {
            resource: Resource::new(location, login),
        }
    }

    pub fn location(&self) -> &str {
        self.resource.location()
    }

    pub fn login(&self) -> &Login {
        self.resource.login()
    }

    pub async fn get(&self) -> Result<AccountData> {
        self.resource.get().await
    }

    pub async fn update(&self) -> Result<AccountData> {
        self.resource.fetch().await
    }

    pub async fn invalidate(&self) {
        self.resource.invalidate().await;
    }

    pub async fn set_cached(&self, data: AccountData) {
        self.resource.set_cached(data).await;
    }

    /// Begin an accumulating edit of contacts / terms-of-service
    /// agreement, committed by a single signed POST.
    pub fn modify(&self) -> Editor<'_> {
        Editor {
            account: self,
            contact: None,
            terms_of_service_agreed: None,
        }
    }

    /// Irreversibly deactivate the account (RFC 8555 §7.3.6).
    pub async fn deactivate(&self) -> Result<AccountData> {
        self.commit(json!({ "status": "deactivated" })).await
    }

    /// Create a builder for a new order under this account.
    pub fn new_order(&self) -> OrderBuilder {
        OrderBuilder::new(self.login().clone())
    }

    /// Pre-authorize a single identifier, if the CA advertises
    /// `newAuthz` (RFC 8555 §7.4.1, a pre-RFC remnant many CAs retired).
    pub async fn new_authorization(&self, identifier: crate::types::Identifier) -> Result<Authorization> {
        let directory = self.login().session.directory().await?;
        let new_authz = directory
            .new_authz
            .ok_or_else(|| AcmeError::not_supported("this CA does not advertise newAuthz"))?;

        let payload = json!({ "identifier": { "type": identifier.id_type, "value": identifier.value } });
        let (view, response) = self.login().post(&new_authz, &payload).await?;
        let location = response
            .header("location")
            .ok_or_else(|| AcmeError::protocol("newAuthz response missing Location header"))?
            .to_string();
        let authorization = Authorization::bind(location, self.login().clone());
        let data: crate::order::authorization::AuthorizationData = view.as_typed()?;
        authorization.set_cached(data).await;
        Ok(authorization)
    }

    /// Key rollover (RFC 8555 §7.3.5): sign an inner JWS with `newKey`
    /// over `{account, oldKey}`, wrap it in an outer JWS signed by the
    /// account's current key, and swap the Login's key on success.
    pub async fn change_key(&self, new_key: crate::crypto::KeyPair) -> Result<()> {
        let current_key = self.login().key_snapshot().await;
        if current_key.pkcs8_der() == new_key.pkcs8_der() {
            return Err(AcmeError::invalid_argument(
                "change_key requires a key different from the current one",
            ));
        }

        let directory = self.login().session.directory().await?;
        let key_change_url = &directory.key_change;

        let old_jwk = current_key.public_jwk()?;
        let new_jwk = new_key.public_jwk()?;
        let inner = crate::crypto::jws::sign_key_change_inner(
            &new_key,
            &new_jwk,
            self.location(),
            &old_jwk,
            key_change_url,
        )?;

        let connection = self.login().session.connection().await?;
        let account_url = self.location().to_string();
        let payload = inner.to_json();
        connection
            .post_signed(key_change_url, |nonce| {
                crate::crypto::jws::sign_with_kid(&current_key, &account_url, &payload, nonce, key_change_url)
            })
            .await?;

        self.login().rekey(new_key).await;
        Ok(())
    }

    async fn commit(&self, payload: Value) -> Result<AccountData> {
        let (view, _response) = self.login().post(self.location(), &payload).await?;
        let data: AccountData = view.as_typed()?;
        self.resource.set_cached(data.clone()).await;
        Ok(data)
    }
}

/// Accumulates contact/terms-of-service changes for a single commit.
pub struct Editor<'a> {
    account: &'a Account,
    contact: Option<Vec<Contact>>,
    terms_of_service_agreed: Option<bool>,
}

impl<'a> Editor<'a> {
    pub fn contacts(mut self, contacts: Vec<Contact>) -> Self {
        self.contact = Some(contacts);
        self
    }

    pub fn agree_to_terms_of_service(mut self) -> Self {
        self.terms_of_service_agreed = Some(true);
        self
    }

    pub async fn commit(self) -> Result<AccountData> {
        let mut payload = serde_json::Map::new();
        if let Some(contacts) = &self.contact {
            let uris: Vec<String> = contacts.iter().map(Contact::to_uri).collect();
            payload.insert("contact".to_string(), json!(uris));
        }
        if let Some(agreed) = self.terms_of_service_agreed {
            payload.insert("termsOfServiceAgreed".to_string(), json!(agreed));
        }
        self.account.commit(Value::Object(payload)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_data_parses_contacts() {
        let json = r#"{
            "status": "valid",
            "contact": ["mailto:admin@example.com"],
            "termsOfServiceAgreed": true,
            "orders": "https://ca.example/acct/1/orders"
        }"#;
        let data: AccountData = serde_json::from_str(json).unwrap();
        assert_eq!(data.status, Status::Valid);
        assert_eq!(data.contacts(), vec![Contact::email("admin@example.com")]);
        assert!(!data.has_external_account_binding());
    }
}
