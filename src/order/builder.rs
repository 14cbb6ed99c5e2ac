//! Builds a `newOrder` request (RFC 8555 §7.4) and the STAR
//! auto-renewal extension block (RFC 9773 §4.1).
use crate::error::{AcmeError, Result};
use crate::login::Login;
use crate::order::objects::AutoRenewSpec;
use crate::order::Order;
use crate::types::Identifier;
use jiff::Timestamp;
use serde_json::{json, Map, Value};

/// Accumulates `newOrder` request fields, submitted by
/// [`OrderBuilder::create`].
pub struct OrderBuilder {
    login: Login,
    identifiers: Vec<Identifier>,
    not_before: Option<Timestamp>,
    not_after: Option<Timestamp>,
    profile: Option<String>,
    replaces: Option<String>,
    auto_renewal: Option<AutoRenewSpec>,
}

impl OrderBuilder {
    pub fn new(login: Login) -> Self {
        Self {
            login,
            identifiers: Vec::new(),
            not_before: None,
            not_after: None,
            profile: None,
            replaces: None,
            auto_renewal: None,
        }
    }

    /// Add a DNS name, parsed as an IP identifier instead if it parses
    /// as one.
    pub fn domain(mut self, domain: impl AsRef<str>) -> Self {
        self.identifiers.push(Identifier::parse(domain.as_ref()));
        self
    }

    pub fn domains(mut self, domains: impl IntoIterator<Item = impl AsRef<str>>) -> Self {
        for domain in domains {
            self.identifiers.push(Identifier::parse(domain.as_ref()));
        }
        self
    }

    pub fn identifier(mut self, identifier: Identifier) -> Self {
        self.identifiers.push(identifier);
        self
    }

    pub fn identifiers(mut self, identifiers: impl IntoIterator<Item = Identifier>) -> Self {
        self.identifiers.extend(identifiers);
        self
    }

    pub fn not_before(mut self, not_before: Timestamp) -> Self {
        self.not_before = Some(not_before);
        self
    }

    pub fn not_after(mut self, not_after: Timestamp) -> Self {
        self.not_after = Some(not_after);
        self
    }

    /// Request a named certificate profile (draft-aaron-acme-profiles).
    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    /// ARI: this order replaces an existing certificate, identified by
    /// its ARI certificate id.
    pub fn replaces(mut self, ari_cert_id: impl Into<String>) -> Self {
        self.replaces = Some(ari_cert_id.into());
        self
    }

    pub fn auto_renewal(mut self, spec: AutoRenewSpec) -> Self {
        self.auto_renewal = Some(spec);
        self
    }

    /// POST `newOrder` and bind the resulting [`Order`].
    pub async fn create(self) -> Result<Order> {
        if self.identifiers.is_empty() {
            return Err(AcmeError::invalid_argument(
                "an order requires at least one identifier",
            ));
        }
        if self.auto_renewal.is_some() && (self.not_before.is_some() || self.not_after.is_some()) {
            return Err(AcmeError::invalid_argument(
                "auto-renewal and notBefore/notAfter are mutually exclusive",
            ));
        }

        let directory = self.login.session.directory().await?;
        let meta = directory.meta.as_ref();
        if self.auto_renewal.is_some() && meta.and_then(|m| m.auto_renewal.as_ref()).is_none() {
            return Err(AcmeError::not_supported(
                "this CA does not advertise auto-renewal",
            ));
        }
        if let Some(profile) = &self.profile {
            if !directory.supports_profile(profile) {
                return Err(AcmeError::not_supported(format!(
                    "this CA does not advertise the '{profile}' certificate profile"
                )));
            }
        }
        if self.replaces.is_some() && !directory.supports_ari() {
            return Err(AcmeError::not_supported(
                "this CA does not advertise renewalInfo, required for 'replaces'",
            ));
        }

        let mut payload = Map::new();
        payload.insert("identifiers".to_string(), json!(self.identifiers));
        if let Some(not_before) = self.not_before {
            payload.insert("notBefore".to_string(), json!(not_before.to_string()));
        }
        if let Some(not_after) = self.not_after {
            payload.insert("notAfter".to_string(), json!(not_after.to_string()));
        }
        if let Some(profile) = &self.profile {
            payload.insert("profile".to_string(), json!(profile));
        }
        if let Some(replaces) = &self.replaces {
            payload.insert("replaces".to_string(), json!(replaces));
        }
        if let Some(auto_renewal) = &self.auto_renewal {
            payload.insert("auto-renewal".to_string(), json!(auto_renewal));
        }

        let (view, response) = self.login.post(&directory.new_order, &Value::Object(payload)).await?;
        let location = response
            .header("location")
            .ok_or_else(|| AcmeError::protocol("newOrder response missing Location header"))?
            .to_string();

        let order = Order::bind(location, self.login.clone());
        let data: crate::order::objects::OrderData = view.as_typed()?;
        order.set_cached(data).await;
        Ok(order)
    }
}
