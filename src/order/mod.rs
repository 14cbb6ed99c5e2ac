//! The order resource (RFC 8555 §7.1.3, §7.4): the identifiers being
//! certified, their authorizations, finalization, and the issued
//! certificate.
pub mod authorization;
pub mod builder;
pub mod objects;

pub use authorization::Authorization;
pub use builder::OrderBuilder;
pub use objects::{AutoRenewSpec, OrderData};

use crate::certificate::Certificate;
use crate::crypto::encoding::Base64Encoding;
use crate::error::{AcmeError, Result};
use crate::login::Login;
use crate::resource::Resource;
use crate::types::Status;
use serde_json::json;

/// A bound order: a lazily-loaded [`OrderData`] behind a [`Login`],
/// plus the operations §7.4-§7.5 define for driving it to issuance.
pub struct Order {
    resource: Resource<OrderData>,
}

impl Order {
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

    pub async fn get(&self) -> Result<OrderData> {
        self.resource.get().await
    }

    pub async fn update(&self) -> Result<OrderData> {
        self.resource.fetch().await
    }

    pub async fn invalidate(&self) {
        self.resource.invalidate().await;
    }

    pub async fn set_cached(&self, data: OrderData) {
        self.resource.set_cached(data).await;
    }

    /// Poll until the order reaches one of `target_statuses` or a
    /// terminal status, or `timeout` elapses (§4.5, §8).
    pub async fn wait_until_status(
        &self,
        target_statuses: &[Status],
        timeout: std::time::Duration,
    ) -> Result<OrderData> {
        let clock = self.login().session.clock().clone();
        self.resource
            .wait_until_status(target_statuses, timeout, clock.as_ref())
            .await
    }

    /// The authorizations this order requires, bound but not fetched.
    pub async fn authorizations(&self) -> Result<Vec<Authorization>> {
        let data = self.get().await?;
        Ok(data
            .authorizations
            .into_iter()
            .map(|url| Authorization::bind(url, self.login().clone()))
            .collect())
    }

    /// Finalize the order (§7.4): POST the CSR in DER form, base64url
    /// encoded, then wait for the state machine to settle at `valid`
    /// or `invalid` — `ready` -finalize-> `processing` -issued->
    /// `valid` (§4.5 state machine). The order must be `ready`
    /// beforehand.
    pub async fn finalize(&self, csr_der: &[u8], timeout: std::time::Duration) -> Result<OrderData> {
        let current = self.get().await?;
        if current.status != Status::Ready {
            return Err(AcmeError::invalid_argument(format!(
                "order must be ready to finalize, was {}",
                current.status
            )));
        }
        let payload = json!({ "csr": Base64Encoding::encode(csr_der) });
        let (view, _response) = self.login().post(&current.finalize, &payload).await?;
        let data: OrderData = view.as_typed()?;
        self.resource.set_cached(data.clone()).await;
        if data.status == Status::Valid || data.status.is_terminal() {
            return Ok(data);
        }
        self.wait_until_status(&[Status::Valid], timeout).await
    }

    /// Download the issued certificate (§7.4.2). The order must be
    /// `valid` and carry a `certificate` URL, which `finalize` or a
    /// prior `wait_until_status` populates.
    pub async fn get_certificate(&self) -> Result<Certificate> {
        let data = self.get().await?;
        let certificate_url = data
            .certificate
            .ok_or_else(|| AcmeError::invalid_argument("order has no certificate URL yet"))?;
        Ok(Certificate::bind(certificate_url, self.login().clone()))
    }

    /// Cancel an order still in `auto-renewal-pending`/`valid`
    /// auto-renewal state (STAR, RFC 9773 §5): POST `status:
    /// "canceled"`.
    pub async fn cancel_auto_renewal(&self) -> Result<OrderData> {
        let directory = self.login().session.directory().await?;
        if !directory.supports_auto_renewal() {
            return Err(AcmeError::not_supported(
                "this CA does not advertise auto-renewal",
            ));
        }
        let (view, _response) = self
            .login()
            .post(self.location(), &json!({ "status": "canceled" }))
            .await?;
        let data: OrderData = view.as_typed()?;
        self.resource.set_cached(data.clone()).await;
        Ok(data)
    }
}
