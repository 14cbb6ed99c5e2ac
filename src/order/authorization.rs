//! The authorization resource (RFC 8555 §7.1.4): the challenges
//! offered for one identifier, and their combined outcome.
use crate::challenge::{Challenge, ChallengeWire};
use crate::error::Result;
use crate::resource::{HasStatus, Resource};
use crate::login::Login;
use crate::types::{Identifier, Status};
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// The authorization's JSON representation, as returned by the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizationData {
    pub identifier: Identifier,
    pub status: Status,
    #[serde(default)]
    pub expires: Option<Timestamp>,
    pub challenges: Vec<ChallengeWire>,
    #[serde(default)]
    pub wildcard: bool,
    #[serde(rename = "subdomainAuthAllowed", default)]
    pub subdomain_auth_allowed: bool,
}

impl HasStatus for AuthorizationData {
    fn status(&self) -> Status {
        self.status
    }
}

/// A bound authorization: lazily-loaded [`AuthorizationData`] behind a
/// [`Login`], plus the operations §7.5 defines.
pub struct Authorization {
    resource: Resource<AuthorizationData>,
}

impl Authorization {
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

    pub async fn get(&self) -> Result<AuthorizationData> {
        self.resource.get().await
    }

    pub async fn update(&self) -> Result<AuthorizationData> {
        self.resource.fetch().await
    }

    pub async fn invalidate(&self) {
        self.resource.invalidate().await;
    }

    pub async fn set_cached(&self, data: AuthorizationData) {
        self.resource.set_cached(data).await;
    }

    pub async fn wait_until_status(
        &self,
        target_statuses: &[Status],
        timeout: std::time::Duration,
    ) -> Result<AuthorizationData> {
        let clock = self.login().session.clock().clone();
        self.resource
            .wait_until_status(target_statuses, timeout, clock.as_ref())
            .await
    }

    /// Deactivate the authorization (§7.5.2): the client can no longer
    /// rely on it, even if its status was `valid`.
    pub async fn deactivate(&self) -> Result<AuthorizationData> {
        let (view, _response) = self.login().post(self.location(), &json!({ "status": "deactivated" })).await?;
        let data: AuthorizationData = view.as_typed()?;
        self.resource.set_cached(data.clone()).await;
        Ok(data)
    }

    /// Find the challenge of a given type (`http-01`, `dns-01`, ...)
    /// among the ones offered, already bound and ready to trigger.
    pub async fn find_challenge(&self, challenge_type: &str) -> Result<Option<Challenge>> {
        let data = self.get().await?;
        Ok(data
            .challenges
            .into_iter()
            .find(|c| c.challenge_type == challenge_type)
            .map(|wire| Challenge::from_wire(wire, self.login().clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authorization_data_parses_challenges() {
        let json = r#"{
            "identifier": {"type": "dns", "value": "example.com"},
            "status": "pending",
            "expires": "2026-02-10T00:00:00Z",
            "challenges": [
                {"type": "http-01", "url": "https://ca.example/chall/1", "status": "pending", "token": "tok"}
            ],
            "wildcard": false
        }"#;
        let data: AuthorizationData = serde_json::from_str(json).unwrap();
        assert_eq!(data.status, Status::Pending);
        assert_eq!(data.challenges.len(), 1);
        assert_eq!(data.challenges[0].challenge_type, "http-01");
    }
}
