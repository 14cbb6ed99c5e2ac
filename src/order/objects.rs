//! Wire representation of the ACME order resource (RFC 8555 §7.1.3)
//! and the STAR/auto-renewal extension block (RFC 9773).
use crate::error::Problem;
use crate::types::{Identifier, Status};
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// STAR auto-renewal request/response block (§6 "auto-renewal").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoRenewSpec {
    #[serde(rename = "start-date", skip_serializing_if = "Option::is_none", default)]
    pub start_date: Option<Timestamp>,
    #[serde(rename = "end-date", skip_serializing_if = "Option::is_none", default)]
    pub end_date: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub lifetime: Option<u64>,
    #[serde(rename = "lifetime-adjust", skip_serializing_if = "Option::is_none", default)]
    pub lifetime_adjust: Option<u64>,
    #[serde(rename = "allow-certificate-get", skip_serializing_if = "Option::is_none", default)]
    pub allow_certificate_get: Option<bool>,
}

/// The order's JSON representation, as returned by the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderData {
    pub status: Status,
    #[serde(default)]
    pub expires: Option<Timestamp>,
    pub identifiers: Vec<Identifier>,
    #[serde(rename = "notBefore", default)]
    pub not_before: Option<Timestamp>,
    #[serde(rename = "notAfter", default)]
    pub not_after: Option<Timestamp>,
    #[serde(default)]
    pub authorizations: Vec<String>,
    pub finalize: String,
    #[serde(default)]
    pub certificate: Option<String>,
    #[serde(default)]
    pub error: Option<Value>,
    #[serde(default)]
    pub profile: Option<String>,
    #[serde(rename = "auto-renewal", default)]
    pub auto_renewal: Option<AutoRenewSpec>,
    #[serde(default)]
    pub replaces: Option<String>,
}

impl crate::resource::HasStatus for OrderData {
    fn status(&self) -> Status {
        self.status
    }
}

impl OrderData {
    /// The order's `error` member, parsed as an RFC 7807 problem
    /// document if present (§3 Data Model).
    pub fn error_problem(&self, base_url: &str) -> Option<Problem> {
        self.error.clone().map(|raw| Problem::from_json(raw, base_url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_data_parses_minimal_pending_order() {
        let json = r#"{
            "status": "pending",
            "expires": "2026-02-10T00:00:00Z",
            "identifiers": [{"type": "dns", "value": "example.com"}],
            "authorizations": ["https://ca.example/authz/1"],
            "finalize": "https://ca.example/order/1/finalize"
        }"#;
        let data: OrderData = serde_json::from_str(json).unwrap();
        assert_eq!(data.status, Status::Pending);
        assert_eq!(data.identifiers.len(), 1);
        assert!(data.certificate.is_none());
        assert!(data.auto_renewal.is_none());
    }

    #[test]
    fn order_data_parses_auto_renewal_block() {
        let json = r#"{
            "status": "valid",
            "identifiers": [{"type": "dns", "value": "example.com"}],
            "finalize": "https://ca.example/order/1/finalize",
            "auto-renewal": { "start-date": "2026-01-01T00:00:00Z", "lifetime": 86400 }
        }"#;
        let data: OrderData = serde_json::from_str(json).unwrap();
        let auto_renewal = data.auto_renewal.expect("auto-renewal block");
        assert_eq!(auto_renewal.lifetime, Some(86400));
    }
}
