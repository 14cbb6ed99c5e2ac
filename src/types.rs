//! Shared value types used across the protocol engine: identifiers,
//! resource status, contacts, and revocation reasons.
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// An identifier subject to authorization, per RFC 8555 §9.7.7 and the
/// IP-identifier extension (RFC 8738).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identifier {
    #[serde(rename = "type")]
    pub id_type: String,
    pub value: String,
    /// Subdomain-auth extension: the registrable domain this
    /// identifier's authorization was actually issued against.
    #[serde(rename = "ancestorDomain", skip_serializing_if = "Option::is_none")]
    pub ancestor_domain: Option<String>,
    #[serde(rename = "subdomainAuthAllowed", skip_serializing_if = "Option::is_none")]
    pub subdomain_auth_allowed: Option<bool>,
}

impl Identifier {
    /// A DNS identifier. The value is lowercased per RFC 8555 §7.1.4
    /// ("identifier values... MUST be in lowercase form"); IDN labels
    /// are left as given — punycode conversion is a caller concern.
    pub fn dns(domain: impl Into<String>) -> Self {
        Self {
            id_type: "dns".to_string(),
            value: domain.into().to_lowercase(),
            ancestor_domain: None,
            subdomain_auth_allowed: None,
        }
    }

    /// An IP identifier, canonicalized through `std::net::IpAddr` so
    /// `::1` and `0:0:0:0:0:0:0:1` compare and hash equal.
    pub fn ip(addr: IpAddr) -> Self {
        Self {
            id_type: "ip".to_string(),
            value: addr.to_string(),
            ancestor_domain: None,
            subdomain_auth_allowed: None,
        }
    }

    /// Parse a bare string as a DNS name, or an IP address if it
    /// parses as one (used by order/account builders accepting mixed
    /// `Vec<String>` subject lists).
    pub fn parse(value: &str) -> Self {
        match value.parse::<IpAddr>() {
            Ok(addr) => Self::ip(addr),
            Err(_) => Self::dns(value),
        }
    }

    pub fn from_wire(id_type: &str, value: &str) -> Self {
        Self {
            id_type: id_type.to_string(),
            value: value.to_string(),
            ancestor_domain: None,
            subdomain_auth_allowed: None,
        }
    }

    /// Mark this DNS identifier as authorizing a whole subdomain tree
    /// (RFC 9444 subdomain-auth extension).
    pub fn with_subdomain_auth(mut self, ancestor_domain: impl Into<String>) -> Self {
        self.ancestor_domain = Some(ancestor_domain.into());
        self.subdomain_auth_allowed = Some(true);
        self
    }

    pub fn is_dns(&self) -> bool {
        self.id_type == "dns"
    }

    pub fn is_ip(&self) -> bool {
        self.id_type == "ip"
    }
}

impl std::fmt::Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.id_type, self.value)
    }
}

/// Lifecycle status shared by Account, Order, Authorization, and
/// Challenge resources. Not every variant is valid for every resource
/// kind (e.g. `Ready` only applies to orders) — RFC 8555 reuses the
/// same string vocabulary across resource kinds, so one enum with a
/// permissive parse matches the wire format better than four disjoint
/// enums that would otherwise be structurally identical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Status {
    Pending,
    Processing,
    Ready,
    Valid,
    Invalid,
    Deactivated,
    Revoked,
    Expired,
    Canceled,
    /// Any status string the wire format didn't anticipate; never
    /// fails to parse (§3 Data Model: "unknown inputs map to `unknown`").
    Unknown,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::Processing => "processing",
            Status::Ready => "ready",
            Status::Valid => "valid",
            Status::Invalid => "invalid",
            Status::Deactivated => "deactivated",
            Status::Revoked => "revoked",
            Status::Expired => "expired",
            Status::Canceled => "canceled",
            Status::Unknown => "unknown",
        }
    }

    /// Terminal failure statuses a polling loop should stop on even if
    /// they're not in its target set, alongside any successful target.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Status::Valid
                | Status::Invalid
                | Status::Deactivated
                | Status::Revoked
                | Status::Expired
                | Status::Canceled
        )
    }
}

impl std::str::FromStr for Status {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "pending" => Status::Pending,
            "processing" => Status::Processing,
            "ready" => Status::Ready,
            "valid" => Status::Valid,
            "invalid" => Status::Invalid,
            "deactivated" => Status::Deactivated,
            "revoked" => Status::Revoked,
            "expired" => Status::Expired,
            "canceled" | "cancelled" => Status::Canceled,
            _ => Status::Unknown,
        })
    }
}

impl From<String> for Status {
    fn from(s: String) -> Self {
        s.parse().unwrap_or(Status::Unknown)
    }
}

impl From<Status> for String {
    fn from(status: Status) -> Self {
        status.as_str().to_string()
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Account contact information, rendered to the `mailto:`/`tel:` URI
/// scheme RFC 8555 §7.1.2 expects in the `contact` array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Contact {
    Email(String),
    Phone(String),
    Url(String),
}

impl Contact {
    pub fn email(email: impl Into<String>) -> Self {
        Contact::Email(email.into())
    }

    pub fn phone(phone: impl Into<String>) -> Self {
        Contact::Phone(phone.into())
    }

    pub fn url(url: impl Into<String>) -> Self {
        Contact::Url(url.into())
    }

    pub fn to_uri(&self) -> String {
        match self {
            Contact::Email(e) => format!("mailto:{e}"),
            Contact::Phone(p) => format!("tel:{p}"),
            Contact::Url(u) => u.clone(),
        }
    }

    pub fn from_uri(uri: &str) -> Self {
        if let Some(rest) = uri.strip_prefix("mailto:") {
            Contact::Email(rest.to_string())
        } else if let Some(rest) = uri.strip_prefix("tel:") {
            Contact::Phone(rest.to_string())
        } else {
            Contact::Url(uri.to_string())
        }
    }
}

/// Certificate revocation reason codes, RFC 5280 §5.3.1 CRLReason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum RevocationReason {
    Unspecified = 0,
    KeyCompromise = 1,
    CaCompromise = 2,
    AffiliationChanged = 3,
    Superseded = 4,
    CessationOfOperation = 5,
    CertificateHold = 6,
    RemoveFromCrl = 8,
    PrivilegeWithdrawn = 9,
    AaCompromise = 10,
}

impl RevocationReason {
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dns_identifier_lowercases() {
        assert_eq!(Identifier::dns("Example.COM").value, "example.com");
    }

    #[test]
    fn ip_identifier_canonicalizes() {
        let a = Identifier::parse("::1");
        let b = Identifier::parse("0:0:0:0:0:0:0:1");
        assert_eq!(a, b);
        assert!(a.is_ip());
    }

    #[test]
    fn status_round_trips_through_str() {
        assert_eq!("ready".parse::<Status>().unwrap(), Status::Ready);
        assert_eq!(Status::Ready.as_str(), "ready");
    }

    #[test]
    fn status_terminal_classification() {
        assert!(Status::Valid.is_terminal());
        assert!(Status::Canceled.is_terminal());
        assert!(!Status::Pending.is_terminal());
    }

    #[test]
    fn status_unrecognized_value_maps_to_unknown() {
        assert_eq!("frobnicated".parse::<Status>().unwrap(), Status::Unknown);
    }

    #[test]
    fn contact_uri_round_trip() {
        let c = Contact::email("admin@example.com");
        assert_eq!(c.to_uri(), "mailto:admin@example.com");
        assert_eq!(Contact::from_uri(&c.to_uri()), c);
    }
}
