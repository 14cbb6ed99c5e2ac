//! Error taxonomy for the ACME protocol engine.
//!
//! Transport, protocol, and server-problem errors propagate to the
//! caller unchanged; `badNonce` is recovered once inside the nonce
//! pool before it ever reaches here (see `protocol::nonce`).
use crate::types::Identifier;
use jiff::Timestamp;
use thiserror::Error;

/// Result type for ACME operations.
pub type Result<T> = std::result::Result<T, AcmeError>;

/// RFC 7807 problem document, with relative URIs resolved against the
/// response's request URL.
#[derive(Debug, Clone)]
pub struct Problem {
    pub problem_type: String,
    pub title: Option<String>,
    pub detail: Option<String>,
    pub instance: Option<String>,
    pub identifier: Option<Identifier>,
    pub subproblems: Vec<Problem>,
    pub raw_json: serde_json::Value,
}

impl Problem {
    /// The URN tail after the last `:`, used to classify the problem
    /// (e.g. `urn:ietf:params:acme:error:badNonce` -> `badNonce`).
    pub fn type_tail(&self) -> &str {
        self.problem_type
            .rsplit(':')
            .next()
            .unwrap_or(&self.problem_type)
    }

    /// Human-readable detail: `detail`, then `title`, then the URN tail.
    pub fn human_detail(&self) -> &str {
        self.detail
            .as_deref()
            .or(self.title.as_deref())
            .unwrap_or_else(|| self.type_tail())
    }

    pub fn from_json(raw: serde_json::Value, base_url: &str) -> Self {
        let resolve = |s: &str| -> String { crate::json::resolve_url(base_url, s) };
        let problem_type = raw
            .get("type")
            .and_then(|v| v.as_str())
            .map(resolve)
            .unwrap_or_else(|| "about:blank".to_string());
        let identifier = raw.get("identifier").and_then(|v| {
            Some(Identifier::from_wire(
                v.get("type")?.as_str()?,
                v.get("value")?.as_str()?,
            ))
        });
        let subproblems = raw
            .get("subproblems")
            .and_then(|v| v.as_array())
            .map(|arr| {
                arr.iter()
                    .map(|sp| Problem::from_json(sp.clone(), base_url))
                    .collect()
            })
            .unwrap_or_default();
        Self {
            problem_type,
            title: raw
                .get("title")
                .and_then(|v| v.as_str())
                .map(String::from),
            detail: raw
                .get("detail")
                .and_then(|v| v.as_str())
                .map(String::from),
            instance: raw
                .get("instance")
                .and_then(|v| v.as_str())
                .map(resolve),
            identifier,
            subproblems,
            raw_json: raw,
        }
    }
}

impl std::fmt::Display for Problem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.human_detail(), self.problem_type)
    }
}

/// Errors for ACME protocol operations.
#[derive(Error, Debug)]
pub enum AcmeError {
    /// Connection failure, TLS failure, or other transport-layer error.
    #[error("transport error: {0}")]
    Transport(String),

    /// Operation timed out.
    #[error("timeout: {0}")]
    Timeout(String),

    /// Malformed response body, missing required header, invalid
    /// nonce, or other wire-format violation.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// A structured RFC 7807 problem document from the server, with a
    /// Terms-of-Service link extracted for `userActionRequired`.
    #[error("server problem: {problem}")]
    ServerProblem {
        problem: Problem,
        terms_of_service: Option<String>,
    },

    /// Rate limited; carries the `Retry-After` instant and any
    /// `Link: rel="help"` documents.
    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited {
        problem: Problem,
        retry_after: Option<Timestamp>,
        help_docs: Vec<String>,
    },

    /// A generic (non-problem+json) 4xx/5xx HTTP response.
    #[error("server error: HTTP {status} {status_text}")]
    ServerError { status: u16, status_text: String },

    /// The requested feature is not advertised by the directory.
    #[error("not supported: {0}")]
    NotSupported(String),

    /// A client-side precondition failed before any network call.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A resource was not found (HTTP 404 on update).
    #[error("not found: {0}")]
    NotFound(String),

    /// `waitUntilStatus` exceeded its deadline.
    #[error("timeout exceeded waiting for status")]
    TimeoutExceeded,

    /// Local JOSE signing/key error (unsupported key type, signature
    /// failure).
    #[error("crypto error: {0}")]
    Crypto(String),

    /// IO error (key pair load/save).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl AcmeError {
    pub fn transport<S: Into<String>>(msg: S) -> Self {
        AcmeError::Transport(msg.into())
    }

    pub fn protocol<S: Into<String>>(msg: S) -> Self {
        AcmeError::Protocol(msg.into())
    }

    pub fn not_supported<S: Into<String>>(msg: S) -> Self {
        AcmeError::NotSupported(msg.into())
    }

    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        AcmeError::InvalidArgument(msg.into())
    }

    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        AcmeError::NotFound(msg.into())
    }

    pub fn crypto<S: Into<String>>(msg: S) -> Self {
        AcmeError::Crypto(msg.into())
    }

    pub fn configuration<S: Into<String>>(msg: S) -> Self {
        AcmeError::Configuration(msg.into())
    }

    pub fn timeout<S: Into<String>>(msg: S) -> Self {
        AcmeError::Timeout(msg.into())
    }

    /// Classify a server problem document into the appropriate typed
    /// error variant (`rateLimited`, `userActionRequired`, or generic
    /// server problem), per spec §7.
    pub fn from_problem(
        problem: Problem,
        retry_after: Option<Timestamp>,
        help_docs: Vec<String>,
        terms_of_service: Option<String>,
    ) -> Self {
        match problem.type_tail() {
            "rateLimited" => AcmeError::RateLimited {
                problem,
                retry_after,
                help_docs,
            },
            "userActionRequired" => AcmeError::ServerProblem {
                problem,
                terms_of_service,
            },
            _ => AcmeError::ServerProblem {
                problem,
                terms_of_service: None,
            },
        }
    }

    /// `true` if this is the recoverable `badNonce` server problem.
    pub fn is_bad_nonce(&self) -> bool {
        matches!(self, AcmeError::ServerProblem { problem, .. } if problem.type_tail() == "badNonce")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn problem_type_tail() {
        let p = Problem {
            problem_type: "urn:ietf:params:acme:error:badNonce".into(),
            title: None,
            detail: None,
            instance: None,
            identifier: None,
            subproblems: vec![],
            raw_json: serde_json::json!({}),
        };
        assert_eq!(p.type_tail(), "badNonce");
    }

    #[test]
    fn problem_human_detail_prefers_detail() {
        let p = Problem {
            problem_type: "urn:ietf:params:acme:error:malformed".into(),
            title: Some("Malformed".into()),
            detail: Some("missing field".into()),
            instance: None,
            identifier: None,
            subproblems: vec![],
            raw_json: serde_json::json!({}),
        };
        assert_eq!(p.human_detail(), "missing field");
    }

    #[test]
    fn problem_from_json_resolves_relative_instance() {
        let raw = serde_json::json!({
            "type": "urn:ietf:params:acme:error:malformed",
            "detail": "bad request",
            "instance": "/errors/1"
        });
        let p = Problem::from_json(raw, "https://ca.example");
        assert_eq!(p.instance.as_deref(), Some("https://ca.example/errors/1"));
    }
}
