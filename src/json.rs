//! Read-only view over a parsed JSON resource body.
//!
//! Wraps a `serde_json::Value` together with the URL it was fetched
//! from, so relative references inside the document (problem
//! `instance`, authorization URLs predating absolute-URL servers) can
//! be resolved without threading the base URL through every call site.
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Resolve `maybe_relative` against `base`. If it already parses as an
/// absolute URL it is returned unchanged; servers are required to send
/// absolute URLs per RFC 8555 but this keeps us honest against ones
/// that don't.
pub fn resolve_url(base: &str, maybe_relative: &str) -> String {
    match reqwest::Url::parse(maybe_relative) {
        Ok(u) => u.to_string(),
        Err(_) => match reqwest::Url::parse(base).and_then(|b| b.join(maybe_relative)) {
            Ok(u) => u.to_string(),
            Err(_) => maybe_relative.to_string(),
        },
    }
}

/// A parsed JSON document paired with the URL it came from.
#[derive(Debug, Clone)]
pub struct JsonView {
    value: Value,
    base_url: String,
}

impl JsonView {
    pub fn new(value: Value, base_url: impl Into<String>) -> Self {
        Self {
            value,
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn raw(&self) -> &Value {
        &self.value
    }

    pub fn into_raw(self) -> Value {
        self.value
    }

    /// Deserialize the whole document into `T`.
    pub fn as_typed<T: DeserializeOwned>(&self) -> crate::error::Result<T> {
        serde_json::from_value(self.value.clone()).map_err(crate::error::AcmeError::Json)
    }

    /// Look up a string field, resolving it against `base_url` if it
    /// looks like a URL reference.
    pub fn resolved_str(&self, field: &str) -> Option<String> {
        self.value
            .get(field)
            .and_then(|v| v.as_str())
            .map(|s| resolve_url(&self.base_url, s))
    }

    pub fn str_field(&self, field: &str) -> Option<&str> {
        self.value.get(field).and_then(|v| v.as_str())
    }

    /// Resolve every string in a JSON array field against `base_url`.
    pub fn resolved_str_array(&self, field: &str) -> Vec<String> {
        self.value
            .get(field)
            .and_then(|v| v.as_array())
            .map(|arr| {
                arr.iter()
                    .filter_map(|v| v.as_str())
                    .map(|s| resolve_url(&self.base_url, s))
                    .collect()
            })
            .unwrap_or_default()
    }
}
