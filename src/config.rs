//! Client configuration: the CA server URI, network timeouts, proxy,
//! and locale, with TOML file loading and environment variable
//! overrides.
use crate::error::{AcmeError, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;

/// Top-level configuration for constructing a [`Session`](crate::session::Session).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub acme: AcmeSettings,

    #[serde(default)]
    pub network: NetworkSettings,
}

/// ACME server connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcmeSettings {
    /// CA server URI: either a directory URL directly, or an opaque
    /// `acme://` URI a [`ProviderRegistry`](crate::provider::ProviderRegistry) resolves.
    #[serde(default = "default_server_uri")]
    pub server_uri: String,

    /// Locale used when a CA localizes problem documents and terms.
    #[serde(default = "default_locale")]
    pub locale: String,
}

/// Network-layer settings shared by every request this crate makes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkSettings {
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Proxy URL (supports `${VAR}` expansion), honored by the
    /// underlying HTTP transport.
    #[serde(default)]
    pub proxy: Option<String>,
}

fn default_server_uri() -> String {
    "https://acme-v02.api.letsencrypt.org/directory".to_string()
}

fn default_locale() -> String {
    "en".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for AcmeSettings {
    fn default() -> Self {
        Self {
            server_uri: default_server_uri(),
            locale: default_locale(),
        }
    }
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            proxy: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            acme: AcmeSettings::default(),
            network: NetworkSettings::default(),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AcmeError::configuration(format!("failed to read config file: {e}")))?;
        Self::from_str(&content)
    }

    pub fn from_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| AcmeError::configuration(format!("failed to parse TOML: {e}")))
    }

    /// Override fields from `ACMEX_*` environment variables, expanding
    /// `${VAR}` references in the resulting values.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(uri) = env::var("ACMEX_SERVER_URI") {
            self.acme.server_uri = Self::expand_env_var(&uri)?;
        }
        if let Ok(locale) = env::var("ACMEX_LOCALE") {
            self.acme.locale = locale;
        }
        if let Ok(timeout) = env::var("ACMEX_TIMEOUT_SECS") {
            if let Ok(secs) = timeout.parse::<u64>() {
                self.network.timeout_secs = secs;
            }
        }
        if let Ok(proxy) = env::var("ACMEX_PROXY") {
            self.network.proxy = Some(Self::expand_env_var(&proxy)?);
        }
        Ok(())
    }

    /// Expand environment variables in format `${VAR}`.
    pub fn expand_env_var(value: &str) -> Result<String> {
        let re = regex::Regex::new(r"\$\{([^}]+)\}")
            .map_err(|_| AcmeError::configuration("invalid regex pattern"))?;

        let result = re
            .replace_all(value, |caps: &regex::Captures| {
                let var_name = &caps[1];
                env::var(var_name).unwrap_or_else(|_| format!("${{{var_name}}}"))
            })
            .to_string();

        Ok(result)
    }

    pub fn validate(&self) -> Result<()> {
        if self.acme.server_uri.is_empty() {
            return Err(AcmeError::configuration("server URI cannot be empty"));
        }
        if self.network.timeout_secs == 0 {
            return Err(AcmeError::configuration("timeout must be greater than 0"));
        }
        Ok(())
    }

    pub fn server_uri(&self) -> &str {
        &self.acme.server_uri
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.network.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_points_at_letsencrypt() {
        let config = Config::default();
        assert_eq!(config.acme.server_uri, "https://acme-v02.api.letsencrypt.org/directory");
        assert_eq!(config.acme.locale, "en");
        assert_eq!(config.network.timeout_secs, 30);
    }

    #[test]
    fn config_from_string_overrides_defaults() {
        let toml = r#"
[acme]
server_uri = "https://acme-staging-v02.api.letsencrypt.org/directory"
locale = "fr"

[network]
timeout_secs = 10
"#;
        let config = Config::from_str(toml).unwrap();
        assert_eq!(config.acme.server_uri, "https://acme-staging-v02.api.letsencrypt.org/directory");
        assert_eq!(config.acme.locale, "fr");
        assert_eq!(config.network.timeout_secs, 10);
    }

    #[test]
    fn validation_rejects_empty_server_uri() {
        let mut config = Config::default();
        config.acme.server_uri.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn expand_env_var_substitutes_variables() {
        temp_env::with_var("TEST_VAR", Some("test_value"), || {
            let result = Config::expand_env_var("prefix_${TEST_VAR}_suffix").unwrap();
            assert_eq!(result, "prefix_test_value_suffix");
        });
    }
}
