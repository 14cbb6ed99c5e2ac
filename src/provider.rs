//! Provider registry: resolves an opaque CA server URI (e.g.
//! `acme://letsencrypt/staging`) to a concrete directory URL, so
//! applications can configure a named CA without hardcoding its
//! directory endpoint.
use crate::error::{AcmeError, Result};

/// A single CA's URI scheme. `accepts` claims the URIs this provider
/// resolves; `resolve` turns a claimed URI into the directory URL a
/// [`Session`](crate::session::Session) is built from.
pub trait Provider: Send + Sync {
    fn accepts(&self, server_uri: &str) -> bool;
    fn resolve(&self, server_uri: &str) -> Result<String>;
}

/// Passthrough provider for any `http(s)://` URI: the URI *is* the
/// directory URL, no vendor-specific resolution needed.
pub struct GenericHttpProvider;

impl Provider for GenericHttpProvider {
    fn accepts(&self, server_uri: &str) -> bool {
        server_uri.starts_with("http://") || server_uri.starts_with("https://")
    }

    fn resolve(&self, server_uri: &str) -> Result<String> {
        Ok(server_uri.to_string())
    }
}

/// Holds the registered providers and picks exactly one to resolve a
/// given server URI.
pub struct ProviderRegistry {
    providers: Vec<Box<dyn Provider>>,
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self { providers: Vec::new() }
    }

    /// A registry carrying only [`GenericHttpProvider`], the default
    /// most applications need.
    pub fn with_default_providers() -> Self {
        let mut registry = Self::new();
        registry.register(GenericHttpProvider);
        registry
    }

    pub fn register<P: Provider + 'static>(&mut self, provider: P) {
        self.providers.push(Box::new(provider));
    }

    /// Resolve `server_uri` through exactly one accepting provider.
    /// Zero or more than one match is a client-side configuration error.
    pub fn resolve(&self, server_uri: &str) -> Result<String> {
        let mut matches = self.providers.iter().filter(|p| p.accepts(server_uri));
        let provider = matches
            .next()
            .ok_or_else(|| AcmeError::invalid_argument(format!("no provider accepts server URI '{server_uri}'")))?;
        if matches.next().is_some() {
            return Err(AcmeError::invalid_argument(format!(
                "more than one provider accepts server URI '{server_uri}'"
            )));
        }
        provider.resolve(server_uri)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct VendorProvider;
    impl Provider for VendorProvider {
        fn accepts(&self, server_uri: &str) -> bool {
            server_uri.starts_with("acme://vendor/")
        }
        fn resolve(&self, server_uri: &str) -> Result<String> {
            let env = server_uri.trim_start_matches("acme://vendor/");
            Ok(format!("https://acme.vendor.example/{env}/directory"))
        }
    }

    #[test]
    fn generic_provider_passes_through_https_uris() {
        let registry = ProviderRegistry::with_default_providers();
        assert_eq!(
            registry.resolve("https://ca.example/directory").unwrap(),
            "https://ca.example/directory"
        );
    }

    #[test]
    fn vendor_uri_resolves_through_registered_provider() {
        let mut registry = ProviderRegistry::new();
        registry.register(VendorProvider);
        assert_eq!(
            registry.resolve("acme://vendor/staging").unwrap(),
            "https://acme.vendor.example/staging/directory"
        );
    }

    #[test]
    fn unmatched_uri_is_invalid_argument() {
        let registry = ProviderRegistry::new();
        assert!(registry.resolve("acme://nobody/here").is_err());
    }

    #[test]
    fn ambiguous_uri_is_rejected() {
        let mut registry = ProviderRegistry::new();
        registry.register(GenericHttpProvider);
        registry.register(GenericHttpProvider);
        assert!(registry.resolve("https://ca.example/directory").is_err());
    }
}
