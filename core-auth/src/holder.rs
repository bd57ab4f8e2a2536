//! # Configuration Holder
//!
//! Owns one configuration record and the one authentication context built
//! from it, and exposes the zero-argument token accessor.
//!
//! ## Usage
//!
//! ```
//! use core_auth::{AccessToken, AuthConfig, CacheAuthContext, ConfigurationHolder};
//! use bridge_traits::MemoryStorage;
//! use std::sync::Arc;
//!
//! # fn main() -> core_auth::Result<()> {
//! let config = AuthConfig::builder()
//!     .tenant("contoso.onmicrosoft.com")
//!     .client_id("ABC")
//!     .redirect_uri("http://localhost:3000")
//!     .build()?;
//!
//! let storage = Arc::new(MemoryStorage::new());
//! let holder = ConfigurationHolder::new(config, storage.clone());
//!
//! // Nobody signed in yet
//! assert!(holder.get_token()?.is_none());
//!
//! // Acquisition code writes into the same storage
//! CacheAuthContext::new(holder.shared_config(), storage)
//!     .save_token("ABC", &AccessToken::new("T1"), 3600)?;
//!
//! assert_eq!(holder.get_token()?.map(AccessToken::into_string), Some("T1".to_string()));
//! # Ok(())
//! # }
//! ```

use crate::config::AuthConfig;
use crate::context::{AuthenticationContext, CacheAuthContext};
use crate::error::{AuthError, Result};
use crate::types::{AccessToken, CacheLocation};
use bridge_traits::storage::{CacheStorage, MemoryStorage};
use std::sync::Arc;
use tracing::{debug, info};

/// One configuration record plus the authentication context bound to it.
///
/// Construct it once during start-up and pass it (or an `Arc` of it) to the
/// components that need token access.
pub struct ConfigurationHolder {
    config: Arc<AuthConfig>,
    context: Arc<dyn AuthenticationContext>,
}

impl ConfigurationHolder {
    /// Build a holder whose context caches tokens in `storage`.
    pub fn new(config: AuthConfig, storage: Arc<dyn CacheStorage>) -> Self {
        let config = Arc::new(config);
        let context: Arc<dyn AuthenticationContext> =
            Arc::new(CacheAuthContext::new(Arc::clone(&config), storage));

        info!(
            tenant = %config.tenant(),
            client_id = %config.client_id(),
            cache_location = %config.cache_location(),
            "Configuration holder ready"
        );

        Self { config, context }
    }

    /// Build a holder around a caller-supplied context.
    ///
    /// `factory` receives the shared record and must return a context bound to
    /// it. A context reporting a different configuration is rejected, so the
    /// client id used by [`get_token`](Self::get_token) always matches the one
    /// the context was built with.
    pub fn with_context<F>(config: AuthConfig, factory: F) -> Result<Self>
    where
        F: FnOnce(Arc<AuthConfig>) -> Arc<dyn AuthenticationContext>,
    {
        let config = Arc::new(config);
        let context = factory(Arc::clone(&config));

        if context.config() != config.as_ref() {
            return Err(AuthError::InvalidConfig(
                "authentication context is bound to a different configuration".to_string(),
            ));
        }

        debug!(client_id = %config.client_id(), "Configuration holder ready with custom context");
        Ok(Self { config, context })
    }

    /// Build a holder using the storage selected by the record's cache location.
    ///
    /// - `SessionStorage`: a fresh in-memory store owned by this holder
    /// - `LocalStorage`: the OS keychain (requires the `desktop-shims` feature)
    pub fn with_default_storage(config: AuthConfig) -> Result<Self> {
        let storage = default_storage(config.cache_location())?;
        Ok(Self::new(config, storage))
    }

    /// The configuration record
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Shared handle to the configuration record
    pub fn shared_config(&self) -> Arc<AuthConfig> {
        Arc::clone(&self.config)
    }

    /// The authentication context
    pub fn context(&self) -> &Arc<dyn AuthenticationContext> {
        &self.context
    }

    /// Token cached for the configured client id.
    ///
    /// `Ok(None)` means "not currently authenticated". Errors come from the
    /// context unchanged.
    pub fn get_token(&self) -> Result<Option<AccessToken>> {
        self.context.get_cached_token(self.config.client_id())
    }

    /// Token cached for a named endpoint's resource.
    ///
    /// An endpoint missing from the configuration yields `Ok(None)`.
    pub fn get_token_for(&self, endpoint: &str) -> Result<Option<AccessToken>> {
        match self.config.resource_for(endpoint) {
            Some(resource) => self.context.get_cached_token(resource),
            None => {
                debug!(endpoint = endpoint, "Endpoint not configured");
                Ok(None)
            }
        }
    }
}

impl std::fmt::Debug for ConfigurationHolder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigurationHolder")
            .field("config", &self.config)
            .field("context", &"AuthenticationContext { ... }")
            .finish()
    }
}

fn default_storage(location: CacheLocation) -> Result<Arc<dyn CacheStorage>> {
    match location {
        CacheLocation::SessionStorage => Ok(Arc::new(MemoryStorage::new())),
        CacheLocation::LocalStorage => provide_persistent_storage(),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_persistent_storage() -> Result<Arc<dyn CacheStorage>> {
    use bridge_desktop::KeyringStorage;

    let storage: Arc<dyn CacheStorage> = Arc::new(KeyringStorage::new());
    Ok(storage)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_persistent_storage() -> Result<Arc<dyn CacheStorage>> {
    Err(AuthError::CapabilityMissing {
        capability: "CacheStorage".to_string(),
        message: "The localStorage cache location needs persistent storage. \
                 Desktop: enable the 'desktop-shims' feature to use KeyringStorage. \
                 Other hosts: construct the holder with ConfigurationHolder::new and \
                 a platform storage."
            .to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::mock;

    mock! {
        AuthenticationContext {}

        impl AuthenticationContext for AuthenticationContext {
            fn config(&self) -> &AuthConfig;
            fn get_cached_token(&self, resource: &str) -> Result<Option<AccessToken>>;
        }
    }

    fn config(client_id: &str) -> AuthConfig {
        AuthConfig::builder()
            .tenant("74831e7e-045b-4115-b3ec-8cbe36b54b59")
            .client_id(client_id)
            .redirect_uri("http://localhost:3000")
            .endpoint("graph", "https://graph.microsoft.com")
            .build()
            .unwrap()
    }

    fn mock_for(config: &AuthConfig) -> MockAuthenticationContext {
        let mut mock = MockAuthenticationContext::new();
        mock.expect_config().return_const(config.clone());
        mock
    }

    #[test]
    fn test_get_token_queries_configured_client_id() {
        let record = config("ABC");
        let holder = ConfigurationHolder::with_context(record.clone(), |_| {
            let mut mock = mock_for(&record);
            mock.expect_get_cached_token()
                .withf(|resource| resource == "ABC")
                .times(1)
                .returning(|_| Ok(Some(AccessToken::new("T1"))));
            Arc::new(mock)
        })
        .unwrap();

        let token = holder.get_token().unwrap().unwrap();
        assert_eq!(token.as_str(), "T1");
    }

    #[test]
    fn test_get_token_absent_is_not_an_error() {
        let record = config("ABC");
        let holder = ConfigurationHolder::with_context(record.clone(), |_| {
            let mut mock = mock_for(&record);
            mock.expect_get_cached_token()
                .withf(|resource| resource == "ABC")
                .returning(|_| Ok(None));
            Arc::new(mock)
        })
        .unwrap();

        assert!(matches!(holder.get_token(), Ok(None)));
    }

    #[test]
    fn test_context_errors_propagate_unchanged() {
        let record = config("ABC");
        let holder = ConfigurationHolder::with_context(record.clone(), |_| {
            let mut mock = mock_for(&record);
            mock.expect_get_cached_token()
                .returning(|_| Err(AuthError::StorageUnavailable("offline".to_string())));
            Arc::new(mock)
        })
        .unwrap();

        assert!(matches!(
            holder.get_token(),
            Err(AuthError::StorageUnavailable(reason)) if reason == "offline"
        ));
    }

    #[test]
    fn test_get_token_for_endpoint_uses_resource() {
        let record = config("ABC");
        let holder = ConfigurationHolder::with_context(record.clone(), |_| {
            let mut mock = mock_for(&record);
            mock.expect_get_cached_token()
                .withf(|resource| resource == "https://graph.microsoft.com")
                .times(1)
                .returning(|_| Ok(Some(AccessToken::new("G1"))));
            Arc::new(mock)
        })
        .unwrap();

        assert_eq!(
            holder.get_token_for("graph").unwrap().map(AccessToken::into_string),
            Some("G1".to_string())
        );
        // Unknown endpoints never reach the context
        assert!(holder.get_token_for("unknown").unwrap().is_none());
    }

    #[test]
    fn test_context_factory_receives_same_record() {
        let record = config("ABC");
        let mut seen = Vec::new();

        for _ in 0..2 {
            let holder = ConfigurationHolder::with_context(record.clone(), |shared| {
                seen.push(shared.as_ref().clone());
                Arc::new(mock_for(&shared))
            })
            .unwrap();
            assert_eq!(holder.config(), &record);
        }

        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0], seen[1]);
        assert_eq!(seen[0], record);
    }

    #[test]
    fn test_default_context_shares_record_handle() {
        let holder = ConfigurationHolder::new(config("ABC"), Arc::new(MemoryStorage::new()));
        let context_config: *const AuthConfig = holder.context().config();

        assert!(std::ptr::eq(context_config, holder.config()));
    }

    #[test]
    fn test_mismatched_context_rejected() {
        let record = config("ABC");
        let other = config("XYZ");

        let result = ConfigurationHolder::with_context(record, |_| Arc::new(mock_for(&other)));

        assert!(matches!(result, Err(AuthError::InvalidConfig(_))));
    }

    #[test]
    fn test_session_storage_default() {
        let holder = ConfigurationHolder::with_default_storage(config("ABC")).unwrap();
        assert!(holder.get_token().unwrap().is_none());
    }

    #[cfg(not(feature = "desktop-shims"))]
    #[test]
    fn test_local_storage_requires_desktop_shims() {
        let record = AuthConfig::builder()
            .tenant("t")
            .client_id("ABC")
            .redirect_uri("http://localhost:3000")
            .cache_location(CacheLocation::LocalStorage)
            .build()
            .unwrap();

        assert!(matches!(
            ConfigurationHolder::with_default_storage(record),
            Err(AuthError::CapabilityMissing { .. })
        ));
    }
}
