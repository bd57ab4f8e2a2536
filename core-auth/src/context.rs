//! # Authentication Context
//!
//! The capability a configuration holder delegates token lookups to.
//!
//! ## Overview
//!
//! [`AuthenticationContext`] is the seam between the configuration glue and
//! whatever performs authentication. Token acquisition, renewal and redirect
//! handling belong to implementations of this trait, not to the holder.
//!
//! [`CacheAuthContext`] is the default implementation: a read/write view over a
//! [`TokenCache`]. It performs no network I/O. Code that acquires tokens writes
//! them with [`CacheAuthContext::save_token`]; the holder reads them back.

use crate::config::AuthConfig;
use crate::error::Result;
use crate::token_cache::TokenCache;
use crate::types::AccessToken;
use bridge_traits::storage::CacheStorage;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Authentication context bound to one configuration record.
///
/// # Contract
///
/// - `get_cached_token` is a synchronous, read-only lookup
/// - "nothing cached" (including a stale entry) is `Ok(None)`, never an error
/// - `Err` is reserved for failures of the context itself, such as storage
///   being unavailable
pub trait AuthenticationContext: Send + Sync {
    /// The configuration record this context was constructed from
    fn config(&self) -> &AuthConfig;

    /// Token cached for `resource`, if one is present and not stale
    fn get_cached_token(&self, resource: &str) -> Result<Option<AccessToken>>;
}

/// Cache-only [`AuthenticationContext`].
#[derive(Clone)]
pub struct CacheAuthContext {
    config: Arc<AuthConfig>,
    cache: TokenCache,
}

impl CacheAuthContext {
    /// Create a context over `storage` using the system clock
    pub fn new(config: Arc<AuthConfig>, storage: Arc<dyn CacheStorage>) -> Self {
        Self::with_cache(config, TokenCache::new(storage))
    }

    /// Create a context over an existing token cache
    pub fn with_cache(config: Arc<AuthConfig>, cache: TokenCache) -> Self {
        debug!(
            client_id = %config.client_id(),
            cache_location = %config.cache_location(),
            "Creating authentication context"
        );
        Self { config, cache }
    }

    /// Shared handle to the configuration record
    pub fn shared_config(&self) -> Arc<AuthConfig> {
        Arc::clone(&self.config)
    }

    /// The underlying token cache
    pub fn cache(&self) -> &TokenCache {
        &self.cache
    }

    /// Cache a token acquired for `resource`, valid for `expires_in` seconds.
    pub fn save_token(&self, resource: &str, token: &AccessToken, expires_in: i64) -> Result<()> {
        self.cache.store_token(resource, token, expires_in)
    }

    /// Cache a token acquired for a named endpoint.
    ///
    /// Returns `Ok(false)` without writing when the endpoint is not configured.
    pub fn save_endpoint_token(
        &self,
        endpoint: &str,
        token: &AccessToken,
        expires_in: i64,
    ) -> Result<bool> {
        match self.config.resource_for(endpoint) {
            Some(resource) => {
                self.cache.store_token(resource, token, expires_in)?;
                Ok(true)
            }
            None => {
                debug!(endpoint = endpoint, "Unknown endpoint, token not cached");
                Ok(false)
            }
        }
    }

    /// Drop the token cached for `resource`
    pub fn clear_cache_for_resource(&self, resource: &str) -> Result<()> {
        self.cache.remove_token(resource)
    }

    /// Drop every cached token
    pub fn clear_cache(&self) -> Result<()> {
        info!(client_id = %self.config.client_id(), "Clearing token cache");
        self.cache.clear()
    }

    /// Resources that currently hold a cache entry
    pub fn cached_resources(&self) -> Result<Vec<String>> {
        self.cache.cached_resources()
    }
}

impl AuthenticationContext for CacheAuthContext {
    fn config(&self) -> &AuthConfig {
        &self.config
    }

    #[instrument(skip(self))]
    fn get_cached_token(&self, resource: &str) -> Result<Option<AccessToken>> {
        self.cache
            .get_valid_token(resource, self.config.expire_offset_seconds())
    }
}

impl std::fmt::Debug for CacheAuthContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheAuthContext")
            .field("config", &self.config)
            .field("cache", &"TokenCache { ... }")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CacheLocation;
    use bridge_traits::MemoryStorage;

    fn config(client_id: &str) -> Arc<AuthConfig> {
        Arc::new(
            AuthConfig::builder()
                .tenant("contoso.onmicrosoft.com")
                .client_id(client_id)
                .redirect_uri("http://localhost:3000")
                .endpoint("graph", "https://graph.microsoft.com")
                .cache_location(CacheLocation::SessionStorage)
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn test_context_keeps_config_handle() {
        let config = config("ABC");
        let context = CacheAuthContext::new(config.clone(), Arc::new(MemoryStorage::new()));

        assert!(Arc::ptr_eq(&config, &context.shared_config()));
        assert_eq!(context.config().client_id(), "ABC");
    }

    #[test]
    fn test_save_and_get_cached_token() {
        let context = CacheAuthContext::new(config("ABC"), Arc::new(MemoryStorage::new()));

        assert!(context.get_cached_token("ABC").unwrap().is_none());

        context
            .save_token("ABC", &AccessToken::new("T1"), 3600)
            .unwrap();

        let token = context.get_cached_token("ABC").unwrap().unwrap();
        assert_eq!(token.as_str(), "T1");
    }

    #[test]
    fn test_token_inside_expire_offset_is_not_returned() {
        let context = CacheAuthContext::new(config("ABC"), Arc::new(MemoryStorage::new()));

        // Default offset is 300 seconds
        context
            .save_token("ABC", &AccessToken::new("T1"), 120)
            .unwrap();

        assert!(context.get_cached_token("ABC").unwrap().is_none());
    }

    #[test]
    fn test_save_endpoint_token() {
        let context = CacheAuthContext::new(config("ABC"), Arc::new(MemoryStorage::new()));

        assert!(context
            .save_endpoint_token("graph", &AccessToken::new("G1"), 3600)
            .unwrap());
        assert!(!context
            .save_endpoint_token("missing", &AccessToken::new("X"), 3600)
            .unwrap());

        let token = context
            .get_cached_token("https://graph.microsoft.com")
            .unwrap()
            .unwrap();
        assert_eq!(token.as_str(), "G1");
    }

    #[test]
    fn test_clear_cache() {
        let context = CacheAuthContext::new(config("ABC"), Arc::new(MemoryStorage::new()));
        context
            .save_token("ABC", &AccessToken::new("T1"), 3600)
            .unwrap();
        context
            .save_token("https://graph.microsoft.com", &AccessToken::new("G1"), 3600)
            .unwrap();

        context.clear_cache_for_resource("ABC").unwrap();
        assert_eq!(
            context.cached_resources().unwrap(),
            vec!["https://graph.microsoft.com".to_string()]
        );

        context.clear_cache().unwrap();
        assert!(context.cached_resources().unwrap().is_empty());
    }
}
