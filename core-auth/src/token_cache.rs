//! Token Cache
//!
//! This module persists bearer tokens, keyed by resource, into whichever
//! [`CacheStorage`] the configured cache location selects.
//!
//! ## Storage Layout
//!
//! Each resource gets one entry under `access_token:<resource>` holding a JSON
//! document with the token and its absolute expiry (Unix seconds).
//!
//! ## Security Features
//!
//! - Token values are never logged or included in error messages
//! - Reads never mutate storage; a corrupted entry is reported and left for
//!   [`TokenCache::remove_token`] to discard
//!
//! ## Example
//!
//! ```
//! use core_auth::{AccessToken, TokenCache};
//! use bridge_traits::MemoryStorage;
//! use std::sync::Arc;
//!
//! # fn main() -> core_auth::Result<()> {
//! let cache = TokenCache::new(Arc::new(MemoryStorage::new()));
//!
//! cache.store_token("https://graph.microsoft.com", &AccessToken::new("T1"), 3600)?;
//!
//! let token = cache.get_valid_token("https://graph.microsoft.com", 300)?;
//! assert_eq!(token.map(AccessToken::into_string), Some("T1".to_string()));
//! # Ok(())
//! # }
//! ```

use crate::error::{AuthError, Result};
use crate::types::AccessToken;
use bridge_traits::storage::CacheStorage;
use bridge_traits::time::{Clock, SystemClock};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

const KEY_PREFIX: &str = "access_token:";

/// A cache entry together with its expiry.
#[derive(Clone)]
pub struct CachedToken {
    /// The cached token
    pub token: AccessToken,
    /// When the token expires (UTC)
    pub expires_at: DateTime<Utc>,
}

impl CachedToken {
    /// Whether the token is expired, or expires within `buffer_seconds`, at `now`
    ///
    /// A buffer too large to represent counts as stale.
    pub fn is_stale_at(&self, now: DateTime<Utc>, buffer_seconds: i64) -> bool {
        chrono::Duration::try_seconds(buffer_seconds)
            .and_then(|buffer| now.checked_add_signed(buffer))
            .map_or(true, |deadline| deadline >= self.expires_at)
    }
}

impl fmt::Debug for CachedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedToken")
            .field("token", &self.token)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Serializable form of a cache entry
#[derive(Debug, Serialize, Deserialize)]
struct StoredToken {
    access_token: String,
    expires_at: i64,
}

/// Resource-keyed token cache
///
/// Cloning is cheap; clones share the same storage and clock.
#[derive(Clone)]
pub struct TokenCache {
    storage: Arc<dyn CacheStorage>,
    clock: Arc<dyn Clock>,
}

impl TokenCache {
    /// Create a cache over `storage` using the system clock
    pub fn new(storage: Arc<dyn CacheStorage>) -> Self {
        Self::with_clock(storage, Arc::new(SystemClock))
    }

    /// Create a cache with an explicit time source
    pub fn with_clock(storage: Arc<dyn CacheStorage>, clock: Arc<dyn Clock>) -> Self {
        debug!("Initializing TokenCache");
        Self { storage, clock }
    }

    /// Current time according to the cache's clock
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Store a token for `resource` that expires `expires_in` seconds from now.
    ///
    /// Any existing entry for the resource is overwritten. A lifetime whose
    /// expiry cannot be represented is rejected with `InvalidSetting`.
    pub fn store_token(&self, resource: &str, token: &AccessToken, expires_in: i64) -> Result<()> {
        let expires_at = self
            .clock
            .unix_timestamp()
            .checked_add(expires_in)
            .ok_or_else(|| invalid_expiry(format!("expires_in {} overflows", expires_in)))?;
        self.store_token_until(resource, token, expires_at)
    }

    /// Store a token for `resource` with an absolute expiry (Unix seconds).
    pub fn store_token_until(
        &self,
        resource: &str,
        token: &AccessToken,
        expires_at: i64,
    ) -> Result<()> {
        if Utc.timestamp_opt(expires_at, 0).single().is_none() {
            return Err(invalid_expiry(format!("expiry {} out of range", expires_at)));
        }

        let key = storage_key(resource);

        let stored = StoredToken {
            access_token: token.as_str().to_string(),
            expires_at,
        };

        let json = serde_json::to_string(&stored).map_err(|e| {
            warn!(resource = resource, error = %e, "Failed to serialize token");
            AuthError::SerializationFailed {
                context: "token serialization".to_string(),
                source: e,
            }
        })?;

        self.storage.set_item(&key, &json).map_err(|e| {
            warn!(resource = resource, error = %e, "Failed to write token to cache storage");
            AuthError::StorageUnavailable(e.to_string())
        })?;

        info!(resource = resource, expires_at = expires_at, "Token cached");
        Ok(())
    }

    /// Read the raw cache entry for `resource`, regardless of expiry.
    ///
    /// Returns:
    /// - `Ok(Some(entry))` if an entry exists and decodes
    /// - `Ok(None)` if no entry exists
    /// - `Err` if the storage is unavailable or the entry is corrupted
    ///
    /// Storage is never modified.
    pub fn read_entry(&self, resource: &str) -> Result<Option<CachedToken>> {
        let key = storage_key(resource);

        let data = self.storage.get_item(&key).map_err(|e| {
            warn!(resource = resource, error = %e, "Failed to read token from cache storage");
            AuthError::StorageUnavailable(e.to_string())
        })?;

        let Some(data) = data else {
            debug!(resource = resource, "No token cached");
            return Ok(None);
        };

        let decoded = serde_json::from_str::<StoredToken>(&data)
            .map_err(|e| e.to_string())
            .and_then(|stored| {
                Utc.timestamp_opt(stored.expires_at, 0)
                    .single()
                    .map(|expires_at| CachedToken {
                        token: AccessToken::new(stored.access_token),
                        expires_at,
                    })
                    .ok_or_else(|| format!("expiry {} out of range", stored.expires_at))
            });

        match decoded {
            Ok(entry) => Ok(Some(entry)),
            Err(reason) => {
                warn!(
                    resource = resource,
                    error = %reason,
                    "Failed to decode cached token, it may be corrupted"
                );

                Err(AuthError::TokenCorrupted {
                    resource: resource.to_string(),
                    reason,
                })
            }
        }
    }

    /// Token for `resource` if it is still valid `offset_seconds` from now.
    ///
    /// A stale entry yields `Ok(None)` and is left in place.
    pub fn get_valid_token(
        &self,
        resource: &str,
        offset_seconds: i64,
    ) -> Result<Option<AccessToken>> {
        let Some(entry) = self.read_entry(resource)? else {
            return Ok(None);
        };

        if entry.is_stale_at(self.clock.now(), offset_seconds) {
            debug!(
                resource = resource,
                expires_at = %entry.expires_at,
                "Cached token is stale"
            );
            return Ok(None);
        }

        Ok(Some(entry.token))
    }

    /// Whether an entry exists for `resource`, valid or not
    pub fn has_token(&self, resource: &str) -> Result<bool> {
        self.storage
            .has_item(&storage_key(resource))
            .map_err(|e| AuthError::StorageUnavailable(e.to_string()))
    }

    /// Remove the entry for `resource`. Idempotent.
    pub fn remove_token(&self, resource: &str) -> Result<()> {
        self.storage.remove_item(&storage_key(resource)).map_err(|e| {
            warn!(resource = resource, error = %e, "Failed to delete cached token");
            AuthError::StorageUnavailable(e.to_string())
        })?;

        info!(resource = resource, "Cached token removed");
        Ok(())
    }

    /// Resources that currently hold an entry
    pub fn cached_resources(&self) -> Result<Vec<String>> {
        let keys = self.storage.list_keys().map_err(|e| {
            warn!(error = %e, "Failed to list cache storage keys");
            AuthError::StorageUnavailable(e.to_string())
        })?;

        let mut resources: Vec<String> = keys
            .iter()
            .filter_map(|key| key.strip_prefix(KEY_PREFIX).map(str::to_string))
            .collect();
        resources.sort();

        debug!(count = resources.len(), "Listed cached resources");
        Ok(resources)
    }

    /// Remove every token entry. Keys written by others are left untouched.
    pub fn clear(&self) -> Result<()> {
        let resources = self.cached_resources()?;
        for resource in &resources {
            self.remove_token(resource)?;
        }

        info!(count = resources.len(), "Token cache cleared");
        Ok(())
    }
}

/// Keys are formatted as "access_token:<resource>" to namespace them within
/// a storage that may hold unrelated entries.
fn storage_key(resource: &str) -> String {
    format!("{}{}", KEY_PREFIX, resource)
}

fn invalid_expiry(reason: String) -> AuthError {
    AuthError::InvalidSetting {
        key: "expires_in".to_string(),
        reason,
    }
}
