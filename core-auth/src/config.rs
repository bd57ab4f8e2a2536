//! # Identity Configuration
//!
//! The configuration record handed to an authentication context: tenant,
//! client, redirect URI, resource endpoints and cache location.
//!
//! ## Overview
//!
//! An [`AuthConfig`] is immutable once built. It can be assembled three ways,
//! all of which run the same validation:
//!
//! - [`AuthConfig::builder`] for values known in code
//! - [`AuthConfig::from_env`] / [`AuthConfig::from_vars`] for deployment settings
//! - [`AuthConfig::from_json`] for a configuration document
//!
//! ## Environment Variables
//!
//! | Variable | Required | Meaning |
//! |----------|----------|---------|
//! | `AUTH_TENANT` | yes | Tenant id or domain |
//! | `AUTH_CLIENT_ID` | yes | Registered application id |
//! | `AUTH_REDIRECT_URI` | yes | Sign-in redirect URI |
//! | `AUTH_CACHE_LOCATION` | no | `sessionStorage` (default) or `localStorage` |
//! | `AUTH_INSTANCE` | no | Authority host, defaults to `https://login.microsoftonline.com/` |
//! | `AUTH_POST_LOGOUT_REDIRECT_URI` | no | Sign-out redirect URI |
//! | `AUTH_EXPIRE_OFFSET_SECONDS` | no | Staleness margin, 0 to 86400, defaults to 300 |
//! | `AUTH_ENDPOINT_<NAME>` | no | Resource id for the endpoint `<name>` (lower-cased, must be unique) |
//!
//! ## Usage
//!
//! ```
//! use core_auth::{AuthConfig, CacheLocation};
//!
//! let config = AuthConfig::builder()
//!     .tenant("contoso.onmicrosoft.com")
//!     .client_id("16273fd8-a47b-429c-82d0-fb973b6abfb0")
//!     .redirect_uri("http://localhost:3000")
//!     .api_endpoint_from_app_id_uri("https://contoso.onmicrosoft.com")
//!     .cache_location(CacheLocation::SessionStorage)
//!     .build()
//!     .expect("valid configuration");
//!
//! assert_eq!(
//!     config.api_resource(),
//!     Some("https://contoso.onmicrosoft.com/16273fd8-a47b-429c-82d0-fb973b6abfb0")
//! );
//! ```

use crate::error::{AuthError, Result};
use crate::types::CacheLocation;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;
use url::Url;
use uuid::Uuid;

/// Default authority host
pub const DEFAULT_INSTANCE: &str = "https://login.microsoftonline.com/";

/// Default margin, in seconds, before expiry at which a cached token is stale
pub const DEFAULT_EXPIRE_OFFSET_SECONDS: i64 = 300;

/// Largest accepted staleness margin (one day)
pub const MAX_EXPIRE_OFFSET_SECONDS: i64 = 86_400;

/// Logical name of the application's own API endpoint
pub const API_ENDPOINT: &str = "api";

/// Prefix shared by every environment variable read by [`AuthConfig::from_env`]
pub const ENV_PREFIX: &str = "AUTH_";

const ENV_TENANT: &str = "AUTH_TENANT";
const ENV_CLIENT_ID: &str = "AUTH_CLIENT_ID";
const ENV_REDIRECT_URI: &str = "AUTH_REDIRECT_URI";
const ENV_CACHE_LOCATION: &str = "AUTH_CACHE_LOCATION";
const ENV_INSTANCE: &str = "AUTH_INSTANCE";
const ENV_POST_LOGOUT_REDIRECT_URI: &str = "AUTH_POST_LOGOUT_REDIRECT_URI";
const ENV_EXPIRE_OFFSET_SECONDS: &str = "AUTH_EXPIRE_OFFSET_SECONDS";
const ENV_ENDPOINT_PREFIX: &str = "AUTH_ENDPOINT_";

/// Identity provider configuration record.
///
/// Use [`AuthConfigBuilder`] (via [`AuthConfig::builder`]) or one of the
/// loaders to construct instances; every constructor validates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthConfig {
    tenant: String,
    client_id: String,
    redirect_uri: String,
    endpoints: BTreeMap<String, String>,
    cache_location: CacheLocation,
    instance: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    post_logout_redirect_uri: Option<String>,
    expire_offset_seconds: i64,
}

/// Configuration document accepted by [`AuthConfig::from_json`].
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthConfigDocument {
    tenant: Option<String>,
    client_id: Option<String>,
    redirect_uri: Option<String>,
    #[serde(default)]
    endpoints: BTreeMap<String, String>,
    cache_location: Option<CacheLocation>,
    instance: Option<String>,
    post_logout_redirect_uri: Option<String>,
    expire_offset_seconds: Option<i64>,
}

impl AuthConfig {
    /// Creates a new builder for constructing an `AuthConfig`.
    pub fn builder() -> AuthConfigBuilder {
        AuthConfigBuilder::default()
    }

    /// Load the configuration from the process environment.
    ///
    /// See the module documentation for the variables read.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(std::env::vars())
    }

    /// Load the configuration from an explicit set of variables.
    ///
    /// Variables with empty values are treated as unset. Variables without the
    /// `AUTH_` prefix are ignored. Two endpoint variables whose names only
    /// differ by case are rejected.
    ///
    /// # Examples
    ///
    /// ```
    /// use core_auth::AuthConfig;
    ///
    /// let config = AuthConfig::from_vars([
    ///     ("AUTH_TENANT".to_string(), "contoso.onmicrosoft.com".to_string()),
    ///     ("AUTH_CLIENT_ID".to_string(), "ABC".to_string()),
    ///     ("AUTH_REDIRECT_URI".to_string(), "http://localhost:3000".to_string()),
    ///     ("AUTH_ENDPOINT_GRAPH".to_string(), "https://graph.microsoft.com".to_string()),
    /// ])
    /// .unwrap();
    ///
    /// assert_eq!(config.resource_for("graph"), Some("https://graph.microsoft.com"));
    /// ```
    pub fn from_vars<I>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let vars: BTreeMap<String, String> = vars
            .into_iter()
            .filter(|(key, value)| key.starts_with(ENV_PREFIX) && !value.trim().is_empty())
            .collect();

        let required = |key: &str| {
            vars.get(key)
                .cloned()
                .ok_or_else(|| AuthError::MissingSetting(key.to_string()))
        };

        let mut builder = Self::builder()
            .tenant(required(ENV_TENANT)?)
            .client_id(required(ENV_CLIENT_ID)?)
            .redirect_uri(required(ENV_REDIRECT_URI)?);

        if let Some(raw) = vars.get(ENV_CACHE_LOCATION) {
            let location = CacheLocation::parse(raw).ok_or_else(|| AuthError::InvalidSetting {
                key: ENV_CACHE_LOCATION.to_string(),
                reason: format!(
                    "expected 'sessionStorage' or 'localStorage', got '{}'",
                    raw
                ),
            })?;
            builder = builder.cache_location(location);
        }

        if let Some(instance) = vars.get(ENV_INSTANCE) {
            builder = builder.instance(instance.clone());
        }

        if let Some(uri) = vars.get(ENV_POST_LOGOUT_REDIRECT_URI) {
            builder = builder.post_logout_redirect_uri(uri.clone());
        }

        if let Some(raw) = vars.get(ENV_EXPIRE_OFFSET_SECONDS) {
            let seconds = raw
                .trim()
                .parse::<i64>()
                .map_err(|e| AuthError::InvalidSetting {
                    key: ENV_EXPIRE_OFFSET_SECONDS.to_string(),
                    reason: e.to_string(),
                })?;
            builder = builder.expire_offset_seconds(seconds);
        }

        let mut endpoint_sources: BTreeMap<String, &str> = BTreeMap::new();
        for (key, resource) in &vars {
            let Some(name) = key.strip_prefix(ENV_ENDPOINT_PREFIX) else {
                continue;
            };
            let name = name.to_lowercase();
            if let Some(previous) = endpoint_sources.insert(name.clone(), key.as_str()) {
                return Err(AuthError::InvalidSetting {
                    key: key.clone(),
                    reason: format!("endpoint '{}' is also set by {}", name, previous),
                });
            }
            builder = builder.endpoint(name, resource.clone());
        }

        builder.build()
    }

    /// Parse and validate a JSON configuration document.
    ///
    /// Keys use camelCase: `tenant`, `clientId`, `redirectUri`, `endpoints`,
    /// `cacheLocation`, `instance`, `postLogoutRedirectUri`,
    /// `expireOffsetSeconds`.
    pub fn from_json(document: &str) -> Result<Self> {
        let doc: AuthConfigDocument =
            serde_json::from_str(document).map_err(|e| AuthError::SerializationFailed {
                context: "configuration document".to_string(),
                source: e,
            })?;

        let builder = AuthConfigBuilder {
            tenant: doc.tenant,
            client_id: doc.client_id,
            redirect_uri: doc.redirect_uri,
            endpoints: doc.endpoints,
            cache_location: doc.cache_location,
            instance: doc.instance,
            post_logout_redirect_uri: doc.post_logout_redirect_uri,
            expire_offset_seconds: doc.expire_offset_seconds,
            api_app_id_uri: None,
        };

        builder.build()
    }

    /// Tenant identifier
    pub fn tenant(&self) -> &str {
        &self.tenant
    }

    /// Registered application identifier
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Sign-in redirect URI
    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    /// Logical endpoint name to resource identifier map
    pub fn endpoints(&self) -> &BTreeMap<String, String> {
        &self.endpoints
    }

    /// Where the authentication context caches tokens
    pub fn cache_location(&self) -> CacheLocation {
        self.cache_location
    }

    /// Authority host, always ending with `/`
    pub fn instance(&self) -> &str {
        &self.instance
    }

    /// Sign-out redirect URI, if configured
    pub fn post_logout_redirect_uri(&self) -> Option<&str> {
        self.post_logout_redirect_uri.as_deref()
    }

    /// Seconds before expiry at which a cached token is considered stale
    pub fn expire_offset_seconds(&self) -> i64 {
        self.expire_offset_seconds
    }

    /// Authority URL: instance followed by tenant
    ///
    /// # Examples
    ///
    /// ```
    /// use core_auth::AuthConfig;
    ///
    /// let config = AuthConfig::builder()
    ///     .tenant("contoso.onmicrosoft.com")
    ///     .client_id("ABC")
    ///     .redirect_uri("http://localhost:3000")
    ///     .build()
    ///     .unwrap();
    ///
    /// assert_eq!(
    ///     config.authority(),
    ///     "https://login.microsoftonline.com/contoso.onmicrosoft.com"
    /// );
    /// ```
    pub fn authority(&self) -> String {
        format!("{}{}", self.instance, self.tenant)
    }

    /// Resource identifier registered for a logical endpoint name
    pub fn resource_for(&self, endpoint: &str) -> Option<&str> {
        self.endpoints.get(endpoint).map(String::as_str)
    }

    /// Resource identifier of the application's own API, if configured
    pub fn api_resource(&self) -> Option<&str> {
        self.resource_for(API_ENDPOINT)
    }
}

/// Builder for constructing [`AuthConfig`] instances.
///
/// Call [`build()`](AuthConfigBuilder::build) to validate and create the
/// final record.
#[derive(Debug, Default, Clone)]
pub struct AuthConfigBuilder {
    tenant: Option<String>,
    client_id: Option<String>,
    redirect_uri: Option<String>,
    endpoints: BTreeMap<String, String>,
    cache_location: Option<CacheLocation>,
    instance: Option<String>,
    post_logout_redirect_uri: Option<String>,
    expire_offset_seconds: Option<i64>,
    api_app_id_uri: Option<String>,
}

impl AuthConfigBuilder {
    /// Sets the tenant identifier (GUID or verified domain).
    pub fn tenant(mut self, tenant: impl Into<String>) -> Self {
        self.tenant = Some(tenant.into());
        self
    }

    /// Sets the registered application identifier.
    pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    /// Sets the sign-in redirect URI.
    pub fn redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.redirect_uri = Some(uri.into());
        self
    }

    /// Registers a resource identifier under a logical endpoint name.
    ///
    /// Registering the same name twice keeps the last value.
    pub fn endpoint(mut self, name: impl Into<String>, resource: impl Into<String>) -> Self {
        self.endpoints.insert(name.into(), resource.into());
        self
    }

    /// Registers the `api` endpoint as `<app_id_uri>/<client_id>`.
    ///
    /// The client id is substituted at build time, so the endpoint can never
    /// drift from the configured client.
    pub fn api_endpoint_from_app_id_uri(mut self, app_id_uri: impl Into<String>) -> Self {
        self.api_app_id_uri = Some(app_id_uri.into());
        self
    }

    /// Sets where tokens are cached.
    pub fn cache_location(mut self, location: CacheLocation) -> Self {
        self.cache_location = Some(location);
        self
    }

    /// Sets the authority host.
    pub fn instance(mut self, instance: impl Into<String>) -> Self {
        self.instance = Some(instance.into());
        self
    }

    /// Sets the sign-out redirect URI.
    pub fn post_logout_redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.post_logout_redirect_uri = Some(uri.into());
        self
    }

    /// Sets the staleness margin applied to cached tokens.
    pub fn expire_offset_seconds(mut self, seconds: i64) -> Self {
        self.expire_offset_seconds = Some(seconds);
        self
    }

    /// Validates the settings and builds the configuration.
    ///
    /// This checks:
    /// - Tenant, client id and redirect URI are present and non-empty
    /// - Redirect URIs and the instance are absolute URLs
    /// - Endpoint names and resources are non-empty
    /// - The `api` endpoint does not embed a different application id
    /// - The expire offset is between 0 and [`MAX_EXPIRE_OFFSET_SECONDS`]
    pub fn build(self) -> Result<AuthConfig> {
        let tenant = require_non_empty("tenant", self.tenant)?;
        let client_id = require_non_empty("client_id", self.client_id)?;
        let redirect_uri = require_non_empty("redirect_uri", self.redirect_uri)?;
        validate_url("redirect_uri", &redirect_uri)?;

        let instance = match self.instance {
            Some(instance) => {
                let instance = instance.trim().to_string();
                validate_url("instance", &instance)?;
                if instance.ends_with('/') {
                    instance
                } else {
                    format!("{}/", instance)
                }
            }
            None => DEFAULT_INSTANCE.to_string(),
        };

        let post_logout_redirect_uri = match self.post_logout_redirect_uri {
            Some(uri) => {
                let uri = uri.trim().to_string();
                validate_url("post_logout_redirect_uri", &uri)?;
                Some(uri)
            }
            None => None,
        };

        let expire_offset_seconds = self
            .expire_offset_seconds
            .unwrap_or(DEFAULT_EXPIRE_OFFSET_SECONDS);
        if !(0..=MAX_EXPIRE_OFFSET_SECONDS).contains(&expire_offset_seconds) {
            return Err(AuthError::InvalidSetting {
                key: "expire_offset_seconds".to_string(),
                reason: format!(
                    "must be between 0 and {} seconds, got {}",
                    MAX_EXPIRE_OFFSET_SECONDS, expire_offset_seconds
                ),
            });
        }

        let mut endpoints = self.endpoints;
        if let Some(app_id_uri) = self.api_app_id_uri {
            let app_id_uri = app_id_uri.trim().trim_end_matches('/').to_string();
            if app_id_uri.is_empty() {
                return Err(AuthError::InvalidConfig(
                    "api app id URI cannot be empty".to_string(),
                ));
            }
            endpoints.insert(
                API_ENDPOINT.to_string(),
                format!("{}/{}", app_id_uri, client_id),
            );
        }

        for (name, resource) in &endpoints {
            if name.trim().is_empty() {
                return Err(AuthError::InvalidConfig(
                    "Endpoint names cannot be empty".to_string(),
                ));
            }
            if resource.trim().is_empty() {
                return Err(AuthError::InvalidConfig(format!(
                    "Endpoint '{}' has an empty resource identifier",
                    name
                )));
            }
        }

        if let Some(resource) = endpoints.get(API_ENDPOINT) {
            check_embedded_client_id(API_ENDPOINT, resource, &client_id)?;
        }

        let config = AuthConfig {
            tenant,
            client_id,
            redirect_uri,
            endpoints,
            cache_location: self.cache_location.unwrap_or_default(),
            instance,
            post_logout_redirect_uri,
            expire_offset_seconds,
        };

        debug!(
            tenant = %config.tenant,
            client_id = %config.client_id,
            endpoints = config.endpoints.len(),
            cache_location = %config.cache_location,
            "Built identity configuration"
        );

        Ok(config)
    }
}

fn require_non_empty(key: &str, value: Option<String>) -> Result<String> {
    let value = value.ok_or_else(|| AuthError::MissingSetting(key.to_string()))?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AuthError::InvalidConfig(format!("{} cannot be empty", key)));
    }
    Ok(trimmed.to_string())
}

fn validate_url(key: &str, value: &str) -> Result<()> {
    Url::parse(value)
        .map(|_| ())
        .map_err(|e| AuthError::InvalidSetting {
            key: key.to_string(),
            reason: format!("not an absolute URL ({})", e),
        })
}

/// Rejects a resource whose last path segment is a GUID other than the client id.
fn check_embedded_client_id(endpoint: &str, resource: &str, client_id: &str) -> Result<()> {
    let last_segment = resource
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default();

    let Ok(embedded) = Uuid::parse_str(last_segment) else {
        return Ok(());
    };

    let matches = Uuid::parse_str(client_id)
        .map(|client| client == embedded)
        .unwrap_or(false);

    if matches {
        Ok(())
    } else {
        Err(AuthError::EndpointClientMismatch {
            endpoint: endpoint.to_string(),
            embedded: embedded.to_string(),
            client_id: client_id.to_string(),
        })
    }
}
