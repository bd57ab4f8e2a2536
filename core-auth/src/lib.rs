//! # Authentication Configuration Module
//!
//! Identity-provider configuration glue with a cached-token accessor.
//!
//! ## Overview
//!
//! This crate assembles the configuration an authentication context needs
//! (tenant, client id, redirect URI, resource endpoints, cache location),
//! builds exactly one context from it, and exposes a zero-argument accessor
//! returning the token cached for the configured client.
//!
//! Token acquisition, renewal and redirect handling are not implemented here;
//! they belong to whatever implements [`AuthenticationContext`].
//!
//! ## Features
//!
//! - Validated, immutable [`AuthConfig`] loaded from code, environment or JSON
//! - Pluggable [`AuthenticationContext`] with a cache-only default
//! - Resource-keyed [`TokenCache`] over session (memory) or local (keychain) storage
//! - Expiry margin applied on read; stale tokens read as absent
//!
//! ## Feature Flags
//!
//! - `desktop-shims`: use the OS keychain for the `localStorage` cache location

pub mod config;
pub mod context;
pub mod error;
pub mod holder;
pub mod token_cache;
pub mod types;

pub use config::{AuthConfig, AuthConfigBuilder};
pub use context::{AuthenticationContext, CacheAuthContext};
pub use error::{AuthError, Result};
pub use holder::ConfigurationHolder;
pub use token_cache::{CachedToken, TokenCache};
pub use types::{AccessToken, CacheLocation};
