//! Workspace facade crate.
//!
//! Re-exports the identity configuration crates so host applications can
//! depend on `identity-config-workspace` and toggle the `desktop-shims`
//! feature without wiring each crate individually.
//!
//! ```no_run
//! use identity_config_workspace::{AuthConfig, ConfigurationHolder};
//!
//! # fn main() -> Result<(), identity_config_workspace::AuthError> {
//! let config = AuthConfig::from_env()?;
//! let holder = ConfigurationHolder::with_default_storage(config)?;
//!
//! if let Some(token) = holder.get_token()? {
//!     println!("signed in, token length {}", token.as_str().len());
//! }
//! # Ok(())
//! # }
//! ```

pub use core_auth::{
    AccessToken, AuthConfig, AuthError, AuthenticationContext, CacheAuthContext, CacheLocation,
    ConfigurationHolder, TokenCache,
};
pub use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
