//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! This crate provides the persistent token cache used for the `localStorage`
//! cache location:
//! - `CacheStorage` using the `keyring` crate (OS keychain)
//!
//! The session cache location needs no desktop support; it is served by
//! [`bridge_traits::MemoryStorage`].
//!
//! ## Feature Flags
//!
//! - `secure-store`: Enable OS keychain integration (default)
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::KeyringStorage;
//! use bridge_traits::CacheStorage;
//! use std::sync::Arc;
//!
//! let storage: Arc<dyn CacheStorage> = Arc::new(KeyringStorage::new());
//! ```

#[cfg(feature = "secure-store")]
mod keyring_store;

#[cfg(feature = "secure-store")]
pub use keyring_store::KeyringStorage;
