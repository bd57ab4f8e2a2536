//! # Host Bridge Traits
//!
//! Platform abstraction traits that must be implemented by each host platform.
//!
//! ## Overview
//!
//! This crate defines the contract between the authentication core and
//! platform-specific implementations. Each trait represents a capability the
//! core requires but that must be implemented differently per platform
//! (desktop, mobile, web).
//!
//! ## Traits
//!
//! - [`CacheStorage`](storage::CacheStorage) - Token cache persistence (session or local)
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//!
//! ## Platform Requirements
//!
//! | Cache location   | Implementation                     | Crate            |
//! |------------------|------------------------------------|------------------|
//! | Session storage  | [`MemoryStorage`](storage::MemoryStorage) | `bridge-traits`  |
//! | Local storage    | `KeyringStorage`                   | `bridge-desktop` |
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type.
//! Platform implementations should convert platform-specific errors to
//! `BridgeError` and never include stored values in error messages.
//!
//! ## Thread Safety
//!
//! Bridge traits require `Send + Sync` so a single storage instance can back
//! several authentication contexts.

pub mod error;
pub mod storage;
pub mod time;

pub use error::BridgeError;

pub use storage::{CacheStorage, MemoryStorage};
pub use time::{Clock, LogLevel, SystemClock};
