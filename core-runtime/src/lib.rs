//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the identity configuration
//! crates:
//! - Logging and tracing infrastructure
//!
//! ## Overview
//!
//! This crate establishes the logging conventions used throughout the
//! workspace. Hosts call [`logging::init_logging`] once during start-up, before
//! constructing a configuration holder.

pub mod error;
pub mod logging;

pub use error::{Error, Result};
