//! Time Abstractions
//!
//! Provides an injectable time source for deterministic token expiry checks,
//! and the log level shared with the logging configuration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Time source trait
///
/// Abstracts system time so cache expiry can be tested deterministically.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::time::Clock;
///
/// fn is_past(clock: &dyn Clock, deadline: i64) -> bool {
///     clock.unix_timestamp() >= deadline
/// }
/// ```
pub trait Clock: Send + Sync {
    /// Get current UTC time
    fn now(&self) -> DateTime<Utc>;

    /// Get current Unix timestamp in seconds
    fn unix_timestamp(&self) -> i64 {
        self.now().timestamp()
    }
}

/// System clock implementation using actual system time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Directive string understood by `tracing` filters
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock() {
        let clock = SystemClock;
        let now = clock.now();
        let timestamp = clock.unix_timestamp();

        assert!(timestamp > 0);
        assert!(timestamp - now.timestamp() <= 1);
    }

    #[test]
    fn test_log_level_ordering() {
        assert!(LogLevel::Trace < LogLevel::Debug);
        assert!(LogLevel::Warn < LogLevel::Error);
        assert_eq!(LogLevel::Info.as_str(), "info");
    }
}
