//! # Logging & Tracing Infrastructure
//!
//! Installs a `tracing-subscriber` for hosts embedding the identity
//! configuration crates.
//!
//! ## Overview
//!
//! The library crates only emit events through `tracing` macros. A host calls
//! [`init_logging`] once, before building a configuration holder, to choose an
//! output format and filter. [`LoggingConfig::from_env`] reads the same
//! choices from the environment:
//!
//! | Variable | Meaning |
//! |----------|---------|
//! | `RUST_LOG` | Full filter directive, overrides the level |
//! | `AUTH_LOG_LEVEL` | `trace`, `debug`, `info`, `warn` or `error` |
//! | `AUTH_LOG_FORMAT` | `pretty`, `json` or `compact` |
//!
//! ## Usage
//!
//! ```no_run
//! use bridge_traits::time::LogLevel;
//! use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
//!
//! let config = LoggingConfig::default()
//!     .with_format(LogFormat::Compact)
//!     .with_level(LogLevel::Debug);
//!
//! init_logging(config).expect("logging already initialized");
//! tracing::info!(client_id = "ABC", "Host started");
//! ```

use crate::error::{Error, Result};
use bridge_traits::time::LogLevel;
use std::collections::HashMap;
use std::io;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{
    filter::EnvFilter, layer::SubscriberExt, util::SubscriberInitExt, Layer, Registry,
};

const ENV_FILTER: &str = "RUST_LOG";
const ENV_LEVEL: &str = "AUTH_LOG_LEVEL";
const ENV_FORMAT: &str = "AUTH_LOG_FORMAT";

/// Crates whose events follow the configured level
const WORKSPACE_TARGETS: &[&str] = &[
    "identity_config_workspace",
    "core_runtime",
    "core_auth",
    "bridge_desktop",
];

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Multi-line, human-readable output
    Pretty,
    /// One JSON object per event
    Json,
    /// Single-line output
    Compact,
}

impl LogFormat {
    /// Parse a format name, ignoring case
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pretty" => Some(LogFormat::Pretty),
            "json" => Some(LogFormat::Json),
            "compact" => Some(LogFormat::Compact),
            _ => None,
        }
    }
}

impl Default for LogFormat {
    fn default() -> Self {
        if cfg!(debug_assertions) {
            LogFormat::Pretty
        } else {
            LogFormat::Json
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Output format
    pub format: LogFormat,
    /// Level applied to the workspace crates
    pub level: LogLevel,
    /// Full filter directive; replaces the level-derived default when set
    pub filter: Option<String>,
    /// Emit span enter/exit events (pretty format only)
    pub enable_spans: bool,
    /// Include the event target
    pub display_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            level: LogLevel::Info,
            filter: None,
            enable_spans: false,
            display_target: true,
        }
    }
}

impl LoggingConfig {
    /// Read the configuration from the process environment.
    ///
    /// Unset variables keep their defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(std::env::vars())
    }

    /// Read the configuration from an explicit set of variables.
    pub fn from_vars<I>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let vars: HashMap<String, String> = vars
            .into_iter()
            .filter(|(_, value)| !value.trim().is_empty())
            .collect();

        let mut config = Self::default();

        if let Some(raw) = vars.get(ENV_FORMAT) {
            config.format = LogFormat::parse(raw).ok_or_else(|| {
                Error::Config(format!("{} '{}' is not a log format", ENV_FORMAT, raw))
            })?;
        }

        if let Some(raw) = vars.get(ENV_LEVEL) {
            config.level = parse_level(raw).ok_or_else(|| {
                Error::Config(format!("{} '{}' is not a log level", ENV_LEVEL, raw))
            })?;
        }

        if let Some(filter) = vars.get(ENV_FILTER) {
            config.filter = Some(filter.clone());
        }

        Ok(config)
    }

    /// Set log format
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the workspace log level
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    /// Set a full filter directive
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Enable or disable span events
    pub fn with_spans(mut self, enable: bool) -> Self {
        self.enable_spans = enable;
        self
    }

    /// Enable or disable target display
    pub fn with_target(mut self, display: bool) -> Self {
        self.display_target = display;
        self
    }
}

/// Install the global subscriber.
///
/// # Errors
///
/// Returns [`Error::Config`] if the filter directive does not parse or a
/// global subscriber is already installed.
pub fn init_logging(config: LoggingConfig) -> Result<()> {
    let filter = build_filter(&config)?;

    tracing_subscriber::registry()
        .with(output_layer(&config))
        .with(filter)
        .try_init()
        .map_err(|e| Error::Config(format!("Failed to initialize logging: {}", e)))?;

    tracing::debug!(
        format = ?config.format,
        level = config.level.as_str(),
        "Logging initialized"
    );
    Ok(())
}

fn output_layer(config: &LoggingConfig) -> Box<dyn Layer<Registry> + Send + Sync> {
    let layer = tracing_subscriber::fmt::layer()
        .with_target(config.display_target)
        .with_writer(io::stdout);

    match config.format {
        LogFormat::Pretty => {
            let spans = if config.enable_spans {
                FmtSpan::ACTIVE
            } else {
                FmtSpan::NONE
            };
            layer.pretty().with_span_events(spans).boxed()
        }
        LogFormat::Json => layer
            .json()
            .flatten_event(true)
            .with_current_span(config.enable_spans)
            .with_span_list(false)
            .boxed(),
        LogFormat::Compact => layer.compact().boxed(),
    }
}

fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    let directives = match &config.filter {
        Some(custom) => custom.clone(),
        None => default_directives(config.level),
    };

    EnvFilter::try_new(&directives)
        .map_err(|e| Error::Config(format!("Invalid log filter '{}': {}", directives, e)))
}

/// Workspace crates at `level`, everything else (the keychain backend
/// included) at warn.
fn default_directives(level: LogLevel) -> String {
    let mut directives = vec!["warn".to_string()];
    directives.extend(
        WORKSPACE_TARGETS
            .iter()
            .map(|target| format!("{}={}", target, level.as_str())),
    );
    directives.join(",")
}

fn parse_level(s: &str) -> Option<LogLevel> {
    match s.trim().to_lowercase().as_str() {
        "trace" => Some(LogLevel::Trace),
        "debug" => Some(LogLevel::Debug),
        "info" => Some(LogLevel::Info),
        "warn" | "warning" => Some(LogLevel::Warn),
        "error" => Some(LogLevel::Error),
        _ => None,
    }
}

/// Redact a value before logging it when its field name marks it as a
/// credential.
///
/// Values that look like an email address keep only their first character.
///
/// ```
/// use core_runtime::logging::redact_if_sensitive;
///
/// assert_eq!(redact_if_sensitive("access_token", "eyJ0eXAi"), "[REDACTED]");
/// assert_eq!(redact_if_sensitive("client_id", "ABC"), "ABC");
/// ```
pub fn redact_if_sensitive(field_name: &str, value: &str) -> String {
    const CREDENTIAL_FIELDS: &[&str] = &[
        "token",
        "secret",
        "password",
        "authorization",
        "bearer",
        "assertion",
        "code_verifier",
    ];

    let field = field_name.to_lowercase();
    if CREDENTIAL_FIELDS.iter().any(|marker| field.contains(marker)) {
        return "[REDACTED]".to_string();
    }

    match value.split_once('@') {
        Some((local, domain)) if domain.contains('.') => {
            let first: String = local.chars().take(1).collect();
            format!("{}***@[REDACTED]", first)
        }
        _ => value.to_string(),
    }
}
