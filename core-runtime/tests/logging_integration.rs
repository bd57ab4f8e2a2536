//! Integration tests for logging system

use bridge_traits::time::LogLevel;
use core_runtime::logging::{init_logging, redact_if_sensitive, LogFormat, LoggingConfig};

#[test]
fn test_logging_initialization_once() {
    // The global subscriber can only be installed once per process
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Debug);

    assert!(init_logging(config.clone()).is_ok());
    assert!(init_logging(config).is_err());
}

#[test]
fn test_credential_fields_redacted() {
    assert_eq!(redact_if_sensitive("access_token", "T1"), "[REDACTED]");
    assert_eq!(redact_if_sensitive("Authorization", "Bearer T1"), "[REDACTED]");
    assert_eq!(redact_if_sensitive("client_secret", "s3cr3t"), "[REDACTED]");
}

#[test]
fn test_identifiers_pass_through() {
    // Tenant and client identifiers are not secrets
    assert_eq!(
        redact_if_sensitive("tenant", "74831e7e-045b-4115-b3ec-8cbe36b54b59"),
        "74831e7e-045b-4115-b3ec-8cbe36b54b59"
    );
    assert_eq!(redact_if_sensitive("client_id", "ABC"), "ABC");
}

#[test]
fn test_email_redaction() {
    let redacted = redact_if_sensitive("upn", "user@example.com");

    assert!(redacted.starts_with('u'));
    assert!(redacted.contains("[REDACTED]"));
    assert!(!redacted.contains("example.com"));
}

#[test]
fn test_default_format_follows_build_profile() {
    let config = LoggingConfig::default();

    if cfg!(debug_assertions) {
        assert_eq!(config.format, LogFormat::Pretty);
    } else {
        assert_eq!(config.format, LogFormat::Json);
    }
}

#[test]
fn test_config_chaining() {
    let config = LoggingConfig::default()
        .with_format(LogFormat::Json)
        .with_level(LogLevel::Warn)
        .with_filter("core_auth=trace")
        .with_spans(true)
        .with_target(false);

    assert_eq!(config.format, LogFormat::Json);
    assert_eq!(config.level, LogLevel::Warn);
    assert_eq!(config.filter.as_deref(), Some("core_auth=trace"));
    assert!(config.enable_spans);
    assert!(!config.display_target);
}

#[test]
fn test_format_names_parse() {
    assert_eq!(LogFormat::parse("Pretty"), Some(LogFormat::Pretty));
    assert_eq!(LogFormat::parse(" compact "), Some(LogFormat::Compact));
    assert_eq!(LogFormat::parse("xml"), None);
}
