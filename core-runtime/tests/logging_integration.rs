//! Integration tests for logging system

use core_runtime::logging::{
    init_logging, redact_if_sensitive, strip_path, LogFormat, LogLevel, LoggingConfig,
};

#[test]
fn test_init_logging_only_once() {
    // A global subscriber can only be installed once per process
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Warn);

    assert!(init_logging(config.clone()).is_ok());
    assert!(init_logging(config).is_err());

    tracing::warn!(target: "core_auth", "logged after init");
}

#[test]
fn test_pii_redaction_oauth_values() {
    assert_eq!(redact_if_sensitive("access_token", "eyJhbGciOi"), "[REDACTED]");
    assert_eq!(redact_if_sensitive("client_secret", "s3cr3t"), "[REDACTED]");
    assert_eq!(redact_if_sensitive("code", "c0de"), "[REDACTED]");
    assert_eq!(redact_if_sensitive("state", "nonce"), "[REDACTED]");
}

#[test]
fn test_pii_redaction_emails() {
    let redacted = redact_if_sensitive("email", "translator@example.com");

    assert!(redacted.starts_with('t'));
    assert!(redacted.contains("[REDACTED]"));
    assert!(!redacted.contains("example.com"));
}

#[test]
fn test_pii_redaction_normal_values() {
    assert_eq!(redact_if_sensitive("project_id", "42"), "42");
    assert_eq!(redact_if_sensitive("language", "fr"), "fr");
}

#[test]
fn test_path_stripping() {
    assert_eq!(strip_path("/home/user/po/app-fr.po"), "app-fr.po");
    assert_eq!(strip_path("D:\\work\\po\\app-de.po"), "app-de.po");
    assert_eq!(strip_path("app.pot"), "app.pot");
    assert_eq!(strip_path(""), "");
}

#[test]
fn test_config_chaining() {
    let config = LoggingConfig::default()
        .with_format(LogFormat::Json)
        .with_level(LogLevel::Trace)
        .with_spans(false)
        .with_target(false)
        .with_thread_info(true);

    assert_eq!(config.format, LogFormat::Json);
    assert_eq!(config.level, LogLevel::Trace);
    assert!(!config.enable_spans);
    assert!(!config.display_target);
    assert!(config.display_thread_info);
}
