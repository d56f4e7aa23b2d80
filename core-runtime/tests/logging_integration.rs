//! Integration tests for logging system

use bridge_traits::time::LogLevel;
use core_runtime::logging::{
    init_logging, redact_if_sensitive, strip_path, LogFormat, LoggingConfig,
};

#[test]
fn test_init_logging_only_once() {
    // The global subscriber can be installed once per process, so this is
    // the only test in this binary that calls init_logging.
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Debug);

    assert!(init_logging(config.clone()).is_ok());
    tracing::debug!(file = %strip_path("/tmp/report.pdf"), "Logging initialized");

    let second = init_logging(config);
    assert!(second.is_err());
    assert!(second
        .unwrap_err()
        .to_string()
        .contains("Failed to initialize logging"));
}

#[test]
fn test_invalid_custom_filter_is_config_error() {
    // Filter parsing happens before the subscriber is installed.
    let config = LoggingConfig::default().with_filter("provider_google_drive=[[");
    let err = init_logging(config).unwrap_err();
    assert!(err.to_string().contains("Invalid log filter"));
}

#[test]
fn test_credentials_never_logged_verbatim() {
    assert_eq!(
        redact_if_sensitive("access_token", "ya29.a0AfH6SMB"),
        "[REDACTED]"
    );
    assert_eq!(
        redact_if_sensitive("refresh_token", "1//0gLm"),
        "[REDACTED]"
    );
    assert_eq!(redact_if_sensitive("client_secret", "GOCSPX-x"), "[REDACTED]");
    assert_eq!(redact_if_sensitive("code_verifier", "abc"), "[REDACTED]");
}

#[test]
fn test_emails_are_masked() {
    let redacted = redact_if_sensitive("owner", "ana@example.com");

    assert!(redacted.starts_with('a'));
    assert!(redacted.contains("[REDACTED]"));
    assert!(!redacted.contains("example.com"));
}

#[test]
fn test_email_masking_keeps_whole_first_character() {
    assert_eq!(
        redact_if_sensitive("owner", "élodie@example.com"),
        "é***@[REDACTED]"
    );
    assert_eq!(
        redact_if_sensitive("owner", "@example.com"),
        "***@[REDACTED]"
    );
}

#[test]
fn test_drive_identifiers_pass_through() {
    assert_eq!(
        redact_if_sensitive("file_id", "1BxiMVs0XRA5nFMdKvBdBZjgmUUqptlbs74OgvE2upms"),
        "1BxiMVs0XRA5nFMdKvBdBZjgmUUqptlbs74OgvE2upms"
    );
    assert_eq!(redact_if_sensitive("name", "q3.pdf"), "q3.pdf");
}

#[test]
fn test_path_stripping() {
    assert_eq!(strip_path("/home/ana/reports/q3.pdf"), "q3.pdf");
    assert_eq!(strip_path("C:\\Users\\Ana\\Documents\\q3.pdf"), "q3.pdf");
    assert_eq!(strip_path("q3.pdf"), "q3.pdf");
    assert_eq!(strip_path(""), "");
}
