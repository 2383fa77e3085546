use threadscope_core::{
    AnalysisError, ConfigError, CoreError, DatabaseError, ErrorExt, ErrorReporter, ExportError,
    RedditApiError,
};

#[test]
fn test_error_codes() {
    let reddit_error = CoreError::RedditApi(RedditApiError::RequestTimeout);
    assert_eq!(reddit_error.error_code(), "REDDIT_API");

    let db_error = CoreError::Database(DatabaseError::NotConnected);
    assert_eq!(db_error.error_code(), "DATABASE");

    let analysis_error = CoreError::Analysis(AnalysisError::TokenizationFailed { text_length: 9 });
    assert_eq!(analysis_error.error_code(), "ANALYSIS");

    let export_error = CoreError::Export(ExportError::UnsupportedFormat {
        format: "xml".to_string(),
    });
    assert_eq!(export_error.error_code(), "EXPORT");

    let config_error = CoreError::Config(ConfigError::InvalidValue {
        field: "reddit.page_size".to_string(),
        value: "0".to_string(),
    });
    assert_eq!(config_error.error_code(), "CONFIG");
}

#[test]
fn test_transient_errors() {
    let throttled = CoreError::RedditApi(RedditApiError::RateLimitExceeded { retry_after: 60 });
    assert!(throttled.is_transient());

    let server = CoreError::RedditApi(RedditApiError::ServerError { status_code: 503 });
    assert!(server.is_transient());

    let forbidden = CoreError::RedditApi(RedditApiError::Forbidden {
        resource: "/search.json".to_string(),
    });
    assert!(!forbidden.is_transient());

    let unsupported = CoreError::Export(ExportError::UnsupportedFormat {
        format: "xml".to_string(),
    });
    assert!(!unsupported.is_transient());
}

#[test]
fn test_user_friendly_messages() {
    let reddit_error = CoreError::RedditApi(RedditApiError::RateLimitExceeded { retry_after: 30 });
    let message = reddit_error.user_friendly_message();
    assert!(message.contains("30 seconds"));

    let export_error = CoreError::Export(ExportError::UnsupportedFormat {
        format: "xml".to_string(),
    });
    let message = export_error.user_friendly_message();
    assert!(message.contains("'xml'"));
    assert!(message.contains("json or csv"));
}

#[test]
fn test_display_messages() {
    let error = CoreError::Export(ExportError::UnsupportedFormat {
        format: "yaml".to_string(),
    });
    assert_eq!(
        error.to_string(),
        "Export error: Unsupported output format: yaml"
    );
}

#[test]
fn test_error_reporter() {
    let reporter = ErrorReporter::new()
        .with_error_reporting(true)
        .with_warning_reporting(true);
    let error = CoreError::RedditApi(RedditApiError::ServerError { status_code: 502 });

    // This test just ensures the methods don't panic
    reporter.report_error(&error);
    reporter.report_warning(&error);
}
