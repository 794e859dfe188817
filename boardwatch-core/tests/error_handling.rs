use boardwatch_core::{
    CheckpointError, ConfigError, CoreError, ErrorExt, FeedApiError, StorageError,
};

#[test]
fn test_error_codes() {
    let feed_error = CoreError::FeedApi(FeedApiError::NotLoggedIn);
    assert_eq!(feed_error.error_code(), "FEED_API");

    let db_error = CoreError::Storage(StorageError::DatabaseLocked);
    assert_eq!(db_error.error_code(), "STORAGE");

    let checkpoint_error = CoreError::Checkpoint(CheckpointError::NotFound {
        path: "report/202401010000.json".to_string(),
    });
    assert_eq!(checkpoint_error.error_code(), "CHECKPOINT");

    let config_error = CoreError::Config(ConfigError::MissingField {
        field: "board.oid".to_string(),
    });
    assert_eq!(config_error.error_code(), "CONFIG");

    let webhook_error = CoreError::NotificationRejected {
        endpoint: "https://hooks.example.com/boardwatch".to_string(),
        status: 502,
    };
    assert_eq!(webhook_error.error_code(), "NOTIFY_REJECTED");
}

#[test]
fn test_user_friendly_messages() {
    let feed_error = CoreError::FeedApi(FeedApiError::NotLoggedIn);
    let message = feed_error.user_friendly_message();
    assert!(message.contains("session is missing or expired"));

    let config_error = CoreError::Config(ConfigError::MissingField {
        field: "board.oid".to_string(),
    });
    let message = config_error.user_friendly_message();
    assert!(message.contains("board.oid"));

    let version_error = CoreError::Checkpoint(CheckpointError::UnsupportedVersion {
        found: "9.0.0".to_string(),
        running: "0.3.0".to_string(),
    });
    assert!(version_error.user_friendly_message().contains("9.0.0"));

    let webhook_error = CoreError::NotificationRejected {
        endpoint: "https://hooks.example.com/boardwatch".to_string(),
        status: 404,
    };
    let message = webhook_error.user_friendly_message();
    assert!(message.contains("hooks.example.com"));
    assert!(message.contains("404"));
}
