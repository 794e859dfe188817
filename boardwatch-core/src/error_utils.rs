use crate::error::*;
use tracing::{error, warn};

pub trait ErrorExt {
    fn log_error(&self) -> &Self;
    fn log_warn(&self) -> &Self;
    fn user_friendly_message(&self) -> String;
    fn error_code(&self) -> String;
}

impl ErrorExt for CoreError {
    fn log_error(&self) -> &Self {
        error!(code = %self.error_code(), "CoreError: {}", self);
        match self {
            CoreError::FeedApi(e) => {
                error!("Feed API error details: {:?}", e);
            }
            CoreError::Storage(e) => {
                error!("Storage error details: {:?}", e);
            }
            CoreError::Checkpoint(e) => {
                error!("Checkpoint error details: {:?}", e);
            }
            _ => {}
        }
        self
    }

    fn log_warn(&self) -> &Self {
        warn!(code = %self.error_code(), "CoreError (warning): {}", self);
        self
    }

    fn user_friendly_message(&self) -> String {
        match self {
            CoreError::FeedApi(e) => e.user_friendly_message(),
            CoreError::Storage(e) => e.user_friendly_message(),
            CoreError::Config(e) => e.user_friendly_message(),
            CoreError::Checkpoint(e) => e.user_friendly_message(),
            CoreError::Network(_) => {
                "Could not reach the comment platform. Check the network connection.".to_string()
            }
            CoreError::InvalidInput { message } => format!("Invalid input: {}", message),
            CoreError::Timeout { .. } => {
                "The platform did not answer in time; the next cycle will try again.".to_string()
            }
            CoreError::RateLimited { message, .. } => {
                format!("Throttled by the platform ({}). Slow down polling or liking.", message)
            }
            CoreError::NotificationRejected { endpoint, status } => format!(
                "The webhook at {} refused the notification (HTTP {}).",
                endpoint, status
            ),
            _ => "Unexpected internal failure. See the log for details.".to_string(),
        }
    }

    fn error_code(&self) -> String {
        match self {
            CoreError::FeedApi(_) => "FEED_API".to_string(),
            CoreError::Storage(_) => "STORAGE".to_string(),
            CoreError::Config(_) => "CONFIG".to_string(),
            CoreError::Checkpoint(_) => "CHECKPOINT".to_string(),
            CoreError::Io(_) => "IO".to_string(),
            CoreError::Serialization(_) => "SERIALIZATION".to_string(),
            CoreError::Network(_) => "NETWORK".to_string(),
            CoreError::InvalidInput { .. } => "INVALID_INPUT".to_string(),
            CoreError::Timeout { .. } => "TIMEOUT".to_string(),
            CoreError::Internal { .. } => "INTERNAL".to_string(),
            CoreError::RateLimited { .. } => "RATE_LIMITED".to_string(),
            CoreError::NotificationRejected { .. } => "NOTIFY_REJECTED".to_string(),
        }
    }
}

impl ErrorExt for FeedApiError {
    fn log_error(&self) -> &Self {
        error!("FeedApiError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("FeedApiError (warning): {}", self);
        self
    }

    fn user_friendly_message(&self) -> String {
        match self {
            FeedApiError::NotLoggedIn => {
                "The platform session is missing or expired. Please log in again.".to_string()
            }
            FeedApiError::RateLimitExceeded { retry_after } => format!(
                "The platform is throttling requests; retry in {} seconds.",
                retry_after
            ),
            FeedApiError::BoardNotFound { oid, .. } => {
                format!("Comment board {} not found or closed.", oid)
            }
            FeedApiError::AccountNotFound { uid } => format!("Account {} not found.", uid),
            FeedApiError::RequestTimeout => {
                "Request to the platform timed out. Please try again.".to_string()
            }
            _ => "Platform API error occurred. Please try again later.".to_string(),
        }
    }

    fn error_code(&self) -> String {
        match self {
            FeedApiError::NotLoggedIn => "FEED_NOT_LOGGED_IN".to_string(),
            FeedApiError::RateLimitExceeded { .. } => "FEED_RATE_LIMIT".to_string(),
            FeedApiError::BoardNotFound { .. } => "FEED_BOARD_NOT_FOUND".to_string(),
            FeedApiError::AccountNotFound { .. } => "FEED_ACCOUNT_NOT_FOUND".to_string(),
            FeedApiError::CommentNotFound { .. } => "FEED_COMMENT_NOT_FOUND".to_string(),
            FeedApiError::RequestTimeout => "FEED_TIMEOUT".to_string(),
            FeedApiError::InvalidResponse { .. } => "FEED_INVALID_RESPONSE".to_string(),
            FeedApiError::Rejected { .. } => "FEED_REJECTED".to_string(),
            FeedApiError::ServerError { .. } => "FEED_SERVER_ERROR".to_string(),
        }
    }
}

impl ErrorExt for StorageError {
    fn log_error(&self) -> &Self {
        error!("StorageError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("StorageError (warning): {}", self);
        self
    }

    fn user_friendly_message(&self) -> String {
        match self {
            StorageError::ConnectionFailed { .. } => {
                "Cannot open the comment database.".to_string()
            }
            StorageError::DatabaseLocked => {
                "The comment database is busy; the write will be skipped.".to_string()
            }
            _ => "Failed to store comment data.".to_string(),
        }
    }

    fn error_code(&self) -> String {
        match self {
            StorageError::ConnectionFailed { .. } => "DB_CONNECTION_FAILED".to_string(),
            StorageError::MigrationFailed { .. } => "DB_MIGRATION_FAILED".to_string(),
            StorageError::QueryFailed { .. } => "DB_QUERY_FAILED".to_string(),
            StorageError::DatabaseLocked => "DB_LOCKED".to_string(),
            StorageError::Sql(_) => "DB_SQL_ERROR".to_string(),
        }
    }
}

impl ErrorExt for ConfigError {
    fn log_error(&self) -> &Self {
        error!("ConfigError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("ConfigError (warning): {}", self);
        self
    }

    fn user_friendly_message(&self) -> String {
        match self {
            ConfigError::FileNotFound { path } => {
                format!("Configuration file '{}' not found.", path)
            }
            ConfigError::MissingField { field } => {
                format!("Set '{}' in the bot configuration.", field)
            }
            ConfigError::InvalidValue { field, .. } => {
                format!("'{}' has an unusable value.", field)
            }
            ConfigError::Parse(_) => {
                "The bot configuration is not valid TOML.".to_string()
            }
        }
    }

    fn error_code(&self) -> String {
        match self {
            ConfigError::FileNotFound { .. } => "CONFIG_FILE_NOT_FOUND".to_string(),
            ConfigError::MissingField { .. } => "CONFIG_MISSING_FIELD".to_string(),
            ConfigError::InvalidValue { .. } => "CONFIG_INVALID_VALUE".to_string(),
            ConfigError::Parse(_) => "CONFIG_PARSE_ERROR".to_string(),
        }
    }
}

impl ErrorExt for CheckpointError {
    fn log_error(&self) -> &Self {
        error!("CheckpointError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("CheckpointError (warning): {}", self);
        self
    }

    fn user_friendly_message(&self) -> String {
        match self {
            CheckpointError::NotFound { path } => format!("Checkpoint '{}' does not exist.", path),
            CheckpointError::Malformed { path, .. } => {
                format!("Checkpoint '{}' is damaged and cannot be read.", path)
            }
            CheckpointError::UnsupportedVersion { found, .. } => format!(
                "Checkpoint was written by a newer version ({}). Please upgrade.",
                found
            ),
            CheckpointError::DirectoryUnavailable { path } => {
                format!("Cannot write reports to '{}'.", path)
            }
        }
    }

    fn error_code(&self) -> String {
        match self {
            CheckpointError::NotFound { .. } => "CHECKPOINT_NOT_FOUND".to_string(),
            CheckpointError::Malformed { .. } => "CHECKPOINT_MALFORMED".to_string(),
            CheckpointError::UnsupportedVersion { .. } => "CHECKPOINT_UNSUPPORTED".to_string(),
            CheckpointError::DirectoryUnavailable { .. } => "CHECKPOINT_DIR".to_string(),
        }
    }
}
