use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Feed API error: {0}")]
    FeedApi(#[from] FeedApiError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Operation timeout after {seconds} seconds")]
    Timeout { seconds: u64 },

    #[error("Internal error: {message}")]
    Internal { message: String },

    #[error("Rate limited: {message}")]
    RateLimited {
        message: String,
        retry_after: Option<std::time::Duration>,
    },

    #[error("Notification rejected by {endpoint}: HTTP {status}")]
    NotificationRejected { endpoint: String, status: u16 },
}

#[derive(Error, Debug, Clone)]
pub enum FeedApiError {
    #[error("Not logged in or session expired")]
    NotLoggedIn,

    #[error("Rate limit exceeded. Retry after {retry_after} seconds")]
    RateLimitExceeded { retry_after: u64 },

    #[error("Board not found: oid={oid}, type={type_code}")]
    BoardNotFound { oid: u64, type_code: u32 },

    #[error("Account not found: {uid}")]
    AccountNotFound { uid: u64 },

    #[error("Comment not found: {reply_id}")]
    CommentNotFound { reply_id: u64 },

    #[error("Request timeout")]
    RequestTimeout,

    #[error("Invalid API response: {details}")]
    InvalidResponse { details: String },

    #[error("Platform rejected request: code {code}, {message}")]
    Rejected { code: i64, message: String },

    #[error("Server error: {status_code}")]
    ServerError { status_code: u16 },
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Connection failed: {reason}")]
    ConnectionFailed { reason: String },

    #[error("Migration failed: {migration}")]
    MigrationFailed { migration: String },

    #[error("Query execution failed: {query}")]
    QueryFailed { query: String },

    #[error("Database locked")]
    DatabaseLocked,

    #[error("SQL error: {0}")]
    Sql(#[from] sqlx::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    #[error("Configuration parsing error: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Error, Debug)]
pub enum CheckpointError {
    #[error("Checkpoint file not found: {path}")]
    NotFound { path: String },

    #[error("Malformed checkpoint {path}: {reason}")]
    Malformed { path: String, reason: String },

    #[error("Unsupported checkpoint version {found}, running {running}")]
    UnsupportedVersion { found: String, running: String },

    #[error("Report directory unavailable: {path}")]
    DirectoryUnavailable { path: String },
}
