use async_trait::async_trait;
use boardwatch_core::{BotConfig, Comment, CoreError, StorageError};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::str::FromStr;
use tracing::{debug, info};

#[cfg(test)]
mod tests;

/// Durable record of every polled comment and follower sample.
///
/// Both calls are fire-and-forget from the bot's point of view: failures are
/// logged by the caller and never stop a loop.
#[async_trait]
pub trait CommentSink: Send + Sync {
    async fn insert_comment(&self, comment: &Comment, observed_at: i64) -> Result<(), CoreError>;

    async fn insert_follower_sample(
        &self,
        uid: u64,
        timestamp: i64,
        count: i64,
    ) -> Result<(), CoreError>;
}

const MIGRATIONS: &[(&str, &str)] = &[
    (
        "create_comments",
        r#"
        CREATE TABLE IF NOT EXISTS comments (
            reply_id    INTEGER PRIMARY KEY,
            oid         INTEGER NOT NULL,
            uid         INTEGER NOT NULL,
            uname       TEXT    NOT NULL,
            msg         TEXT    NOT NULL,
            ctime       INTEGER NOT NULL,
            observed_at INTEGER NOT NULL
        )
        "#,
    ),
    (
        "create_comments_oid_index",
        "CREATE INDEX IF NOT EXISTS idx_comments_oid_ctime ON comments (oid, ctime)",
    ),
    (
        "create_followers",
        r#"
        CREATE TABLE IF NOT EXISTS followers (
            uid       INTEGER NOT NULL,
            timestamp INTEGER NOT NULL,
            count     INTEGER NOT NULL,
            PRIMARY KEY (uid, timestamp)
        )
        "#,
    ),
];

pub struct Database {
    connection_string: String,
    pool: Option<SqlitePool>,
}

impl Database {
    pub fn new(connection_string: String) -> Self {
        Self {
            connection_string,
            pool: None,
        }
    }

    /// Connected and migrated database at `config.database_url`.
    pub async fn from_config(config: &BotConfig) -> Result<Self, CoreError> {
        let mut db = Self::new(config.database_url.clone());
        db.connect().await?;
        db.run_migrations().await?;
        Ok(db)
    }

    pub async fn connect(&mut self) -> Result<(), CoreError> {
        let options = SqliteConnectOptions::from_str(&self.connection_string)
            .map_err(|e| StorageError::ConnectionFailed {
                reason: e.to_string(),
            })?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(|e| StorageError::ConnectionFailed {
                reason: e.to_string(),
            })?;

        info!("Connected to {}", self.connection_string);
        self.pool = Some(pool);
        Ok(())
    }

    pub async fn run_migrations(&self) -> Result<(), CoreError> {
        let pool = self.pool()?;
        for (name, sql) in MIGRATIONS {
            sqlx::query(sql)
                .execute(pool)
                .await
                .map_err(|_| StorageError::MigrationFailed {
                    migration: name.to_string(),
                })?;
            debug!("Applied migration {}", name);
        }
        Ok(())
    }

    pub async fn comment_count(&self, oid: u64) -> Result<i64, CoreError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM comments WHERE oid = ?")
            .bind(oid as i64)
            .fetch_one(self.pool()?)
            .await
            .map_err(StorageError::from)?;
        Ok(row.get::<i64, _>("n"))
    }

    /// Follower samples of `uid` as `(timestamp, count)`, oldest first.
    pub async fn follower_samples(&self, uid: u64) -> Result<Vec<(i64, i64)>, CoreError> {
        let rows = sqlx::query(
            "SELECT timestamp, count FROM followers WHERE uid = ? ORDER BY timestamp ASC",
        )
        .bind(uid as i64)
        .fetch_all(self.pool()?)
        .await
        .map_err(StorageError::from)?;

        Ok(rows
            .iter()
            .map(|row| (row.get::<i64, _>("timestamp"), row.get::<i64, _>("count")))
            .collect())
    }

    fn pool(&self) -> Result<&SqlitePool, CoreError> {
        self.pool.as_ref().ok_or_else(|| {
            CoreError::Storage(StorageError::ConnectionFailed {
                reason: "database not connected".to_string(),
            })
        })
    }
}

#[async_trait]
impl CommentSink for Database {
    async fn insert_comment(&self, comment: &Comment, observed_at: i64) -> Result<(), CoreError> {
        sqlx::query(
            r#"
            INSERT OR IGNORE INTO comments (reply_id, oid, uid, uname, msg, ctime, observed_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(comment.reply_id as i64)
        .bind(comment.oid as i64)
        .bind(comment.uid as i64)
        .bind(&comment.uname)
        .bind(&comment.msg)
        .bind(comment.ctime)
        .bind(observed_at)
        .execute(self.pool()?)
        .await
        .map_err(StorageError::from)?;
        Ok(())
    }

    async fn insert_follower_sample(
        &self,
        uid: u64,
        timestamp: i64,
        count: i64,
    ) -> Result<(), CoreError> {
        sqlx::query("INSERT OR REPLACE INTO followers (uid, timestamp, count) VALUES (?, ?, ?)")
            .bind(uid as i64)
            .bind(timestamp)
            .bind(count)
            .execute(self.pool()?)
            .await
            .map_err(StorageError::from)?;
        Ok(())
    }
}
