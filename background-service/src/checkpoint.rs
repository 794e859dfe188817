//! Window checkpoints and recovery.
//!
//! A checkpoint is a [`Summary`] written as JSON to
//! `<report_dir>/<YYYYMMDDHHmm>.json`. The field names are read by the
//! downstream analysis script and must not change.

use crate::aggregator::{Aggregator, AggregatorSnapshot};
use crate::context::BotContext;
use boardwatch_core::{
    Account, Board, BoardKind, CheckpointError, CoreError, ErrorExt, MonitorAccount,
};
use chrono::Local;
use feed_client::FeedApi;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::{error, info, warn};

/// Version stamped into every checkpoint.
pub const SCHEMA_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    #[serde(default)]
    pub version: String,
    pub start: i64,
    pub end: i64,
    pub board: BoardSummary,
    pub account: AccountSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardSummary {
    pub name: String,
    pub oid: u64,
    /// Board type code. Older checkpoints do not carry it.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<u32>,
    pub dynamic_id: u64,
    #[serde(rename = "bvID")]
    pub bv_id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub hot: Vec<i64>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub awl: Vec<i64>,
    #[serde(default)]
    pub people: HashMap<u64, i64>,
    pub count: i64,
    pub start_all_count: i64,
    pub start_count: i64,
    pub end_all_count: i64,
    pub end_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSummary {
    pub name: String,
    pub alias: String,
    pub uid: u64,
    pub start_followers: i64,
    pub end_followers: i64,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub fans_count: Vec<i64>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<i64>>::deserialize(deserializer)?.unwrap_or_default())
}

fn major(version: &str) -> Option<u64> {
    version.trim_start_matches('v').split('.').next()?.parse().ok()
}

impl Summary {
    /// Read and validate a checkpoint file.
    pub async fn load(path: &Path) -> Result<Self, CoreError> {
        let raw = match fs::read(path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(CheckpointError::NotFound {
                    path: path.display().to_string(),
                }
                .into())
            }
            Err(e) => return Err(e.into()),
        };
        Ok(Self::parse(&raw, &path.display().to_string())?)
    }

    /// Parse, version-check and migrate a checkpoint payload. `origin` only
    /// labels errors.
    pub fn parse(raw: &[u8], origin: &str) -> Result<Self, CheckpointError> {
        let mut summary: Summary =
            serde_json::from_slice(raw).map_err(|e| CheckpointError::Malformed {
                path: origin.to_string(),
                reason: e.to_string(),
            })?;

        if summary.start <= 0 || summary.start > summary.end {
            return Err(CheckpointError::Malformed {
                path: origin.to_string(),
                reason: format!(
                    "window start {} does not precede end {}",
                    summary.start, summary.end
                ),
            });
        }

        summary.check_version()?;
        summary.migrate();

        let people: i64 = summary.board.people.values().sum();
        if people != summary.board.count {
            warn!(
                path = origin,
                people,
                count = summary.board.count,
                "Checkpoint per-user counts do not add up to the comment count"
            );
        }

        Ok(summary)
    }

    /// Rejects checkpoints written by a newer major version.
    pub fn check_version(&self) -> Result<(), CheckpointError> {
        let running = major(SCHEMA_VERSION).unwrap_or(0);
        match major(&self.version) {
            Some(found) if found > running => Err(CheckpointError::UnsupportedVersion {
                found: self.version.clone(),
                running: SCHEMA_VERSION.to_string(),
            }),
            Some(_) => Ok(()),
            None => {
                warn!(version = %self.version, "Checkpoint version is not recognised");
                Ok(())
            }
        }
    }

    fn migrate(&mut self) {
        if self.account.fans_count.is_empty() {
            self.account.fans_count = vec![self.account.start_followers];
        }
    }

    fn from_window(
        snapshot: AggregatorSnapshot,
        end: i64,
        board: &Board,
        end_counts: (i64, i64),
        account: &Account,
        start_followers: i64,
        end_followers: i64,
    ) -> Self {
        Self {
            version: SCHEMA_VERSION.to_string(),
            start: snapshot.start_time,
            end,
            board: BoardSummary {
                name: board.name.clone(),
                oid: board.oid,
                kind: Some(board.kind.code()),
                dynamic_id: board.dynamic_id,
                bv_id: board.bv_id.clone(),
                hot: snapshot.hot_count,
                awl: snapshot.awl_count,
                people: snapshot.people_count,
                count: snapshot.today_comment,
                start_all_count: board.all_count,
                start_count: board.count,
                end_all_count: end_counts.0,
                end_count: end_counts.1,
            },
            account: AccountSummary {
                name: account.uname.clone(),
                alias: account.alias.clone(),
                uid: account.uid,
                start_followers,
                end_followers,
                fans_count: snapshot.fans_count,
            },
        }
    }
}

/// Writes checkpoints for one bot and owns its live board and account totals.
pub struct Checkpointer {
    ctx: BotContext,
    board: Board,
    monitor: MonitorAccount,
    aggregator: Arc<Aggregator>,
    report_dir: PathBuf,
    fallback: Box<dyn Write + Send + Sync>,
}

impl Checkpointer {
    pub fn new(
        ctx: BotContext,
        board: Board,
        monitor: MonitorAccount,
        aggregator: Arc<Aggregator>,
        report_dir: PathBuf,
    ) -> Self {
        Self {
            ctx,
            board,
            monitor,
            aggregator,
            report_dir,
            fallback: Box::new(io::stdout()),
        }
    }

    /// Where the payload goes when the report directory cannot be used.
    pub fn with_fallback(mut self, fallback: Box<dyn Write + Send + Sync>) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn monitor(&self) -> &MonitorAccount {
        &self.monitor
    }

    /// Write the current window and start a new one.
    ///
    /// Returns `Ok(None)` when the window is empty or the payload could only
    /// be written to the fallback stream; in both cases the window is kept.
    pub async fn summarize(&mut self) -> Result<Option<PathBuf>, CoreError> {
        let aggregator = Arc::clone(&self.aggregator);
        let mut window = aggregator.seal().await;

        if window.is_empty() {
            warn!(board = %self.board.name, "No statistics in this window, checkpoint skipped");
            return Ok(None);
        }

        let end_counts = match self.ctx.feed.board_counts(&self.board).await {
            Ok(counts) => counts,
            Err(e) => {
                e.log_warn();
                (self.board.all_count, self.board.count)
            }
        };

        let mut account = self.monitor.account.clone();
        if let Err(e) = self.ctx.feed.account_info(&mut account).await {
            e.log_warn();
        }

        let end_followers = match self.ctx.feed.account_stat(account.uid).await {
            Ok(count) => count,
            Err(e) => {
                e.log_warn();
                self.monitor.follower
            }
        };

        let now = Local::now();
        let end = now.timestamp();
        let summary = Summary::from_window(
            window.snapshot(),
            end,
            &self.board,
            end_counts,
            &account,
            self.monitor.follower,
            end_followers,
        );
        let payload = serde_json::to_vec(&summary)?;

        let path = self
            .report_dir
            .join(format!("{}.json", now.format("%Y%m%d%H%M")));
        if let Err(e) = self.write_report(&path, &payload).await {
            e.log_error();
            self.write_fallback(&payload);
            return Ok(None);
        }

        self.board.all_count = end_counts.0;
        self.board.count = end_counts.1;
        self.monitor.account.uname = account.uname;
        self.monitor.follower = end_followers;
        window.reset(end, Some(end_followers));

        info!(
            board = %self.board.name,
            comments = summary.board.count,
            "Checkpoint written to {}",
            path.display()
        );
        Ok(Some(path))
    }

    async fn write_report(&self, path: &Path, payload: &[u8]) -> Result<(), CoreError> {
        match fs::write(path, payload).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                fs::create_dir_all(&self.report_dir).await.map_err(|e| {
                    CheckpointError::DirectoryUnavailable {
                        path: format!("{}: {}", self.report_dir.display(), e),
                    }
                })?;
                fs::write(path, payload).await?;
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn write_fallback(&mut self, payload: &[u8]) {
        let result = self
            .fallback
            .write_all(payload)
            .and_then(|_| self.fallback.write_all(b"\n"))
            .and_then(|_| self.fallback.flush());
        if let Err(e) = result {
            error!("Failed to write checkpoint to fallback stream: {}", e);
        }
    }
}

/// State rebuilt from a checkpoint, ready to continue its window.
#[derive(Debug)]
pub struct RecoveredState {
    pub board: Board,
    pub monitor: MonitorAccount,
    pub aggregator: Aggregator,
}

pub async fn recover(mut summary: Summary, feed: &dyn FeedApi) -> RecoveredState {
    if summary.version != SCHEMA_VERSION {
        warn!(
            found = %summary.version,
            running = SCHEMA_VERSION,
            "Recovering from a checkpoint written by another version"
        );
    }
    summary.migrate();

    let mut board = Board {
        oid: summary.board.oid,
        kind: summary.board.kind.map(BoardKind::from).unwrap_or_default(),
        name: summary.board.name,
        dynamic_id: summary.board.dynamic_id,
        bv_id: summary.board.bv_id,
        all_count: summary.board.start_all_count,
        count: summary.board.start_count,
    };
    if let Err(e) = feed.board_detail(&mut board).await {
        e.log_warn();
    }

    let mut monitor = MonitorAccount {
        account: Account {
            uid: summary.account.uid,
            uname: summary.account.name,
            alias: summary.account.alias,
        },
        follower: summary.account.start_followers,
    };
    if let Err(e) = feed.account_info(&mut monitor.account).await {
        e.log_warn();
    }

    let aggregator = Aggregator::from_snapshot(AggregatorSnapshot {
        today_comment: summary.board.count,
        people_count: summary.board.people,
        hot_count: summary.board.hot,
        awl_count: summary.board.awl,
        fans_count: summary.account.fans_count,
        start_time: summary.start,
    });

    info!(board = %board.name, oid = board.oid, "Recovered from checkpoint");
    RecoveredState {
        board,
        monitor,
        aggregator,
    }
}
