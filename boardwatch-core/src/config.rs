//! Bot configuration, loaded from a TOML file.
//!
//! Every field except the board and account identity has a default, so a
//! minimal file only needs the `[board]` and `[account]` tables.

use crate::error::ConfigError;
use crate::types::{Board, BoardKind, MonitorAccount};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardConfig {
    pub oid: u64,
    #[serde(default)]
    pub kind: BoardKind,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub dynamic_id: u64,
    #[serde(default)]
    pub bv_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountConfig {
    pub uid: u64,
    #[serde(default)]
    pub alias: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_analysis_program")]
    pub program: String,
    #[serde(default = "default_analysis_script")]
    pub script: PathBuf,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            program: default_analysis_program(),
            script: default_analysis_script(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// Seconds between two feed fetches.
    #[serde(default = "default_fresh_cd")]
    pub fresh_cd: u64,
    /// Cooldown after each like, fractional seconds.
    #[serde(default = "default_like_cd")]
    pub like_cd: f32,
    /// Like every new comment.
    #[serde(default)]
    pub like: bool,
    /// Ask the analysis program to publish its report.
    #[serde(default)]
    pub post: bool,
    /// Comments containing this phrase get an automated latency reply.
    #[serde(default = "default_trigger")]
    pub trigger: String,
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// Minimum seconds between two latency replies.
    #[serde(default = "default_report_interval")]
    pub report_interval_secs: u64,
    #[serde(default = "default_fan_interval")]
    pub fan_interval_secs: u64,
    #[serde(default = "default_summary_interval")]
    pub summary_interval_secs: u64,
    #[serde(default = "default_report_dir")]
    pub report_dir: PathBuf,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default)]
    pub webhook_url: Option<String>,
    pub board: BoardConfig,
    pub account: AccountConfig,
}

fn default_fresh_cd() -> u64 {
    5
}

fn default_like_cd() -> f32 {
    1.5
}

fn default_trigger() -> String {
    "test".to_string()
}

fn default_queue_capacity() -> usize {
    32
}

fn default_report_interval() -> u64 {
    180
}

fn default_fan_interval() -> u64 {
    600
}

fn default_summary_interval() -> u64 {
    24 * 60 * 60
}

fn default_report_dir() -> PathBuf {
    PathBuf::from("report")
}

fn default_database_url() -> String {
    "sqlite://boardwatch.db".to_string()
}

fn default_analysis_program() -> String {
    "python".to_string()
}

fn default_analysis_script() -> PathBuf {
    PathBuf::from("./analyse/main.py")
}

impl BotConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: BotConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fresh_cd == 0 {
            return Err(invalid("fresh_cd", self.fresh_cd));
        }
        if !(self.like_cd.is_finite() && self.like_cd > 0.0) {
            return Err(invalid("like_cd", self.like_cd));
        }
        if self.queue_capacity == 0 {
            return Err(invalid("queue_capacity", self.queue_capacity));
        }
        if self.fan_interval_secs == 0 {
            return Err(invalid("fan_interval_secs", self.fan_interval_secs));
        }
        if self.summary_interval_secs == 0 {
            return Err(invalid("summary_interval_secs", self.summary_interval_secs));
        }
        if self.board.oid == 0 {
            return Err(ConfigError::MissingField {
                field: "board.oid".to_string(),
            });
        }
        if self.account.uid == 0 {
            return Err(ConfigError::MissingField {
                field: "account.uid".to_string(),
            });
        }
        if let Some(raw) = &self.webhook_url {
            let url = Url::parse(raw).map_err(|_| invalid("webhook_url", raw))?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(invalid("webhook_url", raw));
            }
        }
        Ok(())
    }

    pub fn fresh_interval(&self) -> Duration {
        Duration::from_secs(self.fresh_cd)
    }

    pub fn like_cooldown(&self) -> Duration {
        Duration::from_secs_f32(self.like_cd)
    }

    pub fn fan_interval(&self) -> Duration {
        Duration::from_secs(self.fan_interval_secs)
    }

    pub fn summary_interval(&self) -> Duration {
        Duration::from_secs(self.summary_interval_secs)
    }

    pub fn board(&self) -> Board {
        Board {
            oid: self.board.oid,
            kind: self.board.kind,
            name: self.board.name.clone(),
            dynamic_id: self.board.dynamic_id,
            bv_id: self.board.bv_id.clone(),
            all_count: 0,
            count: 0,
        }
    }

    pub fn monitor(&self) -> MonitorAccount {
        MonitorAccount::new(self.account.uid, self.account.alias.clone())
    }
}

fn invalid(field: &str, value: impl ToString) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
    }
}
