use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::RwLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Like,
    Reply,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActionMetricsSnapshot {
    pub total_actions: u64,
    pub successful_actions: u64,
    pub failed_actions: u64,
    pub last_action_time: Option<SystemTime>,
    pub by_kind: HashMap<ActionKind, KindMetrics>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KindMetrics {
    pub count: u64,
    pub success_count: u64,
    pub error_count: u64,
    pub total_latency: Duration,
    pub max_latency: Duration,
}

impl KindMetrics {
    fn new() -> Self {
        Self {
            count: 0,
            success_count: 0,
            error_count: 0,
            total_latency: Duration::from_millis(0),
            max_latency: Duration::from_millis(0),
        }
    }

    fn update(&mut self, success: bool, latency: Duration) {
        self.count += 1;
        self.total_latency += latency;
        if latency > self.max_latency {
            self.max_latency = latency;
        }
        if success {
            self.success_count += 1;
        } else {
            self.error_count += 1;
        }
    }

    pub fn average_latency(&self) -> Duration {
        if self.count == 0 {
            Duration::from_millis(0)
        } else {
            self.total_latency / self.count as u32
        }
    }

    pub fn success_rate(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.success_count as f64 / self.count as f64
        }
    }
}

/// Outcome counters for the automated actions (likes and replies).
#[derive(Debug, Clone, Default)]
pub struct ActionMetrics {
    inner: Arc<RwLock<ActionMetricsSnapshot>>,
}

impl ActionMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record(&self, kind: ActionKind, success: bool, latency: Duration) {
        let mut metrics = self.inner.write().await;

        metrics.total_actions += 1;
        metrics.last_action_time = Some(SystemTime::now());
        if success {
            metrics.successful_actions += 1;
        } else {
            metrics.failed_actions += 1;
        }

        metrics
            .by_kind
            .entry(kind)
            .or_insert_with(KindMetrics::new)
            .update(success, latency);
    }

    pub async fn snapshot(&self) -> ActionMetricsSnapshot {
        self.inner.read().await.clone()
    }

    pub async fn kind(&self, kind: ActionKind) -> Option<KindMetrics> {
        self.inner.read().await.by_kind.get(&kind).cloned()
    }

    pub async fn export(&self) -> Result<String, serde_json::Error> {
        let snapshot = self.snapshot().await;
        serde_json::to_string_pretty(&snapshot)
    }
}
