use boardwatch_core::{BotConfig, CoreError};
use database::{CommentSink, Database};
use feed_client::{notifier_from_config, ActionMetrics, FeedApi, LogNotifier, Notifier};
use std::sync::Arc;

/// Collaborators shared by every loop of a bot.
#[derive(Clone)]
pub struct BotContext {
    pub feed: Arc<dyn FeedApi>,
    pub sink: Arc<dyn CommentSink>,
    pub notifier: Arc<dyn Notifier>,
    pub metrics: ActionMetrics,
}

impl BotContext {
    pub fn new(feed: Arc<dyn FeedApi>, sink: Arc<dyn CommentSink>) -> Self {
        Self {
            feed,
            sink,
            notifier: Arc::new(LogNotifier),
            metrics: ActionMetrics::new(),
        }
    }

    /// Opens the configured database and notifier around an embedder's feed.
    pub async fn from_config(
        config: &BotConfig,
        feed: Arc<dyn FeedApi>,
    ) -> Result<Self, CoreError> {
        let sink = Arc::new(Database::from_config(config).await?);
        let notifier = notifier_from_config(config)?;
        Ok(Self::new(feed, sink).with_notifier(notifier))
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }
}
