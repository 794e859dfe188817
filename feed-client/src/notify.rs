use async_trait::async_trait;
use boardwatch_core::{BotConfig, ConfigError, CoreError};
use std::sync::Arc;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Best-effort delivery of operator-visible messages.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, text: &str) -> Result<(), CoreError>;
}

/// Writes notifications to the log only.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, text: &str) -> Result<(), CoreError> {
        info!(target: "notify", "{}", text);
        Ok(())
    }
}

/// The webhook notifier when `webhook_url` is set, the log notifier otherwise.
pub fn notifier_from_config(config: &BotConfig) -> Result<Arc<dyn Notifier>, CoreError> {
    match &config.webhook_url {
        Some(raw) => {
            let endpoint = Url::parse(raw).map_err(|_| ConfigError::InvalidValue {
                field: "webhook_url".to_string(),
                value: raw.clone(),
            })?;
            Ok(Arc::new(WebhookNotifier::new(endpoint)?))
        }
        None => Ok(Arc::new(LogNotifier)),
    }
}

#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    content: &'a str,
}

/// Posts `{"content": text}` to a webhook endpoint.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    http_client: Client,
    endpoint: Url,
}

impl WebhookNotifier {
    pub fn new(endpoint: Url) -> Result<Self, CoreError> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            http_client,
            endpoint,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, text: &str) -> Result<(), CoreError> {
        let response = self
            .http_client
            .post(self.endpoint.clone())
            .json(&WebhookPayload { content: text })
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            debug!("Notification delivered to {}", self.endpoint);
            Ok(())
        } else {
            warn!("Webhook {} answered {}", self.endpoint, status);
            Err(CoreError::NotificationRejected {
                endpoint: self.endpoint.to_string(),
                status: status.as_u16(),
            })
        }
    }
}
