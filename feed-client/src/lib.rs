//! Contracts for the platform the bot talks to, plus the small pieces of
//! client-side plumbing that do not depend on a specific platform.

pub mod api;
pub mod metrics;
pub mod notify;

pub use api::FeedApi;
pub use metrics::{ActionKind, ActionMetrics, ActionMetricsSnapshot};
pub use notify::{notifier_from_config, LogNotifier, Notifier, WebhookNotifier};
