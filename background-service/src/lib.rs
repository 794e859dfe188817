//! The monitoring bot: poll loop, like worker, statistics window,
//! follower sampling and checkpoints.

pub mod action_queue;
pub mod aggregator;
pub mod analysis;
pub mod bot;
pub mod checkpoint;
pub mod context;
pub mod follower;
pub mod poller;
pub mod reporter;

#[cfg(test)]
mod testing;
#[cfg(test)]
mod tests;

pub use action_queue::{ActionQueue, LikeWorker, DEFAULT_QUEUE_CAPACITY};
pub use aggregator::{Aggregator, AggregatorSnapshot, COUNT_CAP, MAX_BUCKETS};
pub use analysis::{AnalysisError, AnalysisLauncher, AnalysisOutcome};
pub use bot::{Bot, RunningBot};
pub use checkpoint::{recover, Checkpointer, RecoveredState, Summary, SCHEMA_VERSION};
pub use context::BotContext;
pub use follower::FollowerSampler;
pub use poller::Poller;
pub use reporter::{format_delay, Reporter, DEFAULT_REPORT_INTERVAL};
