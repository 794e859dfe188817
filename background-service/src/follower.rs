use crate::aggregator::Aggregator;
use crate::context::BotContext;
use boardwatch_core::ErrorExt;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Samples the monitored account's follower count on a fixed period.
pub struct FollowerSampler {
    ctx: BotContext,
    uid: u64,
    aggregator: Arc<Aggregator>,
    period: Duration,
}

impl FollowerSampler {
    pub fn new(ctx: BotContext, uid: u64, aggregator: Arc<Aggregator>, period: Duration) -> Self {
        Self {
            ctx,
            uid,
            aggregator,
            period,
        }
    }

    pub async fn run(self, cancel: CancellationToken) {
        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    self.sample_once(Utc::now().timestamp()).await;
                }
            }
        }

        info!(uid = self.uid, "Stopped follower sampling");
    }

    /// Failed queries are logged and skipped; nothing is appended for them.
    pub async fn sample_once(&self, now: i64) -> Option<i64> {
        let count = match self.ctx.feed.account_stat(self.uid).await {
            Ok(count) => count,
            Err(e) => {
                e.log_error();
                return None;
            }
        };

        if let Err(e) = self
            .ctx
            .sink
            .insert_follower_sample(self.uid, now, count)
            .await
        {
            e.log_warn();
        }
        self.aggregator.append_follower_sample(count).await;

        debug!(uid = self.uid, follower = count, "Follower sample");
        Some(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{RecordingSink, ScriptedFeed};

    const NOW: i64 = 1_700_000_000;

    fn sampler() -> (FollowerSampler, Arc<ScriptedFeed>, Arc<RecordingSink>, Arc<Aggregator>) {
        let feed = Arc::new(ScriptedFeed::new());
        let sink = Arc::new(RecordingSink::default());
        let aggregator = Arc::new(Aggregator::new(NOW, 1000));
        let sampler = FollowerSampler::new(
            BotContext::new(feed.clone(), sink.clone()),
            42,
            aggregator.clone(),
            Duration::from_secs(600),
        );
        (sampler, feed, sink, aggregator)
    }

    #[tokio::test]
    async fn test_failed_sample_is_skipped() {
        let (sampler, feed, sink, aggregator) = sampler();
        feed.push_follower(Some(1005));
        feed.push_follower(None);
        feed.push_follower(Some(1010));

        assert_eq!(sampler.sample_once(NOW + 600).await, Some(1005));
        assert_eq!(sampler.sample_once(NOW + 1200).await, None);
        assert_eq!(sampler.sample_once(NOW + 1800).await, Some(1010));

        assert_eq!(
            aggregator.snapshot().await.fans_count,
            vec![1000, 1005, 1010]
        );
        assert_eq!(
            sink.followers(),
            vec![(42, NOW + 600, 1005), (42, NOW + 1800, 1010)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_samples_each_period() {
        let (sampler, feed, _sink, aggregator) = sampler();
        feed.push_follower(Some(1001));
        feed.push_follower(Some(1002));
        let cancel = CancellationToken::new();

        let handle = tokio::spawn(sampler.run(cancel.clone()));
        tokio::time::sleep(Duration::from_secs(1300)).await;
        cancel.cancel();
        handle.await.unwrap();

        assert_eq!(
            aggregator.snapshot().await.fans_count,
            vec![1000, 1001, 1002]
        );
    }
}
