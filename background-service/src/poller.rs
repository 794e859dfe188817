use crate::action_queue::ActionQueue;
use crate::aggregator::Aggregator;
use crate::context::BotContext;
use crate::reporter::Reporter;
use boardwatch_core::{Board, Comment, ErrorExt, MonitorAccount};
use chrono::{Local, TimeZone, Utc};
use feed_client::ActionKind;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::error::TrySendError;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Periodically fetches the board and dispatches comments it has not seen in
/// the previous cycle.
///
/// Only the immediately preceding fetch is remembered, so a comment that
/// drops off the feed for a cycle and comes back is processed again.
pub struct Poller {
    ctx: BotContext,
    board: Board,
    monitor: MonitorAccount,
    aggregator: Arc<Aggregator>,
    /// `None` when liking is disabled.
    queue: Option<Arc<ActionQueue>>,
    reporter: Reporter,
    trigger: String,
    period: Duration,
    last_seen: HashSet<u64>,
}

impl Poller {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        ctx: BotContext,
        board: Board,
        monitor: MonitorAccount,
        aggregator: Arc<Aggregator>,
        queue: Option<Arc<ActionQueue>>,
        reporter: Reporter,
        trigger: String,
        period: Duration,
    ) -> Self {
        Self {
            ctx,
            board,
            monitor,
            aggregator,
            queue,
            reporter,
            trigger,
            period,
            last_seen: HashSet::new(),
        }
    }

    pub async fn run(mut self, cancel: CancellationToken) {
        self.seed().await;

        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // the first tick completes immediately
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    let now = Utc::now().timestamp();
                    self.poll_once(now, &cancel).await;
                    debug!("Refresh cooldown");
                }
            }
        }

        info!(oid = self.board.oid, "Stopped monitoring");
    }

    /// Treat whatever is already on the board as seen.
    async fn seed(&mut self) {
        match self.ctx.feed.fetch_comments(&self.board).await {
            Ok(comments) => {
                self.last_seen = comments.iter().map(|c| c.reply_id).collect();
                info!(
                    oid = self.board.oid,
                    "Monitoring started with {} known comments",
                    self.last_seen.len()
                );
            }
            Err(e) => {
                error!(
                    oid = self.board.oid,
                    code = %e.error_code(),
                    "Failed to fetch comments: {}",
                    e
                );
            }
        }
    }

    /// One fetch-and-dispatch cycle. Returns the number of new comments
    /// dispatched.
    pub async fn poll_once(&mut self, observed_at: i64, cancel: &CancellationToken) -> usize {
        let comments = match self.ctx.feed.fetch_comments(&self.board).await {
            Ok(comments) => comments,
            Err(e) => {
                error!(
                    oid = self.board.oid,
                    type_code = self.board.kind.code(),
                    code = %e.error_code(),
                    "Failed to fetch comments: {}",
                    e
                );
                return 0;
            }
        };

        let mut dispatched = 0;
        for comment in &comments {
            if cancel.is_cancelled() {
                return dispatched;
            }
            if self.last_seen.contains(&comment.reply_id) {
                continue;
            }
            self.work(comment, observed_at).await;
            self.aggregator.record(comment, observed_at).await;
            dispatched += 1;
        }

        self.last_seen = comments.iter().map(|c| c.reply_id).collect();
        dispatched
    }

    async fn work(&mut self, comment: &Comment, observed_at: i64) {
        if let Err(e) = self.ctx.sink.insert_comment(comment, observed_at).await {
            e.log_warn();
        }

        match &self.queue {
            Some(queue) => {
                if let Err(e) = queue.enqueue(comment.clone()) {
                    let reason = shed_reason(&e);
                    match e {
                        TrySendError::Full(_) => warn!(
                            uid = comment.uid,
                            "{}, not liking comment: msg={}, uname={}",
                            reason,
                            comment.msg,
                            comment.uname
                        ),
                        TrySendError::Closed(_) => debug!(
                            uid = comment.uid,
                            "{}, not liking comment: msg={}, uname={}",
                            reason,
                            comment.msg,
                            comment.uname
                        ),
                    }
                }
            }
            None => {
                info!(
                    uid = comment.uid,
                    "New comment, msg={}, uname={}", comment.msg, comment.uname
                );
            }
        }

        if !self.trigger.is_empty() && comment.msg.contains(&self.trigger) {
            self.reply_delay(comment, observed_at).await;
        }

        if comment.uid == self.monitor.uid() {
            self.notify_monitored(comment).await;
        }
    }

    async fn reply_delay(&mut self, comment: &Comment, observed_at: i64) {
        let delay = self.reporter.report(comment, observed_at);
        if delay.is_empty() {
            info!("Interval too short, latency reply suppressed");
            return;
        }

        let text = format!("Delay: {}", delay);
        let started = Instant::now();
        let result = self.ctx.feed.reply(&self.board, comment, &text).await;
        self.ctx
            .metrics
            .record(ActionKind::Reply, result.is_ok(), started.elapsed())
            .await;

        match result {
            Ok(()) => info!(
                rpid = comment.reply_id,
                ctime = comment.ctime,
                "Replied with latency {}, msg={}",
                delay,
                comment.msg
            ),
            Err(e) => error!(
                rpid = comment.reply_id,
                ctime = comment.ctime,
                "Failed to reply with latency {}, msg={}: {}",
                delay,
                comment.msg,
                e
            ),
        }
    }

    async fn notify_monitored(&self, comment: &Comment) {
        let stamp = Local
            .timestamp_opt(comment.ctime, 0)
            .single()
            .map(|t| t.format("%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| comment.ctime.to_string());
        let text = format!(
            "[{}]\n{}'s comment: {}",
            stamp,
            self.monitor.alias(),
            comment.msg
        );

        info!("{}", text);
        if let Err(e) = self.ctx.notifier.notify(&text).await {
            warn!("Failed to deliver notification: {}", e);
        }
    }
}

fn shed_reason(err: &TrySendError<Comment>) -> &'static str {
    match err {
        TrySendError::Full(_) => "Action queue full",
        TrySendError::Closed(_) => "Action queue closed",
    }
}
