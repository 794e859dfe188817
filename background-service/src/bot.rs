use crate::action_queue::{ActionQueue, LikeWorker};
use crate::aggregator::Aggregator;
use crate::analysis::AnalysisLauncher;
use crate::checkpoint::{self, Checkpointer, Summary};
use crate::context::BotContext;
use crate::follower::FollowerSampler;
use crate::poller::Poller;
use crate::reporter::Reporter;
use boardwatch_core::{Board, BotConfig, CoreError, ErrorExt, MonitorAccount};
use chrono::Utc;
use feed_client::ActionMetrics;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, info_span, Instrument};

/// One monitored board and account, not yet running.
pub struct Bot {
    config: BotConfig,
    ctx: BotContext,
    board: Board,
    monitor: MonitorAccount,
    aggregator: Arc<Aggregator>,
}

impl Bot {
    /// Build a bot from configuration, refreshing the account and board from
    /// the feed. Failed refreshes are logged and the configured values kept.
    pub async fn new(config: BotConfig, ctx: BotContext) -> Self {
        let mut board = config.board();
        let mut monitor = config.monitor();

        if let Err(e) = ctx.feed.account_info(&mut monitor.account).await {
            e.log_warn();
        }
        match ctx.feed.account_stat(monitor.uid()).await {
            Ok(count) => monitor.follower = count,
            Err(e) => {
                e.log_warn();
            }
        }
        if let Err(e) = ctx.feed.board_detail(&mut board).await {
            e.log_warn();
        }
        match ctx.feed.board_counts(&board).await {
            Ok((all_count, count)) => {
                board.all_count = all_count;
                board.count = count;
            }
            Err(e) => {
                e.log_warn();
            }
        }

        let aggregator = Arc::new(Aggregator::new(Utc::now().timestamp(), monitor.follower));
        info!(
            board = %board.name,
            oid = board.oid,
            uid = monitor.uid(),
            follower = monitor.follower,
            "Bot created"
        );

        Self {
            config,
            ctx,
            board,
            monitor,
            aggregator,
        }
    }

    /// Continue the window recorded in `summary`.
    pub async fn recover(config: BotConfig, ctx: BotContext, summary: Summary) -> Self {
        let state = checkpoint::recover(summary, ctx.feed.as_ref()).await;
        Self {
            config,
            ctx,
            board: state.board,
            monitor: state.monitor,
            aggregator: Arc::new(state.aggregator),
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn monitor(&self) -> &MonitorAccount {
        &self.monitor
    }

    pub fn aggregator(&self) -> Arc<Aggregator> {
        Arc::clone(&self.aggregator)
    }

    /// Spawn the poll loop, follower sampler, like worker and checkpoint
    /// scheduler onto the current runtime.
    pub fn start(self) -> RunningBot {
        let span = info_span!("bot", board = %self.board.name);
        let cancel = CancellationToken::new();
        let ctx = self.ctx;

        let (queue, receiver) = ActionQueue::with_capacity(self.config.queue_capacity);
        let queue = Arc::new(queue);
        let worker = if self.config.like {
            let worker = LikeWorker::new(
                Arc::clone(&ctx.feed),
                self.config.like_cooldown(),
                ctx.metrics.clone(),
            );
            Some(tokio::spawn(worker.run(receiver).instrument(span.clone())))
        } else {
            queue.close();
            None
        };

        let poller = Poller::new(
            ctx.clone(),
            self.board.clone(),
            self.monitor.clone(),
            Arc::clone(&self.aggregator),
            self.config.like.then(|| Arc::clone(&queue)),
            Reporter::new(
                self.config.fresh_cd as i64,
                self.config.report_interval_secs as i64,
            ),
            self.config.trigger.clone(),
            self.config.fresh_interval(),
        );
        let sampler = FollowerSampler::new(
            ctx.clone(),
            self.monitor.uid(),
            Arc::clone(&self.aggregator),
            self.config.fan_interval(),
        );

        let checkpointer = Arc::new(Mutex::new(Checkpointer::new(
            ctx.clone(),
            self.board,
            self.monitor,
            Arc::clone(&self.aggregator),
            self.config.report_dir.clone(),
        )));
        let launcher = AnalysisLauncher::new(&self.config.analysis, Arc::clone(&ctx.notifier));
        let publish = self.config.post;

        let loops = vec![
            tokio::spawn(poller.run(cancel.clone()).instrument(span.clone())),
            tokio::spawn(sampler.run(cancel.clone()).instrument(span.clone())),
            tokio::spawn(
                run_checkpoints(
                    Arc::clone(&checkpointer),
                    launcher.clone(),
                    publish,
                    self.config.summary_interval(),
                    cancel.clone(),
                )
                .instrument(span.clone()),
            ),
        ];

        span.in_scope(|| info!("Bot started"));

        RunningBot {
            cancel,
            queue,
            worker,
            loops,
            checkpointer,
            metrics: ctx.metrics,
            aggregator: self.aggregator,
            span,
        }
    }
}

async fn run_checkpoints(
    checkpointer: Arc<Mutex<Checkpointer>>,
    launcher: AnalysisLauncher,
    publish: bool,
    period: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                let result = checkpointer.lock().await.summarize().await;
                match result {
                    // the launcher reports its own outcome
                    Ok(Some(path)) => drop(launcher.launch(&path, publish)),
                    Ok(None) => {}
                    Err(e) => {
                        e.log_error();
                    }
                }
            }
        }
    }
}

/// Handle to a started bot.
pub struct RunningBot {
    cancel: CancellationToken,
    queue: Arc<ActionQueue>,
    worker: Option<JoinHandle<()>>,
    loops: Vec<JoinHandle<()>>,
    checkpointer: Arc<Mutex<Checkpointer>>,
    metrics: ActionMetrics,
    aggregator: Arc<Aggregator>,
    span: tracing::Span,
}

impl RunningBot {
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn metrics(&self) -> &ActionMetrics {
        &self.metrics
    }

    pub fn aggregator(&self) -> &Arc<Aggregator> {
        &self.aggregator
    }

    pub fn queue(&self) -> &ActionQueue {
        &self.queue
    }

    /// Stop every loop, drain the like queue and write a final checkpoint.
    pub async fn stop(self) -> Result<Option<PathBuf>, CoreError> {
        let span = self.span.clone();
        async move {
            info!("Stopping bot");
            self.cancel.cancel();
            self.queue.close();

            if let Some(worker) = self.worker {
                if let Err(e) = worker.await {
                    error!("Like worker ended abnormally: {}", e);
                }
            }
            for handle in self.loops {
                if let Err(e) = handle.await {
                    error!("Bot task ended abnormally: {}", e);
                }
            }

            let path = self.checkpointer.lock().await.summarize().await?;
            let actions = self.metrics.snapshot().await;
            info!(
                succeeded = actions.successful_actions,
                failed = actions.failed_actions,
                dropped = self.queue.dropped(),
                "Bot stopped"
            );
            Ok(path)
        }
        .instrument(span)
        .await
    }
}
