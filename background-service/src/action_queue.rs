use boardwatch_core::Comment;
use feed_client::{ActionKind, ActionMetrics, FeedApi};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::time::sleep;
use tracing::{debug, error, info};

pub const DEFAULT_QUEUE_CAPACITY: usize = 32;

/// Bounded FIFO of comments waiting to be liked.
///
/// `enqueue` never waits: when the buffer is full the comment is shed so the
/// poll loop keeps its cadence.
#[derive(Debug)]
pub struct ActionQueue {
    sender: Mutex<Option<mpsc::Sender<Comment>>>,
    capacity: usize,
    accepted: AtomicU64,
    dropped: AtomicU64,
}

impl ActionQueue {
    pub fn with_capacity(capacity: usize) -> (Self, mpsc::Receiver<Comment>) {
        let (tx, rx) = mpsc::channel(capacity);
        let queue = Self {
            sender: Mutex::new(Some(tx)),
            capacity,
            accepted: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        };
        (queue, rx)
    }

    /// Hands the comment back inside `Full` when the buffer is at capacity,
    /// or inside `Closed` once the queue has been closed.
    pub fn enqueue(&self, comment: Comment) -> Result<(), TrySendError<Comment>> {
        let sender = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
        let result = match sender.as_ref() {
            Some(tx) => tx.try_send(comment),
            None => Err(TrySendError::Closed(comment)),
        };

        match &result {
            Ok(()) => self.accepted.fetch_add(1, Ordering::Relaxed),
            Err(_) => self.dropped.fetch_add(1, Ordering::Relaxed),
        };
        result
    }

    /// Stop accepting comments. Buffered ones are still delivered to the
    /// worker, which exits once the buffer is empty.
    pub fn close(&self) {
        let mut sender = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
        if sender.take().is_some() {
            debug!("Action queue closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn accepted(&self) -> u64 {
        self.accepted.load(Ordering::Relaxed)
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Single consumer of the action queue.
pub struct LikeWorker {
    feed: Arc<dyn FeedApi>,
    cooldown: Duration,
    metrics: ActionMetrics,
}

impl LikeWorker {
    pub fn new(feed: Arc<dyn FeedApi>, cooldown: Duration, metrics: ActionMetrics) -> Self {
        Self {
            feed,
            cooldown,
            metrics,
        }
    }

    /// Like each comment in arrival order, sleeping `cooldown` between
    /// items. A failed like doubles the following sleep once and is not
    /// retried. Returns after the queue is closed and drained.
    pub async fn run(self, mut receiver: mpsc::Receiver<Comment>) {
        info!(cooldown = ?self.cooldown, "Like worker started");

        while let Some(comment) = receiver.recv().await {
            let started = Instant::now();
            let result = self.feed.like(&comment).await;
            let success = result.is_ok();
            self.metrics
                .record(ActionKind::Like, success, started.elapsed())
                .await;

            match result {
                Ok(()) => {
                    info!(
                        uid = comment.uid,
                        "Liked comment, msg={}, uname={}", comment.msg, comment.uname
                    );
                }
                Err(e) => {
                    error!(
                        oid = comment.oid,
                        rpid = comment.reply_id,
                        "Failed to like comment, msg={}: {}",
                        comment.msg,
                        e
                    );
                    // probably throttled by the platform
                    sleep(self.cooldown).await;
                }
            }

            debug!("Like cooldown");
            sleep(self.cooldown).await;
        }

        info!("Like worker stopped");
    }
}
