//! Time-windowed comment statistics.
//!
//! All counters live in one [`Window`] behind a single async mutex. Writers go
//! through [`Aggregator::record`] and [`Aggregator::append_follower_sample`];
//! checkpointing takes the lock once with [`Aggregator::seal`] so the copy it
//! writes and the reset that follows see the same point in time.

use boardwatch_core::Comment;
use std::collections::HashMap;
use tokio::sync::{Mutex, MutexGuard};

/// Pre-sized histogram length: one day of minutes.
pub const COUNT_CAP: usize = 24 * 60;

/// Hard limit on histogram length; observations further out are not bucketed.
pub const MAX_BUCKETS: usize = COUNT_CAP * 7;

/// Deep copy of a window, detached from the lock.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregatorSnapshot {
    pub today_comment: i64,
    pub people_count: HashMap<u64, i64>,
    /// Comments per minute, indexed by minutes since `start_time`.
    pub hot_count: Vec<i64>,
    /// Worst observation latency (seconds) per minute.
    pub awl_count: Vec<i64>,
    pub fans_count: Vec<i64>,
    /// Unix seconds.
    pub start_time: i64,
}

#[derive(Debug)]
pub struct Window {
    today_comment: i64,
    people_count: HashMap<u64, i64>,
    hot_count: Vec<i64>,
    awl_count: Vec<i64>,
    fans_count: Vec<i64>,
    start_time: i64,
}

impl Window {
    fn new(start_time: i64, seed_follower: Option<i64>) -> Self {
        let mut fans_count = Vec::new();
        fans_count.extend(seed_follower);
        Self {
            today_comment: 0,
            people_count: HashMap::new(),
            hot_count: Vec::with_capacity(COUNT_CAP),
            awl_count: Vec::with_capacity(COUNT_CAP),
            fans_count,
            start_time,
        }
    }

    fn record(&mut self, comment: &Comment, observed_at: i64) {
        self.today_comment += 1;
        *self.people_count.entry(comment.uid).or_insert(0) += 1;

        // comments published before the window opened only count as volume
        if let Some(index) = bucket(comment.ctime - self.start_time) {
            *slot(&mut self.hot_count, index) += 1;
        }

        if let Some(index) = bucket(observed_at - self.start_time) {
            let delay = observed_at - comment.ctime;
            let worst = slot(&mut self.awl_count, index);
            if delay > *worst {
                *worst = delay;
            }
        }
    }

    /// No comment recorded and no follower sample beyond the seed.
    pub fn is_empty(&self) -> bool {
        self.hot_count.is_empty() && self.fans_count.len() <= 1
    }

    pub fn start_time(&self) -> i64 {
        self.start_time
    }

    pub fn snapshot(&self) -> AggregatorSnapshot {
        AggregatorSnapshot {
            today_comment: self.today_comment,
            people_count: self.people_count.clone(),
            hot_count: self.hot_count.clone(),
            awl_count: self.awl_count.clone(),
            fans_count: self.fans_count.clone(),
            start_time: self.start_time,
        }
    }

    /// Open a new window at `now`. With a seed the follower series restarts
    /// from that value, otherwise it is emptied.
    pub fn reset(&mut self, now: i64, seed_follower: Option<i64>) {
        *self = Window::new(now, seed_follower);
    }
}

/// Minute index for an offset from the window start, if it is bucketed.
fn bucket(offset: i64) -> Option<usize> {
    if offset < 0 {
        return None;
    }
    let index = (offset / 60) as usize;
    (index < MAX_BUCKETS).then_some(index)
}

fn slot(histogram: &mut Vec<i64>, index: usize) -> &mut i64 {
    if histogram.len() <= index {
        histogram.resize(index + 1, 0);
    }
    &mut histogram[index]
}

#[derive(Debug)]
pub struct Aggregator {
    window: Mutex<Window>,
}

pub type WindowGuard<'a> = MutexGuard<'a, Window>;

impl Aggregator {
    /// Fresh window starting at `start_time`, follower series seeded with the
    /// starting follower count.
    pub fn new(start_time: i64, seed_follower: i64) -> Self {
        Self {
            window: Mutex::new(Window::new(start_time, Some(seed_follower))),
        }
    }

    pub fn from_snapshot(snapshot: AggregatorSnapshot) -> Self {
        let mut hot_count = snapshot.hot_count;
        let mut awl_count = snapshot.awl_count;
        hot_count.reserve(COUNT_CAP.saturating_sub(hot_count.len()));
        awl_count.reserve(COUNT_CAP.saturating_sub(awl_count.len()));
        Self {
            window: Mutex::new(Window {
                today_comment: snapshot.today_comment,
                people_count: snapshot.people_count,
                hot_count,
                awl_count,
                fans_count: snapshot.fans_count,
                start_time: snapshot.start_time,
            }),
        }
    }

    pub async fn record(&self, comment: &Comment, observed_at: i64) {
        self.window.lock().await.record(comment, observed_at);
    }

    pub async fn append_follower_sample(&self, count: i64) {
        self.window.lock().await.fans_count.push(count);
    }

    pub async fn snapshot(&self) -> AggregatorSnapshot {
        self.window.lock().await.snapshot()
    }

    pub async fn reset(&self, now: i64, seed_follower: Option<i64>) {
        self.window.lock().await.reset(now, seed_follower);
    }

    /// Hold the lock for a whole checkpoint: read, query, write, reset.
    pub async fn seal(&self) -> WindowGuard<'_> {
        self.window.lock().await
    }
}
