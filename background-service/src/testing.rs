//! In-memory collaborators for unit tests.

use async_trait::async_trait;
use boardwatch_core::{Account, Board, Comment, CoreError, FeedApiError};
use database::CommentSink;
use feed_client::{FeedApi, Notifier};
use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;
use tokio::time::Instant;

pub fn comment(reply_id: u64, uid: u64, ctime: i64) -> Comment {
    Comment {
        reply_id,
        uid,
        uname: format!("user{}", uid),
        msg: format!("comment {}", reply_id),
        ctime,
        oid: 100,
    }
}

fn unavailable() -> CoreError {
    CoreError::FeedApi(FeedApiError::RequestTimeout)
}

/// Feed whose answers are queued up front. Once the queued comment batches
/// run out the last successful batch is served again.
#[derive(Default)]
pub struct ScriptedFeed {
    batches: Mutex<VecDeque<Option<Vec<Comment>>>>,
    last_batch: Mutex<Vec<Comment>>,
    fetches: Mutex<usize>,
    failing_likes: Mutex<HashSet<u64>>,
    like_attempts: Mutex<Vec<Instant>>,
    liked: Mutex<Vec<u64>>,
    replies: Mutex<Vec<(u64, String)>>,
    followers: Mutex<VecDeque<Option<i64>>>,
    board_counts: Mutex<Option<(i64, i64)>>,
    uname: Mutex<Option<String>>,
}

impl ScriptedFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_batch(&self, batch: Vec<Comment>) {
        self.batches.lock().unwrap().push_back(Some(batch));
    }

    pub fn push_fetch_failure(&self) {
        self.batches.lock().unwrap().push_back(None);
    }

    pub fn fail_like(&self, reply_id: u64) {
        self.failing_likes.lock().unwrap().insert(reply_id);
    }

    pub fn push_follower(&self, count: Option<i64>) {
        self.followers.lock().unwrap().push_back(count);
    }

    pub fn set_board_counts(&self, all_count: i64, count: i64) {
        *self.board_counts.lock().unwrap() = Some((all_count, count));
    }

    pub fn set_uname(&self, uname: &str) {
        *self.uname.lock().unwrap() = Some(uname.to_string());
    }

    pub fn fetches(&self) -> usize {
        *self.fetches.lock().unwrap()
    }

    pub fn liked(&self) -> Vec<u64> {
        self.liked.lock().unwrap().clone()
    }

    pub fn like_times(&self) -> Vec<Instant> {
        self.like_attempts.lock().unwrap().clone()
    }

    pub fn replies(&self) -> Vec<(u64, String)> {
        self.replies.lock().unwrap().clone()
    }
}

#[async_trait]
impl FeedApi for ScriptedFeed {
    async fn fetch_comments(&self, _board: &Board) -> Result<Vec<Comment>, CoreError> {
        *self.fetches.lock().unwrap() += 1;
        let next = self.batches.lock().unwrap().pop_front();
        match next {
            Some(Some(batch)) => {
                *self.last_batch.lock().unwrap() = batch.clone();
                Ok(batch)
            }
            Some(None) => Err(unavailable()),
            None => Ok(self.last_batch.lock().unwrap().clone()),
        }
    }

    async fn board_detail(&self, board: &mut Board) -> Result<(), CoreError> {
        if board.oid == 0 {
            board.oid = board.dynamic_id;
        }
        Ok(())
    }

    async fn board_counts(&self, _board: &Board) -> Result<(i64, i64), CoreError> {
        self.board_counts.lock().unwrap().ok_or_else(unavailable)
    }

    async fn account_info(&self, account: &mut Account) -> Result<(), CoreError> {
        match self.uname.lock().unwrap().clone() {
            Some(uname) => {
                account.uname = uname;
                Ok(())
            }
            None => Err(unavailable()),
        }
    }

    async fn account_stat(&self, _uid: u64) -> Result<i64, CoreError> {
        match self.followers.lock().unwrap().pop_front() {
            Some(Some(count)) => Ok(count),
            _ => Err(unavailable()),
        }
    }

    async fn like(&self, comment: &Comment) -> Result<(), CoreError> {
        self.like_attempts.lock().unwrap().push(Instant::now());
        if self.failing_likes.lock().unwrap().contains(&comment.reply_id) {
            return Err(CoreError::FeedApi(FeedApiError::RateLimitExceeded {
                retry_after: 1,
            }));
        }
        self.liked.lock().unwrap().push(comment.reply_id);
        Ok(())
    }

    async fn reply(&self, _board: &Board, comment: &Comment, text: &str) -> Result<(), CoreError> {
        self.replies
            .lock()
            .unwrap()
            .push((comment.reply_id, text.to_string()));
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingSink {
    comments: Mutex<Vec<(u64, i64)>>,
    followers: Mutex<Vec<(u64, i64, i64)>>,
}

impl RecordingSink {
    pub fn comments(&self) -> Vec<(u64, i64)> {
        self.comments.lock().unwrap().clone()
    }

    pub fn followers(&self) -> Vec<(u64, i64, i64)> {
        self.followers.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommentSink for RecordingSink {
    async fn insert_comment(&self, comment: &Comment, observed_at: i64) -> Result<(), CoreError> {
        self.comments
            .lock()
            .unwrap()
            .push((comment.reply_id, observed_at));
        Ok(())
    }

    async fn insert_follower_sample(
        &self,
        uid: u64,
        timestamp: i64,
        count: i64,
    ) -> Result<(), CoreError> {
        self.followers.lock().unwrap().push((uid, timestamp, count));
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, text: &str) -> Result<(), CoreError> {
        self.messages.lock().unwrap().push(text.to_string());
        Ok(())
    }
}
