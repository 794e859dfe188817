use async_trait::async_trait;
use boardwatch_core::{Account, Board, Comment, CoreError};

/// Operations the bot needs from the comment platform.
///
/// Implementations own their HTTP stack, credentials and timeouts. Every
/// method reports failure through `CoreError`; callers log and carry on.
#[async_trait]
pub trait FeedApi: Send + Sync {
    /// Current first page of top-level comments, newest first as the
    /// platform orders them.
    async fn fetch_comments(&self, board: &Board) -> Result<Vec<Comment>, CoreError>;

    /// Fill in `oid`, `kind`, `dynamic_id` and `bv_id` for a board known by
    /// name and dynamic or video id.
    async fn board_detail(&self, board: &mut Board) -> Result<(), CoreError>;

    /// `(all_count, count)`: totals including and excluding nested replies.
    async fn board_counts(&self, board: &Board) -> Result<(i64, i64), CoreError>;

    /// Refresh the account's display name.
    async fn account_info(&self, account: &mut Account) -> Result<(), CoreError>;

    /// Current follower count of `uid`.
    async fn account_stat(&self, uid: u64) -> Result<i64, CoreError>;

    async fn like(&self, comment: &Comment) -> Result<(), CoreError>;

    async fn reply(&self, board: &Board, comment: &Comment, text: &str) -> Result<(), CoreError>;
}
