use crate::bot::Bot;
use crate::checkpoint::Summary;
use crate::context::BotContext;
use crate::testing::{comment, RecordingNotifier, RecordingSink, ScriptedFeed};
use boardwatch_core::BotConfig;
use database::CommentSink;
use feed_client::Notifier;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

fn config(report_dir: &Path, like: bool) -> BotConfig {
    let raw = format!(
        r#"
fresh_cd = 5
like_cd = 1.0
like = {like}
report_dir = "{dir}"

[board]
oid = 100
name = "evening chat"

[account]
uid = 42
alias = "nana"
"#,
        like = like,
        dir = report_dir.display()
    );
    BotConfig::from_toml_str(&raw).unwrap()
}

struct Fixture {
    feed: Arc<ScriptedFeed>,
    sink: Arc<RecordingSink>,
    notifier: Arc<RecordingNotifier>,
    ctx: BotContext,
}

fn fixture() -> Fixture {
    let feed = Arc::new(ScriptedFeed::new());
    let sink = Arc::new(RecordingSink::default());
    let notifier = Arc::new(RecordingNotifier::default());
    let ctx = BotContext::new(feed.clone(), sink.clone()).with_notifier(notifier.clone());
    Fixture {
        feed,
        sink,
        notifier,
        ctx,
    }
}

#[tokio::test]
async fn test_context_from_config_opens_database() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("comments.db");
    let mut config = config(dir.path(), false);
    config.database_url = format!("sqlite://{}", db_path.display());

    let ctx = BotContext::from_config(&config, Arc::new(ScriptedFeed::new()))
        .await
        .unwrap();
    ctx.sink
        .insert_comment(&comment(1, 7, 1_700_000_000), 1_700_000_005)
        .await
        .unwrap();
    ctx.notifier.notify("bot ready").await.unwrap();

    assert!(db_path.exists());
    let bot = Bot::new(config, ctx).await;
    assert_eq!(bot.board().oid, 100);
}

#[tokio::test]
async fn test_new_refreshes_from_feed() {
    let dir = tempfile::tempdir().unwrap();
    let f = fixture();
    f.feed.set_uname("nanami");
    f.feed.push_follower(Some(1000));
    f.feed.set_board_counts(40, 30);

    let bot = Bot::new(config(dir.path(), false), f.ctx).await;

    assert_eq!(bot.monitor().account.uname, "nanami");
    assert_eq!(bot.monitor().follower, 1000);
    assert_eq!(bot.board().all_count, 40);
    assert_eq!(bot.board().count, 30);
    assert_eq!(bot.aggregator().snapshot().await.fans_count, vec![1000]);
}

#[tokio::test]
async fn test_new_survives_feed_failures() {
    let dir = tempfile::tempdir().unwrap();
    let f = fixture();

    let bot = Bot::new(config(dir.path(), false), f.ctx).await;

    assert_eq!(bot.monitor().alias(), "nana");
    assert_eq!(bot.monitor().follower, 0);
    assert_eq!(bot.board().oid, 100);
    assert_eq!(bot.board().all_count, 0);
}

#[tokio::test(start_paused = true)]
async fn test_lifecycle_likes_new_comments_and_checkpoints_on_stop() {
    let dir = tempfile::tempdir().unwrap();
    let f = fixture();
    f.feed.set_uname("nanami");
    f.feed.push_follower(Some(1000));
    f.feed.set_board_counts(40, 30);

    let bot = Bot::new(config(dir.path(), true), f.ctx).await;
    let start = bot.aggregator().snapshot().await.start_time;
    let mut own = comment(3, 42, start);
    own.msg = "hello".to_string();
    f.feed.push_batch(vec![comment(1, 7, start)]);
    f.feed.push_batch(vec![comment(2, 8, start), own, comment(1, 7, start)]);

    let running = bot.start();
    tokio::time::sleep(Duration::from_secs(12)).await;
    let path = running.stop().await.unwrap().unwrap();

    assert_eq!(f.feed.liked(), vec![2, 3]);
    let stored: Vec<u64> = f.sink.comments().iter().map(|(id, _)| *id).collect();
    assert_eq!(stored, vec![2, 3]);
    assert_eq!(f.notifier.messages().len(), 1);

    let summary = Summary::load(&path).await.unwrap();
    assert_eq!(summary.board.count, 2);
    assert_eq!(summary.board.start_all_count, 40);
    assert_eq!(summary.account.name, "nanami");
    assert_eq!(summary.account.start_followers, 1000);
}

#[tokio::test(start_paused = true)]
async fn test_stop_without_activity_writes_no_checkpoint() {
    let dir = tempfile::tempdir().unwrap();
    let f = fixture();

    let running = Bot::new(config(dir.path(), false), f.ctx).await.start();
    tokio::time::sleep(Duration::from_secs(6)).await;

    assert_eq!(running.stop().await.unwrap(), None);
    assert!(f.feed.liked().is_empty());
}

#[tokio::test]
async fn test_recover_continues_window() {
    let dir = tempfile::tempdir().unwrap();
    let raw = br#"{
        "version": "0.3.0", "start": 1700000000, "end": 1700003600,
        "board": {"name": "evening chat", "oid": 100, "type": 1, "dynamicId": 9,
                  "bvID": "BV1xx", "hot": [2, 1], "awl": [0, 95],
                  "people": {"10": 2, "11": 1}, "count": 3,
                  "startAllCount": 40, "startCount": 30,
                  "endAllCount": 43, "endCount": 32},
        "account": {"name": "nanami", "alias": "nana", "uid": 42,
                    "startFollowers": 1000, "endFollowers": 1010,
                    "fansCount": [1000, 1010]}
    }"#;
    let summary = Summary::parse(raw, "inline").unwrap();
    let f = fixture();

    let bot = Bot::recover(config(dir.path(), false), f.ctx, summary).await;

    assert_eq!(bot.board().bv_id, "BV1xx");
    assert_eq!(bot.board().all_count, 40);
    assert_eq!(bot.monitor().follower, 1000);
    let snapshot = bot.aggregator().snapshot().await;
    assert_eq!(snapshot.hot_count, vec![2, 1]);
    assert_eq!(snapshot.start_time, 1_700_000_000);
    assert_eq!(snapshot.today_comment, 3);
}
