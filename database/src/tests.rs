use crate::{CommentSink, Database};
use boardwatch_core::{BotConfig, Comment, CoreError, StorageError};
use std::env;

async fn setup_test_db() -> Database {
    let db_path = env::temp_dir().join(format!("test_boardwatch_{}.db", uuid::Uuid::new_v4()));
    let db_url = format!("sqlite://{}", db_path.display());

    let mut db = Database::new(db_url);
    db.connect()
        .await
        .expect("Failed to connect to test database");
    db.run_migrations().await.expect("Failed to run migrations");

    db
}

fn comment(reply_id: u64, oid: u64) -> Comment {
    Comment {
        reply_id,
        uid: 7,
        uname: "viewer".to_string(),
        msg: "hello".to_string(),
        ctime: 1_700_000_000,
        oid,
    }
}

#[tokio::test]
async fn test_migrations_are_idempotent() {
    let db = setup_test_db().await;
    db.run_migrations()
        .await
        .expect("Second migration run should be a no-op");
}

#[tokio::test]
async fn test_insert_comment_ignores_duplicates() {
    let db = setup_test_db().await;

    db.insert_comment(&comment(1, 100), 1_700_000_005)
        .await
        .unwrap();
    db.insert_comment(&comment(2, 100), 1_700_000_005)
        .await
        .unwrap();
    db.insert_comment(&comment(1, 100), 1_700_000_010)
        .await
        .unwrap();
    db.insert_comment(&comment(3, 200), 1_700_000_010)
        .await
        .unwrap();

    assert_eq!(db.comment_count(100).await.unwrap(), 2);
    assert_eq!(db.comment_count(200).await.unwrap(), 1);
}

#[tokio::test]
async fn test_follower_samples_ordered() {
    let db = setup_test_db().await;

    db.insert_follower_sample(9, 1_700_000_600, 1010)
        .await
        .unwrap();
    db.insert_follower_sample(9, 1_700_000_000, 1000)
        .await
        .unwrap();
    db.insert_follower_sample(10, 1_700_000_000, 5).await.unwrap();

    let samples = db.follower_samples(9).await.unwrap();
    assert_eq!(samples, vec![(1_700_000_000, 1000), (1_700_000_600, 1010)]);
}

#[tokio::test]
async fn test_unconnected_database_reports_error() {
    let db = Database::new("sqlite://unused.db".to_string());
    assert!(db.insert_comment(&comment(1, 1), 0).await.is_err());
}

fn config_with_database(db_url: &str) -> BotConfig {
    BotConfig::from_toml_str(&format!(
        r#"
database_url = "{db_url}"

[board]
oid = 100
name = "evening chat"

[account]
uid = 42
alias = "nana"
"#,
        db_url = db_url
    ))
    .unwrap()
}

#[tokio::test]
async fn test_from_config_connects_and_migrates() {
    let db_path = env::temp_dir().join(format!("test_boardwatch_{}.db", uuid::Uuid::new_v4()));
    let config = config_with_database(&format!("sqlite://{}", db_path.display()));

    let db = Database::from_config(&config).await.unwrap();
    db.insert_comment(&comment(1, 100), 1_700_000_005)
        .await
        .unwrap();

    assert_eq!(db.comment_count(100).await.unwrap(), 1);
    assert!(db_path.exists());
}

#[tokio::test]
async fn test_from_config_reports_unreachable_database() {
    let missing_dir = env::temp_dir().join(format!("missing_{}", uuid::Uuid::new_v4()));
    let config = config_with_database(&format!(
        "sqlite://{}",
        missing_dir.join("boardwatch.db").display()
    ));

    assert!(matches!(
        Database::from_config(&config).await,
        Err(CoreError::Storage(StorageError::ConnectionFailed { .. }))
    ));
}
