//! Runs against a live Postgres. Ignored by default:
//! `DATABASE_URL=postgres://... cargo test -- --ignored`

use blog_gate::{
    AppError,
    models::{NewComment, NewPost, NewUser},
    repository::{ContentStore, CredentialStore, PostgresRepository},
};
use chrono::{Duration, TimeZone, Utc};
use sqlx::PgPool;
use tokio::test;

// --- Test Context and Setup ---

struct DbTestContext {
    pool: PgPool,
}

impl DbTestContext {
    async fn setup() -> Self {
        dotenv::dotenv().ok();

        let db_url = std::env::var("DATABASE_URL")
            .expect("DATABASE_URL must be set to run integration tests");

        let pool = PgPool::connect(&db_url)
            .await
            .expect("Failed to connect to database for integration tests.");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("Failed to run database migrations.");

        DbTestContext { pool }
    }

    fn repository(&self) -> PostgresRepository {
        PostgresRepository::new(self.pool.clone())
    }
}

/// Unique per run so tests can share one database.
fn unique(prefix: &str) -> String {
    format!("{prefix}-{}", Utc::now().timestamp_nanos_opt().unwrap_or_default())
}

async fn insert_post(repo: &PostgresRepository, title: &str, minutes: i64) -> i64 {
    let base = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
    repo.create_post(NewPost {
        username: "alice".to_string(),
        title: title.to_string(),
        content: "body".to_string(),
        datetime: base + Duration::minutes(minutes),
    })
    .await
    .unwrap()
    .id
}

// --- Credential Store ---

#[test]
#[ignore]
async fn test_user_lookup_by_username_and_email() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let username = unique("user");
    let email = format!("{username}@example.com");

    let created = repo
        .create_user(NewUser {
            username: username.clone(),
            email: Some(email.clone()),
            password_hash: "$argon2id$placeholder".to_string(),
            admin: false,
        })
        .await
        .unwrap();

    let by_name = repo.find_by_identifier(&username).await.unwrap().unwrap();
    let by_email = repo.find_by_identifier(&email).await.unwrap().unwrap();
    assert_eq!(by_name.id, created.id);
    assert_eq!(by_email.id, created.id);
    assert_eq!(by_name.password_hash, "$argon2id$placeholder");

    assert!(repo.find_by_identifier(&unique("ghost")).await.unwrap().is_none());
}

#[test]
#[ignore]
async fn test_duplicate_username_is_a_validation_failure() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let username = unique("dup");
    let new_user = || NewUser {
        username: username.clone(),
        email: None,
        password_hash: "hash".to_string(),
        admin: false,
    };

    repo.create_user(new_user()).await.unwrap();
    let err = repo.create_user(new_user()).await.unwrap_err();

    assert!(matches!(err, AppError::ValidationFailure(_)));
}

// --- Content Store ---

#[test]
#[ignore]
async fn test_comments_listed_newest_first_and_cascade_on_delete() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let post_id = insert_post(&repo, &unique("post"), 0).await;
    let base = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();

    for (i, author) in ["bob", "carol", "dave"].into_iter().enumerate() {
        repo.create_comment(NewComment {
            username: author.to_string(),
            content: format!("comment {i}"),
            datetime: base + Duration::minutes(i as i64),
            post_id,
        })
        .await
        .unwrap();
    }

    let page = repo.list_comments(post_id, 0, 2).await.unwrap();
    let authors: Vec<&str> = page.iter().map(|c| c.username.as_str()).collect();
    assert_eq!(authors, vec!["dave", "carol"]);

    assert!(repo.delete_post(post_id).await.unwrap());
    assert!(repo.get_post(post_id).await.unwrap().is_none());
    assert!(repo.list_comments(post_id, 0, 10).await.unwrap().is_empty());
    assert!(!repo.delete_post(post_id).await.unwrap());
}

#[test]
#[ignore]
async fn test_partial_post_update_keeps_other_fields() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let post_id = insert_post(&repo, "Before", 5).await;

    let updated = repo
        .update_post(post_id, None, Some("new body".to_string()))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(updated.title, "Before");
    assert_eq!(updated.content, "new body");
    assert!(repo.update_post(-1, Some("x".to_string()), None).await.unwrap().is_none());

    repo.delete_post(post_id).await.unwrap();
}

#[test]
#[ignore]
async fn test_comment_on_missing_post_is_rejected() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();

    let err = repo
        .create_comment(NewComment {
            username: "bob".to_string(),
            content: "orphan".to_string(),
            datetime: Utc::now(),
            post_id: -1,
        })
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::ValidationFailure(_)));
}
