use crate::{
    error::Result,
    models::{Comment, NewComment, NewPost, NewUser, Post, UserRecord},
};
use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;

/// CredentialStore
///
/// Account persistence. The auth core only ever asks it to create an account and
/// to find one by username or email; hash comparison happens in `credentials`.
///
/// **Send + Sync + async_trait** make `Arc<dyn CredentialStore>` shareable across
/// Axum's task boundaries.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Inserts a new account. Duplicate username/email is a `ValidationFailure`.
    async fn create_user(&self, user: NewUser) -> Result<UserRecord>;
    /// Looks an account up by username, falling back to email.
    async fn find_by_identifier(&self, identifier: &str) -> Result<Option<UserRecord>>;
}

/// ContentStore
///
/// Post and comment persistence. Listing methods return rows ordered by
/// `datetime` descending, ties in insertion order, starting at `offset`.
#[async_trait]
pub trait ContentStore: Send + Sync {
    // --- Posts ---
    async fn create_post(&self, post: NewPost) -> Result<Post>;
    async fn get_post(&self, id: i64) -> Result<Option<Post>>;
    /// Partial update: `None` fields keep their stored value.
    async fn update_post(
        &self,
        id: i64,
        title: Option<String>,
        content: Option<String>,
    ) -> Result<Option<Post>>;
    /// Deletes the post and all its comments atomically. Returns false if the post was absent.
    async fn delete_post(&self, id: i64) -> Result<bool>;
    async fn list_posts(&self, offset: i64, limit: i64) -> Result<Vec<Post>>;

    // --- Comments ---
    async fn create_comment(&self, comment: NewComment) -> Result<Comment>;
    async fn get_comment(&self, id: i64) -> Result<Option<Comment>>;
    async fn update_comment(&self, id: i64, content: String) -> Result<Option<Comment>>;
    async fn delete_comment(&self, id: i64) -> Result<bool>;
    async fn list_comments(&self, post_id: i64, offset: i64, limit: i64) -> Result<Vec<Comment>>;
}

pub type CredentialState = Arc<dyn CredentialStore>;
pub type ContentState = Arc<dyn ContentStore>;

/// PostgresRepository
///
/// Implements both stores on one connection pool. Queries are checked at runtime
/// (`query_as::<_, T>`) so the crate builds without a live database.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PostgresRepository {
    async fn create_user(&self, user: NewUser) -> Result<UserRecord> {
        let record = sqlx::query_as::<_, UserRecord>(
            r#"INSERT INTO users (username, email, password, admin)
               VALUES ($1, $2, $3, $4)
               RETURNING id, username, email, password, admin"#,
        )
        .bind(user.username)
        .bind(user.email)
        .bind(user.password_hash)
        .bind(user.admin)
        .fetch_one(&self.pool)
        .await?;
        Ok(record)
    }

    /// find_by_identifier
    ///
    /// An exact username match wins over an email match when both exist.
    async fn find_by_identifier(&self, identifier: &str) -> Result<Option<UserRecord>> {
        let record = sqlx::query_as::<_, UserRecord>(
            r#"SELECT id, username, email, password, admin
               FROM users
               WHERE username = $1 OR email = $1
               ORDER BY (username = $1) DESC
               LIMIT 1"#,
        )
        .bind(identifier)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }
}

#[async_trait]
impl ContentStore for PostgresRepository {
    async fn create_post(&self, post: NewPost) -> Result<Post> {
        let created = sqlx::query_as::<_, Post>(
            r#"INSERT INTO posts (username, title, content, datetime)
               VALUES ($1, $2, $3, $4)
               RETURNING id, username, title, content, datetime"#,
        )
        .bind(post.username)
        .bind(post.title)
        .bind(post.content)
        .bind(post.datetime)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn get_post(&self, id: i64) -> Result<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(
            "SELECT id, username, title, content, datetime FROM posts WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(post)
    }

    /// update_post
    ///
    /// Uses `COALESCE` so only the fields supplied as `Some` are overwritten.
    async fn update_post(
        &self,
        id: i64,
        title: Option<String>,
        content: Option<String>,
    ) -> Result<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(
            r#"UPDATE posts
               SET title = COALESCE($2, title),
                   content = COALESCE($3, content)
               WHERE id = $1
               RETURNING id, username, title, content, datetime"#,
        )
        .bind(id)
        .bind(title)
        .bind(content)
        .fetch_optional(&self.pool)
        .await?;
        Ok(post)
    }

    /// delete_post
    ///
    /// Comments first, then the post, inside one transaction. A failure at either
    /// step rolls both back when `tx` is dropped.
    async fn delete_post(&self, id: i64) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM comments WHERE post_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let deleted = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;
        Ok(deleted > 0)
    }

    async fn list_posts(&self, offset: i64, limit: i64) -> Result<Vec<Post>> {
        let posts = sqlx::query_as::<_, Post>(
            r#"SELECT id, username, title, content, datetime
               FROM posts
               ORDER BY datetime DESC, id ASC
               LIMIT $1 OFFSET $2"#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(posts)
    }

    async fn create_comment(&self, comment: NewComment) -> Result<Comment> {
        let created = sqlx::query_as::<_, Comment>(
            r#"INSERT INTO comments (username, content, datetime, post_id)
               VALUES ($1, $2, $3, $4)
               RETURNING id, username, content, datetime, post_id"#,
        )
        .bind(comment.username)
        .bind(comment.content)
        .bind(comment.datetime)
        .bind(comment.post_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn get_comment(&self, id: i64) -> Result<Option<Comment>> {
        let comment = sqlx::query_as::<_, Comment>(
            "SELECT id, username, content, datetime, post_id FROM comments WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(comment)
    }

    async fn update_comment(&self, id: i64, content: String) -> Result<Option<Comment>> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"UPDATE comments SET content = $2
               WHERE id = $1
               RETURNING id, username, content, datetime, post_id"#,
        )
        .bind(id)
        .bind(content)
        .fetch_optional(&self.pool)
        .await?;
        Ok(comment)
    }

    async fn delete_comment(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_comments(&self, post_id: i64, offset: i64, limit: i64) -> Result<Vec<Comment>> {
        let comments = sqlx::query_as::<_, Comment>(
            r#"SELECT id, username, content, datetime, post_id
               FROM comments
               WHERE post_id = $1
               ORDER BY datetime DESC, id ASC
               LIMIT $2 OFFSET $3"#,
        )
        .bind(post_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(comments)
    }
}
