use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    error::{AppError, Result},
    models::{Comment, NewComment, NewPost, NewUser, Post, UserRecord},
    repository::{ContentStore, CredentialStore},
};

#[derive(Default)]
struct Tables {
    users: Vec<UserRecord>,
    posts: Vec<Post>,
    comments: Vec<Comment>,
    next_user_id: i64,
    next_post_id: i64,
    next_comment_id: i64,
}

/// InMemoryRepository
///
/// Implements both stores over process memory. Used by the test suites and for
/// running the service without Postgres. Rows are kept in insertion order so the
/// stable sort in the listing methods breaks timestamp ties the same way the
/// database does.
#[derive(Default)]
pub struct InMemoryRepository {
    tables: RwLock<Tables>,
    /// When true, every operation fails as an unavailable store.
    pub should_fail: bool,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    fn check(&self) -> Result<()> {
        if self.should_fail {
            return Err(AppError::StoreUnavailable(
                "in-memory store: simulated outage".to_string(),
            ));
        }
        Ok(())
    }
}

fn window<T: Clone>(rows: Vec<&T>, offset: i64, limit: i64) -> Vec<T> {
    let offset = usize::try_from(offset).unwrap_or(0);
    let limit = usize::try_from(limit).unwrap_or(0);
    rows.into_iter().skip(offset).take(limit).cloned().collect()
}

#[async_trait]
impl CredentialStore for InMemoryRepository {
    async fn create_user(&self, user: NewUser) -> Result<UserRecord> {
        self.check()?;
        let mut tables = self.tables.write().await;

        let taken = tables.users.iter().any(|u| {
            u.username == user.username
                || (user.email.is_some() && u.email.is_some() && u.email == user.email)
        });
        if taken {
            return Err(AppError::ValidationFailure("Write rejected".to_string()));
        }

        tables.next_user_id += 1;
        let record = UserRecord {
            id: tables.next_user_id,
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            admin: user.admin,
        };
        tables.users.push(record.clone());
        Ok(record)
    }

    async fn find_by_identifier(&self, identifier: &str) -> Result<Option<UserRecord>> {
        self.check()?;
        let tables = self.tables.read().await;
        let by_username = tables.users.iter().find(|u| u.username == identifier);
        let found = by_username
            .or_else(|| tables.users.iter().find(|u| u.email.as_deref() == Some(identifier)));
        Ok(found.cloned())
    }
}

#[async_trait]
impl ContentStore for InMemoryRepository {
    async fn create_post(&self, post: NewPost) -> Result<Post> {
        self.check()?;
        let mut tables = self.tables.write().await;
        tables.next_post_id += 1;
        let created = Post {
            id: tables.next_post_id,
            username: post.username,
            title: post.title,
            content: post.content,
            datetime: post.datetime,
        };
        tables.posts.push(created.clone());
        Ok(created)
    }

    async fn get_post(&self, id: i64) -> Result<Option<Post>> {
        self.check()?;
        let tables = self.tables.read().await;
        Ok(tables.posts.iter().find(|p| p.id == id).cloned())
    }

    async fn update_post(
        &self,
        id: i64,
        title: Option<String>,
        content: Option<String>,
    ) -> Result<Option<Post>> {
        self.check()?;
        let mut tables = self.tables.write().await;
        let Some(post) = tables.posts.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        if let Some(title) = title {
            post.title = title;
        }
        if let Some(content) = content {
            post.content = content;
        }
        Ok(Some(post.clone()))
    }

    /// delete_post
    ///
    /// Both removals happen under one write lock, so no reader observes the
    /// comments without their post or the other way round.
    async fn delete_post(&self, id: i64) -> Result<bool> {
        self.check()?;
        let mut tables = self.tables.write().await;
        let before = tables.posts.len();
        tables.posts.retain(|p| p.id != id);
        if tables.posts.len() == before {
            return Ok(false);
        }
        tables.comments.retain(|c| c.post_id != id);
        Ok(true)
    }

    async fn list_posts(&self, offset: i64, limit: i64) -> Result<Vec<Post>> {
        self.check()?;
        let tables = self.tables.read().await;
        let mut rows: Vec<&Post> = tables.posts.iter().collect();
        rows.sort_by(|a, b| b.datetime.cmp(&a.datetime));
        Ok(window(rows, offset, limit))
    }

    async fn create_comment(&self, comment: NewComment) -> Result<Comment> {
        self.check()?;
        let mut tables = self.tables.write().await;
        // Mirrors the foreign key on comments.post_id.
        if !tables.posts.iter().any(|p| p.id == comment.post_id) {
            return Err(AppError::ValidationFailure("Write rejected".to_string()));
        }
        tables.next_comment_id += 1;
        let created = Comment {
            id: tables.next_comment_id,
            username: comment.username,
            content: comment.content,
            datetime: comment.datetime,
            post_id: comment.post_id,
        };
        tables.comments.push(created.clone());
        Ok(created)
    }

    async fn get_comment(&self, id: i64) -> Result<Option<Comment>> {
        self.check()?;
        let tables = self.tables.read().await;
        Ok(tables.comments.iter().find(|c| c.id == id).cloned())
    }

    async fn update_comment(&self, id: i64, content: String) -> Result<Option<Comment>> {
        self.check()?;
        let mut tables = self.tables.write().await;
        let Some(comment) = tables.comments.iter_mut().find(|c| c.id == id) else {
            return Ok(None);
        };
        comment.content = content;
        Ok(Some(comment.clone()))
    }

    async fn delete_comment(&self, id: i64) -> Result<bool> {
        self.check()?;
        let mut tables = self.tables.write().await;
        let before = tables.comments.len();
        tables.comments.retain(|c| c.id != id);
        Ok(tables.comments.len() < before)
    }

    async fn list_comments(&self, post_id: i64, offset: i64, limit: i64) -> Result<Vec<Comment>> {
        self.check()?;
        let tables = self.tables.read().await;
        let mut rows: Vec<&Comment> = tables.comments.iter().filter(|c| c.post_id == post_id).collect();
        rows.sort_by(|a, b| b.datetime.cmp(&a.datetime));
        Ok(window(rows, offset, limit))
    }
}
