use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;

// --- Identity ---

/// UserIdentity
///
/// The verified caller: what a bearer token carries and what the policy engine
/// reasons about. Immutable once embedded in a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct UserIdentity {
    pub id: i64,
    pub username: String,
    pub admin: bool,
}

/// UserRecord
///
/// The credential store's row for an account (`users` table). Holds the password
/// hash, so it is never serialized.
#[derive(Debug, Clone, FromRow)]
pub struct UserRecord {
    pub id: i64,
    pub username: String,
    pub email: Option<String>,
    #[sqlx(rename = "password")]
    pub password_hash: String,
    pub admin: bool,
}

impl UserRecord {
    pub fn identity(&self) -> UserIdentity {
        UserIdentity {
            id: self.id,
            username: self.username.clone(),
            admin: self.admin,
        }
    }
}

/// NewUser
///
/// Insert payload for the credential store. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: Option<String>,
    pub password_hash: String,
    pub admin: bool,
}

// --- Content Rows ---

/// Post
///
/// A blog post (`posts` table). `username` is the author stamped at creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[ts(export)]
pub struct Post {
    pub id: i64,
    pub username: String,
    pub title: String,
    pub content: String,
    #[ts(type = "string")]
    pub datetime: DateTime<Utc>,
}

/// Comment
///
/// A comment on a post (`comments` table). Ownership is the `username` value it
/// was created with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[ts(export)]
pub struct Comment {
    pub id: i64,
    pub username: String,
    pub content: String,
    #[ts(type = "string")]
    pub datetime: DateTime<Utc>,
    #[serde(rename = "postID")]
    pub post_id: i64,
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub username: String,
    pub title: String,
    pub content: String,
    pub datetime: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub username: String,
    pub content: String,
    pub datetime: DateTime<Utc>,
    pub post_id: i64,
}

// --- Request Payloads ---

/// RegisterRequest
///
/// Input for `POST /register`. `admin` is honoured only when admin registration is enabled.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub admin: bool,
}

/// LoginRequest
///
/// Input for `POST /login`. The identifier matches either a username or an email.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LoginRequest {
    #[serde(rename = "usernameOrEmail")]
    pub username_or_email: String,
    pub password: String,
    #[serde(default, rename = "rememberMe")]
    pub remember_me: bool,
}

/// CreatePostRequest
///
/// Input for `POST /post`. Any caller-supplied author is ignored; the verified
/// identity's username is stamped instead.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreatePostRequest {
    pub title: String,
    pub content: String,
    #[serde(default)]
    #[ts(type = "string | null")]
    pub datetime: Option<DateTime<Utc>>,
}

/// UpdatePostRequest
///
/// Partial update for `PUT /post/edit`. Omitted fields keep their stored value.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdatePostRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// CreateCommentRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateCommentRequest {
    pub content: String,
    #[serde(default)]
    #[ts(type = "string | null")]
    pub datetime: Option<DateTime<Utc>>,
    #[serde(rename = "postID")]
    pub post_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateCommentRequest {
    pub content: String,
}

// --- Responses ---

/// RegisteredUser
///
/// Output of `POST /register`: the created account without its password hash.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RegisteredUser {
    pub id: i64,
    pub username: String,
    pub email: Option<String>,
    pub admin: bool,
}

impl From<UserRecord> for RegisteredUser {
    fn from(record: UserRecord) -> Self {
        Self {
            id: record.id,
            username: record.username,
            email: record.email,
            admin: record.admin,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserIdentity,
    #[serde(rename = "expiresAt")]
    #[ts(type = "string")]
    pub expires_at: DateTime<Utc>,
}

/// MessageResponse
///
/// Acknowledgement body for mutations. The id fields are present only on creation.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct MessageResponse {
    pub message: String,
    #[serde(rename = "postID", skip_serializing_if = "Option::is_none")]
    pub post_id: Option<i64>,
    #[serde(rename = "commentID", skip_serializing_if = "Option::is_none")]
    pub comment_id: Option<i64>,
}

impl MessageResponse {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
            ..Self::default()
        }
    }
}

/// PostsPage
///
/// Output of `GET /posts`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct PostsPage {
    pub posts: Vec<Post>,
    #[serde(rename = "areThereMorePosts")]
    pub are_there_more_posts: bool,
}

/// CommentsPage
///
/// Output of `GET /comments`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct CommentsPage {
    pub comments: Vec<Comment>,
    #[serde(rename = "areThereMoreComments")]
    pub are_there_more_comments: bool,
}
