use crate::{
    AppState,
    auth::Caller,
    credentials,
    error::{AppError, Result},
    extract::{AppJson, AppQuery},
    models::{
        CommentsPage, CreateCommentRequest, CreatePostRequest, LoginRequest, LoginResponse,
        MessageResponse, NewComment, NewPost, PostsPage, RegisterRequest, RegisteredUser,
        UpdateCommentRequest, UpdatePostRequest,
    },
    pagination::{self, PageRequest},
    policy::{self, Action},
    token::TokenLifetime,
};
use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use chrono::Utc;
use serde::Deserialize;

// --- Query Structs ---

/// PostsQuery
///
/// Query parameters for `GET /posts`.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PostsQuery {
    /// Rows to skip. Defaults to 0.
    pub offset: Option<i64>,
    /// Page size. Defaults to the configured page size.
    #[serde(rename = "pageSize")]
    pub page_size: Option<i64>,
}

/// CommentsQuery
///
/// Query parameters for `GET /comments`.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CommentsQuery {
    #[serde(rename = "postID")]
    pub post_id: i64,
    pub offset: Option<i64>,
    #[serde(rename = "pageSize")]
    pub page_size: Option<i64>,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PostIdQuery {
    #[serde(rename = "postID")]
    pub post_id: i64,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CommentIdQuery {
    #[serde(rename = "commentID")]
    pub comment_id: i64,
}

fn require_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AppError::ValidationFailure(format!("{field} must not be empty")));
    }
    Ok(())
}

fn created(message: MessageResponse) -> (StatusCode, Json<MessageResponse>) {
    (StatusCode::CREATED, Json(message))
}

// --- Account Handlers ---

/// register
///
/// [Public Route] Creates an account. The response never includes the password hash.
/// Administrator sign-up is refused unless enabled in the configuration.
#[utoipa::path(
    post,
    path = "/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Registered", body = RegisteredUser),
        (status = 400, description = "Registration failed"),
        (status = 403, description = "Admin registration disabled")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisteredUser>)> {
    require_text("username", &payload.username)?;
    require_text("password", &payload.password)?;
    if let Some(email) = &payload.email {
        if !email.contains('@') {
            return Err(AppError::ValidationFailure("email is not valid".to_string()));
        }
    }
    if payload.admin && !state.config.allow_admin_registration {
        return Err(AppError::Unauthorized);
    }

    let record = credentials::register_user(
        state.credentials.as_ref(),
        &state.passwords,
        payload.username,
        payload.password,
        payload.email,
        payload.admin,
    )
    .await?;

    tracing::info!(user_id = record.id, admin = record.admin, "User registered");
    Ok((StatusCode::CREATED, Json(record.into())))
}

/// login
///
/// [Public Route] Verifies credentials and issues a bearer token. `rememberMe`
/// selects the long-lived token lifetime.
#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 400, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let identity = credentials::verify_credentials(
        state.credentials.as_ref(),
        &state.passwords,
        &payload.username_or_email,
        &payload.password,
    )
    .await
    .inspect_err(|e| {
        if matches!(e, AppError::InvalidCredentials) {
            tracing::warn!("Failed login attempt");
        }
    })?;

    let lifetime = if payload.remember_me {
        TokenLifetime::RememberMe
    } else {
        TokenLifetime::Standard
    };
    let issued = state
        .codec
        .issue_for(&identity, lifetime)
        .map_err(|e| AppError::Internal(format!("token signing failed: {e}")))?;

    tracing::info!(user_id = identity.id, "User logged in");
    Ok(Json(LoginResponse {
        token: issued.token,
        user: identity,
        expires_at: issued.expires_at,
    }))
}

// --- Post Handlers ---

/// list_posts
///
/// [Public Route] One page of posts, newest first.
#[utoipa::path(
    get,
    path = "/posts",
    params(PostsQuery),
    responses((status = 200, description = "Posts page", body = PostsPage))
)]
pub async fn list_posts(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<PostsQuery>,
) -> Result<Json<PostsPage>> {
    policy::decide(None, Action::ReadPublic, None).into_result()?;

    let request = PageRequest::new(
        query.offset.unwrap_or(0),
        query.page_size.unwrap_or(state.config.default_page_size),
        state.config.max_page_size,
    )?;
    let page = pagination::page(request, |offset, limit| {
        state.content.list_posts(offset, limit)
    })
    .await?;

    Ok(Json(PostsPage {
        posts: page.items,
        are_there_more_posts: page.has_more,
    }))
}

/// create_post
///
/// [Admin Route] Publishes a post authored by the calling administrator. When
/// `datetime` is omitted the server clock is used.
#[utoipa::path(
    post,
    path = "/post",
    request_body = CreatePostRequest,
    responses(
        (status = 201, description = "Created", body = MessageResponse),
        (status = 401, description = "No token"),
        (status = 403, description = "Not authorised")
    )
)]
pub async fn create_post(
    caller: Caller,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreatePostRequest>,
) -> Result<(StatusCode, Json<MessageResponse>)> {
    let identity = caller.authorize(Action::CreatePost, None)?;
    require_text("title", &payload.title)?;

    let post = state
        .content
        .create_post(NewPost {
            username: identity.username.clone(),
            title: payload.title,
            content: payload.content,
            datetime: payload.datetime.unwrap_or_else(Utc::now),
        })
        .await?;

    tracing::info!(post_id = post.id, author = %post.username, "Post created");
    Ok(created(MessageResponse {
        post_id: Some(post.id),
        ..MessageResponse::new("Post created")
    }))
}

/// edit_post
///
/// [Admin Route] Partially updates a post's title and/or content.
#[utoipa::path(
    put,
    path = "/post/edit",
    params(PostIdQuery),
    request_body = UpdatePostRequest,
    responses(
        (status = 201, description = "Updated", body = MessageResponse),
        (status = 403, description = "Not authorised"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn edit_post(
    caller: Caller,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<PostIdQuery>,
    AppJson(payload): AppJson<UpdatePostRequest>,
) -> Result<(StatusCode, Json<MessageResponse>)> {
    caller.authorize(Action::EditPost, None)?;
    if let Some(title) = &payload.title {
        require_text("title", title)?;
    }

    state
        .content
        .update_post(query.post_id, payload.title, payload.content)
        .await?
        .ok_or(AppError::NotFound("Post"))?;

    Ok(created(MessageResponse::new("Post updated")))
}

/// delete_post
///
/// [Admin Route] Deletes a post together with all of its comments.
#[utoipa::path(
    delete,
    path = "/post/delete",
    params(PostIdQuery),
    responses(
        (status = 201, description = "Deleted", body = MessageResponse),
        (status = 403, description = "Not authorised"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_post(
    caller: Caller,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<PostIdQuery>,
) -> Result<(StatusCode, Json<MessageResponse>)> {
    let identity = caller.authorize(Action::DeletePost, None)?;

    if !state.content.delete_post(query.post_id).await? {
        return Err(AppError::NotFound("Post"));
    }

    tracing::info!(post_id = query.post_id, by = %identity.username, "Post deleted");
    Ok(created(MessageResponse::new("Post deleted")))
}

// --- Comment Handlers ---

/// list_comments
///
/// [Public Route] One page of a post's comments, newest first. An unknown post
/// yields an empty page.
#[utoipa::path(
    get,
    path = "/comments",
    params(CommentsQuery),
    responses((status = 200, description = "Comments page", body = CommentsPage))
)]
pub async fn list_comments(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<CommentsQuery>,
) -> Result<Json<CommentsPage>> {
    policy::decide(None, Action::ReadPublic, None).into_result()?;

    let request = PageRequest::new(
        query.offset.unwrap_or(0),
        query.page_size.unwrap_or(state.config.default_page_size),
        state.config.max_page_size,
    )?;
    let page = pagination::page(request, |offset, limit| {
        state.content.list_comments(query.post_id, offset, limit)
    })
    .await?;

    Ok(Json(CommentsPage {
        comments: page.items,
        are_there_more_comments: page.has_more,
    }))
}

/// create_comment
///
/// [Authenticated Route] Comments on a post. The author is always the verified
/// caller, never a value from the request body.
#[utoipa::path(
    post,
    path = "/comment",
    request_body = CreateCommentRequest,
    responses(
        (status = 201, description = "Created", body = MessageResponse),
        (status = 401, description = "No token"),
        (status = 404, description = "Post Not Found")
    )
)]
pub async fn create_comment(
    caller: Caller,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateCommentRequest>,
) -> Result<(StatusCode, Json<MessageResponse>)> {
    let identity = caller.authorize(Action::CreateComment, None)?;
    require_text("content", &payload.content)?;

    state
        .content
        .get_post(payload.post_id)
        .await?
        .ok_or(AppError::NotFound("Post"))?;

    let comment = state
        .content
        .create_comment(NewComment {
            username: identity.username.clone(),
            content: payload.content,
            datetime: payload.datetime.unwrap_or_else(Utc::now),
            post_id: payload.post_id,
        })
        .await?;

    tracing::debug!(comment_id = comment.id, post_id = comment.post_id, "Comment created");
    Ok(created(MessageResponse {
        comment_id: Some(comment.id),
        ..MessageResponse::new("Comment created")
    }))
}

/// edit_comment
///
/// [Authenticated Route] Owner or administrator. The owner is read from the store
/// right before the decision.
#[utoipa::path(
    put,
    path = "/comment/edit",
    params(CommentIdQuery),
    request_body = UpdateCommentRequest,
    responses(
        (status = 201, description = "Updated", body = MessageResponse),
        (status = 403, description = "Not Owner"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn edit_comment(
    caller: Caller,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<CommentIdQuery>,
    AppJson(payload): AppJson<UpdateCommentRequest>,
) -> Result<(StatusCode, Json<MessageResponse>)> {
    caller.require()?;
    let comment = state
        .content
        .get_comment(query.comment_id)
        .await?
        .ok_or(AppError::NotFound("Comment"))?;
    caller.authorize(Action::EditComment, Some(&comment.username))?;
    require_text("content", &payload.content)?;

    state
        .content
        .update_comment(comment.id, payload.content)
        .await?
        .ok_or(AppError::NotFound("Comment"))?;

    Ok(created(MessageResponse::new("Comment updated")))
}

/// delete_comment
///
/// [Authenticated Route] Owner or administrator (admin override).
#[utoipa::path(
    delete,
    path = "/comment/delete",
    params(CommentIdQuery),
    responses(
        (status = 201, description = "Deleted", body = MessageResponse),
        (status = 403, description = "Not Owner"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_comment(
    caller: Caller,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<CommentIdQuery>,
) -> Result<(StatusCode, Json<MessageResponse>)> {
    caller.require()?;
    let comment = state
        .content
        .get_comment(query.comment_id)
        .await?
        .ok_or(AppError::NotFound("Comment"))?;
    let identity = caller.authorize(Action::DeleteComment, Some(&comment.username))?;

    if !state.content.delete_comment(comment.id).await? {
        return Err(AppError::NotFound("Comment"));
    }

    if identity.username != comment.username {
        tracing::info!(comment_id = comment.id, by = %identity.username, "Comment removed by admin");
    }
    Ok(created(MessageResponse::new("Comment deleted")))
}
