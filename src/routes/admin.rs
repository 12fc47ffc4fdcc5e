use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{delete, post, put},
};

/// Admin Router Module
///
/// Post management. The router layer only guarantees a token is present; the
/// `admin` flag is checked inside each handler through the policy engine, so a
/// regular user gets 403 rather than 401.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // POST /post
        .route("/post", post(handlers::create_post))
        // PUT /post/edit?postID=
        .route("/post/edit", put(handlers::edit_post))
        // DELETE /post/delete?postID=
        // Removes the post and its comments in one transaction.
        .route("/post/delete", delete(handlers::delete_post))
}
