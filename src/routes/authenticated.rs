use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{delete, post, put},
};

/// Authenticated Router Module
///
/// Comment endpoints. Any verified identity may comment; editing and deleting
/// additionally require ownership of the comment or the admin role, which the
/// handlers check against the owner read fresh from the content store.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // POST /comment
        // The author is stamped from the token, not from the body.
        .route("/comment", post(handlers::create_comment))
        // PUT /comment/edit?commentID=
        .route("/comment/edit", put(handlers::edit_comment))
        // DELETE /comment/delete?commentID=
        .route("/comment/delete", delete(handlers::delete_comment))
}
