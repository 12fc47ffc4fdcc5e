use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints that need no token. Listing is `ReadPublic` and always allowed.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for load balancers.
        .route("/health", get(|| async { "ok" }))
        // POST /register
        // Creates an account; the password is stored only as a salted hash.
        .route("/register", post(handlers::register))
        // POST /login
        // Exchanges credentials for a bearer token.
        .route("/login", post(handlers::login))
        // GET /posts?offset=&pageSize=
        .route("/posts", get(handlers::list_posts))
        // GET /comments?postID=&offset=&pageSize=
        .route("/comments", get(handlers::list_comments))
}
