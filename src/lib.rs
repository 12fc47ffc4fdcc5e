use axum::{
    Router,
    extract::{FromRef, Request},
    http::{HeaderName, StatusCode},
    middleware::{self, Next},
    response::Response,
};
use std::{sync::Arc, time::Duration};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Authorization core.
pub mod auth;
pub mod credentials;
pub mod pagination;
pub mod policy;
pub mod token;

// Service plumbing.
pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod memory;
pub mod models;
pub mod repository;

// Routers grouped by required trust level.
pub mod routes;
use auth::{Caller, TokenState};
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use credentials::Passwords;
pub use error::AppError;
pub use memory::InMemoryRepository;
pub use repository::{ContentState, CredentialState, PostgresRepository};
pub use token::TokenCodec;

/// ApiDoc
///
/// OpenAPI description of every route, served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::register, handlers::login, handlers::list_posts, handlers::create_post,
        handlers::edit_post, handlers::delete_post, handlers::list_comments,
        handlers::create_comment, handlers::edit_comment, handlers::delete_comment
    ),
    components(
        schemas(
            models::UserIdentity, models::Post, models::Comment, models::RegisterRequest,
            models::LoginRequest, models::LoginResponse, models::RegisteredUser,
            models::CreatePostRequest, models::UpdatePostRequest, models::CreateCommentRequest,
            models::UpdateCommentRequest, models::MessageResponse, models::PostsPage,
            models::CommentsPage,
        )
    ),
    tags(
        (name = "blog-gate", description = "Blog posts and comments behind bearer-token authorization")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single shared container of services and configuration. Everything in it
/// is either immutable or internally synchronised, so cloning per request is cheap.
#[derive(Clone)]
pub struct AppState {
    /// Account persistence.
    pub credentials: CredentialState,
    /// Post and comment persistence.
    pub content: ContentState,
    /// Token issuing and verification with the process-wide signing key.
    pub codec: TokenState,
    /// Password hashing with the configured cost.
    pub passwords: Arc<Passwords>,
    /// The loaded, immutable configuration.
    pub config: AppConfig,
}

impl AppState {
    /// Builds the codec and password hasher from `config` around the given stores.
    pub fn new(
        config: AppConfig,
        credentials: CredentialState,
        content: ContentState,
    ) -> error::Result<Self> {
        Ok(Self {
            credentials,
            content,
            codec: Arc::new(TokenCodec::from_config(&config)),
            passwords: Arc::new(Passwords::from_config(&config)?),
            config,
        })
    }

    /// State backed by a fresh `InMemoryRepository` serving both stores.
    pub fn in_memory(config: AppConfig) -> error::Result<Self> {
        let repo = Arc::new(InMemoryRepository::new());
        Self::new(config, repo.clone(), repo)
    }
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for TokenState {
    fn from_ref(app_state: &AppState) -> TokenState {
        app_state.codec.clone()
    }
}

/// auth_middleware
///
/// Guards the authenticated and admin routers: a request without a bearer token
/// is answered 401 before any handler runs, and a bad token 403 (via the `Caller`
/// rejection). Role and ownership are left to the handlers.
async fn auth_middleware(caller: Caller, request: Request, next: Next) -> Result<Response, AppError> {
    caller.require()?;
    Ok(next.run(request).await)
}

/// create_router
///
/// Assembles routing, middleware and state.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");
    let request_timeout = Duration::from_secs(state.config.request_timeout_secs);

    let protected = authenticated::authenticated_routes()
        .merge(admin::admin_routes())
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(protected)
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id))
                // Per-request deadline; an expired request is answered 408.
                .layer(TimeoutLayer::with_status_code(
                    StatusCode::REQUEST_TIMEOUT,
                    request_timeout,
                )),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Span for one HTTP request, tagged with its `x-request-id` so every log line of
/// the request can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
