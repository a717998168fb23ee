/// Application state and router builder
///
/// This module defines the shared application state and provides a function
/// to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use bookery_api::{app::AppState, config::Config, media::Cloudinary};
/// use sqlx::PgPool;
/// use std::sync::Arc;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let media = Arc::new(Cloudinary::new(&config.media));
/// let state = AppState::new(pool, config, media);
/// let app = bookery_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, media::MediaStore, middleware::origin::OriginGuardLayer};
use axum::{
    extract::{DefaultBodyLimit, Request},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{get, patch, post},
    Router,
};
use bookery_shared::auth::{jwt, middleware::AuthContext};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Maximum accepted request body size: matches the 10 MiB upload cap.
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor. Uses Arc
/// internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Remote media host client
    pub media: Arc<dyn MediaStore>,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config, media: Arc<dyn MediaStore>) -> Self {
        Self {
            db,
            config: Arc::new(config),
            media,
        }
    }

    /// Gets the token signing secret
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                      # Health check (public)
/// └── /api
///     ├── /users
///     │   ├── POST /register       # Register new user
///     │   └── POST /login          # Login
///     └── /books
///         ├── GET    /             # List books (public)
///         ├── POST   /             # Create book (authenticated, multipart)
///         ├── GET    /:book_id     # Single book (public)
///         ├── PATCH  /:book_id     # Update book (authenticated, multipart)
///         └── DELETE /:book_id     # Delete book (authenticated)
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS headers (tower-http CorsLayer)
/// 3. Origin allow-list enforcement
/// 4. Body size limit (10 MiB upload cap)
/// 5. Authentication (per-route basis)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // User routes (public, no auth required)
    let user_routes = Router::new()
        .route("/register", post(routes::users::register))
        .route("/login", post(routes::users::login));

    // Mutating book routes require a valid bearer token; reads are public
    let book_write_routes = Router::new()
        .route("/", post(routes::books::create_book))
        .route(
            "/:book_id",
            patch(routes::books::update_book).delete(routes::books::delete_book),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let book_read_routes = Router::new()
        .route("/", get(routes::books::list_books))
        .route("/:book_id", get(routes::books::get_book));

    let book_routes = book_read_routes.merge(book_write_routes);

    let api_routes = Router::new()
        .nest("/users", user_routes)
        .nest("/books", book_routes);

    // Browser-facing CORS headers for the configured origins
    let origins: Vec<HeaderValue> = state
        .config
        .api
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .max_age(std::time::Duration::from_secs(3600));

    Router::new()
        .merge(health_routes)
        .nest("/api", api_routes)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(OriginGuardLayer::new(state.config.api.cors_origins.clone()))
        .with_state(state)
}

/// Bearer token authentication middleware layer
///
/// Extracts and validates the token from the Authorization header, then
/// injects [`AuthContext`] into request extensions.
async fn jwt_auth_layer(
    state: axum::extract::State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, crate::error::ApiError> {
    let auth_header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            crate::error::ApiError::Unauthorized("Missing authorization header".to_string())
        })?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| crate::error::ApiError::BadRequest("Expected Bearer token".to_string()))?;

    let claims = jwt::validate_token(token, state.jwt_secret())?;

    req.extensions_mut().insert(AuthContext::new(claims.sub));

    Ok(next.run(req).await)
}
