//! HTTP transport for warden decisions.
//!
//! Every decision route answers with `{ "allowed": bool }`: 200 when the
//! answer is yes, 403 (401 for authentication) when it is no. Malformed
//! requests get 400 and unreachable backends 503, with an error body.

use authz::DecisionService;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

pub mod error;
pub mod handlers;
pub mod middleware_hooks;
pub mod models;
pub mod server;

pub use server::{bind, serve, spawn_server, start_server, ApiConfig};

/// Sent in `X-Warden-Version` on every response
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// `WWW-Authenticate` value sent with 401 responses
pub const BASIC_CHALLENGE: &str = "Basic realm=\"warden\"";

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub decision: Arc<DecisionService>,
}

impl AppState {
    pub fn new(decision: DecisionService) -> Self {
        Self {
            decision: Arc::new(decision),
        }
    }
}

struct BasicAuthScheme;

impl Modify for BasicAuthScheme {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "basic_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Basic)),
            );
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::authenticate,
        handlers::authz::authorize_root,
        handlers::authz::authorize,
        handlers::authz::matching_resources,
        handlers::host::host_trusted,
        handlers::refresh::refresh,
        handlers::health::health_check,
    ),
    components(
        schemas(
            models::DecisionResponse,
            models::ResourcesResponse,
            models::RefreshResponse,
            models::RefreshFailureEntry,
            models::HealthResponse,
            models::ProviderHealth,
            error::ApiErrorResponse,
            error::ErrorDetail,
        )
    ),
    modifiers(&BasicAuthScheme),
    tags(
        (name = "decisions", description = "Authentication, authorization and host trust"),
        (name = "admin", description = "Provider refresh"),
        (name = "health", description = "Health check endpoints"),
    ),
    info(
        title = "Warden API",
        description = "Access decisions over HTTP",
    ),
)]
pub struct ApiDoc;

/// Create the main API router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/auth", get(handlers::auth::authenticate))
        .route(
            "/authz/user/:user/:action",
            get(handlers::authz::authorize_root),
        )
        .route(
            "/authz/user/:user/:action/*resource",
            get(handlers::authz::authorize),
        )
        .route(
            "/authz/resources/:user/:action/:regex",
            get(handlers::authz::matching_resources),
        )
        .route("/host/:host/trusted", get(handlers::host::host_trusted))
        .route("/refresh", post(handlers::refresh::refresh))
        .route("/health", get(handlers::health::health_check))
        .merge(SwaggerUi::new("/swagger").url("/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn(middleware_hooks::request_middleware))
                .layer(middleware::from_fn(middleware_hooks::response_middleware)),
        )
        .with_state(state)
}
