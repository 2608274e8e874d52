use axum::{extract::State, Json};
use chrono::Utc;
use tracing::debug;

use crate::{
    models::{HealthResponse, ProviderHealth},
    AppState,
};

/// Health check endpoint
///
/// GET /health
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    debug!("Health check requested");

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: crate::VERSION.to_string(),
        timestamp: Utc::now(),
        providers: ProviderHealth {
            authentication: state
                .decision
                .authentication()
                .provider_names()
                .into_iter()
                .map(String::from)
                .collect(),
            refreshable: state.decision.refreshable_count(),
        },
    })
}
