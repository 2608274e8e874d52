use authz::RefreshReport;
use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Body of every decision endpoint
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DecisionResponse {
    pub allowed: bool,
}

impl DecisionResponse {
    /// 200 when allowed, otherwise `denied` with the same body.
    pub fn respond(allowed: bool, denied: StatusCode) -> Response {
        let status = if allowed { StatusCode::OK } else { denied };
        (status, Json(DecisionResponse { allowed })).into_response()
    }

    /// Like [`respond`](Self::respond) with 401 and a Basic challenge on
    /// rejection.
    pub fn authentication(allowed: bool) -> Response {
        if allowed {
            return Self::respond(true, StatusCode::UNAUTHORIZED);
        }
        (
            StatusCode::UNAUTHORIZED,
            [(header::WWW_AUTHENTICATE, crate::BASIC_CHALLENGE)],
            Json(DecisionResponse { allowed: false }),
        )
            .into_response()
    }
}

/// Authorized resources matching a pattern, sorted by path
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ResourcesResponse {
    pub resources: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RefreshFailureEntry {
    pub provider: String,
    pub message: String,
}

/// Outcome of a refresh across every refreshable provider
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RefreshResponse {
    pub complete: bool,
    pub refreshed: Vec<String>,
    pub failures: Vec<RefreshFailureEntry>,
}

impl From<RefreshReport> for RefreshResponse {
    fn from(report: RefreshReport) -> Self {
        Self {
            complete: report.is_complete(),
            refreshed: report.refreshed,
            failures: report
                .failures
                .into_iter()
                .map(|f| RefreshFailureEntry {
                    provider: f.provider,
                    message: f.message,
                })
                .collect(),
        }
    }
}

/// Health check response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub providers: ProviderHealth,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProviderHealth {
    /// Authentication providers in the order they are tried
    pub authentication: Vec<String>,
    pub refreshable: usize,
}
