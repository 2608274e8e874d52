use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Response,
    Json,
};

use crate::{
    error::{ApiErrorResponse, ApiResult},
    models::{DecisionResponse, ResourcesResponse},
    AppState,
};

/// Check whether a user may perform an action on the root resource
///
/// GET /authz/user/{user}/{action}
#[utoipa::path(
    get,
    path = "/authz/user/{user}/{action}",
    params(
        ("user" = String, Path, description = "User name"),
        ("action" = String, Path, description = "Action name, case-sensitive")
    ),
    responses(
        (status = 200, description = "Allowed", body = DecisionResponse),
        (status = 403, description = "Denied", body = DecisionResponse),
        (status = 400, description = "Malformed request", body = ApiErrorResponse),
        (status = 503, description = "Policy backend unavailable", body = ApiErrorResponse)
    ),
    tag = "decisions"
)]
pub async fn authorize_root(
    State(state): State<AppState>,
    Path((user, action)): Path<(String, String)>,
) -> ApiResult<Response> {
    let allowed = state.decision.is_authorized(&user, &action, "/").await?;
    Ok(DecisionResponse::respond(allowed, StatusCode::FORBIDDEN))
}

/// Check whether a user may perform an action on a resource
///
/// GET /authz/user/{user}/{action}/{resource}
#[utoipa::path(
    get,
    path = "/authz/user/{user}/{action}/{resource}",
    params(
        ("user" = String, Path, description = "User name"),
        ("action" = String, Path, description = "Action name, case-sensitive"),
        ("resource" = String, Path, description = "Resource path; may span several segments")
    ),
    responses(
        (status = 200, description = "Allowed", body = DecisionResponse),
        (status = 403, description = "Denied", body = DecisionResponse),
        (status = 400, description = "Malformed request", body = ApiErrorResponse),
        (status = 503, description = "Policy backend unavailable", body = ApiErrorResponse)
    ),
    tag = "decisions"
)]
pub async fn authorize(
    State(state): State<AppState>,
    Path((user, action, resource)): Path<(String, String, String)>,
) -> ApiResult<Response> {
    // The wildcard capture drops the leading slash.
    let resource = format!("/{}", resource);
    let allowed = state
        .decision
        .is_authorized(&user, &action, &resource)
        .await?;
    Ok(DecisionResponse::respond(allowed, StatusCode::FORBIDDEN))
}

/// List the resources matching a regular expression that a user may act on
///
/// GET /authz/resources/{user}/{action}/{regex}
#[utoipa::path(
    get,
    path = "/authz/resources/{user}/{action}/{regex}",
    params(
        ("user" = String, Path, description = "User name"),
        ("action" = String, Path, description = "Action name, case-sensitive"),
        ("regex" = String, Path, description = "Percent-encoded pattern matched against whole paths")
    ),
    responses(
        (status = 200, description = "Authorized matching resources", body = ResourcesResponse),
        (status = 400, description = "Invalid pattern or empty user", body = ApiErrorResponse),
        (status = 503, description = "Policy backend unavailable", body = ApiErrorResponse)
    ),
    tag = "decisions"
)]
pub async fn matching_resources(
    State(state): State<AppState>,
    Path((user, action, pattern)): Path<(String, String, String)>,
) -> ApiResult<Json<ResourcesResponse>> {
    let matches = state
        .decision
        .matching_resources(&user, &action, &pattern)
        .await?;
    let resources = matches
        .collect()
        .await?
        .into_iter()
        .map(String::from)
        .collect();

    Ok(Json(ResourcesResponse { resources }))
}
