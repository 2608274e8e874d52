use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Response,
};

use crate::{
    error::{ApiErrorResponse, ApiResult},
    models::DecisionResponse,
    AppState,
};

/// Check whether a host is trusted
///
/// GET /host/{host}/trusted
#[utoipa::path(
    get,
    path = "/host/{host}/trusted",
    params(("host" = String, Path, description = "Host identifier, matched exactly")),
    responses(
        (status = 200, description = "Trusted", body = DecisionResponse),
        (status = 403, description = "Untrusted or unknown", body = DecisionResponse),
        (status = 503, description = "Host table unavailable", body = ApiErrorResponse)
    ),
    tag = "decisions"
)]
pub async fn host_trusted(
    State(state): State<AppState>,
    Path(host): Path<String>,
) -> ApiResult<Response> {
    let trusted = state.decision.is_trusted_host(&host).await?;
    Ok(DecisionResponse::respond(trusted, StatusCode::FORBIDDEN))
}
