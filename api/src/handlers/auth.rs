use axum::{
    extract::State,
    http::{header, HeaderMap},
    response::Response,
};
use base64::Engine;

use crate::{
    error::{ApiError, ApiErrorResponse, ApiResult},
    models::DecisionResponse,
    AppState,
};

/// Authenticate the credentials in the `Authorization: Basic` header
///
/// GET /auth
#[utoipa::path(
    get,
    path = "/auth",
    responses(
        (status = 200, description = "Credentials accepted", body = DecisionResponse),
        (status = 401, description = "Missing or rejected credentials", body = DecisionResponse),
        (status = 400, description = "Malformed credentials", body = ApiErrorResponse),
        (status = 503, description = "Last authentication provider unavailable", body = ApiErrorResponse)
    ),
    security(("basic_auth" = [])),
    tag = "decisions"
)]
pub async fn authenticate(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let (username, password) = basic_credentials(&headers)?;
    let allowed = state.decision.authenticate(&username, &password).await?;
    Ok(DecisionResponse::authentication(allowed))
}

/// Splits a `Basic` authorization header into username and password.
///
/// A missing header or another scheme asks the client to authenticate; a
/// header that claims Basic but cannot be decoded is a bad request.
pub fn basic_credentials(headers: &HeaderMap) -> ApiResult<(String, String)> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| ApiError::Unauthenticated("missing credentials".to_string()))?
        .to_str()
        .map_err(|_| ApiError::InvalidArgument("authorization header is not ASCII".to_string()))?;

    let encoded = value
        .strip_prefix("Basic ")
        .ok_or_else(|| ApiError::Unauthenticated("expected Basic credentials".to_string()))?;

    let decoded = base64::engine::general_purpose::STANDARD
        .decode(encoded.trim())
        .map_err(|_| ApiError::InvalidArgument("credentials are not valid base64".to_string()))?;
    let credentials = String::from_utf8(decoded)
        .map_err(|_| ApiError::InvalidArgument("credentials are not valid UTF-8".to_string()))?;

    let (username, password) = credentials
        .split_once(':')
        .ok_or_else(|| ApiError::InvalidArgument("credentials lack a ':' separator".to_string()))?;

    Ok((username.to_string(), password.to_string()))
}
