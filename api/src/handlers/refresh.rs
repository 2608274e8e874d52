use axum::{
    extract::{ConnectInfo, State},
    Json,
};
use std::net::SocketAddr;
use tracing::{info, warn};

use crate::{
    error::{ApiError, ApiErrorResponse, ApiResult},
    models::RefreshResponse,
    AppState,
};

/// Reload every refreshable provider
///
/// POST /refresh
///
/// Only peers whose IP address is a trusted host may trigger a refresh.
#[utoipa::path(
    post,
    path = "/refresh",
    responses(
        (status = 200, description = "Refresh ran; failures are listed per provider", body = RefreshResponse),
        (status = 403, description = "Peer is not a trusted host", body = ApiErrorResponse)
    ),
    tag = "admin"
)]
pub async fn refresh(
    State(state): State<AppState>,
    peer: Option<ConnectInfo<SocketAddr>>,
) -> ApiResult<Json<RefreshResponse>> {
    let Some(ConnectInfo(addr)) = peer else {
        warn!("Refresh requested without a peer address");
        return Err(ApiError::Forbidden("peer address unknown".to_string()));
    };

    // IPv4 peers on a dual-stack listener arrive as `::ffff:a.b.c.d`.
    let peer = addr.ip().to_canonical().to_string();
    if !state.decision.is_trusted_host(&peer).await? {
        warn!(peer = %peer, "Refresh refused for untrusted peer");
        return Err(ApiError::Forbidden(format!("{} is not a trusted host", peer)));
    }

    info!(peer = %peer, "Refresh requested");
    let report = state.decision.refresh_all().await;
    Ok(Json(report.into()))
}
