//! RemoteProvider against a live local HTTP server.

use authn::RemoteProvider;
use authz::{AuthChain, AuthenticationProvider};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::get;
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

// "alice:pw"
const ALICE: &str = "Basic YWxpY2U6cHc=";

async fn login(headers: HeaderMap) -> StatusCode {
    match headers.get("authorization").and_then(|v| v.to_str().ok()) {
        Some(ALICE) => StatusCode::NO_CONTENT,
        Some(_) => StatusCode::UNAUTHORIZED,
        None => StatusCode::FORBIDDEN,
    }
}

async fn spawn_upstream() -> SocketAddr {
    let app = Router::new()
        .route("/login", get(login))
        .route("/broken", get(|| async { StatusCode::INTERNAL_SERVER_ERROR }))
        .route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(2)).await;
                StatusCode::OK
            }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn provider(addr: SocketAddr, path: &str) -> RemoteProvider {
    RemoteProvider::new(
        "remote",
        format!("http://{}{}", addr, path),
        Duration::from_millis(500),
    )
    .unwrap()
}

#[tokio::test]
async fn accepts_on_success_status() {
    let addr = spawn_upstream().await;
    assert!(provider(addr, "/login").verify("alice", "pw").await.unwrap());
}

#[tokio::test]
async fn rejects_on_unauthorized() {
    let addr = spawn_upstream().await;
    let remote = provider(addr, "/login");
    assert!(!remote.verify("alice", "wrong").await.unwrap());
    assert!(!remote.verify("bob", "pw").await.unwrap());
}

#[tokio::test]
async fn server_error_is_backend_unavailable() {
    let addr = spawn_upstream().await;
    let err = provider(addr, "/broken")
        .verify("alice", "pw")
        .await
        .unwrap_err();
    assert!(err.is_backend_unavailable());
}

#[tokio::test]
async fn timeout_is_backend_unavailable() {
    let addr = spawn_upstream().await;
    let err = provider(addr, "/slow")
        .verify("alice", "pw")
        .await
        .unwrap_err();
    assert!(err.is_backend_unavailable());
}

#[tokio::test]
async fn unreachable_upstream_is_backend_unavailable() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = provider(addr, "/login")
        .verify("alice", "pw")
        .await
        .unwrap_err();
    assert!(err.is_backend_unavailable());
}

#[tokio::test]
async fn chain_falls_back_past_a_down_upstream() {
    let addr = spawn_upstream().await;
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let dead = listener.local_addr().unwrap();
    drop(listener);

    let chain = AuthChain::new(vec![
        Arc::new(provider(dead, "/login")),
        Arc::new(provider(addr, "/login")),
    ]);
    assert!(chain.authenticate("alice", "pw").await.unwrap());
    assert!(!chain.authenticate("alice", "nope").await.unwrap());
}
