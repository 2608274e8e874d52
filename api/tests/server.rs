//! The server over a real socket, where peer addresses come from the
//! connection.

use api::{bind, spawn_server, ApiConfig, AppState};
use authz::{
    AuthChain, AuthorizationResolver, DecisionService, HostTrustResolver, MemoryPolicy,
    PolicySnapshot, RefreshRegistry,
};
use std::sync::Arc;

async fn start(snapshot: PolicySnapshot) -> String {
    let policy = Arc::new(MemoryPolicy::new(snapshot));
    let service = DecisionService::new(
        AuthChain::default(),
        AuthorizationResolver::new(policy.clone(), policy.clone()),
        HostTrustResolver::new(policy),
        RefreshRegistry::new(),
    );

    let listener = bind(&ApiConfig::new().with_port(0)).await.unwrap();
    let addr = listener.local_addr().unwrap();
    spawn_server(listener, AppState::new(service));
    format!("http://{}", addr)
}

#[tokio::test]
async fn refresh_from_trusted_loopback() {
    let base = start(PolicySnapshot::new().with_host("127.0.0.1", true)).await;
    let response = reqwest::Client::new()
        .post(format!("{}/refresh", base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert!(response.headers().contains_key("x-warden-version"));
}

#[tokio::test]
async fn refresh_from_untrusted_loopback() {
    let base = start(PolicySnapshot::new()).await;
    let response = reqwest::Client::new()
        .post(format!("{}/refresh", base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::FORBIDDEN);
}
