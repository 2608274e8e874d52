use axum::Router;
use std::future::Future;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::{create_router, AppState};

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Address to bind
    pub host: String,
    /// Port to listen on
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3030,
        }
    }
}

impl ApiConfig {
    /// Create a new API configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

pub async fn bind(config: &ApiConfig) -> std::io::Result<TcpListener> {
    TcpListener::bind(config.address()).await
}

/// Serves on `listener` until `shutdown` resolves.
///
/// Connections carry their peer address so the refresh route can check it.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app: Router = create_router(state);
    let addr = listener.local_addr()?;

    info!("API server listening on {}", addr);
    info!("Swagger UI available at http://{}/swagger", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await?;

    info!("API server stopped");
    Ok(())
}

/// Start the API server, stopping on `shutdown`
pub async fn start_server<F>(
    state: AppState,
    config: ApiConfig,
    shutdown: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = bind(&config).await?;
    serve(listener, state, shutdown).await
}

/// Start the API server in a background task on an already bound listener
pub fn spawn_server(listener: TcpListener, state: AppState) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = serve(listener, state, std::future::pending()).await {
            error!("API server error: {}", e);
        }
    })
}
