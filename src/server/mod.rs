//! HTTP Server
//!
//! axum router exposing the gateway, plus a serve loop with graceful
//! shutdown.

pub mod error;
pub mod routes;

pub use error::ApiError;
pub use routes::{CallToolResponse, StatusResponse, MISSING_TASK_MESSAGE};

use axum::routing::{get, post};
use axum::Router;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::Result;
use crate::gateway::Gateway;

pub(crate) type AppState = Arc<Gateway>;

/// Build the gateway router
pub fn router(gateway: Arc<Gateway>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(routes::health))
        .route("/reset", get(routes::reset))
        .route("/get_tool", get(routes::list_tools))
        .route("/get_tool/:agent", get(routes::agent_tools))
        .route("/call_tool/:tool", post(routes::call_tool))
        .route("/callback/:task_id", get(routes::callback))
        .route("/cancel/:task_id", get(routes::cancel))
        .route("/task/:task_id", get(routes::task))
        .with_state(gateway)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Serve on an already-bound listener until `shutdown` resolves
pub async fn serve_on<F>(listener: TcpListener, gateway: Arc<Gateway>, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    tracing::info!(%addr, "Gateway listening");

    axum::serve(listener, router(gateway))
        .with_graceful_shutdown(shutdown)
        .await?;

    tracing::info!("HTTP server stopped");
    Ok(())
}

/// Bind `addr` and serve until `shutdown` resolves
pub async fn serve<F>(addr: &str, gateway: Arc<Gateway>, shutdown: F) -> Result<SocketAddr>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(addr).await?;
    let local = listener.local_addr()?;
    serve_on(listener, gateway, shutdown).await?;
    Ok(local)
}
