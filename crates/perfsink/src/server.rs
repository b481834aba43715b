//! HTTP surface for the run store.
//!
//! There is no routing: every request, whatever its method or path, is a
//! submission and its body is the payload. The caller never learns whether the
//! payload was stored. Both outcomes answer with an empty `200 OK`, and only a
//! failed write turns into an empty `500`.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Router,
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::storage::RunStore;

/// Build the router serving `store`.
pub fn router(store: Arc<RunStore>, max_body_bytes: usize) -> Router {
    Router::new()
        .fallback(ingest)
        .with_state(store)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http())
}

/// Hand a request body to the store.
async fn ingest(State(store): State<Arc<RunStore>>, body: Bytes) -> Response {
    let result = tokio::task::spawn_blocking(move || store.ingest(&body)).await;

    match result {
        Ok(Ok(_)) => StatusCode::OK.into_response(),
        Ok(Err(err)) => {
            error!("Failed to store performance run: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
        Err(err) => {
            error!("Ingest task failed: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Bind the configured address and serve until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the run directory cannot be prepared, the address is
/// invalid or cannot be bound, or the server fails.
pub async fn serve(config: &Config) -> Result<()> {
    let addr = config.bind_addr()?;
    let store = Arc::new(RunStore::open(&config.storage)?);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| Error::ServerBind { addr, source })?;

    serve_on(listener, store, config.server.max_body_bytes, shutdown_signal()).await
}

/// Serve on an already bound listener until `shutdown` resolves.
///
/// # Errors
///
/// Returns an error if the server fails.
pub async fn serve_on(
    listener: TcpListener,
    store: Arc<RunStore>,
    max_body_bytes: usize,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let addr: SocketAddr = listener.local_addr()?;
    info!(
        "perfsink listening on {addr}, writing runs to {}",
        store.dir().display()
    );

    axum::serve(listener, router(store, max_body_bytes))
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("perfsink stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
