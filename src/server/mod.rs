//! Static file server.
//!
//! Serves the site's document root with per-extension `Content-Type` and
//! `Cache-Control` headers, a custom 404 page, and strict confinement to
//! the root:
//!
//! - [`assets`] - extension table (MIME type and cache lifetime)
//! - [`resolve`] - lexical request path resolution
//! - [`state`] - immutable state shared by all requests
//! - [`handler`] - the request handler itself
//!
//! Every request runs under a timeout and is traced through `tower-http`.

pub mod assets;
pub mod handler;
pub mod resolve;
pub mod state;

use std::future::Future;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tokio::signal::ctrl_c;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::{LarderError, Result};

pub use assets::{AssetTable, AssetType, CacheControl};
pub use handler::{handle, serve_static};
pub use resolve::{resolve, ResolveError, ResolvedPath};
pub use state::ServeState;

/// Build the router: one fallback handler for every path.
pub fn router(state: Arc<ServeState>) -> Router {
    let timeout = state.timeout;

    Router::new()
        .fallback(serve_static)
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve on an already-bound listener until `shutdown` resolves.
pub async fn run<F>(state: Arc<ServeState>, listener: TcpListener, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = router(state);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}

/// Bind the configured address and serve until Ctrl+C or SIGTERM.
pub async fn serve(state: ServeState) -> Result<()> {
    let address = state.address.clone();
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| LarderError::Bind {
            address: address.clone(),
            source,
        })?;

    info!(
        "Serving {} on http://{}",
        state.root.display(),
        listener.local_addr()?
    );

    run(Arc::new(state), listener, shutdown_signal()).await?;

    info!("Server shut down");
    Ok(())
}

/// Resolves on Ctrl+C, or SIGTERM on unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = ctrl_c().await {
            tracing::warn!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::warn!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
