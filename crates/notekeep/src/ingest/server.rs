//! HTTP server hosting the ingest endpoint.

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{info, warn};

use super::routes::{router, AppState, ADD_NOTE_PATH};
use super::DocumentStore;
use crate::error::Result;

/// Serve the ingest endpoint on `addr` until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails.
pub async fn serve(addr: SocketAddr, store: Arc<dyn DocumentStore>) -> Result<()> {
    let app = router(AppState { store });

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(
        "Ingest endpoint listening on http://{}{}",
        listener.local_addr()?,
        ADD_NOTE_PATH
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Ingest endpoint stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown requested"),
        Err(err) => {
            warn!("Cannot listen for Ctrl-C, serving until killed: {}", err);
            std::future::pending::<()>().await;
        }
    }
}
