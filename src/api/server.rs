//! HTTP server

use super::routes::{ApiState, router};
use crate::config::ServerConfig;
use crate::service::DirectoryService;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};

/// Serve the API until Ctrl+C or SIGTERM is received
pub async fn serve(service: Arc<DirectoryService>, config: &ServerConfig) -> anyhow::Result<()> {
    let bind: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let app = router(ApiState::new(service, &config.principal_header));

    let listener = TcpListener::bind(bind).await?;
    info!("Directory API listening on http://{}", listener.local_addr()?);
    info!("Press Ctrl+C to stop the server");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Directory API stopped");
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    let terminate = async {
        let mut stream = signal::unix::signal(signal::unix::SignalKind::terminate())?;
        stream.recv().await;
        Ok::<(), io::Error>(())
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<io::Result<()>>();

    wait_for_signal(signal::ctrl_c(), terminate).await;
}

/// Resolve on whichever signal arrives first
///
/// A handler that cannot be installed never resolves, so the other one
/// still stops the server.
async fn wait_for_signal(
    ctrl_c: impl Future<Output = io::Result<()>>,
    terminate: impl Future<Output = io::Result<()>>,
) {
    let ctrl_c = async {
        if let Err(e) = ctrl_c.await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };
    let terminate = async {
        if let Err(e) = terminate.await {
            error!(error = %e, "Failed to install terminate signal handler");
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        },
        () = terminate => {
            info!("Received terminate signal, initiating graceful shutdown");
        },
    }
}
