//! HTTP server lifecycle: bind, spawn the axum task, hand back a handle
//! with a shutdown channel.

use std::net::SocketAddr;

use serde::Serialize;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::api::router::verification_router;
use crate::api::types::ApiContext;

/// Session metadata for a running server.
#[derive(Debug, Clone, Serialize)]
pub struct ServerSession {
    pub session_id: String,
    pub server_addr: String,
    pub port: u16,
    pub started_at: String,
}

/// Handle to a running verification server.
pub struct VerificationServer {
    pub session: ServerSession,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl VerificationServer {
    pub fn url(&self) -> String {
        format!("http://{}/", self.session.server_addr)
    }

    /// Send the shutdown signal. In-flight requests are allowed to finish.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
            tracing::info!("Verification server shutdown signal sent");
        }
    }

    /// Shut down and wait for the server task to exit.
    pub async fn stop(mut self) {
        self.shutdown();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::error!("Verification server task failed: {e}");
            }
        }
    }
}

/// Start the verification server on `addr`.
///
/// Port 0 binds an ephemeral port; the chosen address is in the returned
/// session.
pub async fn start_server(ctx: ApiContext, addr: SocketAddr) -> Result<VerificationServer, String> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| format!("Failed to bind verification server on {addr}: {e}"))?;

    let addr = listener
        .local_addr()
        .map_err(|e| format!("Failed to get server address: {e}"))?;

    let app = verification_router(ctx);

    let session = ServerSession {
        session_id: Uuid::new_v4().to_string(),
        server_addr: addr.to_string(),
        port: addr.port(),
        started_at: chrono::Utc::now().to_rfc3339(),
    };

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        let shutdown_signal = async move {
            let _ = shutdown_rx.await;
            tracing::info!("Verification server received shutdown signal");
        };

        tracing::info!(%addr, "Verification server started");

        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await
        {
            tracing::error!("Verification server error: {e}");
        }

        tracing::info!("Verification server stopped");
    });

    Ok(VerificationServer {
        session,
        shutdown_tx: Some(shutdown_tx),
        task: Some(task),
    })
}
