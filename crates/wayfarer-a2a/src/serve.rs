//! Bind and run an agent router in the background

use std::future::Future;
use std::net::SocketAddr;

use anyhow::{Context, Result};
use axum::Router;
use tokio::sync::oneshot;
use tracing::info;

/// Handle to a running server: its bound address and a shutdown trigger
#[derive(Debug)]
pub struct ServeHandle {
    pub addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    join: Option<tokio::task::JoinHandle<std::io::Result<()>>>,
}

impl ServeHandle {
    /// Base URL peers can reach this server at
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Trigger graceful shutdown and wait for the server to stop
    pub async fn shutdown(mut self) -> Result<()> {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        self.wait().await
    }

    /// Run until `signal` resolves, then shut down gracefully
    pub async fn shutdown_on<F>(self, signal: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        signal.await;
        info!("Received shutdown signal");
        self.shutdown().await
    }

    async fn wait(&mut self) -> Result<()> {
        if let Some(join) = self.join.take() {
            join.await.context("Server task panicked")??;
        }
        Ok(())
    }
}

/// Bind `bind` and serve `router` on a spawned task.
///
/// Binding port 0 picks a free port; read it back from [`ServeHandle::addr`].
pub async fn serve(router: Router, bind: &str) -> Result<ServeHandle> {
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {}", bind))?;
    let addr = listener.local_addr()?;
    info!("Listening on http://{}", addr);

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let join = tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
    });

    Ok(ServeHandle {
        addr,
        shutdown_tx: Some(shutdown_tx),
        join: Some(join),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::get;

    #[tokio::test]
    async fn test_serve_picks_free_port() {
        let router = Router::new().route("/ping", get(|| async { "pong" }));
        let handle = serve(router, "127.0.0.1:0").await.unwrap();
        assert_ne!(handle.addr.port(), 0);

        let body = reqwest::get(format!("{}/ping", handle.url()))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert_eq!(body, "pong");

        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_bind_failure_is_reported() {
        let err = serve(Router::new(), "not-an-address").await.unwrap_err();
        assert!(err.to_string().contains("Failed to bind"));
    }
}
