use anyhow::{Context, Result};
use async_trait::async_trait;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{info, trace, warn};

use crate::services::Service;
use crate::state::{AppState, ServiceStatus};
use crate::web::create_router;

/// Serves the query API until shut down.
pub struct WebService {
    port: u16,
    public_origin: Option<String>,
    app_state: AppState,
    handle: Option<JoinHandle<std::io::Result<()>>>,
    shutdown_tx: Option<broadcast::Sender<()>>,
}

impl WebService {
    pub fn new(port: u16, public_origin: Option<String>, app_state: AppState) -> Self {
        Self {
            port,
            public_origin,
            app_state,
            handle: None,
            shutdown_tx: None,
        }
    }
}

#[async_trait]
impl Service for WebService {
    fn name(&self) -> &'static str {
        "web"
    }

    async fn run(&mut self) -> Result<()> {
        if self.handle.is_none() {
            let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
            let listener = TcpListener::bind(addr)
                .await
                .with_context(|| format!("failed to bind {addr}"))?;
            info!(
                address = %addr,
                link = format!("http://localhost:{}", self.port),
                "web server listening"
            );

            let router = create_router(self.app_state.clone(), self.public_origin.as_deref());
            let (shutdown_tx, mut shutdown_rx) = broadcast::channel(1);
            self.shutdown_tx = Some(shutdown_tx);
            self.handle = Some(tokio::spawn(async move {
                axum::serve(listener, router)
                    .with_graceful_shutdown(async move {
                        let _ = shutdown_rx.recv().await;
                        trace!("web server received shutdown signal");
                    })
                    .await
            }));
            self.app_state
                .service_statuses
                .set(self.name(), ServiceStatus::Active);
        }

        let Some(handle) = self.handle.as_mut() else {
            return Ok(());
        };
        let outcome = match handle.await {
            Ok(served) => served.context("web server stopped"),
            Err(e) => Err(anyhow::Error::new(e).context("web server task panicked")),
        };
        self.handle = None;
        if outcome.is_err() {
            self.app_state
                .service_statuses
                .set(self.name(), ServiceStatus::Error);
        }
        outcome
    }

    async fn shutdown(&mut self) -> Result<()> {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            match tokio::time::timeout(Duration::from_secs(5), handle).await {
                Ok(Ok(Ok(()))) => info!("web server stopped"),
                Ok(Ok(Err(e))) => warn!(error = ?e, "web server failed while stopping"),
                Ok(Err(e)) => warn!(error = ?e, "web server task panicked while stopping"),
                Err(_) => warn!("web server did not drain connections within 5s"),
            }
        }
        self.app_state
            .service_statuses
            .set(self.name(), ServiceStatus::Disabled);
        Ok(())
    }
}
