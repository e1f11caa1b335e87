use futures::future::select_all;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

use crate::services::{Service, ServiceResult};
use crate::utils::fmt_duration;

/// Owns registered services, runs each in its own task, and stops them together.
pub struct ServiceManager {
    registered: HashMap<String, Box<dyn Service>>,
    running: HashMap<String, JoinHandle<ServiceResult>>,
    shutdown_tx: broadcast::Sender<()>,
}

impl Default for ServiceManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceManager {
    pub fn new() -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            registered: HashMap::new(),
            running: HashMap::new(),
            shutdown_tx,
        }
    }

    pub fn register_service(&mut self, name: &str, service: Box<dyn Service>) {
        self.registered.insert(name.to_string(), service);
    }

    pub fn has_services(&self) -> bool {
        !self.registered.is_empty() || !self.running.is_empty()
    }

    /// Spawn every registered service.
    pub fn spawn_all(&mut self) {
        for (name, service) in self.registered.drain() {
            let shutdown_rx = self.shutdown_tx.subscribe();
            let handle = tokio::spawn(run_service(service, shutdown_rx));
            debug!(service = name, "Service spawned");
            self.running.insert(name, handle);
        }
        info!(services = ?self.running.keys().collect::<Vec<_>>(), "All services spawned");
    }

    /// Wait for the first service to stop on its own.
    ///
    /// Never resolves while no services are running.
    pub async fn run(&mut self) -> (String, ServiceResult) {
        if self.running.is_empty() {
            return std::future::pending().await;
        }

        let names: Vec<String> = self.running.keys().cloned().collect();
        let (result, index, _) = select_all(self.running.values_mut()).await;
        let name = names[index].clone();
        self.running.remove(&name);

        let result = result.unwrap_or_else(|e| {
            ServiceResult::Error(anyhow::anyhow!("service task panicked: {e}"))
        });
        (name, result)
    }

    /// Signal every running service to stop and wait up to `timeout` for all of them.
    ///
    /// Returns the time taken, or the names of services that were still running.
    pub async fn shutdown(&mut self, timeout: Duration) -> Result<Duration, Vec<String>> {
        let start = Instant::now();
        let count = self.running.len();
        info!(services = count, timeout = fmt_duration(timeout), "Shutting down services");
        let _ = self.shutdown_tx.send(());

        let mut pending = Vec::new();
        let deadline = tokio::time::Instant::now() + timeout;
        for (name, mut handle) in self.running.drain() {
            match tokio::time::timeout_at(deadline, &mut handle).await {
                Ok(Ok(ServiceResult::Error(e))) => {
                    error!(service = name, error = ?e, "Service failed during shutdown");
                }
                Ok(Ok(result)) => trace!(service = name, ?result, "Service stopped"),
                Ok(Err(e)) => error!(service = name, error = ?e, "Service task panicked"),
                Err(_) => {
                    warn!(service = name, "Service did not stop in time, aborting");
                    handle.abort();
                    pending.push(name);
                }
            }
        }

        if pending.is_empty() {
            Ok(start.elapsed())
        } else {
            Err(pending)
        }
    }
}

/// Run one service until it stops or shutdown is signalled.
async fn run_service(
    mut service: Box<dyn Service>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> ServiceResult {
    let name = service.name();
    info!(service = name, "Service started");

    let stopped = tokio::select! {
        result = service.run() => Some(result),
        _ = shutdown_rx.recv() => None,
    };

    match stopped {
        Some(Ok(())) => {
            warn!(service = name, "Service completed unexpectedly");
            ServiceResult::NormalCompletion
        }
        Some(Err(e)) => {
            error!(service = name, error = ?e, "Service failed");
            ServiceResult::Error(e)
        }
        None => {
            info!(service = name, "Shutting down service");
            match service.shutdown().await {
                Ok(()) => {
                    info!(service = name, "Service shut down");
                    ServiceResult::GracefulShutdown
                }
                Err(e) => ServiceResult::Error(e),
            }
        }
    }
}
