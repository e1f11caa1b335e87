//! Long-running services and their supervision.

use anyhow::Result;
use async_trait::async_trait;

pub mod manager;
pub mod signals;
pub mod web;

/// A supervised long-running component.
///
/// `run` returns when the service stops on its own, either because its work
/// is done or because it failed. `shutdown` asks it to stop and waits for its
/// cleanup; it may be called after `run` has been dropped mid-flight.
#[async_trait]
pub trait Service: Send + Sync {
    fn name(&self) -> &'static str;

    async fn run(&mut self) -> Result<()>;

    async fn shutdown(&mut self) -> Result<()>;
}

/// How a supervised service ended.
#[derive(Debug)]
pub enum ServiceResult {
    /// Stopped in response to a shutdown request.
    GracefulShutdown,
    /// `run` returned `Ok` without being asked to stop.
    NormalCompletion,
    Error(anyhow::Error),
}
