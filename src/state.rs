//! Application state shared between the web API and the ingestion service.

use dashmap::DashMap;
use serde::Serialize;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;

use crate::ingest::cycle::CycleReport;

/// Health status of a service.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    Starting,
    Active,
    Disabled,
    Error,
}

/// A timestamped status entry for a service.
#[derive(Debug, Clone)]
pub struct StatusEntry {
    pub status: ServiceStatus,
    pub updated_at: Instant,
}

/// Thread-safe registry for services to self-report their health status.
#[derive(Debug, Clone, Default)]
pub struct ServiceStatusRegistry {
    inner: Arc<DashMap<String, StatusEntry>>,
}

impl ServiceStatusRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or updates the status for a named service.
    pub fn set(&self, name: &str, status: ServiceStatus) {
        self.inner.insert(
            name.to_owned(),
            StatusEntry {
                status,
                updated_at: Instant::now(),
            },
        );
    }

    pub fn get(&self, name: &str) -> Option<ServiceStatus> {
        self.inner.get(name).map(|entry| entry.status.clone())
    }

    /// Snapshot of every service with seconds since its last status change.
    pub fn all(&self) -> Vec<(String, ServiceStatus, u64)> {
        self.inner
            .iter()
            .map(|entry| {
                (
                    entry.key().clone(),
                    entry.value().status.clone(),
                    entry.value().updated_at.elapsed().as_secs(),
                )
            })
            .collect()
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub service_statuses: ServiceStatusRegistry,
    /// Most recent ingestion cycle, `None` until one finishes.
    pub last_cycle: watch::Receiver<Option<CycleReport>>,
}

impl AppState {
    pub fn new(
        db_pool: PgPool,
        service_statuses: ServiceStatusRegistry,
        last_cycle: watch::Receiver<Option<CycleReport>>,
    ) -> Self {
        Self {
            db_pool,
            service_statuses,
            last_cycle,
        }
    }
}
