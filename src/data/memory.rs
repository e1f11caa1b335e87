//! In-memory [`SampleStore`] for pipeline tests.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex};

use crate::data::samples::{Sample, SampleKey};
use crate::data::store::{SampleSession, SampleStore, StoreError};

#[derive(Default)]
struct Inner {
    rows: BTreeMap<SampleKey, Sample>,
    failing_zones: HashSet<String>,
    commits: usize,
    rollbacks: usize,
}

#[derive(Clone, Default)]
pub struct MemorySampleStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemorySampleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every `add` for this zone fail until the store is dropped.
    pub fn fail_writes_for(&self, zone_id: &str) {
        self.inner
            .lock()
            .unwrap()
            .failing_zones
            .insert(zone_id.to_string());
    }

    pub fn rows(&self) -> Vec<Sample> {
        self.inner.lock().unwrap().rows.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().rows.len()
    }

    pub fn commits(&self) -> usize {
        self.inner.lock().unwrap().commits
    }

    pub fn rollbacks(&self) -> usize {
        self.inner.lock().unwrap().rollbacks
    }
}

#[async_trait]
impl SampleStore for MemorySampleStore {
    async fn begin(&self) -> Result<Box<dyn SampleSession>, StoreError> {
        Ok(Box::new(MemorySession {
            store: self.clone(),
            pending: BTreeMap::new(),
        }))
    }
}

struct MemorySession {
    store: MemorySampleStore,
    pending: BTreeMap<SampleKey, Sample>,
}

#[async_trait]
impl SampleSession for MemorySession {
    async fn exists(&mut self, key: &SampleKey) -> Result<bool, StoreError> {
        if self.pending.contains_key(key) {
            return Ok(true);
        }
        Ok(self.store.inner.lock().unwrap().rows.contains_key(key))
    }

    async fn add(&mut self, sample: &Sample) -> Result<bool, StoreError> {
        let inner = self.store.inner.lock().unwrap();
        if inner.failing_zones.contains(&sample.zone_id) {
            return Err(StoreError::Unavailable(format!(
                "injected write failure for {}",
                sample.zone_id
            )));
        }
        let key = sample.key();
        if inner.rows.contains_key(&key) || self.pending.contains_key(&key) {
            return Ok(false);
        }
        drop(inner);
        self.pending.insert(key, sample.clone());
        Ok(true)
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let mut inner = self.store.inner.lock().unwrap();
        for (key, sample) in self.pending {
            inner.rows.entry(key).or_insert(sample);
        }
        inner.commits += 1;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        self.store.inner.lock().unwrap().rollbacks += 1;
        Ok(())
    }
}
