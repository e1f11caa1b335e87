//! Database models and storage.

pub mod health;
#[cfg(test)]
pub mod memory;
pub mod projections;
pub mod samples;
pub mod store;
