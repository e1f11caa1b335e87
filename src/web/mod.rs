//! Read-side HTTP API.

pub mod error;
pub mod populations;
pub mod routes;
pub mod status;

pub use routes::*;
