pub mod app;
pub mod citydata;
pub mod cli;
pub mod config;
pub mod data;
pub mod ingest;
pub mod logging;
pub mod services;
pub mod state;
pub mod utils;
pub mod web;
pub mod zones;
