//! Users service: verb-keyed dispatcher, configuration, and the HTTP binding.

pub mod app;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod middleware;
