//! # Actix Middleware Library
//!
//! Middleware shared by the actix services
//!
//! ## Modules
//! - `metrics`: per-route Prometheus request metrics and the `/metrics` handler

pub mod metrics;

pub use metrics::{serve_metrics, HttpMetrics, MetricsMiddleware};
