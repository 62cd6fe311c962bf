//! # Server Module
//!
//! - [`server`]: [`ServerCore`], the async watermarking service
//! - [`routes`]: HTTP transport built on axum
//! - [`metrics`]: Request counters reported by the health endpoint

pub mod metrics;
pub mod routes;
pub mod server;

pub use metrics::ServerMetrics;
pub use routes::router;
pub use server::ServerCore;
