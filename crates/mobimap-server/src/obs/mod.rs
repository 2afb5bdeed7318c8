//! Lightweight in-process metrics (dependency-free).
//!
//! Counters and latency histograms are stored as atomics and rendered in the
//! Prometheus text format by the `/metrics` handler.

pub mod metrics;

pub use metrics::ServerMetrics;
