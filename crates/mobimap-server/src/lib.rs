//! mobimap server library entry.
//!
//! Wires the config loader, user store, config service, credential policy and
//! HTTP routes into one axum application. Consumed by the binary (`main.rs`)
//! and by integration tests.

pub mod app_state;
pub mod config;
pub mod http;
pub mod obs;
pub mod router;
pub mod service;
pub mod store;
