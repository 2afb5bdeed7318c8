//! Axum router wiring.
//!
//! All config routes live under `/api`; `/metrics` sits beside them.

use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderName, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::{app_state::AppState, config::ServerSection, http::handlers};

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.cfg().server.body_limit_bytes;
    let cors = build_cors_layer(&state.cfg().server);

    Router::new()
        .route("/api", get(handlers::api_root))
        .route("/api/default", get(handlers::default_config))
        .route("/api/default/:email", get(handlers::user_config))
        .route("/api/save/:email", post(handlers::save_config))
        .route("/api/auth", get(handlers::whoami))
        .route("/metrics", get(handlers::metrics))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .with_state(state)
}

/// CORS layer from `server.cors_allow_origin` (`*` or one exact origin).
fn build_cors_layer(server: &ServerSection) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::ORIGIN,
            HeaderName::from_static("x-requested-with"),
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::AUTHORIZATION,
        ])
        .max_age(Duration::from_secs(3600));

    let origin = server.cors_allow_origin.trim();
    if origin == "*" {
        return layer.allow_origin(Any);
    }
    match HeaderValue::from_str(origin) {
        Ok(value) => layer.allow_origin(value),
        Err(_) => {
            // validate() rejects this at load time; only hand-built configs reach here
            tracing::warn!(origin, "invalid CORS origin, cross-origin requests will be refused");
            layer
        }
    }
}
