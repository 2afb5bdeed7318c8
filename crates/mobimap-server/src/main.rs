//! mobimap server
//!
//! - Config: `MOBIMAP_CONFIG` (default `mobimap.yaml`), `PORT` overrides the listen port
//! - Routes: /api, /api/default, /api/default/:email, /api/save/:email, /api/auth, /metrics
//! - Graceful shutdown on Ctrl-C / SIGTERM

use std::process::ExitCode;

use tracing_subscriber::{fmt, EnvFilter};

use mobimap_core::error::Result;
use mobimap_server::{app_state, config, router};

#[tokio::main]
async fn main() -> ExitCode {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(code = e.client_code().as_str(), error = %e, "mobimap-server failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let path = std::env::var(config::CONFIG_PATH_ENV)
        .unwrap_or_else(|_| config::DEFAULT_CONFIG_PATH.to_string());
    let mut cfg = config::load_from_file(&path)?;
    if let Ok(port) = std::env::var("PORT") {
        cfg.override_port(&port)?;
    }
    let listen = cfg.server.listen_addr()?;

    let state = app_state::AppState::from_config(cfg).await?;
    let app = router::build_router(state);

    tracing::info!(%listen, config = %path, "mobimap-server starting");
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|e| mobimap_core::MobimapError::Internal(format!("bind {listen} failed: {e}")))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| mobimap_core::MobimapError::Internal(format!("server failed: {e}")))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("signal received, starting graceful shutdown");
}
