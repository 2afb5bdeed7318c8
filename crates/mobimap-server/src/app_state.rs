//! Shared application state for the mobimap server.
//!
//! Everything here is built once at startup and shared read-only: the parsed
//! config, the compiled credential policy, the config service (store + default
//! document), and the metrics registry.

use std::sync::Arc;

use serde_json::Value;

use mobimap_core::auth::{AllowList, PolicyValidator};
use mobimap_core::error::Result;

use crate::config::{self, ServerConfig};
use crate::obs::ServerMetrics;
use crate::service::ConfigService;
use crate::store::{FsUserStore, UserStore};

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cfg: ServerConfig,
    validator: PolicyValidator,
    service: ConfigService,
    metrics: Arc<ServerMetrics>,
}

impl AppState {
    /// Build application state around an already-open store.
    /// Returns Result so main can handle errors gracefully (no panic).
    pub fn new(cfg: ServerConfig, store: Arc<dyn UserStore>, default_config: Value) -> Result<Self> {
        let allow = AllowList::compile(&cfg.auth.allowed_domains, &cfg.auth.allowed_emails)?;
        let validator = PolicyValidator::new(cfg.auth.issuer.clone(), allow);
        if validator.allow_list().is_empty() {
            tracing::warn!(issuer = validator.issuer(), "auth allow-list is empty; every credential will be refused");
        }

        if !cfg.auth.require_token_for_save {
            tracing::warn!("save route accepts any caller (auth.require_token_for_save = false)");
        }

        let metrics = Arc::new(ServerMetrics::default());
        let service = ConfigService::new(store, Arc::new(default_config), Arc::clone(&metrics));

        Ok(Self {
            inner: Arc::new(AppStateInner {
                cfg,
                validator,
                service,
                metrics,
            }),
        })
    }

    /// Open the filesystem store and read the default document named by the config.
    pub async fn from_config(cfg: ServerConfig) -> Result<Self> {
        let default_config = config::load_default_document(&cfg.defaults.config_path)?;
        let store = FsUserStore::open(&cfg.storage.root).await?;
        tracing::info!(root = %store.root().display(), "user store ready");
        Self::new(cfg, Arc::new(store), default_config)
    }

    pub fn cfg(&self) -> &ServerConfig {
        &self.inner.cfg
    }

    pub fn validator(&self) -> &PolicyValidator {
        &self.inner.validator
    }

    pub fn service(&self) -> &ConfigService {
        &self.inner.service
    }

    pub fn metrics(&self) -> &ServerMetrics {
        &self.inner.metrics
    }
}
