//! Config service: effective-config lookup and save on top of a `UserStore`.
//!
//! Lookups never fail: any store problem is logged and answered with the
//! process-wide default document. Save failures are logged and returned.
//!
//! Neither operation checks a credential. The email comes straight from the
//! request path; see `AuthSection::require_token_for_save` for the opt-in guard.

use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;
use tracing::{debug, error, warn};

use mobimap_core::error::Result;

use crate::obs::ServerMetrics;
use crate::store::UserStore;

#[derive(Clone)]
pub struct ConfigService {
    store: Arc<dyn UserStore>,
    default_config: Arc<Value>,
    metrics: Arc<ServerMetrics>,
}

impl ConfigService {
    pub fn new(store: Arc<dyn UserStore>, default_config: Arc<Value>, metrics: Arc<ServerMetrics>) -> Self {
        Self {
            store,
            default_config,
            metrics,
        }
    }

    pub fn default_config(&self) -> Arc<Value> {
        Arc::clone(&self.default_config)
    }

    /// Saved document for `email`, or the default document.
    pub async fn effective_config(&self, email: &str) -> Arc<Value> {
        let started = Instant::now();
        let res = self.store.ensure_user(email).await;
        self.metrics
            .store_op_duration
            .observe(&[("op", "ensure_user")], started.elapsed());

        match res {
            Ok(Some(doc)) => {
                self.metrics.store_ops.inc(&[("op", "ensure_user"), ("result", "ok")]);
                Arc::new(doc)
            }
            Ok(None) => {
                self.metrics.store_ops.inc(&[("op", "ensure_user"), ("result", "created")]);
                self.metrics.config_fallbacks.inc(&[]);
                debug!(email = %email, "no saved config yet, serving default");
                self.default_config()
            }
            Err(e) => {
                self.metrics.store_ops.inc(&[("op", "ensure_user"), ("result", "error")]);
                self.metrics.config_fallbacks.inc(&[]);
                warn!(
                    email = %email,
                    store = self.store.kind(),
                    code = e.client_code().as_str(),
                    error = %e,
                    "config lookup failed, serving default"
                );
                self.default_config()
            }
        }
    }

    /// Replace the saved document for `email`.
    pub async fn save_config(&self, email: &str, doc: &Value) -> Result<()> {
        let started = Instant::now();
        let res = self.store.save(email, doc).await;
        self.metrics
            .store_op_duration
            .observe(&[("op", "save")], started.elapsed());

        match &res {
            Ok(()) => {
                self.metrics.store_ops.inc(&[("op", "save"), ("result", "ok")]);
                debug!(email = %email, "config saved");
            }
            Err(e) => {
                self.metrics.store_ops.inc(&[("op", "save"), ("result", "error")]);
                error!(
                    email = %email,
                    store = self.store.kind(),
                    code = e.client_code().as_str(),
                    error = %e,
                    "config save failed"
                );
            }
        }
        res
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::store::MemoryUserStore;
    use serde_json::json;

    fn service(store: Arc<MemoryUserStore>) -> (ConfigService, Arc<ServerMetrics>) {
        let metrics = Arc::new(ServerMetrics::default());
        let svc = ConfigService::new(store, Arc::new(json!({ "default": true })), Arc::clone(&metrics));
        (svc, metrics)
    }

    #[tokio::test]
    async fn missing_user_gets_default() {
        let store = Arc::new(MemoryUserStore::new());
        let (svc, metrics) = service(Arc::clone(&store));

        assert_eq!(*svc.effective_config("new@x.com").await, json!({ "default": true }));
        assert!(store.contains_user("new@x.com"));
        // second lookup: slot exists but nothing saved
        assert_eq!(*svc.effective_config("new@x.com").await, json!({ "default": true }));
        assert_eq!(metrics.config_fallbacks.get(&[]), 2);
    }

    #[tokio::test]
    async fn save_then_lookup_round_trips() {
        let store = Arc::new(MemoryUserStore::new());
        let (svc, _) = service(store);
        let doc = json!({ "config": { "mapState": { "zoom": 7.5 } }, "datasets": [] });

        svc.save_config("a@x.com", &doc).await.unwrap();
        assert_eq!(*svc.effective_config("a@x.com").await, doc);
    }

    #[tokio::test]
    async fn outage_degrades_reads_and_fails_writes() {
        let store = Arc::new(MemoryUserStore::new());
        let (svc, metrics) = service(Arc::clone(&store));
        svc.save_config("a@x.com", &json!({ "mine": 1 })).await.unwrap();

        store.set_unavailable(true);
        assert_eq!(*svc.effective_config("a@x.com").await, json!({ "default": true }));
        assert!(svc.save_config("a@x.com", &json!({})).await.is_err());
        assert_eq!(metrics.store_ops.get(&[("op", "save"), ("result", "error")]), 1);
    }
}
