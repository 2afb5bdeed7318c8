//! In-process user store with the same slot semantics as `FsUserStore`.
//!
//! Used by tests of the service and HTTP layers. `set_unavailable(true)` makes
//! every operation fail as a storage outage would.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde_json::Value;

use mobimap_core::error::{MobimapError, Result};

use super::{validate_key, UserStore, CONFIG_FILE};

#[derive(Debug, Default)]
pub struct MemoryUserStore {
    // None => slot created, nothing saved yet
    slots: DashMap<String, Option<Value>>,
    unavailable: AtomicBool,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unavailable(&self, down: bool) {
        self.unavailable.store(down, Ordering::Relaxed);
    }

    /// Number of user slots created so far.
    pub fn user_count(&self) -> usize {
        self.slots.len()
    }

    pub fn contains_user(&self, email: &str) -> bool {
        self.slots.contains_key(email)
    }

    fn check_up(&self) -> Result<()> {
        if self.unavailable.load(Ordering::Relaxed) {
            return Err(MobimapError::StorageUnavailable("memory store marked unavailable".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn ensure_user(&self, email: &str) -> Result<Option<Value>> {
        validate_key(email)?;
        self.check_up()?;

        match self.slots.entry(email.to_string()) {
            Entry::Occupied(e) => match e.get() {
                Some(doc) => Ok(Some(doc.clone())),
                None => Err(MobimapError::StorageUnavailable(format!(
                    "{email}/{CONFIG_FILE} not found"
                ))),
            },
            Entry::Vacant(e) => {
                e.insert(None);
                Ok(None)
            }
        }
    }

    async fn save(&self, email: &str, doc: &Value) -> Result<()> {
        validate_key(email)?;
        self.check_up()?;
        self.slots.insert(email.to_string(), Some(doc.clone()));
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "memory"
    }
}
