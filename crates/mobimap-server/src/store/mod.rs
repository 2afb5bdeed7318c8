//! Per-user configuration storage.
//!
//! A store maps an email to at most one opaque JSON document. The user's slot
//! is created lazily on first lookup and never deleted; saves replace the
//! whole document.
//!
//! Key rules: the email is used verbatim as a storage key, so it must be a
//! single non-empty path component (no `/`, `\`, NUL, `.` or `..`).

pub mod fs;
pub mod memory;

use async_trait::async_trait;
use serde_json::Value;

use mobimap_core::error::{MobimapError, Result};

pub use fs::FsUserStore;
pub use memory::MemoryUserStore;

/// File holding a user's saved document inside their directory.
pub const CONFIG_FILE: &str = "config.json";

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Get-or-create the user's slot.
    ///
    /// - `Ok(Some(doc))`: the slot existed and held a readable document.
    /// - `Ok(None)`: the slot was just created (or created concurrently).
    /// - `Err(StorageUnavailable)`: the slot exists but its document is
    ///   missing or unreadable, or the backend failed.
    async fn ensure_user(&self, email: &str) -> Result<Option<Value>>;

    /// Replace the user's document, creating the slot if needed.
    async fn save(&self, email: &str, doc: &Value) -> Result<()>;

    /// Backend name for logs and metrics.
    fn kind(&self) -> &'static str;
}

/// Reject emails that cannot be used as a single storage key.
pub fn validate_key(email: &str) -> Result<()> {
    if email.is_empty() || email == "." || email == ".." {
        return Err(MobimapError::BadRequest(format!("invalid user key: {email:?}")));
    }
    if email.chars().any(|c| c == '/' || c == '\\' || c == '\0') {
        return Err(MobimapError::BadRequest(format!(
            "user key must not contain path separators: {email:?}"
        )));
    }
    Ok(())
}
