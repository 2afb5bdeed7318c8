//! Filesystem user store: `<root>/<email>/config.json`.
//!
//! Concurrency: every operation for one email runs under that email's async
//! mutex, so the stat / create / read sequence and saves never interleave
//! inside this process. Separate processes sharing a root are not coordinated
//! (last rename wins).

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::debug;

use mobimap_core::error::{MobimapError, Result};

use super::{validate_key, UserStore, CONFIG_FILE};

const TMP_SUFFIX: &str = ".tmp";

#[derive(Debug)]
pub struct FsUserStore {
    root: PathBuf,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl FsUserStore {
    /// Open a store rooted at `root`, creating the root if missing.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)
            .await
            .map_err(|e| MobimapError::storage(format!("create storage root {}", root.display()), e))?;
        Ok(Self {
            root,
            locks: DashMap::new(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory for one user (after key validation).
    pub fn user_dir(&self, email: &str) -> Result<PathBuf> {
        validate_key(email)?;
        Ok(self.root.join(email))
    }

    fn lock_for(&self, email: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(email.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone()
    }

    // Drop the map entry once no other task holds or waits on this lock.
    fn release(&self, email: &str, lock: Arc<Mutex<()>>) {
        drop(lock);
        self.locks.remove_if(email, |_, l| Arc::strong_count(l) == 1);
    }

    #[cfg(test)]
    fn tracked_locks(&self) -> usize {
        self.locks.len()
    }
}

async fn create_user_dir(dir: &Path) -> Result<()> {
    match fs::create_dir(dir).await {
        Ok(()) => {
            debug!(dir = %dir.display(), "created user directory");
            Ok(())
        }
        // another process got there first
        Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(()),
        Err(e) => Err(MobimapError::storage(format!("create {}", dir.display()), e)),
    }
}

async fn read_config(path: &Path) -> Result<Value> {
    let bytes = fs::read(path)
        .await
        .map_err(|e| MobimapError::storage(format!("read {}", path.display()), e))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| MobimapError::storage(format!("parse {}", path.display()), e))
}

async fn lookup_or_create(dir: &Path) -> Result<Option<Value>> {
    match fs::metadata(dir).await {
        Ok(meta) if meta.is_dir() => read_config(&dir.join(CONFIG_FILE)).await.map(Some),
        Ok(_) => Err(MobimapError::StorageUnavailable(format!(
            "{} exists but is not a directory",
            dir.display()
        ))),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            create_user_dir(dir).await?;
            Ok(None)
        }
        Err(e) => Err(MobimapError::storage(format!("stat {}", dir.display()), e)),
    }
}

// Write to a sibling temp file, then rename over config.json.
async fn replace_config(dir: &Path, body: &[u8]) -> Result<()> {
    fs::create_dir_all(dir)
        .await
        .map_err(|e| MobimapError::storage(format!("create {}", dir.display()), e))?;

    let path = dir.join(CONFIG_FILE);
    let tmp = dir.join(format!("{CONFIG_FILE}{TMP_SUFFIX}"));
    fs::write(&tmp, body)
        .await
        .map_err(|e| MobimapError::storage(format!("write {}", tmp.display()), e))?;
    fs::rename(&tmp, &path)
        .await
        .map_err(|e| MobimapError::storage(format!("replace {}", path.display()), e))?;

    debug!(path = %path.display(), bytes = body.len(), "saved user config");
    Ok(())
}

#[async_trait]
impl UserStore for FsUserStore {
    async fn ensure_user(&self, email: &str) -> Result<Option<Value>> {
        let dir = self.user_dir(email)?;
        let lock = self.lock_for(email);
        let res = {
            let _guard = lock.lock().await;
            lookup_or_create(&dir).await
        };
        self.release(email, lock);
        res
    }

    async fn save(&self, email: &str, doc: &Value) -> Result<()> {
        let dir = self.user_dir(email)?;
        let body = serde_json::to_vec(doc)
            .map_err(|e| MobimapError::Internal(format!("serialize config: {e}")))?;

        let lock = self.lock_for(email);
        let res = {
            let _guard = lock.lock().await;
            replace_config(&dir, &body).await
        };
        self.release(email, lock);
        res
    }

    fn kind(&self) -> &'static str {
        "fs"
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn first_touch_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsUserStore::open(dir.path()).await.unwrap();

        assert_eq!(store.ensure_user("a@x.com").await.unwrap(), None);
        assert!(dir.path().join("a@x.com").is_dir());
        assert!(!dir.path().join("a@x.com").join(CONFIG_FILE).exists());
    }

    #[tokio::test]
    async fn existing_directory_without_config_is_a_read_failure() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsUserStore::open(dir.path()).await.unwrap();
        store.ensure_user("a@x.com").await.unwrap();

        let err = store.ensure_user("a@x.com").await.unwrap_err();
        assert_eq!(err.client_code().as_str(), "STORAGE_UNAVAILABLE");
    }

    #[tokio::test]
    async fn corrupt_config_is_a_read_failure() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsUserStore::open(dir.path()).await.unwrap();
        std::fs::create_dir(dir.path().join("a@x.com")).unwrap();
        std::fs::write(dir.path().join("a@x.com").join(CONFIG_FILE), b"{ not json").unwrap();

        let err = store.ensure_user("a@x.com").await.unwrap_err();
        assert!(err.to_string().contains("parse"), "{err}");
    }

    #[tokio::test]
    async fn save_overwrites_and_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsUserStore::open(dir.path()).await.unwrap();

        store.save("a@x.com", &json!({ "layers": [1, 2, 3] })).await.unwrap();
        store.save("a@x.com", &json!({ "zoom": 4 })).await.unwrap();

        let doc = store.ensure_user("a@x.com").await.unwrap();
        assert_eq!(doc, Some(json!({ "zoom": 4 })));
        assert!(!dir.path().join("a@x.com").join("config.json.tmp").exists());
    }

    #[tokio::test]
    async fn save_creates_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsUserStore::open(dir.path().join("users")).await.unwrap();
        std::fs::remove_dir(dir.path().join("users")).unwrap();

        store.save("a@x.com", &json!({})).await.unwrap();
        assert!(dir.path().join("users").join("a@x.com").join(CONFIG_FILE).is_file());
    }

    #[tokio::test]
    async fn traversal_keys_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsUserStore::open(dir.path().join("users")).await.unwrap();

        let err = store.save("..", &json!({})).await.unwrap_err();
        assert_eq!(err.client_code().as_str(), "BAD_REQUEST");
        assert!(store.ensure_user("../escape").await.is_err());
        assert!(!dir.path().join("escape").exists());
    }

    #[tokio::test]
    async fn write_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsUserStore::open(dir.path()).await.unwrap();
        // a plain file where the user directory should be
        std::fs::write(dir.path().join("a@x.com"), b"").unwrap();

        let err = store.save("a@x.com", &json!({})).await.unwrap_err();
        assert_eq!(err.client_code().as_str(), "STORAGE_UNAVAILABLE");
        let err = store.ensure_user("a@x.com").await.unwrap_err();
        assert!(err.to_string().contains("not a directory"), "{err}");
    }

    #[tokio::test]
    async fn locks_are_dropped_after_use() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsUserStore::open(dir.path()).await.unwrap();

        for i in 0..32 {
            let email = format!("u{i}@x.com");
            store.ensure_user(&email).await.unwrap();
            store.save(&email, &json!({ "i": i })).await.unwrap();
        }
        // failed operations release too
        std::fs::write(dir.path().join("file@x.com"), b"").unwrap();
        assert!(store.save("file@x.com", &json!({})).await.is_err());
        assert_eq!(store.tracked_locks(), 0);

        let same = (0..16).map(|_| store.ensure_user("busy@x.com"));
        futures_util::future::join_all(same).await;
        assert_eq!(store.tracked_locks(), 0);

        // a waiter keeps the entry alive until it is done
        let lock = store.lock_for("held@x.com");
        let guard = lock.lock().await;
        assert_eq!(store.tracked_locks(), 1);
        drop(guard);
        store.release("held@x.com", lock);
        assert_eq!(store.tracked_locks(), 0);
    }
}
