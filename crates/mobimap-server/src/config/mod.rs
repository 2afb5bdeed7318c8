//! Server config loader (strict parsing).

pub mod schema;

use std::fs;

use mobimap_core::error::{MobimapError, Result};

pub use schema::{AuthSection, DefaultsSection, ServerConfig, ServerSection, StorageSection};

/// Environment variable naming the config file.
pub const CONFIG_PATH_ENV: &str = "MOBIMAP_CONFIG";
/// Config file used when `MOBIMAP_CONFIG` is unset.
pub const DEFAULT_CONFIG_PATH: &str = "mobimap.yaml";

pub fn load_from_file(path: &str) -> Result<ServerConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| MobimapError::Internal(format!("read config failed ({path}): {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<ServerConfig> {
    let cfg: ServerConfig = serde_yaml::from_str(s)
        .map_err(|e| MobimapError::BadRequest(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Read the process-wide default map document referenced by `defaults.config_path`.
pub fn load_default_document(path: &str) -> Result<serde_json::Value> {
    let s = fs::read_to_string(path)
        .map_err(|e| MobimapError::Internal(format!("read default config failed ({path}): {e}")))?;
    serde_json::from_str(&s)
        .map_err(|e| MobimapError::BadRequest(format!("default config is not json ({path}): {e}")))
}
