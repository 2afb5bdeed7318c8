use std::net::SocketAddr;

use axum::http::HeaderValue;
use serde::Deserialize;
use mobimap_core::error::{MobimapError, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    pub version: u32,

    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub storage: StorageSection,

    #[serde(default)]
    pub defaults: DefaultsSection,

    pub auth: AuthSection,
}

impl ServerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(MobimapError::UnsupportedVersion);
        }

        self.server.validate()?;
        self.storage.validate()?;
        self.auth.validate()?;

        Ok(())
    }

    /// Replace the port of `server.listen` (the `PORT` env override).
    pub fn override_port(&mut self, port: &str) -> Result<()> {
        let port: u16 = port
            .trim()
            .parse()
            .map_err(|_| MobimapError::BadRequest(format!("PORT must be a u16, got {port:?}")))?;
        let mut addr = self.server.listen_addr()?;
        addr.set_port(port);
        self.server.listen = addr.to_string();
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_listen")]
    pub listen: String,

    #[serde(default = "default_body_limit_bytes")]
    pub body_limit_bytes: usize,

    #[serde(default = "default_cors_allow_origin")]
    pub cors_allow_origin: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            body_limit_bytes: default_body_limit_bytes(),
            cors_allow_origin: default_cors_allow_origin(),
        }
    }
}

impl ServerSection {
    pub fn validate(&self) -> Result<()> {
        self.listen_addr()?;
        if !(1024..=1024 * 1024 * 1024).contains(&self.body_limit_bytes) {
            return Err(MobimapError::BadRequest(
                "server.body_limit_bytes must be between 1024 and 1073741824".into(),
            ));
        }
        if self.cors_allow_origin.trim().is_empty() {
            return Err(MobimapError::BadRequest(
                "server.cors_allow_origin must not be empty".into(),
            ));
        }
        if self.cors_allow_origin.trim() != "*"
            && HeaderValue::from_str(self.cors_allow_origin.trim()).is_err()
        {
            return Err(MobimapError::BadRequest(format!(
                "server.cors_allow_origin is not a header value: {:?}",
                self.cors_allow_origin
            )));
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.listen.parse().map_err(|_| {
            MobimapError::BadRequest(format!(
                "server.listen must be a valid SocketAddr, got {:?}",
                self.listen
            ))
        })
    }
}

fn default_listen() -> String {
    "0.0.0.0:5000".into()
}
fn default_body_limit_bytes() -> usize {
    // 250 MiB
    250 * 1024 * 1024
}
fn default_cors_allow_origin() -> String {
    "*".into()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorageSection {
    #[serde(default = "default_storage_root")]
    pub root: String,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            root: default_storage_root(),
        }
    }
}

impl StorageSection {
    pub fn validate(&self) -> Result<()> {
        if self.root.trim().is_empty() {
            return Err(MobimapError::BadRequest("storage.root must not be empty".into()));
        }
        Ok(())
    }
}

fn default_storage_root() -> String {
    "./public/users".into()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DefaultsSection {
    #[serde(default = "default_config_path")]
    pub config_path: String,
}

impl Default for DefaultsSection {
    fn default() -> Self {
        Self {
            config_path: default_config_path(),
        }
    }
}

fn default_config_path() -> String {
    "./public/config.json".into()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthSection {
    pub issuer: String,

    #[serde(default)]
    pub allowed_domains: Vec<String>,

    #[serde(default)]
    pub allowed_emails: Vec<String>,

    /// When true, saving requires a Bearer token whose validated email matches
    /// the path email. Off by default: the save route is unauthenticated.
    #[serde(default)]
    pub require_token_for_save: bool,
}

impl AuthSection {
    pub fn validate(&self) -> Result<()> {
        if self.issuer.trim().is_empty() {
            return Err(MobimapError::BadRequest("auth.issuer must not be empty".into()));
        }
        Ok(())
    }
}
