//! Shared error type across mobimap crates.

use thiserror::Error;

/// Client-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    /// Invalid input / malformed request.
    BadRequest,
    /// Credential was the anonymous placeholder.
    SentinelCredential,
    /// Credential could not be decoded.
    MalformedCredential,
    /// Caller is not permitted to act on the addressed user.
    Forbidden,
    /// Backing storage failed.
    StorageUnavailable,
    /// Unsupported config version.
    UnsupportedVersion,
    /// Internal server error.
    Internal,
}

impl ClientCode {
    /// String representation used in JSON responses.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::BadRequest => "BAD_REQUEST",
            ClientCode::SentinelCredential => "SENTINEL_CREDENTIAL",
            ClientCode::MalformedCredential => "MALFORMED_CREDENTIAL",
            ClientCode::Forbidden => "FORBIDDEN",
            ClientCode::StorageUnavailable => "STORAGE_UNAVAILABLE",
            ClientCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ClientCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, MobimapError>;

/// Unified error type used by core and server.
#[derive(Debug, Error)]
pub enum MobimapError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("not a real token")]
    SentinelCredential,
    #[error("malformed credential: {0}")]
    MalformedCredential(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("internal: {0}")]
    Internal(String),
}

impl MobimapError {
    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            MobimapError::BadRequest(_) => ClientCode::BadRequest,
            MobimapError::SentinelCredential => ClientCode::SentinelCredential,
            MobimapError::MalformedCredential(_) => ClientCode::MalformedCredential,
            MobimapError::Forbidden(_) => ClientCode::Forbidden,
            MobimapError::StorageUnavailable(_) => ClientCode::StorageUnavailable,
            MobimapError::UnsupportedVersion => ClientCode::UnsupportedVersion,
            MobimapError::Internal(_) => ClientCode::Internal,
        }
    }

    /// Wrap an I/O failure on the storage backend.
    pub fn storage(context: impl std::fmt::Display, err: impl std::fmt::Display) -> Self {
        MobimapError::StorageUnavailable(format!("{context}: {err}"))
    }
}
