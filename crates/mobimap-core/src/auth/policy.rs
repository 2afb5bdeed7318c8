//! Credential policy: expiry, issuer, and allow-list checks.
//!
//! Each check is an independent pure function returning an optional failure.
//! `PolicyValidator::validate` runs all of them (no short-circuit) in the fixed
//! order expiry, issuer, allow-list, so the reason list is deterministic.
//! The only short-circuit is the placeholder credential, handled in `check_token`.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::auth::allowlist::AllowList;
use crate::auth::token::{decode_credential, UnverifiedClaims};
use crate::error::MobimapError;

/// One reason a credential was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    NotARealToken,
    MalformedToken,
    Expired,
    IssuerIncorrect,
    EmailNotAllowed,
}

impl AuthFailure {
    /// Reason string as rendered in `AuthResult.errors`.
    pub fn as_str(self) -> &'static str {
        match self {
            AuthFailure::NotARealToken => "not a real token",
            AuthFailure::MalformedToken => "malformed token",
            AuthFailure::Expired => "expired",
            AuthFailure::IssuerIncorrect => "iss incorrect",
            AuthFailure::EmailNotAllowed => "email not allowed",
        }
    }
}

/// Outcome of credential validation.
///
/// Serializes as `{"email": ...}` or `{"errors": [...]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AuthResult {
    Allowed { email: String },
    Denied { errors: Vec<String> },
}

impl AuthResult {
    pub fn denied(reasons: impl IntoIterator<Item = AuthFailure>) -> Self {
        AuthResult::Denied {
            errors: reasons.into_iter().map(|r| r.as_str().to_string()).collect(),
        }
    }

    pub fn email(&self) -> Option<&str> {
        match self {
            AuthResult::Allowed { email } => Some(email),
            AuthResult::Denied { .. } => None,
        }
    }

    pub fn errors(&self) -> &[String] {
        match self {
            AuthResult::Allowed { .. } => &[],
            AuthResult::Denied { errors } => errors,
        }
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, AuthResult::Allowed { .. })
    }
}

/// Current wall-clock time in Unix milliseconds.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Fails when `exp` is absent or `now_ms` is past `exp` seconds.
pub fn check_expired(exp: Option<f64>, now_ms: u64) -> Option<AuthFailure> {
    match exp {
        Some(exp) if (now_ms as f64) <= exp * 1000.0 => None,
        _ => Some(AuthFailure::Expired),
    }
}

/// Fails unless `iss` equals the expected issuer exactly.
pub fn check_issuer(iss: Option<&str>, expected: &str) -> Option<AuthFailure> {
    match iss {
        Some(iss) if iss == expected => None,
        _ => Some(AuthFailure::IssuerIncorrect),
    }
}

/// Fails unless the subject's domain or exact address is allow-listed.
pub fn check_email(email: Option<&str>, allow: &AllowList) -> Option<AuthFailure> {
    match email {
        Some(email) if allow.is_allowed(email) => None,
        _ => Some(AuthFailure::EmailNotAllowed),
    }
}

/// Expected issuer plus allow-list, compiled once at startup and shared.
#[derive(Debug, Clone)]
pub struct PolicyValidator {
    issuer: String,
    allow: AllowList,
}

impl PolicyValidator {
    pub fn new(issuer: impl Into<String>, allow: AllowList) -> Self {
        Self {
            issuer: issuer.into(),
            allow,
        }
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn allow_list(&self) -> &AllowList {
        &self.allow
    }

    /// Run every check against decoded claims and collect the failures.
    pub fn validate(&self, claims: &UnverifiedClaims, now_ms: u64) -> AuthResult {
        let reasons: Vec<AuthFailure> = [
            check_expired(claims.exp, now_ms),
            check_issuer(claims.iss.as_deref(), &self.issuer),
            check_email(claims.email.as_deref(), &self.allow),
        ]
        .into_iter()
        .flatten()
        .collect();

        if !reasons.is_empty() {
            return AuthResult::denied(reasons);
        }
        match &claims.email {
            Some(email) => AuthResult::Allowed {
                email: email.clone(),
            },
            // unreachable in practice: check_email fails on a missing subject
            None => AuthResult::denied([AuthFailure::EmailNotAllowed]),
        }
    }

    /// Decode and validate a raw credential. Never returns an error: decode
    /// failures become a single-reason `Denied`.
    pub fn check_token(&self, credential: &str, now_ms: u64) -> AuthResult {
        match decode_credential(credential) {
            Ok(claims) => {
                let result = self.validate(&claims, now_ms);
                if let AuthResult::Denied { errors } = &result {
                    tracing::debug!(email = ?claims.email, ?errors, "credential refused by policy");
                }
                result
            }
            Err(MobimapError::SentinelCredential) => {
                tracing::debug!("placeholder credential presented");
                AuthResult::denied([AuthFailure::NotARealToken])
            }
            Err(e) => {
                tracing::debug!(error = %e, "credential could not be decoded");
                AuthResult::denied([AuthFailure::MalformedToken])
            }
        }
    }

    /// `check_token` against the wall clock.
    pub fn check_token_now(&self, credential: &str) -> AuthResult {
        self.check_token(credential, now_ms())
    }
}
