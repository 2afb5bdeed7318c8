//! Bearer credential decoding (unverified).
//!
//! Parsing rules:
//! - A credential containing `"default"` is the anonymous placeholder and is
//!   rejected before any parsing happens.
//! - Otherwise the credential is split on `.` and the second segment is decoded
//!   as base64url JSON. The signature segment is ignored entirely.
//! - Every structural problem becomes `MobimapError::MalformedCredential`.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde_json::{Map, Value};

use crate::error::{MobimapError, Result};

/// Substring that marks the anonymous placeholder credential.
pub const SENTINEL_MARKER: &str = "default";
/// Primary claim holding the subject email.
pub const EMAIL_CLAIM: &str = "email";
/// Claim used by the alternate identity provider when `email` is absent.
pub const FALLBACK_EMAIL_CLAIM: &str = "signInNames.emailAddress";

/// Claims read from a credential whose signature was NOT verified.
#[derive(Debug, Clone, PartialEq)]
pub struct UnverifiedClaims {
    /// Expiry in Unix seconds (may be fractional).
    pub exp: Option<f64>,
    /// Issuer.
    pub iss: Option<String>,
    /// Subject email (primary claim, then fallback claim).
    pub email: Option<String>,
}

impl UnverifiedClaims {
    /// Extract the well-known claims from a decoded payload object.
    pub fn from_map(raw: &Map<String, Value>) -> Self {
        let exp = raw.get("exp").and_then(numeric_claim);
        let iss = raw.get("iss").and_then(Value::as_str).map(str::to_owned);
        let email = raw
            .get(EMAIL_CLAIM)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .or_else(|| raw.get(FALLBACK_EMAIL_CLAIM).and_then(Value::as_str))
            .map(str::to_owned);

        Self { exp, iss, email }
    }
}

// Numeric strings are accepted; anything else counts as absent.
fn numeric_claim(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

/// True when the credential is the anonymous placeholder.
pub fn is_sentinel(credential: &str) -> bool {
    credential.contains(SENTINEL_MARKER)
}

/// Decode a bearer credential into claims without verifying its signature.
pub fn decode_credential(credential: &str) -> Result<UnverifiedClaims> {
    if is_sentinel(credential) {
        return Err(MobimapError::SentinelCredential);
    }

    let payload = credential
        .split('.')
        .nth(1)
        .ok_or_else(|| MobimapError::MalformedCredential("missing payload segment".into()))?;
    if payload.is_empty() {
        return Err(MobimapError::MalformedCredential("empty payload segment".into()));
    }

    // Tolerate padded and standard-alphabet encodings.
    let normalized: String = payload
        .trim_end_matches('=')
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect();

    let bytes = URL_SAFE_NO_PAD
        .decode(normalized.as_bytes())
        .map_err(|e| MobimapError::MalformedCredential(format!("payload is not base64url: {e}")))?;

    let value: Value = serde_json::from_slice(&bytes)
        .map_err(|e| MobimapError::MalformedCredential(format!("payload is not json: {e}")))?;

    match value {
        Value::Object(map) => Ok(UnverifiedClaims::from_map(&map)),
        _ => Err(MobimapError::MalformedCredential("payload is not a json object".into())),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use serde_json::json;

    fn token(payload: &Value) -> String {
        let body = URL_SAFE_NO_PAD.encode(payload.to_string());
        format!("eyJhbGciOiJSUzI1NiJ9.{body}.c2ln")
    }

    #[test]
    fn sentinel_skips_parsing() {
        let err = decode_credential("default-token").unwrap_err();
        assert!(matches!(err, MobimapError::SentinelCredential));
        // still the sentinel even when the rest would decode fine
        let t = format!("{}default", token(&json!({ "email": "a@x.com" })));
        assert!(matches!(decode_credential(&t), Err(MobimapError::SentinelCredential)));
    }

    #[test]
    fn reads_fallback_email_claim() {
        let claims = decode_credential(&token(&json!({
            "exp": 10,
            "iss": "right",
            "signInNames.emailAddress": "b@y.org"
        })))
        .unwrap();
        assert_eq!(claims.email.as_deref(), Some("b@y.org"));
        assert_eq!(claims.exp, Some(10.0));
        assert_eq!(claims.iss.as_deref(), Some("right"));
    }

    #[test]
    fn primary_email_wins_over_fallback() {
        let claims = decode_credential(&token(&json!({
            "email": "a@x.com",
            "signInNames.emailAddress": "b@y.org"
        })))
        .unwrap();
        assert_eq!(claims.email.as_deref(), Some("a@x.com"));
    }

    #[test]
    fn missing_claims_stay_absent() {
        let claims = decode_credential(&token(&json!({ "exp": "soon", "iss": 7 }))).unwrap();
        assert_eq!(claims.exp, None);
        assert_eq!(claims.iss, None);
        assert_eq!(claims.email, None);
    }

    #[test]
    fn empty_primary_email_uses_fallback() {
        let claims = decode_credential(&token(&json!({
            "email": "",
            "signInNames.emailAddress": "b@y.org"
        })))
        .unwrap();
        assert_eq!(claims.email.as_deref(), Some("b@y.org"));
    }

    #[test]
    fn padded_payload_decodes() {
        let body = base64::engine::general_purpose::URL_SAFE.encode(r#"{"iss":"abc"}"#);
        assert!(body.ends_with('='));
        let claims = decode_credential(&format!("h.{body}.s")).unwrap();
        assert_eq!(claims.iss.as_deref(), Some("abc"));
    }

    #[test]
    fn structural_failures_are_malformed() {
        for bad in ["", "no-dots", "h..s", "h.!!!.s", "h.bm90IGpzb24.s", "h.WzEsMl0.s"] {
            let err = decode_credential(bad).unwrap_err();
            assert!(
                matches!(err, MobimapError::MalformedCredential(_)),
                "credential={bad:?} err={err}"
            );
        }
    }
}
