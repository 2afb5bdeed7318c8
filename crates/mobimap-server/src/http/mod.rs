//! HTTP surface (axum handlers).
//!
//! Every route answers 200 with JSON; failures are reported in the body
//! (`{"message": ...}` for saves, `{"errors": [...]}` for credential checks).

pub mod handlers;

use axum::http::{header::AUTHORIZATION, HeaderMap};

/// Token from `Authorization: Bearer <token>`, if present.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let raw = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = raw.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_parsing() {
        let mut h = HeaderMap::new();
        assert_eq!(bearer_token(&h), None);

        h.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(bearer_token(&h), Some("abc.def.ghi"));

        h.insert(AUTHORIZATION, HeaderValue::from_static("bearer   tok "));
        assert_eq!(bearer_token(&h), Some("tok"));

        h.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwdw=="));
        assert_eq!(bearer_token(&h), None);

        h.insert(AUTHORIZATION, HeaderValue::from_static("Bearer"));
        assert_eq!(bearer_token(&h), None);
    }
}
