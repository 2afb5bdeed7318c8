//! JSON test vector loader for credential policy tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::Deserialize;

use mobimap_core::auth::{AllowList, PolicyValidator};

#[derive(Debug, Deserialize)]
pub struct TokenVector {
    pub description: String,
    pub now_ms: u64,
    pub policy: PolicyData,
    pub credential: CredentialData,
    pub expect: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub struct PolicyData {
    pub issuer: String,
    #[serde(default)]
    pub allowed_domains: Vec<String>,
    #[serde(default)]
    pub allowed_emails: Vec<String>,
}

impl PolicyData {
    pub fn validator(&self) -> PolicyValidator {
        let allow = AllowList::compile(&self.allowed_domains, &self.allowed_emails)
            .expect("invalid allow-list in test vector");
        PolicyValidator::new(self.issuer.clone(), allow)
    }
}

#[derive(Debug, Deserialize)]
pub struct CredentialData {
    pub encoding: String,
    pub data: serde_json::Value,
}

impl CredentialData {
    /// `raw`: data is the credential string. `claims`: data is a payload object
    /// wrapped into an unsigned `header.payload.signature` token.
    pub fn build(&self) -> String {
        match self.encoding.as_str() {
            "raw" => self.data.as_str().expect("raw credential must be a string").to_string(),
            "claims" => {
                let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"RS256","typ":"JWT"}"#);
                let payload = URL_SAFE_NO_PAD.encode(self.data.to_string());
                format!("{header}.{payload}.c2lnbmF0dXJl")
            }
            other => panic!("unsupported encoding: {other}"),
        }
    }
}
