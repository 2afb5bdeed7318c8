//! Allow-list compilation and matching.
//!
//! Two independent sets: whole domains (`example.com`) and exact addresses
//! (`someone@elsewhere.org`). A subject passes when either matches.
//! Matching is exact; no case folding or subdomain expansion.

use std::collections::HashSet;

use crate::error::{MobimapError, Result};

/// Compiled allow-list.
#[derive(Debug, Clone, Default)]
pub struct AllowList {
    domains: HashSet<String>,
    emails: HashSet<String>,
}

impl AllowList {
    /// Build from already-trusted entries (no validation).
    pub(crate) fn new<D, E>(domains: D, emails: E) -> Self
    where
        D: IntoIterator,
        D::Item: Into<String>,
        E: IntoIterator,
        E::Item: Into<String>,
    {
        Self {
            domains: domains.into_iter().map(Into::into).collect(),
            emails: emails.into_iter().map(Into::into).collect(),
        }
    }

    /// Validate raw config entries and build the allow-list.
    pub fn compile(domains: &[String], emails: &[String]) -> Result<Self> {
        for d in domains {
            if d.is_empty() || d.contains('@') || d.chars().any(char::is_whitespace) {
                return Err(MobimapError::BadRequest(format!(
                    "invalid allowed_domains entry: {d:?} (expected bare domain)"
                )));
            }
        }
        for e in emails {
            if email_domain(e).map_or(true, str::is_empty) || e.chars().any(char::is_whitespace) {
                return Err(MobimapError::BadRequest(format!(
                    "invalid allowed_emails entry: {e:?} (expected user@domain)"
                )));
            }
        }
        Ok(Self::new(domains.iter().cloned(), emails.iter().cloned()))
    }

    /// True when the domain or the exact address is listed.
    pub fn is_allowed(&self, email: &str) -> bool {
        if self.emails.contains(email) {
            return true;
        }
        email_domain(email).is_some_and(|d| self.domains.contains(d))
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty() && self.emails.is_empty()
    }
}

/// Text between the first and second `@`, if any.
pub fn email_domain(email: &str) -> Option<&str> {
    email.split('@').nth(1)
}
