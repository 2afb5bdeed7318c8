//! Credential identification (decode + allow-list policy).
//!
//! The flow is deliberately two-staged:
//! - `token`: structural decode of a bearer credential into `UnverifiedClaims`.
//!   No signature is checked; callers must never treat the claims as authenticated.
//! - `policy`: expiry, issuer, and allow-list checks that turn claims into an
//!   `AuthResult`. Check failures are returned as data and accumulate.

pub mod allowlist;
pub mod policy;
pub mod token;

pub use allowlist::AllowList;
pub use policy::{AuthFailure, AuthResult, PolicyValidator};
pub use token::{decode_credential, UnverifiedClaims};
