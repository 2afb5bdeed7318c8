//! mobimap core: credential decoding, allow-list policy, and the shared error surface.
//!
//! This crate decides whether a presented bearer credential identifies an
//! allow-listed user. It carries no runtime, filesystem, or transport
//! dependencies so the same rules can back the HTTP server and offline tooling.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! Malformed credentials surface as `MobimapError`/`AuthResult` data so a
//! hostile token can never crash the process.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod auth;
pub mod error;

/// Shared result type.
pub use error::{Result, MobimapError};
