//! Top-level facade crate for mobimap.
//!
//! Re-exports the core auth types and the server library so users can depend on a single crate.

pub mod core {
    pub use mobimap_core::*;
}

pub mod server {
    pub use mobimap_server::*;
}
