//! HTTP handlers

pub mod health;
pub mod transfer;

// Glob re-exports carry the `__path_*` items `#[utoipa::path]` generates
pub use health::*;
pub use transfer::*;
