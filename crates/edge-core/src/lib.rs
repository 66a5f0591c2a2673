//! Core types and primitives shared across edge-tunnel crates.
//!
//! This crate provides:
//! - Default configuration values
//! - Error class constants for logging
//! - The duplex session abstraction and its transports
//! - The first-reply bridge used by every established session

pub mod defaults;
pub mod errors;
pub mod io;
pub mod transport;

// Re-export commonly used items at crate root
pub use defaults::*;
pub use errors::*;

/// Project name.
pub const PROJECT_NAME: &str = "edge-tunnel";
/// Project version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
