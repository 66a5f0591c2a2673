//! Error class constants for logging.
//!
//! These constants provide consistent error classification across all crates.

/// Protocol/header error.
pub const ERROR_PROTOCOL: &str = "protocol";
/// I/O error.
pub const ERROR_IO: &str = "io";
/// A single outbound dial failed.
pub const ERROR_DIAL: &str = "dial";
/// Every dial candidate failed.
pub const ERROR_UNREACHABLE: &str = "unreachable";
/// Upstream closed before replying.
pub const ERROR_EMPTY_UPSTREAM: &str = "empty_upstream";
/// Requested transport is not supported.
pub const ERROR_UNSUPPORTED: &str = "unsupported";
/// Tunneled DNS query failed.
pub const ERROR_DNS_FALLBACK: &str = "dns_fallback";
/// Timeout error.
pub const ERROR_TIMEOUT: &str = "timeout";
/// Configuration error.
pub const ERROR_CONFIG: &str = "config";
