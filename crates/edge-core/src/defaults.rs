//! Default configuration values.
//!
//! Centralized default constants for use across all crates.

// ============================================================================
// Timeout Defaults
// ============================================================================

/// Time allowed for the first duplex message (the session header), in seconds.
pub const DEFAULT_HEADER_TIMEOUT_SECS: u64 = 10;
/// Outbound connect timeout in seconds (0 = no timeout beyond the OS one).
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 0;
/// Default graceful shutdown timeout in seconds.
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 30;

// ============================================================================
// Buffer/Size Defaults
// ============================================================================

/// Default relay buffer size (32 KiB).
pub const DEFAULT_RELAY_BUFFER_SIZE: usize = 32768;
/// Default TCP socket send buffer size (0 = OS default).
pub const DEFAULT_TCP_SEND_BUFFER: usize = 0;
/// Default TCP socket receive buffer size (0 = OS default).
pub const DEFAULT_TCP_RECV_BUFFER: usize = 0;
/// Default TCP listener backlog.
pub const DEFAULT_CONNECTION_BACKLOG: u32 = 1024;

// ============================================================================
// TCP Socket Defaults
// ============================================================================

/// Default TCP_NODELAY (disable Nagle's algorithm for lower latency).
pub const DEFAULT_TCP_NO_DELAY: bool = true;

// ============================================================================
// WebSocket Defaults
// ============================================================================

/// Default WebSocket path.
pub const DEFAULT_WS_PATH: &str = "/";
/// Default max WebSocket frame size.
pub const DEFAULT_WS_MAX_FRAME_BYTES: usize = 1 << 20;

// ============================================================================
// Relay / DNS Defaults
// ============================================================================

/// Port used for relay entries that omit one.
pub const DEFAULT_RELAY_PORT: u16 = 443;
/// Resolver used by the DNS fast path.
pub const DEFAULT_DNS_RESOLVER: &str = "8.8.4.4:53";
/// DNS-over-HTTPS endpoint used when the fast path is unavailable.
pub const DEFAULT_DOH_URL: &str = "https://1.1.1.1/dns-query";
/// Media type of DNS wire-format bodies (RFC 8484).
pub const DNS_MESSAGE_CONTENT_TYPE: &str = "application/dns-message";
