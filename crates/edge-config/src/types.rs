//! Configuration type definitions.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::defaults::*;
use crate::relay::{RelayTarget, parse_relay_list};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub relay: RelayConfig,
    #[serde(default)]
    pub dns: DnsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address for the WebSocket endpoint, e.g. 0.0.0.0:8080.
    pub listen: String,
    /// Request path accepted for the WebSocket upgrade.
    #[serde(default = "default_ws_path")]
    pub ws_path: String,
    /// Largest WebSocket frame/message accepted from a client.
    #[serde(default = "default_ws_max_frame_bytes")]
    pub max_frame_bytes: usize,
    /// Time allowed for the session header to arrive.
    #[serde(default = "default_header_timeout_secs")]
    pub header_timeout_secs: u64,
    /// Outbound connect timeout (0 = none beyond the OS one).
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Time to wait for active sessions on shutdown.
    #[serde(default = "default_shutdown_timeout_secs")]
    pub shutdown_timeout_secs: u64,
    /// Buffer size for upstream reads (bytes).
    #[serde(default = "default_relay_buffer_size")]
    pub relay_buffer_size: usize,
    /// Disable Nagle's algorithm on outbound TCP.
    #[serde(default = "default_tcp_no_delay")]
    pub tcp_no_delay: bool,
    /// TCP socket send buffer size (SO_SNDBUF). If 0, uses OS default.
    #[serde(default = "default_tcp_send_buffer")]
    pub tcp_send_buffer: usize,
    /// TCP socket receive buffer size (SO_RCVBUF). If 0, uses OS default.
    #[serde(default = "default_tcp_recv_buffer")]
    pub tcp_recv_buffer: usize,
    /// TCP listener backlog (pending connections queue size).
    #[serde(default = "default_connection_backlog")]
    pub connection_backlog: u32,
}

/// Relay fallback list.
///
/// `targets` keeps the compact form, e.g.
/// `"relay.example.net, 10.0.0.9:8443, [2001:db8::1]@cdn.example.com"`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelayConfig {
    #[serde(default)]
    pub targets: String,
}

impl RelayConfig {
    /// Parse `targets`, dropping malformed entries with a warning.
    pub fn parsed_targets(&self) -> Vec<RelayTarget> {
        parse_relay_list(&self.targets)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DnsConfig {
    /// Resolver for the datagram fast path (ip:port).
    #[serde(default = "default_dns_resolver")]
    pub resolver: String,
    /// DNS-over-HTTPS endpoint used when the fast path is unavailable.
    #[serde(default = "default_doh_url")]
    pub doh_url: String,
}

impl Default for DnsConfig {
    fn default() -> Self {
        Self {
            resolver: default_dns_resolver(),
            doh_url: default_doh_url(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    pub level: Option<String>,
    /// Log format: json, pretty, or compact. Default: pretty.
    pub format: Option<String>,
    /// Output target: stdout or stderr. Default: stderr.
    pub output: Option<String>,
    /// Per-module log level filters (e.g., {"edge_server": "debug", "reqwest": "warn"}).
    #[serde(default)]
    pub filters: HashMap<String, String>,
}
