//! Server state shared across sessions.

use std::net::SocketAddr;
use std::time::Duration;

use edge_config::{Config, RelayTarget};

use crate::dial::{DatagramConnector, Dialer, DirectDialer, UdpConnector};
use crate::doh::DohClient;
use crate::error::ServerError;

/// Shared, read-only state for all sessions.
///
/// Built once at startup and handed to every session behind an `Arc`; no
/// session mutates it.
pub struct ServerState<D = DirectDialer, U = UdpConnector> {
    pub dialer: D,
    pub datagram: U,
    pub doh: DohClient,
    /// Alternate endpoints tried after the header's own destination.
    pub relay_targets: Vec<RelayTarget>,
    pub dns_resolver: SocketAddr,
    pub header_timeout: Duration,
    pub relay_buffer_size: usize,
    pub ws_path: String,
    pub max_frame_bytes: usize,
    pub shutdown_timeout: Duration,
}

impl ServerState {
    /// Build the default state: direct TCP dialing and UDP for DNS.
    pub fn from_config(config: &Config) -> Result<Self, ServerError> {
        Self::with_connectors(config, DirectDialer::from_config(&config.server), UdpConnector)
    }
}

impl<D: Dialer, U: DatagramConnector> ServerState<D, U> {
    /// Build the state around custom connectors.
    pub fn with_connectors(config: &Config, dialer: D, datagram: U) -> Result<Self, ServerError> {
        let dns_resolver: SocketAddr = config.dns.resolver.parse().map_err(|_| {
            ServerError::Config(format!("invalid dns.resolver: {}", config.dns.resolver))
        })?;
        Ok(Self {
            dialer,
            datagram,
            doh: DohClient::new(config.dns.doh_url.clone()),
            relay_targets: config.relay.parsed_targets(),
            dns_resolver,
            header_timeout: Duration::from_secs(config.server.header_timeout_secs),
            relay_buffer_size: config.server.relay_buffer_size,
            ws_path: config.server.ws_path.clone(),
            max_frame_bytes: config.server.max_frame_bytes,
            shutdown_timeout: Duration::from_secs(config.server.shutdown_timeout_secs),
        })
    }
}
