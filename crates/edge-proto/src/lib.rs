//! Session header model for edge-tunnel.
//!
//! The header is produced by an embedder-supplied [`HeaderDecoder`] from the
//! first duplex message and consumed by the relay. This crate only models the
//! decoded result and the fixed response preamble; the wire format and its
//! authentication live with the decoder.

use std::fmt;
use std::net::{IpAddr, Ipv6Addr};
use std::str::FromStr;

use bytes::Bytes;

/// Port that marks a UDP session as a DNS query.
pub const DNS_PORT: u16 = 53;
/// Length of the response preamble.
pub const RESPONSE_PREFIX_LEN: usize = 2;
/// Largest DNS message; the wire format caps lengths at 16 bits.
pub const MAX_DNS_MESSAGE_LEN: usize = u16::MAX as usize;

/// Errors raised while turning the first duplex message into a header.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("invalid header: {0}")]
    Invalid(String),
    #[error("unauthorized client")]
    Unauthorized,
    #[error("empty target host")]
    EmptyHost,
    #[error("invalid target host: {0}")]
    InvalidHost(String),
    #[error("invalid target port 0")]
    InvalidPort,
}

/// Transport requested by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transport {
    Tcp,
    Udp,
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transport::Tcp => f.write_str("tcp"),
            Transport::Udp => f.write_str("udp"),
        }
    }
}

/// Target host: a domain name or a literal IP address.
///
/// A domain is kept verbatim so that the name the client asked for is the
/// name that gets dialed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TargetHost {
    Domain(String),
    Ip(IpAddr),
}

impl TargetHost {
    /// Parse a host string. Bracketed IPv6 (`[::1]`) is accepted.
    pub fn parse(host: &str) -> Result<Self, DecodeError> {
        let host = host.trim();
        if host.is_empty() {
            return Err(DecodeError::EmptyHost);
        }
        if let Some(inner) = host.strip_prefix('[').and_then(|h| h.strip_suffix(']')) {
            return inner
                .parse::<Ipv6Addr>()
                .map(|ip| TargetHost::Ip(IpAddr::V6(ip)))
                .map_err(|_| DecodeError::InvalidHost(host.to_string()));
        }
        if let Ok(ip) = host.parse::<IpAddr>() {
            return Ok(TargetHost::Ip(ip));
        }
        if host
            .bytes()
            .any(|b| b.is_ascii_whitespace() || matches!(b, b'/' | b'[' | b']' | b'@' | b':'))
        {
            return Err(DecodeError::InvalidHost(host.to_string()));
        }
        Ok(TargetHost::Domain(host.to_string()))
    }

    #[inline]
    pub fn is_domain(&self) -> bool {
        matches!(self, TargetHost::Domain(_))
    }

    /// Render `host:port`, bracketing IPv6 literals.
    pub fn authority(&self, port: u16) -> String {
        match self {
            TargetHost::Ip(IpAddr::V6(ip)) => format!("[{ip}]:{port}"),
            other => format!("{other}:{port}"),
        }
    }
}

impl fmt::Display for TargetHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetHost::Domain(d) => f.write_str(d),
            TargetHost::Ip(ip) => write!(f, "{ip}"),
        }
    }
}

impl FromStr for TargetHost {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TargetHost::parse(s)
    }
}

/// Decoded session header.
///
/// Immutable once built; owned by the session that received it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionHeader {
    version: u8,
    transport: Transport,
    host: TargetHost,
    port: u16,
    initial_payload: Bytes,
}

impl SessionHeader {
    pub fn new(
        version: u8,
        transport: Transport,
        host: TargetHost,
        port: u16,
        initial_payload: Bytes,
    ) -> Result<Self, DecodeError> {
        if port == 0 {
            return Err(DecodeError::InvalidPort);
        }
        Ok(Self {
            version,
            transport,
            host,
            port,
            initial_payload,
        })
    }

    #[inline]
    pub fn version(&self) -> u8 {
        self.version
    }

    #[inline]
    pub fn transport(&self) -> Transport {
        self.transport
    }

    #[inline]
    pub fn host(&self) -> &TargetHost {
        &self.host
    }

    #[inline]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Application bytes that arrived together with the header.
    #[inline]
    pub fn initial_payload(&self) -> &Bytes {
        &self.initial_payload
    }

    /// UDP to port 53: the only UDP flavour that is relayed.
    #[inline]
    pub fn is_dns(&self) -> bool {
        self.transport == Transport::Udp && self.port == DNS_PORT
    }

    /// `host:port` label for logs.
    pub fn target_label(&self) -> String {
        self.host.authority(self.port)
    }
}

/// Preamble placed in front of the first reply of every session.
///
/// The protocol version byte followed by a zero-length addon block.
#[inline]
pub fn response_prefix(version: u8) -> [u8; RESPONSE_PREFIX_LEN] {
    [version, 0]
}

/// Turns the first duplex message into a session header.
///
/// Implementations own the wire format and client authentication.
pub trait HeaderDecoder: Send + Sync + 'static {
    fn decode(&self, first: Bytes) -> Result<SessionHeader, DecodeError>;
}

impl<F> HeaderDecoder for F
where
    F: Fn(Bytes) -> Result<SessionHeader, DecodeError> + Send + Sync + 'static,
{
    fn decode(&self, first: Bytes) -> Result<SessionHeader, DecodeError> {
        self(first)
    }
}
