//! Shared helpers for edge-server integration tests.

#![allow(dead_code)]

use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use bytes::{BufMut, Bytes, BytesMut};
use edge_config::Config;
use edge_core::io::DatagramSocket;
use edge_proto::{DecodeError, SessionHeader, TargetHost, Transport};
use edge_server::{
    DatagramConnector, DialError, DialTarget, Dialer, DohClient, ServerState, UdpConnector,
};
use futures_util::future::BoxFuture;
use tokio::io::DuplexStream;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;

pub const PEER: &str = "198.51.100.7:50000";

pub fn peer() -> SocketAddr {
    PEER.parse().unwrap()
}

/// Config with a loopback listener plus `extra` TOML sections.
pub fn test_config(extra: &str) -> Config {
    let doc = format!("[server]\nlisten = \"127.0.0.1:0\"\n{extra}");
    toml::from_str(&doc).unwrap()
}

// ============================================================================
// Header encoding used by the tests
// ============================================================================

/// `"<tcp|udp> <host> <port>\n"` followed by the initial payload.
pub fn encode_header(transport: &str, host: &str, port: u16, payload: &[u8]) -> Bytes {
    let mut buf = BytesMut::new();
    buf.put_slice(format!("{transport} {host} {port}\n").as_bytes());
    buf.put_slice(payload);
    buf.freeze()
}

pub fn decode_header(first: Bytes) -> Result<SessionHeader, DecodeError> {
    let newline = first
        .iter()
        .position(|b| *b == b'\n')
        .ok_or_else(|| DecodeError::Invalid("missing newline".into()))?;
    let line = std::str::from_utf8(&first[..newline])
        .map_err(|_| DecodeError::Invalid("header is not utf-8".into()))?;
    let mut parts = line.split(' ');
    let transport = match parts.next() {
        Some("tcp") => Transport::Tcp,
        Some("udp") => Transport::Udp,
        _ => return Err(DecodeError::Invalid("unknown transport".into())),
    };
    let host = TargetHost::parse(parts.next().unwrap_or(""))?;
    let port = parts
        .next()
        .and_then(|p| p.parse::<u16>().ok())
        .ok_or_else(|| DecodeError::Invalid("bad port".into()))?;
    SessionHeader::new(0, transport, host, port, first.slice(newline + 1..))
}

// ============================================================================
// Mock dialer
// ============================================================================

/// Dialer that only reaches the listed authorities and records every attempt.
///
/// Each successful dial hands the far end of an in-memory pipe to the test.
pub struct MockDialer {
    reachable: Vec<String>,
    attempts: Arc<Mutex<Vec<DialTarget>>>,
    remotes: mpsc::UnboundedSender<(DialTarget, DuplexStream)>,
}

pub struct DialLog {
    pub attempts: Arc<Mutex<Vec<DialTarget>>>,
    pub remotes: mpsc::UnboundedReceiver<(DialTarget, DuplexStream)>,
}

impl DialLog {
    pub fn attempted(&self) -> Vec<String> {
        self.attempts
            .lock()
            .unwrap()
            .iter()
            .map(|t| t.authority())
            .collect()
    }
}

impl MockDialer {
    pub fn new(reachable: &[&str]) -> (Self, DialLog) {
        let attempts = Arc::new(Mutex::new(Vec::new()));
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                reachable: reachable.iter().map(|s| s.to_string()).collect(),
                attempts: attempts.clone(),
                remotes: tx,
            },
            DialLog {
                attempts,
                remotes: rx,
            },
        )
    }
}

impl Dialer for MockDialer {
    type Stream = DuplexStream;

    fn dial<'a>(&'a self, target: &'a DialTarget) -> BoxFuture<'a, Result<Self::Stream, DialError>> {
        Box::pin(async move {
            self.attempts.lock().unwrap().push(target.clone());
            let authority = target.authority();
            if !self.reachable.contains(&authority) {
                return Err(DialError::Connect {
                    target: authority,
                    source: io::Error::from(io::ErrorKind::ConnectionRefused),
                });
            }
            let (local, remote) = tokio::io::duplex(64 * 1024);
            let _ = self.remotes.send((target.clone(), remote));
            Ok(local)
        })
    }
}

// ============================================================================
// Datagram connectors
// ============================================================================

/// Connector whose sockets can never be opened.
#[derive(Default, Clone)]
pub struct FailingConnector {
    pub calls: Arc<AtomicUsize>,
}

impl DatagramConnector for FailingConnector {
    type Socket = UdpSocket;

    fn connect(&self, _peer: SocketAddr) -> BoxFuture<'_, io::Result<Self::Socket>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Box::pin(async { Err(io::Error::from(io::ErrorKind::ConnectionRefused)) })
    }
}

/// How the sockets of a [`BrokenSendConnector`] fail the first send.
#[derive(Debug, Clone, Copy)]
pub enum SendFault {
    /// The send returns an error.
    Error,
    /// The send reports one byte fewer than requested.
    Short,
}

/// Connector whose sockets open fine but cannot deliver a query.
#[derive(Clone)]
pub struct BrokenSendConnector {
    fault: SendFault,
    pub calls: Arc<AtomicUsize>,
}

impl BrokenSendConnector {
    pub fn new(fault: SendFault) -> Self {
        Self {
            fault,
            calls: Arc::default(),
        }
    }
}

pub struct BrokenSendSocket {
    fault: SendFault,
}

impl DatagramSocket for BrokenSendSocket {
    fn send_datagram<'a>(&'a self, data: &'a [u8]) -> BoxFuture<'a, io::Result<usize>> {
        let fault = self.fault;
        Box::pin(async move {
            match fault {
                SendFault::Error => Err(io::Error::from(io::ErrorKind::ConnectionRefused)),
                SendFault::Short => Ok(data.len().saturating_sub(1)),
            }
        })
    }

    fn recv_datagram<'a>(&'a self, _buf: &'a mut [u8]) -> BoxFuture<'a, io::Result<usize>> {
        Box::pin(futures_util::future::pending::<io::Result<usize>>())
    }
}

impl DatagramConnector for BrokenSendConnector {
    type Socket = BrokenSendSocket;

    fn connect(&self, _peer: SocketAddr) -> BoxFuture<'_, io::Result<Self::Socket>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let fault = self.fault;
        Box::pin(async move { Ok(BrokenSendSocket { fault }) })
    }
}

pub fn state_with<U: DatagramConnector>(
    config: &Config,
    dialer: MockDialer,
    datagram: U,
) -> Arc<ServerState<MockDialer, U>> {
    let mut state = ServerState::with_connectors(config, dialer, datagram).unwrap();
    // Keep the loopback DoH mock reachable regardless of proxy settings in the environment.
    let client = reqwest::Client::builder().no_proxy().build().unwrap();
    state.doh = DohClient::with_client(client, config.dns.doh_url.clone());
    Arc::new(state)
}

pub fn udp_state(config: &Config, dialer: MockDialer) -> Arc<ServerState<MockDialer, UdpConnector>> {
    state_with(config, dialer, UdpConnector)
}
