//! Outbound dialing.
//!
//! A [`DialTarget`] always carries the host exactly as the client or the relay
//! list named it. Name resolution happens inside the connect call and its
//! result never replaces the host, so a domain target keeps its name all the
//! way to the wire.

use std::fmt;
use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;

use edge_config::{RelayTarget, ServerConfig};
use edge_core::io::DatagramSocket;
use edge_proto::{SessionHeader, TargetHost};
use futures_util::future::BoxFuture;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{UdpSocket, lookup_host};
use tracing::trace;

use crate::util::connect_with_buffers;

/// One endpoint to dial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialTarget {
    host: TargetHost,
    port: u16,
    server_name: Option<String>,
}

impl DialTarget {
    pub fn new(host: TargetHost, port: u16, server_name: Option<String>) -> Self {
        Self {
            host,
            port,
            server_name,
        }
    }

    /// The destination named in a session header.
    pub fn from_header(header: &SessionHeader) -> Self {
        Self::new(header.host().clone(), header.port(), None)
    }

    /// An alternate endpoint from the relay list.
    pub fn from_relay(relay: &RelayTarget) -> Self {
        Self::new(
            relay.host().clone(),
            relay.port(),
            relay.server_name_override().map(str::to_string),
        )
    }

    #[inline]
    pub fn host(&self) -> &TargetHost {
        &self.host
    }

    #[inline]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Server name presented to the target: the override, else the host.
    pub fn server_name(&self) -> String {
        match &self.server_name {
            Some(name) => name.clone(),
            None => self.host.to_string(),
        }
    }

    /// `host:port` with IPv6 bracketed.
    pub fn authority(&self) -> String {
        self.host.authority(self.port)
    }
}

impl fmt::Display for DialTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.authority())
    }
}

/// Failure of a single dial attempt.
#[derive(Debug, thiserror::Error)]
pub enum DialError {
    #[error("connect to {target} failed: {source}")]
    Connect {
        target: String,
        #[source]
        source: io::Error,
    },
    #[error("connect to {target} timed out after {timeout:?}")]
    Timeout { target: String, timeout: Duration },
    #[error("no address found for {target}")]
    NoAddress { target: String },
}

/// Opens outbound byte streams.
pub trait Dialer: Send + Sync + 'static {
    /// The stream type produced by this dialer.
    type Stream: AsyncRead + AsyncWrite + Unpin + Send + 'static;

    /// Connect to `target`.
    fn dial<'a>(&'a self, target: &'a DialTarget) -> BoxFuture<'a, Result<Self::Stream, DialError>>;
}

/// Plain TCP dialer using system name resolution.
#[derive(Debug, Clone)]
pub struct DirectDialer {
    no_delay: bool,
    send_buffer: usize,
    recv_buffer: usize,
    connect_timeout: Option<Duration>,
}

impl DirectDialer {
    pub fn new() -> Self {
        Self {
            no_delay: edge_core::defaults::DEFAULT_TCP_NO_DELAY,
            send_buffer: edge_core::defaults::DEFAULT_TCP_SEND_BUFFER,
            recv_buffer: edge_core::defaults::DEFAULT_TCP_RECV_BUFFER,
            connect_timeout: None,
        }
    }

    pub fn from_config(server: &ServerConfig) -> Self {
        Self {
            no_delay: server.tcp_no_delay,
            send_buffer: server.tcp_send_buffer,
            recv_buffer: server.tcp_recv_buffer,
            connect_timeout: (server.connect_timeout_secs > 0)
                .then(|| Duration::from_secs(server.connect_timeout_secs)),
        }
    }

    /// Bound every dial by `timeout`; `None` leaves it to the OS.
    pub fn with_connect_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.connect_timeout = timeout;
        self
    }

    async fn connect(&self, target: &DialTarget) -> Result<tokio::net::TcpStream, DialError> {
        let authority = target.authority();
        let addrs: Vec<SocketAddr> = lookup_host(authority.as_str())
            .await
            .map_err(|source| DialError::Connect {
                target: authority.clone(),
                source,
            })?
            .collect();
        if addrs.is_empty() {
            return Err(DialError::NoAddress { target: authority });
        }

        let mut last_err = None;
        for addr in addrs {
            match connect_with_buffers(addr, self.send_buffer, self.recv_buffer).await {
                Ok(stream) => {
                    stream
                        .set_nodelay(self.no_delay)
                        .map_err(|source| DialError::Connect {
                            target: authority.clone(),
                            source,
                        })?;
                    return Ok(stream);
                }
                Err(err) => {
                    trace!(target = %authority, addr = %addr, error = %err, "address failed");
                    last_err = Some(err);
                }
            }
        }
        Err(DialError::Connect {
            target: authority,
            source: last_err.unwrap_or_else(|| io::Error::from(io::ErrorKind::NotConnected)),
        })
    }
}

impl Default for DirectDialer {
    fn default() -> Self {
        Self::new()
    }
}

impl Dialer for DirectDialer {
    type Stream = tokio::net::TcpStream;

    fn dial<'a>(&'a self, target: &'a DialTarget) -> BoxFuture<'a, Result<Self::Stream, DialError>> {
        Box::pin(async move {
            match self.connect_timeout {
                Some(timeout) => tokio::time::timeout(timeout, self.connect(target))
                    .await
                    .map_err(|_| DialError::Timeout {
                        target: target.authority(),
                        timeout,
                    })?,
                None => self.connect(target).await,
            }
        })
    }
}

/// Opens connected datagram sockets towards a resolver.
pub trait DatagramConnector: Send + Sync + 'static {
    type Socket: DatagramSocket + 'static;

    fn connect(&self, peer: SocketAddr) -> BoxFuture<'_, io::Result<Self::Socket>>;
}

/// UDP connector bound to an ephemeral local port.
#[derive(Debug, Clone, Copy, Default)]
pub struct UdpConnector;

impl DatagramConnector for UdpConnector {
    type Socket = UdpSocket;

    fn connect(&self, peer: SocketAddr) -> BoxFuture<'_, io::Result<Self::Socket>> {
        Box::pin(async move {
            let local = if peer.is_ipv4() {
                SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0))
            } else {
                SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0))
            };
            let socket = UdpSocket::bind(local).await?;
            socket.connect(peer).await?;
            Ok(socket)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use edge_proto::Transport;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    #[test]
    fn header_target_keeps_domain() {
        let header = SessionHeader::new(
            0,
            Transport::Tcp,
            TargetHost::Domain("example.com".into()),
            443,
            Bytes::new(),
        )
        .unwrap();
        let target = DialTarget::from_header(&header);
        assert_eq!(target.host(), &TargetHost::Domain("example.com".into()));
        assert_eq!(target.server_name(), "example.com");
        assert_eq!(target.to_string(), "example.com:443");
    }

    #[test]
    fn relay_target_carries_override() {
        let relay: RelayTarget = "[2001:db8::1]:8443@cdn.example.com".parse().unwrap();
        let target = DialTarget::from_relay(&relay);
        assert_eq!(target.server_name(), "cdn.example.com");
        assert_eq!(target.authority(), "[2001:db8::1]:8443");
    }

    #[tokio::test]
    async fn direct_dialer_connects_by_name() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let accept = tokio::spawn(async move {
            let (mut s, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            s.read_to_end(&mut buf).await.unwrap();
        });

        let dialer = DirectDialer::new();
        let target = DialTarget::new(TargetHost::Domain("localhost".into()), port, None);
        let stream = dialer.dial(&target).await.unwrap();
        assert!(stream.nodelay().unwrap());
        drop(stream);
        accept.await.unwrap();
    }

    #[tokio::test]
    async fn direct_dialer_reports_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let target = DialTarget::new("127.0.0.1".parse().unwrap(), port, None);
        let err = DirectDialer::new().dial(&target).await.unwrap_err();
        assert!(matches!(err, DialError::Connect { .. }), "{err}");
    }

    #[tokio::test]
    async fn udp_connector_is_connected() {
        let peer = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let socket = UdpConnector
            .connect(peer.local_addr().unwrap())
            .await
            .unwrap();
        socket.send_datagram(b"q").await.unwrap();
        let mut buf = [0u8; 8];
        let (n, from) = peer.recv_from(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"q");
        assert_eq!(from.port(), socket.local_addr().unwrap().port());
    }
}
