//! DNS session handler.
//!
//! Fast path: a connected datagram socket to the configured resolver, with
//! the initial query sent before anything else. If the socket cannot be
//! opened or the first send fails, the session moves to DNS-over-HTTPS
//! without having emitted anything to the client. Replies are read into a
//! buffer as large as any DNS message, so a datagram is never cut short.

use bytes::{BufMut, Bytes, BytesMut};
use edge_core::io::{BridgeStats, DatagramHalf, DatagramSocket, bridge};
use edge_core::transport::DuplexStream;
use edge_proto::{MAX_DNS_MESSAGE_LEN, SessionHeader, response_prefix};
use futures_util::{SinkExt, StreamExt};
use tracing::debug;

use crate::dial::{DatagramConnector, Dialer};
use crate::doh::DohClient;
use crate::error::ServerError;
use crate::session::{Session, SessionPhase};
use crate::state::ServerState;

/// Relay a DNS session (UDP to port 53).
pub async fn handle_dns<S, D, U>(
    session: &mut Session<S>,
    state: &ServerState<D, U>,
) -> Result<BridgeStats, ServerError>
where
    S: DuplexStream,
    D: Dialer,
    U: DatagramConnector,
{
    let header = session.header().clone();
    let prefix = Bytes::copy_from_slice(&response_prefix(header.version()));

    match open_fast_path(state, &header).await {
        Some((socket, sent)) => {
            session.advance(SessionPhase::Established);
            debug!(peer = %session.peer(), resolver = %state.dns_resolver, "dns fast path");
            session.advance(SessionPhase::Relaying);
            let mut stats = bridge(
                session.duplex_mut(),
                DatagramHalf(&socket),
                DatagramHalf(&socket),
                Bytes::new(),
                prefix,
                MAX_DNS_MESSAGE_LEN,
            )
            .await?;
            stats.bytes_up += sent as u64;
            Ok(stats)
        }
        None => {
            session.advance(SessionPhase::Established);
            debug!(peer = %session.peer(), url = state.doh.url(), "dns fallback");
            session.advance(SessionPhase::Relaying);
            relay_over_doh(session, &state.doh, header.initial_payload().clone(), prefix).await
        }
    }
}

/// Connect to the resolver and send the initial query.
///
/// Returns the socket and the bytes sent, or `None` when the fallback should
/// take over.
async fn open_fast_path<D, U>(
    state: &ServerState<D, U>,
    header: &SessionHeader,
) -> Option<(U::Socket, usize)>
where
    U: DatagramConnector,
{
    let socket = match state.datagram.connect(state.dns_resolver).await {
        Ok(socket) => socket,
        Err(err) => {
            debug!(resolver = %state.dns_resolver, error = %err, "dns fast path unavailable");
            return None;
        }
    };
    let initial = header.initial_payload();
    if initial.is_empty() {
        return Some((socket, 0));
    }
    match socket.send_datagram(initial).await {
        Ok(n) if n == initial.len() => Some((socket, n)),
        Ok(n) => {
            debug!(sent = n, len = initial.len(), "dns fast path truncated send");
            None
        }
        Err(err) => {
            debug!(resolver = %state.dns_resolver, error = %err, "dns fast path send failed");
            None
        }
    }
}

/// Answer queries one at a time over DNS-over-HTTPS.
///
/// The initial payload is the first query, then every inbound message in
/// arrival order. Only the first answer carries the prefix.
async fn relay_over_doh<S>(
    session: &mut Session<S>,
    doh: &DohClient,
    initial: Bytes,
    prefix: Bytes,
) -> Result<BridgeStats, ServerError>
where
    S: DuplexStream,
{
    let mut stats = BridgeStats::default();
    let mut prefix = Some(prefix);
    let mut pending = Some(initial);
    let duplex = session.duplex_mut();

    loop {
        let query = match pending.take() {
            Some(query) => query,
            None => match duplex.next().await {
                Some(msg) => msg?,
                None => break,
            },
        };
        if query.is_empty() {
            continue;
        }
        stats.bytes_up += query.len() as u64;

        let answer = doh.query(query).await?;
        stats.bytes_down += answer.len() as u64;
        let out = match prefix.take() {
            Some(prefix) => {
                let mut buf = BytesMut::with_capacity(prefix.len() + answer.len());
                buf.put_slice(&prefix);
                buf.put_slice(&answer);
                buf.freeze()
            }
            None => answer,
        };
        duplex.send(out).await?;
    }
    Ok(stats)
}
