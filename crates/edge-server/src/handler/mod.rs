//! Session handlers.

mod dns;
mod tcp;

pub use dns::handle_dns;
pub use tcp::handle_tcp;

use std::net::SocketAddr;
use std::sync::Arc;

use edge_core::io::BridgeStats;
use edge_core::transport::{DuplexStream, close_duplex};
use edge_proto::{HeaderDecoder, SessionHeader, Transport};
use futures_util::StreamExt;
use tracing::debug;

use crate::dial::{DatagramConnector, Dialer};
use crate::error::ServerError;
use crate::session::Session;
use crate::state::ServerState;

/// Drive one duplex session from its first message to teardown.
///
/// The first message must arrive within `state.header_timeout`; it is decoded
/// into a [`SessionHeader`] and the session is dispatched on its transport.
/// The duplex is closed on every path. A peer that goes away before sending a
/// header ends the session cleanly.
pub async fn handle_session<S, H, D, U>(
    mut duplex: S,
    decoder: &H,
    state: Arc<ServerState<D, U>>,
    peer: SocketAddr,
) -> Result<(), ServerError>
where
    S: DuplexStream,
    H: HeaderDecoder + ?Sized,
    D: Dialer,
    U: DatagramConnector,
{
    let header = match read_header(&mut duplex, decoder, &state).await {
        Ok(Some(header)) => header,
        Ok(None) => {
            debug!(peer = %peer, "peer closed before sending a header");
            close_duplex(&mut duplex).await;
            return Ok(());
        }
        Err(err) => {
            close_duplex(&mut duplex).await;
            return Err(err);
        }
    };
    debug!(
        peer = %peer,
        transport = %header.transport(),
        target = %header.target_label(),
        initial_bytes = header.initial_payload().len(),
        "session header"
    );

    let mut session = Session::new(duplex, header, peer);
    let result = dispatch(&mut session, &state).await;
    session.close().await;

    match result {
        Ok(stats) => {
            debug!(
                peer = %peer,
                target = %session.header().target_label(),
                bytes_up = stats.bytes_up,
                bytes_down = stats.bytes_down,
                "session finished"
            );
            Ok(())
        }
        Err(err) => {
            debug!(
                peer = %peer,
                target = %session.header().target_label(),
                error = %err,
                error_type = err.error_type(),
                "session failed"
            );
            Err(err)
        }
    }
}

async fn read_header<S, H, D, U>(
    duplex: &mut S,
    decoder: &H,
    state: &ServerState<D, U>,
) -> Result<Option<SessionHeader>, ServerError>
where
    S: DuplexStream,
    H: HeaderDecoder + ?Sized,
{
    let first = match tokio::time::timeout(state.header_timeout, duplex.next()).await {
        Ok(Some(msg)) => msg?,
        Ok(None) => return Ok(None),
        Err(_) => return Err(ServerError::HeaderTimeout(state.header_timeout)),
    };
    Ok(Some(decoder.decode(first)?))
}

async fn dispatch<S, D, U>(
    session: &mut Session<S>,
    state: &ServerState<D, U>,
) -> Result<BridgeStats, ServerError>
where
    S: DuplexStream,
    D: Dialer,
    U: DatagramConnector,
{
    let (transport, is_dns, port) = {
        let header = session.header();
        (header.transport(), header.is_dns(), header.port())
    };
    match transport {
        Transport::Tcp => handle_tcp(session, state).await,
        Transport::Udp if is_dns => handle_dns(session, state).await,
        Transport::Udp => Err(ServerError::UnsupportedTransport { transport, port }),
    }
}
