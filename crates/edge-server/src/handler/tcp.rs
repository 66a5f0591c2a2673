//! TCP session handler.

use bytes::Bytes;
use edge_core::io::{BridgeStats, StreamRead, StreamWrite, bridge};
use edge_core::transport::DuplexStream;
use edge_proto::response_prefix;
use tracing::debug;

use crate::dial::{DatagramConnector, Dialer};
use crate::error::ServerError;
use crate::fallback::FallbackChain;
use crate::session::{Session, SessionPhase};
use crate::state::ServerState;

/// Relay a TCP session through the fallback chain.
///
/// The header's initial payload is written to the upstream first; the first
/// upstream reply reaches the client behind the response prefix.
pub async fn handle_tcp<S, D, U>(
    session: &mut Session<S>,
    state: &ServerState<D, U>,
) -> Result<BridgeStats, ServerError>
where
    S: DuplexStream,
    D: Dialer,
    U: DatagramConnector,
{
    let header = session.header().clone();
    let chain = FallbackChain::new(&state.dialer, &state.relay_targets);
    let established = chain.connect(&header).await.map_err(|err| match err {
        ServerError::AllTargetsExhausted { address, port, .. } => {
            ServerError::UnreachableTarget { address, port }
        }
        other => other,
    })?;
    session.advance(SessionPhase::Established);
    debug!(
        peer = %session.peer(),
        target = %established.target,
        attempts = established.attempts,
        "upstream connected"
    );

    let (reader, writer) = tokio::io::split(established.stream);
    session.advance(SessionPhase::Relaying);
    let stats = bridge(
        session.duplex_mut(),
        StreamRead(reader),
        StreamWrite(writer),
        header.initial_payload().clone(),
        Bytes::copy_from_slice(&response_prefix(header.version())),
        state.relay_buffer_size,
    )
    .await?;
    Ok(stats)
}
