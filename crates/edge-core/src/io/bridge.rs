//! First-reply bridge between a duplex session and an upstream connection.
//!
//! Once an upstream is established, two forwarders run concurrently within
//! the session task:
//!
//! - inbound: the already-buffered initial payload, then every duplex
//!   message in arrival order, each written completely before the next
//! - outbound: the first upstream chunk, sent as `prefix || chunk` in a
//!   single message, then every later chunk verbatim in read order
//!
//! Each direction is a single sequential loop, so per-direction ordering
//! holds without extra queues. When either forwarder finishes (end of stream
//! or error) the other is dropped, the upstream writer is shut down and the
//! caller is expected to close the duplex.

use std::io;

use bytes::{BufMut, Bytes, BytesMut};
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tracing::debug;

use super::upstream::{UpstreamRead, UpstreamWrite};

/// Bytes relayed in each direction during one session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BridgeStats {
    /// Bytes written to the upstream, initial payload included.
    pub bytes_up: u64,
    /// Bytes sent to the duplex peer, prefix excluded.
    pub bytes_down: u64,
}

/// Errors that end a bridged session.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// The upstream reached end-of-stream before producing a single byte.
    #[error("upstream closed before sending any data")]
    EmptyUpstream,
    #[error("io: {0}")]
    Io(#[from] io::Error),
}

/// Relay between `duplex` and an established upstream until either side ends.
///
/// # Arguments
///
/// * `duplex` - The client session, message framed
/// * `reader` / `writer` - The two halves of the upstream connection
/// * `initial` - Client bytes already read alongside the session header
/// * `prefix` - Response preamble placed in front of the first reply
/// * `buffer_size` - Size of the upstream read buffer
pub async fn bridge<S, R, W>(
    duplex: &mut S,
    mut reader: R,
    mut writer: W,
    initial: Bytes,
    prefix: Bytes,
    buffer_size: usize,
) -> Result<BridgeStats, BridgeError>
where
    S: Stream<Item = io::Result<Bytes>> + Sink<Bytes, Error = io::Error> + Unpin + Send,
    R: UpstreamRead,
    W: UpstreamWrite,
{
    let mut stats = BridgeStats::default();
    let (mut sink, mut stream) = StreamExt::split::<Bytes>(&mut *duplex);

    let result = {
        let inbound = forward_inbound(&mut stream, &mut writer, initial, &mut stats.bytes_up);
        let outbound = forward_outbound(
            &mut reader,
            &mut sink,
            prefix,
            buffer_size.max(1),
            &mut stats.bytes_down,
        );
        tokio::select! {
            res = inbound => {
                debug!("duplex side finished");
                res.map_err(BridgeError::from)
            }
            res = outbound => {
                debug!("upstream side finished");
                res
            }
        }
    };

    if let Err(err) = writer.shutdown().await {
        debug!(error = %err, "upstream shutdown");
    }
    result.map(|()| stats)
}

async fn forward_inbound<St, W>(
    stream: &mut St,
    writer: &mut W,
    initial: Bytes,
    bytes_up: &mut u64,
) -> io::Result<()>
where
    St: Stream<Item = io::Result<Bytes>> + Unpin,
    W: UpstreamWrite,
{
    if !initial.is_empty() {
        writer.write_chunk(&initial).await?;
        *bytes_up += initial.len() as u64;
    }
    while let Some(msg) = stream.next().await {
        let msg = msg?;
        if msg.is_empty() {
            continue;
        }
        writer.write_chunk(&msg).await?;
        *bytes_up += msg.len() as u64;
    }
    Ok(())
}

async fn forward_outbound<R, K>(
    reader: &mut R,
    sink: &mut K,
    prefix: Bytes,
    buffer_size: usize,
    bytes_down: &mut u64,
) -> Result<(), BridgeError>
where
    R: UpstreamRead,
    K: Sink<Bytes, Error = io::Error> + Unpin,
{
    let mut buf = vec![0u8; buffer_size];

    let n = reader.read_chunk(&mut buf).await?;
    if n == 0 {
        return Err(BridgeError::EmptyUpstream);
    }
    let mut first = BytesMut::with_capacity(prefix.len() + n);
    first.put_slice(&prefix);
    first.put_slice(&buf[..n]);
    sink.send(first.freeze()).await?;
    *bytes_down += n as u64;

    loop {
        let n = reader.read_chunk(&mut buf).await?;
        if n == 0 {
            return Ok(());
        }
        sink.send(Bytes::copy_from_slice(&buf[..n])).await?;
        *bytes_down += n as u64;
    }
}
