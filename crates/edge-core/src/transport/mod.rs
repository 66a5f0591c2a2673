//! Duplex session transports.
//!
//! A duplex connection is message framed: every inbound item is one client
//! message and every outbound item is sent as one message. Any type that is a
//! `Stream` of byte messages and a `Sink` of byte messages qualifies.

mod channel;
#[cfg(feature = "ws")]
mod ws;

pub use channel::{ChannelDuplex, channel_duplex};
#[cfg(feature = "ws")]
pub use ws::WsDuplex;

use std::io;

use bytes::Bytes;
use futures_util::{Sink, SinkExt, Stream};
use tracing::debug;

/// Marker trait for message-framed duplex connections.
pub trait DuplexStream:
    Stream<Item = io::Result<Bytes>> + Sink<Bytes, Error = io::Error> + Unpin + Send + 'static
{
}

impl<T> DuplexStream for T where
    T: Stream<Item = io::Result<Bytes>> + Sink<Bytes, Error = io::Error> + Unpin + Send + 'static
{
}

/// Close the duplex connection, swallowing any error.
///
/// Safe to call on a connection that is already closed.
pub async fn close_duplex<S>(duplex: &mut S)
where
    S: Sink<Bytes, Error = io::Error> + Unpin,
{
    if let Err(err) = SinkExt::close(duplex).await {
        debug!(error = %err, "duplex close");
    }
}
