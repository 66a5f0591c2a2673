//! In-memory duplex connection backed by bounded channels.
//!
//! Useful for embedding the relay behind a transport that is not a
//! WebSocket, and for driving sessions in tests.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures_util::{Sink, Stream};
use tokio::sync::mpsc;
use tokio_util::sync::PollSender;

/// One end of an in-memory message pipe.
///
/// Closing an end ends the peer's stream once queued messages are drained.
pub struct ChannelDuplex {
    rx: mpsc::Receiver<Bytes>,
    tx: PollSender<Bytes>,
}

/// Create a connected pair of in-memory duplex ends.
pub fn channel_duplex(capacity: usize) -> (ChannelDuplex, ChannelDuplex) {
    let (a_tx, a_rx) = mpsc::channel(capacity);
    let (b_tx, b_rx) = mpsc::channel(capacity);
    (
        ChannelDuplex {
            rx: a_rx,
            tx: PollSender::new(b_tx),
        },
        ChannelDuplex {
            rx: b_rx,
            tx: PollSender::new(a_tx),
        },
    )
}

impl ChannelDuplex {
    /// Receive the next message, `None` once the peer has closed.
    pub async fn recv(&mut self) -> Option<Bytes> {
        self.rx.recv().await
    }

    /// Whether this end can no longer send.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

fn closed() -> io::Error {
    io::Error::new(io::ErrorKind::BrokenPipe, "duplex peer closed")
}

impl Stream for ChannelDuplex {
    type Item = io::Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx).map(|msg| msg.map(Ok))
    }
}

impl Sink<Bytes> for ChannelDuplex {
    type Error = io::Error;

    fn poll_ready(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        self.tx.poll_reserve(cx).map_err(|_| closed())
    }

    fn start_send(mut self: Pin<&mut Self>, item: Bytes) -> io::Result<()> {
        self.tx.send_item(item).map_err(|_| closed())
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_close(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        self.tx.close();
        Poll::Ready(Ok(()))
    }
}
