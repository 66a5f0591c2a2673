//! Upstream connection seams.
//!
//! The bridge only needs to read one chunk at a time from the upstream and
//! to write one chunk completely. Byte streams (TCP) and connected datagram
//! sockets (UDP) both fit behind these two traits.

use std::io;

use futures_util::future::BoxFuture;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::UdpSocket;

/// Read side of an upstream connection.
pub trait UpstreamRead: Send {
    /// Read the next chunk into `buf`. `Ok(0)` means the upstream is done.
    fn read_chunk<'a>(&'a mut self, buf: &'a mut [u8]) -> BoxFuture<'a, io::Result<usize>>;
}

/// Write side of an upstream connection.
pub trait UpstreamWrite: Send {
    /// Write the whole chunk before returning.
    fn write_chunk<'a>(&'a mut self, data: &'a [u8]) -> BoxFuture<'a, io::Result<()>>;

    /// Signal that nothing more will be written.
    fn shutdown(&mut self) -> BoxFuture<'_, io::Result<()>>;
}

/// Read half of a byte stream.
#[derive(Debug)]
pub struct StreamRead<R>(pub R);

/// Write half of a byte stream.
#[derive(Debug)]
pub struct StreamWrite<W>(pub W);

impl<R> UpstreamRead for StreamRead<R>
where
    R: AsyncRead + Unpin + Send,
{
    fn read_chunk<'a>(&'a mut self, buf: &'a mut [u8]) -> BoxFuture<'a, io::Result<usize>> {
        Box::pin(self.0.read(buf))
    }
}

impl<W> UpstreamWrite for StreamWrite<W>
where
    W: AsyncWrite + Unpin + Send,
{
    fn write_chunk<'a>(&'a mut self, data: &'a [u8]) -> BoxFuture<'a, io::Result<()>> {
        Box::pin(async move {
            self.0.write_all(data).await?;
            self.0.flush().await
        })
    }

    fn shutdown(&mut self) -> BoxFuture<'_, io::Result<()>> {
        Box::pin(self.0.shutdown())
    }
}

/// A connected datagram socket.
pub trait DatagramSocket: Send + Sync {
    /// Send one datagram to the connected peer.
    fn send_datagram<'a>(&'a self, data: &'a [u8]) -> BoxFuture<'a, io::Result<usize>>;

    /// Receive one datagram from the connected peer.
    fn recv_datagram<'a>(&'a self, buf: &'a mut [u8]) -> BoxFuture<'a, io::Result<usize>>;
}

impl DatagramSocket for UdpSocket {
    fn send_datagram<'a>(&'a self, data: &'a [u8]) -> BoxFuture<'a, io::Result<usize>> {
        Box::pin(self.send(data))
    }

    fn recv_datagram<'a>(&'a self, buf: &'a mut [u8]) -> BoxFuture<'a, io::Result<usize>> {
        Box::pin(self.recv(buf))
    }
}

/// Shared view of a datagram socket usable as either upstream half.
///
/// Datagram sockets send and receive through `&self`, so the read and write
/// forwarders can each hold their own `DatagramHalf` over the same socket.
#[derive(Debug)]
pub struct DatagramHalf<'s, D: ?Sized>(pub &'s D);

impl<D> UpstreamRead for DatagramHalf<'_, D>
where
    D: DatagramSocket + ?Sized,
{
    fn read_chunk<'a>(&'a mut self, buf: &'a mut [u8]) -> BoxFuture<'a, io::Result<usize>> {
        Box::pin(async move {
            // An empty datagram is not end-of-stream; wait for a real reply.
            loop {
                let n = self.0.recv_datagram(buf).await?;
                if n > 0 {
                    return Ok(n);
                }
            }
        })
    }
}

impl<D> UpstreamWrite for DatagramHalf<'_, D>
where
    D: DatagramSocket + ?Sized,
{
    fn write_chunk<'a>(&'a mut self, data: &'a [u8]) -> BoxFuture<'a, io::Result<()>> {
        Box::pin(async move {
            let sent = self.0.send_datagram(data).await?;
            if sent != data.len() {
                return Err(io::Error::new(
                    io::ErrorKind::WriteZero,
                    "datagram truncated on send",
                ));
            }
            Ok(())
        })
    }

    fn shutdown(&mut self) -> BoxFuture<'_, io::Result<()>> {
        Box::pin(async { Ok(()) })
    }
}
