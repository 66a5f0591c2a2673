//! Per-session lifecycle.

use std::io;
use std::net::SocketAddr;

use bytes::Bytes;
use edge_core::transport::close_duplex;
use edge_proto::SessionHeader;
use futures_util::Sink;
use tracing::debug;

/// Lifecycle phase of a session. Phases only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SessionPhase {
    Dialing,
    Established,
    Relaying,
    Closed,
}

/// One decoded session: the duplex stream, its header and its phase.
///
/// The duplex is exclusively owned by the session; [`Session::close`] is the
/// only way to reach [`SessionPhase::Closed`] and runs its teardown once.
pub struct Session<S> {
    duplex: S,
    header: SessionHeader,
    peer: SocketAddr,
    phase: SessionPhase,
}

impl<S> Session<S> {
    pub fn new(duplex: S, header: SessionHeader, peer: SocketAddr) -> Self {
        Self {
            duplex,
            header,
            peer,
            phase: SessionPhase::Dialing,
        }
    }

    #[inline]
    pub fn header(&self) -> &SessionHeader {
        &self.header
    }

    #[inline]
    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    #[inline]
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.phase == SessionPhase::Closed
    }

    pub fn duplex_mut(&mut self) -> &mut S {
        &mut self.duplex
    }

    /// Move to `next` if it is ahead of the current phase.
    ///
    /// `Closed` is only reachable through [`Session::close`].
    pub fn advance(&mut self, next: SessionPhase) {
        if next == SessionPhase::Closed || next <= self.phase {
            return;
        }
        self.phase = next;
    }
}

impl<S> Session<S>
where
    S: Sink<Bytes, Error = io::Error> + Unpin,
{
    /// Close the duplex. Later calls are no-ops.
    pub async fn close(&mut self) {
        if self.phase == SessionPhase::Closed {
            return;
        }
        let from = self.phase;
        self.phase = SessionPhase::Closed;
        close_duplex(&mut self.duplex).await;
        debug!(peer = %self.peer, target = %self.header.target_label(), from = ?from, "session closed");
    }
}
