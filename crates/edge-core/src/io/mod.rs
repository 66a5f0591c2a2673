//! I/O primitives for relaying a duplex session to an upstream connection.
//!
//! This module provides the upstream read/write seams shared by stream and
//! datagram upstreams, and the bridge that drives one established session.

mod bridge;
mod upstream;

pub use bridge::{BridgeError, BridgeStats, bridge};
pub use upstream::{DatagramHalf, DatagramSocket, StreamRead, StreamWrite, UpstreamRead, UpstreamWrite};
