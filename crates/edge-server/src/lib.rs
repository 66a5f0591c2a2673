//! Edge tunnel server library.
//!
//! Accepts WebSocket sessions, decodes the session header with an embedder
//! supplied [`HeaderDecoder`](edge_proto::HeaderDecoder), and relays the
//! session either to a TCP target (through the fallback chain) or to a DNS
//! resolver (datagram fast path with a DNS-over-HTTPS fallback).

mod dial;
mod doh;
mod error;
mod fallback;
mod handler;
mod logging;
mod resolve;
mod server;
mod session;
mod state;
mod util;

pub use dial::{DatagramConnector, DialError, DialTarget, Dialer, DirectDialer, UdpConnector};
pub use doh::DohClient;
pub use error::ServerError;
pub use fallback::{Established, FallbackChain};
pub use handler::{handle_dns, handle_session, handle_tcp};
pub use logging::init_tracing;
pub use server::{run_with_shutdown, serve};
pub use session::{Session, SessionPhase};
pub use state::ServerState;
pub use tokio_util::sync::CancellationToken;
pub use util::{ConnectionGuard, ConnectionTracker, create_listener};
