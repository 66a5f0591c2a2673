//! # edge-tunnel
//!
//! Relays message-framed duplex sessions (WebSocket) to TCP targets and DNS
//! resolvers on the client's behalf.
//!
//! ## Crates
//!
//! - [`edge_core`] - Defaults, duplex abstraction and the first-reply bridge
//! - [`edge_proto`] - Session header model and response prefix
//! - [`edge_config`] - Configuration loading, relay list parsing, validation
//! - [`edge_server`] - Dialing, fallback chain, TCP/DNS handlers, accept loop

pub use edge_config as config;
pub use edge_core as core;
pub use edge_proto as proto;
pub use edge_server as server;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use edge_config::{Config, RelayTarget, load_config, parse_relay_list, validate_config};
    pub use edge_core::transport::{DuplexStream, WsDuplex, channel_duplex};
    pub use edge_proto::{DecodeError, HeaderDecoder, SessionHeader, TargetHost, Transport};
    pub use edge_server::{
        CancellationToken, Dialer, DirectDialer, ServerError, ServerState, handle_session,
        init_tracing, run_with_shutdown, serve,
    };
}
