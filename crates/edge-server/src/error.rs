//! Server error types.

use std::time::Duration;

use edge_config::ConfigError;
use edge_core::errors::{
    ERROR_CONFIG, ERROR_DIAL, ERROR_DNS_FALLBACK, ERROR_EMPTY_UPSTREAM, ERROR_IO, ERROR_PROTOCOL,
    ERROR_TIMEOUT, ERROR_UNREACHABLE, ERROR_UNSUPPORTED,
};
use edge_core::io::BridgeError;
use edge_proto::{DecodeError, Transport};

/// Server error type.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("config: {0}")]
    Config(String),
    #[error("no session header within {0:?}")]
    HeaderTimeout(Duration),
    #[error("header: {0}")]
    Header(#[from] DecodeError),
    #[error("all {attempts} dial attempts failed for {address}:{port}")]
    AllTargetsExhausted {
        address: String,
        port: u16,
        attempts: usize,
    },
    #[error("target unreachable: {address}:{port}")]
    UnreachableTarget { address: String, port: u16 },
    #[error("upstream closed before sending any data")]
    EmptyUpstreamResponse,
    #[error("unsupported transport {transport} to port {port}")]
    UnsupportedTransport { transport: Transport, port: u16 },
    #[error("dns fallback query failed: {0}")]
    FallbackQueryFailure(String),
}

impl ServerError {
    /// Get the error class string for logging.
    pub fn error_type(&self) -> &'static str {
        match self {
            ServerError::Io(_) => ERROR_IO,
            ServerError::Config(_) => ERROR_CONFIG,
            ServerError::HeaderTimeout(_) => ERROR_TIMEOUT,
            ServerError::Header(_) => ERROR_PROTOCOL,
            ServerError::AllTargetsExhausted { .. } => ERROR_DIAL,
            ServerError::UnreachableTarget { .. } => ERROR_UNREACHABLE,
            ServerError::EmptyUpstreamResponse => ERROR_EMPTY_UPSTREAM,
            ServerError::UnsupportedTransport { .. } => ERROR_UNSUPPORTED,
            ServerError::FallbackQueryFailure(_) => ERROR_DNS_FALLBACK,
        }
    }
}

impl From<BridgeError> for ServerError {
    fn from(err: BridgeError) -> Self {
        match err {
            BridgeError::EmptyUpstream => ServerError::EmptyUpstreamResponse,
            BridgeError::Io(err) => ServerError::Io(err),
        }
    }
}

impl From<ConfigError> for ServerError {
    fn from(err: ConfigError) -> Self {
        ServerError::Config(err.to_string())
    }
}
