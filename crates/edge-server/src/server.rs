//! Accept loop and WebSocket upgrade.

use std::net::SocketAddr;
use std::sync::Arc;

use edge_config::{Config, validate_config};
use edge_core::transport::WsDuplex;
use edge_proto::HeaderDecoder;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::accept_hdr_async_with_config;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::StatusCode;
use tokio_tungstenite::tungstenite::protocol::WebSocketConfig;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::dial::{DatagramConnector, Dialer};
use crate::error::ServerError;
use crate::handler::handle_session;
use crate::state::ServerState;
use crate::util::{ConnectionTracker, create_listener};

/// Run the server with a cancellation token for graceful shutdown.
pub async fn run_with_shutdown<H>(
    config: Config,
    decoder: H,
    shutdown: CancellationToken,
) -> Result<(), ServerError>
where
    H: HeaderDecoder,
{
    validate_config(&config)?;
    let listen: SocketAddr = config
        .server
        .listen
        .parse()
        .map_err(|_| ServerError::Config("invalid listen address".into()))?;

    let state = Arc::new(ServerState::from_config(&config)?);
    info!(
        relay_targets = state.relay_targets.len(),
        resolver = %state.dns_resolver,
        doh_url = state.doh.url(),
        "server state ready"
    );

    let listener = create_listener(listen, config.server.connection_backlog)?;
    info!(address = %listen, backlog = config.server.connection_backlog, "listening");

    serve(listener, state, Arc::new(decoder), shutdown).await
}

/// Accept WebSocket sessions on `listener` until `shutdown` is cancelled.
///
/// Each accepted connection is upgraded (path checked, frame size bounded)
/// and handed to [`handle_session`] in its own task. On shutdown the loop
/// stops accepting and waits up to `state.shutdown_timeout` for active
/// sessions to drain.
pub async fn serve<D, U, H>(
    listener: TcpListener,
    state: Arc<ServerState<D, U>>,
    decoder: Arc<H>,
    shutdown: CancellationToken,
) -> Result<(), ServerError>
where
    D: Dialer,
    U: DatagramConnector,
    H: HeaderDecoder + ?Sized,
{
    let tracker = ConnectionTracker::new();

    loop {
        tokio::select! {
            biased;

            _ = shutdown.cancelled() => {
                info!("shutdown signal received, stopping accept loop");
                break;
            }

            result = listener.accept() => {
                let (tcp, peer) = match result {
                    Ok(v) => v,
                    Err(err) => {
                        warn!(error = %err, "accept failed");
                        continue;
                    }
                };
                debug!(peer = %peer, "new connection");

                let state = state.clone();
                let decoder = decoder.clone();
                let guard = tracker.track();

                tokio::spawn(async move {
                    let _guard = guard;
                    let result = async {
                        let Some(ws) = upgrade(tcp, peer, &state).await else {
                            return Ok(());
                        };
                        handle_session(WsDuplex::new(ws), &*decoder, state, peer).await
                    }
                    .await;

                    if let Err(ref err) = result {
                        warn!(peer = %peer, error = %err, error_type = err.error_type(), "session closed with error");
                    } else {
                        debug!(peer = %peer, "session closed");
                    }
                });
            }
        }
    }

    let active = tracker.count();
    if active > 0 {
        info!("waiting for {} active sessions to drain", active);
        if tracker.wait_for_zero(state.shutdown_timeout).await {
            info!("all sessions drained");
        } else {
            warn!("shutdown timeout, {} sessions still active", tracker.count());
        }
    }

    info!("server stopped");
    Ok(())
}

/// Perform the WebSocket handshake, bounded by the header timeout.
///
/// Returns `None` when the peer is not a valid upgrade on the configured path.
async fn upgrade<D, U>(
    tcp: TcpStream,
    peer: SocketAddr,
    state: &ServerState<D, U>,
) -> Option<tokio_tungstenite::WebSocketStream<TcpStream>> {
    let mut ws_cfg = WebSocketConfig::default();
    if state.max_frame_bytes > 0 {
        ws_cfg.max_frame_size = Some(state.max_frame_bytes);
        ws_cfg.max_message_size = Some(state.max_frame_bytes);
    }

    let expected = state.ws_path.clone();
    let callback = move |req: &Request, resp: Response| {
        let path = req.uri().path();
        if path == expected {
            Ok(resp)
        } else {
            debug!(path, "websocket path mismatch");
            let mut reject = ErrorResponse::new(Some("not found".to_string()));
            *reject.status_mut() = StatusCode::NOT_FOUND;
            Err(reject)
        }
    };

    match tokio::time::timeout(
        state.header_timeout,
        accept_hdr_async_with_config(tcp, callback, Some(ws_cfg)),
    )
    .await
    {
        Ok(Ok(ws)) => Some(ws),
        Ok(Err(err)) => {
            debug!(peer = %peer, error = %err, "websocket handshake failed");
            None
        }
        Err(_) => {
            debug!(peer = %peer, "websocket handshake timed out");
            None
        }
    }
}
