//! Ordered fallback dialing.
//!
//! The destination from the session header is tried first, then every relay
//! target strictly in configured order, one at a time. The first connection
//! that succeeds wins; nothing is raced.

use edge_config::RelayTarget;
use edge_proto::SessionHeader;
use tracing::{debug, warn};

use crate::dial::{DialTarget, Dialer};
use crate::error::ServerError;
use crate::resolve::spawn_advisory_lookup;

/// A connection produced by the chain.
#[derive(Debug)]
pub struct Established<S> {
    pub stream: S,
    /// The endpoint that accepted the connection.
    pub target: DialTarget,
    /// Dial attempts made, the successful one included.
    pub attempts: usize,
}

/// Primary dial followed by the relay list.
pub struct FallbackChain<'a, D> {
    dialer: &'a D,
    relays: &'a [RelayTarget],
}

impl<'a, D: Dialer> FallbackChain<'a, D> {
    pub fn new(dialer: &'a D, relays: &'a [RelayTarget]) -> Self {
        Self { dialer, relays }
    }

    /// Every endpoint the chain will try for `header`, in order.
    pub fn candidates(&self, header: &SessionHeader) -> Vec<DialTarget> {
        std::iter::once(DialTarget::from_header(header))
            .chain(self.relays.iter().map(DialTarget::from_relay))
            .collect()
    }

    /// Dial until one candidate connects.
    ///
    /// Fails with [`ServerError::AllTargetsExhausted`] after
    /// `relays.len() + 1` unsuccessful attempts.
    pub async fn connect(&self, header: &SessionHeader) -> Result<Established<D::Stream>, ServerError> {
        let candidates = self.candidates(header);
        let total = candidates.len();

        for (index, target) in candidates.into_iter().enumerate() {
            let attempt = index + 1;
            spawn_advisory_lookup(&target);
            match self.dialer.dial(&target).await {
                Ok(stream) => {
                    debug!(
                        target = %target,
                        server_name = %target.server_name(),
                        attempt,
                        "dial succeeded"
                    );
                    return Ok(Established {
                        stream,
                        target,
                        attempts: attempt,
                    });
                }
                Err(err) => {
                    debug!(target = %target, attempt, total, error = %err, "dial failed");
                }
            }
        }

        warn!(
            target = %header.target_label(),
            attempts = total,
            "all dial targets failed"
        );
        Err(ServerError::AllTargetsExhausted {
            address: header.host().to_string(),
            port: header.port(),
            attempts: total,
        })
    }
}
