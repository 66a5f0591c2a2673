//! Advisory name resolution.
//!
//! Purely diagnostic: the addresses are logged and dropped. Dialing always
//! goes through the original host name.

use tokio::net::lookup_host;
use tracing::{Level, debug, enabled};

use crate::dial::DialTarget;

/// Log the addresses a domain target resolves to, without waiting for it.
///
/// Does nothing for literal IPs or when debug logging is off.
pub(crate) fn spawn_advisory_lookup(target: &DialTarget) {
    if !target.host().is_domain() || !enabled!(Level::DEBUG) {
        return;
    }
    let authority = target.authority();
    tokio::spawn(async move {
        match lookup_host(authority.as_str()).await {
            Ok(addrs) => {
                let addrs: Vec<String> = addrs.map(|a| a.ip().to_string()).collect();
                debug!(target = %authority, addrs = ?addrs, "advisory lookup");
            }
            Err(err) => debug!(target = %authority, error = %err, "advisory lookup failed"),
        }
    });
}
