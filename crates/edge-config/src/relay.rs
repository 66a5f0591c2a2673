//! Relay fallback list parsing.
//!
//! Entries are separated by commas. Each entry is one of
//! `host`, `host:port`, `[v6]` or `[v6]:port`, optionally followed by
//! `@servername`. A missing port means 443. Malformed entries are logged and
//! skipped so that one typo never takes the whole list down.

use std::fmt;
use std::str::FromStr;

use edge_core::defaults::DEFAULT_RELAY_PORT;
use edge_proto::TargetHost;
use tracing::warn;

/// One alternate endpoint of the fallback chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayTarget {
    host: TargetHost,
    port: u16,
    server_name: Option<String>,
}

impl RelayTarget {
    pub fn new(host: TargetHost, port: u16, server_name: Option<String>) -> Self {
        Self {
            host,
            port,
            server_name,
        }
    }

    #[inline]
    pub fn host(&self) -> &TargetHost {
        &self.host
    }

    #[inline]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// The explicit `@servername` override, if any.
    #[inline]
    pub fn server_name_override(&self) -> Option<&str> {
        self.server_name.as_deref()
    }

    /// Server name presented to the target: the override, else the host.
    pub fn server_name(&self) -> String {
        match &self.server_name {
            Some(name) => name.clone(),
            None => self.host.to_string(),
        }
    }
}

impl fmt::Display for RelayTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.host.authority(self.port))?;
        if let Some(name) = &self.server_name {
            write!(f, "@{name}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RelayEntryError {
    #[error("empty host")]
    EmptyHost,
    #[error("invalid host {0:?}")]
    InvalidHost(String),
    #[error("invalid port {0:?}")]
    InvalidPort(String),
    #[error("unbalanced brackets")]
    UnbalancedBrackets,
    #[error("IPv6 address must be bracketed")]
    BareIpv6,
    #[error("empty server name")]
    EmptyServerName,
}

impl FromStr for RelayTarget {
    type Err = RelayEntryError;

    fn from_str(entry: &str) -> Result<Self, Self::Err> {
        let entry = entry.trim();
        let (addr, server_name) = match entry.split_once('@') {
            Some((addr, name)) => {
                let name = name.trim();
                if name.is_empty() || name.contains(char::is_whitespace) || name.contains('@') {
                    return Err(RelayEntryError::EmptyServerName);
                }
                (addr.trim(), Some(name.to_string()))
            }
            None => (entry, None),
        };

        let (host, port) = split_host_port(addr)?;
        let host = TargetHost::parse(host).map_err(|_| {
            if host.is_empty() {
                RelayEntryError::EmptyHost
            } else {
                RelayEntryError::InvalidHost(host.to_string())
            }
        })?;
        Ok(RelayTarget::new(host, port, server_name))
    }
}

fn split_host_port(addr: &str) -> Result<(&str, u16), RelayEntryError> {
    if addr.is_empty() {
        return Err(RelayEntryError::EmptyHost);
    }
    if addr.starts_with('[') {
        let close = addr.find(']').ok_or(RelayEntryError::UnbalancedBrackets)?;
        let host = &addr[..=close];
        if close == 1 {
            return Err(RelayEntryError::EmptyHost);
        }
        let rest = &addr[close + 1..];
        if rest.is_empty() {
            return Ok((host, DEFAULT_RELAY_PORT));
        }
        return match rest.strip_prefix(':') {
            Some(port) => Ok((host, parse_port(port)?)),
            None => Err(RelayEntryError::UnbalancedBrackets),
        };
    }
    if addr.contains(']') || addr.contains('[') {
        return Err(RelayEntryError::UnbalancedBrackets);
    }
    match addr.matches(':').count() {
        0 => Ok((addr, DEFAULT_RELAY_PORT)),
        1 => {
            let (host, port) = addr.split_once(':').ok_or(RelayEntryError::EmptyHost)?;
            if host.trim().is_empty() {
                return Err(RelayEntryError::EmptyHost);
            }
            Ok((host.trim(), parse_port(port)?))
        }
        _ => Err(RelayEntryError::BareIpv6),
    }
}

fn parse_port(port: &str) -> Result<u16, RelayEntryError> {
    match port.trim().parse::<u16>() {
        Ok(0) | Err(_) => Err(RelayEntryError::InvalidPort(port.to_string())),
        Ok(p) => Ok(p),
    }
}

/// Parse a comma-separated relay list, keeping entry order.
///
/// Empty entries are ignored; malformed ones are dropped with a warning.
pub fn parse_relay_list(raw: &str) -> Vec<RelayTarget> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .filter_map(|entry| match entry.parse::<RelayTarget>() {
            Ok(target) => Some(target),
            Err(err) => {
                warn!(entry, error = %err, "dropping malformed relay entry");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

    fn domain(name: &str) -> TargetHost {
        TargetHost::Domain(name.to_string())
    }

    #[test]
    fn host_without_port_defaults_to_443() {
        let t: RelayTarget = "relay.example.net".parse().unwrap();
        assert_eq!(t.host(), &domain("relay.example.net"));
        assert_eq!(t.port(), 443);
        assert_eq!(t.server_name_override(), None);
        assert_eq!(t.server_name(), "relay.example.net");
    }

    #[test]
    fn host_port_and_server_name() {
        let t: RelayTarget = "10.0.0.9:8443@cdn.example.com".parse().unwrap();
        assert_eq!(t.host(), &TargetHost::Ip(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 9))));
        assert_eq!(t.port(), 8443);
        assert_eq!(t.server_name(), "cdn.example.com");
        assert_eq!(t.to_string(), "10.0.0.9:8443@cdn.example.com");
    }

    #[test]
    fn bracketed_ipv6_forms() {
        let t: RelayTarget = "[2001:db8::1]".parse().unwrap();
        let ip: Ipv6Addr = "2001:db8::1".parse().unwrap();
        assert_eq!(t.host(), &TargetHost::Ip(IpAddr::V6(ip)));
        assert_eq!(t.port(), 443);

        let t: RelayTarget = "[2001:db8::1]:2053@sni.example".parse().unwrap();
        assert_eq!(t.port(), 2053);
        assert_eq!(t.server_name(), "sni.example");
        assert_eq!(t.to_string(), "[2001:db8::1]:2053@sni.example");
    }

    #[test]
    fn malformed_entries_are_rejected() {
        let cases = [
            (":443", RelayEntryError::EmptyHost),
            ("host:0", RelayEntryError::InvalidPort("0".into())),
            ("host:abc", RelayEntryError::InvalidPort("abc".into())),
            ("host:70000", RelayEntryError::InvalidPort("70000".into())),
            ("[2001:db8::1", RelayEntryError::UnbalancedBrackets),
            ("2001:db8::1]", RelayEntryError::UnbalancedBrackets),
            ("[::1]x", RelayEntryError::UnbalancedBrackets),
            ("2001:db8::1", RelayEntryError::BareIpv6),
            ("host@", RelayEntryError::EmptyServerName),
            ("[]:443", RelayEntryError::EmptyHost),
        ];
        for (input, expected) in cases {
            assert_eq!(input.parse::<RelayTarget>(), Err(expected), "{input}");
        }
        assert!(matches!(
            "[not-an-ip]:443".parse::<RelayTarget>(),
            Err(RelayEntryError::InvalidHost(_))
        ));
    }

    #[test]
    fn list_keeps_order_and_drops_bad_entries() {
        let list = parse_relay_list(" a.example , ,b.example:80, bad:0 ,[::1]:53@c.example,");
        let rendered: Vec<String> = list.iter().map(ToString::to_string).collect();
        assert_eq!(
            rendered,
            vec!["a.example:443", "b.example:80", "[::1]:53@c.example"]
        );
    }

    #[test]
    fn empty_list_is_empty() {
        assert!(parse_relay_list("").is_empty());
        assert!(parse_relay_list(" , ,").is_empty());
    }
}
