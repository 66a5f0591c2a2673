//! Configuration validation logic.

use std::net::SocketAddr;

use crate::Config;
use crate::loader::ConfigError;

pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.listen.trim().is_empty() {
        return Err(ConfigError::Validation("server.listen is empty".into()));
    }
    if config.server.listen.parse::<SocketAddr>().is_err() {
        return Err(ConfigError::Validation(format!(
            "server.listen is not a socket address: {}",
            config.server.listen
        )));
    }
    if !config.server.ws_path.starts_with('/') {
        return Err(ConfigError::Validation(
            "server.ws_path must start with '/'".into(),
        ));
    }
    if config.server.max_frame_bytes == 0 {
        return Err(ConfigError::Validation(
            "server.max_frame_bytes must be > 0".into(),
        ));
    }
    if config.server.header_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "server.header_timeout_secs must be > 0".into(),
        ));
    }
    if config.server.relay_buffer_size < 1024 {
        return Err(ConfigError::Validation(
            "server.relay_buffer_size must be >= 1024".into(),
        ));
    }
    if config.server.relay_buffer_size > 1024 * 1024 {
        return Err(ConfigError::Validation(
            "server.relay_buffer_size must be <= 1MB".into(),
        ));
    }
    if config.server.connection_backlog == 0 {
        return Err(ConfigError::Validation(
            "server.connection_backlog must be > 0".into(),
        ));
    }
    if config.dns.resolver.parse::<SocketAddr>().is_err() {
        return Err(ConfigError::Validation(format!(
            "dns.resolver is not a socket address: {}",
            config.dns.resolver
        )));
    }
    let doh = config.dns.doh_url.trim();
    if !(doh.starts_with("https://") || doh.starts_with("http://")) {
        return Err(ConfigError::Validation(
            "dns.doh_url must be an http(s) URL".into(),
        ));
    }
    if let Some(format) = config.logging.format.as_deref()
        && !matches!(format, "json" | "pretty" | "compact")
    {
        return Err(ConfigError::Validation(
            "logging.format must be one of: json, pretty, compact".into(),
        ));
    }
    if let Some(output) = config.logging.output.as_deref()
        && !matches!(output, "stdout" | "stderr")
    {
        return Err(ConfigError::Validation(
            "logging.output must be 'stdout' or 'stderr'".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Config {
        toml::from_str(
            r#"
[server]
listen = "127.0.0.1:8080"
"#,
        )
        .unwrap()
    }

    fn rejects(config: &Config, needle: &str) {
        match validate_config(config) {
            Err(ConfigError::Validation(msg)) => assert!(msg.contains(needle), "{msg}"),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn defaults_are_valid() {
        validate_config(&base()).unwrap();
    }

    #[test]
    fn rejects_bad_listen_and_resolver() {
        let mut cfg = base();
        cfg.server.listen = "not-an-addr".into();
        rejects(&cfg, "server.listen");

        let mut cfg = base();
        cfg.dns.resolver = "dns.google".into();
        rejects(&cfg, "dns.resolver");
    }

    #[test]
    fn rejects_non_http_doh_url() {
        let mut cfg = base();
        cfg.dns.doh_url = "udp://1.1.1.1".into();
        rejects(&cfg, "dns.doh_url");
    }

    #[test]
    fn rejects_zero_sizes() {
        let mut cfg = base();
        cfg.server.max_frame_bytes = 0;
        rejects(&cfg, "max_frame_bytes");

        let mut cfg = base();
        cfg.server.header_timeout_secs = 0;
        rejects(&cfg, "header_timeout_secs");

        let mut cfg = base();
        cfg.server.relay_buffer_size = 16;
        rejects(&cfg, "relay_buffer_size");
    }

    #[test]
    fn malformed_relay_list_is_not_a_validation_error() {
        let mut cfg = base();
        cfg.relay.targets = "ok.example, bad:0, [::1".into();
        validate_config(&cfg).unwrap();
        assert_eq!(cfg.relay.parsed_targets().len(), 1);
    }

    #[test]
    fn rejects_unknown_log_format() {
        let mut cfg = base();
        cfg.logging.format = Some("xml".into());
        rejects(&cfg, "logging.format");
    }
}
