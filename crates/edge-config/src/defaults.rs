//! Default value functions for serde deserialization.
//!
//! These functions forward to constants defined in `edge_core::defaults`.

use edge_core::defaults;

/// Generate default value functions that forward to edge_core::defaults constants.
macro_rules! default_fns {
    ($($fn_name:ident => $const_name:ident : $ty:ty),* $(,)?) => {
        $(
            pub(crate) fn $fn_name() -> $ty {
                defaults::$const_name
            }
        )*
    };
}

/// Generate default value functions that return String from &str constants.
macro_rules! default_string_fns {
    ($($fn_name:ident => $const_name:ident),* $(,)?) => {
        $(
            pub(crate) fn $fn_name() -> String {
                defaults::$const_name.to_string()
            }
        )*
    };
}

default_fns! {
    default_header_timeout_secs   => DEFAULT_HEADER_TIMEOUT_SECS: u64,
    default_connect_timeout_secs  => DEFAULT_CONNECT_TIMEOUT_SECS: u64,
    default_shutdown_timeout_secs => DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64,
    default_relay_buffer_size     => DEFAULT_RELAY_BUFFER_SIZE: usize,
    default_tcp_send_buffer       => DEFAULT_TCP_SEND_BUFFER: usize,
    default_tcp_recv_buffer       => DEFAULT_TCP_RECV_BUFFER: usize,
    default_connection_backlog    => DEFAULT_CONNECTION_BACKLOG: u32,
    default_tcp_no_delay          => DEFAULT_TCP_NO_DELAY: bool,
    default_ws_max_frame_bytes    => DEFAULT_WS_MAX_FRAME_BYTES: usize,
}

default_string_fns! {
    default_ws_path      => DEFAULT_WS_PATH,
    default_dns_resolver => DEFAULT_DNS_RESOLVER,
    default_doh_url      => DEFAULT_DOH_URL,
}
