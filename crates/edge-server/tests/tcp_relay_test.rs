//! TCP sessions: first-reply prefix, ordered fallback dialing and teardown.

mod common;

use bytes::Bytes;
use common::*;
use edge_config::parse_relay_list;
use edge_core::transport::channel_duplex;
use edge_proto::{SessionHeader, TargetHost, Transport};
use edge_server::{FallbackChain, ServerError, handle_session};
use futures_util::SinkExt;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

#[tokio::test]
async fn primary_target_relays_with_prefixed_first_reply() {
    let config = test_config("");
    let (dialer, mut log) = MockDialer::new(&["example.com:443"]);
    let state = udp_state(&config, dialer);
    let (session_end, mut client) = channel_duplex(16);

    let session = tokio::spawn(async move {
        handle_session(session_end, &decode_header, state, peer()).await
    });

    client
        .send(encode_header("tcp", "example.com", 443, b"GET / HTTP/1.1\r\n\r\n"))
        .await
        .unwrap();

    let (target, mut remote) = log.remotes.recv().await.unwrap();
    assert_eq!(target.host(), &TargetHost::Domain("example.com".into()));
    let mut buf = [0u8; 64];
    let n = remote.read(&mut buf).await.unwrap();
    assert_eq!(&buf[..n], b"GET / HTTP/1.1\r\n\r\n");

    remote.write_all(b"HTTP/1.1 200 OK\r\n").await.unwrap();
    assert_eq!(
        client.recv().await.unwrap(),
        &b"\x00\x00HTTP/1.1 200 OK\r\n"[..]
    );
    remote.write_all(b"body").await.unwrap();
    assert_eq!(client.recv().await.unwrap(), &b"body"[..]);

    client.send(Bytes::from_static(b"next request")).await.unwrap();
    let n = remote.read(&mut buf).await.unwrap();
    assert_eq!(&buf[..n], b"next request");

    client.close().await.unwrap();
    session.await.unwrap().unwrap();
    assert_eq!(log.attempted(), vec!["example.com:443"]);
}

#[tokio::test]
async fn relay_targets_are_tried_in_order_and_keep_their_names() {
    let config = test_config(
        "[relay]\ntargets = \"relay-a.example:8443, relay-b.example@sni.example, relay-c.example\"\n",
    );
    let (dialer, mut log) = MockDialer::new(&["relay-b.example:443", "relay-c.example:443"]);
    let state = udp_state(&config, dialer);
    let (session_end, mut client) = channel_duplex(16);

    let session = tokio::spawn(async move {
        handle_session(session_end, &decode_header, state, peer()).await
    });
    client
        .send(encode_header("tcp", "origin.example", 443, b"hello"))
        .await
        .unwrap();

    let (target, mut remote) = log.remotes.recv().await.unwrap();
    assert_eq!(target.host(), &TargetHost::Domain("relay-b.example".into()));
    assert_eq!(target.server_name(), "sni.example");
    assert_eq!(
        log.attempted(),
        vec![
            "origin.example:443",
            "relay-a.example:8443",
            "relay-b.example:443"
        ]
    );

    let mut buf = [0u8; 16];
    let n = remote.read(&mut buf).await.unwrap();
    assert_eq!(&buf[..n], b"hello");
    remote.write_all(b"world").await.unwrap();
    assert_eq!(client.recv().await.unwrap(), &b"\x00\x00world"[..]);

    drop(remote);
    session.await.unwrap().unwrap();
    assert!(client.recv().await.is_none());
}

#[tokio::test]
async fn exhausted_chain_closes_session_without_output() {
    let config = test_config("[relay]\ntargets = \"r1.example, [2001:db8::1]:8443\"\n");
    let (dialer, log) = MockDialer::new(&[]);
    let state = udp_state(&config, dialer);
    let (session_end, mut client) = channel_duplex(16);

    let session = tokio::spawn(async move {
        handle_session(session_end, &decode_header, state, peer()).await
    });
    client
        .send(encode_header("tcp", "10.0.0.1", 22, b"SSH-2.0"))
        .await
        .unwrap();

    let err = session.await.unwrap().unwrap_err();
    match err {
        ServerError::UnreachableTarget { address, port } => {
            assert_eq!(address, "10.0.0.1");
            assert_eq!(port, 22);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(client.recv().await.is_none());
    assert_eq!(
        log.attempted(),
        vec!["10.0.0.1:22", "r1.example:443", "[2001:db8::1]:8443"]
    );
}

#[tokio::test]
async fn chain_reports_every_attempt_on_exhaustion() {
    let relays = parse_relay_list("a.example, b.example:80, c.example@d.example");
    let (dialer, log) = MockDialer::new(&[]);
    let header = SessionHeader::new(
        0,
        Transport::Tcp,
        TargetHost::Domain("example.com".into()),
        443,
        Bytes::new(),
    )
    .unwrap();

    let chain = FallbackChain::new(&dialer, &relays);
    assert_eq!(chain.candidates(&header).len(), relays.len() + 1);
    let err = chain.connect(&header).await.unwrap_err();
    match err {
        ServerError::AllTargetsExhausted {
            address,
            port,
            attempts,
        } => {
            assert_eq!(address, "example.com");
            assert_eq!(port, 443);
            assert_eq!(attempts, relays.len() + 1);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(log.attempted().len(), 4);
}

#[tokio::test]
async fn chain_with_no_relays_stops_after_primary() {
    let (dialer, log) = MockDialer::new(&["example.com:443"]);
    let header = SessionHeader::new(
        0,
        Transport::Tcp,
        TargetHost::Domain("example.com".into()),
        443,
        Bytes::new(),
    )
    .unwrap();

    let established = FallbackChain::new(&dialer, &[]).connect(&header).await.unwrap();
    assert_eq!(established.attempts, 1);
    assert_eq!(established.target.authority(), "example.com:443");
    assert_eq!(log.attempted(), vec!["example.com:443"]);
}

#[tokio::test]
async fn upstream_closing_silently_is_an_empty_response() {
    let config = test_config("");
    let (dialer, mut log) = MockDialer::new(&["example.com:443"]);
    let state = udp_state(&config, dialer);
    let (session_end, mut client) = channel_duplex(16);

    let session = tokio::spawn(async move {
        handle_session(session_end, &decode_header, state, peer()).await
    });
    client
        .send(encode_header("tcp", "example.com", 443, b""))
        .await
        .unwrap();

    let (_, remote) = log.remotes.recv().await.unwrap();
    drop(remote);

    let err = session.await.unwrap().unwrap_err();
    assert!(matches!(err, ServerError::EmptyUpstreamResponse), "{err}");
    assert!(client.recv().await.is_none());
}
