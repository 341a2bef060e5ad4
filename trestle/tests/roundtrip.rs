//! Echo round-trips through a PUSH/PULL loopback inside one context,
//! including framing preservation and per-socket ordering.

use std::time::Duration;

use bytes::Bytes;
use trestle::{Context, Payload, Registration, SocketKind};

const TIMEOUT: Duration = Duration::from_secs(5);

/// Register a bound PULL and a connected PUSH over `addr`, returning the
/// application ends: a sender feeding the PUSH and a receiver draining the
/// PULL. The PULL is registered first so its bind precedes the connect.
fn loopback(
    ctx: &Context,
    addr: &'static str,
) -> (flume::Sender<Payload>, flume::Receiver<Payload>) {
    let (inbound_tx, inbound_rx) = flume::bounded(64);
    ctx.register(
        Registration::new()
            .socket_type(SocketKind::Pull)
            .configure(move |socket| socket.bind(addr))
            .inbound(inbound_tx),
    )
    .unwrap();

    let (outbound_tx, outbound_rx) = flume::bounded(64);
    ctx.register(
        Registration::new()
            .socket_type(SocketKind::Push)
            .configure(move |socket| socket.connect(addr))
            .outbound(outbound_rx),
    )
    .unwrap();

    (outbound_tx, inbound_rx)
}

#[test]
fn test_echo_roundtrip() {
    trestle::dev_tracing::init_tracing();
    let ctx = Context::new("roundtrip-echo");
    let (tx, rx) = loopback(&ctx, "inproc://roundtrip-echo");

    tx.send(Payload::from("hello")).unwrap();

    let delivered = rx.recv_timeout(TIMEOUT).unwrap();
    assert_eq!(delivered, Payload::Single(Bytes::from_static(b"hello")));

    ctx.shutdown();
    assert!(!ctx.is_running());
}

#[test]
fn test_multipart_framing_preserved() {
    let ctx = Context::new("roundtrip-multipart");
    let (tx, rx) = loopback(&ctx, "inproc://roundtrip-multipart");

    let parts = vec![
        Bytes::from_static(b"a"),
        Bytes::from_static(b"b"),
        Bytes::from_static(b"c"),
    ];
    tx.send(Payload::Multi(parts.clone())).unwrap();

    let delivered = rx.recv_timeout(TIMEOUT).unwrap();
    assert!(delivered.is_multipart(), "three parts must not be flattened");
    assert_eq!(delivered.parts(), &parts[..]);

    ctx.shutdown();
}

#[test]
fn test_single_part_stays_single() {
    let ctx = Context::new("roundtrip-single");
    let (tx, rx) = loopback(&ctx, "inproc://roundtrip-single");

    tx.send(Payload::from("solo")).unwrap();

    let delivered = rx.recv_timeout(TIMEOUT).unwrap();
    assert!(!delivered.is_multipart());

    ctx.shutdown();
}

#[test]
fn test_per_socket_ordering() {
    let ctx = Context::new("roundtrip-ordering");
    let (tx, rx) = loopback(&ctx, "inproc://roundtrip-ordering");

    for i in 0..50 {
        tx.send(Payload::from(format!("msg-{i}"))).unwrap();
    }
    for i in 0..50 {
        let delivered = rx.recv_timeout(TIMEOUT).unwrap();
        assert_eq!(
            delivered.parts()[0].as_ref(),
            format!("msg-{i}").as_bytes(),
            "messages must arrive in the order they were sent"
        );
    }

    ctx.shutdown();
}

#[test]
fn test_global_context_register() {
    let (inbound_tx, inbound_rx) = flume::bounded(16);
    trestle::register(
        Registration::new()
            .socket_type(SocketKind::Pull)
            .configure(|socket| socket.bind("inproc://roundtrip-global"))
            .inbound(inbound_tx),
    )
    .unwrap();

    let (outbound_tx, outbound_rx) = flume::bounded(16);
    trestle::register(
        Registration::new()
            .socket_type(SocketKind::Push)
            .configure(|socket| socket.connect("inproc://roundtrip-global"))
            .outbound(outbound_rx),
    )
    .unwrap();

    outbound_tx.send(Payload::from("via-global")).unwrap();
    let delivered = inbound_rx.recv_timeout(TIMEOUT).unwrap();
    assert_eq!(delivered.parts()[0].as_ref(), b"via-global");
}
