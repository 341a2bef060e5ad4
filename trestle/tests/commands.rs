//! Socket commands execute on the socket thread; non-null results come back
//! on the reply channel, null results produce nothing, and a panicking
//! command leaves the bridge running.

use std::time::Duration;

use trestle::{CommandReply, Context, Payload, Registration, SocketFn, SocketKind};

const TIMEOUT: Duration = Duration::from_secs(5);

struct CommandedSocket {
    commands: flume::Sender<SocketFn>,
    replies: flume::Receiver<CommandReply>,
    // The bundle must carry a message direction even for command-only use;
    // keep the application end alive for the test's duration.
    _inbound: flume::Receiver<Payload>,
}

fn commanded_dealer(ctx: &Context, addr: &'static str, identity: &'static [u8]) -> CommandedSocket {
    let (cmd_tx, cmd_rx) = flume::unbounded::<SocketFn>();
    let (reply_tx, reply_rx) = flume::bounded::<CommandReply>(4);
    let (inbound_tx, inbound_rx) = flume::bounded::<Payload>(4);
    ctx.register(
        Registration::new()
            .socket_type(SocketKind::Dealer)
            .configure(move |socket| {
                socket.set_identity(identity)?;
                socket.bind(addr)
            })
            .inbound(inbound_tx)
            .commands(cmd_rx)
            .replies(reply_tx),
    )
    .unwrap();
    CommandedSocket {
        commands: cmd_tx,
        replies: reply_rx,
        _inbound: inbound_rx,
    }
}

#[test]
fn test_command_returns_reply() {
    let ctx = Context::new("commands-reply");
    let socket = commanded_dealer(&ctx, "inproc://commands-reply", b"trestle-dealer");

    let fetch_identity: SocketFn = Box::new(|socket| {
        Some(Box::new(socket.get_identity().unwrap()) as CommandReply)
    });
    socket.commands.send(fetch_identity).unwrap();

    let reply = socket.replies.recv_timeout(TIMEOUT).unwrap();
    let identity = reply.downcast::<Vec<u8>>().unwrap();
    assert_eq!(identity.as_slice(), b"trestle-dealer");

    // Exactly one delivery per non-null result.
    assert!(socket.replies.try_recv().is_err());

    ctx.shutdown();
}

#[test]
fn test_null_command_delivers_nothing() {
    let ctx = Context::new("commands-null");
    let socket = commanded_dealer(&ctx, "inproc://commands-null", b"quiet");

    let silent: SocketFn = Box::new(|socket| {
        socket.set_rcvhwm(500).unwrap();
        None
    });
    socket.commands.send(silent).unwrap();

    assert!(
        socket
            .replies
            .recv_timeout(Duration::from_millis(300))
            .is_err(),
        "a null result must not reach the reply channel"
    );

    ctx.shutdown();
}

#[test]
fn test_panicking_command_keeps_bridge_alive() {
    let ctx = Context::new("commands-panic");
    let socket = commanded_dealer(&ctx, "inproc://commands-panic", b"survivor");

    let explode: SocketFn = Box::new(|_socket| panic!("user command failure"));
    socket.commands.send(explode).unwrap();

    // The socket stays registered and later commands still execute.
    let fetch_identity: SocketFn = Box::new(|socket| {
        Some(Box::new(socket.get_identity().unwrap()) as CommandReply)
    });
    socket.commands.send(fetch_identity).unwrap();

    let reply = socket.replies.recv_timeout(TIMEOUT).unwrap();
    let identity = reply.downcast::<Vec<u8>>().unwrap();
    assert_eq!(identity.as_slice(), b"survivor");

    ctx.shutdown();
}
