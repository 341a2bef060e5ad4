//! Channel Loop (channel-owning thread)
//!
//! The routing half of the bridge.
//!
//! Responsibilities:
//! - Own the pairing table (socket-id → channel bundle) and every endpoint
//!   in it
//! - Block in the channel selector; wake on application traffic,
//!   registration requests, or events from the socket loop
//! - Route outbound payloads and commands to the socket loop via the control
//!   link
//! - Deliver inbound payloads and command replies to application channels
//!   with non-blocking sends (a stuck application can drop messages but can
//!   never wedge this loop)
//! - Drive the close protocol for a single pairing and for full teardown
//!
//! A disconnected receiver is the "closed" signal throughout: dropping a
//! bundle's application end closes that pairing, dropping the registration
//! sender tears down the whole context.

use hashbrown::HashMap;
use tracing::{debug, error, warn};

use crate::bundle::ChannelBundle;
use crate::command::{ApiEvent, CommandReply, SocketCommand, SocketEvent, SocketFn, SocketId};
use crate::control::ControlLink;
use crate::message::Payload;

/// What the selector produced on one iteration. `None` payloads mean the
/// corresponding channel disconnected.
enum Wakeup {
    Api(Option<ApiEvent>),
    Socket(Option<SocketEvent>),
    Outbound(SocketId, Option<Payload>),
    Command(SocketId, Option<SocketFn>),
}

/// The channel-owning worker. Constructed by the context factory and consumed
/// by its thread's `run`.
pub struct ChannelLoop {
    api: flume::Receiver<ApiEvent>,
    events: flume::Receiver<SocketEvent>,
    link: ControlLink,
    table: HashMap<SocketId, ChannelBundle>,
    next_id: u64,
}

impl ChannelLoop {
    /// Wrap the registration receiver, the socket-event receiver, and the
    /// control link toward the socket loop.
    pub fn new(
        api: flume::Receiver<ApiEvent>,
        events: flume::Receiver<SocketEvent>,
        link: ControlLink,
    ) -> Self {
        Self {
            api,
            events,
            link,
            table: HashMap::new(),
            next_id: 0,
        }
    }

    /// Run until the registration channel closes, then close every pairing,
    /// signal the socket loop to shut down, and exit.
    pub fn run(mut self) {
        loop {
            let wakeup = {
                let mut selector = flume::Selector::new()
                    .recv(&self.api, |result| Wakeup::Api(result.ok()))
                    .recv(&self.events, |result| Wakeup::Socket(result.ok()));
                for (sid, bundle) in &self.table {
                    if let Some(outbound) = &bundle.outbound {
                        let sid = sid.clone();
                        selector = selector
                            .recv(outbound, move |result| Wakeup::Outbound(sid.clone(), result.ok()));
                    }
                    if let Some(commands) = &bundle.commands {
                        let sid = sid.clone();
                        selector = selector
                            .recv(commands, move |result| Wakeup::Command(sid.clone(), result.ok()));
                    }
                }
                selector.wait()
            };

            match wakeup {
                Wakeup::Api(Some(ApiEvent::Register { socket, bundle })) => {
                    self.register(socket, bundle);
                }
                Wakeup::Api(None) => {
                    // Registration channel closed: the shutdown signal.
                    self.teardown();
                    break;
                }
                Wakeup::Socket(Some(SocketEvent::Inbound(sid, payload))) => {
                    self.deliver(&sid, payload);
                }
                Wakeup::Socket(Some(SocketEvent::Reply(sid, reply))) => {
                    self.deliver_reply(&sid, reply);
                }
                Wakeup::Socket(None) => {
                    error!("socket loop exited unexpectedly; channel loop exiting");
                    self.table.clear();
                    break;
                }
                Wakeup::Outbound(sid, Some(payload)) => {
                    self.link.wake(SocketCommand::Outgoing(sid, payload));
                }
                Wakeup::Command(sid, Some(f)) => {
                    self.link.wake(SocketCommand::Command(sid, f));
                }
                Wakeup::Outbound(sid, None) | Wakeup::Command(sid, None) => {
                    // The application dropped a read-side endpoint.
                    self.close_pairing(&sid);
                }
            }
        }
        debug!("channel loop exited");
    }

    /// Pair a socket with its bundle under a fresh id and hand the socket to
    /// the socket loop. The id is the only part of the socket this thread
    /// ever holds again.
    fn register(&mut self, socket: zmq::Socket, bundle: ChannelBundle) {
        self.next_id += 1;
        let sid: SocketId = format!("zmq-{}", self.next_id);
        debug!(%sid, ?bundle, "pairing registered");
        self.table.insert(sid.clone(), bundle);
        self.link.wake(SocketCommand::Register(sid, socket));
    }

    /// Deliver an inbound wire message. The bundle's inbound sender must
    /// never block, so a full channel drops the message with a warning.
    fn deliver(&mut self, sid: &SocketId, payload: Payload) {
        let Some(bundle) = self.table.get(sid) else {
            // The pairing closed while the message was in flight.
            debug!(%sid, "inbound message for closed pairing dropped");
            return;
        };
        let Some(inbound) = &bundle.inbound else {
            panic!("inbound message for {sid} but the bundle has no inbound channel");
        };
        match inbound.try_send(payload) {
            Ok(()) => {}
            Err(flume::TrySendError::Full(_)) => {
                warn!(%sid, "inbound message dropped (channel full)");
            }
            Err(flume::TrySendError::Disconnected(_)) => {
                warn!(%sid, "inbound message dropped (receiver gone)");
            }
        }
    }

    /// Deliver a command reply, if the bundle asked for replies at all.
    fn deliver_reply(&mut self, sid: &SocketId, reply: CommandReply) {
        let Some(bundle) = self.table.get(sid) else {
            debug!(%sid, "command reply for closed pairing dropped");
            return;
        };
        let Some(replies) = &bundle.replies else {
            debug!(%sid, "command reply discarded (no reply channel)");
            return;
        };
        if replies.try_send(reply).is_err() {
            warn!(%sid, "command reply dropped");
        }
    }

    /// Close one pairing: tell the socket loop to close the socket, then drop
    /// the bundle, which closes every channel the application still holds.
    fn close_pairing(&mut self, sid: &SocketId) {
        let Some(bundle) = self.table.remove(sid) else {
            return;
        };
        debug!(%sid, "pairing closed");
        self.link.wake(SocketCommand::Close(sid.clone()));
        drop(bundle);
    }

    /// Full teardown: close every pairing, then tell the socket loop to close
    /// its remaining sockets (the control PAIR) and exit.
    fn teardown(&mut self) {
        debug!(pairings = self.table.len(), "context shutting down");
        for (sid, bundle) in self.table.drain() {
            self.link.wake(SocketCommand::Close(sid));
            drop(bundle);
        }
        self.link.wake_shutdown();
    }
}
