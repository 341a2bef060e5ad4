//! Socket Loop (socket-owning thread)
//!
//! One loop == one context's worth of sockets.
//!
//! Responsibilities:
//! - Own every registered socket plus the control PAIR (no other thread ever
//!   touches them)
//! - Block in the poller; wake on wire traffic or a control sentinel
//! - Perform every socket operation: register, close, send, receive, user
//!   commands
//! - Forward inbound messages and command replies to the channel loop
//! - Never touch an application channel (delegated to the channel loop)
//!
//! Readiness tie-break: when several sockets are readable at once, one is
//! picked uniformly at random, mirroring the channel selector's
//! nondeterminism so no socket can starve the others.

use hashbrown::HashMap;
use rand::Rng;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, error, warn};

use crate::command::{SocketCommand, SocketEvent, SocketFn, SocketId};
use crate::control::{SENTINEL, SHUTDOWN};
use crate::message::Payload;

/// Which poll entry fired.
enum Readied {
    Control,
    Socket(SocketId),
}

/// Whether the loop keeps running after a control frame.
enum Flow {
    Continue,
    Shutdown,
}

/// The socket-owning worker. Constructed by the context factory and consumed
/// by its thread's `run`.
pub struct SocketLoop {
    control: zmq::Socket,
    queue: flume::Receiver<SocketCommand>,
    events: flume::Sender<SocketEvent>,
    sockets: HashMap<SocketId, zmq::Socket>,
}

impl SocketLoop {
    /// Wrap the bound server end of the control PAIR, the command queue
    /// receiver, and the event channel into the channel loop.
    pub fn new(
        control: zmq::Socket,
        queue: flume::Receiver<SocketCommand>,
        events: flume::Sender<SocketEvent>,
    ) -> Self {
        Self {
            control,
            queue,
            events,
            sockets: HashMap::new(),
        }
    }

    /// Run until shutdown. Closes every socket (control PAIR included) on the
    /// way out.
    pub fn run(mut self) {
        let mut rng = rand::thread_rng();
        loop {
            let readied = match self.next_ready(&mut rng) {
                Ok(readied) => readied,
                Err(e) => {
                    error!(error = %e, "poll failed; socket loop exiting");
                    break;
                }
            };
            match readied {
                Readied::Control => match self.handle_control() {
                    Ok(Flow::Continue) => {}
                    Ok(Flow::Shutdown) => break,
                    Err(e) => {
                        error!(error = %e, "control receive failed; socket loop exiting");
                        break;
                    }
                },
                Readied::Socket(sid) => self.forward_inbound(sid),
            }
        }
        let closed = self.sockets.len();
        self.sockets.clear();
        debug!(closed, "socket loop exited");
    }

    /// Block until at least one socket is readable and pick one uniformly at
    /// random among the ready set.
    ///
    /// The poll-item list is rebuilt every iteration: poll items borrow the
    /// sockets, so a cached list could not survive table changes.
    fn next_ready(&self, rng: &mut impl Rng) -> zmq::Result<Readied> {
        loop {
            let mut ids: Vec<Option<&SocketId>> = Vec::with_capacity(self.sockets.len() + 1);
            let mut items: Vec<zmq::PollItem<'_>> = Vec::with_capacity(self.sockets.len() + 1);
            ids.push(None);
            items.push(self.control.as_poll_item(zmq::POLLIN));
            for (sid, socket) in &self.sockets {
                ids.push(Some(sid));
                items.push(socket.as_poll_item(zmq::POLLIN));
            }

            match zmq::poll(&mut items, -1) {
                Ok(_) => {}
                Err(zmq::Error::EINTR) => continue,
                Err(e) => return Err(e),
            }

            let ready: Vec<usize> = items
                .iter()
                .enumerate()
                .filter(|(_, item)| item.is_readable())
                .map(|(index, _)| index)
                .collect();
            if ready.is_empty() {
                continue;
            }
            let picked = ready[rng.gen_range(0..ready.len())];
            return Ok(match ids[picked] {
                None => Readied::Control,
                Some(sid) => Readied::Socket(sid.clone()),
            });
        }
    }

    fn handle_control(&mut self) -> zmq::Result<Flow> {
        let frame = self.control.recv_bytes(0)?;
        if frame == SENTINEL {
            // Exactly one record per sentinel, enqueued strictly before the
            // sentinel was sent, so the take cannot block.
            let Ok(cmd) = self.queue.try_recv() else {
                panic!("sentinel received with an empty command queue");
            };
            self.apply(cmd);
            Ok(Flow::Continue)
        } else if frame == SHUTDOWN {
            Ok(Flow::Shutdown)
        } else {
            panic!("unexpected control frame: {frame:?}");
        }
    }

    fn apply(&mut self, cmd: SocketCommand) {
        match cmd {
            SocketCommand::Register(sid, socket) => {
                debug!(%sid, "socket registered");
                self.sockets.insert(sid, socket);
            }
            SocketCommand::Close(sid) => {
                if self.sockets.remove(&sid).is_none() {
                    debug!(%sid, "close for unknown socket");
                }
            }
            SocketCommand::Command(sid, f) => self.run_command(sid, f),
            SocketCommand::Outgoing(sid, payload) => self.transmit(&sid, &payload),
        }
    }

    /// Run a user closure against the socket. A panic is contained to the
    /// command: it is logged, no reply is delivered, and the socket stays
    /// registered.
    fn run_command(&mut self, sid: SocketId, f: SocketFn) {
        let Some(socket) = self.sockets.get(&sid) else {
            warn!(%sid, "command for unknown socket");
            return;
        };
        match panic::catch_unwind(AssertUnwindSafe(|| f(socket))) {
            Ok(Some(reply)) => {
                if self.events.send(SocketEvent::Reply(sid, reply)).is_err() {
                    debug!("channel loop gone; command reply dropped");
                }
            }
            Ok(None) => {}
            Err(_) => error!(%sid, "socket command panicked"),
        }
    }

    fn transmit(&self, sid: &SocketId, payload: &Payload) {
        let Some(socket) = self.sockets.get(sid) else {
            warn!(%sid, "outgoing message for unknown socket");
            return;
        };
        match send_payload(socket, payload) {
            Ok(true) => {}
            Ok(false) => warn!(%sid, "outgoing message dropped (send would block)"),
            Err(e) => error!(%sid, error = %e, "outgoing send failed"),
        }
    }

    fn forward_inbound(&mut self, sid: SocketId) {
        let Some(socket) = self.sockets.get(&sid) else {
            return;
        };
        match recv_payload(socket) {
            Ok(payload) => {
                if self.events.send(SocketEvent::Inbound(sid, payload)).is_err() {
                    debug!("channel loop gone; inbound message dropped");
                }
            }
            Err(e) => error!(%sid, error = %e, "inbound receive failed"),
        }
    }
}

/// Drain every part of the pending message so framing survives the trip.
fn recv_payload(socket: &zmq::Socket) -> zmq::Result<Payload> {
    let mut parts = Vec::new();
    loop {
        let part = socket.recv_bytes(0)?;
        parts.push(bytes::Bytes::from(part));
        if !socket.get_rcvmore()? {
            break;
        }
    }
    Ok(Payload::from_parts(parts))
}

/// Non-blocking multipart send. Returns `Ok(false)` when any part would
/// block; the remainder of the message is dropped rather than sent partially
/// blocking. The outgoing direction trades delivery for liveness: the socket
/// loop must never stall on a slow peer.
fn send_payload(socket: &zmq::Socket, payload: &Payload) -> zmq::Result<bool> {
    let parts = payload.parts();
    let Some(last) = parts.len().checked_sub(1) else {
        warn!("refusing to send empty payload");
        return Ok(true);
    };
    for (index, part) in parts.iter().enumerate() {
        let flags = if index < last {
            zmq::DONTWAIT | zmq::SNDMORE
        } else {
            zmq::DONTWAIT
        };
        match socket.send(part.as_ref(), flags) {
            Ok(()) => {}
            Err(zmq::Error::EAGAIN) => return Ok(false),
            Err(e) => return Err(e),
        }
    }
    Ok(true)
}
