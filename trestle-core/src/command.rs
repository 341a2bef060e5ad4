//! The tagged unions crossing the two worker threads.
//!
//! `SocketCommand` records travel C → B over the bounded command queue, one
//! sentinel frame per record. `ApiEvent` and `SocketEvent` make up the
//! channel loop's inbox: registration requests from the public API and
//! inbound traffic pushed back by the socket loop.

use std::any::Any;
use std::fmt;

use crate::bundle::ChannelBundle;
use crate::message::Payload;

/// Opaque identifier tying a live socket (owned by the socket loop) to its
/// channel bundle (owned by the channel loop). Unique within a context.
pub type SocketId = String;

/// Result of a socket command, carried back to the application as an opaque
/// blob to be downcast by the caller.
pub type CommandReply = Box<dyn Any + Send>;

/// A closure executed against a socket on the socket loop's thread.
///
/// Returning `Some` delivers exactly one reply on the bundle's reply channel;
/// returning `None` delivers nothing.
pub type SocketFn = Box<dyn FnOnce(&zmq::Socket) -> Option<CommandReply> + Send>;

/// Command records flowing from the channel loop to the socket loop.
pub enum SocketCommand {
    /// Take ownership of a freshly registered socket
    Register(SocketId, zmq::Socket),
    /// Close the socket and forget the id
    Close(SocketId),
    /// Run a user closure against the socket
    Command(SocketId, SocketFn),
    /// Transmit a payload over the socket
    Outgoing(SocketId, Payload),
}

impl fmt::Debug for SocketCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Register(sid, _) => write!(f, "Register({sid})"),
            Self::Close(sid) => write!(f, "Close({sid})"),
            Self::Command(sid, _) => write!(f, "Command({sid})"),
            Self::Outgoing(sid, payload) => {
                write!(f, "Outgoing({sid}, {} part(s))", payload.len())
            }
        }
    }
}

/// Requests from the public registration API to the channel loop.
pub enum ApiEvent {
    /// Pair a configured socket with its channel bundle. The channel loop
    /// generates the socket id and forwards the socket to the socket loop.
    Register {
        /// Socket to hand over to the socket loop
        socket: zmq::Socket,
        /// Channel endpoints the system will service for this socket
        bundle: ChannelBundle,
    },
}

impl fmt::Debug for ApiEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Register { bundle, .. } => write!(f, "Register {{ {bundle:?} }}"),
        }
    }
}

/// Events pushed by the socket loop back to the channel loop.
pub enum SocketEvent {
    /// A message received off the wire
    Inbound(SocketId, Payload),
    /// A non-null result returned by a socket command
    Reply(SocketId, CommandReply),
}

impl fmt::Debug for SocketEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inbound(sid, payload) => {
                write!(f, "Inbound({sid}, {} part(s))", payload.len())
            }
            Self::Reply(sid, _) => write!(f, "Reply({sid})"),
        }
    }
}
