//! Registration builder.
//!
//! A registration names the socket (either pre-built, or a socket type plus
//! a configurator closure that binds/connects it) and the channel endpoints
//! the system will service for it. At least one of the two message
//! directions must be present.

use trestle_core::bundle::ChannelBundle;
use trestle_core::command::{CommandReply, SocketFn};
use trestle_core::error::{Result, TrestleError};
use trestle_core::message::Payload;
use trestle_core::socket_type::SocketKind;

/// Closure that prepares a freshly created socket: set options, then bind or
/// connect. Runs on the registering thread, before the socket moves to the
/// socket thread.
pub type Configurator = Box<dyn FnOnce(&zmq::Socket) -> zmq::Result<()> + Send>;

/// Builder for one socket/bundle pairing, consumed by
/// [`Context::register`](crate::Context::register).
#[derive(Default)]
pub struct Registration {
    socket: Option<zmq::Socket>,
    kind: Option<SocketKind>,
    configurator: Option<Configurator>,
    outbound: Option<flume::Receiver<Payload>>,
    inbound: Option<flume::Sender<Payload>>,
    commands: Option<flume::Receiver<SocketFn>>,
    replies: Option<flume::Sender<CommandReply>>,
}

impl Registration {
    /// Start an empty registration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a pre-built socket. Mutually exclusive with `socket_type` /
    /// `configure`; the caller must not touch the socket afterwards.
    #[must_use]
    pub fn socket(mut self, socket: zmq::Socket) -> Self {
        self.socket = Some(socket);
        self
    }

    /// Have the bridge create a socket of this type. Requires `configure`.
    #[must_use]
    pub fn socket_type(mut self, kind: SocketKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Configurator for a bridge-created socket; responsible for binding or
    /// connecting it.
    #[must_use]
    pub fn configure(
        mut self,
        f: impl FnOnce(&zmq::Socket) -> zmq::Result<()> + Send + 'static,
    ) -> Self {
        self.configurator = Some(Box::new(f));
        self
    }

    /// Receiver of payloads the application wants transmitted. Bounded
    /// capacity here plus the internal command queue is what backpressures
    /// producers.
    #[must_use]
    pub fn outbound(mut self, rx: flume::Receiver<Payload>) -> Self {
        self.outbound = Some(rx);
        self
    }

    /// Sender for messages arriving off the wire. Serviced with non-blocking
    /// sends: keep it drained, or messages are dropped with a warning.
    #[must_use]
    pub fn inbound(mut self, tx: flume::Sender<Payload>) -> Self {
        self.inbound = Some(tx);
        self
    }

    /// Receiver of closures to run against the socket on the socket thread.
    /// A closure that panics is logged and discarded; nothing reaches the
    /// reply channel.
    #[must_use]
    pub fn commands(mut self, rx: flume::Receiver<SocketFn>) -> Self {
        self.commands = Some(rx);
        self
    }

    /// Sender for non-null command results. Serviced with non-blocking
    /// sends; a full channel drops the reply with a warning.
    #[must_use]
    pub fn replies(mut self, tx: flume::Sender<CommandReply>) -> Self {
        self.replies = Some(tx);
        self
    }

    /// Validate and resolve into the socket plus the system-side bundle.
    /// Creates and configures the socket when a type was given instead.
    pub(crate) fn into_parts(self, ctx: &zmq::Context) -> Result<(zmq::Socket, ChannelBundle)> {
        let bundle = ChannelBundle {
            outbound: self.outbound,
            inbound: self.inbound,
            commands: self.commands,
            replies: self.replies,
        };
        if !bundle.has_endpoints() {
            return Err(TrestleError::usage(
                "at least one of outbound and inbound is required",
            ));
        }
        let socket = match (self.socket, self.kind, self.configurator) {
            (Some(socket), None, None) => socket,
            (None, Some(kind), Some(configure)) => {
                let socket = ctx.socket(kind.to_zmq())?;
                configure(&socket)?;
                socket
            }
            (Some(_), _, _) => {
                return Err(TrestleError::usage(
                    "a pre-built socket excludes socket_type and configure",
                ));
            }
            (None, _, _) => {
                return Err(TrestleError::usage(
                    "either a socket or both socket_type and configure are required",
                ));
            }
        };
        Ok((socket, bundle))
    }
}
