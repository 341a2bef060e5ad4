//! # Trestle
//!
//! A channel-based bridge for thread-confined `ZeroMQ` sockets.
//!
//! `ZeroMQ` sockets must be touched from exactly one thread. Trestle owns
//! them for you: register a socket together with a handful of channels, and
//! application code sends and receives multipart messages with ordinary
//! channel operations, never calling the native API directly.
//!
//! ## Architecture
//!
//! Two long-lived worker threads per [`Context`]:
//!
//! - **Socket thread**: owns every registered socket, blocks in the native
//!   poller, performs all socket operations.
//! - **Channel thread**: owns the channel side of every registration, blocks
//!   in a channel selector, routes messages between the application and the
//!   socket thread.
//!
//! The threads talk over a bounded command queue paired with a sentinel
//! frame on an intra-process PAIR socket, so each can stay blocked on its
//! native primitive while remaining promptly interruptible by the other.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use trestle::{flume, register, Payload, Registration, SocketKind};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Application keeps one end of each channel; the bridge services the
//!     // other.
//!     let (to_wire, outbound) = flume::bounded::<Payload>(64);
//!     let (inbound, from_wire) = flume::bounded::<Payload>(64);
//!
//!     register(
//!         Registration::new()
//!             .socket_type(SocketKind::Req)
//!             .configure(|socket| socket.connect("tcp://127.0.0.1:5555"))
//!             .outbound(outbound)
//!             .inbound(inbound),
//!     )?;
//!
//!     to_wire.send(Payload::from("ping"))?;
//!     let reply = from_wire.recv()?;
//!     println!("reply: {reply:?}");
//!     Ok(())
//! }
//! ```
//!
//! ## Delivery semantics
//!
//! - Framing is preserved: one part sent arrives as one part, N parts as N.
//! - Per-socket ordering is FIFO in both directions; nothing is promised
//!   across sockets.
//! - Outbound sends that would block on the wire are dropped with a warning;
//!   inbound deliveries into a full application channel likewise. Keep the
//!   inbound channel drained.
//! - Dropping your end of an `outbound` or `commands` channel closes the
//!   whole pairing, socket included. [`Context::shutdown`] closes everything.

#![warn(missing_docs)]

pub mod context;
pub mod dev_tracing;
pub mod registration;

pub use context::Context;
pub use registration::{Configurator, Registration};
pub use trestle_core::bundle::ChannelBundle;
pub use trestle_core::command::{CommandReply, SocketFn, SocketId};
pub use trestle_core::error::{Result, TrestleError};
pub use trestle_core::message::Payload;
pub use trestle_core::socket_type::SocketKind;

// Re-exports for user convenience: the API traffics in these crates' types.
pub use bytes;
pub use flume;
pub use zmq;

use once_cell::sync::Lazy;

static GLOBAL: Lazy<Context> = Lazy::new(|| Context::new("trestle-global"));

/// The process-wide context used by the free [`register`] function,
/// initialized on first use. It lives until process exit; create explicit
/// [`Context`]s for scoped lifetimes.
pub fn global() -> &'static Context {
    &GLOBAL
}

/// Register a socket with the global context. See
/// [`Context::register`] for semantics and errors.
pub fn register(registration: Registration) -> Result<()> {
    global().register(registration)
}

/// Convenience re-exports for downstream code.
pub mod prelude {
    pub use crate::context::Context;
    pub use crate::registration::{Configurator, Registration};
    pub use crate::{global, register};
    pub use trestle_core::command::{CommandReply, SocketFn, SocketId};
    pub use trestle_core::error::{Result, TrestleError};
    pub use trestle_core::message::Payload;
    pub use trestle_core::socket_type::SocketKind;
}
