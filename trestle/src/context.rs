//! Context factory and lifecycle.
//!
//! A `Context` owns one native messaging context and the pair of worker
//! threads bridging its sockets to channels. Construction is infallible and
//! lazy; the transport is wired up by `initialize`, which `register` calls on
//! demand. Shutdown closes the registration channel and joins both workers.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread::{self, JoinHandle};
use tracing::{debug, error};

use trestle_core::channel_loop::ChannelLoop;
use trestle_core::command::ApiEvent;
use trestle_core::control::{ControlLink, COMMAND_QUEUE_DEPTH};
use trestle_core::error::{Result, TrestleError};
use trestle_core::socket_loop::SocketLoop;

use crate::registration::Registration;

/// Distinguishes control endpoints across contexts sharing a process.
static ENDPOINT_COUNTER: AtomicUsize = AtomicUsize::new(0);

enum State {
    /// Created but not yet wired; holds the registration receiver until the
    /// channel loop takes it
    Idle { api: flume::Receiver<ApiEvent> },
    /// Both workers running
    Running {
        socket_thread: JoinHandle<()>,
        channel_thread: JoinHandle<()>,
    },
    /// Shut down; a new context must be created
    Terminated,
}

/// One bridge instance: a native messaging context plus its two worker
/// threads.
///
/// `Context` is `Sync`; registrations may come from any thread. Dropping the
/// context performs a best-effort `shutdown`.
pub struct Context {
    name: String,
    zmq: zmq::Context,
    registrations: Mutex<Option<flume::Sender<ApiEvent>>>,
    state: Mutex<State>,
}

impl Context {
    /// Create an unstarted context. No threads or sockets exist until
    /// `initialize` (or the first `register`) runs.
    pub fn new(name: impl Into<String>) -> Self {
        let (tx, rx) = flume::unbounded();
        Self {
            name: name.into(),
            zmq: zmq::Context::new(),
            registrations: Mutex::new(Some(tx)),
            state: Mutex::new(State::Idle { api: rx }),
        }
    }

    /// The context's human-readable name, also used for thread names and the
    /// control endpoint address.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The native messaging context. Peer sockets built from it can reach
    /// registered sockets over `inproc://` endpoints.
    pub fn zmq_context(&self) -> &zmq::Context {
        &self.zmq
    }

    /// True while both worker threads are running.
    pub fn is_running(&self) -> bool {
        matches!(&*self.state.lock(), State::Running { .. })
    }

    /// Wire the control transport and start both workers. Idempotent; fails
    /// with [`TrestleError::Terminated`] after `shutdown` (no restart is
    /// defined; create a new context instead).
    pub fn initialize(&self) -> Result<()> {
        let mut state = self.state.lock();
        match &*state {
            State::Running { .. } => return Ok(()),
            State::Terminated => return Err(TrestleError::Terminated),
            State::Idle { .. } => {}
        }
        let State::Idle { api } = std::mem::replace(&mut *state, State::Terminated) else {
            unreachable!()
        };

        let (queue_tx, queue_rx) = flume::bounded(COMMAND_QUEUE_DEPTH);
        let (event_tx, event_rx) = flume::unbounded();

        let addr = format!(
            "inproc://{}-control-{}",
            self.name,
            ENDPOINT_COUNTER.fetch_add(1, Ordering::Relaxed)
        );
        let server = self.zmq.socket(zmq::PAIR)?;
        server.set_linger(0)?;
        let client = self.zmq.socket(zmq::PAIR)?;
        client.set_linger(0)?;
        // Intra-process transports require the bind before the connect.
        server.bind(&addr)?;
        client.connect(&addr)?;

        let socket_loop = SocketLoop::new(server, queue_rx, event_tx);
        let socket_thread = thread::Builder::new()
            .name(format!("{}-socket", self.name))
            .spawn(move || socket_loop.run())?;

        let channel_loop = ChannelLoop::new(api, event_rx, ControlLink::new(queue_tx, client));
        let channel_thread = thread::Builder::new()
            .name(format!("{}-chan", self.name))
            .spawn(move || channel_loop.run())?;

        debug!(name = %self.name, %addr, "context initialized");
        *state = State::Running {
            socket_thread,
            channel_thread,
        };
        Ok(())
    }

    /// Validate a registration, build and configure the socket if one was not
    /// supplied, and hand it to the worker threads.
    ///
    /// This is the only way a socket enters the bridge. The socket moves to
    /// the socket thread and is never touched by the caller again; the
    /// channels in the registration are serviced by the channel thread.
    pub fn register(&self, registration: Registration) -> Result<()> {
        let (socket, bundle) = registration.into_parts(&self.zmq)?;
        self.initialize()?;
        let Some(tx) = self.registrations.lock().clone() else {
            return Err(TrestleError::Terminated);
        };
        tx.send(ApiEvent::Register { socket, bundle })
            .map_err(|_| TrestleError::Terminated)
    }

    /// Tear the context down: close the registration channel, which makes the
    /// channel loop close every pairing and stop the socket loop, then join
    /// both workers. Idempotent; returns once both threads have exited.
    pub fn shutdown(&self) {
        if self.registrations.lock().take().is_none() {
            return;
        }
        let prev = {
            let mut state = self.state.lock();
            std::mem::replace(&mut *state, State::Terminated)
        };
        if let State::Running {
            socket_thread,
            channel_thread,
        } = prev
        {
            if channel_thread.join().is_err() {
                error!(name = %self.name, "channel loop panicked");
            }
            if socket_thread.join().is_err() {
                error!(name = %self.name, "socket loop panicked");
            }
        }
        debug!(name = %self.name, "context shut down");
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new("trestle")
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        self.shutdown();
    }
}
