//! Control transport between the channel loop and the socket loop.
//!
//! Two conduits with one job each: a bounded FIFO queue carries the typed
//! command records, and an intra-process PAIR socket carries a one-frame
//! sentinel per record so the socket loop's poller wakes up. The poller can
//! only wait on sockets, and sending rich commands as socket frames would
//! force serialization; splitting payload from wake-up sidesteps both.
//!
//! Invariant: the queue send completes before the sentinel is sent, so a
//! received sentinel guarantees a record is already waiting.

use tracing::error;

use crate::command::SocketCommand;

/// Wake-up frame sent on the control PAIR after each enqueue.
pub const SENTINEL: &[u8] = b"sentinel";

/// Frame telling the socket loop to close every socket and exit.
pub const SHUTDOWN: &[u8] = b"shutdown";

/// Capacity of the command queue. Its fullness blocks the channel loop and is
/// the system's backpressure point toward producers.
pub const COMMAND_QUEUE_DEPTH: usize = 8;

/// The channel loop's half of the control transport: queue sender plus the
/// connected client end of the control PAIR.
pub struct ControlLink {
    queue: flume::Sender<SocketCommand>,
    wakeup: zmq::Socket,
}

impl ControlLink {
    /// Wrap the queue sender and the client PAIR. The PAIR must already be
    /// connected to the socket loop's server end.
    pub fn new(queue: flume::Sender<SocketCommand>, wakeup: zmq::Socket) -> Self {
        Self { queue, wakeup }
    }

    /// Enqueue one command record and wake the socket loop.
    ///
    /// Blocks while the queue is full. The sentinel uses a blocking send as
    /// well: a lost wake-up would strand the record forever.
    pub fn wake(&self, cmd: SocketCommand) {
        if self.queue.send(cmd).is_err() {
            error!("socket loop has exited; command dropped");
            return;
        }
        if let Err(e) = self.wakeup.send(SENTINEL, 0) {
            error!(error = %e, "failed to wake socket loop");
        }
    }

    /// Tell the socket loop to tear everything down.
    pub fn wake_shutdown(&self) {
        if let Err(e) = self.wakeup.send(SHUTDOWN, 0) {
            error!(error = %e, "failed to send shutdown to socket loop");
        }
    }
}
