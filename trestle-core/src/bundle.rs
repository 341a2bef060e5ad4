//! Per-socket channel bundle.
//!
//! The system-side endpoints of up to four channels. The application keeps
//! the opposite ends. All four are serviced exclusively by the channel loop's
//! thread; dropping the bundle closes the application's ends.

use flume::{Receiver, Sender};
use std::fmt;

use crate::command::{CommandReply, SocketFn};
use crate::message::Payload;

/// Channel endpoints held by the system for one registered socket.
pub struct ChannelBundle {
    /// Payloads the application wants transmitted (application → wire)
    pub outbound: Option<Receiver<Payload>>,
    /// Wire messages delivered to the application (wire → application).
    /// Serviced with non-blocking sends; a full channel drops the message.
    pub inbound: Option<Sender<Payload>>,
    /// Closures to run against the socket on the socket loop's thread
    pub commands: Option<Receiver<SocketFn>>,
    /// Results returned by those closures. Serviced with non-blocking sends.
    pub replies: Option<Sender<CommandReply>>,
}

impl ChannelBundle {
    /// A bundle must carry at least one of the two message directions.
    #[must_use]
    pub fn has_endpoints(&self) -> bool {
        self.outbound.is_some() || self.inbound.is_some()
    }
}

impl fmt::Debug for ChannelBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelBundle")
            .field("outbound", &self.outbound.is_some())
            .field("inbound", &self.inbound.is_some())
            .field("commands", &self.commands.is_some())
            .field("replies", &self.replies.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_endpoints() {
        let (tx, rx) = flume::unbounded::<Payload>();

        let bundle = ChannelBundle {
            outbound: Some(rx),
            inbound: None,
            commands: None,
            replies: None,
        };
        assert!(bundle.has_endpoints());

        let bundle = ChannelBundle {
            outbound: None,
            inbound: Some(tx),
            commands: None,
            replies: None,
        };
        assert!(bundle.has_endpoints());

        let bundle = ChannelBundle {
            outbound: None,
            inbound: None,
            commands: None,
            replies: None,
        };
        assert!(!bundle.has_endpoints());
    }
}
