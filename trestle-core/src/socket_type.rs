//! Socket type enumeration for the registration API.
//!
//! This module provides the `SocketKind` enum covering the socket types a
//! registration may name, and the mapping onto the native library's enum.

use std::fmt;
use std::str::FromStr;

use crate::error::TrestleError;

/// ZeroMQ socket types accepted by the registration API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SocketKind {
    /// PAIR socket for exclusive bidirectional communication
    Pair,
    /// PUB socket for publishing messages to subscribers
    Pub,
    /// SUB socket for subscribing to published messages
    Sub,
    /// REQ socket for synchronous request-reply clients
    Req,
    /// REP socket for synchronous request-reply servers
    Rep,
    /// Deprecated libzmq alias for DEALER
    Xreq,
    /// Deprecated libzmq alias for ROUTER
    Xrep,
    /// DEALER socket for asynchronous request-reply patterns
    Dealer,
    /// ROUTER socket for routing messages by identity
    Router,
    /// XPUB socket for publishers with subscription awareness
    Xpub,
    /// XSUB socket for subscribers with dynamic subscriptions
    Xsub,
    /// PULL socket for receiving messages from pushers
    Pull,
    /// PUSH socket for sending messages to pullers
    Push,
}

impl SocketKind {
    /// Get the socket kind as its lowercase wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pair => "pair",
            Self::Pub => "pub",
            Self::Sub => "sub",
            Self::Req => "req",
            Self::Rep => "rep",
            Self::Xreq => "xreq",
            Self::Xrep => "xrep",
            Self::Dealer => "dealer",
            Self::Router => "router",
            Self::Xpub => "xpub",
            Self::Xsub => "xsub",
            Self::Pull => "pull",
            Self::Push => "push",
        }
    }

    /// Map onto the native library's socket type. The deprecated `xreq` and
    /// `xrep` names resolve to DEALER and ROUTER, as libzmq aliases them.
    pub fn to_zmq(self) -> zmq::SocketType {
        match self {
            Self::Pair => zmq::PAIR,
            Self::Pub => zmq::PUB,
            Self::Sub => zmq::SUB,
            Self::Req => zmq::REQ,
            Self::Rep => zmq::REP,
            Self::Xreq | Self::Dealer => zmq::DEALER,
            Self::Xrep | Self::Router => zmq::ROUTER,
            Self::Xpub => zmq::XPUB,
            Self::Xsub => zmq::XSUB,
            Self::Pull => zmq::PULL,
            Self::Push => zmq::PUSH,
        }
    }
}

impl fmt::Display for SocketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SocketKind {
    type Err = TrestleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pair" => Ok(Self::Pair),
            "pub" => Ok(Self::Pub),
            "sub" => Ok(Self::Sub),
            "req" => Ok(Self::Req),
            "rep" => Ok(Self::Rep),
            "xreq" => Ok(Self::Xreq),
            "xrep" => Ok(Self::Xrep),
            "dealer" => Ok(Self::Dealer),
            "router" => Ok(Self::Router),
            "xpub" => Ok(Self::Xpub),
            "xsub" => Ok(Self::Xsub),
            "pull" => Ok(Self::Pull),
            "push" => Ok(Self::Push),
            other => Err(TrestleError::UnknownSocketType(other.to_owned())),
        }
    }
}
