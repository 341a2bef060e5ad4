//! Message payloads exchanged with the application.
//!
//! A payload is either a single frame or an ordered sequence of frames.
//! Framing survives the round-trip: one frame sent over a socket is delivered
//! to the peer's bundle as `Single`, N frames as an N-element `Multi`.

use bytes::Bytes;

/// A message travelling between an application channel and a socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Exactly one frame
    Single(Bytes),
    /// An ordered sequence of frames, sent and received as one message
    Multi(Vec<Bytes>),
}

impl Payload {
    /// Build a payload from received frames, normalizing a one-element
    /// sequence to `Single` so framing is preserved end to end.
    pub fn from_parts(mut parts: Vec<Bytes>) -> Self {
        if parts.len() == 1 {
            Self::Single(parts.remove(0))
        } else {
            Self::Multi(parts)
        }
    }

    /// View the frames in wire order.
    pub fn parts(&self) -> &[Bytes] {
        match self {
            Self::Single(part) => std::slice::from_ref(part),
            Self::Multi(parts) => parts,
        }
    }

    /// Consume the payload, yielding the frames in wire order.
    pub fn into_parts(self) -> Vec<Bytes> {
        match self {
            Self::Single(part) => vec![part],
            Self::Multi(parts) => parts,
        }
    }

    /// Number of frames.
    pub fn len(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Multi(parts) => parts.len(),
        }
    }

    /// True when the payload carries no frames at all. Such a payload cannot
    /// be transmitted and is dropped with a warning by the socket loop.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Single(_) => false,
            Self::Multi(parts) => parts.is_empty(),
        }
    }

    /// True for multi-frame payloads.
    #[must_use]
    pub fn is_multipart(&self) -> bool {
        matches!(self, Self::Multi(_))
    }
}

impl From<Bytes> for Payload {
    fn from(part: Bytes) -> Self {
        Self::Single(part)
    }
}

impl From<Vec<u8>> for Payload {
    fn from(part: Vec<u8>) -> Self {
        Self::Single(Bytes::from(part))
    }
}

impl From<&str> for Payload {
    fn from(part: &str) -> Self {
        Self::Single(Bytes::copy_from_slice(part.as_bytes()))
    }
}

impl From<String> for Payload {
    fn from(part: String) -> Self {
        Self::Single(Bytes::from(part.into_bytes()))
    }
}

impl From<Vec<Bytes>> for Payload {
    fn from(parts: Vec<Bytes>) -> Self {
        Self::from_parts(parts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_parts_normalizes_single() {
        let payload = Payload::from_parts(vec![Bytes::from_static(b"only")]);
        assert_eq!(payload, Payload::Single(Bytes::from_static(b"only")));
        assert!(!payload.is_multipart());
    }

    #[test]
    fn test_from_parts_keeps_multipart() {
        let parts = vec![
            Bytes::from_static(b"a"),
            Bytes::from_static(b"b"),
            Bytes::from_static(b"c"),
        ];
        let payload = Payload::from_parts(parts.clone());
        assert!(payload.is_multipart());
        assert_eq!(payload.parts(), &parts[..]);
        assert_eq!(payload.len(), 3);
    }

    #[test]
    fn test_single_part_view() {
        let payload = Payload::from("hello");
        assert_eq!(payload.parts(), &[Bytes::from_static(b"hello")]);
        assert_eq!(payload.into_parts(), vec![Bytes::from_static(b"hello")]);
    }

    #[test]
    fn test_empty_multi() {
        let payload = Payload::Multi(Vec::new());
        assert!(payload.is_empty());
        assert_eq!(payload.len(), 0);
    }
}
