//! Endpoint finite-state-machine types.
//!
//! Transitions are driven by [`crate::sender`] and [`crate::receiver`]; this
//! module only names the states so they can be logged and reported.

use std::fmt;

/// Lifecycle of a [`crate::sender::GbnSender`].
///
/// ```text
///  Priming ──first window sent──▶ Active ──base == total──▶ Draining
///                                   │                          │
///                                   │ conduit closed           │ ack EndOfStream
///                                   ▼                          ▼
///                                  Done ◀──────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SenderState {
    /// Packetizing the source and sending the first window.
    #[default]
    Priming,
    /// Consuming acks and polling for timeouts.
    Active,
    /// Every packet acknowledged; end-of-stream sent, awaiting the
    /// receiver's end-of-stream on the ack conduit.
    Draining,
    Done,
}

/// Lifecycle of a [`crate::receiver::GbnReceiver`].
///
/// ```text
///  Listening ──EndOfStream──▶ Finishing ──sink flushed──▶ Done
///      │                                                   ▲
///      └──────────────────────cancelled────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReceiverState {
    #[default]
    Listening,
    /// Flushing the reassembled stream to the sink.
    Finishing,
    Done,
}

impl fmt::Display for SenderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

impl fmt::Display for ReceiverState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}
