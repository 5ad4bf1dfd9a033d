//! Structured protocol events.
//!
//! Both endpoints report what they do (sends, drops, timeouts, acks) as
//! [`Event`]s pushed into an [`EventSink`].  Logging is observational only:
//! nothing in the protocol reads events back.
//!
//! - [`LogSink`] forwards every event to the `log` facade (the default).
//! - [`EventLog`] keeps events in memory so callers can inspect a run.

use std::fmt;
use std::sync::{Mutex, PoisonError};

use crate::packet::SeqNum;

/// Which endpoint produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Sender,
    Receiver,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Role::Sender => "sender",
            Role::Receiver => "receiver",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// First transmission of a sequence number reached the conduit.
    PacketSent,
    /// A later transmission of an already-attempted sequence number.
    PacketRetransmitted,
    /// The loss policy suppressed a transmission.
    PacketDropped,
    /// The oldest unacknowledged packet exceeded the timeout.
    PacketTimeout,
    /// Receiver accepted an in-order packet.
    PacketReceived,
    /// Receiver discarded a duplicate or premature packet.
    PacketOutOfOrder,
    AckReceived,
    /// Duplicate ack, or the "nothing accepted yet" sentinel.
    AckIgnored,
    AckOutOfRange,
    Error,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EventKind::PacketSent => "packet-sent",
            EventKind::PacketRetransmitted => "packet-retransmitted",
            EventKind::PacketDropped => "packet-dropped",
            EventKind::PacketTimeout => "packet-timeout",
            EventKind::PacketReceived => "packet-received",
            EventKind::PacketOutOfOrder => "packet-out-of-order",
            EventKind::AckReceived => "ack-received",
            EventKind::AckIgnored => "ack-ignored",
            EventKind::AckOutOfRange => "ack-out-of-range",
            EventKind::Error => "error",
        })
    }
}

/// One observable protocol event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub role: Role,
    pub kind: EventKind,
    pub seq: Option<SeqNum>,
    pub detail: Option<String>,
}

impl Event {
    pub fn new(role: Role, kind: EventKind) -> Self {
        Self {
            role,
            kind,
            seq: None,
            detail: None,
        }
    }

    pub fn seq(mut self, seq: SeqNum) -> Self {
        self.seq = Some(seq);
        self
    }

    pub fn detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.role, self.kind)?;
        if let Some(seq) = self.seq {
            write!(f, " seq={seq}")?;
        }
        if let Some(detail) = &self.detail {
            write!(f, " ({detail})")?;
        }
        Ok(())
    }
}

/// Destination for protocol events.
pub trait EventSink: Send + Sync {
    fn record(&self, event: Event);
}

/// Forwards events to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl EventSink for LogSink {
    fn record(&self, event: Event) {
        match event.kind {
            EventKind::Error => log::error!(target: "gbn", "{event}"),
            EventKind::AckOutOfRange | EventKind::PacketOutOfOrder | EventKind::PacketTimeout => {
                log::warn!(target: "gbn", "{event}")
            }
            _ => log::info!(target: "gbn", "{event}"),
        }
    }
}

/// In-memory event recorder.
///
/// Events are also echoed at `debug` level so a test run with `RUST_LOG`
/// set still shows the trace.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Mutex<Vec<Event>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far.
    pub fn events(&self) -> Vec<Event> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of events of `kind` from `role`, optionally for one sequence number.
    pub fn count(&self, role: Role, kind: EventKind, seq: Option<SeqNum>) -> usize {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|e| e.role == role && e.kind == kind && (seq.is_none() || e.seq == seq))
            .count()
    }
}

impl EventSink for EventLog {
    fn record(&self, event: Event) {
        log::debug!(target: "gbn", "{event}");
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_seq_and_detail() {
        let e = Event::new(Role::Sender, EventKind::PacketDropped)
            .seq(2)
            .detail("attempt 3");
        assert_eq!(e.to_string(), "sender: packet-dropped seq=2 (attempt 3)");
    }

    #[test]
    fn display_without_optional_fields() {
        let e = Event::new(Role::Receiver, EventKind::Error);
        assert_eq!(e.to_string(), "receiver: error");
    }

    #[test]
    fn event_log_counts_by_role_kind_and_seq() {
        let log = EventLog::new();
        log.record(Event::new(Role::Sender, EventKind::PacketSent).seq(0));
        log.record(Event::new(Role::Sender, EventKind::PacketSent).seq(1));
        log.record(Event::new(Role::Receiver, EventKind::PacketReceived).seq(0));

        assert_eq!(log.count(Role::Sender, EventKind::PacketSent, None), 2);
        assert_eq!(log.count(Role::Sender, EventKind::PacketSent, Some(1)), 1);
        assert_eq!(log.count(Role::Receiver, EventKind::PacketSent, None), 0);
        assert_eq!(log.events().len(), 3);
    }
}
