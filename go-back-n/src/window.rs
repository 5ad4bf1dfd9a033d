//! Go-Back-N send window.
//!
//! [`Window`] owns every piece of mutable sender state: the packets, the
//! left window edge (`base`), and one [`Slot`] per packet.  It is owned by a
//! single task (see [`crate::sender`]), so every mutation is serialised by
//! construction.
//!
//! # Protocol contract
//!
//! - Only sequence numbers in `[base, base + W)` are ever transmitted.
//! - ACKs are **cumulative**: `Ack(n)` means every packet `<= n` arrived.
//! - When `base` advances, the packet entering the right edge is sent.
//! - On timeout of the oldest unacked packet, **every** unacked packet in
//!   the window is retransmitted (go back N).
//!
//! # Sequence-number layout
//!
//! ```text
//!   acknowledged     base            base+W
//!  ──────────────────┼───────────────┼──────────────────▶ seq
//!                    │ <─ in flight ─▶│ <─ never sent ──▶
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::error::ConduitClosed;
use crate::event::{Event, EventKind, EventSink, Role};
use crate::packet::{Packet, SeqNum};
use crate::transport::{DataTx, Delivery};

// ---------------------------------------------------------------------------
// Slot
// ---------------------------------------------------------------------------

/// Per-packet sender state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Slot {
    pub acknowledged: bool,
    /// Time of the most recent transmission attempt, dropped ones included.
    pub last_sent_at: Option<Instant>,
    /// Number of transmission attempts.
    pub attempts: u32,
}

// ---------------------------------------------------------------------------
// Window
// ---------------------------------------------------------------------------

pub struct Window {
    packets: Vec<Packet>,
    slots: Vec<Slot>,
    base: usize,
    size: usize,
    seq_width: usize,
    transport: DataTx,
    events: Arc<dyn EventSink>,
    /// Set once the data conduit reports closure; no further sends happen.
    closed: bool,
    retransmissions: u64,
}

impl Window {
    /// Create a window over `packets` with `base = 0`.  Nothing is sent yet.
    pub fn new(
        packets: Vec<Packet>,
        size: usize,
        seq_width: usize,
        transport: DataTx,
        events: Arc<dyn EventSink>,
    ) -> Self {
        let slots = vec![Slot::default(); packets.len()];
        Self {
            packets,
            slots,
            base: 0,
            size,
            seq_width,
            transport,
            events,
            closed: false,
            retransmissions: 0,
        }
    }

    /// Sequence number of the oldest unacknowledged packet.
    pub fn base(&self) -> usize {
        self.base
    }

    pub fn total(&self) -> usize {
        self.packets.len()
    }

    pub fn slot(&self, seq: usize) -> Option<&Slot> {
        self.slots.get(seq)
    }

    /// `true` once every packet has been acknowledged.
    pub fn is_complete(&self) -> bool {
        self.base == self.packets.len()
    }

    /// `true` once every packet has been attempted at least once.
    pub fn all_sent(&self) -> bool {
        self.slots.iter().all(|s| s.last_sent_at.is_some())
    }

    /// `true` once the data conduit has been found closed.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Total transmission attempts, first sends and retransmissions.
    pub fn transmissions(&self) -> u64 {
        self.transport.attempts()
    }

    pub fn retransmissions(&self) -> u64 {
        self.retransmissions
    }

    /// Right window edge (exclusive), clamped to the packet count.
    fn upper(&self) -> usize {
        self.base.saturating_add(self.size).min(self.packets.len())
    }

    // -----------------------------------------------------------------------
    // Transmission
    // -----------------------------------------------------------------------

    /// Transmit `seq` if it lies inside the window and is unacknowledged.
    /// No-op otherwise.
    pub fn try_send(&mut self, seq: usize, now: Instant) {
        if self.closed || seq < self.base || seq >= self.upper() || self.slots[seq].acknowledged {
            return;
        }

        let packet = &self.packets[seq];
        let wire_seq = packet.seq;
        let frame = match packet.encode(self.seq_width) {
            Ok(frame) => frame,
            Err(e) => {
                self.emit(Event::new(Role::Sender, EventKind::Error).seq(wire_seq).detail(e.to_string()));
                return;
            }
        };

        let retransmission = self.slots[seq].attempts > 0;
        match self.transport.send(wire_seq, frame) {
            Ok(Delivery::Delivered) => {
                let kind = if retransmission {
                    EventKind::PacketRetransmitted
                } else {
                    EventKind::PacketSent
                };
                self.emit(Event::new(Role::Sender, kind).seq(wire_seq));
            }
            Ok(Delivery::Dropped) => {
                self.emit(Event::new(Role::Sender, EventKind::PacketDropped).seq(wire_seq));
            }
            Err(ConduitClosed) => {
                self.closed = true;
                self.emit(
                    Event::new(Role::Sender, EventKind::Error)
                        .seq(wire_seq)
                        .detail("data conduit closed"),
                );
                return;
            }
        }

        if retransmission {
            self.retransmissions += 1;
        }
        let slot = &mut self.slots[seq];
        slot.attempts += 1;
        slot.last_sent_at = Some(now);
    }

    /// Transmit every unacknowledged packet in `[base, base + W)`.
    pub fn send_window(&mut self, now: Instant) {
        for seq in self.base..self.upper() {
            self.try_send(seq, now);
        }
    }

    // -----------------------------------------------------------------------
    // Acknowledgments
    // -----------------------------------------------------------------------

    /// Apply a cumulative ACK and slide the window.
    ///
    /// Returns how far `base` advanced.  Duplicate ACKs (already covered) and
    /// out-of-range ACKs (beyond the window or the stream) return `0` and
    /// are only logged.
    pub fn on_ack(&mut self, ack: SeqNum, now: Instant) -> usize {
        let idx = ack as usize;
        if idx >= self.packets.len() || idx >= self.base.saturating_add(self.size) {
            self.emit(
                Event::new(Role::Sender, EventKind::AckOutOfRange)
                    .seq(ack)
                    .detail(format!("base={} total={}", self.base, self.packets.len())),
            );
            return 0;
        }
        if self.slots[idx].acknowledged {
            self.emit(Event::new(Role::Sender, EventKind::AckIgnored).seq(ack).detail("duplicate"));
            return 0;
        }

        for slot in &mut self.slots[self.base..=idx] {
            slot.acknowledged = true;
        }
        self.emit(Event::new(Role::Sender, EventKind::AckReceived).seq(ack));

        let start = self.base;
        while self.base < self.packets.len() && self.slots[self.base].acknowledged {
            self.base += 1;
            // Admit the packet entering the right edge.
            self.try_send(self.base.saturating_add(self.size.saturating_sub(1)), now);
        }
        self.base - start
    }

    /// The receiver rejected a packet before accepting any.
    pub fn on_none_accepted(&mut self) {
        self.emit(
            Event::new(Role::Sender, EventKind::AckIgnored).detail("receiver has accepted nothing yet"),
        );
    }

    // -----------------------------------------------------------------------
    // Timeouts
    // -----------------------------------------------------------------------

    /// If the oldest unacked packet was last sent more than `timeout` ago,
    /// retransmit the whole window and return `true`.
    pub fn check_timeout(&mut self, timeout: Duration, now: Instant) -> bool {
        let Some(oldest) = (self.base..self.upper()).find(|&s| !self.slots[s].acknowledged) else {
            return false;
        };
        let Some(sent_at) = self.slots[oldest].last_sent_at else {
            return false;
        };
        if now.saturating_duration_since(sent_at) <= timeout {
            return false;
        }

        self.emit(
            Event::new(Role::Sender, EventKind::PacketTimeout)
                .seq(self.packets[oldest].seq)
                .detail(format!("retransmitting window [{}, {})", self.base, self.upper())),
        );
        self.send_window(now);
        true
    }

    // -----------------------------------------------------------------------
    // Shutdown
    // -----------------------------------------------------------------------

    /// Emit end-of-stream on the data conduit.
    pub fn finish(&mut self) -> Result<(), ConduitClosed> {
        if self.closed {
            return Err(ConduitClosed);
        }
        let result = self.transport.finish();
        if result.is_err() {
            self.closed = true;
        }
        result
    }

    fn emit(&self, event: Event) {
        self.events.record(event);
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
