//! Go-Back-N receiver endpoint.
//!
//! [`GbnReceiver`] implements the receive side of Go-Back-N:
//!
//! - Only the packet whose sequence number equals the cursor is accepted;
//!   its payload is appended and `Ack(seq)` is sent.
//! - Duplicate or premature packets are discarded without buffering, and
//!   the cumulative ack for the last accepted packet is re-sent.
//! - On end-of-stream the reassembled bytes are written to the sink once,
//!   then end-of-stream is sent back on the ack conduit.
//!
//! Each wait on the data conduit is bounded by `receive_poll` and raced
//! against a [`CancellationToken`] and the optional deadline, so either
//! stops the receiver the moment it fires.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::time::{self, timeout, Instant};
use tokio_util::sync::CancellationToken;

use crate::config::GbnConfig;
use crate::error::GbnError;
use crate::event::{Event, EventKind, EventSink, LogSink, Role};
use crate::packet::{Packet, SeqNum};
use crate::state::ReceiverState;
use crate::transport::{AckFrame, AckTx, DataFrame, DataRx, ReceiverLink};

// ---------------------------------------------------------------------------
// ReceiverReport
// ---------------------------------------------------------------------------

/// Outcome of a finished receiver run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiverReport {
    /// Final cursor: number of packets accepted in order.
    pub packets_received: u64,
    pub bytes_received: usize,
    /// The explicit end-of-stream marker was observed.
    pub end_of_stream: bool,
    /// Stopped by the cancel token or deadline; nothing written to the sink.
    pub cancelled: bool,
    pub all_packets_received: bool,
}

// ---------------------------------------------------------------------------
// GbnReceiver
// ---------------------------------------------------------------------------

/// Receive side of one Go-Back-N transfer.
pub struct GbnReceiver {
    seq_width: usize,
    receive_poll: Duration,
    data: DataRx,
    acks: AckTx,
    events: Arc<dyn EventSink>,

    /// Next expected sequence number.  Only ever advances by one.
    expected: u64,
    /// In-order payload bytes awaiting the final flush.
    buffer: Vec<u8>,

    expected_total: Option<u64>,
    cancel: CancellationToken,
    deadline: Option<Duration>,
    state: ReceiverState,
}

impl GbnReceiver {
    /// Create a receiver over `link`, logging events through [`LogSink`].
    pub fn new(config: &GbnConfig, link: ReceiverLink) -> Result<Self, GbnError> {
        Self::with_events(config, link, Arc::new(LogSink))
    }

    /// Create a receiver that reports events to `events`.
    pub fn with_events(
        config: &GbnConfig,
        link: ReceiverLink,
        events: Arc<dyn EventSink>,
    ) -> Result<Self, GbnError> {
        config.validate()?;
        Ok(Self {
            seq_width: config.seq_width,
            receive_poll: config.receive_poll,
            data: link.data,
            acks: link.acks,
            events,
            expected: 0,
            buffer: Vec::new(),
            expected_total: None,
            cancel: CancellationToken::new(),
            deadline: None,
            state: ReceiverState::Listening,
        })
    }

    /// Tell the receiver how many packets the stream has, so completion
    /// can be checked against it.
    pub fn with_expected_total(mut self, total: usize) -> Self {
        self.expected_total = Some(total as u64);
        self
    }

    /// Stop listening once `token` is cancelled.
    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Stop listening once `deadline` has elapsed since [`run`](Self::run).
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn state(&self) -> ReceiverState {
        self.state
    }

    /// Next sequence number the receiver will accept.
    pub fn expected_seq(&self) -> u64 {
        self.expected
    }

    /// Bytes reassembled so far.
    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    /// Handle one decoded packet.
    ///
    /// Returns `true` if it was accepted (seq == cursor).  Every call sends
    /// exactly one cumulative ack.
    pub fn process(&mut self, packet: &Packet) -> bool {
        if u64::from(packet.seq) == self.expected {
            self.buffer.extend_from_slice(&packet.payload);
            self.send_ack(AckFrame::Ack(packet.seq));
            self.events
                .record(Event::new(Role::Receiver, EventKind::PacketReceived).seq(packet.seq));
            self.expected += 1;
            return true;
        }

        let ack = match self.expected.checked_sub(1) {
            Some(last) => AckFrame::Ack(last as SeqNum),
            None => AckFrame::NoneAccepted,
        };
        self.events.record(
            Event::new(Role::Receiver, EventKind::PacketOutOfOrder)
                .seq(packet.seq)
                .detail(format!("expected {}", self.expected)),
        );
        self.send_ack(ack);
        false
    }

    fn send_ack(&self, frame: AckFrame) {
        if self.acks.send(frame).is_err() {
            self.events.record(
                Event::new(Role::Receiver, EventKind::Error).detail("ack conduit closed"),
            );
        }
    }

    fn transition(&mut self, next: ReceiverState) {
        log::debug!("receiver: {} -> {}", self.state, next);
        self.state = next;
    }

    /// Listen until end-of-stream, then write the reassembled stream to
    /// `sink`.
    ///
    /// Only a sink write failure is an `Err`.
    pub async fn run<W>(mut self, mut sink: W) -> Result<ReceiverReport, GbnError>
    where
        W: AsyncWrite + Unpin,
    {
        let started = Instant::now();
        let deadline = self.deadline.map(|d| started + d);
        let mut end_of_stream = false;
        let mut cancelled = false;

        // ── Listening ───────────────────────────────────────────────────
        loop {
            let polled = tokio::select! {
                biased;

                _ = self.cancel.cancelled() => None,
                _ = time::sleep_until(deadline.unwrap_or(started)), if deadline.is_some() => None,
                frame = timeout(self.receive_poll, self.data.recv()) => Some(frame),
            };
            let Some(polled) = polled else {
                log::info!("receiver: cancelled after {} packets", self.expected);
                cancelled = true;
                break;
            };

            match polled {
                // Nothing yet; poll again.
                Err(_elapsed) => continue,
                Ok(Some(DataFrame::Packet(frame))) => match Packet::decode(&frame, self.seq_width) {
                    Ok(packet) => {
                        self.process(&packet);
                    }
                    Err(e) => self.events.record(
                        Event::new(Role::Receiver, EventKind::Error).detail(e.to_string()),
                    ),
                },
                Ok(Some(DataFrame::EndOfStream)) => {
                    end_of_stream = true;
                    break;
                }
                Ok(None) => {
                    log::warn!("receiver: data conduit closed without end-of-stream");
                    break;
                }
            }
        }

        if !cancelled {
            // ── Finishing ───────────────────────────────────────────────
            self.transition(ReceiverState::Finishing);
            let written = match sink.write_all(&self.buffer).await {
                Ok(()) => sink.flush().await,
                Err(e) => Err(e),
            };
            if let Err(e) = written {
                self.events.record(
                    Event::new(Role::Receiver, EventKind::Error)
                        .detail(format!("writing sink: {e}")),
                );
                self.transition(ReceiverState::Done);
                return Err(GbnError::SinkWrite(e));
            }
            self.send_ack(AckFrame::EndOfStream);
        }

        self.transition(ReceiverState::Done);
        let all_packets_received = end_of_stream
            && !cancelled
            && self.expected_total.map_or(true, |total| total == self.expected);
        Ok(ReceiverReport {
            packets_received: self.expected,
            bytes_received: self.buffer.len(),
            end_of_stream,
            cancelled,
            all_packets_received,
        })
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
