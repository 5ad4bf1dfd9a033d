//! Go-Back-N sender endpoint.
//!
//! [`GbnSender::run`] drives the whole send side:
//!
//! 1. **Priming**: read the byte source, packetize, send the first window.
//! 2. **Active**: one task multiplexes two activities with `tokio::select!`:
//!    ack consumption (cumulative acks slide the [`Window`]) and a timeout
//!    poll (every `poll_interval`, retransmit the window if the oldest
//!    unacked packet is older than `timeout`).
//! 3. **Draining**: every packet acknowledged; send end-of-stream and keep
//!    reading acks until the receiver's end-of-stream arrives.
//! 4. **Done**: return a [`SenderReport`].
//!
//! The [`Window`] is owned by this task alone, so the two activities can
//! never mutate `base` or slot timestamps concurrently.

use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::config::GbnConfig;
use crate::error::GbnError;
use crate::event::{Event, EventKind, EventSink, LogSink, Role};
use crate::packetizer;
use crate::state::SenderState;
use crate::transport::{AckFrame, AckRx, DataTx, SenderLink};
use crate::window::Window;

/// Outcome of a finished sender run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SenderReport {
    pub total_packets: usize,
    /// Transmission attempts, dropped ones included.
    pub transmissions: u64,
    pub retransmissions: u64,
    /// Every packet was transmitted at least once.
    pub all_packets_sent: bool,
    /// `base == total_packets` at termination.
    pub all_packets_acknowledged: bool,
}

/// Send side of one Go-Back-N transfer.
pub struct GbnSender {
    config: GbnConfig,
    data: DataTx,
    acks: AckRx,
    events: Arc<dyn EventSink>,
    state: SenderState,
}

impl GbnSender {
    /// Create a sender over `link`, logging events through [`LogSink`].
    pub fn new(config: GbnConfig, link: SenderLink) -> Result<Self, GbnError> {
        Self::with_events(config, link, Arc::new(LogSink))
    }

    /// Create a sender that reports events to `events`.
    pub fn with_events(
        config: GbnConfig,
        link: SenderLink,
        events: Arc<dyn EventSink>,
    ) -> Result<Self, GbnError> {
        config.validate()?;
        Ok(Self {
            config,
            data: link.data,
            acks: link.acks,
            events,
            state: SenderState::Priming,
        })
    }

    pub fn state(&self) -> SenderState {
        self.state
    }

    /// Transfer everything readable from `source` and return once the
    /// receiver has signalled end-of-stream or a conduit has closed.
    ///
    /// Only a failure to read `source` is an `Err`; protocol-level problems
    /// are logged and reflected in the report.
    pub async fn run<R>(self, mut source: R) -> Result<SenderReport, GbnError>
    where
        R: AsyncRead + Unpin,
    {
        let GbnSender {
            config,
            data,
            mut acks,
            events,
            mut state,
        } = self;

        // ── Priming ─────────────────────────────────────────────────────
        let mut bytes = Vec::new();
        if let Err(e) = source.read_to_end(&mut bytes).await {
            events.record(
                Event::new(Role::Sender, EventKind::Error).detail(format!("reading source: {e}")),
            );
            transition(&mut state, SenderState::Done);
            return Err(GbnError::SourceRead(e));
        }
        let packets = packetizer::split(&bytes, config.packet_capacity, config.seq_width)?;
        log::info!(
            "sender: {} packets created, window size {}, packet capacity {}, timeout {:?}",
            packets.len(),
            config.window_size,
            config.packet_capacity,
            config.timeout
        );

        let mut window = Window::new(
            packets,
            config.window_size,
            config.seq_width,
            data,
            events.clone(),
        );
        window.send_window(Instant::now());
        transition(&mut state, SenderState::Active);

        // ── Active ──────────────────────────────────────────────────────
        let acks_open = active_loop(&mut window, &mut acks, &config).await;

        // ── Draining ────────────────────────────────────────────────────
        if window.is_complete() && !window.is_closed() {
            transition(&mut state, SenderState::Draining);
            if window.finish().is_err() {
                events.record(
                    Event::new(Role::Sender, EventKind::Error)
                        .detail("data conduit closed before end-of-stream"),
                );
            } else if acks_open {
                drain_acks(&mut window, &mut acks).await;
            }
        } else {
            log::warn!(
                "sender: stopping with {}/{} packets acknowledged",
                window.base(),
                window.total()
            );
        }

        transition(&mut state, SenderState::Done);
        Ok(SenderReport {
            total_packets: window.total(),
            transmissions: window.transmissions(),
            retransmissions: window.retransmissions(),
            all_packets_sent: window.all_sent(),
            all_packets_acknowledged: window.is_complete(),
        })
    }
}

fn transition(state: &mut SenderState, next: SenderState) {
    log::debug!("sender: {state} -> {next}");
    *state = next;
}

/// Run until every packet is acknowledged or a conduit closes.
///
/// Returns `false` if the ack conduit ended along the way.
async fn active_loop(window: &mut Window, acks: &mut AckRx, config: &GbnConfig) -> bool {
    let mut poll = time::interval(config.poll_interval);
    poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

    while !window.is_complete() && !window.is_closed() {
        tokio::select! {
            biased;

            // ── Branch 1: acknowledgment from the receiver ───────────────
            frame = acks.recv() => match frame {
                Some(AckFrame::Ack(seq)) => {
                    window.on_ack(seq, Instant::now());
                }
                Some(AckFrame::NoneAccepted) => window.on_none_accepted(),
                Some(AckFrame::EndOfStream) | None => {
                    log::warn!("sender: ack conduit ended before transfer completed");
                    return false;
                }
            },

            // ── Branch 2: timeout poll ───────────────────────────────────
            _ = poll.tick() => {
                window.check_timeout(config.timeout, Instant::now());
            }
        }
    }
    true
}

/// Consume acks until the receiver's end-of-stream (or closure).
async fn drain_acks(window: &mut Window, acks: &mut AckRx) {
    loop {
        match acks.recv().await {
            Some(AckFrame::Ack(seq)) => {
                window.on_ack(seq, Instant::now());
            }
            Some(AckFrame::NoneAccepted) => window.on_none_accepted(),
            Some(AckFrame::EndOfStream) | None => break,
        }
    }
}
