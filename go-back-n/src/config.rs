//! Protocol configuration.
//!
//! A single [`GbnConfig`] is shared by both endpoints so that the sender's
//! packet layout and the receiver's decoder always agree on the width of the
//! sequence-number trailer.

use std::time::Duration;

use crate::error::GbnError;

/// Default width of the trailing sequence-number field, in bytes (16 bits).
pub const DEFAULT_SEQ_WIDTH: usize = 2;

/// Widest supported sequence-number field; sequence numbers are `u32`.
pub const MAX_SEQ_WIDTH: usize = 4;

/// Tunable protocol parameters.
///
/// All sizes are in bytes.  `packet_capacity` includes the sequence field,
/// so each packet carries at most `packet_capacity - seq_width` payload bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GbnConfig {
    /// Bound on in-flight unacknowledged packets (W).
    pub window_size: usize,
    /// Packet size including the sequence field.
    pub packet_capacity: usize,
    /// Width of the sequence-number field.
    pub seq_width: usize,
    /// Retransmission deadline for the oldest unacknowledged packet.
    pub timeout: Duration,
    /// How often the sender checks for a timeout.  Must not exceed `timeout`.
    pub poll_interval: Duration,
    /// How long the receiver waits on the data conduit before re-checking
    /// for cancellation.
    pub receive_poll: Duration,
}

impl Default for GbnConfig {
    fn default() -> Self {
        Self {
            window_size: 4,
            packet_capacity: 64,
            seq_width: DEFAULT_SEQ_WIDTH,
            timeout: Duration::from_secs(1),
            poll_interval: Duration::from_millis(100),
            receive_poll: Duration::from_secs(1),
        }
    }
}

impl GbnConfig {
    /// Payload bytes carried by every packet except possibly the last.
    pub fn payload_capacity(&self) -> usize {
        self.packet_capacity.saturating_sub(self.seq_width)
    }

    /// Reject settings under which the protocol cannot run.
    pub fn validate(&self) -> Result<(), GbnError> {
        if self.window_size == 0 {
            return Err(GbnError::config("window size must be at least 1"));
        }
        if self.seq_width == 0 || self.seq_width > MAX_SEQ_WIDTH {
            return Err(GbnError::config(format!(
                "sequence field width must be 1..={MAX_SEQ_WIDTH} bytes, got {}",
                self.seq_width
            )));
        }
        if self.packet_capacity <= self.seq_width {
            return Err(GbnError::config(format!(
                "packet capacity ({}) must exceed sequence field width ({})",
                self.packet_capacity, self.seq_width
            )));
        }
        if self.timeout.is_zero() {
            return Err(GbnError::config("timeout interval must be positive"));
        }
        if self.poll_interval.is_zero() {
            return Err(GbnError::config("poll interval must be positive"));
        }
        if self.poll_interval > self.timeout {
            return Err(GbnError::config(format!(
                "poll interval ({:?}) must not exceed timeout interval ({:?})",
                self.poll_interval, self.timeout
            )));
        }
        if self.receive_poll.is_zero() {
            return Err(GbnError::config("receive poll timeout must be positive"));
        }
        Ok(())
    }
}
