//! In-process conduit pair connecting a sender and a receiver.
//!
//! ```text
//!            DataFrame (encoded packets, EndOfStream)
//!  SenderLink ─────────[ LossPolicy ]─────────▶ ReceiverLink
//!             ◀───────────────────────────────
//!            AckFrame (Ack(seq), NoneAccepted, EndOfStream)
//! ```
//!
//! Both directions are FIFO, single-producer/single-consumer and lossless
//! except for the drops the [`LossPolicy`] decides on the data direction.
//! Dropping either end closes the conduit; the other side sees `None`, which
//! readers treat as end-of-stream.

use tokio::sync::mpsc;

use crate::error::ConduitClosed;
use crate::packet::SeqNum;
use crate::simulator::LossPolicy;

/// Item on the data conduit (sender → receiver).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataFrame {
    /// One encoded [`crate::packet::Packet`].
    Packet(Vec<u8>),
    EndOfStream,
}

/// Item on the acknowledgment conduit (receiver → sender).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckFrame {
    /// Cumulative: every sequence number `<= seq` was accepted in order.
    Ack(SeqNum),
    /// A packet was rejected before any packet had been accepted.
    NoneAccepted,
    EndOfStream,
}

/// Outcome of one transmission attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Delivered,
    /// Suppressed by the loss policy.
    Dropped,
}

/// Writing half of the data conduit.
pub struct DataTx {
    tx: mpsc::UnboundedSender<DataFrame>,
    policy: Box<dyn LossPolicy>,
    attempts: u64,
}

impl DataTx {
    /// Transmit one encoded packet, subject to the loss policy.
    pub fn send(&mut self, seq: SeqNum, frame: Vec<u8>) -> Result<Delivery, ConduitClosed> {
        if self.tx.is_closed() {
            return Err(ConduitClosed);
        }
        let attempt = self.attempts;
        self.attempts += 1;
        if self.policy.should_drop(attempt, seq) {
            return Ok(Delivery::Dropped);
        }
        self.tx
            .send(DataFrame::Packet(frame))
            .map_err(|_| ConduitClosed)?;
        Ok(Delivery::Delivered)
    }

    /// Emit the end-of-stream marker.  Never dropped.
    pub fn finish(&mut self) -> Result<(), ConduitClosed> {
        self.tx
            .send(DataFrame::EndOfStream)
            .map_err(|_| ConduitClosed)
    }

    /// Number of transmission attempts so far, dropped ones included.
    pub fn attempts(&self) -> u64 {
        self.attempts
    }
}

/// Reading half of the data conduit.
pub struct DataRx {
    rx: mpsc::UnboundedReceiver<DataFrame>,
}

impl DataRx {
    /// Next frame, or `None` once the sender side is gone.
    pub async fn recv(&mut self) -> Option<DataFrame> {
        self.rx.recv().await
    }

    /// Next frame if one is already queued.
    pub fn try_recv(&mut self) -> Option<DataFrame> {
        self.rx.try_recv().ok()
    }
}

/// Writing half of the acknowledgment conduit.
pub struct AckTx {
    tx: mpsc::UnboundedSender<AckFrame>,
}

impl AckTx {
    pub fn send(&self, frame: AckFrame) -> Result<(), ConduitClosed> {
        self.tx.send(frame).map_err(|_| ConduitClosed)
    }
}

/// Reading half of the acknowledgment conduit.
pub struct AckRx {
    rx: mpsc::UnboundedReceiver<AckFrame>,
}

impl AckRx {
    /// Next ack, or `None` once the receiver side is gone.
    pub async fn recv(&mut self) -> Option<AckFrame> {
        self.rx.recv().await
    }
}

/// Sender-side ends: writes data, reads acks.
pub struct SenderLink {
    pub data: DataTx,
    pub acks: AckRx,
}

/// Receiver-side ends: reads data, writes acks.
pub struct ReceiverLink {
    pub data: DataRx,
    pub acks: AckTx,
}

/// Build a connected conduit pair whose data direction applies `policy`.
pub fn pair(policy: impl LossPolicy + 'static) -> (SenderLink, ReceiverLink) {
    let (data_tx, data_rx) = mpsc::unbounded_channel();
    let (ack_tx, ack_rx) = mpsc::unbounded_channel();
    (
        SenderLink {
            data: DataTx {
                tx: data_tx,
                policy: Box::new(policy),
                attempts: 0,
            },
            acks: AckRx { rx: ack_rx },
        },
        ReceiverLink {
            data: DataRx { rx: data_rx },
            acks: AckTx { tx: ack_tx },
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulator::{DropFirstAttempt, NeverDrop};

    #[tokio::test]
    async fn frames_arrive_in_order() {
        let (mut s, mut r) = pair(NeverDrop);
        for seq in 0..3u32 {
            assert_eq!(s.data.send(seq, vec![seq as u8]), Ok(Delivery::Delivered));
        }
        s.data.finish().unwrap();

        for seq in 0..3u8 {
            assert_eq!(r.data.recv().await, Some(DataFrame::Packet(vec![seq])));
        }
        assert_eq!(r.data.recv().await, Some(DataFrame::EndOfStream));
    }

    #[tokio::test]
    async fn dropped_frames_never_reach_receiver() {
        let (mut s, mut r) = pair(DropFirstAttempt::new([1]));
        assert_eq!(s.data.send(0, vec![0]), Ok(Delivery::Delivered));
        assert_eq!(s.data.send(1, vec![1]), Ok(Delivery::Dropped));
        assert_eq!(s.data.send(1, vec![1]), Ok(Delivery::Delivered));
        assert_eq!(s.data.attempts(), 3);
        drop(s);

        assert_eq!(r.data.recv().await, Some(DataFrame::Packet(vec![0])));
        assert_eq!(r.data.recv().await, Some(DataFrame::Packet(vec![1])));
        assert_eq!(r.data.recv().await, None);
    }

    #[tokio::test]
    async fn acks_flow_back() {
        let (mut s, r) = pair(NeverDrop);
        r.acks.send(AckFrame::Ack(0)).unwrap();
        r.acks.send(AckFrame::EndOfStream).unwrap();
        drop(r);
        assert_eq!(s.acks.recv().await, Some(AckFrame::Ack(0)));
        assert_eq!(s.acks.recv().await, Some(AckFrame::EndOfStream));
        assert_eq!(s.acks.recv().await, None);
    }

    #[test]
    fn send_after_receiver_dropped_is_closed() {
        let (mut s, r) = pair(NeverDrop);
        drop(r);
        assert_eq!(s.data.send(0, vec![]), Err(ConduitClosed));
        assert_eq!(s.data.finish(), Err(ConduitClosed));
    }
}
