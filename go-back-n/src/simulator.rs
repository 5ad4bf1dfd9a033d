//! Injectable packet-loss policies for the data conduit.
//!
//! The protocol state machines contain no loss logic of their own; a
//! [`LossPolicy`] is handed to [`crate::transport::pair`] and consulted on
//! every transmission attempt.
//!
//! | Policy               | Behaviour                                          |
//! |----------------------|----------------------------------------------------|
//! | [`NeverDrop`]        | Transparent pass-through (default).                |
//! | [`DropFirstAttempt`] | Drop the first transmission of chosen seq numbers. |
//! | [`EveryNth`]         | Drop every n-th attempt overall.                   |
//! | [`RandomLoss`]       | Drop with a fixed probability, seeded RNG.         |
//!
//! Every stateful policy drops a given sequence number **at most once**.
//! Retransmissions must eventually get through or Go-Back-N never finishes.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::packet::SeqNum;

/// Decides whether a transmission attempt is lost.
///
/// `attempt` is the zero-based index of this transmission on the conduit,
/// counting every send (first transmissions and retransmissions alike).
pub trait LossPolicy: Send {
    fn should_drop(&mut self, attempt: u64, seq: SeqNum) -> bool;
}

impl LossPolicy for Box<dyn LossPolicy> {
    fn should_drop(&mut self, attempt: u64, seq: SeqNum) -> bool {
        (**self).should_drop(attempt, seq)
    }
}

/// Index-addressed record of which sequence numbers were already dropped.
#[derive(Debug, Default, Clone)]
struct DropLedger {
    dropped: Vec<bool>,
}

impl DropLedger {
    fn has_dropped(&self, seq: SeqNum) -> bool {
        self.dropped.get(seq as usize).copied().unwrap_or(false)
    }

    fn mark(&mut self, seq: SeqNum) {
        let idx = seq as usize;
        if idx >= self.dropped.len() {
            self.dropped.resize(idx + 1, false);
        }
        self.dropped[idx] = true;
    }
}

/// Delivers everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NeverDrop;

impl LossPolicy for NeverDrop {
    fn should_drop(&mut self, _attempt: u64, _seq: SeqNum) -> bool {
        false
    }
}

/// Drops the first transmission of each listed sequence number.
#[derive(Debug, Clone)]
pub struct DropFirstAttempt {
    targets: Vec<SeqNum>,
    ledger: DropLedger,
}

impl DropFirstAttempt {
    pub fn new(targets: impl IntoIterator<Item = SeqNum>) -> Self {
        Self {
            targets: targets.into_iter().collect(),
            ledger: DropLedger::default(),
        }
    }
}

impl LossPolicy for DropFirstAttempt {
    fn should_drop(&mut self, _attempt: u64, seq: SeqNum) -> bool {
        if self.targets.contains(&seq) && !self.ledger.has_dropped(seq) {
            self.ledger.mark(seq);
            return true;
        }
        false
    }
}

/// Drops attempt `a` when `(a + 1) % n == 0`, unless that sequence number
/// has been dropped before.
#[derive(Debug, Clone)]
pub struct EveryNth {
    n: u64,
    ledger: DropLedger,
}

impl EveryNth {
    /// `n = 0` never drops.
    pub fn new(n: u64) -> Self {
        Self {
            n,
            ledger: DropLedger::default(),
        }
    }
}

impl LossPolicy for EveryNth {
    fn should_drop(&mut self, attempt: u64, seq: SeqNum) -> bool {
        if self.n == 0 || (attempt + 1) % self.n != 0 || self.ledger.has_dropped(seq) {
            return false;
        }
        self.ledger.mark(seq);
        true
    }
}

/// Drops each attempt with probability `rate`, at most once per sequence
/// number.  Seeded so a failing run can be replayed.
#[derive(Debug, Clone)]
pub struct RandomLoss {
    rate: f64,
    rng: StdRng,
    ledger: DropLedger,
}

impl RandomLoss {
    /// `rate` is clamped to `[0.0, 1.0]`; NaN means no loss.
    pub fn new(rate: f64, seed: u64) -> Self {
        let rate = if rate.is_nan() { 0.0 } else { rate.clamp(0.0, 1.0) };
        Self {
            rate,
            rng: StdRng::seed_from_u64(seed),
            ledger: DropLedger::default(),
        }
    }
}

impl LossPolicy for RandomLoss {
    fn should_drop(&mut self, _attempt: u64, seq: SeqNum) -> bool {
        if self.ledger.has_dropped(seq) || !self.rng.random_bool(self.rate) {
            return false;
        }
        self.ledger.mark(seq);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_drop_passes_everything() {
        let mut p = NeverDrop;
        assert!((0..100).all(|a| !p.should_drop(a, a as SeqNum)));
    }

    #[test]
    fn drop_first_attempt_only_once() {
        let mut p = DropFirstAttempt::new([2]);
        assert!(!p.should_drop(0, 0));
        assert!(!p.should_drop(1, 1));
        assert!(p.should_drop(2, 2));
        assert!(!p.should_drop(3, 3));
        // Retransmission of 2 gets through.
        assert!(!p.should_drop(4, 2));
    }

    #[test]
    fn every_nth_drops_nth_attempt() {
        let mut p = EveryNth::new(3);
        let dropped: Vec<u64> = (0..9).filter(|&a| p.should_drop(a, a as SeqNum)).collect();
        assert_eq!(dropped, vec![2, 5, 8]);
    }

    #[test]
    fn every_nth_never_drops_same_seq_twice() {
        let mut p = EveryNth::new(1);
        assert!(p.should_drop(0, 4));
        assert!(!p.should_drop(1, 4));
        assert!(p.should_drop(2, 5));
    }

    #[test]
    fn every_nth_zero_is_pass_through() {
        let mut p = EveryNth::new(0);
        assert!((0..10).all(|a| !p.should_drop(a, 0)));
    }

    #[test]
    fn random_loss_full_rate_drops_each_seq_once() {
        let mut p = RandomLoss::new(1.0, 7);
        assert!(p.should_drop(0, 0));
        assert!(!p.should_drop(1, 0));
        assert!(p.should_drop(2, 1));
    }

    #[test]
    fn random_loss_same_seed_same_decisions() {
        let mut a = RandomLoss::new(0.5, 42);
        let mut b = RandomLoss::new(0.5, 42);
        let da: Vec<bool> = (0..64).map(|i| a.should_drop(i, i as SeqNum)).collect();
        let db: Vec<bool> = (0..64).map(|i| b.should_drop(i, i as SeqNum)).collect();
        assert_eq!(da, db);
    }
}
