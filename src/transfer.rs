//! Append-only log of transfers into the concentration vessels

use std::fmt;

use chrono::{DateTime, Utc};

use crate::models::TransferEntry;

#[derive(Debug, Clone, Default)]
pub struct TransferLog {
    entries: Vec<TransferEntry>,
}

impl TransferLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a transfer. Quantities that are not strictly positive are ignored.
    pub fn append(&mut self, target: &str, quantity: f64, at: DateTime<Utc>) -> bool {
        if !quantity.is_finite() || quantity <= 0.0 {
            log::debug!("ignoring transfer of {} L into {}", quantity, target);
            return false;
        }
        self.entries.push(TransferEntry {
            target: target.to_string(),
            quantity,
            recorded_at: at,
        });
        true
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> &[TransferEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum for one target, matched by exact label
    pub fn total_for(&self, target: &str) -> f64 {
        self.entries
            .iter()
            .filter(|e| e.target == target)
            .map(|e| e.quantity)
            .sum()
    }

    pub fn grand_total(&self) -> f64 {
        self.entries.iter().map(|e| e.quantity).sum()
    }

    /// Extracted volume not yet transferred; negative when over-transferred
    pub fn consistency_delta(&self, extraction_total: f64) -> f64 {
        extraction_total - self.grand_total()
    }

    pub fn balance(&self, extraction_total: f64) -> TransferBalance {
        TransferBalance::from_delta(self.consistency_delta(extraction_total))
    }
}

/// Classification of the extraction/transfer delta
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransferBalance {
    Balanced,
    /// Litres still owed to the concentration vessels
    Incomplete(f64),
    /// Litres transferred beyond what was extracted
    OverTransferred(f64),
}

impl TransferBalance {
    pub fn from_delta(delta: f64) -> Self {
        if delta > 0.0 {
            TransferBalance::Incomplete(delta)
        } else if delta < 0.0 {
            TransferBalance::OverTransferred(-delta)
        } else {
            TransferBalance::Balanced
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, TransferBalance::OverTransferred(_))
    }
}

impl fmt::Display for TransferBalance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferBalance::Balanced => write!(f, "balanced"),
            TransferBalance::Incomplete(owed) => {
                write!(f, "transfer incomplete: {:.1} L still to transfer", owed)
            }
            TransferBalance::OverTransferred(over) => {
                write!(f, "ERROR over-transferred by {:.1} L", over)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_ignores_non_positive() {
        let mut log = TransferLog::new();
        let now = Utc::now();
        assert!(!log.append("Tacho 1", 0.0, now));
        assert!(!log.append("Tacho 1", -3.0, now));
        assert_eq!(log.len(), 0);
        assert!(log.append("Tacho 1", 12.5, now));
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn per_target_totals_add_up_to_grand_total() {
        let mut log = TransferLog::new();
        let now = Utc::now();
        log.append("Tacho 1", 100.0, now);
        log.append("Tacho 2", 80.0, now);
        log.append("Tacho 1", 20.0, now);

        assert_eq!(log.total_for("Tacho 1"), 120.0);
        assert_eq!(log.total_for("Tacho 2"), 80.0);
        assert_eq!(
            log.grand_total(),
            log.total_for("Tacho 1") + log.total_for("Tacho 2")
        );
    }

    #[test]
    fn renamed_target_drops_out_of_bucket_but_not_grand_total() {
        let mut log = TransferLog::new();
        log.append("Tacho 1", 50.0, Utc::now());
        assert_eq!(log.total_for("Left pan"), 0.0);
        assert_eq!(log.grand_total(), 50.0);
    }

    #[test]
    fn delta_sign_classification() {
        let mut log = TransferLog::new();
        log.append("Tacho 1", 390.0, Utc::now());

        assert_eq!(log.consistency_delta(390.0), 0.0);
        assert_eq!(log.balance(390.0), TransferBalance::Balanced);
        assert_eq!(log.balance(400.0), TransferBalance::Incomplete(10.0));
        assert_eq!(log.balance(380.0), TransferBalance::OverTransferred(10.0));
        assert!(log.balance(380.0).is_error());
        assert!(!log.balance(400.0).is_error());
    }

    #[test]
    fn clear_empties_the_log() {
        let mut log = TransferLog::new();
        log.append("Tacho 2", 5.0, Utc::now());
        log.clear();
        assert!(log.is_empty());
        assert_eq!(log.grand_total(), 0.0);
    }
}
