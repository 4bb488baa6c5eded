//! Per-vessel readings for the three extraction rounds

use crate::models::{Round, RoundDetail, TimeWindow, VESSEL_COUNT};

/// Volumes drawn from each vessel in each round.
///
/// An unset reading counts as the round's target volume, so an untouched
/// round contributes `VESSEL_COUNT * target` to the batch total.
#[derive(Debug, Clone, Default)]
pub struct VesselRoundLedger {
    readings: [[Option<f64>; VESSEL_COUNT]; 3],
    windows: [[Option<TimeWindow>; VESSEL_COUNT]; 3],
}

impl VesselRoundLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a reading. Negative, non-finite or out-of-range input is ignored.
    pub fn record_reading(&mut self, round: Round, vessel: usize, volume: f64) -> bool {
        if vessel >= VESSEL_COUNT || !volume.is_finite() || volume < 0.0 {
            log::debug!(
                "ignoring reading round={} vessel={} volume={}",
                round.number(),
                vessel + 1,
                volume
            );
            return false;
        }
        self.readings[round.index()][vessel] = Some(volume);
        true
    }

    /// Effective reading, falling back to the round target
    pub fn reading(&self, round: Round, vessel: usize) -> f64 {
        self.readings[round.index()]
            .get(vessel)
            .copied()
            .flatten()
            .unwrap_or_else(|| round.target())
    }

    pub fn set_window(&mut self, round: Round, vessel: usize, window: TimeWindow) -> bool {
        if vessel >= VESSEL_COUNT {
            return false;
        }
        self.windows[round.index()][vessel] = Some(window);
        true
    }

    pub fn window(&self, round: Round, vessel: usize) -> Option<TimeWindow> {
        self.windows[round.index()].get(vessel).copied().flatten()
    }

    pub fn round_total(&self, round: Round) -> f64 {
        (0..VESSEL_COUNT).map(|v| self.reading(round, v)).sum()
    }

    pub fn batch_total(&self) -> f64 {
        Round::ALL.iter().map(|r| self.round_total(*r)).sum()
    }

    /// Snapshot of every round for the record detail blob
    pub fn round_details(&self) -> Vec<RoundDetail> {
        Round::ALL
            .iter()
            .map(|&round| RoundDetail {
                round: round.number(),
                target: round.target(),
                readings: (0..VESSEL_COUNT).map(|v| self.reading(round, v)).collect(),
                windows: (0..VESSEL_COUNT).map(|v| self.window(round, v)).collect(),
                total: self.round_total(round),
            })
            .collect()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    #[test]
    fn untouched_rounds_default_to_target() {
        let ledger = VesselRoundLedger::new();
        for round in Round::ALL {
            assert_eq!(ledger.round_total(round), 6.0 * round.target());
        }
        assert_eq!(ledger.batch_total(), 6.0 * (30.0 + 20.0 + 15.0));
    }

    #[test]
    fn batch_total_sums_edited_and_default_rounds() {
        let mut ledger = VesselRoundLedger::new();
        assert!(ledger.record_reading(Round::First, 0, 28.5));
        assert!(ledger.record_reading(Round::Third, 5, 0.0));

        assert_eq!(ledger.round_total(Round::First), 5.0 * 30.0 + 28.5);
        assert_eq!(ledger.round_total(Round::Second), 120.0);
        assert_eq!(ledger.round_total(Round::Third), 5.0 * 15.0);

        let expected: f64 = Round::ALL.iter().map(|r| ledger.round_total(*r)).sum();
        assert_eq!(ledger.batch_total(), expected);
    }

    #[test]
    fn rejects_negative_and_out_of_range() {
        let mut ledger = VesselRoundLedger::new();
        assert!(!ledger.record_reading(Round::First, 0, -1.0));
        assert!(!ledger.record_reading(Round::First, 6, 10.0));
        assert!(!ledger.record_reading(Round::First, 0, f64::NAN));
        assert_eq!(ledger.reading(Round::First, 0), 30.0);
    }

    #[test]
    fn windows_round_trip_into_details() {
        let mut ledger = VesselRoundLedger::new();
        let window = TimeWindow::new(
            NaiveTime::from_hms_opt(7, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(8, 15, 0).unwrap(),
        )
        .unwrap();
        assert!(ledger.set_window(Round::Second, 2, window));

        let details = ledger.round_details();
        assert_eq!(details.len(), 3);
        assert_eq!(details[1].windows[2], Some(window));
        assert_eq!(details[1].total, 120.0);
        assert!(details[0].windows.iter().all(Option::is_none));
    }
}
