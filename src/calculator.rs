//! Yield classification and the full batch recomputation pass

use crate::ledger::VesselRoundLedger;
use crate::models::{LabelSet, Round, YieldStatus};
use crate::transfer::{TransferBalance, TransferLog};

/// Inclusive acceptance band for the yield percentage
pub const YIELD_BAND_MIN: f64 = 20.0;
pub const YIELD_BAND_MAX: f64 = 25.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YieldResult {
    pub percentage: f64,
    pub status: YieldStatus,
}

/// Classify the final reduced volume against the extracted total.
///
/// Both volumes must be positive; otherwise the result is pending at 0%.
pub fn classify(extraction_total: f64, final_volume: f64) -> YieldResult {
    if !(extraction_total > 0.0 && final_volume > 0.0) {
        return YieldResult {
            percentage: 0.0,
            status: YieldStatus::Pending,
        };
    }

    let percentage = 100.0 * final_volume / extraction_total;
    let status = if percentage < YIELD_BAND_MIN {
        YieldStatus::LowYield
    } else if percentage > YIELD_BAND_MAX {
        YieldStatus::HighYield
    } else {
        YieldStatus::Approved
    };

    YieldResult { percentage, status }
}

/// Final volumes that would land on the band edges for a given extraction
pub fn target_range(extraction_total: f64) -> (f64, f64) {
    (
        extraction_total * YIELD_BAND_MIN / 100.0,
        extraction_total * YIELD_BAND_MAX / 100.0,
    )
}

/// Everything derived from the current draft, recomputed from scratch
#[derive(Debug, Clone)]
pub struct BatchSummary {
    pub round_totals: Vec<(Round, f64)>,
    pub extraction_total: f64,
    pub reducer_totals: Vec<(String, f64)>,
    pub transfer_total: f64,
    pub balance: TransferBalance,
    pub target_min: f64,
    pub target_max: f64,
    pub final_volume: f64,
    pub yield_result: YieldResult,
}

pub fn summarize_batch(
    ledger: &VesselRoundLedger,
    transfers: &TransferLog,
    reducers: &LabelSet,
    final_volume: f64,
) -> BatchSummary {
    let round_totals: Vec<_> = Round::ALL
        .iter()
        .map(|&r| (r, ledger.round_total(r)))
        .collect();
    let extraction_total = ledger.batch_total();
    let reducer_totals = reducers
        .iter()
        .map(|label| (label.to_string(), transfers.total_for(label.as_str())))
        .collect();
    let (target_min, target_max) = target_range(extraction_total);

    BatchSummary {
        round_totals,
        extraction_total,
        reducer_totals,
        transfer_total: transfers.grand_total(),
        balance: transfers.balance(extraction_total),
        target_min,
        target_max,
        final_volume,
        yield_result: classify(extraction_total, final_volume),
    }
}

impl std::fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Batch Summary ===")?;
        writeln!(f, "Extraction:")?;
        for (round, total) in &self.round_totals {
            writeln!(
                f,
                "  Round {} ({:.0} L/vessel): {:.1} L",
                round.number(),
                round.target(),
                total
            )?;
        }
        writeln!(f, "  Total extracted: {:.1} L", self.extraction_total)?;
        writeln!(f)?;

        writeln!(f, "Transfers:")?;
        for (label, total) in &self.reducer_totals {
            writeln!(f, "  {}: {:.1} L", label, total)?;
        }
        writeln!(f, "  Total transferred: {:.1} L", self.transfer_total)?;
        writeln!(f, "  Balance: {}", self.balance)?;
        writeln!(f)?;

        writeln!(f, "Reduction:")?;
        writeln!(
            f,
            "  Target: {:.1} - {:.1} L ({:.0}% - {:.0}%)",
            self.target_min, self.target_max, YIELD_BAND_MIN, YIELD_BAND_MAX
        )?;
        writeln!(f, "  Final volume: {:.1} L", self.final_volume)?;
        writeln!(f, "  Yield: {:.1}%", self.yield_result.percentage)?;
        writeln!(f, "  Status: {}", self.yield_result.status.describe())?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn classifies_against_inclusive_band() {
        let approved = classify(100.0, 22.0);
        assert_eq!(approved.percentage, 22.0);
        assert_eq!(approved.status, YieldStatus::Approved);

        let low = classify(100.0, 18.0);
        assert_eq!(low.percentage, 18.0);
        assert_eq!(low.status, YieldStatus::LowYield);

        let high = classify(100.0, 30.0);
        assert_eq!(high.percentage, 30.0);
        assert_eq!(high.status, YieldStatus::HighYield);

        assert_eq!(classify(100.0, 20.0).status, YieldStatus::Approved);
        assert_eq!(classify(100.0, 25.0).status, YieldStatus::Approved);
    }

    #[test]
    fn zero_inputs_stay_pending() {
        for (extracted, fin) in [(0.0, 22.0), (100.0, 0.0), (0.0, 0.0)] {
            let result = classify(extracted, fin);
            assert_eq!(result.status, YieldStatus::Pending);
            assert_eq!(result.percentage, 0.0);
        }
    }

    #[test]
    fn target_range_tracks_band() {
        assert_eq!(target_range(390.0), (78.0, 97.5));
    }

    #[test]
    fn summary_recomputes_everything() {
        let mut ledger = VesselRoundLedger::new();
        ledger.record_reading(Round::First, 0, 20.0);
        let mut transfers = TransferLog::new();
        transfers.append("Tacho 1", 200.0, Utc::now());
        transfers.append("Tacho 2", 180.0, Utc::now());
        let reducers = LabelSet::default_reducers();

        let summary = summarize_batch(&ledger, &transfers, &reducers, 95.0);
        assert_eq!(summary.extraction_total, 380.0);
        assert_eq!(summary.transfer_total, 380.0);
        assert_eq!(summary.balance, TransferBalance::Balanced);
        assert_eq!(
            summary.reducer_totals,
            vec![("Tacho 1".to_string(), 200.0), ("Tacho 2".to_string(), 180.0)]
        );
        assert_eq!(summary.yield_result.status, YieldStatus::Approved);

        let text = summary.to_string();
        assert!(text.contains("Total extracted: 380.0 L"));
        assert!(text.contains("Yield: 25.0%"));
    }
}
