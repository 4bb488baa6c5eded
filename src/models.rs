//! Data models for extraction vessels, transfers and batch records

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::batch::BatchError;

/// Number of extraction vessels in a batch
pub const VESSEL_COUNT: usize = 6;

/// Number of concentration (reduction) vessels
pub const REDUCER_COUNT: usize = 2;

/// The three extraction rounds, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Round {
    First,
    Second,
    Third,
}

impl Round {
    pub const ALL: [Round; 3] = [Round::First, Round::Second, Round::Third];

    /// Target litres drawn from each vessel in this round
    pub fn target(self) -> f64 {
        match self {
            Round::First => 30.0,
            Round::Second => 20.0,
            Round::Third => 15.0,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Round::First => 0,
            Round::Second => 1,
            Round::Third => 2,
        }
    }

    /// 1-based round number as typed by the operator
    pub fn from_number(n: usize) -> Option<Round> {
        match n {
            1 => Some(Round::First),
            2 => Some(Round::Second),
            3 => Some(Round::Third),
            _ => None,
        }
    }

    pub fn number(self) -> usize {
        self.index() + 1
    }
}

/// A non-empty, trimmed vessel label that cannot be mistaken for a slot number
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VesselLabel(String);

impl VesselLabel {
    pub fn new(raw: &str) -> Result<Self, BatchError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(BatchError::EmptyLabel);
        }
        if trimmed.parse::<usize>().is_ok() {
            return Err(BatchError::NumericLabel(trimmed.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VesselLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ordered set of labels with no duplicates, used for both vessel groups
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSet {
    labels: Vec<VesselLabel>,
}

impl LabelSet {
    pub fn new(labels: Vec<VesselLabel>) -> Result<Self, BatchError> {
        for (i, label) in labels.iter().enumerate() {
            if labels[..i].contains(label) {
                return Err(BatchError::DuplicateLabel(label.to_string()));
            }
        }
        Ok(Self { labels })
    }

    /// `P1`..`P6`
    pub fn default_vessels() -> Self {
        Self {
            labels: (1..=VESSEL_COUNT)
                .map(|n| VesselLabel(format!("P{}", n)))
                .collect(),
        }
    }

    pub fn default_reducers() -> Self {
        Self {
            labels: (1..=REDUCER_COUNT)
                .map(|n| VesselLabel(format!("Tacho {}", n)))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&VesselLabel> {
        self.labels.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &VesselLabel> {
        self.labels.iter()
    }

    pub fn contains(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l.as_str() == label)
    }

    /// Rename the label at `index`, refusing a name another slot already uses
    pub fn rename(&mut self, index: usize, raw: &str) -> Result<(), BatchError> {
        let label = VesselLabel::new(raw)?;
        if index >= self.labels.len() {
            return Err(BatchError::UnknownSlot(index + 1));
        }
        if self
            .labels
            .iter()
            .enumerate()
            .any(|(i, l)| i != index && *l == label)
        {
            return Err(BatchError::DuplicateLabel(label.to_string()));
        }
        self.labels[index] = label;
        Ok(())
    }

    pub fn to_strings(&self) -> Vec<String> {
        self.labels.iter().map(|l| l.to_string()).collect()
    }
}

/// Wall-clock interval a vessel spent on one round. Informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeWindow {
    /// Rejects an end time earlier than the start time
    pub fn new(start: NaiveTime, end: NaiveTime) -> Result<Self, BatchError> {
        if end < start {
            return Err(BatchError::InvalidWindow { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn duration(&self) -> TimeDelta {
        self.end - self.start
    }
}

/// One pour of extracted liquid into a concentration vessel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferEntry {
    pub target: String,
    pub quantity: f64,
    pub recorded_at: DateTime<Utc>,
}

/// Outcome of the yield band check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YieldStatus {
    /// Not enough data to classify
    Pending,
    Approved,
    /// Below the band: reduced too far
    LowYield,
    /// Above the band: needs further reduction
    HighYield,
}

impl YieldStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            YieldStatus::Pending => "pending",
            YieldStatus::Approved => "approved",
            YieldStatus::LowYield => "low yield",
            YieldStatus::HighYield => "high yield",
        }
    }

    /// Longer operator-facing description
    pub fn describe(self) -> &'static str {
        match self {
            YieldStatus::Pending => "pending (extracted and final volumes must both be positive)",
            YieldStatus::Approved => "approved (within target)",
            YieldStatus::LowYield => "low yield (over-reduced)",
            YieldStatus::HighYield => "high yield (needs more reduction)",
        }
    }
}

impl fmt::Display for YieldStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for YieldStatus {
    type Err = BatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(YieldStatus::Pending),
            "approved" => Ok(YieldStatus::Approved),
            "low yield" => Ok(YieldStatus::LowYield),
            "high yield" => Ok(YieldStatus::HighYield),
            other => Err(BatchError::UnknownStatus(other.to_string())),
        }
    }
}

/// Header fields of a batch, edited freely while the batch is a draft
#[derive(Debug, Clone, PartialEq)]
pub struct BatchMeta {
    pub id: String,
    pub created_on: NaiveDate,
    pub operator: String,
    pub beverage: String,
}

/// A finalized, persistable batch
#[derive(Debug, Clone, PartialEq)]
pub struct BatchRecord {
    pub id: String,
    pub created_on: NaiveDate,
    pub operator: String,
    pub beverage: String,
    pub extraction_total: f64,
    pub transfer_total: f64,
    pub final_volume: f64,
    pub percentage: f64,
    pub status: YieldStatus,
    /// Opaque JSON with rounds, windows and transfers
    pub detail: String,
}

/// Serialized into `BatchRecord::detail`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchDetail {
    pub vessels: Vec<String>,
    pub reducers: Vec<String>,
    pub rounds: Vec<RoundDetail>,
    pub transfers: Vec<TransferEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundDetail {
    pub round: usize,
    pub target: f64,
    pub readings: Vec<f64>,
    pub windows: Vec<Option<TimeWindow>>,
    pub total: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn round_targets_decrease() {
        let targets: Vec<f64> = Round::ALL.iter().map(|r| r.target()).collect();
        assert_eq!(targets, vec![30.0, 20.0, 15.0]);
        assert_eq!(Round::from_number(2), Some(Round::Second));
        assert_eq!(Round::from_number(4), None);
    }

    #[test]
    fn labels_are_trimmed_and_non_empty() {
        assert_eq!(VesselLabel::new("  Front ").unwrap().as_str(), "Front");
        assert!(matches!(VesselLabel::new("   "), Err(BatchError::EmptyLabel)));
        assert!(matches!(VesselLabel::new(" 2 "), Err(BatchError::NumericLabel(_))));
        assert!(VesselLabel::new("2b").is_ok());
    }

    #[test]
    fn rename_rejects_duplicates() {
        let mut set = LabelSet::default_vessels();
        assert!(matches!(set.rename(0, "P2"), Err(BatchError::DuplicateLabel(_))));
        set.rename(0, "P1").unwrap();
        set.rename(0, "Cauldron").unwrap();
        assert_eq!(set.get(0).unwrap().as_str(), "Cauldron");
        assert!(matches!(set.rename(9, "X"), Err(BatchError::UnknownSlot(10))));
        assert!(matches!(set.rename(4, "2"), Err(BatchError::NumericLabel(_))));
        assert_eq!(set.get(4).unwrap().as_str(), "P5");
    }

    #[test]
    fn window_rejects_end_before_start() {
        let w = TimeWindow::new(t(8, 0), t(9, 30)).unwrap();
        assert_eq!(w.duration(), TimeDelta::minutes(90));
        assert!(TimeWindow::new(t(9, 30), t(8, 0)).is_err());
    }

    #[test]
    fn status_parses_back() {
        for status in [
            YieldStatus::Pending,
            YieldStatus::Approved,
            YieldStatus::LowYield,
            YieldStatus::HighYield,
        ] {
            assert_eq!(status.as_str().parse::<YieldStatus>().unwrap(), status);
        }
        assert!("bogus".parse::<YieldStatus>().is_err());
    }
}
