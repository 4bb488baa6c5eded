//! Batch finalization and the session-scoped draft state

use chrono::{DateTime, Local, NaiveTime, Utc};
use thiserror::Error;

use crate::calculator::{self, BatchSummary, YieldResult};
use crate::config::Config;
use crate::ledger::VesselRoundLedger;
use crate::models::{
    BatchDetail, BatchMeta, BatchRecord, LabelSet, Round, TimeWindow, VESSEL_COUNT,
};
use crate::timers::TimerRegistry;
use crate::transfer::TransferLog;

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("operator name is required before saving")]
    MissingOperator,
    #[error("label must not be empty")]
    EmptyLabel,
    #[error("label '{0}' would be read as a slot number")]
    NumericLabel(String),
    #[error("label '{0}' is already in use")]
    DuplicateLabel(String),
    #[error("no slot number {0}")]
    UnknownSlot(usize),
    #[error("'{0}' is not a concentration vessel")]
    UnknownReducer(String),
    #[error("window ends ({end}) before it starts ({start})")]
    InvalidWindow { start: NaiveTime, end: NaiveTime },
    #[error("unknown yield status '{0}'")]
    UnknownStatus(String),
    #[error("could not encode batch detail: {0}")]
    Detail(#[from] serde_json::Error),
}

impl BatchRecord {
    /// Build a persistable record from already computed values.
    ///
    /// Values are taken as given; only the operator name is checked.
    pub fn finalize(
        meta: &BatchMeta,
        extraction_total: f64,
        transfer_total: f64,
        final_volume: f64,
        yield_result: YieldResult,
        detail: String,
    ) -> Result<BatchRecord, BatchError> {
        if meta.operator.trim().is_empty() {
            return Err(BatchError::MissingOperator);
        }

        Ok(BatchRecord {
            id: meta.id.clone(),
            created_on: meta.created_on,
            operator: meta.operator.trim().to_string(),
            beverage: meta.beverage.trim().to_string(),
            extraction_total,
            transfer_total,
            final_volume,
            percentage: yield_result.percentage,
            status: yield_result.status,
            detail,
        })
    }

    pub fn detail(&self) -> Option<BatchDetail> {
        serde_json::from_str(&self.detail).ok()
    }
}

/// Default batch id derived from the local clock, e.g. `20261019-0730`
pub fn default_batch_id(now: DateTime<Local>) -> String {
    now.format("%Y%m%d-%H%M").to_string()
}

/// All mutable state of one interactive batch.
///
/// Nothing here is cached: every read goes through `summary`, which
/// recomputes the totals from the ledger and transfer log.
#[derive(Debug, Clone)]
pub struct Session {
    pub meta: BatchMeta,
    pub vessels: LabelSet,
    pub reducers: LabelSet,
    pub ledger: VesselRoundLedger,
    pub transfers: TransferLog,
    pub timers: TimerRegistry,
    pub final_volume: f64,
}

impl Session {
    pub fn new(config: &Config, now: DateTime<Local>) -> Self {
        Self {
            meta: BatchMeta {
                id: default_batch_id(now),
                created_on: now.date_naive(),
                operator: config.operator.clone().unwrap_or_default(),
                beverage: config.beverage.clone().unwrap_or_default(),
            },
            vessels: config.vessel_labels(),
            reducers: config.reducer_labels(),
            ledger: VesselRoundLedger::new(),
            transfers: TransferLog::new(),
            timers: TimerRegistry::new(),
            final_volume: 0.0,
        }
    }

    /// Start a fresh batch, keeping vessel names and the operator defaults
    pub fn reset(&mut self, config: &Config, now: DateTime<Local>) {
        let vessels = self.vessels.clone();
        let reducers = self.reducers.clone();
        *self = Session::new(config, now);
        self.vessels = vessels;
        self.reducers = reducers;
    }

    pub fn summary(&self) -> BatchSummary {
        calculator::summarize_batch(
            &self.ledger,
            &self.transfers,
            &self.reducers,
            self.final_volume,
        )
    }

    /// 0-based index of a vessel given its 1-based number or its label
    pub fn vessel_index(&self, key: &str) -> Option<usize> {
        if let Ok(n) = key.parse::<usize>() {
            return (1..=VESSEL_COUNT).contains(&n).then(|| n - 1);
        }
        self.vessels.iter().position(|l| l.as_str() == key)
    }

    pub fn set_window(
        &mut self,
        round: Round,
        vessel: usize,
        start: NaiveTime,
        end: NaiveTime,
    ) -> Result<(), BatchError> {
        let window = TimeWindow::new(start, end)?;
        if !self.ledger.set_window(round, vessel, window) {
            return Err(BatchError::UnknownSlot(vessel + 1));
        }
        Ok(())
    }

    /// Record a transfer into a configured concentration vessel
    pub fn transfer(
        &mut self,
        target: &str,
        quantity: f64,
        at: DateTime<Utc>,
    ) -> Result<bool, BatchError> {
        if !self.reducers.contains(target) {
            return Err(BatchError::UnknownReducer(target.to_string()));
        }
        let accepted = self.transfers.append(target, quantity, at);
        if accepted {
            let balance = self.transfers.balance(self.ledger.batch_total());
            if balance.is_error() {
                log::warn!("batch {}: {}", self.meta.id, balance);
            }
        }
        Ok(accepted)
    }

    pub fn detail(&self) -> BatchDetail {
        BatchDetail {
            vessels: self.vessels.to_strings(),
            reducers: self.reducers.to_strings(),
            rounds: self.ledger.round_details(),
            transfers: self.transfers.entries().to_vec(),
        }
    }

    /// Finalize the draft using totals recomputed from this session
    pub fn finalize(&self) -> Result<BatchRecord, BatchError> {
        let summary = self.summary();
        let detail = serde_json::to_string(&self.detail())?;
        BatchRecord::finalize(
            &self.meta,
            summary.extraction_total,
            summary.transfer_total,
            summary.final_volume,
            summary.yield_result,
            detail,
        )
    }
}
