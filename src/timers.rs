//! Countdown alerts keyed by vessel label

use std::collections::BTreeMap;

use chrono::{DateTime, TimeDelta, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountdownAlert {
    pub expires_at: DateTime<Utc>,
}

impl CountdownAlert {
    /// Whole seconds left, rounded up so any time left reads at least 1
    pub fn remaining_secs(&self, now: DateTime<Utc>) -> i64 {
        let left = self.expires_at - now;
        let secs = left.num_seconds();
        if left > TimeDelta::seconds(secs) { secs + 1 } else { secs }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// In-memory registry; nothing fires on expiry, callers poll with `tick`.
#[derive(Debug, Clone, Default)]
pub struct TimerRegistry {
    alerts: BTreeMap<String, CountdownAlert>,
}

impl TimerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or restart) the alert for `label`. Zero minutes is ignored.
    pub fn start(&mut self, label: &str, minutes: u32, now: DateTime<Utc>) -> bool {
        if minutes < 1 {
            return false;
        }
        let expires_at = now + TimeDelta::minutes(i64::from(minutes));
        if self
            .alerts
            .insert(label.to_string(), CountdownAlert { expires_at })
            .is_some()
        {
            log::info!("restarted timer for {}", label);
        }
        true
    }

    /// Remaining seconds per label; zero or negative means expired
    pub fn tick(&self, now: DateTime<Utc>) -> BTreeMap<String, i64> {
        self.alerts
            .iter()
            .map(|(label, alert)| (label.clone(), alert.remaining_secs(now)))
            .collect()
    }

    pub fn expired(&self, now: DateTime<Utc>) -> Vec<String> {
        self.alerts
            .iter()
            .filter(|(_, alert)| alert.is_expired(now))
            .map(|(label, _)| label.clone())
            .collect()
    }

    pub fn dismiss(&mut self, label: &str) {
        self.alerts.remove(label);
    }

    pub fn clear(&mut self) {
        self.alerts.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }
}
