use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db_types::{Invoice, PartnerId};

/// A resolved accrual window, `[start, end)`. `end` is the instant the window was resolved; the next window for the
/// same partner starts exactly at this `end`, so a partner's windows are contiguous and never overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl BillingWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        t >= self.start && t <= self.end
    }
}

impl Display for BillingWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{} .. {})", self.start, self.end)
    }
}

/// The structured result of one billing cycle. Partner failures are collected here rather than aborting the run, so
/// one partner's bad day cannot discard the invoices already committed for the others.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BillingRunSummary {
    /// The invoices created by this run.
    pub invoiced: Vec<Invoice>,
    /// Partners scanned but not invoiced this cycle (window not yet elapsed, or no eligible fees).
    pub skipped: usize,
    pub failures: Vec<BillingFailure>,
}

impl BillingRunSummary {
    pub fn invoiced_count(&self) -> usize {
        self.invoiced.len()
    }

    pub fn partners_scanned(&self) -> usize {
        self.invoiced.len() + self.skipped + self.failures.len()
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingFailure {
    pub partner_id: PartnerId,
    pub reason: String,
}

impl BillingFailure {
    pub fn new(partner_id: PartnerId, reason: String) -> Self {
        Self { partner_id, reason }
    }
}
