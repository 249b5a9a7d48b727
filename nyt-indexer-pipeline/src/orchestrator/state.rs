//! Per-run state and flow results.

use std::fmt;

use serde::Serialize;

use crate::quota::{QuotaLimits, QuotaState};

/// Counters of one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub pages_written: u64,
    pub pages_failed: u64,
    pub documents_written: u64,
    pub documents_failed: u64,
    pub records_rejected: u64,
    pub fetch_failures: u64,
}

/// Everything a run mutates, passed by `&mut` into every flow.
#[derive(Debug, Clone, PartialEq)]
pub struct RunState {
    pub quota: QuotaState,
    pub stats: RunStats,
}

impl RunState {
    pub fn new(limits: QuotaLimits) -> Self {
        Self {
            quota: QuotaState::new(limits),
            stats: RunStats::default(),
        }
    }
}

/// How a flow ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowOutcome {
    /// Every page or section was written.
    Completed,
    /// A fetch or write failed; the next run retries from the cursor.
    Incomplete,
    /// The daily quota ran out before the flow finished.
    QuotaExhausted,
    /// The source returned a page without results.
    EmptyPage,
    /// The offset reached the total reported by the source.
    AllHitsRetrieved,
    /// Two iterations in a row made no progress.
    Stalled,
}

impl FlowOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlowOutcome::Completed => "completed",
            FlowOutcome::Incomplete => "incomplete",
            FlowOutcome::QuotaExhausted => "quota_exhausted",
            FlowOutcome::EmptyPage => "empty_page",
            FlowOutcome::AllHitsRetrieved => "all_hits_retrieved",
            FlowOutcome::Stalled => "stalled",
        }
    }
}

impl fmt::Display for FlowOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one source within a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HarvestReport {
    pub collection: String,
    pub outcome: FlowOutcome,
}
