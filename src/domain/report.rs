//! Outcome records for ingestion batches and scoring cycles.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::buyer::MatchResult;
use super::id::SnapshotId;
use super::money::{Amount, Tokens};
use super::pool::PoolTotals;
use super::score::ScoreReport;
use super::tranche::Tranche;

/// A rejected event and the reason it was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rejection {
    /// Position of the event within its batch.
    pub index: usize,
    pub reason: String,
}

/// Outcome of ingesting one batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IngestionSummary {
    pub events_processed: usize,
    pub events_rejected: usize,
    pub total_loss: Amount,
    pub total_minted: Tokens,
    pub rejections: Vec<Rejection>,
}

impl IngestionSummary {
    /// Fold another summary into this one. Totals saturate.
    pub fn merge(&mut self, other: Self) {
        self.events_processed += other.events_processed;
        self.events_rejected += other.events_rejected;
        self.total_loss = self.total_loss.saturating_add(other.total_loss);
        self.total_minted = self.total_minted.saturating_add(other.total_minted);
        self.rejections.extend(other.rejections);
    }
}

/// Everything one scoring cycle produced from a single snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleReport {
    pub snapshot_id: SnapshotId,
    pub snapshot_version: u64,
    /// End of the scoring window.
    pub as_of: DateTime<Utc>,
    pub score: ScoreReport,
    pub pools: Vec<PoolTotals>,
    pub total_minted: Tokens,
    pub tranches: Vec<Tranche>,
    pub knocked_out: usize,
    pub matches: Vec<MatchResult>,
}

impl CycleReport {
    /// Sum of the notionals of all tranches cut this cycle.
    #[must_use]
    pub fn total_notional(&self) -> Amount {
        self.tranches.iter().map(Tranche::notional).sum()
    }
}
