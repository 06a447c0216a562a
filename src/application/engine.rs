//! Engine facade tying aggregation, scoring, tranching and matching together.
//!
//! Ingestion goes straight to the shared [`PoolAggregator`]. A scoring cycle
//! takes one snapshot and derives everything else from it, so the score,
//! the tranches and the matches in a [`CycleReport`] always describe the
//! same pool state.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use super::aggregator::PoolAggregator;
use super::matcher::BuyerMatcher;
use super::scoring::ScoreEngine;
use super::tranche::TrancheBuilder;
use crate::domain::buyer::BuyerDirectory;
use crate::domain::error::DomainError;
use crate::domain::event::{LossEvent, LossRecord};
use crate::domain::pool::PoolSnapshot;
use crate::domain::report::{CycleReport, IngestionSummary};
use crate::domain::score::CompositeScore;
use crate::error::ConfigError;
use crate::port::ReportSink;

pub struct FryEngine {
    aggregator: Arc<PoolAggregator>,
    scorer: Mutex<ScoreEngine>,
    builder: TrancheBuilder,
    matcher: BuyerMatcher,
    buyers: BuyerDirectory,
}

impl FryEngine {
    #[must_use]
    pub fn new(
        aggregator: PoolAggregator,
        scorer: ScoreEngine,
        builder: TrancheBuilder,
        matcher: BuyerMatcher,
        buyers: BuyerDirectory,
    ) -> Self {
        Self {
            aggregator: Arc::new(aggregator),
            scorer: Mutex::new(scorer),
            builder,
            matcher,
            buyers,
        }
    }

    /// Shared handle for producers that ingest from their own tasks.
    #[must_use]
    pub fn aggregator(&self) -> Arc<PoolAggregator> {
        Arc::clone(&self.aggregator)
    }

    #[must_use]
    pub fn buyers(&self) -> &BuyerDirectory {
        &self.buyers
    }

    pub fn ingest<I>(&self, records: I) -> IngestionSummary
    where
        I: IntoIterator<Item = LossRecord>,
    {
        self.aggregator.ingest(records)
    }

    /// Ingest decoded feed entries, counting undecodable ones as rejections.
    pub fn ingest_entries<I>(&self, entries: I) -> IngestionSummary
    where
        I: IntoIterator<Item = Result<LossRecord, DomainError>>,
    {
        self.aggregator.ingest_entries(entries)
    }

    pub fn ingest_events<I>(&self, events: I) -> IngestionSummary
    where
        I: IntoIterator<Item = LossEvent>,
    {
        self.aggregator.ingest_events(events)
    }

    /// Replace the anonymizer salt.
    ///
    /// # Errors
    ///
    /// Returns an error if the new salt is empty.
    pub fn rotate_salt(&self, salt: &str) -> Result<(), ConfigError> {
        self.aggregator.rotate_salt(salt)
    }

    #[must_use]
    pub fn snapshot(&self) -> PoolSnapshot {
        self.aggregator.snapshot()
    }

    /// Latest published FRY Score.
    #[must_use]
    pub fn current_score(&self) -> f64 {
        self.scorer.lock().current()
    }

    /// Score history, oldest first.
    #[must_use]
    pub fn history(&self) -> Vec<CompositeScore> {
        self.scorer.lock().history().iter().copied().collect()
    }

    /// Least-squares projection of the score `steps` cycles ahead.
    #[must_use]
    pub fn predict(&self, steps: usize) -> f64 {
        self.scorer.lock().predict(steps)
    }

    /// Run one full cycle against the current pool state.
    ///
    /// The window ends at `now`. Knock-outs are applied with the freshly
    /// computed score before any tranche is offered to buyers.
    pub fn cycle(&self, now: DateTime<Utc>) -> CycleReport {
        let snapshot = self.aggregator.snapshot();
        let score = self.scorer.lock().recompute(&snapshot, now);

        let mut tranches = self.builder.build(&snapshot, score.score.score);
        let knocked_out = self.builder.apply_knockouts(&mut tranches, score.score.score);
        let matches = self.matcher.match_all(&mut tranches, &self.buyers);

        info!(
            snapshot = %snapshot.id(),
            version = snapshot.version(),
            score = score.score.score,
            tranches = tranches.len(),
            knocked_out,
            matched = matches.len(),
            "Cycle complete"
        );

        CycleReport {
            snapshot_id: snapshot.id().clone(),
            snapshot_version: snapshot.version(),
            as_of: now,
            score,
            pools: snapshot.totals(),
            total_minted: snapshot.total_minted(),
            tranches,
            knocked_out,
            matches,
        }
    }

    /// Run [`FryEngine::cycle`] every `period` until `shutdown` flips to true
    /// or its sender is dropped. Each report is handed to `sink`.
    pub fn spawn_scoring(
        self: Arc<Self>,
        period: Duration,
        sink: Arc<dyn ReportSink>,
        mut shutdown: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            debug!(period_ms = period.as_millis() as u64, "Scoring task started");

            loop {
                tokio::select! {
                    result = shutdown.changed() => {
                        if result.is_err() || *shutdown.borrow() {
                            info!("Scoring task stopping");
                            break;
                        }
                    }
                    _ = ticker.tick() => {
                        let report = self.cycle(Utc::now());
                        sink.record_cycle(&report);
                    }
                }
            }
        })
    }
}
