//! Pool aggregation: anonymize, classify, mint, append.
//!
//! [`PoolAggregator`] is the only component that mutates pool state. It is
//! shared between producers behind an `Arc`; every event in a batch is fully
//! prepared (validated, pseudonymized, classified, minted) before the pool
//! lock is taken, and the lock is held only while the prepared events are
//! appended. An event is therefore either applied to all of its pools or
//! rejected outright.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::anonymizer::Anonymizer;
use super::classifier::EventClassifier;
use super::multiplier::MultiplierCalculator;
use crate::domain::error::DomainError;
use crate::domain::event::{AnonymizedLossEvent, LossEvent, LossRecord};
use crate::domain::id::EventSeq;
use crate::domain::money::{Amount, Tokens};
use crate::domain::pool::{Pool, PoolKind, PoolSnapshot};
use crate::domain::report::{IngestionSummary, Rejection};
use crate::error::ConfigError;

struct PoolBook {
    pools: BTreeMap<PoolKind, Pool>,
    version: u64,
}

impl PoolBook {
    fn new() -> Self {
        Self {
            pools: PoolKind::ALL
                .iter()
                .map(|kind| (*kind, Pool::new(*kind)))
                .collect(),
            version: 0,
        }
    }

    /// An event is admitted only if every pool it belongs to can take it.
    fn admits(&self, event: &AnonymizedLossEvent) -> bool {
        event
            .pools()
            .iter()
            .all(|kind| self.pools.get(kind).map_or(true, |pool| pool.admits(event)))
    }

    fn append(&mut self, event: Arc<AnonymizedLossEvent>) {
        for kind in event.pools() {
            if let Some(pool) = self.pools.get_mut(kind) {
                pool.append(Arc::clone(&event));
            }
        }
    }
}

fn reject(index: usize, err: &DomainError) -> Rejection {
    warn!(index, reason = %err, "Rejected loss event");
    Rejection {
        index,
        reason: err.to_string(),
    }
}

/// Batch totals with `event` added, or `None` if they would overflow.
fn summary_totals(
    summary: &IngestionSummary,
    event: &AnonymizedLossEvent,
) -> Option<(Amount, Tokens)> {
    Some((
        summary.total_loss.checked_add(event.loss_amount())?,
        summary.total_minted.checked_add(event.minted())?,
    ))
}

/// Owns all pool state and the ingestion pipeline.
pub struct PoolAggregator {
    anonymizer: Mutex<Anonymizer>,
    classifier: EventClassifier,
    multiplier: MultiplierCalculator,
    book: Mutex<PoolBook>,
    next_seq: AtomicU64,
}

impl PoolAggregator {
    #[must_use]
    pub fn new(
        anonymizer: Anonymizer,
        classifier: EventClassifier,
        multiplier: MultiplierCalculator,
    ) -> Self {
        Self {
            anonymizer: Mutex::new(anonymizer),
            classifier,
            multiplier,
            book: Mutex::new(PoolBook::new()),
            next_seq: AtomicU64::new(1),
        }
    }

    /// Ingest a batch of raw feed records.
    ///
    /// Malformed records, and records whose minted amount would overflow the
    /// running totals, are skipped and listed in the summary; the rest of the
    /// batch is still applied. No deduplication is performed: ingesting
    /// the same batch twice counts it twice.
    pub fn ingest<I>(&self, records: I) -> IngestionSummary
    where
        I: IntoIterator<Item = LossRecord>,
    {
        self.apply(records.into_iter().map(LossEvent::try_from))
    }

    /// Ingest a decoded feed in its original order.
    ///
    /// Entries the feed could not decode arrive as errors and are counted as
    /// rejections at their position, next to records that fail validation.
    pub fn ingest_entries<I>(&self, entries: I) -> IngestionSummary
    where
        I: IntoIterator<Item = Result<LossRecord, DomainError>>,
    {
        self.apply(
            entries
                .into_iter()
                .map(|entry| entry.and_then(LossEvent::try_from)),
        )
    }

    /// Ingest a batch of already validated events.
    pub fn ingest_events<I>(&self, events: I) -> IngestionSummary
    where
        I: IntoIterator<Item = LossEvent>,
    {
        self.apply(events.into_iter().map(Ok))
    }

    /// Replace the anonymizer salt. Existing pool entries keep their pseudonyms.
    ///
    /// # Errors
    ///
    /// Returns an error if the new salt is empty.
    pub fn rotate_salt(&self, salt: &str) -> Result<(), ConfigError> {
        self.anonymizer.lock().rotate_salt(salt)
    }

    /// Copy the current pool state for lock-free reading.
    #[must_use]
    pub fn snapshot(&self) -> PoolSnapshot {
        let book = self.book.lock();
        PoolSnapshot::new(book.version, Utc::now(), book.pools.clone())
    }

    /// Number of batches applied so far.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.book.lock().version
    }

    fn apply<I>(&self, events: I) -> IngestionSummary
    where
        I: Iterator<Item = Result<LossEvent, DomainError>>,
    {
        let mut summary = IngestionSummary::default();
        let mut prepared = Vec::new();

        for (index, event) in events.enumerate() {
            match event.and_then(|e| self.prepare(&e)) {
                Ok(minted) => prepared.push((index, minted)),
                Err(err) => summary.rejections.push(reject(index, &err)),
            }
        }

        if !prepared.is_empty() {
            let mut book = self.book.lock();
            let mut applied = 0;
            for (index, event) in prepared {
                match summary_totals(&summary, &event) {
                    Some((loss, minted)) if book.admits(&event) => {
                        summary.total_loss = loss;
                        summary.total_minted = minted;
                        book.append(Arc::new(event));
                        applied += 1;
                    }
                    _ => {
                        let err = DomainError::Overflow {
                            context: "adding to pool totals",
                        };
                        summary.rejections.push(reject(index, &err));
                    }
                }
            }
            summary.events_processed = applied;
            if applied > 0 {
                book.version += 1;
            }
        }

        summary.rejections.sort_by_key(|r| r.index);
        summary.events_rejected = summary.rejections.len();
        info!(
            processed = summary.events_processed,
            rejected = summary.events_rejected,
            total_loss = %summary.total_loss,
            total_minted = %summary.total_minted,
            "Batch ingested"
        );
        summary
    }

    fn prepare(&self, event: &LossEvent) -> Result<AnonymizedLossEvent, DomainError> {
        let pseudonym = self.anonymizer.lock().anonymize(event.trader_id())?;
        let pools = self.classifier.classify(event);
        let multiplier = self.multiplier.multiplier(event);
        let seq = EventSeq::new(self.next_seq.fetch_add(1, Ordering::Relaxed));

        let minted = AnonymizedLossEvent::mint(seq, pseudonym, event, multiplier, pools)?;
        debug!(
            seq = %seq,
            trader = %minted.trader(),
            multiplier = %multiplier,
            minted = %minted.minted(),
            "Loss minted"
        );
        Ok(minted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::event::MAX_LOSS_AMOUNT;
    use crate::testkit::domain::{loss_record, record_at};
    use rust_decimal_macros::dec;

    fn aggregator() -> PoolAggregator {
        PoolAggregator::new(
            Anonymizer::new("test-salt").unwrap(),
            EventClassifier::default(),
            MultiplierCalculator::default(),
        )
    }

    #[test]
    fn ingests_and_mints() {
        let agg = aggregator();
        let summary = agg.ingest(vec![loss_record("alice", dec!(2500), dec!(15), true)]);

        assert_eq!(summary.events_processed, 1);
        assert_eq!(summary.events_rejected, 0);
        assert_eq!(summary.total_loss, dec!(2500));
        assert_eq!(summary.total_minted, dec!(25000));

        let snapshot = agg.snapshot();
        let liq = snapshot.pool(PoolKind::Liquidation).unwrap();
        assert_eq!(liq.len(), 1);
        assert_eq!(liq.total_minted(), dec!(25000));
        assert_eq!(snapshot.pool(PoolKind::MediumLeverage).unwrap().len(), 1);
    }

    #[test]
    fn liquidations_always_reach_liquidation_pool() {
        let agg = aggregator();
        agg.ingest(vec![
            loss_record("a", dec!(50000), dec!(1), true),
            loss_record("b", dec!(10), dec!(50), true),
            loss_record("c", dec!(10), dec!(1), true),
        ]);
        let snapshot = agg.snapshot();
        assert_eq!(snapshot.pool(PoolKind::Liquidation).unwrap().len(), 3);
        for event in snapshot.unique_events() {
            assert!(event.is_in(PoolKind::Liquidation));
        }
    }

    #[test]
    fn malformed_events_are_skipped_not_fatal() {
        let agg = aggregator();
        let mut bad = loss_record("bob", dec!(100), dec!(2), false);
        bad.loss_amount = Some(dec!(-5));
        let mut missing = loss_record("carol", dec!(100), dec!(2), false);
        missing.asset = None;

        let summary = agg.ingest(vec![
            loss_record("alice", dec!(100), dec!(2), false),
            bad,
            missing,
            loss_record("dave", dec!(200), dec!(2), false),
        ]);

        assert_eq!(summary.events_processed, 2);
        assert_eq!(summary.events_rejected, 2);
        assert_eq!(summary.rejections[0].index, 1);
        assert_eq!(summary.rejections[1].index, 2);
        assert!(summary.rejections[1].reason.contains("asset"));
        assert_eq!(agg.snapshot().total_loss(), dec!(300));
    }

    #[test]
    fn empty_trader_is_rejected() {
        let agg = aggregator();
        let summary = agg.ingest(vec![loss_record("", dec!(100), dec!(2), false)]);
        assert_eq!(summary.events_rejected, 1);
        assert!(agg.snapshot().is_empty());
        assert_eq!(agg.version(), 0);
    }

    #[test]
    fn duplicate_batches_double_count() {
        let agg = aggregator();
        let batch = vec![loss_record("alice", dec!(100), dec!(2), false)];
        agg.ingest(batch.clone());
        agg.ingest(batch);

        let snapshot = agg.snapshot();
        assert_eq!(snapshot.total_loss(), dec!(200));
        assert_eq!(snapshot.version(), 2);
    }

    #[test]
    fn same_trader_keeps_pseudonym_across_batches() {
        let agg = aggregator();
        agg.ingest(vec![loss_record("alice", dec!(100), dec!(2), false)]);
        agg.ingest(vec![loss_record("alice", dec!(300), dec!(2), false)]);

        let snapshot = agg.snapshot();
        let events = snapshot.unique_events();
        assert_eq!(events[0].trader(), events[1].trader());
        assert_ne!(events[0].trader().as_str(), "alice");
    }

    #[test]
    fn snapshot_is_isolated_from_later_ingestion() {
        let agg = aggregator();
        agg.ingest(vec![loss_record("alice", dec!(100), dec!(2), false)]);
        let before = agg.snapshot();
        agg.ingest(vec![loss_record("bob", dec!(100), dec!(2), false)]);

        assert_eq!(before.unique_events().len(), 1);
        assert_eq!(agg.snapshot().unique_events().len(), 2);
    }

    #[test]
    fn oversized_loss_is_rejected_not_a_panic() {
        let agg = aggregator();
        let summary = agg.ingest(vec![
            loss_record("big", dec!(10000000000000000000000000000), dec!(15), true),
            loss_record("small", dec!(100), dec!(2), false),
        ]);

        assert_eq!(summary.events_processed, 1);
        assert_eq!(summary.events_rejected, 1);
        assert_eq!(summary.rejections[0].index, 0);
        assert!(summary.rejections[0].reason.contains("maximum"));
        assert_eq!(agg.snapshot().total_loss(), dec!(100));
    }

    #[test]
    fn events_that_would_overflow_totals_are_rejected() {
        // A cap this large lets a single maximum loss mint 10^28 tokens.
        let agg = PoolAggregator::new(
            Anonymizer::new("test-salt").unwrap(),
            EventClassifier::default(),
            MultiplierCalculator::standard(
                dec!(10000000000000),
                Vec::new(),
                Vec::new(),
                dec!(10000000000000),
            ),
        );
        let whale = || loss_record("whale", MAX_LOSS_AMOUNT, dec!(1), true);

        let summary = agg.ingest((0..9).map(|_| whale()));
        assert_eq!(summary.events_processed, 7);
        assert_eq!(summary.events_rejected, 2);
        assert_eq!(
            summary.rejections.iter().map(|r| r.index).collect::<Vec<_>>(),
            vec![7, 8]
        );
        assert!(summary.rejections[0].reason.contains("overflow"));

        let snapshot = agg.snapshot();
        assert_eq!(snapshot.unique_events().len(), 7);
        assert_eq!(
            snapshot.pool(PoolKind::Liquidation).unwrap().total_minted(),
            summary.total_minted
        );

        // Later batches keep being rejected instead of panicking.
        let next = agg.ingest(vec![whale()]);
        assert_eq!(next.events_rejected, 1);
        assert_eq!(agg.version(), 1);
    }

    #[test]
    fn undecodable_entries_count_as_rejections_in_order() {
        let agg = aggregator();
        let summary = agg.ingest_entries(vec![
            Ok(loss_record("a", dec!(100), dec!(1), false)),
            Err(DomainError::Undecodable {
                position: 2,
                reason: "invalid type: string \"abc\"".to_string(),
            }),
            Ok(loss_record("", dec!(100), dec!(1), false)),
        ]);

        assert_eq!(summary.events_processed, 1);
        assert_eq!(summary.events_rejected, 2);
        assert_eq!(summary.rejections[0].index, 1);
        assert!(summary.rejections[0].reason.contains("undecodable"));
        assert_eq!(summary.rejections[1].index, 2);
    }

    #[test]
    fn summaries_merge() {
        let agg = aggregator();
        let mut total = agg.ingest(vec![loss_record("a", dec!(100), dec!(1), false)]);
        total.merge(agg.ingest(vec![record_at("b", dec!(50), Utc::now())]));
        assert_eq!(total.events_processed, 2);
        assert_eq!(total.total_loss, dec!(150));
        assert_eq!(agg.snapshot().total_minted(), dec!(150));
    }
}
