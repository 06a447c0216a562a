//! Loss pools and read-consistent pool snapshots.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::event::AnonymizedLossEvent;
use super::id::{EventSeq, SnapshotId};
use super::money::{Amount, Tokens};

/// Named risk category a loss event may be pooled into.
///
/// Ordered worst risk first, which is also the precedence used when a
/// multi-pool event has to be attributed to a single category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolKind {
    Liquidation,
    Whale,
    MediumLeverage,
    LowLeverage,
}

impl PoolKind {
    /// All pool kinds in precedence order.
    pub const ALL: [Self; 4] = [
        Self::Liquidation,
        Self::Whale,
        Self::MediumLeverage,
        Self::LowLeverage,
    ];

    /// Stable pool name used in logs and reports.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Liquidation => "liquidation",
            Self::Whale => "whale",
            Self::MediumLeverage => "medium_leverage",
            Self::LowLeverage => "low_leverage",
        }
    }
}

impl fmt::Display for PoolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Set of pools an event belongs to, iterated in precedence order.
pub type PoolSet = BTreeSet<PoolKind>;

/// A named aggregation bucket of anonymized loss events.
#[derive(Debug, Clone)]
pub struct Pool {
    kind: PoolKind,
    events: Vec<Arc<AnonymizedLossEvent>>,
    total_loss: Amount,
    total_minted: Tokens,
}

impl Pool {
    /// Create an empty pool.
    #[must_use]
    pub fn new(kind: PoolKind) -> Self {
        Self {
            kind,
            events: Vec::new(),
            total_loss: Decimal::ZERO,
            total_minted: Decimal::ZERO,
        }
    }

    /// Returns true if appending `event` keeps both running totals exact.
    #[must_use]
    pub fn admits(&self, event: &AnonymizedLossEvent) -> bool {
        self.total_loss.checked_add(event.loss_amount()).is_some()
            && self.total_minted.checked_add(event.minted()).is_some()
    }

    /// Append an event and update running totals.
    ///
    /// Only the aggregator may mutate pools, and it checks [`Pool::admits`]
    /// first; the totals saturate rather than panic if that was skipped.
    pub(crate) fn append(&mut self, event: Arc<AnonymizedLossEvent>) {
        self.total_loss = self.total_loss.saturating_add(event.loss_amount());
        self.total_minted = self.total_minted.saturating_add(event.minted());
        self.events.push(event);
    }

    #[must_use]
    pub const fn kind(&self) -> PoolKind {
        self.kind
    }

    /// Events in insertion order.
    #[must_use]
    pub fn events(&self) -> &[Arc<AnonymizedLossEvent>] {
        &self.events
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    #[must_use]
    pub const fn total_loss(&self) -> Amount {
        self.total_loss
    }

    #[must_use]
    pub const fn total_minted(&self) -> Tokens {
        self.total_minted
    }
}

/// Per-pool totals for reporting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PoolTotals {
    pub pool: PoolKind,
    pub events: usize,
    pub total_loss: Amount,
    pub total_minted: Tokens,
}

impl From<&Pool> for PoolTotals {
    fn from(pool: &Pool) -> Self {
        Self {
            pool: pool.kind,
            events: pool.len(),
            total_loss: pool.total_loss,
            total_minted: pool.total_minted,
        }
    }
}

/// Read-consistent copy of all pools at one version.
///
/// Readers (scoring, tranche building, matching) work on a snapshot so they
/// never hold the aggregator's lock.
#[derive(Debug, Clone)]
pub struct PoolSnapshot {
    id: SnapshotId,
    version: u64,
    taken_at: DateTime<Utc>,
    pools: BTreeMap<PoolKind, Pool>,
}

impl PoolSnapshot {
    #[must_use]
    pub fn new(version: u64, taken_at: DateTime<Utc>, pools: BTreeMap<PoolKind, Pool>) -> Self {
        Self {
            id: SnapshotId::new(),
            version,
            taken_at,
            pools,
        }
    }

    #[must_use]
    pub fn id(&self) -> &SnapshotId {
        &self.id
    }

    /// Number of batches applied when the snapshot was taken.
    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }

    #[must_use]
    pub const fn taken_at(&self) -> DateTime<Utc> {
        self.taken_at
    }

    #[must_use]
    pub fn pool(&self, kind: PoolKind) -> Option<&Pool> {
        self.pools.get(&kind)
    }

    pub fn pools(&self) -> impl Iterator<Item = &Pool> {
        self.pools.values()
    }

    /// Totals for every pool in precedence order.
    #[must_use]
    pub fn totals(&self) -> Vec<PoolTotals> {
        self.pools.values().map(PoolTotals::from).collect()
    }

    /// Every event exactly once, ordered by ingestion sequence.
    #[must_use]
    pub fn unique_events(&self) -> Vec<&Arc<AnonymizedLossEvent>> {
        let mut seen: BTreeMap<EventSeq, &Arc<AnonymizedLossEvent>> = BTreeMap::new();
        for pool in self.pools.values() {
            for event in pool.events() {
                seen.entry(event.seq()).or_insert(event);
            }
        }
        seen.into_values().collect()
    }

    /// Total loss, counting each event once.
    #[must_use]
    pub fn total_loss(&self) -> Amount {
        self.unique_events()
            .iter()
            .fold(Decimal::ZERO, |acc, e| acc.saturating_add(e.loss_amount()))
    }

    /// Total minted tokens, counting each event once.
    #[must_use]
    pub fn total_minted(&self) -> Tokens {
        self.unique_events()
            .iter()
            .fold(Decimal::ZERO, |acc, e| acc.saturating_add(e.minted()))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pools.values().all(Pool::is_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::event::LossEvent;
    use crate::domain::id::Pseudonym;
    use rust_decimal_macros::dec;

    fn minted(seq: u64, loss: Decimal, pools: &[PoolKind]) -> Arc<AnonymizedLossEvent> {
        let event =
            LossEvent::try_new("t", loss, "BTC", dec!(1), dec!(100), false, Utc::now()).unwrap();
        Arc::new(AnonymizedLossEvent::mint(
            EventSeq::new(seq),
            Pseudonym::new("anon_t"),
            &event,
            dec!(2),
            pools.iter().copied().collect(),
        )
        .unwrap())
    }

    #[test]
    fn pool_tracks_running_totals() {
        let mut pool = Pool::new(PoolKind::LowLeverage);
        pool.append(minted(1, dec!(100), &[PoolKind::LowLeverage]));
        pool.append(minted(2, dec!(50), &[PoolKind::LowLeverage]));

        assert_eq!(pool.len(), 2);
        assert_eq!(pool.total_loss(), dec!(150));
        assert_eq!(pool.total_minted(), dec!(300));
        assert_eq!(pool.events()[0].seq(), EventSeq::new(1));
    }

    #[test]
    fn snapshot_counts_shared_events_once() {
        let shared = minted(1, dec!(100), &[PoolKind::Liquidation, PoolKind::LowLeverage]);
        let only_low = minted(2, dec!(40), &[PoolKind::LowLeverage]);

        let mut liq = Pool::new(PoolKind::Liquidation);
        liq.append(Arc::clone(&shared));
        let mut low = Pool::new(PoolKind::LowLeverage);
        low.append(shared);
        low.append(only_low);

        let pools = BTreeMap::from([(PoolKind::Liquidation, liq), (PoolKind::LowLeverage, low)]);
        let snapshot = PoolSnapshot::new(1, Utc::now(), pools);

        assert_eq!(snapshot.unique_events().len(), 2);
        assert_eq!(snapshot.total_loss(), dec!(140));
        assert_eq!(snapshot.total_minted(), dec!(280));
        assert!(!snapshot.is_empty());
    }

    #[test]
    fn pool_refuses_events_that_would_overflow_totals() {
        let event = LossEvent::try_new(
            "t",
            crate::domain::event::MAX_LOSS_AMOUNT,
            "BTC",
            dec!(1),
            dec!(0),
            false,
            Utc::now(),
        )
        .unwrap();
        let huge = Arc::new(
            AnonymizedLossEvent::mint(
                EventSeq::new(1),
                Pseudonym::new("anon_t"),
                &event,
                dec!(10000000000000),
                [PoolKind::Whale].into(),
            )
            .unwrap(),
        );

        let mut pool = Pool::new(PoolKind::Whale);
        for _ in 0..7 {
            assert!(pool.admits(&huge));
            pool.append(Arc::clone(&huge));
        }
        assert!(!pool.admits(&huge));
        assert_eq!(pool.total_minted(), dec!(70000000000000000000000000000));
    }

    #[test]
    fn pool_kinds_order_worst_first() {
        let set: PoolSet = [PoolKind::LowLeverage, PoolKind::Liquidation].into();
        assert_eq!(set.iter().next(), Some(&PoolKind::Liquidation));
        assert_eq!(PoolKind::MediumLeverage.to_string(), "medium_leverage");
    }
}
