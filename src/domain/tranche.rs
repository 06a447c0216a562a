//! Risk-rated tranches cut from aggregate pool value.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{SnapshotId, TrancheId};
use super::money::Amount;
use super::pool::{PoolKind, PoolSet};

/// Credit-style rating tier, ordered worst to best (`CCC < ... < AAA`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Rating {
    #[serde(rename = "CCC")]
    Ccc,
    #[serde(rename = "B")]
    B,
    #[serde(rename = "BB")]
    Bb,
    #[serde(rename = "BBB")]
    Bbb,
    #[serde(rename = "A")]
    A,
    #[serde(rename = "AA")]
    Aa,
    #[serde(rename = "AAA")]
    Aaa,
}

impl Rating {
    /// Ladder order, best first.
    pub const LADDER: [Self; 7] = [
        Self::Aaa,
        Self::Aa,
        Self::A,
        Self::Bbb,
        Self::Bb,
        Self::B,
        Self::Ccc,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Aaa => "AAA",
            Self::Aa => "AA",
            Self::A => "A",
            Self::Bbb => "BBB",
            Self::Bb => "BB",
            Self::B => "B",
            Self::Ccc => "CCC",
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Slice of aggregate pool value a tranche is cut from.
///
/// Every event is attributed to exactly one segment, chosen by the worst
/// pool it belongs to, so segments partition the aggregate value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Segment {
    /// Low-leverage contributions.
    Senior,
    /// Medium-leverage contributions.
    Mezzanine,
    /// Whale contributions.
    Junior,
    /// Liquidation contributions.
    Equity,
}

impl Segment {
    /// Segment for an event classified into `pools`.
    #[must_use]
    pub fn for_pools(pools: &PoolSet) -> Self {
        match pools.iter().next() {
            Some(PoolKind::Liquidation) => Self::Equity,
            Some(PoolKind::Whale) => Self::Junior,
            Some(PoolKind::MediumLeverage) => Self::Mezzanine,
            Some(PoolKind::LowLeverage) | None => Self::Senior,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Senior => "senior",
            Self::Mezzanine => "mezzanine",
            Self::Junior => "junior",
            Self::Equity => "equity",
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of a tranche.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrancheStatus {
    Available,
    Matched,
    KnockedOut,
}

impl fmt::Display for TrancheStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Available => "available",
            Self::Matched => "matched",
            Self::KnockedOut => "knocked_out",
        })
    }
}

/// A risk-rated slice of aggregate pool value.
///
/// Immutable after creation except for its status, which only moves away
/// from [`TrancheStatus::Available`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tranche {
    id: TrancheId,
    rating: Rating,
    segment: Segment,
    notional: Amount,
    coupon: Decimal,
    min_purchase: Amount,
    knockout_score: Option<f64>,
    snapshot: SnapshotId,
    status: TrancheStatus,
}

impl Tranche {
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        snapshot: SnapshotId,
        rating: Rating,
        segment: Segment,
        notional: Amount,
        coupon: Decimal,
        min_purchase: Amount,
        knockout_score: Option<f64>,
    ) -> Self {
        Self {
            id: TrancheId::new(format!("{snapshot}-{rating}")),
            rating,
            segment,
            notional,
            coupon,
            min_purchase,
            knockout_score,
            snapshot,
            status: TrancheStatus::Available,
        }
    }

    #[must_use]
    pub fn id(&self) -> &TrancheId {
        &self.id
    }

    #[must_use]
    pub const fn rating(&self) -> Rating {
        self.rating
    }

    #[must_use]
    pub const fn segment(&self) -> Segment {
        self.segment
    }

    #[must_use]
    pub const fn notional(&self) -> Amount {
        self.notional
    }

    /// Annual coupon as a fraction (0.04 = 4%).
    #[must_use]
    pub const fn coupon(&self) -> Decimal {
        self.coupon
    }

    #[must_use]
    pub const fn min_purchase(&self) -> Amount {
        self.min_purchase
    }

    #[must_use]
    pub const fn knockout_score(&self) -> Option<f64> {
        self.knockout_score
    }

    /// Snapshot this tranche was cut from.
    #[must_use]
    pub fn snapshot(&self) -> &SnapshotId {
        &self.snapshot
    }

    #[must_use]
    pub const fn status(&self) -> TrancheStatus {
        self.status
    }

    #[must_use]
    pub fn is_available(&self) -> bool {
        self.status == TrancheStatus::Available
    }

    /// Mark an available tranche as matched. Returns false if it was not available.
    pub fn mark_matched(&mut self) -> bool {
        self.transition(TrancheStatus::Matched)
    }

    /// Knock the tranche out if `score` has reached its knock-out level.
    ///
    /// Returns true if the status changed.
    pub fn apply_knockout(&mut self, score: f64) -> bool {
        match self.knockout_score {
            Some(level) if score >= level => self.transition(TrancheStatus::KnockedOut),
            _ => false,
        }
    }

    fn transition(&mut self, to: TrancheStatus) -> bool {
        if self.status != TrancheStatus::Available {
            return false;
        }
        self.status = to;
        true
    }
}
