//! Pool classification for loss events.

use rust_decimal::Decimal;

use crate::domain::event::LossEvent;
use crate::domain::pool::{PoolKind, PoolSet};

/// Buckets a validated loss event into one or more pools.
///
/// Rules:
/// - a liquidation always lands in [`PoolKind::Liquidation`], in addition to
///   whatever else applies
/// - a loss at or above the whale threshold lands in [`PoolKind::Whale`]
/// - otherwise leverage decides between medium (>= the medium leverage
///   floor) and low leverage
#[derive(Debug, Clone)]
pub struct EventClassifier {
    whale_threshold: Decimal,
    medium_leverage: Decimal,
}

impl EventClassifier {
    #[must_use]
    pub const fn new(whale_threshold: Decimal, medium_leverage: Decimal) -> Self {
        Self {
            whale_threshold,
            medium_leverage,
        }
    }

    #[must_use]
    pub const fn whale_threshold(&self) -> Decimal {
        self.whale_threshold
    }

    /// Pools the event belongs to. Pure function of the event fields.
    #[must_use]
    pub fn classify(&self, event: &LossEvent) -> PoolSet {
        let mut pools = PoolSet::new();

        if event.is_liquidation() {
            pools.insert(PoolKind::Liquidation);
        }

        if event.loss_amount() >= self.whale_threshold {
            pools.insert(PoolKind::Whale);
        } else if event.leverage() >= self.medium_leverage {
            pools.insert(PoolKind::MediumLeverage);
        } else {
            pools.insert(PoolKind::LowLeverage);
        }

        pools
    }
}

impl Default for EventClassifier {
    fn default() -> Self {
        Self::new(Decimal::from(10_000), Decimal::from(5))
    }
}
