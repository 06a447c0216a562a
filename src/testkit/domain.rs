//! Builders for domain primitives used across tests.
//!
//! Provides concise factory functions for [`LossRecord`], [`LossEvent`] and
//! [`InstitutionalBuyer`] so tests focus on assertions rather than
//! construction boilerplate.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::domain::{InstitutionalBuyer, LossEvent, LossRecord, RiskAppetite};

/// Position size used by every builder.
const POSITION_SIZE: Decimal = dec!(1000);

/// A complete BTC loss record stamped with `timestamp`.
pub fn loss_record_at(
    trader: &str,
    loss: Decimal,
    leverage: Decimal,
    liquidation: bool,
    timestamp: DateTime<Utc>,
) -> LossRecord {
    LossRecord {
        trader_id: Some(trader.to_string()),
        loss_amount: Some(loss),
        asset: Some("BTC".to_string()),
        leverage: Some(leverage),
        position_size: Some(POSITION_SIZE),
        liquidation: Some(liquidation),
        timestamp: Some(timestamp),
    }
}

/// A complete BTC loss record stamped now.
pub fn loss_record(trader: &str, loss: Decimal, leverage: Decimal, liquidation: bool) -> LossRecord {
    loss_record_at(trader, loss, leverage, liquidation, Utc::now())
}

/// An unlevered, non-liquidated loss record at `timestamp`.
pub fn record_at(trader: &str, loss: Decimal, timestamp: DateTime<Utc>) -> LossRecord {
    loss_record_at(trader, loss, Decimal::ONE, false, timestamp)
}

/// A validated BTC loss event stamped now.
///
/// # Panics
///
/// Panics if the arguments do not form a valid event.
pub fn loss_event(trader: &str, loss: Decimal, leverage: Decimal, liquidation: bool) -> LossEvent {
    LossEvent::try_new(
        trader,
        loss,
        "BTC",
        leverage,
        POSITION_SIZE,
        liquidation,
        Utc::now(),
    )
    .expect("valid test event")
}

/// A buyer whose id and name are both `id`.
pub fn buyer(
    id: &str,
    appetite: RiskAppetite,
    preferred_yield: Decimal,
    min_investment: Decimal,
) -> InstitutionalBuyer {
    InstitutionalBuyer {
        id: id.into(),
        name: id.to_string(),
        risk_appetite: appetite,
        preferred_yield,
        min_investment,
    }
}
