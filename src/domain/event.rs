//! Loss events as they arrive from the feed and after minting.
//!
//! A [`LossRecord`] is the flat, untrusted record a market-data feed hands
//! over. It becomes a validated [`LossEvent`] through `TryFrom`, and the
//! aggregator turns that into an [`AnonymizedLossEvent`] once the trader is
//! pseudonymized and tokens are minted.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::id::{EventSeq, Pseudonym};
use super::money::{Amount, Tokens};
use super::pool::{PoolKind, PoolSet};

/// Largest accepted loss amount, 10^15.
///
/// With the multiplier cap bounded as well, a single minted amount stays far
/// below the decimal range and running totals cannot realistically overflow.
pub const MAX_LOSS_AMOUNT: Amount = Decimal::from_parts(2_764_472_320, 232_830, 0, false, 0);

/// Flat loss record supplied by an external feed.
///
/// Every field is optional so that a malformed record can still be
/// deserialized and then rejected with a precise reason.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LossRecord {
    #[serde(default)]
    pub trader_id: Option<String>,
    #[serde(default, alias = "loss")]
    pub loss_amount: Option<Decimal>,
    #[serde(default, alias = "symbol")]
    pub asset: Option<String>,
    #[serde(default)]
    pub leverage: Option<Decimal>,
    #[serde(default)]
    pub position_size: Option<Decimal>,
    #[serde(default, alias = "is_liquidation")]
    pub liquidation: Option<bool>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

/// A validated trading-loss event. Immutable once created.
#[derive(Debug, Clone, PartialEq)]
pub struct LossEvent {
    trader_id: String,
    loss_amount: Amount,
    asset: String,
    leverage: Decimal,
    position_size: Amount,
    liquidation: bool,
    timestamp: DateTime<Utc>,
}

impl LossEvent {
    /// Create a loss event, validating every field.
    ///
    /// # Errors
    ///
    /// Returns a [`DomainError`] if the trader or asset is empty, the loss is
    /// not positive or above [`MAX_LOSS_AMOUNT`], leverage is below 1, or the
    /// position size is negative.
    #[allow(clippy::too_many_arguments)]
    pub fn try_new(
        trader_id: impl Into<String>,
        loss_amount: Amount,
        asset: impl Into<String>,
        leverage: Decimal,
        position_size: Amount,
        liquidation: bool,
        timestamp: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let trader_id = trader_id.into();
        let asset = asset.into();

        if trader_id.trim().is_empty() {
            return Err(DomainError::EmptyTraderId);
        }
        if asset.trim().is_empty() {
            return Err(DomainError::EmptyAsset);
        }
        if loss_amount <= Decimal::ZERO {
            return Err(DomainError::NonPositiveLoss {
                amount: loss_amount,
            });
        }
        if loss_amount > MAX_LOSS_AMOUNT {
            return Err(DomainError::LossTooLarge {
                amount: loss_amount,
                max: MAX_LOSS_AMOUNT,
            });
        }
        if leverage < Decimal::ONE {
            return Err(DomainError::LeverageBelowOne { leverage });
        }
        if position_size < Decimal::ZERO {
            return Err(DomainError::NegativePositionSize {
                size: position_size,
            });
        }

        Ok(Self {
            trader_id,
            loss_amount,
            asset,
            leverage,
            position_size,
            liquidation,
            timestamp,
        })
    }

    /// Raw trader identifier. Only the anonymizer should read this.
    #[must_use]
    pub fn trader_id(&self) -> &str {
        &self.trader_id
    }

    #[must_use]
    pub const fn loss_amount(&self) -> Amount {
        self.loss_amount
    }

    #[must_use]
    pub fn asset(&self) -> &str {
        &self.asset
    }

    #[must_use]
    pub const fn leverage(&self) -> Decimal {
        self.leverage
    }

    #[must_use]
    pub const fn position_size(&self) -> Amount {
        self.position_size
    }

    #[must_use]
    pub const fn is_liquidation(&self) -> bool {
        self.liquidation
    }

    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

impl TryFrom<LossRecord> for LossEvent {
    type Error = DomainError;

    fn try_from(record: LossRecord) -> Result<Self, Self::Error> {
        Self::try_new(
            record
                .trader_id
                .ok_or(DomainError::MissingField { field: "trader_id" })?,
            record
                .loss_amount
                .ok_or(DomainError::MissingField { field: "loss_amount" })?,
            record
                .asset
                .ok_or(DomainError::MissingField { field: "asset" })?,
            record
                .leverage
                .ok_or(DomainError::MissingField { field: "leverage" })?,
            record.position_size.ok_or(DomainError::MissingField {
                field: "position_size",
            })?,
            record
                .liquidation
                .ok_or(DomainError::MissingField { field: "liquidation" })?,
            record
                .timestamp
                .ok_or(DomainError::MissingField { field: "timestamp" })?,
        )
    }
}

/// A loss event after pseudonymization and minting.
///
/// Owned by the pools it was appended to (shared through `Arc`), never
/// mutated after minting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnonymizedLossEvent {
    seq: EventSeq,
    trader: Pseudonym,
    loss_amount: Amount,
    asset: String,
    leverage: Decimal,
    position_size: Amount,
    liquidation: bool,
    timestamp: DateTime<Utc>,
    multiplier: Decimal,
    minted: Tokens,
    pools: PoolSet,
}

impl AnonymizedLossEvent {
    /// Build the minted record from a validated event.
    ///
    /// Minted tokens are `loss_amount * multiplier`, computed exactly.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Overflow`] if the product is not representable.
    pub fn mint(
        seq: EventSeq,
        trader: Pseudonym,
        event: &LossEvent,
        multiplier: Decimal,
        pools: PoolSet,
    ) -> Result<Self, DomainError> {
        let minted = event
            .loss_amount
            .checked_mul(multiplier)
            .ok_or(DomainError::Overflow { context: "minting" })?;
        Ok(Self {
            seq,
            trader,
            loss_amount: event.loss_amount,
            asset: event.asset.clone(),
            leverage: event.leverage,
            position_size: event.position_size,
            liquidation: event.liquidation,
            timestamp: event.timestamp,
            multiplier,
            minted,
            pools,
        })
    }

    #[must_use]
    pub const fn seq(&self) -> EventSeq {
        self.seq
    }

    #[must_use]
    pub fn trader(&self) -> &Pseudonym {
        &self.trader
    }

    #[must_use]
    pub const fn loss_amount(&self) -> Amount {
        self.loss_amount
    }

    #[must_use]
    pub fn asset(&self) -> &str {
        &self.asset
    }

    #[must_use]
    pub const fn leverage(&self) -> Decimal {
        self.leverage
    }

    #[must_use]
    pub const fn position_size(&self) -> Amount {
        self.position_size
    }

    #[must_use]
    pub const fn is_liquidation(&self) -> bool {
        self.liquidation
    }

    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    #[must_use]
    pub const fn multiplier(&self) -> Decimal {
        self.multiplier
    }

    #[must_use]
    pub const fn minted(&self) -> Tokens {
        self.minted
    }

    /// Pools the classifier placed this event in.
    #[must_use]
    pub fn pools(&self) -> &PoolSet {
        &self.pools
    }

    /// Returns true if the event was classified into the given pool.
    #[must_use]
    pub fn is_in(&self, kind: PoolKind) -> bool {
        self.pools.contains(&kind)
    }
}
