//! Domain validation errors for loss events.
//!
//! These errors are returned by `try_new` constructors and by the
//! [`TryFrom<LossRecord>`](crate::domain::event::LossRecord) conversion
//! when a feed record is malformed. A rejected event is skipped by the
//! aggregator and counted in the batch summary; it never aborts a batch.
//!
//! # Examples
//!
//! ```
//! use fry_engine::domain::error::DomainError;
//! use fry_engine::domain::event::LossEvent;
//! use chrono::Utc;
//! use rust_decimal_macros::dec;
//!
//! let result = LossEvent::try_new("", dec!(100), "BTC", dec!(2), dec!(1000), false, Utc::now());
//! assert!(matches!(result, Err(DomainError::EmptyTraderId)));
//! ```

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors raised when a single loss event violates its invariants.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A required field was absent from the feed record.
    #[error("missing required field: {field}")]
    MissingField {
        /// Name of the absent field.
        field: &'static str,
    },

    /// Trader identifiers must be non-empty to be pseudonymized.
    #[error("trader identifier cannot be empty")]
    EmptyTraderId,

    /// Asset symbols must be non-empty.
    #[error("asset symbol cannot be empty")]
    EmptyAsset,

    /// Loss amount must be strictly positive.
    #[error("loss amount must be positive, got {amount}")]
    NonPositiveLoss {
        /// The invalid amount.
        amount: Decimal,
    },

    /// Leverage must be at least 1x.
    #[error("leverage must be >= 1, got {leverage}")]
    LeverageBelowOne {
        /// The invalid leverage.
        leverage: Decimal,
    },

    /// Position size cannot be negative.
    #[error("position size cannot be negative, got {size}")]
    NegativePositionSize {
        /// The invalid position size.
        size: Decimal,
    },

    /// Loss amount is above the largest loss the engine accepts.
    #[error("loss amount exceeds maximum of {max}, got {amount}")]
    LossTooLarge {
        /// The rejected amount.
        amount: Decimal,
        /// The accepted maximum.
        max: Decimal,
    },

    /// Minting or a running total left the representable decimal range.
    #[error("arithmetic overflow while {context}")]
    Overflow {
        /// What was being computed.
        context: &'static str,
    },

    /// A feed entry could not be decoded into a loss record.
    #[error("undecodable feed entry at {position}: {reason}")]
    Undecodable {
        /// 1-based line number for JSON lines, 0-based element index for arrays.
        position: usize,
        /// Decoder message.
        reason: String,
    },
}
