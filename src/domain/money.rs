//! Monetary types for loss amounts and minted token quantities.

use rust_decimal::Decimal;

/// Currency amount represented as a Decimal for precision.
pub type Amount = Decimal;

/// FRY token quantity represented as a Decimal for precision.
pub type Tokens = Decimal;
