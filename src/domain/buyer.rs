//! Institutional buyer profiles and match results.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{BuyerId, TrancheId};
use super::money::Amount;
use super::tranche::Rating;

/// How much credit risk a buyer is willing to hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskAppetite {
    Low,
    Medium,
    High,
}

impl RiskAppetite {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for RiskAppetite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static buyer profile. Read-only reference data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstitutionalBuyer {
    pub id: BuyerId,
    pub name: String,
    pub risk_appetite: RiskAppetite,
    /// Preferred annual yield as a fraction.
    pub preferred_yield: Decimal,
    pub min_investment: Amount,
}

/// Ordered buyer directory.
///
/// Insertion order is significant: it breaks ties between equally fit
/// buyers, first entry wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuyerDirectory {
    buyers: Vec<InstitutionalBuyer>,
}

impl BuyerDirectory {
    #[must_use]
    pub fn new(buyers: Vec<InstitutionalBuyer>) -> Self {
        Self { buyers }
    }

    /// Buyers in insertion order.
    #[must_use]
    pub fn buyers(&self) -> &[InstitutionalBuyer] {
        &self.buyers
    }

    #[must_use]
    pub fn get(&self, id: &BuyerId) -> Option<&InstitutionalBuyer> {
        self.buyers.iter().find(|b| &b.id == id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.buyers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buyers.is_empty()
    }
}

/// Pairing of a tranche with its best-fit buyer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    pub tranche_id: TrancheId,
    pub rating: Rating,
    pub notional: Amount,
    pub buyer_id: BuyerId,
    pub buyer_name: String,
    /// Fit score in points (0-70).
    pub fit_score: u32,
    /// Tranche coupon minus the buyer's preferred yield.
    pub yield_spread: Decimal,
}
