//! Buyer matching configuration and the default buyer directory.

use std::collections::HashSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::application::matcher::{BuyerMatcher, MAX_FIT_SCORE};
use crate::domain::buyer::{BuyerDirectory, InstitutionalBuyer, RiskAppetite};
use crate::error::ConfigError;

/// Match threshold and buyer directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchingConfig {
    /// Fit score a buyer must strictly exceed to be matched.
    #[serde(default = "default_threshold")]
    pub threshold: u32,
    /// Buyers in tie-break order.
    #[serde(default = "default_buyers")]
    pub buyers: Vec<InstitutionalBuyer>,
}

const fn default_threshold() -> u32 {
    50
}

fn profile(
    id: &str,
    name: &str,
    risk_appetite: RiskAppetite,
    preferred_yield: Decimal,
    min_investment: i64,
) -> InstitutionalBuyer {
    InstitutionalBuyer {
        id: id.into(),
        name: name.to_string(),
        risk_appetite,
        preferred_yield,
        min_investment: Decimal::from(min_investment),
    }
}

/// Five reference institutional profiles, most conservative first.
#[must_use]
pub fn default_buyers() -> Vec<InstitutionalBuyer> {
    vec![
        profile("meridian-pension", "Meridian Pension Fund", RiskAppetite::Low, Decimal::new(5, 2), 5_000_000),
        profile("harbor-mutual", "Harbor Mutual Insurance", RiskAppetite::Low, Decimal::new(6, 2), 1_000_000),
        profile("crescent-am", "Crescent Asset Management", RiskAppetite::Medium, Decimal::new(9, 2), 250_000),
        profile("northgate-credit", "Northgate Credit Opportunities", RiskAppetite::Medium, Decimal::new(11, 2), 100_000),
        profile("volterra-capital", "Volterra Capital", RiskAppetite::High, Decimal::new(18, 2), 25_000),
    ]
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            buyers: default_buyers(),
        }
    }
}

impl MatchingConfig {
    /// Validate the threshold and buyer profiles.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] describing the first problem.
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Matching needs a fit strictly above the threshold.
        if self.threshold >= MAX_FIT_SCORE {
            return Err(ConfigError::InvalidValue {
                field: "matching.threshold",
                reason: format!("must be between 0 and {}", MAX_FIT_SCORE - 1),
            });
        }

        let mut ids = HashSet::new();
        let mut names = HashSet::new();
        for buyer in &self.buyers {
            if buyer.id.as_str().trim().is_empty() || buyer.name.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "matching.buyers",
                    reason: "buyer id and name must not be empty".to_string(),
                });
            }
            if !ids.insert(buyer.id.as_str()) {
                return Err(ConfigError::InvalidValue {
                    field: "matching.buyers",
                    reason: format!("duplicate buyer id {}", buyer.id),
                });
            }
            if !names.insert(buyer.name.as_str()) {
                return Err(ConfigError::InvalidValue {
                    field: "matching.buyers",
                    reason: format!("duplicate buyer name {}", buyer.name),
                });
            }
            if buyer.preferred_yield < Decimal::ZERO || buyer.min_investment < Decimal::ZERO {
                return Err(ConfigError::InvalidValue {
                    field: "matching.buyers",
                    reason: format!("{}: yield and minimum must be >= 0", buyer.id),
                });
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn matcher(&self) -> BuyerMatcher {
        BuyerMatcher::new(self.threshold)
    }

    #[must_use]
    pub fn directory(&self) -> BuyerDirectory {
        BuyerDirectory::new(self.buyers.clone())
    }
}
