//! Classification and minting configuration.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::application::classifier::EventClassifier;
use crate::application::multiplier::{
    default_leverage_tiers, default_whale_tiers, BonusTier, MultiplierCalculator,
};
use crate::error::ConfigError;

/// Largest accepted multiplier cap.
const MAX_MULTIPLIER_CAP: u32 = 1000;

/// Classification thresholds and multiplier pipeline parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MintingConfig {
    /// Loss at or above which an event is a whale event.
    #[serde(default = "default_whale_threshold")]
    pub whale_threshold: Decimal,
    /// Leverage at or above which a non-whale event is medium leverage.
    #[serde(default = "default_medium_leverage")]
    pub medium_leverage: Decimal,
    #[serde(default = "default_liquidation_bonus")]
    pub liquidation_bonus: Decimal,
    #[serde(default = "default_leverage_tiers")]
    pub leverage_tiers: Vec<BonusTier>,
    #[serde(default = "default_whale_tiers")]
    pub whale_tiers: Vec<BonusTier>,
    #[serde(default = "default_multiplier_cap")]
    pub multiplier_cap: Decimal,
}

fn default_whale_threshold() -> Decimal {
    Decimal::from(10_000)
}

fn default_medium_leverage() -> Decimal {
    Decimal::from(5)
}

fn default_liquidation_bonus() -> Decimal {
    Decimal::from(5)
}

fn default_multiplier_cap() -> Decimal {
    Decimal::from(50)
}

impl Default for MintingConfig {
    fn default() -> Self {
        Self {
            whale_threshold: default_whale_threshold(),
            medium_leverage: default_medium_leverage(),
            liquidation_bonus: default_liquidation_bonus(),
            leverage_tiers: default_leverage_tiers(),
            whale_tiers: default_whale_tiers(),
            multiplier_cap: default_multiplier_cap(),
        }
    }
}

impl MintingConfig {
    /// Validate thresholds, bonuses and tier ordering.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.whale_threshold <= Decimal::ZERO {
            return Err(ConfigError::InvalidValue {
                field: "minting.whale_threshold",
                reason: "must be greater than 0".to_string(),
            });
        }
        if self.medium_leverage < Decimal::ONE {
            return Err(ConfigError::InvalidValue {
                field: "minting.medium_leverage",
                reason: "must be >= 1".to_string(),
            });
        }
        if self.liquidation_bonus < Decimal::ONE {
            return Err(ConfigError::InvalidValue {
                field: "minting.liquidation_bonus",
                reason: "must be >= 1".to_string(),
            });
        }
        if self.multiplier_cap < Decimal::ONE
            || self.multiplier_cap > Decimal::from(MAX_MULTIPLIER_CAP)
        {
            return Err(ConfigError::InvalidValue {
                field: "minting.multiplier_cap",
                reason: format!("must be between 1 and {MAX_MULTIPLIER_CAP}"),
            });
        }
        validate_tiers("minting.leverage_tiers", &self.leverage_tiers)?;
        validate_tiers("minting.whale_tiers", &self.whale_tiers)
    }

    #[must_use]
    pub fn classifier(&self) -> EventClassifier {
        EventClassifier::new(self.whale_threshold, self.medium_leverage)
    }

    #[must_use]
    pub fn calculator(&self) -> MultiplierCalculator {
        MultiplierCalculator::standard(
            self.liquidation_bonus,
            self.leverage_tiers.clone(),
            self.whale_tiers.clone(),
            self.multiplier_cap,
        )
    }
}

fn validate_tiers(field: &'static str, tiers: &[BonusTier]) -> Result<(), ConfigError> {
    if tiers.iter().any(|tier| tier.factor < Decimal::ONE) {
        return Err(ConfigError::InvalidValue {
            field,
            reason: "every factor must be >= 1".to_string(),
        });
    }
    if tiers.windows(2).any(|pair| pair[0].threshold <= pair[1].threshold) {
        return Err(ConfigError::InvalidValue {
            field,
            reason: "thresholds must be strictly descending".to_string(),
        });
    }
    // Keeps the multiplier non-decreasing in leverage and loss.
    if tiers.windows(2).any(|pair| pair[0].factor < pair[1].factor) {
        return Err(ConfigError::InvalidValue {
            field,
            reason: "factors must not grow as thresholds fall".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn defaults_are_valid() {
        assert!(MintingConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_unsorted_tiers() {
        let config = MintingConfig {
            leverage_tiers: vec![
                BonusTier::new(dec!(5), dec!(1.5)),
                BonusTier::new(dec!(20), dec!(3)),
            ],
            ..MintingConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field: "minting.leverage_tiers", .. })
        ));
    }

    #[test]
    fn rejects_shrinking_factor() {
        let config = MintingConfig {
            whale_tiers: vec![BonusTier::new(dec!(10000), dec!(0.5))],
            ..MintingConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_factors_rising_below_higher_thresholds() {
        let config = MintingConfig {
            leverage_tiers: vec![
                BonusTier::new(dec!(20), dec!(1.5)),
                BonusTier::new(dec!(10), dec!(3.0)),
            ],
            ..MintingConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field: "minting.leverage_tiers", .. })
        ));

        let flat = MintingConfig {
            whale_tiers: vec![
                BonusTier::new(dec!(10000), dec!(2)),
                BonusTier::new(dec!(5000), dec!(2)),
            ],
            ..MintingConfig::default()
        };
        assert!(flat.validate().is_ok());
    }

    #[test]
    fn rejects_cap_out_of_range() {
        let config = MintingConfig {
            multiplier_cap: dec!(0.9),
            ..MintingConfig::default()
        };
        assert!(config.validate().is_err());

        let huge = MintingConfig {
            multiplier_cap: dec!(1000.5),
            ..MintingConfig::default()
        };
        assert!(matches!(
            huge.validate(),
            Err(ConfigError::InvalidValue { field: "minting.multiplier_cap", .. })
        ));
    }
}
