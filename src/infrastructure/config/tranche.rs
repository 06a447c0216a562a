//! Tranche ladder configuration.

use serde::{Deserialize, Serialize};

use crate::application::tranche::{default_ladder, validate_ladder, LadderRung, TrancheBuilder};
use crate::error::ConfigError;

/// Rating ladder and coupon stress loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranchesConfig {
    #[serde(default = "default_ladder")]
    pub ladder: Vec<LadderRung>,
    /// Coupon uplift at a FRY Score of 100 (0.5 = +50%).
    #[serde(default = "default_stress_loading")]
    pub stress_loading: f64,
}

const fn default_stress_loading() -> f64 {
    0.5
}

impl Default for TranchesConfig {
    fn default() -> Self {
        Self {
            ladder: default_ladder(),
            stress_loading: default_stress_loading(),
        }
    }
}

impl TranchesConfig {
    /// Validate the ladder and stress loading.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] describing the first problem.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_ladder(&self.ladder)?;
        if !(self.stress_loading.is_finite() && self.stress_loading >= 0.0) {
            return Err(ConfigError::InvalidValue {
                field: "tranches.stress_loading",
                reason: "must be 0 or greater".to_string(),
            });
        }
        Ok(())
    }

    /// Build a tranche builder from this configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails.
    pub fn builder(&self) -> Result<TrancheBuilder, ConfigError> {
        TrancheBuilder::new(self.ladder.clone(), self.stress_loading)
    }
}
