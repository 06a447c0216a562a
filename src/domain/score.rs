//! FRY Score types.
//!
//! The FRY Score is a smoothed composite index of current market pain.
//! Each scoring cycle measures five components over a trailing window,
//! each normalized to 0-100:
//! - **Loss velocity**: how many losses landed in the window
//! - **Liquidation intensity**: share of losses that were liquidations
//! - **Leverage distribution**: average leverage of the losing positions
//! - **Whale activity**: how many losses crossed the whale threshold
//! - **Volatility index**: average minting multiplier
//!
//! Components are combined with fixed weights into a raw score, which is
//! then exponentially smoothed into the published score.
//!
//! # Examples
//!
//! ```
//! use fry_engine::domain::score::{ScoreComponents, ScoreWeights};
//!
//! let components = ScoreComponents::new(2.0, 100.0, 60.0, 0.0, 100.0);
//! let raw = components.raw_score(&ScoreWeights::default());
//! assert!((raw - 52.5).abs() < 1e-9);
//! ```

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lower bound of the published score.
pub const SCORE_MIN: f64 = 0.0;

/// Upper bound of the published score.
pub const SCORE_MAX: f64 = 100.0;

/// Clamp a value into the published score range.
#[must_use]
pub fn clamp_score(value: f64) -> f64 {
    if value.is_nan() {
        return SCORE_MIN;
    }
    value.clamp(SCORE_MIN, SCORE_MAX)
}

/// The five normalized measurements behind a FRY Score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ScoreComponents {
    pub loss_velocity: f64,
    pub liquidation_intensity: f64,
    pub leverage_distribution: f64,
    pub whale_activity: f64,
    pub volatility_index: f64,
}

impl ScoreComponents {
    #[must_use]
    pub const fn new(
        loss_velocity: f64,
        liquidation_intensity: f64,
        leverage_distribution: f64,
        whale_activity: f64,
        volatility_index: f64,
    ) -> Self {
        Self {
            loss_velocity,
            liquidation_intensity,
            leverage_distribution,
            whale_activity,
            volatility_index,
        }
    }

    /// Weighted sum of the components, clamped to the score range.
    #[must_use]
    pub fn raw_score(&self, weights: &ScoreWeights) -> f64 {
        clamp_score(
            self.loss_velocity * weights.loss_velocity
                + self.liquidation_intensity * weights.liquidation_intensity
                + self.leverage_distribution * weights.leverage_distribution
                + self.whale_activity * weights.whale_activity
                + self.volatility_index * weights.volatility_index,
        )
    }
}

/// Weights for combining components into a raw score.
///
/// Weights must be non-negative and sum to 1 so the raw score stays in
/// the 0-100 range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    pub loss_velocity: f64,
    pub liquidation_intensity: f64,
    pub leverage_distribution: f64,
    pub whale_activity: f64,
    pub volatility_index: f64,
}

impl ScoreWeights {
    /// Sum of all weights.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.loss_velocity
            + self.liquidation_intensity
            + self.leverage_distribution
            + self.whale_activity
            + self.volatility_index
    }

    /// Returns true if any weight is negative or not finite.
    #[must_use]
    pub fn has_invalid_weight(&self) -> bool {
        [
            self.loss_velocity,
            self.liquidation_intensity,
            self.leverage_distribution,
            self.whale_activity,
            self.volatility_index,
        ]
        .iter()
        .any(|w| !w.is_finite() || *w < 0.0)
    }
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            loss_velocity: 0.25,
            liquidation_intensity: 0.30,
            leverage_distribution: 0.20,
            whale_activity: 0.15,
            volatility_index: 0.10,
        }
    }
}

/// One published FRY Score point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CompositeScore {
    /// When the score was computed.
    pub timestamp: DateTime<Utc>,
    /// Smoothed, published score.
    pub score: f64,
    /// Unsmoothed weighted sum for this cycle.
    pub raw: f64,
    /// Component breakdown for this cycle.
    pub components: ScoreComponents,
}

/// Direction of the score over the trend lookback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Increasing,
    Decreasing,
    Stable,
}

impl Trend {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Increasing => "increasing",
            Self::Decreasing => "decreasing",
            Self::Stable => "stable",
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one scoring cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreReport {
    pub score: CompositeScore,
    pub trend: Trend,
    /// Events that fell inside the window. Zero means a quiet period.
    pub sample_size: usize,
}
