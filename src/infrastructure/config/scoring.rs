//! FRY Score configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::application::scoring::ScoreSettings;
use crate::domain::score::{ScoreWeights, SCORE_MAX, SCORE_MIN};
use crate::error::ConfigError;

/// Tolerance when checking that weights sum to one.
const WEIGHT_SUM_EPSILON: f64 = 1e-6;
/// Longest accepted scoring window (ten years).
const MAX_WINDOW_SECS: u64 = 10 * 365 * 24 * 3600;

/// Score engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Trailing window of events scored each cycle.
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
    /// Weight of the raw score when smoothing.
    #[serde(default = "default_smoothing_alpha")]
    pub smoothing_alpha: f64,
    #[serde(default = "default_history_cap")]
    pub history_cap: usize,
    #[serde(default)]
    pub weights: ScoreWeights,
    #[serde(default = "default_initial_score")]
    pub initial_score: f64,
    /// Cadence of the background scoring task.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    #[serde(default = "default_trend_lookback")]
    pub trend_lookback: usize,
    #[serde(default = "default_trend_tolerance")]
    pub trend_tolerance: f64,
}

const fn default_window_secs() -> u64 {
    3600
}

const fn default_smoothing_alpha() -> f64 {
    0.3
}

const fn default_history_cap() -> usize {
    100
}

const fn default_initial_score() -> f64 {
    100.0
}

const fn default_interval_secs() -> u64 {
    30
}

const fn default_trend_lookback() -> usize {
    5
}

const fn default_trend_tolerance() -> f64 {
    0.05
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            window_secs: default_window_secs(),
            smoothing_alpha: default_smoothing_alpha(),
            history_cap: default_history_cap(),
            weights: ScoreWeights::default(),
            initial_score: default_initial_score(),
            interval_secs: default_interval_secs(),
            trend_lookback: default_trend_lookback(),
            trend_tolerance: default_trend_tolerance(),
        }
    }
}

impl ScoringConfig {
    /// Validate window, smoothing, history and weights.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window_secs == 0 || self.window_secs > MAX_WINDOW_SECS {
            return Err(ConfigError::InvalidValue {
                field: "scoring.window_secs",
                reason: format!("must be between 1 and {MAX_WINDOW_SECS}"),
            });
        }
        if !(self.smoothing_alpha > 0.0 && self.smoothing_alpha <= 1.0) {
            return Err(ConfigError::InvalidValue {
                field: "scoring.smoothing_alpha",
                reason: "must be in (0, 1]".to_string(),
            });
        }
        if self.history_cap == 0 {
            return Err(ConfigError::InvalidValue {
                field: "scoring.history_cap",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.trend_lookback == 0 {
            return Err(ConfigError::InvalidValue {
                field: "scoring.trend_lookback",
                reason: "must be at least 1".to_string(),
            });
        }
        // The trend compares against a point `trend_lookback` steps back,
        // which must still be inside the retained history.
        if self.history_cap <= self.trend_lookback {
            return Err(ConfigError::InvalidValue {
                field: "scoring.history_cap",
                reason: format!(
                    "must be greater than scoring.trend_lookback ({})",
                    self.trend_lookback
                ),
            });
        }
        if self.weights.has_invalid_weight() {
            return Err(ConfigError::InvalidValue {
                field: "scoring.weights",
                reason: "weights must be finite and non-negative".to_string(),
            });
        }
        if (self.weights.total() - 1.0).abs() > WEIGHT_SUM_EPSILON {
            return Err(ConfigError::InvalidValue {
                field: "scoring.weights",
                reason: format!("weights must sum to 1 (got {})", self.weights.total()),
            });
        }
        if !(SCORE_MIN..=SCORE_MAX).contains(&self.initial_score) {
            return Err(ConfigError::InvalidValue {
                field: "scoring.initial_score",
                reason: format!("must be between {SCORE_MIN} and {SCORE_MAX}"),
            });
        }
        if self.interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "scoring.interval_secs",
                reason: "must be greater than 0".to_string(),
            });
        }
        if !(self.trend_tolerance.is_finite() && self.trend_tolerance >= 0.0) {
            return Err(ConfigError::InvalidValue {
                field: "scoring.trend_tolerance",
                reason: "must be 0 or greater".to_string(),
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    #[must_use]
    pub fn settings(&self) -> ScoreSettings {
        ScoreSettings {
            window: chrono::Duration::seconds(self.window_secs.min(MAX_WINDOW_SECS) as i64),
            smoothing_alpha: self.smoothing_alpha,
            history_cap: self.history_cap,
            weights: self.weights,
            initial_score: self.initial_score,
            trend_lookback: self.trend_lookback,
            trend_tolerance: self.trend_tolerance,
        }
    }
}
