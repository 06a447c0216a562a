//! FRY Score computation.
//!
//! Each [`ScoreEngine::recompute`] call selects the events inside the
//! trailing window, measures the five components, combines them into a raw
//! score and smooths it against the previous published score:
//!
//! ```text
//! score = (1 - alpha) * previous + alpha * raw
//! ```
//!
//! A quiet window yields a raw score of zero, so the published score decays
//! toward zero while nothing happens.

use std::collections::VecDeque;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::prelude::ToPrimitive;
use tracing::info;

use crate::domain::event::AnonymizedLossEvent;
use crate::domain::pool::{PoolKind, PoolSnapshot};
use crate::domain::score::{
    clamp_score, CompositeScore, ScoreComponents, ScoreReport, ScoreWeights, Trend,
};

/// Points of loss velocity per event in the window.
const VELOCITY_PER_EVENT: f64 = 2.0;
/// Points of leverage distribution per unit of average leverage.
const LEVERAGE_SCALE: f64 = 4.0;
/// Points of whale activity per whale event.
const WHALE_PER_EVENT: f64 = 10.0;
/// Points of volatility per unit of average multiplier.
const VOLATILITY_SCALE: f64 = 20.0;
/// Ceiling for every normalized component.
const COMPONENT_MAX: f64 = 100.0;

/// Tunable parameters of the score engine.
#[derive(Debug, Clone)]
pub struct ScoreSettings {
    /// Trailing window of events considered each cycle.
    pub window: Duration,
    /// Weight given to the raw score when smoothing (0.3 = 70% previous).
    pub smoothing_alpha: f64,
    /// Maximum number of history points retained.
    pub history_cap: usize,
    pub weights: ScoreWeights,
    /// Score the smoothing starts from before the first cycle.
    pub initial_score: f64,
    /// Number of history steps the trend compares across.
    pub trend_lookback: usize,
    /// Relative change needed to call a trend (0.05 = 5%).
    pub trend_tolerance: f64,
}

impl Default for ScoreSettings {
    fn default() -> Self {
        Self {
            window: Duration::hours(1),
            smoothing_alpha: 0.3,
            history_cap: 100,
            weights: ScoreWeights::default(),
            initial_score: 100.0,
            trend_lookback: 5,
            trend_tolerance: 0.05,
        }
    }
}

/// Maintains the smoothed FRY Score and its bounded history.
#[derive(Debug, Clone)]
pub struct ScoreEngine {
    settings: ScoreSettings,
    current: f64,
    history: VecDeque<CompositeScore>,
}

impl ScoreEngine {
    #[must_use]
    pub fn new(settings: ScoreSettings) -> Self {
        let current = clamp_score(settings.initial_score);
        Self {
            history: VecDeque::with_capacity(settings.history_cap),
            settings,
            current,
        }
    }

    /// Current published score.
    #[must_use]
    pub const fn current(&self) -> f64 {
        self.current
    }

    /// History, oldest first.
    #[must_use]
    pub fn history(&self) -> &VecDeque<CompositeScore> {
        &self.history
    }

    #[must_use]
    pub const fn settings(&self) -> &ScoreSettings {
        &self.settings
    }

    /// Run one scoring cycle over `snapshot` with the window ending at `now`.
    pub fn recompute(&mut self, snapshot: &PoolSnapshot, now: DateTime<Utc>) -> ScoreReport {
        let start = now - self.settings.window;
        let events = snapshot.unique_events();
        let selected: Vec<&AnonymizedLossEvent> = events
            .iter()
            .map(|e| e.as_ref())
            .filter(|e| e.timestamp() >= start && e.timestamp() <= now)
            .collect();

        let components = measure(&selected);
        let raw = components.raw_score(&self.settings.weights);
        let alpha = self.settings.smoothing_alpha;
        self.current = clamp_score((1.0 - alpha) * self.current + alpha * raw);

        let point = CompositeScore {
            timestamp: now,
            score: self.current,
            raw,
            components,
        };
        self.history.push_back(point);
        while self.history.len() > self.settings.history_cap {
            self.history.pop_front();
        }

        let trend = self.trend();
        info!(
            score = self.current,
            raw,
            sample_size = selected.len(),
            trend = %trend,
            "FRY score recomputed"
        );

        ScoreReport {
            score: point,
            trend,
            sample_size: selected.len(),
        }
    }

    /// Compare the latest point with the one `trend_lookback` steps back.
    #[must_use]
    pub fn trend(&self) -> Trend {
        let lookback = self.settings.trend_lookback;
        let len = self.history.len();
        if lookback == 0 || len <= lookback {
            return Trend::Stable;
        }

        let last = self.history[len - 1].score;
        let back = self.history[len - 1 - lookback].score;
        let tolerance = self.settings.trend_tolerance;

        if back <= 0.0 {
            return if last > 0.0 {
                Trend::Increasing
            } else {
                Trend::Stable
            };
        }
        if last > back * (1.0 + tolerance) {
            Trend::Increasing
        } else if last < back * (1.0 - tolerance) {
            Trend::Decreasing
        } else {
            Trend::Stable
        }
    }

    /// Linear extrapolation of the history `steps` cycles ahead.
    ///
    /// Uses a least-squares fit over the retained history. With fewer than
    /// two points the current score is returned.
    #[must_use]
    pub fn predict(&self, steps: usize) -> f64 {
        let n = self.history.len();
        if n < 2 {
            return self.current;
        }

        let n_f = n as f64;
        let mean_x = (n_f - 1.0) / 2.0;
        let mean_y = self.history.iter().map(|p| p.score).sum::<f64>() / n_f;

        let (mut cov, mut var) = (0.0, 0.0);
        for (i, point) in self.history.iter().enumerate() {
            let dx = i as f64 - mean_x;
            cov += dx * (point.score - mean_y);
            var += dx * dx;
        }
        let slope = if var == 0.0 { 0.0 } else { cov / var };
        let x = n_f - 1.0 + steps as f64;
        clamp_score(mean_y + slope * (x - mean_x))
    }
}

impl Default for ScoreEngine {
    fn default() -> Self {
        Self::new(ScoreSettings::default())
    }
}

/// Measure the five components over the selected events.
fn measure(events: &[&AnonymizedLossEvent]) -> ScoreComponents {
    if events.is_empty() {
        return ScoreComponents::default();
    }

    let count = events.len() as f64;
    let liquidations = events.iter().filter(|e| e.is_liquidation()).count() as f64;
    let whales = events.iter().filter(|e| e.is_in(PoolKind::Whale)).count() as f64;
    let avg_leverage = events
        .iter()
        .map(|e| e.leverage().to_f64().unwrap_or(0.0))
        .sum::<f64>()
        / count;
    let avg_multiplier = events
        .iter()
        .map(|e| e.multiplier().to_f64().unwrap_or(0.0))
        .sum::<f64>()
        / count;

    ScoreComponents {
        loss_velocity: (count * VELOCITY_PER_EVENT).min(COMPONENT_MAX),
        liquidation_intensity: COMPONENT_MAX * liquidations / count,
        leverage_distribution: (avg_leverage * LEVERAGE_SCALE).min(COMPONENT_MAX),
        whale_activity: (whales * WHALE_PER_EVENT).min(COMPONENT_MAX),
        volatility_index: (avg_multiplier * VOLATILITY_SCALE).min(COMPONENT_MAX),
    }
}
