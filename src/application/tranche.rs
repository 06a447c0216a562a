//! Tranche building from pool snapshots.
//!
//! Every unique event contributes its minted value to one segment (see
//! [`Segment::for_pools`]). Each rung of the rating ladder takes a share of
//! one segment, so safe ratings are cut from low-leverage value and the
//! bottom of the ladder absorbs whale and liquidation value. Shares within a
//! segment never exceed 1 and notionals are rounded toward zero, which keeps
//! the sum of all notionals at or below the aggregate value.

use std::collections::{BTreeMap, HashSet};

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::domain::money::Amount;
use crate::domain::pool::PoolSnapshot;
use crate::domain::score::clamp_score;
use crate::domain::tranche::{Rating, Segment, Tranche};
use crate::error::ConfigError;

const NOTIONAL_DP: u32 = 2;
const COUPON_DP: u32 = 4;

/// One rung of the rating ladder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LadderRung {
    pub rating: Rating,
    /// Segment this rung is cut from.
    pub segment: Segment,
    /// Fraction of the segment's value allocated to this rung.
    pub share: Decimal,
    /// Base annual yield as a fraction, before stress loading.
    #[serde(rename = "yield")]
    pub base_yield: Decimal,
    pub min_purchase: Amount,
    /// FRY Score at which an available tranche of this rung is knocked out.
    #[serde(default)]
    pub knockout_score: Option<f64>,
}

fn rung(
    rating: Rating,
    segment: Segment,
    share: Decimal,
    base_yield: Decimal,
    min_purchase: i64,
    knockout_score: Option<f64>,
) -> LadderRung {
    LadderRung {
        rating,
        segment,
        share,
        base_yield,
        min_purchase: Decimal::from(min_purchase),
        knockout_score,
    }
}

/// Default AAA..CCC ladder.
#[must_use]
pub fn default_ladder() -> Vec<LadderRung> {
    vec![
        rung(Rating::Aaa, Segment::Senior, Decimal::new(60, 2), Decimal::new(400, 4), 1_000_000, None),
        rung(Rating::Aa, Segment::Senior, Decimal::new(40, 2), Decimal::new(550, 4), 500_000, None),
        rung(Rating::A, Segment::Mezzanine, Decimal::new(60, 2), Decimal::new(700, 4), 250_000, None),
        rung(Rating::Bbb, Segment::Mezzanine, Decimal::new(40, 2), Decimal::new(900, 4), 100_000, None),
        rung(Rating::Bb, Segment::Junior, Decimal::ONE, Decimal::new(1200, 4), 50_000, Some(95.0)),
        rung(Rating::B, Segment::Equity, Decimal::new(50, 2), Decimal::new(1600, 4), 25_000, Some(90.0)),
        rung(Rating::Ccc, Segment::Equity, Decimal::new(50, 2), Decimal::new(2200, 4), 10_000, Some(85.0)),
    ]
}

/// Check ladder invariants.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidValue`] if the ladder is empty, repeats a
/// rating, has a share outside `(0, 1]`, a negative yield or minimum, or
/// over-allocates a segment.
pub fn validate_ladder(ladder: &[LadderRung]) -> Result<(), ConfigError> {
    if ladder.is_empty() {
        return Err(invalid("ladder must contain at least one rung"));
    }

    let mut ratings = HashSet::new();
    let mut allocated: BTreeMap<Segment, Decimal> = BTreeMap::new();
    for rung in ladder {
        if !ratings.insert(rung.rating) {
            return Err(invalid(format!("duplicate rating {}", rung.rating)));
        }
        if rung.share <= Decimal::ZERO || rung.share > Decimal::ONE {
            return Err(invalid(format!("{} share must be in (0, 1]", rung.rating)));
        }
        if rung.base_yield < Decimal::ZERO {
            return Err(invalid(format!("{} yield must be >= 0", rung.rating)));
        }
        if rung.min_purchase < Decimal::ZERO {
            return Err(invalid(format!("{} min_purchase must be >= 0", rung.rating)));
        }
        if let Some(level) = rung.knockout_score {
            if !(0.0..=100.0).contains(&level) {
                return Err(invalid(format!(
                    "{} knockout_score must be between 0 and 100",
                    rung.rating
                )));
            }
        }
        *allocated.entry(rung.segment).or_insert(Decimal::ZERO) += rung.share;
    }

    if let Some((segment, total)) = allocated.iter().find(|(_, total)| **total > Decimal::ONE) {
        return Err(invalid(format!(
            "{segment} segment is over-allocated ({total} > 1)"
        )));
    }
    Ok(())
}

fn invalid(reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        field: "tranches.ladder",
        reason: reason.into(),
    }
}

/// Cuts risk-rated tranches from a pool snapshot.
#[derive(Debug, Clone)]
pub struct TrancheBuilder {
    ladder: Vec<LadderRung>,
    stress_loading: f64,
}

impl TrancheBuilder {
    /// Create a builder over a validated ladder.
    ///
    /// # Errors
    ///
    /// Returns an error if the ladder fails [`validate_ladder`] or the
    /// stress loading is negative.
    pub fn new(ladder: Vec<LadderRung>, stress_loading: f64) -> Result<Self, ConfigError> {
        validate_ladder(&ladder)?;
        if !stress_loading.is_finite() || stress_loading < 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "tranches.stress_loading",
                reason: "must be >= 0".to_string(),
            });
        }
        Ok(Self {
            ladder,
            stress_loading,
        })
    }

    #[must_use]
    pub fn ladder(&self) -> &[LadderRung] {
        &self.ladder
    }

    /// Minted value attributed to each segment, counting each event once.
    #[must_use]
    pub fn segment_values(snapshot: &PoolSnapshot) -> BTreeMap<Segment, Amount> {
        let mut values = BTreeMap::new();
        for event in snapshot.unique_events() {
            *values
                .entry(Segment::for_pools(event.pools()))
                .or_insert(Decimal::ZERO) += event.minted();
        }
        values
    }

    /// Cut tranches in ladder order. An empty snapshot yields no tranches.
    #[must_use]
    pub fn build(&self, snapshot: &PoolSnapshot, score: f64) -> Vec<Tranche> {
        if snapshot.is_empty() {
            debug!(version = snapshot.version(), "No pool value to tranche");
            return Vec::new();
        }

        let values = Self::segment_values(snapshot);
        let loading = self.coupon_loading(score);

        let tranches: Vec<Tranche> = self
            .ladder
            .iter()
            .filter_map(|rung| {
                let segment_value = values.get(&rung.segment).copied().unwrap_or_default();
                let notional = (segment_value * rung.share)
                    .round_dp_with_strategy(NOTIONAL_DP, RoundingStrategy::ToZero);
                if notional <= Decimal::ZERO {
                    return None;
                }
                Some(Tranche::new(
                    snapshot.id().clone(),
                    rung.rating,
                    rung.segment,
                    notional,
                    (rung.base_yield * loading).round_dp(COUPON_DP),
                    rung.min_purchase,
                    rung.knockout_score,
                ))
            })
            .collect();

        info!(
            snapshot = %snapshot.id(),
            tranches = tranches.len(),
            total_notional = %tranches.iter().map(Tranche::notional).sum::<Decimal>(),
            "Tranches built"
        );
        tranches
    }

    /// Knock out every available tranche whose level `score` has reached.
    ///
    /// Returns the number of tranches knocked out.
    pub fn apply_knockouts(&self, tranches: &mut [Tranche], score: f64) -> usize {
        let mut knocked = 0;
        for tranche in tranches.iter_mut() {
            if tranche.apply_knockout(score) {
                info!(tranche = %tranche.id(), rating = %tranche.rating(), score, "Tranche knocked out");
                knocked += 1;
            }
        }
        knocked
    }

    /// Coupon multiplier: `1 + score / 100 * stress_loading`.
    fn coupon_loading(&self, score: f64) -> Decimal {
        let loading = 1.0 + clamp_score(score) / 100.0 * self.stress_loading;
        Decimal::from_f64(loading).unwrap_or(Decimal::ONE)
    }
}

impl Default for TrancheBuilder {
    fn default() -> Self {
        Self {
            ladder: default_ladder(),
            stress_loading: 0.5,
        }
    }
}
