//! Tranche-to-buyer matching.
//!
//! Fit is additive: 30 points when the tranche is large enough for the
//! buyer's minimum ticket, plus 0-40 points from how well the rating suits
//! the buyer's risk appetite. A buyer is only matched when the total is
//! strictly above the threshold.

use tracing::{debug, info};

use crate::domain::buyer::{BuyerDirectory, InstitutionalBuyer, MatchResult, RiskAppetite};
use crate::domain::tranche::{Rating, Tranche};

/// Points awarded when the tranche covers the buyer's minimum investment.
pub const SIZE_FIT_POINTS: u32 = 30;
/// Highest possible fit score.
pub const MAX_FIT_SCORE: u32 = SIZE_FIT_POINTS + 40;

/// Appetite/rating fit in points, 0-40.
#[must_use]
pub const fn risk_fit(appetite: RiskAppetite, rating: Rating) -> u32 {
    match appetite {
        RiskAppetite::Low => match rating {
            Rating::Aaa => 40,
            Rating::Aa => 35,
            Rating::A => 25,
            Rating::Bbb => 10,
            Rating::Bb | Rating::B | Rating::Ccc => 0,
        },
        RiskAppetite::Medium => match rating {
            Rating::Aaa => 20,
            Rating::Aa => 25,
            Rating::A => 35,
            Rating::Bbb => 40,
            Rating::Bb => 30,
            Rating::B => 15,
            Rating::Ccc => 5,
        },
        RiskAppetite::High => match rating {
            Rating::Aaa => 5,
            Rating::Aa => 10,
            Rating::A => 15,
            Rating::Bbb => 25,
            Rating::Bb => 35,
            Rating::B | Rating::Ccc => 40,
        },
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BuyerMatcher {
    threshold: u32,
}

impl BuyerMatcher {
    #[must_use]
    pub const fn new(threshold: u32) -> Self {
        Self { threshold }
    }

    #[must_use]
    pub const fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Fit score of `buyer` for `tranche`.
    #[must_use]
    pub fn fit_score(tranche: &Tranche, buyer: &InstitutionalBuyer) -> u32 {
        let size = if tranche.notional() >= buyer.min_investment {
            SIZE_FIT_POINTS
        } else {
            0
        };
        size + risk_fit(buyer.risk_appetite, tranche.rating())
    }

    /// Best buyer for an available tranche, if any clears the threshold.
    ///
    /// Buyers are scanned in directory order and only a strictly higher
    /// score replaces the current best, so the earliest buyer wins ties.
    #[must_use]
    pub fn best_match(&self, tranche: &Tranche, buyers: &BuyerDirectory) -> Option<MatchResult> {
        if !tranche.is_available() {
            return None;
        }

        let mut best: Option<(&InstitutionalBuyer, u32)> = None;
        for buyer in buyers.buyers() {
            let score = Self::fit_score(tranche, buyer);
            debug!(tranche = %tranche.id(), buyer = %buyer.id, score, "Scored buyer");
            if best.map_or(true, |(_, top)| score > top) {
                best = Some((buyer, score));
            }
        }

        best.filter(|(_, score)| *score > self.threshold)
            .map(|(buyer, fit_score)| MatchResult {
                tranche_id: tranche.id().clone(),
                rating: tranche.rating(),
                notional: tranche.notional(),
                buyer_id: buyer.id.clone(),
                buyer_name: buyer.name.clone(),
                fit_score,
                yield_spread: tranche.coupon() - buyer.preferred_yield,
            })
    }

    /// Match every available tranche and mark the matched ones.
    ///
    /// A buyer may take several tranches; buyer capacity is not tracked.
    pub fn match_all(&self, tranches: &mut [Tranche], buyers: &BuyerDirectory) -> Vec<MatchResult> {
        let mut matches = Vec::new();
        for tranche in tranches.iter_mut() {
            if let Some(result) = self.best_match(tranche, buyers) {
                tranche.mark_matched();
                info!(
                    tranche = %result.tranche_id,
                    buyer = %result.buyer_id,
                    fit_score = result.fit_score,
                    spread = %result.yield_spread,
                    "Tranche matched"
                );
                matches.push(result);
            }
        }
        matches
    }
}

impl Default for BuyerMatcher {
    fn default() -> Self {
        Self::new(50)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::id::{BuyerId, SnapshotId};
    use crate::domain::tranche::{Segment, TrancheStatus};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn buyer(id: &str, appetite: RiskAppetite, min: Decimal) -> InstitutionalBuyer {
        InstitutionalBuyer {
            id: BuyerId::from(id),
            name: id.to_string(),
            risk_appetite: appetite,
            preferred_yield: dec!(0.08),
            min_investment: min,
        }
    }

    fn tranche(rating: Rating, notional: Decimal) -> Tranche {
        Tranche::new(
            SnapshotId::from("snap"),
            rating,
            Segment::Senior,
            notional,
            dec!(0.10),
            dec!(1000),
            None,
        )
    }

    #[test]
    fn fit_table_extremes() {
        assert_eq!(risk_fit(RiskAppetite::Low, Rating::Aaa), 40);
        assert_eq!(risk_fit(RiskAppetite::Low, Rating::Ccc), 0);
        assert_eq!(risk_fit(RiskAppetite::Medium, Rating::Bbb), 40);
        assert_eq!(risk_fit(RiskAppetite::High, Rating::Ccc), 40);
        assert_eq!(MAX_FIT_SCORE, 70);
    }

    #[test]
    fn low_appetite_buyer_skips_ccc() {
        // 5M minimum vs 3M CCC tranche: no size points, no risk points.
        let t = tranche(Rating::Ccc, dec!(3000000));
        let b = buyer("pension", RiskAppetite::Low, dec!(5000000));
        assert_eq!(BuyerMatcher::fit_score(&t, &b), 0);

        let dir = BuyerDirectory::new(vec![b]);
        assert!(BuyerMatcher::default().best_match(&t, &dir).is_none());
    }

    #[test]
    fn picks_highest_fit() {
        let t = tranche(Rating::Bbb, dec!(500000));
        let dir = BuyerDirectory::new(vec![
            buyer("safe", RiskAppetite::Low, dec!(100000)),
            buyer("mid", RiskAppetite::Medium, dec!(100000)),
        ]);
        let result = BuyerMatcher::default().best_match(&t, &dir).unwrap();
        assert_eq!(result.buyer_id.as_str(), "mid");
        assert_eq!(result.fit_score, 70);
        assert_eq!(result.yield_spread, dec!(0.02));
    }

    #[test]
    fn ties_go_to_first_buyer() {
        let t = tranche(Rating::A, dec!(500000));
        let dir = BuyerDirectory::new(vec![
            buyer("first", RiskAppetite::Medium, dec!(1)),
            buyer("second", RiskAppetite::Medium, dec!(1)),
        ]);
        let result = BuyerMatcher::default().best_match(&t, &dir).unwrap();
        assert_eq!(result.buyer_id.as_str(), "first");
    }

    #[test]
    fn threshold_is_strict() {
        // Medium on B: 30 + 15 = 45; medium on BB: 30 + 30 = 60.
        let dir = BuyerDirectory::new(vec![buyer("m", RiskAppetite::Medium, dec!(1))]);
        assert!(BuyerMatcher::new(45).best_match(&tranche(Rating::B, dec!(10)), &dir).is_none());
        assert!(BuyerMatcher::new(44).best_match(&tranche(Rating::B, dec!(10)), &dir).is_some());
        assert!(BuyerMatcher::new(50).best_match(&tranche(Rating::Bb, dec!(10)), &dir).is_some());
    }

    #[test]
    fn match_all_marks_and_skips_unavailable() {
        let dir = BuyerDirectory::new(vec![buyer("h", RiskAppetite::High, dec!(1))]);
        let mut knocked = Tranche::new(
            SnapshotId::from("snap"),
            Rating::B,
            Segment::Equity,
            dec!(100),
            dec!(0.16),
            dec!(1),
            Some(10.0),
        );
        assert!(knocked.apply_knockout(50.0));

        let mut tranches = vec![tranche(Rating::Ccc, dec!(100)), knocked, tranche(Rating::Aaa, dec!(100))];
        let matches = BuyerMatcher::default().match_all(&mut tranches, &dir);

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].rating, Rating::Ccc);
        assert_eq!(tranches[0].status(), TrancheStatus::Matched);
        assert_eq!(tranches[1].status(), TrancheStatus::KnockedOut);
        assert_eq!(tranches[2].status(), TrancheStatus::Available);
    }

    #[test]
    fn empty_directory_matches_nothing() {
        let mut tranches = vec![tranche(Rating::Aaa, dec!(100))];
        assert!(BuyerMatcher::default()
            .match_all(&mut tranches, &BuyerDirectory::default())
            .is_empty());
    }
}
