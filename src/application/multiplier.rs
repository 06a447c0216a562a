//! Minting multiplier pipeline.
//!
//! The multiplier is built by an ordered list of rules. Each rule returns a
//! factor that multiplies the running value, starting from 1.0; the final
//! value is clamped to `[1.0, cap]`. Rules run in registration order, so the
//! composition order is part of the calculator's contract.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::event::LossEvent;

/// Threshold/factor pair for a tiered bonus.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BonusTier {
    /// Inclusive lower bound that activates this tier.
    pub threshold: Decimal,
    /// Factor applied when the tier is active.
    pub factor: Decimal,
}

impl BonusTier {
    #[must_use]
    pub const fn new(threshold: Decimal, factor: Decimal) -> Self {
        Self { threshold, factor }
    }
}

/// Factor of the first tier whose threshold `value` reaches.
///
/// Tiers must be sorted by descending threshold.
fn tier_factor(tiers: &[BonusTier], value: Decimal) -> Decimal {
    tiers
        .iter()
        .find(|tier| value >= tier.threshold)
        .map_or(Decimal::ONE, |tier| tier.factor)
}

/// A single step in the multiplier pipeline.
pub trait MultiplierRule: Send + Sync {
    /// Stable rule name used in breakdowns and logs.
    fn name(&self) -> &'static str;

    /// Factor this rule contributes for `event`. Must be >= 1.
    fn factor(&self, event: &LossEvent) -> Decimal;
}

/// Flat bonus for liquidated positions.
#[derive(Debug, Clone)]
pub struct LiquidationBonus {
    bonus: Decimal,
}

impl LiquidationBonus {
    #[must_use]
    pub const fn new(bonus: Decimal) -> Self {
        Self { bonus }
    }
}

impl MultiplierRule for LiquidationBonus {
    fn name(&self) -> &'static str {
        "liquidation"
    }

    fn factor(&self, event: &LossEvent) -> Decimal {
        if event.is_liquidation() {
            self.bonus
        } else {
            Decimal::ONE
        }
    }
}

/// Tiered bonus keyed on position leverage.
#[derive(Debug, Clone)]
pub struct LeverageBonus {
    tiers: Vec<BonusTier>,
}

impl LeverageBonus {
    /// Tiers are sorted by descending threshold on construction.
    #[must_use]
    pub fn new(mut tiers: Vec<BonusTier>) -> Self {
        tiers.sort_by(|a, b| b.threshold.cmp(&a.threshold));
        Self { tiers }
    }
}

impl MultiplierRule for LeverageBonus {
    fn name(&self) -> &'static str {
        "leverage"
    }

    fn factor(&self, event: &LossEvent) -> Decimal {
        tier_factor(&self.tiers, event.leverage())
    }
}

/// Tiered bonus keyed on loss size.
#[derive(Debug, Clone)]
pub struct WhaleBonus {
    tiers: Vec<BonusTier>,
}

impl WhaleBonus {
    /// Tiers are sorted by descending threshold on construction.
    #[must_use]
    pub fn new(mut tiers: Vec<BonusTier>) -> Self {
        tiers.sort_by(|a, b| b.threshold.cmp(&a.threshold));
        Self { tiers }
    }
}

impl MultiplierRule for WhaleBonus {
    fn name(&self) -> &'static str {
        "whale"
    }

    fn factor(&self, event: &LossEvent) -> Decimal {
        tier_factor(&self.tiers, event.loss_amount())
    }
}

/// Default leverage tiers: >=20 x3.0, >=10 x2.0, >=5 x1.5.
#[must_use]
pub fn default_leverage_tiers() -> Vec<BonusTier> {
    vec![
        BonusTier::new(Decimal::from(20), Decimal::new(30, 1)),
        BonusTier::new(Decimal::from(10), Decimal::new(20, 1)),
        BonusTier::new(Decimal::from(5), Decimal::new(15, 1)),
    ]
}

/// Default loss-size tiers: >=10000 x2.0, >=5000 x1.5.
#[must_use]
pub fn default_whale_tiers() -> Vec<BonusTier> {
    vec![
        BonusTier::new(Decimal::from(10_000), Decimal::new(20, 1)),
        BonusTier::new(Decimal::from(5_000), Decimal::new(15, 1)),
    ]
}

/// Ordered pipeline of multiplier rules with an upper cap.
pub struct MultiplierCalculator {
    rules: Vec<Box<dyn MultiplierRule>>,
    cap: Decimal,
}

impl MultiplierCalculator {
    /// Create an empty pipeline. With no rules every multiplier is 1.0.
    #[must_use]
    pub fn new(cap: Decimal) -> Self {
        Self {
            rules: Vec::new(),
            cap,
        }
    }

    /// Standard pipeline: liquidation, then leverage, then loss size.
    #[must_use]
    pub fn standard(
        liquidation_bonus: Decimal,
        leverage_tiers: Vec<BonusTier>,
        whale_tiers: Vec<BonusTier>,
        cap: Decimal,
    ) -> Self {
        let mut calculator = Self::new(cap);
        calculator.push(Box::new(LiquidationBonus::new(liquidation_bonus)));
        calculator.push(Box::new(LeverageBonus::new(leverage_tiers)));
        calculator.push(Box::new(WhaleBonus::new(whale_tiers)));
        calculator
    }

    /// Append a rule. Rules run in registration order.
    pub fn push(&mut self, rule: Box<dyn MultiplierRule>) {
        self.rules.push(rule);
    }

    /// Names of the registered rules in execution order.
    #[must_use]
    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|rule| rule.name()).collect()
    }

    #[must_use]
    pub const fn cap(&self) -> Decimal {
        self.cap
    }

    /// Multiplier for `event`, in `[1.0, cap]`.
    #[must_use]
    pub fn multiplier(&self, event: &LossEvent) -> Decimal {
        let running = self
            .rules
            .iter()
            .fold(Decimal::ONE, |acc, rule| acc.saturating_mul(rule.factor(event)));
        running.max(Decimal::ONE).min(self.cap)
    }

    /// Per-rule factors in execution order, for inspection.
    #[must_use]
    pub fn breakdown(&self, event: &LossEvent) -> Vec<(&'static str, Decimal)> {
        self.rules
            .iter()
            .map(|rule| (rule.name(), rule.factor(event)))
            .collect()
    }
}

impl Default for MultiplierCalculator {
    fn default() -> Self {
        Self::standard(
            Decimal::from(5),
            default_leverage_tiers(),
            default_whale_tiers(),
            Decimal::from(50),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn event(loss: Decimal, leverage: Decimal, liquidation: bool) -> LossEvent {
        LossEvent::try_new("t", loss, "BTC", leverage, dec!(1000), liquidation, Utc::now())
            .unwrap()
    }

    #[test]
    fn base_multiplier_is_one() {
        let calc = MultiplierCalculator::default();
        assert_eq!(calc.multiplier(&event(dec!(100), dec!(1), false)), dec!(1.0));
    }

    #[test]
    fn liquidation_with_ten_x_leverage() {
        let calc = MultiplierCalculator::default();
        let e = event(dec!(2500), dec!(15), true);
        assert_eq!(calc.multiplier(&e), dec!(10.0));
        assert_eq!(e.loss_amount() * calc.multiplier(&e), dec!(25000.0));
    }

    #[test]
    fn factors_compose_in_order() {
        let calc = MultiplierCalculator::default();
        let e = event(dec!(6000), dec!(5), false);
        assert_eq!(
            calc.breakdown(&e),
            vec![
                ("liquidation", dec!(1)),
                ("leverage", dec!(1.5)),
                ("whale", dec!(1.5)),
            ]
        );
        assert_eq!(calc.multiplier(&e), dec!(2.25));
    }

    #[test]
    fn capped_at_fifty() {
        let calc = MultiplierCalculator::default();
        // 5.0 * 3.0 * 2.0 = 30 (under cap)
        assert_eq!(calc.multiplier(&event(dec!(20000), dec!(25), true)), dec!(30));

        let tight = MultiplierCalculator::standard(
            dec!(5),
            default_leverage_tiers(),
            default_whale_tiers(),
            dec!(12),
        );
        assert_eq!(tight.multiplier(&event(dec!(20000), dec!(25), true)), dec!(12));
    }

    #[test]
    fn huge_factors_clamp_to_cap() {
        let calc = MultiplierCalculator::standard(
            Decimal::MAX,
            vec![BonusTier::new(dec!(1), Decimal::MAX)],
            Vec::new(),
            dec!(50),
        );
        assert_eq!(calc.multiplier(&event(dec!(100), dec!(2), true)), dec!(50));
    }

    #[test]
    fn monotonic_in_leverage_and_loss() {
        let calc = MultiplierCalculator::default();
        let leverages = [dec!(1), dec!(4.9), dec!(5), dec!(9.9), dec!(10), dec!(19), dec!(20), dec!(100)];
        let losses = [dec!(1), dec!(4999), dec!(5000), dec!(9999), dec!(10000), dec!(1000000)];

        for liquidation in [false, true] {
            for loss in losses {
                let mut previous = Decimal::ZERO;
                for leverage in leverages {
                    let m = calc.multiplier(&event(loss, leverage, liquidation));
                    assert!(m >= previous);
                    assert!(m <= dec!(50));
                    previous = m;
                }
            }
            for leverage in leverages {
                let mut previous = Decimal::ZERO;
                for loss in losses {
                    let m = calc.multiplier(&event(loss, leverage, liquidation));
                    assert!(m >= previous);
                    previous = m;
                }
            }
        }
    }

    #[test]
    fn tiers_are_sorted_on_construction() {
        let rule = LeverageBonus::new(vec![
            BonusTier::new(dec!(5), dec!(1.5)),
            BonusTier::new(dec!(20), dec!(3)),
        ]);
        assert_eq!(rule.factor(&event(dec!(1), dec!(25), false)), dec!(3));
    }

    #[test]
    fn custom_rule_runs_last() {
        struct Doubler;
        impl MultiplierRule for Doubler {
            fn name(&self) -> &'static str {
                "doubler"
            }
            fn factor(&self, _event: &LossEvent) -> Decimal {
                dec!(2)
            }
        }

        let mut calc = MultiplierCalculator::default();
        calc.push(Box::new(Doubler));
        assert_eq!(calc.rule_names(), vec!["liquidation", "leverage", "whale", "doubler"]);
        assert_eq!(calc.multiplier(&event(dec!(100), dec!(1), false)), dec!(2));
    }
}
