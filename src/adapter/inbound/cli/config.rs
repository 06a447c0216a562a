//! Handler for the `config` command group.

use std::fs;
use std::path::Path;

use rust_decimal::Decimal;
use tabled::Tabled;

use super::dispatch::read_config;
use super::output;
use crate::application::multiplier::BonusTier;
use crate::error::{ConfigError, Result};
use crate::infrastructure::config::anonymizer::SALT_ENV;

/// Default config template with documentation.
const CONFIG_TEMPLATE: &str = include_str!("../../../../config.toml.example");

#[derive(Tabled)]
struct RungRow {
    #[tabled(rename = "Rating")]
    rating: String,
    #[tabled(rename = "Segment")]
    segment: String,
    #[tabled(rename = "Share")]
    share: String,
    #[tabled(rename = "Yield")]
    base_yield: String,
    #[tabled(rename = "Min purchase")]
    min_purchase: String,
    #[tabled(rename = "Knock-out")]
    knockout: String,
}

/// Execute `config init`.
pub fn execute_init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(ConfigError::InvalidValue {
            field: "config",
            reason: "file already exists (use --force to overwrite)".to_string(),
        }
        .into());
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    fs::write(path, CONFIG_TEMPLATE)?;
    output::success("Created configuration file");
    output::field("Path", path.display());
    output::section("Next Steps");
    output::note(&format!("1. Set anonymizer.salt in {} or export {SALT_ENV}", path.display()));
    output::note(&format!("2. Run: fry config validate {}", path.display()));
    output::note(&format!("3. Run: fry run -c {} -e losses.jsonl", path.display()));
    Ok(())
}

/// Execute `config validate`.
pub fn execute_validate(path: &Path) -> Result<()> {
    let config = read_config(path)?;
    output::success("Configuration is valid");
    output::field("Path", path.display());
    output::field("Ladder rungs", config.tranches.ladder.len());
    output::field("Buyers", config.matching.buyers.len());
    Ok(())
}

/// Execute `config show`.
pub fn execute_show(path: &Path) -> Result<()> {
    let config = read_config(path)?;

    if output::is_json() {
        output::record("config", &config);
        return Ok(());
    }

    output::section("Anonymizer");
    output::field("Salt", if std::env::var(SALT_ENV).is_ok_and(|s| !s.is_empty()) {
        format!("set (from {SALT_ENV})")
    } else {
        "set (from file)".to_string()
    });

    let minting = &config.minting;
    output::section("Minting");
    output::field("Whale at", minting.whale_threshold);
    output::field("Medium lev.", format!("{}x", minting.medium_leverage));
    output::field("Liq. bonus", format!("x{}", minting.liquidation_bonus));
    output::field("Lev. tiers", tiers(&minting.leverage_tiers));
    output::field("Whale tiers", tiers(&minting.whale_tiers));
    output::field("Cap", format!("x{}", minting.multiplier_cap));

    let scoring = &config.scoring;
    output::section("Scoring");
    output::field("Window", format!("{}s", scoring.window_secs));
    output::field("Interval", format!("{}s", scoring.interval_secs));
    output::field("Alpha", scoring.smoothing_alpha);
    output::field("Initial", scoring.initial_score);
    output::field("History cap", scoring.history_cap);
    output::field(
        "Trend",
        format!(
            "{} steps, ±{:.1}%",
            scoring.trend_lookback,
            scoring.trend_tolerance * 100.0
        ),
    );

    output::section("Tranches");
    output::field("Stress load", stress_label(config.tranches.stress_loading));
    output::table(config.tranches.ladder.iter().map(|rung| RungRow {
        rating: rung.rating.to_string(),
        segment: rung.segment.to_string(),
        share: rung.share.to_string(),
        base_yield: format!("{:.2}%", rung.base_yield * Decimal::ONE_HUNDRED),
        min_purchase: rung.min_purchase.to_string(),
        knockout: rung
            .knockout_score
            .map_or_else(|| "-".to_string(), |level| format!("{level:.0}")),
    }));

    output::section("Matching");
    output::field("Threshold", config.matching.threshold);
    output::field("Buyers", config.matching.buyers.len());
    output::hint("run `fry buyers` for the full directory");
    Ok(())
}

fn tiers(tiers: &[BonusTier]) -> String {
    tiers
        .iter()
        .map(|tier| format!(">={} x{}", tier.threshold, tier.factor))
        .collect::<Vec<_>>()
        .join(", ")
}

fn stress_label(fraction: f64) -> String {
    format!("+{:.0}% at score 100", fraction * 100.0)
}
