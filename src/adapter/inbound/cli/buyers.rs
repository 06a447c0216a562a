//! Handler for `fry buyers`.

use std::path::Path;

use rust_decimal::Decimal;
use tabled::Tabled;

use super::dispatch::read_config;
use super::output;
use crate::error::Result;

#[derive(Tabled)]
struct BuyerRow {
    #[tabled(rename = "#")]
    rank: usize,
    #[tabled(rename = "Id")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Appetite")]
    appetite: String,
    #[tabled(rename = "Preferred yield")]
    preferred_yield: String,
    #[tabled(rename = "Min investment")]
    min_investment: String,
}

/// List the buyer directory in tie-break order.
pub fn execute(path: &Path) -> Result<()> {
    let config = read_config(path)?;
    let directory = config.matching.directory();

    if output::is_json() {
        output::record("buyers", &directory.buyers());
        return Ok(());
    }

    output::section("Buyers");
    if directory.is_empty() {
        output::note("(none configured)");
        return Ok(());
    }
    output::table(directory.buyers().iter().enumerate().map(|(i, buyer)| BuyerRow {
        rank: i + 1,
        id: buyer.id.to_string(),
        name: buyer.name.clone(),
        appetite: buyer.risk_appetite.to_string(),
        preferred_yield: format!("{:.2}%", buyer.preferred_yield * Decimal::ONE_HUNDRED),
        min_investment: buyer.min_investment.to_string(),
    }));
    output::field("Threshold", config.matching.threshold);
    Ok(())
}
