use std::io::Write;

use chrono::{DateTime, Utc};
use serde_json::json;
use tempfile::NamedTempFile;

/// One JSON-lines feed entry.
pub fn line(trader: &str, loss: u64, leverage: u64, liquidation: bool, ts: DateTime<Utc>) -> String {
    json!({
        "trader_id": trader,
        "loss_amount": loss,
        "asset": "BTC",
        "leverage": leverage,
        "position_size": 1000,
        "liquidation": liquidation,
        "timestamp": ts.to_rfc3339(),
    })
    .to_string()
}

/// A low-leverage loss, a whale loss and a liquidation, all at `ts`.
///
/// Mints 1000 senior, 40000 junior and 202500 equity tokens under the
/// default configuration.
pub fn mixed_lines(ts: DateTime<Utc>) -> Vec<String> {
    vec![
        line("alice", 1_000, 1, false, ts),
        line("bob", 20_000, 1, false, ts),
        line("carol", 9_000, 25, true, ts),
    ]
}

pub fn write_temp(contents: &str, suffix: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile()
        .expect("create temp file");
    file.write_all(contents.as_bytes()).expect("write temp file");
    file.flush().expect("flush temp file");
    file
}
