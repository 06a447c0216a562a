//! Human and JSON rendering of ingestion summaries and cycle reports.

use rust_decimal::Decimal;
use tabled::Tabled;

use super::output;
use crate::domain::report::{CycleReport, IngestionSummary};
use crate::port::ReportSink;

/// Maximum rejections listed individually in human output.
const MAX_LISTED_REJECTIONS: usize = 10;

#[derive(Tabled)]
struct PoolRow {
    #[tabled(rename = "Pool")]
    pool: String,
    #[tabled(rename = "Events")]
    events: usize,
    #[tabled(rename = "Loss")]
    loss: String,
    #[tabled(rename = "Minted")]
    minted: String,
}

#[derive(Tabled)]
struct TrancheRow {
    #[tabled(rename = "Rating")]
    rating: String,
    #[tabled(rename = "Segment")]
    segment: String,
    #[tabled(rename = "Notional")]
    notional: String,
    #[tabled(rename = "Coupon")]
    coupon: String,
    #[tabled(rename = "Min purchase")]
    min_purchase: String,
    #[tabled(rename = "Status")]
    status: String,
}

#[derive(Tabled)]
struct MatchRow {
    #[tabled(rename = "Rating")]
    rating: String,
    #[tabled(rename = "Buyer")]
    buyer: String,
    #[tabled(rename = "Fit")]
    fit: u32,
    #[tabled(rename = "Spread")]
    spread: String,
}

fn percent(fraction: Decimal) -> String {
    format!("{:.2}%", fraction * Decimal::ONE_HUNDRED)
}

/// Render one ingestion summary.
pub fn ingestion(summary: &IngestionSummary) {
    if output::is_json() {
        output::record("ingestion", summary);
        return;
    }

    output::section("Ingestion");
    output::field("Processed", summary.events_processed);
    output::field("Rejected", summary.events_rejected);
    output::field("Total loss", summary.total_loss);
    output::field("Total minted", summary.total_minted);
    for rejection in summary.rejections.iter().take(MAX_LISTED_REJECTIONS) {
        output::note(&format!("#{}: {}", rejection.index, rejection.reason));
    }
    if summary.rejections.len() > MAX_LISTED_REJECTIONS {
        output::note(&format!(
            "... and {} more",
            summary.rejections.len() - MAX_LISTED_REJECTIONS
        ));
    }
}

/// Render one cycle report.
pub fn cycle(report: &CycleReport) {
    if output::is_json() {
        output::record("cycle", report);
        return;
    }

    let score = &report.score;
    output::section("FRY Score");
    output::field("Score", output::score(score.score.score));
    output::field("Raw", format!("{:.2}", score.score.raw));
    output::field("Trend", output::highlight(score.trend));
    output::field("Sample size", score.sample_size);
    output::field("As of", report.as_of.to_rfc3339());
    output::field("Snapshot", output::muted(format!("{} (v{})", report.snapshot_id, report.snapshot_version)));
    if score.sample_size == 0 {
        output::hint("no losses inside the scoring window");
    }

    output::section("Pools");
    output::table(report.pools.iter().map(|totals| PoolRow {
        pool: totals.pool.to_string(),
        events: totals.events,
        loss: totals.total_loss.to_string(),
        minted: totals.total_minted.to_string(),
    }));

    output::section("Tranches");
    if report.tranches.is_empty() {
        output::note("No pool value to tranche yet");
    } else {
        output::table(report.tranches.iter().map(|tranche| TrancheRow {
            rating: tranche.rating().to_string(),
            segment: tranche.segment().to_string(),
            notional: tranche.notional().to_string(),
            coupon: percent(tranche.coupon()),
            min_purchase: tranche.min_purchase().to_string(),
            status: tranche.status().to_string(),
        }));
        output::field("Total notional", report.total_notional());
        if report.knocked_out > 0 {
            output::warning(&format!("{} tranche(s) knocked out", report.knocked_out));
        }
    }

    output::section("Matches");
    if report.matches.is_empty() {
        output::note("No tranche cleared the match threshold");
    } else {
        output::table(report.matches.iter().map(|m| MatchRow {
            rating: m.rating.to_string(),
            buyer: m.buyer_name.clone(),
            fit: m.fit_score,
            spread: percent(m.yield_spread),
        }));
    }
}

/// Report sink that renders to the terminal.
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl ReportSink for ConsoleSink {
    fn record_ingestion(&self, summary: &IngestionSummary) {
        ingestion(summary);
    }

    fn record_cycle(&self, report: &CycleReport) {
        cycle(report);
    }
}

/// Forwards every report to each inner sink in order.
pub struct FanoutSink {
    sinks: Vec<Box<dyn ReportSink>>,
}

impl FanoutSink {
    pub fn new(sinks: Vec<Box<dyn ReportSink>>) -> Self {
        Self { sinks }
    }
}

impl ReportSink for FanoutSink {
    fn record_ingestion(&self, summary: &IngestionSummary) {
        for sink in &self.sinks {
            sink.record_ingestion(summary);
        }
    }

    fn record_cycle(&self, report: &CycleReport) {
        for sink in &self.sinks {
            sink.record_cycle(report);
        }
    }
}
