//! Handler for `fry run`: score a recorded loss feed once.

use chrono::Utc;
use tracing::info;

use super::dispatch::{load_config, sink_for};
use super::output;
use crate::adapter::inbound::cli::command::RunArgs;
use crate::adapter::inbound::feed;
use crate::error::Result;

/// Execute `fry run`.
///
/// Without `--as-of` the scoring window ends at the newest ingested event,
/// so historical feeds score the way they would have at the time.
pub fn execute(args: &RunArgs, verbose: u8) -> Result<()> {
    let config = load_config(&args.config, verbose)?;
    let engine = config.build_engine()?;
    let sink = sink_for(args.report.as_deref())?;

    output::header(env!("CARGO_PKG_VERSION"));
    output::field("Feed", args.events.display());

    let batch = feed::read_feed(&args.events)?;
    info!(
        entries = batch.len(),
        undecodable = batch.undecodable(),
        feed = %args.events.display(),
        "Feed loaded"
    );

    let summary = engine.ingest_entries(batch.entries);
    sink.record_ingestion(&summary);

    let as_of = args
        .as_of
        .or_else(|| {
            engine
                .snapshot()
                .unique_events()
                .iter()
                .map(|event| event.timestamp())
                .max()
        })
        .unwrap_or_else(Utc::now);

    let cycle = engine.cycle(as_of);
    sink.record_cycle(&cycle);

    if summary.events_processed == 0 {
        output::warning("no valid loss events in feed");
    }
    Ok(())
}
