//! Handler for `fry stream`: ingest JSON lines from stdin and score on a timer.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tracing::{info, warn};

use super::dispatch::{load_config, sink_for};
use super::output;
use crate::adapter::inbound::cli::command::StreamArgs;
use crate::adapter::inbound::feed;
use crate::application::engine::FryEngine;
use crate::domain::error::DomainError;
use crate::domain::event::LossRecord;
use crate::error::Result;
use crate::port::ReportSink;

/// Partial batches are ingested at least this often.
const FLUSH_INTERVAL: Duration = Duration::from_secs(1);

type Entry = std::result::Result<LossRecord, DomainError>;

/// Execute `fry stream`. Stops on end of input, a read error or Ctrl-C.
///
/// Every stop runs the same shutdown: pending lines are ingested, the
/// scoring task is stopped and one final cycle is reported. A read error is
/// returned only after that.
pub async fn execute(args: &StreamArgs, verbose: u8) -> Result<()> {
    let config = load_config(&args.config, verbose)?;
    let engine = Arc::new(config.build_engine()?);
    let sink: Arc<dyn ReportSink> = Arc::from(sink_for(args.report.as_deref())?);
    let period = args
        .interval_secs
        .filter(|secs| *secs > 0)
        .map_or_else(|| config.scoring.interval(), Duration::from_secs);
    let batch_size = args.batch_size.max(1);

    output::header(env!("CARGO_PKG_VERSION"));
    output::note(&format!(
        "reading loss records from stdin, scoring every {}s",
        period.as_secs()
    ));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scoring = Arc::clone(&engine).spawn_scoring(period, Arc::clone(&sink), shutdown_rx);

    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Could not listen for Ctrl-C");
        }
        info!("Shutdown signal received");
    };
    let outcome = consume(
        BufReader::new(tokio::io::stdin()),
        &engine,
        sink.as_ref(),
        batch_size,
        ctrl_c,
    )
    .await;

    let _ = shutdown_tx.send(true);
    if let Err(e) = scoring.await {
        warn!(error = %e, "Scoring task ended abnormally");
    }

    // One last cycle so the final state is always reported.
    sink.record_cycle(&engine.cycle(Utc::now()));
    outcome.map_err(Into::into)
}

/// Read JSON lines from `reader` into the engine in batches of `batch_size`.
///
/// Undecodable lines are ingested as rejections at their position. Pending
/// records are flushed before returning, whatever ended the loop.
async fn consume<R, S>(
    reader: R,
    engine: &FryEngine,
    sink: &dyn ReportSink,
    batch_size: usize,
    stop: S,
) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    S: Future<Output = ()>,
{
    let mut lines = reader.lines();
    let mut pending: Vec<Entry> = Vec::with_capacity(batch_size);
    let mut line_no = 0usize;
    let mut flush =
        tokio::time::interval_at(tokio::time::Instant::now() + FLUSH_INTERVAL, FLUSH_INTERVAL);
    tokio::pin!(stop);

    let ingest = |pending: &mut Vec<Entry>| {
        if pending.is_empty() {
            return;
        }
        let summary = engine.ingest_entries(std::mem::take(pending));
        sink.record_ingestion(&summary);
    };

    let outcome = loop {
        tokio::select! {
            () = &mut stop => break Ok(()),
            _ = flush.tick() => ingest(&mut pending),
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => {
                        info!(lines = line_no, "Input closed");
                        break Ok(());
                    }
                    Err(e) => {
                        warn!(line = line_no + 1, error = %e, "Failed to read input");
                        break Err(e);
                    }
                };
                line_no += 1;
                if line.trim().is_empty() {
                    continue;
                }
                let entry = feed::parse_line(&line, line_no);
                if let Err(e) = &entry {
                    warn!(line = line_no, error = %e, "Malformed feed line");
                }
                pending.push(entry);
                if pending.len() >= batch_size {
                    ingest(&mut pending);
                }
            }
        }
    };

    ingest(&mut pending);
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::config;
    use crate::testkit::report::RecordingSink;

    const RECORD: &str = r#"{"trader_id":"a","loss":100,"asset":"BTC","leverage":2,"position_size":500,"liquidation":false,"timestamp":"2024-05-01T12:00:00Z"}"#;

    fn engine() -> FryEngine {
        config::config().build_engine().unwrap()
    }

    fn processed(sink: &RecordingSink) -> (usize, usize) {
        sink.ingestions().iter().fold((0, 0), |(ok, bad), s| {
            (ok + s.events_processed, bad + s.events_rejected)
        })
    }

    #[tokio::test]
    async fn malformed_lines_reach_the_summary() {
        let engine = engine();
        let sink = RecordingSink::default();
        let input = format!("{RECORD}\n{{\"trader_id\":\"b\",\"loss\":\"abc\"}}\n\n{RECORD}\n");

        consume(input.as_bytes(), &engine, &sink, 10, std::future::pending())
            .await
            .unwrap();

        assert_eq!(processed(&sink), (2, 1));
        let rejection = &sink.ingestions()[0].rejections[0];
        assert_eq!(rejection.index, 1);
        assert!(rejection.reason.contains("at 2"));
    }

    #[tokio::test]
    async fn read_error_still_flushes_pending_records() {
        let engine = engine();
        let sink = RecordingSink::default();
        let mut input = format!("{RECORD}\n").into_bytes();
        input.extend_from_slice(b"\xff\xfe\n");

        let result = consume(input.as_slice(), &engine, &sink, 10, std::future::pending()).await;

        assert_eq!(
            result.map_err(|e| e.kind()),
            Err(std::io::ErrorKind::InvalidData)
        );
        assert_eq!(processed(&sink), (1, 0));
        assert_eq!(engine.snapshot().unique_events().len(), 1);
    }

    #[tokio::test]
    async fn stop_signal_ends_the_loop() {
        let engine = engine();
        let sink = RecordingSink::default();
        let (_tx, rx) = tokio::io::duplex(64);

        consume(BufReader::new(rx), &engine, &sink, 10, async {})
            .await
            .unwrap();

        assert!(sink.ingestions().is_empty());
    }
}
