//! Report publishing port.

use crate::domain::report::{CycleReport, IngestionSummary};

/// Destination for engine output.
///
/// Implementations must not block for long: the scoring task calls
/// [`ReportSink::record_cycle`] inline on every tick. Failures are the
/// sink's to log; they never stop the engine.
pub trait ReportSink: Send + Sync {
    /// Record the outcome of one ingestion batch.
    fn record_ingestion(&self, summary: &IngestionSummary);

    /// Record the outcome of one scoring cycle.
    fn record_cycle(&self, report: &CycleReport);
}
