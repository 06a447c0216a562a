//! In-memory report sink.

use parking_lot::Mutex;

use crate::domain::report::{CycleReport, IngestionSummary};
use crate::port::ReportSink;

/// Keeps every report it receives, for later assertions.
#[derive(Debug, Default)]
pub struct RecordingSink {
    ingestions: Mutex<Vec<IngestionSummary>>,
    cycles: Mutex<Vec<CycleReport>>,
}

impl RecordingSink {
    pub fn ingestions(&self) -> Vec<IngestionSummary> {
        self.ingestions.lock().clone()
    }

    pub fn cycles(&self) -> Vec<CycleReport> {
        self.cycles.lock().clone()
    }
}

impl ReportSink for RecordingSink {
    fn record_ingestion(&self, summary: &IngestionSummary) {
        self.ingestions.lock().push(summary.clone());
    }

    fn record_cycle(&self, report: &CycleReport) {
        self.cycles.lock().push(report.clone());
    }
}
