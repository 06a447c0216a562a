//! JSON-lines report sink.
//!
//! Each record is one line: `{"type": "...", "payload": {...}}`, the same
//! envelope the CLI uses for `--json` output.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use parking_lot::Mutex;
use serde::Serialize;
use serde_json::json;
use tracing::warn;

use crate::domain::report::{CycleReport, IngestionSummary};
use crate::error::Result;
use crate::port::ReportSink;

/// Writes reports as JSON lines to any writer.
pub struct JsonLinesSink<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Consume the sink and return the writer.
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }

    fn write_record<T: Serialize>(&self, kind: &str, payload: &T) -> Result<()> {
        let line = json!({
            "type": kind,
            "payload": payload,
        });
        let mut writer = self.writer.lock();
        serde_json::to_writer(&mut *writer, &line)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }
}

impl JsonLinesSink<BufWriter<File>> {
    /// Create (or truncate) `path` and write reports to it.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(BufWriter::new(File::create(path)?)))
    }
}

impl<W: Write + Send> ReportSink for JsonLinesSink<W> {
    fn record_ingestion(&self, summary: &IngestionSummary) {
        if let Err(e) = self.write_record("ingestion", summary) {
            warn!(error = %e, "Failed to write ingestion report");
        }
    }

    fn record_cycle(&self, report: &CycleReport) {
        if let Err(e) = self.write_record("cycle", report) {
            warn!(error = %e, "Failed to write cycle report");
        }
    }
}
