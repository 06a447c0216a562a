//! Loss feed decoding.
//!
//! A feed is either a JSON array of records or JSON lines (one record per
//! line, blank lines ignored). Entries that are not JSON objects of the right
//! shape stay in the batch as [`DomainError::Undecodable`], in feed order, so
//! the aggregator counts them as rejections; field-level validation happens
//! there too.

use std::path::Path;

use crate::domain::error::DomainError;
use crate::domain::event::LossRecord;
use crate::error::Result;

/// Decoded feed content in feed order.
#[derive(Debug, Clone, Default)]
pub struct FeedBatch {
    pub entries: Vec<std::result::Result<LossRecord, DomainError>>,
}

impl FeedBatch {
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries that decoded into records.
    pub fn records(&self) -> impl Iterator<Item = &LossRecord> {
        self.entries.iter().filter_map(|entry| entry.as_ref().ok())
    }

    /// Number of entries that could not be decoded.
    #[must_use]
    pub fn undecodable(&self) -> usize {
        self.entries.iter().filter(|entry| entry.is_err()).count()
    }
}

/// Decode a single JSON-lines entry found at `position`.
///
/// # Errors
///
/// Returns [`DomainError::Undecodable`] if the line is not a JSON object of
/// the record shape.
pub fn parse_line(line: &str, position: usize) -> std::result::Result<LossRecord, DomainError> {
    serde_json::from_str(line).map_err(|e| undecodable(position, &e))
}

fn undecodable(position: usize, err: &serde_json::Error) -> DomainError {
    DomainError::Undecodable {
        position,
        reason: err.to_string(),
    }
}

/// Decode a whole feed document.
///
/// # Errors
///
/// Returns an error only if an array document is not valid JSON. Malformed
/// entries inside an otherwise readable feed are kept in the batch instead.
pub fn parse_feed(content: &str) -> Result<FeedBatch> {
    if content.trim_start().starts_with('[') {
        let values: Vec<serde_json::Value> = serde_json::from_str(content)?;
        let entries = values
            .into_iter()
            .enumerate()
            .map(|(position, value)| {
                serde_json::from_value(value).map_err(|e| undecodable(position, &e))
            })
            .collect();
        return Ok(FeedBatch { entries });
    }

    let entries = content
        .lines()
        .enumerate()
        .map(|(index, line)| (index + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty())
        .map(|(line_no, line)| parse_line(line, line_no))
        .collect();
    Ok(FeedBatch { entries })
}

/// Read and decode a feed file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is an unreadable array.
pub fn read_feed(path: impl AsRef<Path>) -> Result<FeedBatch> {
    let content = std::fs::read_to_string(path)?;
    parse_feed(&content)
}
