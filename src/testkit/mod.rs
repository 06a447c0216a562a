//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`domain`] - Builders for loss records, events and buyers.
//! - [`config`] - Canonical test configuration with a fixed salt.
//! - [`report`] - A [`ReportSink`](crate::port::ReportSink) that keeps everything in memory.

pub mod config;
pub mod domain;
pub mod report;
