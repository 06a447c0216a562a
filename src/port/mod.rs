//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! Ports are the seams where the engine hands results to the outside world.
//! Adapters implement them; the application only sees the traits.
//!
//! # Available Ports
//!
//! - [`ReportSink`] - Receives ingestion summaries and cycle reports

pub mod outbound;

pub use outbound::report::ReportSink;
