//! FRY engine: loss aggregation, minting, risk scoring and tranche matching.
//!
//! Trading losses flow through four stages:
//!
//! - **Aggregation** - each loss is validated, its trader pseudonymized, and
//!   the event classified into risk pools (liquidation, whale, medium and
//!   low leverage)
//! - **Minting** - an ordered multiplier pipeline turns the loss into FRY
//!   tokens
//! - **Scoring** - a smoothed 0-100 FRY Score is computed over a trailing
//!   window of pool activity
//! - **Tranching and matching** - pool value is cut into AAA..CCC tranches
//!   and offered to institutional buyers by fit score
//!
//! # Modules
//!
//! - [`domain`] - Events, pools, scores, tranches, buyers and reports
//! - [`application`] - Aggregator, score engine, tranche builder, matcher and the [`application::engine::FryEngine`] facade
//! - [`port`] - Reporting port
//! - [`adapter`] - CLI, feed decoding and JSON-lines reports
//! - [`infrastructure`] - Configuration and logging
//! - [`error`] - Error types for the crate
//!
//! # Example
//!
//! ```no_run
//! use chrono::Utc;
//! use fry_engine::infrastructure::config::settings::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let engine = Config::load("config.toml")?.build_engine()?;
//!     let report = engine.cycle(Utc::now());
//!     println!("FRY Score {:.2}", report.score.score.score);
//!     Ok(())
//! }
//! ```

pub mod adapter;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
