//! Application services (use cases).
//!
//! These services hold the engine's state and rules. [`engine::FryEngine`]
//! wires them together; each can also be used on its own.

pub mod aggregator;
pub mod anonymizer;
pub mod classifier;
pub mod engine;
pub mod matcher;
pub mod multiplier;
pub mod scoring;
pub mod tranche;
