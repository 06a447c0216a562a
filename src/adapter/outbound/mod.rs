//! Outbound adapters (driven side).

pub mod jsonl;

pub use jsonl::JsonLinesSink;
