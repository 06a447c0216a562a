//! Inbound adapters (driving side): the CLI and the loss feed decoder.

pub mod cli;
pub mod feed;
