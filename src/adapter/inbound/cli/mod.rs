//! CLI module graph.

pub mod buyers;
pub mod command;
pub mod config;
pub mod diagnostic;
pub mod dispatch;
pub mod output;
pub mod report;
pub mod run;
pub mod stream;
