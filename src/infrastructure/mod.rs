//! Infrastructure layer.
//!
//! Provides technical concerns that support the application without
//! containing business logic: configuration loading, validation and logging.

pub mod config;
