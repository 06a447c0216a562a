//! Adapters connecting the engine to the outside world.
//!
//! - [`inbound`] - CLI and loss feed decoding
//! - [`outbound`] - Report sinks

pub mod inbound;
pub mod outbound;
