//! Infrastructure configuration modules.

pub mod anonymizer;
pub mod logging;
pub mod matching;
pub mod minting;
pub mod scoring;
pub mod settings;
pub mod tranche;
