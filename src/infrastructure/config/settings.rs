//! Application configuration loading and validation.
//!
//! Provides the main [`Config`] struct that aggregates all engine settings.
//! Configuration is loaded from a TOML file; the anonymizer salt can be
//! supplied through the `FRY_ANONYMIZER_SALT` environment variable instead
//! of the file.
//!
//! # Example
//!
//! ```no_run
//! use fry_engine::infrastructure::config::settings::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("config.toml")?;
//!     config.init_logging();
//!     let engine = config.build_engine()?;
//!     Ok(())
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::anonymizer::{AnonymizerConfig, SALT_ENV};
use super::logging::LoggingConfig;
use super::matching::MatchingConfig;
use super::minting::MintingConfig;
use super::scoring::ScoringConfig;
use super::tranche::TranchesConfig;
use crate::application::aggregator::PoolAggregator;
use crate::application::engine::FryEngine;
use crate::application::scoring::ScoreEngine;
use crate::error::{ConfigError, Result};

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub anonymizer: AnonymizerConfig,
    /// Pool classification and multiplier pipeline.
    #[serde(default)]
    pub minting: MintingConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub tranches: TranchesConfig,
    /// Match threshold and the institutional buyer directory.
    #[serde(default)]
    pub matching: MatchingConfig,
}

impl Config {
    /// Parse configuration from TOML content.
    ///
    /// A non-empty `FRY_ANONYMIZER_SALT` replaces any salt in the file.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The TOML content is malformed
    /// - No salt is configured
    /// - Validation fails
    pub fn parse_toml(content: &str) -> Result<Self> {
        let salt = std::env::var(SALT_ENV).ok().filter(|s| !s.is_empty());
        Self::parse_toml_with_salt(content, salt)
    }

    /// Parse configuration from TOML content with an explicit salt override.
    ///
    /// # Errors
    ///
    /// Same as [`Config::parse_toml`].
    pub fn parse_toml_with_salt(content: &str, salt: Option<String>) -> Result<Self> {
        let mut config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        if salt.is_some() {
            config.anonymizer.salt = salt;
        }
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read
    /// - The TOML content is malformed
    /// - Validation fails
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse_toml(&content)
    }

    /// Validate every section.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<()> {
        if !self.anonymizer.has_salt() {
            return Err(ConfigError::MissingField {
                field: "anonymizer.salt",
            }
            .into());
        }
        self.minting.validate()?;
        self.scoring.validate()?;
        self.tranches.validate()?;
        self.matching.validate()?;
        Ok(())
    }

    /// Initialize logging based on configuration.
    pub fn init_logging(&self) {
        self.logging.init();
    }

    /// Assemble a [`FryEngine`] from this configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the salt is missing or the ladder is invalid.
    pub fn build_engine(&self) -> Result<FryEngine> {
        let aggregator = PoolAggregator::new(
            self.anonymizer.anonymizer()?,
            self.minting.classifier(),
            self.minting.calculator(),
        );
        Ok(FryEngine::new(
            aggregator,
            ScoreEngine::new(self.scoring.settings()),
            self.tranches.builder()?,
            self.matching.matcher(),
            self.matching.directory(),
        ))
    }
}
