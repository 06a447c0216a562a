//! Anonymizer configuration.

use serde::{Deserialize, Serialize};

use crate::application::anonymizer::Anonymizer;
use crate::error::ConfigError;

/// Environment variable that overrides `anonymizer.salt`.
pub const SALT_ENV: &str = "FRY_ANONYMIZER_SALT";

/// Anonymizer configuration.
///
/// The salt is a secret: it is never serialized back out.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnonymizerConfig {
    #[serde(default, skip_serializing)]
    pub salt: Option<String>,
}

impl AnonymizerConfig {
    #[must_use]
    pub fn has_salt(&self) -> bool {
        self.salt.as_deref().is_some_and(|s| !s.is_empty())
    }

    /// Build an anonymizer keyed with the configured salt.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] if no salt is configured.
    pub fn anonymizer(&self) -> Result<Anonymizer, ConfigError> {
        match self.salt.as_deref() {
            Some(salt) if !salt.is_empty() => Anonymizer::new(salt),
            _ => Err(ConfigError::MissingField {
                field: "anonymizer.salt",
            }),
        }
    }
}
