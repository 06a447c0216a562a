//! Canonical test configurations.
//!
//! Single source of truth for config structs used across tests.

use crate::infrastructure::config::settings::Config;

/// Salt used by every test configuration.
pub const TEST_SALT: &str = "test-salt";

/// Default configuration with the test salt applied.
pub fn config() -> Config {
    let mut config = Config::default();
    config.anonymizer.salt = Some(TEST_SALT.to_string());
    config
}

/// Minimal TOML document that loads into [`config`].
pub fn minimal_toml() -> String {
    format!("[anonymizer]\nsalt = \"{TEST_SALT}\"\n")
}
