//! Deterministic trader pseudonymization.
//!
//! A pseudonym is `anon_` followed by the first 16 hex characters of
//! `HMAC-SHA256(salt, trader_id || 0x00 || sequence)`, where `sequence` is
//! the order in which the trader was first seen under the current salt.
//!
//! Within one salt lifetime the same trader always maps to the same
//! pseudonym. Rotating the salt clears the mapping table and restarts the
//! sequence, so pseudonyms from different salt lifetimes cannot be
//! correlated without both salts and the first-seen order.

use std::collections::HashMap;

use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::info;

use crate::domain::error::DomainError;
use crate::domain::id::Pseudonym;
use crate::error::ConfigError;

type HmacSha256 = Hmac<Sha256>;

const PSEUDONYM_PREFIX: &str = "anon_";
const DIGEST_BYTES: usize = 8;

/// Maps raw trader identifiers to salted pseudonyms.
pub struct Anonymizer {
    keyed: HmacSha256,
    table: HashMap<String, Pseudonym>,
    sequence: u64,
}

impl Anonymizer {
    /// Create an anonymizer keyed with `salt`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] if the salt is empty.
    pub fn new(salt: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            keyed: keyed_mac(salt)?,
            table: HashMap::new(),
            sequence: 0,
        })
    }

    /// Return the pseudonym for `trader_id`, assigning one on first sight.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::EmptyTraderId`] if the identifier is blank.
    pub fn anonymize(&mut self, trader_id: &str) -> Result<Pseudonym, DomainError> {
        if trader_id.trim().is_empty() {
            return Err(DomainError::EmptyTraderId);
        }
        if let Some(existing) = self.table.get(trader_id) {
            return Ok(existing.clone());
        }

        self.sequence += 1;
        let pseudonym = self.derive(trader_id, self.sequence);
        self.table.insert(trader_id.to_string(), pseudonym.clone());
        Ok(pseudonym)
    }

    /// Replace the salt, discarding every existing mapping.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] if the new salt is empty; the
    /// previous salt stays active in that case.
    pub fn rotate_salt(&mut self, salt: &str) -> Result<(), ConfigError> {
        self.keyed = keyed_mac(salt)?;
        let dropped = self.table.len();
        self.table.clear();
        self.sequence = 0;
        info!(dropped_mappings = dropped, "Anonymizer salt rotated");
        Ok(())
    }

    /// Number of distinct traders seen under the current salt.
    #[must_use]
    pub fn known_traders(&self) -> usize {
        self.table.len()
    }

    fn derive(&self, trader_id: &str, sequence: u64) -> Pseudonym {
        let mut mac = self.keyed.clone();
        mac.update(trader_id.as_bytes());
        mac.update(&[0]);
        mac.update(&sequence.to_be_bytes());
        let digest = mac.finalize().into_bytes();
        Pseudonym::new(format!(
            "{PSEUDONYM_PREFIX}{}",
            hex::encode(&digest[..DIGEST_BYTES])
        ))
    }
}

fn keyed_mac(salt: &str) -> Result<HmacSha256, ConfigError> {
    if salt.is_empty() {
        return Err(ConfigError::MissingField {
            field: "anonymizer.salt",
        });
    }
    HmacSha256::new_from_slice(salt.as_bytes()).map_err(|e| ConfigError::InvalidValue {
        field: "anonymizer.salt",
        reason: e.to_string(),
    })
}
