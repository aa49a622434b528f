//! Configuration for the AdmitGate engine and minting.
//!
//! These values are deployment-wide, threaded in explicitly at construction.
//! Nothing reads ambient global state; in particular the lease TTL is per
//! deployment, never per voucher.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::constants;

/// Lease engine tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Maximum reservation duration in seconds before a lease lapses.
    pub lease_ttl_secs: i64,
    /// Re-read-and-retry rounds for a lost optimistic write before the
    /// failure surfaces as transient contention.
    pub transition_retries: u32,
}

impl EngineConfig {
    /// The lease TTL as a duration.
    #[must_use]
    pub fn lease_ttl(&self) -> Duration {
        Duration::seconds(self.lease_ttl_secs)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lease_ttl_secs: constants::DEFAULT_LEASE_TTL_SECS,
            transition_retries: constants::DEFAULT_TRANSITION_RETRIES,
        }
    }
}

/// Voucher minting tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintConfig {
    /// Length of the public voucher code in decimal digits.
    pub code_len: usize,
    /// Length of the secret PIN in decimal digits.
    pub pin_len: usize,
    /// Fresh-code retries when a random code collides with an existing row.
    pub code_collision_retries: u32,
}

impl Default for MintConfig {
    fn default() -> Self {
        Self {
            code_len: constants::DEFAULT_CODE_LEN,
            pin_len: constants::DEFAULT_PIN_LEN,
            code_collision_retries: constants::DEFAULT_CODE_COLLISION_RETRIES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_defaults() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.lease_ttl(), Duration::minutes(15));
        assert_eq!(cfg.transition_retries, 3);
    }

    #[test]
    fn mint_defaults() {
        let cfg = MintConfig::default();
        assert_eq!(cfg.code_len, 10);
        assert_eq!(cfg.pin_len, 6);
        assert!(cfg.code_collision_retries > 0);
    }

    #[test]
    fn engine_config_serde_roundtrip() {
        let cfg = EngineConfig {
            lease_ttl_secs: 60,
            transition_retries: 5,
        };
        let json = serde_json::to_string(&cfg).unwrap();
        let back: EngineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(cfg, back);
    }
}
