//! PIN hashing and verification.
//!
//! PINs are low-entropy (six digits), so storage uses argon2id — a slow,
//! salted, memory-hard KDF — rather than a bare digest. The encoded form is
//! `salt_hex$digest_hex`; the clear PIN never touches a voucher row.
//!
//! Verification re-derives the digest and compares with
//! [`subtle::ConstantTimeEq`], so a mismatch costs the same as a match and
//! never short-circuits on byte position.

use argon2::Argon2;
use rand::{RngCore, rngs::OsRng};
use subtle::ConstantTimeEq;

use admitgate_types::{
    GateError, PinHash, Result,
    constants::{PIN_DIGEST_LEN, PIN_SALT_LEN},
};

/// Hashes and verifies voucher PINs.
#[derive(Default)]
pub struct PinHasher {
    argon2: Argon2<'static>,
}

impl PinHasher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Hash a clear PIN with a fresh random salt.
    pub fn hash(&self, pin: &str) -> Result<PinHash> {
        let mut salt = [0u8; PIN_SALT_LEN];
        OsRng.fill_bytes(&mut salt);

        let mut digest = [0u8; PIN_DIGEST_LEN];
        self.argon2
            .hash_password_into(pin.as_bytes(), &salt, &mut digest)
            .map_err(|e| GateError::PinHash(e.to_string()))?;

        Ok(PinHash(format!(
            "{}${}",
            hex::encode(salt),
            hex::encode(digest)
        )))
    }

    /// Verify a clear PIN against a stored digest in constant time.
    ///
    /// A malformed stored digest is an error, not a mismatch — it means the
    /// row is corrupt, and that must not masquerade as a wrong PIN.
    pub fn verify(&self, pin: &str, stored: &PinHash) -> Result<bool> {
        let (salt_hex, digest_hex) = stored
            .as_str()
            .split_once('$')
            .ok_or_else(|| GateError::PinHash("malformed digest encoding".into()))?;

        let salt = hex::decode(salt_hex).map_err(|e| GateError::PinHash(e.to_string()))?;
        let expected = hex::decode(digest_hex).map_err(|e| GateError::PinHash(e.to_string()))?;
        if expected.len() != PIN_DIGEST_LEN {
            return Err(GateError::PinHash(format!(
                "digest length {} != {PIN_DIGEST_LEN}",
                expected.len()
            )));
        }

        let mut candidate = [0u8; PIN_DIGEST_LEN];
        self.argon2
            .hash_password_into(pin.as_bytes(), &salt, &mut candidate)
            .map_err(|e| GateError::PinHash(e.to_string()))?;

        Ok(candidate.as_ref().ct_eq(expected.as_slice()).into())
    }

    /// A digest that matches no real PIN, for timing parity on the
    /// unknown-code path: the engine burns one verification against this so
    /// "code not found" costs the same as "code found, PIN wrong".
    pub fn decoy(&self) -> Result<PinHash> {
        self.hash("decoy-never-a-real-pin")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify_roundtrip() {
        let hasher = PinHasher::new();
        let stored = hasher.hash("483921").unwrap();
        assert!(hasher.verify("483921", &stored).unwrap());
    }

    #[test]
    fn wrong_pin_rejected() {
        let hasher = PinHasher::new();
        let stored = hasher.hash("483921").unwrap();
        assert!(!hasher.verify("483922", &stored).unwrap());
        assert!(!hasher.verify("", &stored).unwrap());
    }

    #[test]
    fn same_pin_distinct_digests() {
        // Fresh salt per hash: identical PINs must not be linkable.
        let hasher = PinHasher::new();
        let a = hasher.hash("111111").unwrap();
        let b = hasher.hash("111111").unwrap();
        assert_ne!(a, b);
        assert!(hasher.verify("111111", &a).unwrap());
        assert!(hasher.verify("111111", &b).unwrap());
    }

    #[test]
    fn malformed_digest_is_error_not_mismatch() {
        let hasher = PinHasher::new();
        let err = hasher
            .verify("123456", &PinHash("no-dollar-separator".into()))
            .unwrap_err();
        assert!(matches!(err, GateError::PinHash(_)));

        let err = hasher
            .verify("123456", &PinHash("zz$zz".into()))
            .unwrap_err();
        assert!(matches!(err, GateError::PinHash(_)));
    }

    #[test]
    fn truncated_digest_is_error() {
        let hasher = PinHasher::new();
        let stored = PinHash(format!("{}${}", hex::encode([0u8; 16]), hex::encode([0u8; 8])));
        assert!(hasher.verify("123456", &stored).is_err());
    }

    #[test]
    fn decoy_matches_no_numeric_pin() {
        let hasher = PinHasher::new();
        let decoy = hasher.decoy().unwrap();
        assert!(!hasher.verify("000000", &decoy).unwrap());
        assert!(!hasher.verify("123456", &decoy).unwrap());
    }
}
