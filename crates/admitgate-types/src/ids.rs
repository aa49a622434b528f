//! Globally unique identifiers used throughout AdmitGate.
//!
//! Entity IDs use UUIDv7 for time-ordered lexicographic sorting.
//! [`LeaseToken`] is the one exception: it is a bearer credential handed to
//! an untrusted caller, so it uses UUIDv4 — pure random bits, no embedded
//! timestamp to narrow a guessing attack.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// VoucherId
// ---------------------------------------------------------------------------

/// Globally unique voucher identifier. Uses UUIDv7 for time-ordered sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct VoucherId(pub Uuid);

impl VoucherId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    #[must_use]
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }
}

impl Default for VoucherId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for VoucherId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// VoucherCode
// ---------------------------------------------------------------------------

/// The public half of a voucher credential: a fixed-length numeric string.
///
/// Codes are minted from a cryptographically secure random source and are
/// globally unique within the store. The code alone grants nothing — it must
/// be paired with the secret PIN.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct VoucherCode(String);

impl VoucherCode {
    /// Wrap a raw code string. No format validation happens here — minting
    /// controls the alphabet and length, and lookups must accept arbitrary
    /// caller input so unknown codes still flow through the audit trail.
    #[must_use]
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VoucherCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// LeaseToken
// ---------------------------------------------------------------------------

/// Opaque proof that one caller holds the exclusive redemption right for a
/// Reserved voucher. UUIDv4: 122 random bits, unguessable, no timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LeaseToken(pub Uuid);

impl LeaseToken {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for LeaseToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LeaseToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "lease:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// AttemptId
// ---------------------------------------------------------------------------

/// Unique identifier for one verification attempt record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct AttemptId(pub Uuid);

impl AttemptId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for AttemptId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// AdmissionId
// ---------------------------------------------------------------------------

/// Reference to the admission application that consumed a voucher.
///
/// The admission record itself lives in the surrounding workflow; the engine
/// only stamps this reference onto the voucher at consumption time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct AdmissionId(pub Uuid);

impl AdmissionId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for AdmissionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AdmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// AcademicYearId / IssuerId
// ---------------------------------------------------------------------------

/// The academic year a voucher admits into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct AcademicYearId(pub u32);

impl fmt::Display for AcademicYearId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ay:{}", self.0)
    }
}

/// The administrative user that minted a voucher batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct IssuerId(pub u32);

impl fmt::Display for IssuerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "issuer:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
