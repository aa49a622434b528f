//! Lease results returned by the engine to the redemption workflow.
//!
//! A lease is not stored as its own entity — it is the pairing of a token to
//! a Reserved voucher for `[lease_started_at, lease_started_at + TTL)`. What
//! crosses the API boundary is the [`LeaseResult`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AcademicYearId, LeaseToken, VoucherCode};

/// How a granted lease came to be held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GrantKind {
    /// First reservation of an Unused voucher.
    Fresh,
    /// Re-issue over an existing reservation (correct PIN re-submitted).
    /// The previous token is dead from this instant.
    Takeover,
    /// An already-held lease reported back by a read-only check.
    Existing,
}

impl std::fmt::Display for GrantKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fresh => write!(f, "FRESH"),
            Self::Takeover => write!(f, "TAKEOVER"),
            Self::Existing => write!(f, "EXISTING"),
        }
    }
}

/// Why a verification or check was denied.
///
/// These are ordinary results, never errors. The transport must render
/// `NotFound` and `InvalidPin` identically to callers — the engine already
/// folds revoked vouchers into `NotFound` so their existence never leaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DenialReason {
    /// No voucher with that code, or the voucher is administratively
    /// revoked, or no live lease holds that token.
    NotFound,
    /// The code exists but the PIN did not match.
    InvalidPin,
    /// Already consumed.
    Used,
    /// Validity window or lease TTL passed.
    Expired,
}

impl std::fmt::Display for DenialReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound => write!(f, "Not Found"),
            Self::InvalidPin => write!(f, "Invalid Pin"),
            Self::Used => write!(f, "Used"),
            Self::Expired => write!(f, "Expired"),
        }
    }
}

/// A live lease as reported to the holder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lease {
    /// The voucher code this lease covers.
    pub code: VoucherCode,
    /// Bearer proof of the reservation. Required for `check`, `release`,
    /// and `consume`.
    pub token: LeaseToken,
    /// When the lease lapses unless consumed or re-issued.
    pub expires_at: DateTime<Utc>,
    /// The academic year the voucher admits into — carried so the admission
    /// workflow can scope the application without a second lookup.
    pub academic_year: AcademicYearId,
    /// How this lease was obtained.
    pub grant: GrantKind,
}

/// Outcome of `verify` or `check`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeaseResult {
    /// The caller holds the exclusive redemption right until `expires_at`.
    Granted(Lease),
    /// No lease; the reason is classified but deliberately coarse.
    Denied(DenialReason),
}

impl LeaseResult {
    /// Whether a lease is held.
    #[must_use]
    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted(_))
    }

    /// The lease, if granted.
    #[must_use]
    pub fn lease(&self) -> Option<&Lease> {
        match self {
            Self::Granted(lease) => Some(lease),
            Self::Denied(_) => None,
        }
    }

    /// The denial reason, if denied.
    #[must_use]
    pub fn denial(&self) -> Option<DenialReason> {
        match self {
            Self::Granted(_) => None,
            Self::Denied(reason) => Some(*reason),
        }
    }
}
