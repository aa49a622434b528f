//! # Voucher — the single-use redemption credential
//!
//! A voucher is a code + secret PIN pair that grants exactly one admission
//! redemption. Its lifecycle is a small state machine:
//!
//! ```text
//!                verify(code, pin)
//!   ┌────────┐ ◀────────────────▶ ┌──────────┐  consume(token)  ┌──────┐
//!   │ UNUSED │   lapse / release  │ RESERVED ├─────────────────▶│ USED │
//!   └───┬────┘                    └────┬─────┘                  └──────┘
//!       │ validity window passed       │
//!       ▼                              ▼
//!   ┌─────────┐                   ┌─────────┐
//!   │ EXPIRED │                   │ EXPIRED │
//!   └─────────┘                   └─────────┘
//!
//!   (any state except USED/REVOKED) ──revoke──▶ REVOKED
//! ```
//!
//! ## Security properties
//!
//! - **Single-use**: `Reserved → Used` is irreversible — one redemption ever
//! - **Hashed secret**: the PIN is stored only as a salted argon2 digest
//! - **Time-bound lease**: a reservation lapses after the TTL, so an
//!   abandoned session never strands the voucher
//! - **Lease/state coupling**: `Reserved` always carries a token and a
//!   start timestamp; every other state carries neither

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::{AcademicYearId, AdmissionId, GateError, IssuerId, LeaseToken, VoucherCode, VoucherId};

// ---------------------------------------------------------------------------
// VoucherStatus
// ---------------------------------------------------------------------------

/// The lifecycle state of a voucher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VoucherStatus {
    /// Never redeemed and not currently leased. The only state minting
    /// produces.
    Unused,
    /// One caller holds the exclusive redemption right under a lease token.
    Reserved,
    /// Redemption completed. **Irreversible.** This is what makes the
    /// voucher single-use.
    Used,
    /// The validity window passed before redemption. Terminal.
    Expired,
    /// Administratively withdrawn. Terminal, and never disclosed to callers
    /// as distinct from "not found".
    Revoked,
}

impl VoucherStatus {
    /// Can a voucher in this state transition to the given target state?
    ///
    /// `Reserved → Reserved` is a legal self-transition: a correct PIN on an
    /// already-reserved voucher re-issues the lease (takeover) rather than
    /// locking the caller out.
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Unused, Self::Reserved | Self::Expired | Self::Revoked)
                | (
                    Self::Reserved,
                    Self::Reserved
                        | Self::Unused
                        | Self::Used
                        | Self::Expired
                        | Self::Revoked
                )
                | (Self::Expired, Self::Revoked)
        )
    }

    /// Whether this state admits no further transitions except revocation.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Used | Self::Expired | Self::Revoked)
    }
}

impl std::fmt::Display for VoucherStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unused => write!(f, "Unused"),
            Self::Reserved => write!(f, "Reserved"),
            Self::Used => write!(f, "Used"),
            Self::Expired => write!(f, "Expired"),
            Self::Revoked => write!(f, "Revoked"),
        }
    }
}

// ---------------------------------------------------------------------------
// PinHash
// ---------------------------------------------------------------------------

/// Opaque encoded PIN digest (`salt_hex$digest_hex`).
///
/// The clear PIN exists only in the minting response; this is all the store
/// ever sees. Hashing and verification live in `admitgate-store`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinHash(pub String);

impl PinHash {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// Voucher
// ---------------------------------------------------------------------------

/// One single-use redemption voucher row.
///
/// Rows are never physically deleted — terminal vouchers are retained for
/// audit. All mutation goes through the transition methods below, which
/// enforce [`VoucherStatus::can_transition_to`] and keep the lease fields
/// coupled to the status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Voucher {
    /// Globally unique row identifier.
    pub id: VoucherId,
    /// Public fixed-length numeric code.
    pub code: VoucherCode,
    /// Salted argon2 digest of the secret PIN.
    pub pin_hash: PinHash,
    /// Current lifecycle state.
    pub status: VoucherStatus,
    /// End of the validity window. After this instant redemption is
    /// impossible regardless of status.
    pub valid_until: DateTime<Utc>,
    /// When the current lease began. Non-null iff `status == Reserved`.
    pub lease_started_at: Option<DateTime<Utc>>,
    /// The current lease token. Non-null iff `status == Reserved`.
    pub lease_token: Option<LeaseToken>,
    /// The admission that consumed this voucher, once `Used`.
    pub redeemed_by: Option<AdmissionId>,
    /// When the voucher was consumed.
    pub used_at: Option<DateTime<Utc>>,
    /// When the voucher was minted.
    pub issued_at: DateTime<Utc>,
    /// The academic year this voucher admits into.
    pub academic_year: AcademicYearId,
    /// Who minted it.
    pub issued_by: Option<IssuerId>,
}

impl Voucher {
    /// `status == Reserved` iff both lease fields are set. Every transition
    /// method maintains this; the store re-checks it on write.
    #[must_use]
    pub fn lease_fields_consistent(&self) -> bool {
        let leased = self.lease_started_at.is_some() && self.lease_token.is_some();
        let clear = self.lease_started_at.is_none() && self.lease_token.is_none();
        match self.status {
            VoucherStatus::Reserved => leased,
            _ => clear,
        }
    }

    /// The instant the current lease lapses, if one is held.
    #[must_use]
    pub fn lease_deadline(&self, ttl: Duration) -> Option<DateTime<Utc>> {
        self.lease_started_at.map(|started| started + ttl)
    }

    /// Whether the current lease has lapsed at `now`.
    /// `false` when no lease is held.
    #[must_use]
    pub fn lease_lapsed(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        self.lease_deadline(ttl).is_some_and(|deadline| now >= deadline)
    }

    /// Whether the validity window has passed at `now`.
    #[must_use]
    pub fn past_validity(&self, now: DateTime<Utc>) -> bool {
        now >= self.valid_until
    }

    /// Issue (or re-issue) a lease: `Unused → Reserved` fresh grant, or
    /// `Reserved → Reserved` takeover. Resets the lease clock either way.
    pub fn reserve(&mut self, token: LeaseToken, now: DateTime<Utc>) -> crate::Result<()> {
        self.checked_transition(VoucherStatus::Reserved)?;
        self.lease_token = Some(token);
        self.lease_started_at = Some(now);
        Ok(())
    }

    /// Return a reserved voucher to the pool: `Reserved → Unused`.
    /// Used for both explicit release and lease-lapse reclamation.
    pub fn clear_lease(&mut self) -> crate::Result<()> {
        self.checked_transition(VoucherStatus::Unused)?;
        self.lease_token = None;
        self.lease_started_at = None;
        Ok(())
    }

    /// Consume the voucher: `Reserved → Used`. Irreversible.
    pub fn mark_used(&mut self, admission: AdmissionId, now: DateTime<Utc>) -> crate::Result<()> {
        self.checked_transition(VoucherStatus::Used)?;
        self.lease_token = None;
        self.lease_started_at = None;
        self.redeemed_by = Some(admission);
        self.used_at = Some(now);
        Ok(())
    }

    /// Validity window passed: `Unused/Reserved → Expired`.
    pub fn mark_expired(&mut self) -> crate::Result<()> {
        self.checked_transition(VoucherStatus::Expired)?;
        self.lease_token = None;
        self.lease_started_at = None;
        Ok(())
    }

    /// Administrative withdrawal of any not-yet-used voucher.
    pub fn mark_revoked(&mut self) -> crate::Result<()> {
        self.checked_transition(VoucherStatus::Revoked)?;
        self.lease_token = None;
        self.lease_started_at = None;
        Ok(())
    }

    fn checked_transition(&mut self, target: VoucherStatus) -> crate::Result<()> {
        if !self.status.can_transition_to(target) {
            return Err(GateError::InvalidTransition {
                from: self.status,
                to: target,
            });
        }
        self.status = target;
        Ok(())
    }
}

/// Dummy voucher for testing. **Never use in production** — the PIN digest
/// is a placeholder that verifies against nothing.
#[cfg(any(test, feature = "test-helpers"))]
impl Voucher {
    /// Create an Unused dummy voucher valid for one hour.
    pub fn dummy(code: &str) -> Self {
        let now = Utc::now();
        Self {
            id: VoucherId::new(),
            code: VoucherCode::new(code),
            pin_hash: PinHash(format!("{:032x}${:064x}", 0u128, rand::random::<u64>())),
            status: VoucherStatus::Unused,
            valid_until: now + Duration::hours(1),
            lease_started_at: None,
            lease_token: None,
            redeemed_by: None,
            used_at: None,
            issued_at: now,
            academic_year: AcademicYearId(2026),
            issued_by: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ttl() -> Duration {
        Duration::minutes(15)
    }

    #[test]
    fn state_transitions_valid() {
        assert!(VoucherStatus::Unused.can_transition_to(VoucherStatus::Reserved));
        assert!(VoucherStatus::Unused.can_transition_to(VoucherStatus::Expired));
        assert!(VoucherStatus::Unused.can_transition_to(VoucherStatus::Revoked));
        assert!(VoucherStatus::Reserved.can_transition_to(VoucherStatus::Reserved));
        assert!(VoucherStatus::Reserved.can_transition_to(VoucherStatus::Unused));
        assert!(VoucherStatus::Reserved.can_transition_to(VoucherStatus::Used));
        assert!(VoucherStatus::Expired.can_transition_to(VoucherStatus::Revoked));
    }

    #[test]
    fn state_transitions_invalid() {
        assert!(!VoucherStatus::Used.can_transition_to(VoucherStatus::Reserved));
        assert!(!VoucherStatus::Used.can_transition_to(VoucherStatus::Revoked));
        assert!(!VoucherStatus::Revoked.can_transition_to(VoucherStatus::Unused));
        assert!(!VoucherStatus::Expired.can_transition_to(VoucherStatus::Reserved));
        assert!(!VoucherStatus::Unused.can_transition_to(VoucherStatus::Used));
    }

    #[test]
    fn reserve_from_unused_sets_lease_fields() {
        let mut v = Voucher::dummy("1111111111");
        let token = LeaseToken::new();
        let now = Utc::now();
        v.reserve(token, now).unwrap();
        assert_eq!(v.status, VoucherStatus::Reserved);
        assert_eq!(v.lease_token, Some(token));
        assert_eq!(v.lease_started_at, Some(now));
        assert!(v.lease_fields_consistent());
    }

    #[test]
    fn takeover_replaces_lease() {
        let mut v = Voucher::dummy("1111111111");
        let first = LeaseToken::new();
        let t0 = Utc::now();
        v.reserve(first, t0).unwrap();

        let second = LeaseToken::new();
        let t1 = t0 + Duration::minutes(5);
        v.reserve(second, t1).unwrap();
        assert_eq!(v.status, VoucherStatus::Reserved);
        assert_eq!(v.lease_token, Some(second));
        assert_eq!(v.lease_started_at, Some(t1));
    }

    #[test]
    fn clear_lease_returns_to_unused() {
        let mut v = Voucher::dummy("1111111111");
        v.reserve(LeaseToken::new(), Utc::now()).unwrap();
        v.clear_lease().unwrap();
        assert_eq!(v.status, VoucherStatus::Unused);
        assert!(v.lease_token.is_none());
        assert!(v.lease_started_at.is_none());
        assert!(v.lease_fields_consistent());
    }

    #[test]
    fn clear_lease_requires_reserved() {
        let mut v = Voucher::dummy("1111111111");
        assert!(v.clear_lease().is_err());
    }

    #[test]
    fn mark_used_is_irreversible() {
        let mut v = Voucher::dummy("1111111111");
        let token = LeaseToken::new();
        v.reserve(token, Utc::now()).unwrap();
        let admission = AdmissionId::new();
        v.mark_used(admission, Utc::now()).unwrap();
        assert_eq!(v.status, VoucherStatus::Used);
        assert_eq!(v.redeemed_by, Some(admission));
        assert!(v.used_at.is_some());
        assert!(v.lease_fields_consistent());

        assert!(v.reserve(LeaseToken::new(), Utc::now()).is_err());
        assert!(v.mark_revoked().is_err());
    }

    #[test]
    fn mark_used_requires_reserved() {
        let mut v = Voucher::dummy("1111111111");
        assert!(v.mark_used(AdmissionId::new(), Utc::now()).is_err());
    }

    #[test]
    fn mark_expired_clears_lease() {
        let mut v = Voucher::dummy("1111111111");
        v.reserve(LeaseToken::new(), Utc::now()).unwrap();
        v.mark_expired().unwrap();
        assert_eq!(v.status, VoucherStatus::Expired);
        assert!(v.lease_fields_consistent());
    }

    #[test]
    fn revoke_allowed_from_expired() {
        let mut v = Voucher::dummy("1111111111");
        v.mark_expired().unwrap();
        v.mark_revoked().unwrap();
        assert_eq!(v.status, VoucherStatus::Revoked);
    }

    #[test]
    fn lease_lapse_arithmetic() {
        let mut v = Voucher::dummy("1111111111");
        let t0 = Utc::now();
        v.reserve(LeaseToken::new(), t0).unwrap();

        assert!(!v.lease_lapsed(t0 + Duration::minutes(14), ttl()));
        assert!(v.lease_lapsed(t0 + Duration::minutes(15), ttl()));
        assert_eq!(v.lease_deadline(ttl()), Some(t0 + Duration::minutes(15)));
    }

    #[test]
    fn no_lease_never_lapses() {
        let v = Voucher::dummy("1111111111");
        assert!(!v.lease_lapsed(Utc::now() + Duration::days(365), ttl()));
        assert!(v.lease_deadline(ttl()).is_none());
    }

    #[test]
    fn validity_window_boundary() {
        let v = Voucher::dummy("1111111111");
        assert!(!v.past_validity(v.valid_until - Duration::seconds(1)));
        assert!(v.past_validity(v.valid_until));
    }

    #[test]
    fn status_display_title_case() {
        assert_eq!(VoucherStatus::Unused.to_string(), "Unused");
        assert_eq!(VoucherStatus::Reserved.to_string(), "Reserved");
        assert_eq!(VoucherStatus::Used.to_string(), "Used");
        assert_eq!(VoucherStatus::Expired.to_string(), "Expired");
        assert_eq!(VoucherStatus::Revoked.to_string(), "Revoked");
    }

    #[test]
    fn serde_roundtrip() {
        let mut v = Voucher::dummy("9876543210");
        v.reserve(LeaseToken::new(), Utc::now()).unwrap();
        let json = serde_json::to_string(&v).unwrap();
        let back: Voucher = serde_json::from_str(&json).unwrap();
        assert_eq!(v.id, back.id);
        assert_eq!(v.status, back.status);
        assert_eq!(v.lease_token, back.lease_token);
    }
}
