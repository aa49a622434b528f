//! # LeaseEngine — the voucher reservation state machine
//!
//! All five public operations run the same discipline: read the row, compute
//! the next state through the `Voucher` transition methods, and write it back
//! with a single-row compare-and-swap. A lost race re-reads and re-evaluates
//! up to a bounded retry count; only then does the caller see a transient
//! contention error.
//!
//! ## Anti-enumeration
//!
//! `verify` must not let an attacker distinguish "code does not exist" from
//! "code exists, wrong PIN" from "code revoked":
//!
//! - an unknown code still burns one argon2 verification (against a decoy
//!   digest), so the two paths cost the same order of time
//! - revoked vouchers are reported as `NotFound`, never as revoked
//! - PIN comparison is constant-time inside [`PinHasher`]
//!
//! Every `verify` call — success, denial, or contention — reports exactly one
//! attempt to the auditor. Audit failures are fail-open: logged to
//! operations, never altering the security decision.

use std::sync::Arc;

use admitgate_types::{
    AttemptOutcome, AttemptRecord, AdmissionId, ClientOrigin, Clock, DenialReason, EngineConfig,
    GateError, GrantKind, Lease, LeaseResult, LeaseToken, PinHash, Result, Voucher, VoucherCode,
    VoucherId, VoucherStatus,
};
use admitgate_store::{PinHasher, VoucherStore};

/// The Lease Engine. Cheap to share: all state lives behind `Arc`s.
pub struct LeaseEngine {
    store: Arc<dyn VoucherStore>,
    audit: Arc<dyn crate::audit::AttemptSink>,
    hasher: PinHasher,
    decoy: PinHash,
    config: EngineConfig,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for LeaseEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LeaseEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl LeaseEngine {
    /// Build an engine over a store and an attempt sink.
    ///
    /// # Errors
    /// [`GateError::Configuration`] on a non-positive TTL or zero retry
    /// budget; [`GateError::PinHash`] if the decoy digest cannot be derived.
    pub fn new(
        store: Arc<dyn VoucherStore>,
        audit: Arc<dyn crate::audit::AttemptSink>,
        config: EngineConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        if config.lease_ttl_secs <= 0 {
            return Err(GateError::Configuration("lease TTL must be positive".into()));
        }
        if config.transition_retries == 0 {
            return Err(GateError::Configuration(
                "transition retry budget must be at least 1".into(),
            ));
        }
        let hasher = PinHasher::new();
        let decoy = hasher.decoy()?;
        Ok(Self {
            store,
            audit,
            hasher,
            decoy,
            config,
            clock,
        })
    }

    /// The engine's configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Redeem a code + PIN pair for a lease.
    ///
    /// On an already-reserved voucher a correct PIN performs a **takeover**:
    /// the lease is re-issued with a fresh token and a reset clock, so a
    /// caller who lost their session (page refresh) is never locked out.
    /// The displaced token is dead from that instant.
    pub fn verify(&self, code: &str, pin: &str, origin: &ClientOrigin) -> Result<LeaseResult> {
        let lookup = VoucherCode::new(code);
        let Some(mut row) = self.store.find_by_code(&lookup)? else {
            // Timing parity with the found path: one argon2 verification.
            self.hasher.verify(pin, &self.decoy)?;
            self.report(code, origin, AttemptOutcome::NotFound);
            return Ok(LeaseResult::Denied(DenialReason::NotFound));
        };

        if !self.hasher.verify(pin, &row.voucher.pin_hash)? {
            self.report(code, origin, AttemptOutcome::InvalidPin);
            return Ok(LeaseResult::Denied(DenialReason::InvalidPin));
        }

        // PIN is correct. Run the guard sequence, retrying lost CAS races
        // against a re-read row.
        let mut retries = 0u32;
        loop {
            let now = self.clock.now();
            match row.voucher.status {
                VoucherStatus::Used => {
                    self.report(code, origin, AttemptOutcome::Used);
                    return Ok(LeaseResult::Denied(DenialReason::Used));
                }
                // Never leak that a revoked voucher exists.
                VoucherStatus::Revoked => {
                    self.report(code, origin, AttemptOutcome::NotFound);
                    return Ok(LeaseResult::Denied(DenialReason::NotFound));
                }
                VoucherStatus::Expired => {
                    self.report(code, origin, AttemptOutcome::Expired);
                    return Ok(LeaseResult::Denied(DenialReason::Expired));
                }
                VoucherStatus::Unused | VoucherStatus::Reserved => {
                    if row.voucher.past_validity(now) {
                        let mut updated = row.voucher.clone();
                        updated.mark_expired()?;
                        match self.store.apply_transition(row.version, updated) {
                            Ok(_) => {
                                self.report(code, origin, AttemptOutcome::Expired);
                                return Ok(LeaseResult::Denied(DenialReason::Expired));
                            }
                            Err(GateError::VersionConflict { .. }) => {}
                            Err(err) => return Err(err),
                        }
                    } else {
                        let grant = if row.voucher.status == VoucherStatus::Unused {
                            GrantKind::Fresh
                        } else {
                            GrantKind::Takeover
                        };
                        let token = LeaseToken::new();
                        let mut updated = row.voucher.clone();
                        updated.reserve(token, now)?;
                        match self.store.apply_transition(row.version, updated) {
                            Ok(_) => {
                                self.report(code, origin, AttemptOutcome::Valid);
                                tracing::info!(
                                    voucher = %row.voucher.id,
                                    %grant,
                                    "lease granted"
                                );
                                return Ok(LeaseResult::Granted(Lease {
                                    code: row.voucher.code.clone(),
                                    token,
                                    expires_at: now + self.config.lease_ttl(),
                                    academic_year: row.voucher.academic_year,
                                    grant,
                                }));
                            }
                            Err(GateError::VersionConflict { .. }) => {}
                            Err(err) => return Err(err),
                        }
                    }
                }
            }

            // Lost a race: re-read and re-evaluate.
            retries += 1;
            if retries >= self.config.transition_retries {
                self.report(code, origin, AttemptOutcome::Conflict);
                return Err(GateError::TransitionContention {
                    id: row.voucher.id,
                    retries,
                });
            }
            match self.store.find_by_code(&lookup)? {
                Some(reread) => row = reread,
                None => {
                    // Rows are never deleted; a vanished row means the
                    // backend lied to us earlier.
                    return Err(GateError::Internal(format!(
                        "voucher row for code {lookup} vanished mid-transition"
                    )));
                }
            }
        }
    }

    /// Report the state of a held lease. Read-only, except that a lapsed
    /// lease is lazily returned to the pool on the way out.
    pub fn check(&self, token: &LeaseToken) -> Result<LeaseResult> {
        let Some(row) = self.store.find_by_lease_token(token)? else {
            return Ok(LeaseResult::Denied(DenialReason::NotFound));
        };
        let now = self.clock.now();

        if row.voucher.past_validity(now) {
            let mut updated = row.voucher.clone();
            updated.mark_expired()?;
            self.apply_ignoring_races(row.version, updated)?;
            return Ok(LeaseResult::Denied(DenialReason::Expired));
        }

        let ttl = self.config.lease_ttl();
        if row.voucher.lease_lapsed(now, ttl) {
            let mut updated = row.voucher.clone();
            updated.clear_lease()?;
            if self.apply_ignoring_races(row.version, updated)? {
                tracing::debug!(voucher = %row.voucher.id, "lapsed lease reclaimed on check");
            }
            return Ok(LeaseResult::Denied(DenialReason::Expired));
        }

        let deadline = row
            .voucher
            .lease_deadline(ttl)
            .ok_or_else(|| GateError::Internal("reserved row without lease start".into()))?;
        Ok(LeaseResult::Granted(Lease {
            code: row.voucher.code.clone(),
            token: *token,
            expires_at: deadline,
            academic_year: row.voucher.academic_year,
            grant: GrantKind::Existing,
        }))
    }

    /// Deliberate early release of a lease (caller abandons the workflow).
    ///
    /// Returns whether a release actually happened. Idempotent: a token that
    /// no longer holds a reservation is a `false`, not an error.
    pub fn release(&self, token: &LeaseToken) -> Result<bool> {
        self.retry_by_token(token, |voucher, _now| {
            let mut updated = voucher.clone();
            updated.clear_lease()?;
            Ok(Some(updated))
        })
        .inspect(|released| {
            if *released {
                tracing::info!(%token, "lease released");
            }
        })
    }

    /// Final redemption step, invoked when the gated admission completes.
    ///
    /// No-op (`false`) unless the voucher is Reserved under exactly this
    /// token with a live lease; on success the voucher is `Used` forever and
    /// stamped with the consuming admission.
    pub fn consume(&self, token: &LeaseToken, admission: AdmissionId) -> Result<bool> {
        let ttl = self.config.lease_ttl();
        self.retry_by_token(token, move |voucher, now| {
            if voucher.lease_lapsed(now, ttl) || voucher.past_validity(now) {
                return Ok(None);
            }
            let mut updated = voucher.clone();
            updated.mark_used(admission, now)?;
            Ok(Some(updated))
        })
        .inspect(|consumed| {
            if *consumed {
                tracing::info!(%token, %admission, "voucher consumed");
            }
        })
    }

    /// Administrative withdrawal: force any not-yet-used, not-yet-revoked
    /// voucher to `Revoked` immediately, regardless of lease state. The
    /// voucher will verify as `NotFound` from now on.
    ///
    /// # Errors
    /// [`GateError::VoucherNotFound`] for an unknown id — this is an
    /// administrative surface, so absence is a fault here.
    pub fn revoke(&self, id: VoucherId) -> Result<bool> {
        let mut retries = 0u32;
        loop {
            let Some(row) = self.store.find_by_id(id)? else {
                return Err(GateError::VoucherNotFound(id));
            };
            if matches!(
                row.voucher.status,
                VoucherStatus::Used | VoucherStatus::Revoked
            ) {
                return Ok(false);
            }
            let mut updated = row.voucher.clone();
            updated.mark_revoked()?;
            match self.store.apply_transition(row.version, updated) {
                Ok(_) => {
                    tracing::warn!(voucher = %id, "voucher revoked");
                    return Ok(true);
                }
                Err(GateError::VersionConflict { .. }) => {
                    retries += 1;
                    if retries >= self.config.transition_retries {
                        return Err(GateError::TransitionContention { id, retries });
                    }
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Token-addressed CAS retry loop shared by `release` and `consume`.
    ///
    /// `step` inspects the Reserved voucher and returns the updated row to
    /// write, or `None` to no-op. A conflict re-resolves the token from
    /// scratch: if it no longer holds a reservation, the answer is `false`.
    fn retry_by_token<F>(&self, token: &LeaseToken, step: F) -> Result<bool>
    where
        F: Fn(&Voucher, chrono::DateTime<chrono::Utc>) -> Result<Option<Voucher>>,
    {
        let mut retries = 0u32;
        loop {
            let Some(row) = self.store.find_by_lease_token(token)? else {
                return Ok(false);
            };
            let now = self.clock.now();
            let Some(updated) = step(&row.voucher, now)? else {
                return Ok(false);
            };
            match self.store.apply_transition(row.version, updated) {
                Ok(_) => return Ok(true),
                Err(GateError::VersionConflict { .. }) => {
                    retries += 1;
                    if retries >= self.config.transition_retries {
                        return Err(GateError::TransitionContention {
                            id: row.voucher.id,
                            retries,
                        });
                    }
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Apply a transition where losing the race is acceptable (someone else
    /// already moved the row). Returns whether this write landed.
    fn apply_ignoring_races(&self, expected_version: u64, updated: Voucher) -> Result<bool> {
        match self.store.apply_transition(expected_version, updated) {
            Ok(_) => Ok(true),
            Err(GateError::VersionConflict { .. }) => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Fail-open attempt reporting: the verification result stands even if
    /// the sink is down, but the failure must not be swallowed silently.
    fn report(&self, code: &str, origin: &ClientOrigin, outcome: AttemptOutcome) {
        let record = AttemptRecord::new(code, origin.clone(), outcome, self.clock.now());
        if let Err(err) = self.audit.record(record) {
            tracing::warn!(
                error = %err,
                code,
                %outcome,
                "attempt audit write failed; verification result unaffected"
            );
        }
    }
}
