//! # admitgate-engine
//!
//! The AdmitGate Lease Engine: a small, highly contended state machine that
//! guarantees a voucher is consumed by exactly one session.
//!
//! - [`LeaseEngine`] — `verify` / `check` / `release` / `consume` / `revoke`
//!   over any [`admitgate_store::VoucherStore`], with optimistic single-row
//!   compare-and-swap and bounded retry
//! - [`AttemptSink`] / [`MemoryAuditLog`] — append-only, hash-chained
//!   attempt trail; fail-open with respect to the verification result
//! - [`Reconciler`] — background sweep returning lapsed reservations to the
//!   pool, idempotent under concurrency with live traffic

pub mod audit;
pub mod engine;
pub mod reconciler;

pub use audit::{AttemptSink, MemoryAuditLog, SealedAttempt};
pub use engine::LeaseEngine;
pub use reconciler::Reconciler;
