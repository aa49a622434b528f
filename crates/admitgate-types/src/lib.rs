//! # admitgate-types
//!
//! Shared types, errors, and configuration for the **AdmitGate** voucher
//! redemption engine.
//!
//! This crate is the leaf dependency of the workspace — every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`VoucherId`], [`VoucherCode`], [`LeaseToken`], [`AttemptId`], [`AdmissionId`], [`AcademicYearId`], [`IssuerId`]
//! - **Voucher model**: [`Voucher`], [`VoucherStatus`], [`PinHash`]
//! - **Lease model**: [`Lease`], [`LeaseResult`], [`GrantKind`], [`DenialReason`]
//! - **Attempt model**: [`AttemptRecord`], [`AttemptOutcome`], [`ClientOrigin`]
//! - **Clock**: [`Clock`], [`SystemClock`]
//! - **Configuration**: [`EngineConfig`], [`MintConfig`]
//! - **Errors**: [`GateError`] with `AG_ERR_` prefix codes
//! - **Constants**: system-wide limits and defaults

pub mod attempt;
pub mod clock;
pub mod config;
pub mod constants;
pub mod error;
pub mod ids;
pub mod lease;
pub mod voucher;

// Re-export all primary types at crate root for ergonomic imports:
//   use admitgate_types::{Voucher, VoucherStatus, LeaseResult, ...};

pub use attempt::*;
pub use clock::*;
pub use config::*;
pub use error::*;
pub use ids::*;
pub use lease::*;
pub use voucher::*;

// Constants are accessed via `admitgate_types::constants::FOO`
// (not re-exported to avoid name collisions).
