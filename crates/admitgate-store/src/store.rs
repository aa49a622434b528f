//! The `VoucherStore` contract — durable storage with explicit optimistic
//! concurrency.
//!
//! Every voucher row carries a version number that increments on each write.
//! [`VoucherStore::apply_transition`] is the single mutation path: it writes
//! a whole updated row **conditioned on the version being unchanged since
//! the read**. A lost race surfaces as
//! [`GateError::VersionConflict`](admitgate_types::GateError::VersionConflict), which
//! the engine treats as a normal outcome (re-read and re-evaluate), never a
//! crash. This makes the compare-and-swap explicit instead of relying on
//! incidental commit ordering in some backend.

use admitgate_types::{LeaseToken, Result, Voucher, VoucherCode, VoucherId};

/// A voucher row paired with the version observed at read time.
#[derive(Debug, Clone)]
pub struct VersionedVoucher {
    pub voucher: Voucher,
    pub version: u64,
}

/// Storage capability set for voucher rows: load, conditional save, scan.
///
/// Implementations must be shareable across threads (`&self` methods,
/// `Send + Sync`); each call is an independent atomic operation on one row.
/// Not-found lookups are a normal `Ok(None)`, not a fault.
pub trait VoucherStore: Send + Sync {
    /// Insert a freshly minted row at version 1.
    ///
    /// # Errors
    /// - [`GateError::DuplicateCode`] if the code already exists (minting
    ///   retries with fresh random material)
    /// - [`GateError::CorruptRow`] if the row violates the lease-field
    ///   invariant
    ///
    /// [`GateError::DuplicateCode`]: admitgate_types::GateError::DuplicateCode
    /// [`GateError::CorruptRow`]: admitgate_types::GateError::CorruptRow
    fn insert(&self, voucher: Voucher) -> Result<()>;

    /// Look up a row by its identifier.
    fn find_by_id(&self, id: VoucherId) -> Result<Option<VersionedVoucher>>;

    /// Look up a row by its public code.
    fn find_by_code(&self, code: &VoucherCode) -> Result<Option<VersionedVoucher>>;

    /// Look up the row currently reserved under the given lease token.
    ///
    /// Only a `Reserved` row can hold a token, so at most one row matches.
    fn find_by_lease_token(&self, token: &LeaseToken) -> Result<Option<VersionedVoucher>>;

    /// Conditionally replace a row: succeeds only if the stored version
    /// still equals `expected_version`. Returns the new version.
    ///
    /// # Errors
    /// - [`GateError::VersionConflict`] if the row changed since the read
    /// - [`GateError::VoucherNotFound`] if the row does not exist
    /// - [`GateError::CorruptRow`] if `updated` violates the lease-field
    ///   invariant
    ///
    /// [`GateError::VersionConflict`]: admitgate_types::GateError::VersionConflict
    /// [`GateError::VoucherNotFound`]: admitgate_types::GateError::VoucherNotFound
    /// [`GateError::CorruptRow`]: admitgate_types::GateError::CorruptRow
    fn apply_transition(&self, expected_version: u64, updated: Voucher) -> Result<u64>;

    /// All rows currently in `Reserved` status (Reconciler input).
    fn scan_reserved(&self) -> Result<Vec<VersionedVoucher>>;
}
