//! In-memory `VoucherStore` — the reference implementation and test double.
//!
//! A single mutex guards the row map and the code index; each trait method
//! holds it only for the duration of one operation, so the per-row
//! version check is atomic. A poisoned lock is reported as storage
//! unavailability rather than panicking through the caller.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use admitgate_types::{
    GateError, LeaseToken, Result, Voucher, VoucherCode, VoucherId, VoucherStatus,
};

use crate::store::{VersionedVoucher, VoucherStore};

#[derive(Default)]
struct Inner {
    rows: HashMap<VoucherId, VersionedVoucher>,
    code_index: HashMap<String, VoucherId>,
}

/// Mutex-guarded map with explicit per-row versions.
#[derive(Default)]
pub struct MemoryVoucherStore {
    inner: Mutex<Inner>,
}

impl MemoryVoucherStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows stored.
    pub fn len(&self) -> Result<usize> {
        Ok(self.lock()?.rows.len())
    }

    /// Whether the store holds no rows.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.lock()?.rows.is_empty())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| GateError::StorageUnavailable("voucher store lock poisoned".into()))
    }

    fn check_invariant(voucher: &Voucher) -> Result<()> {
        if voucher.lease_fields_consistent() {
            Ok(())
        } else {
            Err(GateError::CorruptRow {
                id: voucher.id,
                reason: format!(
                    "lease fields inconsistent with status {}",
                    voucher.status
                ),
            })
        }
    }
}

impl VoucherStore for MemoryVoucherStore {
    fn insert(&self, voucher: Voucher) -> Result<()> {
        Self::check_invariant(&voucher)?;
        let mut inner = self.lock()?;
        if inner.code_index.contains_key(voucher.code.as_str()) {
            return Err(GateError::DuplicateCode(voucher.code));
        }
        inner
            .code_index
            .insert(voucher.code.as_str().to_owned(), voucher.id);
        inner.rows.insert(
            voucher.id,
            VersionedVoucher {
                voucher,
                version: 1,
            },
        );
        Ok(())
    }

    fn find_by_id(&self, id: VoucherId) -> Result<Option<VersionedVoucher>> {
        Ok(self.lock()?.rows.get(&id).cloned())
    }

    fn find_by_code(&self, code: &VoucherCode) -> Result<Option<VersionedVoucher>> {
        let inner = self.lock()?;
        let Some(id) = inner.code_index.get(code.as_str()) else {
            return Ok(None);
        };
        Ok(inner.rows.get(id).cloned())
    }

    fn find_by_lease_token(&self, token: &LeaseToken) -> Result<Option<VersionedVoucher>> {
        let inner = self.lock()?;
        Ok(inner
            .rows
            .values()
            .find(|row| {
                row.voucher.status == VoucherStatus::Reserved
                    && row.voucher.lease_token.as_ref() == Some(token)
            })
            .cloned())
    }

    fn apply_transition(&self, expected_version: u64, updated: Voucher) -> Result<u64> {
        Self::check_invariant(&updated)?;
        let mut inner = self.lock()?;
        let Some(row) = inner.rows.get_mut(&updated.id) else {
            return Err(GateError::VoucherNotFound(updated.id));
        };
        if row.version != expected_version {
            return Err(GateError::VersionConflict {
                id: updated.id,
                expected: expected_version,
                actual: row.version,
            });
        }
        row.voucher = updated;
        row.version += 1;
        Ok(row.version)
    }

    fn scan_reserved(&self) -> Result<Vec<VersionedVoucher>> {
        let inner = self.lock()?;
        Ok(inner
            .rows
            .values()
            .filter(|row| row.voucher.status == VoucherStatus::Reserved)
            .cloned()
            .collect())
    }
}
