//! Error types for the AdmitGate voucher engine.
//!
//! All errors use the `AG_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Voucher / credential errors
//! - 2xx: Concurrency errors
//! - 3xx: Storage errors
//! - 4xx: Audit errors
//! - 9xx: General / internal errors
//!
//! Note that denied verifications (wrong PIN, unknown code, already used,
//! expired) are **not** errors — they are ordinary [`crate::LeaseResult`]
//! values. Errors here mean the operation itself could not run.

use thiserror::Error;

use crate::{VoucherCode, VoucherId, VoucherStatus};

/// Central error enum for all AdmitGate operations.
#[derive(Debug, Error)]
pub enum GateError {
    // =================================================================
    // Voucher / Credential Errors (1xx)
    // =================================================================
    /// A minted code collided with an existing voucher row.
    #[error("AG_ERR_100: Duplicate voucher code: {0}")]
    DuplicateCode(VoucherCode),

    /// The requested voucher row does not exist (administrative lookups
    /// only — caller-facing lookups treat absence as a normal result).
    #[error("AG_ERR_101: Voucher not found: {0}")]
    VoucherNotFound(VoucherId),

    /// A lifecycle transition was attempted that the state machine forbids.
    #[error("AG_ERR_102: Invalid transition: {from} -> {to}")]
    InvalidTransition {
        from: VoucherStatus,
        to: VoucherStatus,
    },

    /// Minting kept colliding on fresh random codes.
    #[error("AG_ERR_103: Code space exhausted after {attempts} collision retries")]
    CodeSpaceExhausted { attempts: u32 },

    /// PIN hashing or digest parsing failed.
    #[error("AG_ERR_104: PIN hash failure: {0}")]
    PinHash(String),

    // =================================================================
    // Concurrency Errors (2xx)
    // =================================================================
    /// An optimistic write lost a race: the row changed since it was read.
    /// Recovered locally by re-read-and-retry; callers normally never see it.
    #[error("AG_ERR_200: Version conflict on voucher {id}: expected v{expected}, found v{actual}")]
    VersionConflict {
        id: VoucherId,
        expected: u64,
        actual: u64,
    },

    /// Retries exhausted under contention. Transient — safe for the caller
    /// to retry the whole operation.
    #[error("AG_ERR_201: Transition contention on voucher {id} after {retries} retries")]
    TransitionContention { id: VoucherId, retries: u32 },

    // =================================================================
    // Storage Errors (3xx)
    // =================================================================
    /// The durability layer is unavailable. Fatal for the current request;
    /// never silently defaults to success.
    #[error("AG_ERR_300: Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// A stored row violates the lease-field invariant.
    #[error("AG_ERR_301: Corrupt voucher row {id}: {reason}")]
    CorruptRow { id: VoucherId, reason: String },

    // =================================================================
    // Audit Errors (4xx)
    // =================================================================
    /// The attempt sink rejected an append. Fail-open: the verification
    /// result stands, but the failure must reach operational monitoring.
    #[error("AG_ERR_400: Attempt audit append failed: {0}")]
    AuditAppend(String),

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("AG_ERR_900: Internal error: {0}")]
    Internal(String),

    /// Configuration error (zero TTL, zero code length, etc.).
    #[error("AG_ERR_901: Configuration error: {0}")]
    Configuration(String),

    /// I/O error (disk, network).
    #[error("AG_ERR_902: I/O error: {0}")]
    Io(String),
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, GateError>;

// Conversion from std::io::Error
impl From<std::io::Error> for GateError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_contains_prefix() {
        let err = GateError::VoucherNotFound(VoucherId::new());
        let msg = format!("{err}");
        assert!(msg.starts_with("AG_ERR_101"), "Got: {msg}");
    }

    #[test]
    fn invalid_transition_display() {
        let err = GateError::InvalidTransition {
            from: VoucherStatus::Used,
            to: VoucherStatus::Reserved,
        };
        let msg = format!("{err}");
        assert!(msg.contains("AG_ERR_102"));
        assert!(msg.contains("Used"));
        assert!(msg.contains("Reserved"));
    }

    #[test]
    fn version_conflict_display() {
        let err = GateError::VersionConflict {
            id: VoucherId::new(),
            expected: 3,
            actual: 4,
        };
        let msg = format!("{err}");
        assert!(msg.contains("AG_ERR_200"));
        assert!(msg.contains("v3"));
        assert!(msg.contains("v4"));
    }

    #[test]
    fn all_errors_have_ag_err_prefix() {
        let errors: Vec<Box<dyn std::error::Error>> = vec![
            Box::new(GateError::DuplicateCode(VoucherCode::new("1234567890"))),
            Box::new(GateError::CodeSpaceExhausted { attempts: 5 }),
            Box::new(GateError::TransitionContention {
                id: VoucherId::new(),
                retries: 3,
            }),
            Box::new(GateError::StorageUnavailable("down".into())),
            Box::new(GateError::AuditAppend("sink closed".into())),
            Box::new(GateError::Internal("test".into())),
        ];
        for err in errors {
            let msg = format!("{err}");
            assert!(
                msg.starts_with("AG_ERR_"),
                "Error missing AG_ERR_ prefix: {msg}"
            );
        }
    }
}
