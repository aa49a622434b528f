//! The Attempt Auditor — an append-only, hash-chained attempt trail.
//!
//! Every verification attempt is sealed into the chain: each entry's hash
//! covers the canonical serialized record **and** the previous entry's hash,
//! so any later mutation or deletion breaks [`MemoryAuditLog::verify_chain`].
//!
//! The auditor only observes outcomes the engine reports — it never mutates
//! voucher state. Writes are fail-open from the engine's point of view: a
//! sink failure is surfaced to operational monitoring but never changes the
//! verification result.

use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use admitgate_types::{AttemptRecord, GateError, Result};

/// Where the engine reports each verification attempt.
///
/// `record` must be durable on `Ok`; no read API is required by the engine
/// itself — reads exist only for abuse-review tooling.
pub trait AttemptSink: Send + Sync {
    fn record(&self, record: AttemptRecord) -> Result<()>;
}

/// One attempt sealed into the hash chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedAttempt {
    pub record: AttemptRecord,
    /// Hash of the previous entry (all zeroes for the first).
    pub prev_hash: [u8; 32],
    /// SHA-256 over `prev_hash || canonical record bytes`.
    pub record_hash: [u8; 32],
}

impl SealedAttempt {
    fn seal(record: AttemptRecord, prev_hash: [u8; 32]) -> Result<Self> {
        let payload = serde_json::to_vec(&record)
            .map_err(|e| GateError::AuditAppend(e.to_string()))?;
        let mut hasher = Sha256::new();
        hasher.update(prev_hash);
        hasher.update(&payload);
        let record_hash: [u8; 32] = hasher.finalize().into();
        Ok(Self {
            record,
            prev_hash,
            record_hash,
        })
    }

    /// Recompute this entry's hash from its contents.
    fn recomputed_hash(&self) -> Result<[u8; 32]> {
        Ok(Self::seal(self.record.clone(), self.prev_hash)?.record_hash)
    }
}

/// In-memory append-only audit log with tamper-evident chaining.
///
/// Reference implementation and test double; a durable sink implements the
/// same [`AttemptSink`] contract.
#[derive(Default)]
pub struct MemoryAuditLog {
    entries: Mutex<Vec<SealedAttempt>>,
}

impl MemoryAuditLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<SealedAttempt>>> {
        self.entries
            .lock()
            .map_err(|_| GateError::AuditAppend("audit log lock poisoned".into()))
    }

    /// Number of recorded attempts.
    pub fn len(&self) -> Result<usize> {
        Ok(self.lock()?.len())
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.lock()?.is_empty())
    }

    /// The most recent `n` attempts, oldest first.
    pub fn recent(&self, n: usize) -> Result<Vec<AttemptRecord>> {
        let entries = self.lock()?;
        let skip = entries.len().saturating_sub(n);
        Ok(entries[skip..].iter().map(|e| e.record.clone()).collect())
    }

    /// All attempts against a given submitted code string, oldest first.
    /// Works for codes that never matched a voucher — that is the point.
    pub fn for_code(&self, code: &str) -> Result<Vec<AttemptRecord>> {
        Ok(self
            .lock()?
            .iter()
            .filter(|e| e.record.code_entered == code)
            .map(|e| e.record.clone())
            .collect())
    }

    /// Full sealed entries, for external verification tooling.
    pub fn sealed(&self) -> Result<Vec<SealedAttempt>> {
        Ok(self.lock()?.clone())
    }

    /// Walk the chain and confirm every link. `false` means an entry was
    /// mutated, reordered, or removed after the fact.
    pub fn verify_chain(&self) -> Result<bool> {
        let entries = self.lock()?;
        let mut prev = [0u8; 32];
        for entry in entries.iter() {
            if entry.prev_hash != prev || entry.recomputed_hash()? != entry.record_hash {
                return Ok(false);
            }
            prev = entry.record_hash;
        }
        Ok(true)
    }
}

impl AttemptSink for MemoryAuditLog {
    fn record(&self, record: AttemptRecord) -> Result<()> {
        let mut entries = self.lock()?;
        let prev_hash = entries.last().map_or([0u8; 32], |e| e.record_hash);
        let sealed = SealedAttempt::seal(record, prev_hash)?;
        entries.push(sealed);
        Ok(())
    }
}
