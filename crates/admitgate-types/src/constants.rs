//! System-wide constants for the AdmitGate voucher engine.

/// Default lease TTL in seconds (15 minutes).
pub const DEFAULT_LEASE_TTL_SECS: i64 = 15 * 60;

/// Length of the public voucher code (decimal digits).
pub const DEFAULT_CODE_LEN: usize = 10;

/// Length of the secret PIN (decimal digits).
pub const DEFAULT_PIN_LEN: usize = 6;

/// Maximum re-read-and-retry rounds when an optimistic transition loses a
/// race before the failure is surfaced as transient contention.
pub const DEFAULT_TRANSITION_RETRIES: u32 = 3;

/// Maximum fresh-code retries when minting collides on an existing code.
pub const DEFAULT_CODE_COLLISION_RETRIES: u32 = 5;

/// Salt length in bytes for PIN hashing.
pub const PIN_SALT_LEN: usize = 16;

/// Derived digest length in bytes for PIN hashing.
pub const PIN_DIGEST_LEN: usize = 32;

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "AdmitGate";
