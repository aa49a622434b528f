//! # admitgate-store
//!
//! Credential Store for the AdmitGate voucher engine: durable voucher rows
//! behind an explicit optimistic-concurrency contract.
//!
//! - [`VoucherStore`] — the storage capability set (load, conditional save,
//!   scan); every transition is a single-row compare-and-swap on an explicit
//!   version number
//! - [`MemoryVoucherStore`] — mutex-guarded reference implementation
//! - [`PinHasher`] — argon2id PIN hashing with constant-time verification
//! - [`mint_batch`] — bulk voucher creation from cryptographically random
//!   code/PIN material; the clear PIN is returned exactly once

pub mod memory;
pub mod mint;
pub mod pin;
pub mod store;

pub use memory::MemoryVoucherStore;
pub use mint::{IssuedVoucher, MintRequest, mint_batch, random_digits};
pub use pin::PinHasher;
pub use store::{VersionedVoucher, VoucherStore};
