//! Batch minting of vouchers.
//!
//! Codes and PINs are fixed-length decimal strings drawn from the OS
//! cryptographic RNG — never a counter or other predictable sequence. The
//! clear PIN appears exactly once, in the minting response; only its argon2
//! digest reaches the store. A code collision retries with fresh random
//! material up to a bound.

use chrono::{DateTime, Utc};
use rand::{Rng, rngs::OsRng};

use admitgate_types::{
    AcademicYearId, Clock, GateError, IssuerId, MintConfig, Result, Voucher, VoucherCode,
    VoucherId, VoucherStatus,
};

use crate::{pin::PinHasher, store::VoucherStore};

/// One minting order: how many vouchers, for which year, valid until when.
#[derive(Debug, Clone)]
pub struct MintRequest {
    /// Number of vouchers to mint.
    pub count: u32,
    /// The academic year the vouchers admit into.
    pub academic_year: AcademicYearId,
    /// End of the validity window for every voucher in the batch.
    pub valid_until: DateTime<Utc>,
    /// The administrative user minting the batch.
    pub issued_by: Option<IssuerId>,
}

/// A freshly minted voucher with its clear PIN.
///
/// This is the only place the PIN ever exists unhashed. Delivery to the
/// purchaser is the caller's problem; the engine never sees it again.
#[derive(Debug, Clone)]
pub struct IssuedVoucher {
    pub id: VoucherId,
    pub code: VoucherCode,
    pub pin: String,
}

/// Fixed-length decimal string from the OS cryptographic RNG.
#[must_use]
pub fn random_digits(len: usize) -> String {
    let mut rng = OsRng;
    (0..len)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}

/// Mint `request.count` vouchers into the store, returning each code/PIN
/// pair exactly once.
///
/// # Errors
/// - [`GateError::Configuration`] on zero code or PIN length
/// - [`GateError::CodeSpaceExhausted`] if fresh codes keep colliding
/// - storage and hashing failures propagate unchanged
pub fn mint_batch(
    store: &dyn VoucherStore,
    hasher: &PinHasher,
    clock: &dyn Clock,
    config: &MintConfig,
    request: &MintRequest,
) -> Result<Vec<IssuedVoucher>> {
    if config.code_len == 0 || config.pin_len == 0 {
        return Err(GateError::Configuration(
            "code and PIN lengths must be non-zero".into(),
        ));
    }

    let mut issued = Vec::with_capacity(request.count as usize);
    for _ in 0..request.count {
        issued.push(mint_one(store, hasher, clock, config, request)?);
    }

    tracing::info!(
        count = issued.len(),
        academic_year = %request.academic_year,
        valid_until = %request.valid_until,
        "minted voucher batch"
    );
    Ok(issued)
}

fn mint_one(
    store: &dyn VoucherStore,
    hasher: &PinHasher,
    clock: &dyn Clock,
    config: &MintConfig,
    request: &MintRequest,
) -> Result<IssuedVoucher> {
    let mut attempts = 0u32;
    loop {
        let code = VoucherCode::new(random_digits(config.code_len));
        let pin = random_digits(config.pin_len);
        let voucher = Voucher {
            id: VoucherId::new(),
            code: code.clone(),
            pin_hash: hasher.hash(&pin)?,
            status: VoucherStatus::Unused,
            valid_until: request.valid_until,
            lease_started_at: None,
            lease_token: None,
            redeemed_by: None,
            used_at: None,
            issued_at: clock.now(),
            academic_year: request.academic_year,
            issued_by: request.issued_by,
        };
        let id = voucher.id;

        match store.insert(voucher) {
            Ok(()) => return Ok(IssuedVoucher { id, code, pin }),
            Err(GateError::DuplicateCode(collided)) => {
                attempts += 1;
                tracing::debug!(code = %collided, attempts, "voucher code collision, retrying");
                if attempts > config.code_collision_retries {
                    return Err(GateError::CodeSpaceExhausted { attempts });
                }
            }
            Err(other) => return Err(other),
        }
    }
}
