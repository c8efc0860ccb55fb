//! Mathematical Utilities for FlashPool
//!
//! Checked arithmetic for every amount the contract computes. The host
//! ledger aborts on integer overflow or underflow, so each helper returns
//! an error instead of wrapping or saturating.

use crate::constants::fees::{REPAYMENT_DENOMINATOR, REPAYMENT_NUMERATOR};
use crate::constants::ledger::MAX_INT_ARG_BYTES;
use crate::errors::{FlashPoolError, PoolResult};

/// Minimum repayment for a flash loan of `amount`.
///
/// `amount * 101 / 100`, truncating. The multiplication is done in 64 bits
/// like the ledger does it, so loans above `u64::MAX / 101` are rejected.
pub fn required_repayment(amount: u64) -> PoolResult<u64> {
    amount
        .checked_mul(REPAYMENT_NUMERATOR)
        .ok_or(FlashPoolError::Overflow)?
        .checked_div(REPAYMENT_DENOMINATOR)
        .ok_or(FlashPoolError::Overflow)
}

/// Surplus the creator may redeem.
///
/// balance - total_staked - min_balance - min_fee
pub fn redeemable_surplus(
    balance: u64,
    total_staked: u64,
    min_balance: u64,
    min_fee: u64,
) -> PoolResult<u64> {
    balance
        .checked_sub(total_staked)
        .and_then(|v| v.checked_sub(min_balance))
        .and_then(|v| v.checked_sub(min_fee))
        .ok_or(FlashPoolError::Underflow)
}

/// Decode a big-endian integer argument of at most 8 bytes.
///
/// Empty input decodes to zero.
pub fn btoi(bytes: &[u8]) -> Option<u64> {
    if bytes.len() > MAX_INT_ARG_BYTES {
        return None;
    }
    Some(bytes.iter().fold(0u64, |acc, b| (acc << 8) | u64::from(*b)))
}

/// Encode an integer argument as 8 big-endian bytes
pub fn itob(value: u64) -> [u8; 8] {
    value.to_be_bytes()
}
