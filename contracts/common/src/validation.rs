//! Validation Helpers for FlashPool
//!
//! Reusable checks shared by the contract handlers.
//!
//! ```rust,ignore
//! use flashpool_common::validation::check;
//!
//! check!(amount <= staked, FlashPoolError::InsufficientStake {
//!     available: staked,
//!     requested: amount,
//! });
//! ```

use crate::{
    constants::{args, opcodes},
    errors::{FlashPoolError, PoolResult},
    math::btoi,
    types::{Address, AppId, Group, OnCompletion, Operation},
};

// ============ Validation Macro ============

/// Check a condition and return an error if it fails.
#[macro_export]
macro_rules! check {
    ($condition:expr, $error:expr) => {
        if !($condition) {
            return Err($error);
        }
    };
}

pub use check;

// ============ Deposit Check ============

/// Verify the group opens with a payment to the application account.
///
/// Stake is only credited when the funds provably arrive in the same
/// group. Returns the deposit payment.
pub fn check_payment<'a>(group: &'a Group, app_address: &Address) -> PoolResult<&'a Operation> {
    let first = group.first()?;
    check!(
        first.is_payment() && first.receiver == *app_address,
        FlashPoolError::MissingDepositPayment
    );
    Ok(first)
}

/// Returns true if `op` is a call to `app_id` that credits the group's
/// deposit payment (an opt-in or a `fund` call)
pub fn is_deposit_call(op: &Operation, app_id: AppId) -> bool {
    if !op.is_call_to(app_id) {
        return false;
    }
    match op.on_completion {
        OnCompletion::OptIn => true,
        OnCompletion::NoOp => op.arg(args::OPCODE) == Some(opcodes::FUND),
        _ => false,
    }
}

/// Positions of the first two depositing calls to `app_id`, if any.
///
/// Every depositing call reads the same first-position payment, so a
/// second one would credit funds that arrived only once.
pub fn find_duplicate_deposit(group: &Group, app_id: AppId) -> Option<(usize, usize)> {
    let mut deposits = group
        .iter()
        .enumerate()
        .filter(|(_, op)| is_deposit_call(op, app_id))
        .map(|(index, _)| index);
    let first = deposits.next()?;
    deposits.next().map(|second| (first, second))
}

// ============ Argument Checks ============

/// Fetch a required application argument
pub fn require_arg(op: &Operation, index: usize) -> PoolResult<&[u8]> {
    op.arg(index).ok_or(FlashPoolError::MissingArgument { index })
}

/// Fetch and decode a required integer argument
pub fn require_int_arg(op: &Operation, index: usize) -> PoolResult<u64> {
    let raw = require_arg(op, index)?;
    btoi(raw).ok_or(FlashPoolError::InvalidArgument {
        index,
        reason: "integer argument wider than 8 bytes",
    })
}

// ============ Authorization ============

/// Require the caller to be a specific account
pub fn require_sender(expected: &Address, actual: &Address) -> PoolResult<()> {
    check!(
        expected == actual,
        FlashPoolError::Unauthorized {
            expected: *expected,
            actual: *actual,
        }
    );
    Ok(())
}
