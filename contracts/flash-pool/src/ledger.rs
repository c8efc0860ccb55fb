//! Balance Ledger
//!
//! Every change to `staked` and `total_staked` goes through here. The
//! functions are pure: they take the current records and return the new
//! ones, so a rejected call never leaves a half-applied write behind.

use flashpool_common::{
    check,
    errors::{FlashPoolError, PoolResult},
    math::redeemable_surplus,
    types::{AccountState, ChainState, GlobalState},
};

use crate::config::StakeAccounting;

/// Records after a stake adjustment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StakeChange {
    pub global: GlobalState,
    pub account: AccountState,
}

/// Result of a close-out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CloseOut {
    pub global: GlobalState,
    /// Paid to the account: its stake minus the payment fee
    pub payout: u64,
}

/// Credit a deposit to an account and the pool total
pub fn deposit(global: GlobalState, account: AccountState, amount: u64) -> PoolResult<StakeChange> {
    let staked = account.staked.checked_add(amount).ok_or(FlashPoolError::Overflow)?;
    let total_staked = global.total_staked.checked_add(amount).ok_or(FlashPoolError::Overflow)?;

    Ok(StakeChange {
        global: GlobalState { total_staked },
        account: AccountState { staked },
    })
}

/// Debit a withdrawal of `amount`.
///
/// The account also absorbs `min_fee` for the payment it receives, so
/// the stake drops by `amount + min_fee`.
pub fn withdraw(
    global: GlobalState,
    account: AccountState,
    amount: u64,
    min_fee: u64,
    accounting: StakeAccounting,
) -> PoolResult<StakeChange> {
    check!(
        amount <= account.staked,
        FlashPoolError::InsufficientStake {
            available: account.staked,
            requested: amount,
        }
    );

    let debit = amount.checked_add(min_fee).ok_or(FlashPoolError::Overflow)?;
    let staked = account.staked.checked_sub(debit).ok_or(FlashPoolError::Underflow)?;
    let total_staked = match accounting {
        StakeAccounting::Tracked => global
            .total_staked
            .checked_sub(debit)
            .ok_or(FlashPoolError::Underflow)?,
        StakeAccounting::Legacy => global.total_staked,
    };

    Ok(StakeChange {
        global: GlobalState { total_staked },
        account: AccountState { staked },
    })
}

/// Pay out an account's whole stake, minus the payment fee
pub fn close_out(
    global: GlobalState,
    account: AccountState,
    min_fee: u64,
    accounting: StakeAccounting,
) -> PoolResult<CloseOut> {
    let payout = account.staked.checked_sub(min_fee).ok_or(FlashPoolError::Underflow)?;
    let total_staked = match accounting {
        StakeAccounting::Tracked => global
            .total_staked
            .checked_sub(account.staked)
            .ok_or(FlashPoolError::Underflow)?,
        StakeAccounting::Legacy => global.total_staked,
    };

    Ok(CloseOut {
        global: GlobalState { total_staked },
        payout,
    })
}

/// Fee surplus the creator can redeem: whatever the pool holds beyond
/// the stakes, the minimum balance and the redeem payment's own fee
pub fn redeemable(chain: &ChainState, global: GlobalState) -> PoolResult<u64> {
    redeemable_surplus(
        chain.app_balance,
        global.total_staked,
        chain.min_balance,
        chain.min_txn_fee,
    )
}
