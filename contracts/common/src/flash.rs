//! Flash Loan Group Scanner
//!
//! Flash loans here carry no debt state. A borrower packages the loan
//! request and a repayment payment into one atomic group; the contract
//! proves the repayment is present before it disburses anything, and the
//! ledger's all-or-nothing commit does the rest. If the repayment payment
//! fails, the loan payment is discarded with it.
//!
//! Two scans over the group decide a loan request:
//!
//! 1. **Duplicate guard**: at most one call to this application may appear
//!    in the group. Two calls could request two loans while proving a
//!    single repayment.
//! 2. **Repayment proof**: some payment to the application account must
//!    cover `amount * 101 / 100`.
//!
//! ```text
//! Group:
//! ├─ [0] ApplicationCall(pool, "loan", 100)   <- borrower
//! ├─ [1] ... borrower uses the funds ...
//! └─ [2] Payment(borrower -> pool, 101)       <- repayment proof
//! ```
//!
//! Both scans are pure functions of the group; nothing here touches state.

use serde::{Deserialize, Serialize};

use crate::{
    errors::{FlashPoolError, PoolResult},
    math::required_repayment,
    types::{Address, AppId, Group, Operation},
};

// ============ Repayment Policy ============

/// Who may provide the repayment payment for a loan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RepaymentPolicy {
    /// Any account's payment counts; the group's signatures already
    /// authorize every transfer in it
    #[default]
    AnyPayer,
    /// Only a payment signed by the borrower counts
    BorrowerOnly,
}

// ============ Scans ============

/// Find the first two calls to `app_id` in the group.
///
/// Any application call addressed to the pool counts, whatever its
/// opcode: a loan group may contain exactly one.
pub fn find_duplicate_call(group: &Group, app_id: AppId) -> Option<(usize, usize)> {
    let mut seen: Option<usize> = None;
    for (index, op) in group.iter().enumerate() {
        if !op.is_call_to(app_id) {
            continue;
        }
        match seen {
            Some(first) => return Some((first, index)),
            None => seen = Some(index),
        }
    }
    None
}

/// Returns true if the group addresses more than one call to `app_id`
pub fn scan_for_duplicate_loan(group: &Group, app_id: AppId) -> bool {
    find_duplicate_call(group, app_id).is_some()
}

/// Returns true if `op` repays at least `required` to `pool`
pub fn is_repayment(op: &Operation, pool: &Address, required: u64) -> bool {
    op.is_payment() && op.receiver == *pool && op.amount >= required
}

/// Position of the first payment to `pool` covering `required`.
///
/// With `payer` set, only payments signed by that account qualify.
pub fn find_repayment(
    group: &Group,
    pool: &Address,
    required: u64,
    payer: Option<&Address>,
) -> Option<usize> {
    group.iter().position(|op| {
        is_repayment(op, pool, required) && payer.map_or(true, |p| op.sender == *p)
    })
}

// ============ Loan Verification ============

/// A loan request as seen by the scanner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoanRequest {
    /// Pool application id
    pub app_id: AppId,
    /// Pool application account
    pub pool: Address,
    /// Sender of the loan call
    pub borrower: Address,
    /// Requested amount
    pub amount: u64,
    /// Repayer restriction
    pub policy: RepaymentPolicy,
}

/// Evidence that a loan request is covered by its group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoanProof {
    /// Requested amount, to be disbursed to the borrower
    pub amount: u64,
    /// Minimum repayment the group had to contain
    pub required_repayment: u64,
    /// Position of the qualifying repayment
    pub repayment_index: usize,
    /// Amount actually repaid by that payment
    pub repaid: u64,
}

/// Run both scans for a loan request.
///
/// Fails with `DuplicateLoanRequest` before looking at repayments, so a
/// group with two pool calls is rejected whatever it repays.
pub fn verify_flash_loan(group: &Group, request: &LoanRequest) -> PoolResult<LoanProof> {
    if let Some((first, second)) = find_duplicate_call(group, request.app_id) {
        return Err(FlashPoolError::DuplicateLoanRequest { first, second });
    }

    let required = required_repayment(request.amount)?;
    let payer = match request.policy {
        RepaymentPolicy::AnyPayer => None,
        RepaymentPolicy::BorrowerOnly => Some(&request.borrower),
    };

    let repayment_index = find_repayment(group, &request.pool, required, payer).ok_or(
        FlashPoolError::LoanNotRepaid {
            requested: request.amount,
            required,
        },
    )?;
    let repaid = group.get(repayment_index)?.amount;

    Ok(LoanProof {
        amount: request.amount,
        required_repayment: required,
        repayment_index,
        repaid,
    })
}
