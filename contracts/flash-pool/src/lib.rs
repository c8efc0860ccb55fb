//! Flash Pool Contract
//!
//! A stake pool whose funds back flash loans. Stakers deposit into the
//! pool account and may withdraw at any time; borrowers take a loan that
//! must be repaid, with a 1% fee, inside the same atomic group. The fees
//! stay in the pool until the creator redeems them.
//!
//! ## Approval Model
//!
//! The contract is a pure decision function. For every application call
//! in a group the ledger asks it to approve or reject; a single rejection
//! discards the whole group. The contract never moves funds itself: an
//! approved call yields at most one `PaymentInstruction` for the ledger.
//!
//! ```text
//! [Payment -> pool, OptIn]                opt in with a deposit
//! [Payment -> pool, NoOp "fund"]          add to stake
//! [NoOp "withdraw" amt]                   pay out amt, stake -= amt + fee
//! [NoOp "loan" amt, ..., Payment >= 1.01x] flash loan
//! [NoOp "redeem"]                         creator collects fees
//! ```
//!
//! `process` evaluates one call and commits it; `host::execute_group`
//! runs a whole group with all-or-nothing semantics.

use flashpool_common::{
    errors::{FlashPoolError, PoolResult},
    events::EventLog,
};

pub mod config;
pub mod dispatcher;
pub mod host;
pub mod ledger;
pub mod payments;
pub mod store;

#[cfg(test)]
mod integration_tests;

pub use config::{ArgumentLayout, DepositPolicy, PoolConfig, RedeemAccess, StakeAccounting};
pub use dispatcher::{clear_state, evaluate, parse_action, AccountWrite, CallContext, Transition};
pub use host::{execute_group, GroupReceipt};
pub use payments::{payment_from_pool, PaymentEmitter, PaymentLog};
pub use store::{MemoryStore, StateStore};

// ============ Decision ============

/// Outcome of one approval program run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// The call is approved and its effects were committed
    Approve(EventLog),
    /// The call, and with it the whole group, is rejected
    Reject(FlashPoolError),
}

impl Decision {
    pub fn is_approved(&self) -> bool {
        matches!(self, Decision::Approve(_))
    }

    /// Rejection reason, if any
    pub fn error(&self) -> Option<&FlashPoolError> {
        match self {
            Decision::Approve(_) => None,
            Decision::Reject(err) => Some(err),
        }
    }
}

impl From<PoolResult<EventLog>> for Decision {
    fn from(result: PoolResult<EventLog>) -> Self {
        match result {
            Ok(events) => Decision::Approve(events),
            Err(err) => Decision::Reject(err),
        }
    }
}

// ============ Commit ============

/// Apply an approved transition.
///
/// The payment is submitted first; if the emitter refuses it nothing is
/// written.
pub fn commit<S, E>(store: &mut S, emitter: &mut E, transition: Transition) -> PoolResult<EventLog>
where
    S: StateStore + ?Sized,
    E: PaymentEmitter + ?Sized,
{
    if let Some(payment) = transition.payment {
        emitter.submit(payment)?;
    }
    if let Some(global) = transition.global {
        store.put_global(global);
    }
    match transition.account {
        Some(AccountWrite::Put(address, state)) => store.put_account(&address, state),
        Some(AccountWrite::Remove(address)) => store.remove_account(&address),
        None => {}
    }
    Ok(transition.events)
}

/// Run the approval program for one call and commit it if approved.
///
/// A rejection leaves both the store and the emitter untouched.
pub fn process<S, E>(store: &mut S, emitter: &mut E, call: &CallContext<'_>, config: &PoolConfig) -> Decision
where
    S: StateStore + ?Sized,
    E: PaymentEmitter + ?Sized,
{
    evaluate(&*store, call, config)
        .and_then(|transition| commit(store, emitter, transition))
        .into()
}

/// Run the clear-state program for one call. Always approves.
pub fn process_clear_state<S>(store: &mut S, call: &CallContext<'_>) -> Decision
where
    S: StateStore + ?Sized,
{
    let mut discard = PaymentLog::new();
    clear_state(&*store, call)
        .and_then(|transition| commit(store, &mut discard, transition))
        .into()
}
