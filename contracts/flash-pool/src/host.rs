//! Group Execution
//!
//! Bridges a whole atomic group to the per-call approval logic, the way a
//! ledger node would run it:
//!
//! ```text
//! for op in group (in order):
//!   Payment -> pool        pool balance += amount
//!   call to this app       evaluate at op's index, commit to a staged store,
//!                          pool balance -= payout + fee
//!   creation call          this pool's Create while no global record
//!                          exists, another app's creation afterwards
//!   anything else          ignored
//! any rejection            discard staged store and payments
//! all approved             store = staged, forward payments to the emitter
//! ```
//!
//! The balance each call sees therefore includes payments earlier in the
//! group, and excludes anything that comes after it.

use serde::{Deserialize, Serialize};

use flashpool_common::{
    errors::{FlashPoolError, PoolResult},
    events::{EventLog, PoolEvent},
    types::{ChainState, Group, OnCompletion, OperationKind, PaymentInstruction},
};

use crate::config::PoolConfig;
use crate::dispatcher::{clear_state, evaluate, CallContext};
use crate::payments::{PaymentEmitter, PaymentLog};
use crate::store::{MemoryStore, StateStore};

/// Result of an approved group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupReceipt {
    /// Events of every pool call, in group order
    pub events: EventLog,
    /// Payments forwarded to the emitter
    pub payments: Vec<PaymentInstruction>,
    /// Pool balance after the group
    pub app_balance: u64,
}

/// Execute every call to the pool in `group`, all or nothing.
///
/// `chain` is the ledger view before the group runs. On rejection the
/// store and emitter are untouched. The emitter only sees payments once
/// the whole group is approved, so it should not refuse them.
pub fn execute_group<S, E>(
    store: &mut S,
    emitter: &mut E,
    group: &Group,
    chain: ChainState,
    config: &PoolConfig,
) -> PoolResult<GroupReceipt>
where
    S: StateStore + Clone,
    E: PaymentEmitter + ?Sized,
{
    let mut staged = store.clone();
    let mut payments = PaymentLog::new();
    let mut events = EventLog::new();
    let mut chain = chain;

    for (index, op) in group.iter().enumerate() {
        match op.kind {
            OperationKind::Payment => {
                if op.receiver == chain.app_address {
                    chain.app_balance = chain
                        .app_balance
                        .checked_add(op.amount)
                        .ok_or(FlashPoolError::Overflow)?;
                }
            }
            OperationKind::ApplicationCall => {
                if op.application_id != 0 && op.application_id != chain.app_id {
                    continue;
                }
                // Once the pool exists, a creation call belongs to another app
                if op.application_id == 0 && staged.global().is_some() {
                    continue;
                }

                let call = CallContext::new(chain, group, index);
                let transition = if op.on_completion == OnCompletion::ClearState {
                    clear_state(&staged, &call)?
                } else {
                    evaluate(&staged, &call, config)?
                };

                if let Some(payment) = transition.payment {
                    let debit = payment
                        .amount
                        .checked_add(chain.min_txn_fee)
                        .ok_or(FlashPoolError::Overflow)?;
                    chain.app_balance = chain.app_balance.checked_sub(debit).ok_or(
                        FlashPoolError::InsufficientLiquidity {
                            available: chain.app_balance,
                            required: debit,
                        },
                    )?;
                }
                events.extend(crate::commit(&mut staged, &mut payments, transition)?);
            }
        }
    }

    for payment in payments.payments() {
        emitter.submit(*payment)?;
    }
    *store = staged;

    Ok(GroupReceipt {
        events,
        payments: payments.payments().to_vec(),
        app_balance: chain.app_balance,
    })
}

// ============ Host Wire Format ============

/// One group submitted by an external host, CBOR-encoded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostRequest {
    pub config: PoolConfig,
    pub chain: ChainState,
    pub group: Group,
    /// Borsh snapshot of the store before the group; empty for a new pool
    pub state: Vec<u8>,
}

/// Answer to a `HostRequest`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostResponse {
    pub approved: bool,
    /// `E###_NAME` code of the rejection
    pub error: Option<String>,
    /// Whether a corrected group can still be approved
    pub recoverable: bool,
    /// Store snapshot after the group (unchanged on rejection)
    pub state: Vec<u8>,
    pub payments: Vec<PaymentInstruction>,
    pub events: Vec<PoolEvent>,
    pub app_balance: u64,
}

impl HostResponse {
    pub fn to_cbor(&self) -> Vec<u8> {
        let mut out = Vec::new();
        // Writing into a Vec cannot fail
        let _ = ciborium::into_writer(self, &mut out);
        out
    }
}

/// Decode a CBOR `HostRequest`
pub fn decode_request(bytes: &[u8]) -> PoolResult<HostRequest> {
    ciborium::from_reader(bytes).map_err(|_| FlashPoolError::InvalidArgument {
        index: 0,
        reason: "malformed host request",
    })
}

/// Run a host request against its snapshot.
///
/// Fails only if the request itself is unusable (bad snapshot or group);
/// a rejected group is a normal response with `approved == false`.
pub fn handle_request(request: &HostRequest) -> PoolResult<HostResponse> {
    let mut store = if request.state.is_empty() {
        MemoryStore::new()
    } else {
        MemoryStore::restore(&request.state)?
    };
    let mut emitter = PaymentLog::new();

    let response = match execute_group(&mut store, &mut emitter, &request.group, request.chain, &request.config) {
        Ok(receipt) => HostResponse {
            approved: true,
            error: None,
            recoverable: true,
            state: store.snapshot(),
            payments: receipt.payments,
            events: receipt.events.into_events(),
            app_balance: receipt.app_balance,
        },
        Err(err) => HostResponse {
            approved: false,
            error: Some(err.code().to_string()),
            recoverable: err.is_recoverable(),
            state: store.snapshot(),
            payments: Vec::new(),
            events: Vec::new(),
            app_balance: request.chain.app_balance,
        },
    };
    Ok(response)
}
