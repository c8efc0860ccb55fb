//! Operation Dispatcher
//!
//! Routes one application call to its handler by lifecycle stage and, for
//! NoOp calls, by opcode:
//!
//! ```text
//! Create    -> initialize total = 0
//! OptIn     -> deposit (first payment of the group), create local record
//! CloseOut  -> pay out stake - fee, drop local record
//! Update    -> reject
//! Delete    -> reject
//! NoOp      -> "fund" | "withdraw" | "loan" | "redeem"
//! ```
//!
//! `evaluate` only reads the store. It returns the `Transition` an approved
//! call would make, or the reason the group must be rejected; applying the
//! transition is the caller's job (see `commit`).

use flashpool_common::{
    constants::{args, opcodes},
    errors::{FlashPoolError, PoolResult},
    events::{EventLog, PoolEvent},
    flash::{verify_flash_loan, LoanRequest},
    types::{
        AccountState, Address, ChainState, GlobalState, Group, LifecycleStage, Operation,
        OperationKind, PaymentInstruction, PoolAction,
    },
    validation::{check_payment, find_duplicate_deposit, require_arg, require_int_arg, require_sender},
};

use crate::config::{DepositPolicy, PoolConfig, RedeemAccess};
use crate::ledger;
use crate::payments::payment_from_pool;
use crate::store::StateStore;

// ============ Call Context ============

/// One invocation: the group and the position of the invoking call
#[derive(Debug, Clone, Copy)]
pub struct CallContext<'a> {
    /// Ledger globals at evaluation time
    pub chain: ChainState,
    /// Enclosing atomic group
    pub group: &'a Group,
    /// Position of the invoking call in the group
    pub index: usize,
}

impl<'a> CallContext<'a> {
    pub fn new(chain: ChainState, group: &'a Group, index: usize) -> Self {
        Self { chain, group, index }
    }

    /// The invoking operation
    pub fn operation(&self) -> PoolResult<&'a Operation> {
        self.group.get(self.index)
    }
}

// ============ Transition ============

/// Change to an account's local record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountWrite {
    Put(Address, AccountState),
    Remove(Address),
}

/// Everything an approved call changes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transition {
    /// New global record
    pub global: Option<GlobalState>,
    /// Local record change
    pub account: Option<AccountWrite>,
    /// Payment to emit
    pub payment: Option<PaymentInstruction>,
    /// Events for the host
    pub events: EventLog,
}

impl Transition {
    /// Approval without side effects
    pub fn approve() -> Self {
        Self::default()
    }
}

// ============ Dispatch ============

/// Decide an application call.
pub fn evaluate<S: StateStore + ?Sized>(
    store: &S,
    call: &CallContext<'_>,
    config: &PoolConfig,
) -> PoolResult<Transition> {
    let op = call.operation()?;
    if op.kind != OperationKind::ApplicationCall
        || (op.application_id != 0 && op.application_id != call.chain.app_id)
    {
        return Err(FlashPoolError::InvalidOperation);
    }

    match op.lifecycle_stage() {
        LifecycleStage::Create => handle_create(store, op),
        LifecycleStage::OptIn => handle_opt_in(store, call, op, config),
        LifecycleStage::CloseOut => handle_close_out(store, call, op, config),
        LifecycleStage::UpdateApp => Err(FlashPoolError::UpdateForbidden),
        LifecycleStage::DeleteApp => Err(FlashPoolError::DeleteForbidden),
        LifecycleStage::ClearState => Err(FlashPoolError::UnsupportedStage),
        LifecycleStage::NoOp => match parse_action(op, config)? {
            PoolAction::Fund => handle_fund(store, call, op, config),
            PoolAction::Withdraw { amount } => handle_withdraw(store, call, op, amount, config),
            PoolAction::Loan { amount } => handle_loan(call, op, amount, config),
            PoolAction::Redeem => handle_redeem(store, call, op, config),
        },
    }
}

/// Clear-state logic: always approves. The ledger drops the account's
/// local record; the global total is not adjusted.
pub fn clear_state<S: StateStore + ?Sized>(store: &S, call: &CallContext<'_>) -> PoolResult<Transition> {
    let op = call.operation()?;
    let mut transition = Transition::approve();
    if store.account(&op.sender).is_some() {
        transition.account = Some(AccountWrite::Remove(op.sender));
    }
    Ok(transition)
}

/// Decode the opcode (and amount) of a NoOp call
pub fn parse_action(op: &Operation, config: &PoolConfig) -> PoolResult<PoolAction> {
    let opcode = require_arg(op, args::OPCODE)?;

    if opcode == opcodes::FUND {
        Ok(PoolAction::Fund)
    } else if opcode == opcodes::WITHDRAW {
        let amount = require_int_arg(op, config.amount_slot())?;
        Ok(PoolAction::Withdraw { amount })
    } else if opcode == opcodes::LOAN {
        let amount = require_int_arg(op, config.amount_slot())?;
        Ok(PoolAction::Loan { amount })
    } else if opcode == opcodes::REDEEM {
        Ok(PoolAction::Redeem)
    } else {
        Err(FlashPoolError::UnknownOpcode)
    }
}

// ============ Handlers ============

fn load_global<S: StateStore + ?Sized>(store: &S) -> PoolResult<GlobalState> {
    store.global().ok_or(FlashPoolError::NotInitialized)
}

fn load_account<S: StateStore + ?Sized>(store: &S, account: &Address) -> PoolResult<AccountState> {
    store
        .account(account)
        .ok_or(FlashPoolError::AccountNotOptedIn { account: *account })
}

fn handle_create<S: StateStore + ?Sized>(store: &S, op: &Operation) -> PoolResult<Transition> {
    if store.global().is_some() {
        return Err(FlashPoolError::AlreadyInitialized);
    }

    let mut transition = Transition::approve();
    transition.global = Some(GlobalState::new());
    transition.events.emit(PoolEvent::PoolCreated { creator: op.sender });
    Ok(transition)
}

/// The group's deposit payment, credited to at most one call
fn load_deposit<'a>(call: &CallContext<'a>, config: &PoolConfig) -> PoolResult<&'a Operation> {
    let deposit = check_payment(call.group, &call.chain.app_address)?;
    if config.deposit_policy == DepositPolicy::SingleDeposit {
        if let Some((first, second)) = find_duplicate_deposit(call.group, call.chain.app_id) {
            return Err(FlashPoolError::DuplicateDeposit { first, second });
        }
    }
    Ok(deposit)
}

fn handle_opt_in<S: StateStore + ?Sized>(
    store: &S,
    call: &CallContext<'_>,
    op: &Operation,
    config: &PoolConfig,
) -> PoolResult<Transition> {
    let deposit = load_deposit(call, config)?;
    if store.account(&op.sender).is_some() {
        return Err(FlashPoolError::AccountAlreadyOptedIn { account: op.sender });
    }
    let global = load_global(store)?;

    stake(global, AccountState::default(), op.sender, deposit.amount)
}

fn handle_fund<S: StateStore + ?Sized>(
    store: &S,
    call: &CallContext<'_>,
    op: &Operation,
    config: &PoolConfig,
) -> PoolResult<Transition> {
    let deposit = load_deposit(call, config)?;
    let account = load_account(store, &op.sender)?;
    let global = load_global(store)?;

    stake(global, account, op.sender, deposit.amount)
}

fn stake(
    global: GlobalState,
    account: AccountState,
    sender: Address,
    amount: u64,
) -> PoolResult<Transition> {
    let change = ledger::deposit(global, account, amount)?;

    let mut transition = Transition::approve();
    transition.global = Some(change.global);
    transition.account = Some(AccountWrite::Put(sender, change.account));
    transition.events.emit(PoolEvent::Staked {
        account: sender,
        amount,
        new_stake: change.account.staked,
        pool_total: change.global.total_staked,
    });
    Ok(transition)
}

fn handle_withdraw<S: StateStore + ?Sized>(
    store: &S,
    call: &CallContext<'_>,
    op: &Operation,
    amount: u64,
    config: &PoolConfig,
) -> PoolResult<Transition> {
    let account = load_account(store, &op.sender)?;
    let global = load_global(store)?;
    let fee = call.chain.min_txn_fee;

    let change = ledger::withdraw(global, account, amount, fee, config.accounting)?;
    let payment = payment_from_pool(&call.chain, op.sender, amount)?;

    let mut transition = Transition::approve();
    transition.global = Some(change.global);
    transition.account = Some(AccountWrite::Put(op.sender, change.account));
    transition.payment = Some(payment);
    transition.events.emit(PoolEvent::Withdrawn {
        account: op.sender,
        amount,
        fee,
        new_stake: change.account.staked,
        pool_total: change.global.total_staked,
    });
    Ok(transition)
}

fn handle_close_out<S: StateStore + ?Sized>(
    store: &S,
    call: &CallContext<'_>,
    op: &Operation,
    config: &PoolConfig,
) -> PoolResult<Transition> {
    let account = load_account(store, &op.sender)?;
    let global = load_global(store)?;

    let closed = ledger::close_out(global, account, call.chain.min_txn_fee, config.accounting)?;
    let payment = payment_from_pool(&call.chain, op.sender, closed.payout)?;

    let mut transition = Transition::approve();
    transition.global = Some(closed.global);
    transition.account = Some(AccountWrite::Remove(op.sender));
    transition.payment = Some(payment);
    transition.events.emit(PoolEvent::ClosedOut {
        account: op.sender,
        paid_out: closed.payout,
        pool_total: closed.global.total_staked,
    });
    Ok(transition)
}

fn handle_loan(
    call: &CallContext<'_>,
    op: &Operation,
    amount: u64,
    config: &PoolConfig,
) -> PoolResult<Transition> {
    let request = LoanRequest {
        app_id: call.chain.app_id,
        pool: call.chain.app_address,
        borrower: op.sender,
        amount,
        policy: config.repayment_policy,
    };
    let proof = verify_flash_loan(call.group, &request)?;
    let payment = payment_from_pool(&call.chain, op.sender, amount)?;

    let mut transition = Transition::approve();
    transition.payment = Some(payment);
    transition.events.emit(PoolEvent::LoanIssued {
        borrower: op.sender,
        amount,
        required_repayment: proof.required_repayment,
        repayment_index: proof.repayment_index as u32,
    });
    Ok(transition)
}

fn handle_redeem<S: StateStore + ?Sized>(
    store: &S,
    call: &CallContext<'_>,
    op: &Operation,
    config: &PoolConfig,
) -> PoolResult<Transition> {
    if config.redeem_access == RedeemAccess::CreatorOnly {
        require_sender(&call.chain.creator, &op.sender)?;
    }
    let global = load_global(store)?;

    let amount = ledger::redeemable(&call.chain, global)?;
    let payment = payment_from_pool(&call.chain, call.chain.creator, amount)?;

    let mut transition = Transition::approve();
    transition.payment = Some(payment);
    transition.events.emit(PoolEvent::FeesRedeemed {
        creator: call.chain.creator,
        amount,
    });
    Ok(transition)
}
