//! Core Types for FlashPool
//!
//! Data structures shared by the group scanner and the contract: ledger
//! operations, atomic groups, persisted pool state and emitted payments.

use crate::Vec;
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512_256};

use crate::constants::ledger::{APP_ADDRESS_PREFIX, MAX_GROUP_SIZE};
use crate::errors::{FlashPoolError, PoolResult};

/// Type alias for account addresses (32-byte public key)
pub type Address = [u8; 32];

/// Type alias for application identifiers (0 while being created)
pub type AppId = u64;

/// Derive the account address controlled by an application.
///
/// `SHA-512/256("appID" || big_endian(app_id))`, the same derivation the
/// host ledger uses, so payments addressed to the pool can be recognized.
pub fn application_address(app_id: AppId) -> Address {
    let mut hasher = Sha512_256::new();
    hasher.update(APP_ADDRESS_PREFIX);
    hasher.update(app_id.to_be_bytes());
    let result = hasher.finalize();
    let mut address = [0u8; 32];
    address.copy_from_slice(&result);
    address
}

// ============ Operation Types ============

/// Kind of a ledger operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum OperationKind {
    /// Native currency transfer
    Payment,
    /// Application invocation
    ApplicationCall,
}

/// Completion action requested by an application call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum OnCompletion {
    /// Ordinary call
    #[default]
    NoOp,
    /// Allocate local state for the sender
    OptIn,
    /// Release local state after approval
    CloseOut,
    /// Release local state unconditionally
    ClearState,
    /// Replace the application's programs
    UpdateApplication,
    /// Remove the application
    DeleteApplication,
}

/// Lifecycle stage of an invocation, as seen by the dispatcher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleStage {
    Create,
    OptIn,
    CloseOut,
    ClearState,
    UpdateApp,
    DeleteApp,
    NoOp,
}

/// One entry of an atomic group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct Operation {
    /// Payment or application call
    pub kind: OperationKind,
    /// Signer of the operation
    pub sender: Address,
    /// Payment receiver (zero for application calls)
    pub receiver: Address,
    /// Payment amount in base units (zero for application calls)
    pub amount: u64,
    /// Target application (zero for payments and for creation)
    pub application_id: AppId,
    /// Completion action for application calls
    pub on_completion: OnCompletion,
    /// Application arguments
    pub args: Vec<Vec<u8>>,
}

impl Operation {
    /// Create a payment operation
    pub fn payment(sender: Address, receiver: Address, amount: u64) -> Self {
        Self {
            kind: OperationKind::Payment,
            sender,
            receiver,
            amount,
            application_id: 0,
            on_completion: OnCompletion::NoOp,
            args: Vec::new(),
        }
    }

    /// Create an application call
    pub fn app_call(
        sender: Address,
        application_id: AppId,
        on_completion: OnCompletion,
        args: Vec<Vec<u8>>,
    ) -> Self {
        Self {
            kind: OperationKind::ApplicationCall,
            sender,
            receiver: [0u8; 32],
            amount: 0,
            application_id,
            on_completion,
            args,
        }
    }

    /// Returns true if this is a payment
    pub fn is_payment(&self) -> bool {
        self.kind == OperationKind::Payment
    }

    /// Returns true if this is a call to the given application
    pub fn is_call_to(&self, app_id: AppId) -> bool {
        self.kind == OperationKind::ApplicationCall && self.application_id == app_id
    }

    /// Lifecycle stage of an application call. Creation takes precedence
    /// over the completion action.
    pub fn lifecycle_stage(&self) -> LifecycleStage {
        if self.application_id == 0 {
            return LifecycleStage::Create;
        }
        match self.on_completion {
            OnCompletion::NoOp => LifecycleStage::NoOp,
            OnCompletion::OptIn => LifecycleStage::OptIn,
            OnCompletion::CloseOut => LifecycleStage::CloseOut,
            OnCompletion::ClearState => LifecycleStage::ClearState,
            OnCompletion::UpdateApplication => LifecycleStage::UpdateApp,
            OnCompletion::DeleteApplication => LifecycleStage::DeleteApp,
        }
    }

    /// Get an application argument
    pub fn arg(&self, index: usize) -> Option<&[u8]> {
        self.args.get(index).map(|a| a.as_slice())
    }
}

// ============ Group ============

/// Ordered operations committed atomically by the ledger.
///
/// Immutable once built: the contract always sees a fully-formed group.
/// Decoding (serde and borsh) goes through `Group::new`, so a decoded
/// group obeys the same size limits as a constructed one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize)]
#[serde(try_from = "Vec<Operation>", into = "Vec<Operation>")]
pub struct Group {
    operations: Vec<Operation>,
}

impl TryFrom<Vec<Operation>> for Group {
    type Error = FlashPoolError;

    fn try_from(operations: Vec<Operation>) -> PoolResult<Self> {
        Group::new(operations)
    }
}

impl From<Group> for Vec<Operation> {
    fn from(group: Group) -> Self {
        group.operations
    }
}

impl BorshDeserialize for Group {
    fn deserialize_reader<R: borsh::io::Read>(reader: &mut R) -> borsh::io::Result<Self> {
        let operations = Vec::<Operation>::deserialize_reader(reader)?;
        Group::new(operations).map_err(|err| {
            borsh::io::Error::new(borsh::io::ErrorKind::InvalidData, err.code())
        })
    }
}

impl Group {
    /// Build a group, enforcing the ledger's size limits
    pub fn new(operations: Vec<Operation>) -> PoolResult<Self> {
        if operations.is_empty() {
            return Err(FlashPoolError::EmptyGroup);
        }
        if operations.len() > MAX_GROUP_SIZE {
            return Err(FlashPoolError::GroupTooLarge {
                size: operations.len(),
                maximum: MAX_GROUP_SIZE,
            });
        }
        Ok(Self { operations })
    }

    /// Number of operations
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Always false for a constructed group
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Get the operation at a position
    pub fn get(&self, index: usize) -> PoolResult<&Operation> {
        self.operations.get(index).ok_or(FlashPoolError::IndexOutOfBounds {
            index,
            size: self.operations.len(),
        })
    }

    /// First operation of the group
    pub fn first(&self) -> PoolResult<&Operation> {
        self.get(0)
    }

    /// Iterate in group order
    pub fn iter(&self) -> core::slice::Iter<'_, Operation> {
        self.operations.iter()
    }

    /// All operations in group order
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }
}

// ============ Pool State ============

/// Global pool record (`total` key)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct GlobalState {
    /// Sum of all accounts' stakes
    pub total_staked: u64,
}

impl GlobalState {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Per-account record (`staked` key)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct AccountState {
    /// Account's current stake
    pub staked: u64,
}

impl AccountState {
    pub fn new(staked: u64) -> Self {
        Self { staked }
    }
}

// ============ Payments ============

/// Outgoing payment requested by an approved call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct PaymentInstruction {
    /// Receiver of the funds
    pub receiver: Address,
    /// Amount in base units
    pub amount: u64,
}

impl PaymentInstruction {
    pub fn new(receiver: Address, amount: u64) -> Self {
        Self { receiver, amount }
    }
}

// ============ Chain Context ============

/// Ledger globals visible to the contract while it evaluates a call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct ChainState {
    /// This application's id
    pub app_id: AppId,
    /// This application's account
    pub app_address: Address,
    /// Account that created the application
    pub creator: Address,
    /// Minimum transaction fee
    pub min_txn_fee: u64,
    /// Current balance of the application account
    pub app_balance: u64,
    /// Minimum balance the application account must keep
    pub min_balance: u64,
}

impl ChainState {
    /// Chain state with the ledger's default fee and minimum balance
    pub fn new(app_id: AppId, creator: Address, app_balance: u64) -> Self {
        Self {
            app_id,
            app_address: application_address(app_id),
            creator,
            min_txn_fee: crate::constants::ledger::MIN_TXN_FEE,
            app_balance,
            min_balance: crate::constants::ledger::MIN_ACCOUNT_BALANCE,
        }
    }

    /// Balance the application can pay out without dropping below its minimum
    pub fn spendable(&self) -> u64 {
        self.app_balance.saturating_sub(self.min_balance)
    }
}

// ============ Pool Actions ============

/// Decoded NoOp request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum PoolAction {
    /// Add the first-position payment to the caller's stake
    Fund,
    /// Withdraw part of the caller's stake
    Withdraw { amount: u64 },
    /// Borrow against a same-group repayment
    Loan { amount: u64 },
    /// Sweep fee surplus to the creator
    Redeem,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_application_address_deterministic() {
        assert_eq!(application_address(7), application_address(7));
        assert_ne!(application_address(7), application_address(8));
    }

    #[test]
    fn test_lifecycle_stage_create_precedence() {
        let op = Operation::app_call([1u8; 32], 0, OnCompletion::OptIn, Vec::new());
        assert_eq!(op.lifecycle_stage(), LifecycleStage::Create);

        let op = Operation::app_call([1u8; 32], 5, OnCompletion::OptIn, Vec::new());
        assert_eq!(op.lifecycle_stage(), LifecycleStage::OptIn);

        let op = Operation::app_call([1u8; 32], 5, OnCompletion::DeleteApplication, Vec::new());
        assert_eq!(op.lifecycle_stage(), LifecycleStage::DeleteApp);
    }

    #[test]
    fn test_group_size_limits() {
        assert_eq!(Group::new(Vec::new()), Err(FlashPoolError::EmptyGroup));

        let op = Operation::payment([1u8; 32], [2u8; 32], 10);
        let ops = vec![op.clone(); MAX_GROUP_SIZE + 1];
        assert!(matches!(Group::new(ops), Err(FlashPoolError::GroupTooLarge { .. })));

        let group = Group::new(vec![op; MAX_GROUP_SIZE]).unwrap();
        assert_eq!(group.len(), MAX_GROUP_SIZE);
        assert!(group.get(MAX_GROUP_SIZE).is_err());
    }

    #[test]
    fn test_decoding_enforces_size_limits() {
        // Empty operation vector: u32 length prefix of zero
        assert!(borsh::from_slice::<Group>(&[0, 0, 0, 0]).is_err());

        let op = Operation::payment([1u8; 32], [2u8; 32], 10);
        let oversized = borsh::to_vec(&vec![op.clone(); MAX_GROUP_SIZE + 1]).unwrap();
        assert!(borsh::from_slice::<Group>(&oversized).is_err());

        let group = Group::new(vec![op]).unwrap();
        let decoded: Group = borsh::from_slice(&borsh::to_vec(&group).unwrap()).unwrap();
        assert_eq!(decoded, group);
    }

    #[test]
    fn test_serde_decoding_enforces_size_limits() {
        let mut encoded = Vec::new();
        ciborium::into_writer(&Vec::<Operation>::new(), &mut encoded).unwrap();
        assert!(ciborium::from_reader::<Group, _>(encoded.as_slice()).is_err());

        let group = Group::new(vec![Operation::payment([1u8; 32], [2u8; 32], 10)]).unwrap();
        let mut encoded = Vec::new();
        ciborium::into_writer(&group, &mut encoded).unwrap();
        assert_eq!(ciborium::from_reader::<Group, _>(encoded.as_slice()).unwrap(), group);
    }

    #[test]
    fn test_is_call_to() {
        let call = Operation::app_call([1u8; 32], 42, OnCompletion::NoOp, Vec::new());
        assert!(call.is_call_to(42));
        assert!(!call.is_call_to(43));

        let pay = Operation::payment([1u8; 32], [2u8; 32], 10);
        assert!(!pay.is_call_to(0));
    }

    #[test]
    fn test_spendable_saturates() {
        let mut chain = ChainState::new(1, [9u8; 32], 50_000);
        assert_eq!(chain.spendable(), 0);
        chain.app_balance = 150_000;
        assert_eq!(chain.spendable(), 50_000);
    }
}
