//! Deployment Configuration
//!
//! The contract's behavior is fixed at deployment. Five switches cover the
//! places where the first deployed version of this pool behaved in ways
//! that are arguably defects; `PoolConfig::legacy()` reproduces that
//! version exactly, `PoolConfig::default()` is the corrected design.
//!
//! Configs travel as CBOR, the same encoding hosts use for call witnesses.

use serde::{Deserialize, Serialize};

pub use flashpool_common::flash::RepaymentPolicy;
use flashpool_common::errors::{FlashPoolError, PoolResult};

/// How withdrawals and close-outs affect the global total
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StakeAccounting {
    /// Withdraw and close-out reduce the total by what leaves the account,
    /// keeping `total == sum(staked)`
    #[default]
    Tracked,
    /// Withdraw and close-out leave the total untouched
    Legacy,
}

/// Who may trigger a fee redemption
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RedeemAccess {
    /// Only the creator
    #[default]
    CreatorOnly,
    /// Anyone; the surplus still goes to the creator
    Anyone,
}

/// Where NoOp calls carry their amount
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ArgumentLayout {
    /// Opcode in argument 0, amount in argument 1
    #[default]
    Separate,
    /// Argument 0 is both the opcode and, decoded as an integer, the amount
    SharedSlot,
}

/// How many depositing calls may share a group's deposit payment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DepositPolicy {
    /// At most one opt-in or `fund` call per group
    #[default]
    SingleDeposit,
    /// Every depositing call credits the first-position payment
    SharedPayment,
}

/// Deployment parameters of one pool instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PoolConfig {
    pub accounting: StakeAccounting,
    pub redeem_access: RedeemAccess,
    pub repayment_policy: RepaymentPolicy,
    pub argument_layout: ArgumentLayout,
    pub deposit_policy: DepositPolicy,
}

impl PoolConfig {
    /// Behavior of the first deployed version
    pub fn legacy() -> Self {
        Self {
            accounting: StakeAccounting::Legacy,
            redeem_access: RedeemAccess::Anyone,
            repayment_policy: RepaymentPolicy::AnyPayer,
            argument_layout: ArgumentLayout::SharedSlot,
            deposit_policy: DepositPolicy::SharedPayment,
        }
    }

    /// Argument slot holding the amount for withdraw/loan calls
    pub fn amount_slot(&self) -> usize {
        use flashpool_common::constants::args;
        match self.argument_layout {
            ArgumentLayout::Separate => args::AMOUNT,
            ArgumentLayout::SharedSlot => args::OPCODE,
        }
    }

    /// Decode a config from CBOR
    pub fn from_cbor(bytes: &[u8]) -> PoolResult<Self> {
        ciborium::from_reader(bytes).map_err(|_| FlashPoolError::InvalidArgument {
            index: 0,
            reason: "malformed pool config",
        })
    }

    /// Encode this config as CBOR
    pub fn to_cbor(&self) -> Vec<u8> {
        let mut out = Vec::new();
        // Writing into a Vec cannot fail
        let _ = ciborium::into_writer(self, &mut out);
        out
    }
}
