//! Error Types for FlashPool
//!
//! On the ledger every failure has the same outcome: the whole atomic
//! group is rejected. The typed variants below only describe *why* a group
//! was rejected, so hosts and tests can tell rejections apart.

use crate::types::Address;

/// Result type alias for FlashPool operations
pub type PoolResult<T> = Result<T, FlashPoolError>;

/// Main error enum for all FlashPool rejections
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlashPoolError {
    // ============ Lifecycle Errors ============
    /// Contract logic is immutable after deployment
    UpdateForbidden,

    /// Contract may never be deleted
    DeleteForbidden,

    /// Lifecycle stage not handled by the approval logic
    UnsupportedStage,

    /// Global state already initialized
    AlreadyInitialized,

    /// Global state missing (contract never created)
    NotInitialized,

    /// Invoking operation is not a call to this application
    InvalidOperation,

    // ============ Account Errors ============
    /// Account has not opted in
    AccountNotOptedIn { account: Address },

    /// Account already opted in
    AccountAlreadyOptedIn { account: Address },

    // ============ Argument Errors ============
    /// Required application argument is absent
    MissingArgument { index: usize },

    /// Argument could not be decoded
    InvalidArgument { index: usize, reason: &'static str },

    /// Opcode argument matched no handler
    UnknownOpcode,

    // ============ Group Errors ============
    /// Group exceeds the ledger's maximum size
    GroupTooLarge { size: usize, maximum: usize },

    /// Group has no operations
    EmptyGroup,

    /// Index outside of the group
    IndexOutOfBounds { index: usize, size: usize },

    /// First operation is not a payment to the application
    MissingDepositPayment,

    /// More than one call in the group would credit the same deposit
    DuplicateDeposit { first: usize, second: usize },

    // ============ Balance Errors ============
    /// Withdrawal larger than the account's stake
    InsufficientStake { available: u64, requested: u64 },

    /// Application account cannot cover an emitted payment
    InsufficientLiquidity { available: u64, required: u64 },

    // ============ Flash Loan Errors ============
    /// More than one call to this application in a loan group
    DuplicateLoanRequest { first: usize, second: usize },

    /// No repayment found for the requested loan
    LoanNotRepaid { requested: u64, required: u64 },

    // ============ Authorization Errors ============
    /// Caller is not authorized for this operation
    Unauthorized { expected: Address, actual: Address },

    // ============ Math Errors ============
    /// Arithmetic overflow occurred
    Overflow,

    /// Arithmetic underflow occurred
    Underflow,

    // ============ Host Errors ============
    /// Stored state could not be decoded
    CorruptState,
}

impl FlashPoolError {
    /// Returns a human-readable error code for logging/debugging
    pub fn code(&self) -> &'static str {
        match self {
            Self::UpdateForbidden => "E001_UPDATE_FORBIDDEN",
            Self::DeleteForbidden => "E002_DELETE_FORBIDDEN",
            Self::UnsupportedStage => "E003_UNSUPPORTED_STAGE",
            Self::AlreadyInitialized => "E004_ALREADY_INIT",
            Self::NotInitialized => "E005_NOT_INIT",
            Self::InvalidOperation => "E006_INVALID_OP",
            Self::AccountNotOptedIn { .. } => "E010_NOT_OPTED_IN",
            Self::AccountAlreadyOptedIn { .. } => "E011_ALREADY_OPTED_IN",
            Self::MissingArgument { .. } => "E020_MISSING_ARG",
            Self::InvalidArgument { .. } => "E021_INVALID_ARG",
            Self::UnknownOpcode => "E022_UNKNOWN_OPCODE",
            Self::GroupTooLarge { .. } => "E030_GROUP_TOO_LARGE",
            Self::EmptyGroup => "E031_EMPTY_GROUP",
            Self::IndexOutOfBounds { .. } => "E032_INDEX_OOB",
            Self::MissingDepositPayment => "E033_NO_DEPOSIT",
            Self::DuplicateDeposit { .. } => "E034_DUPLICATE_DEPOSIT",
            Self::InsufficientStake { .. } => "E040_INSUFFICIENT_STAKE",
            Self::InsufficientLiquidity { .. } => "E041_INSUFFICIENT_LIQUIDITY",
            Self::DuplicateLoanRequest { .. } => "E050_DUPLICATE_LOAN",
            Self::LoanNotRepaid { .. } => "E051_LOAN_NOT_REPAID",
            Self::Unauthorized { .. } => "E060_UNAUTHORIZED",
            Self::Overflow => "E070_OVERFLOW",
            Self::Underflow => "E071_UNDERFLOW",
            Self::CorruptState => "E081_CORRUPT_STATE",
        }
    }

    /// Returns true if resubmitting a corrected group can succeed
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            Self::UpdateForbidden | Self::DeleteForbidden | Self::CorruptState
        )
    }
}

impl core::fmt::Display for FlashPoolError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InsufficientStake { available, requested } => write!(
                f,
                "{}: requested {} with {} staked",
                self.code(),
                requested,
                available
            ),
            Self::LoanNotRepaid { requested, required } => write!(
                f,
                "{}: loan of {} needs a repayment of at least {}",
                self.code(),
                requested,
                required
            ),
            Self::DuplicateLoanRequest { first, second }
            | Self::DuplicateDeposit { first, second } => write!(
                f,
                "{}: calls at positions {} and {}",
                self.code(),
                first,
                second
            ),
            _ => f.write_str(self.code()),
        }
    }
}
