//! Protocol Constants
//!
//! Magic numbers and fixed parameters for the FlashPool contract.
//! Ledger parameters follow the host ledger's consensus values; the pool
//! parameters are fixed at deployment and cannot be updated afterwards
//! (update calls are always rejected).

/// Flash loan fee configuration
pub mod fees {
    /// Repayment numerator: a loan of `A` must be repaid with `A * 101 / 100`
    pub const REPAYMENT_NUMERATOR: u64 = 101;

    /// Repayment denominator (percent)
    pub const REPAYMENT_DENOMINATOR: u64 = 100;

    /// Loan fee in percent, derived from the repayment ratio
    pub const LOAN_FEE_PERCENT: u64 = REPAYMENT_NUMERATOR - REPAYMENT_DENOMINATOR;
}

/// Host ledger parameters
pub mod ledger {
    /// Minimum fee for a single transaction, in base units
    pub const MIN_TXN_FEE: u64 = 1_000;

    /// Minimum balance an account must keep, in base units
    pub const MIN_ACCOUNT_BALANCE: u64 = 100_000;

    /// Maximum number of operations in one atomic group
    pub const MAX_GROUP_SIZE: usize = 16;

    /// Maximum width of an integer argument, in bytes
    pub const MAX_INT_ARG_BYTES: usize = 8;

    /// Prefix hashed together with an application id to derive its address
    pub const APP_ADDRESS_PREFIX: &[u8] = b"appID";
}

/// NoOp opcode literals, passed as the first application argument
pub mod opcodes {
    /// Add to an existing stake
    pub const FUND: &[u8] = b"fund";
    /// Take part of the stake back
    pub const WITHDRAW: &[u8] = b"withdraw";
    /// Request a flash loan
    pub const LOAN: &[u8] = b"loan";
    /// Sweep accrued fees to the creator
    pub const REDEEM: &[u8] = b"redeem";
}

/// Persisted state keys
pub mod state_keys {
    /// Global integer: sum of all stakes
    pub const GLOBAL_TOTAL: &[u8] = b"total";
    /// Local integer: stake of one account
    pub const LOCAL_STAKED: &[u8] = b"staked";
}

/// Storage schema declared at creation
pub mod schema {
    /// Global integer slots
    pub const GLOBAL_INTS: u64 = 1;
    /// Global byte-slice slots
    pub const GLOBAL_BYTES: u64 = 0;
    /// Local integer slots
    pub const LOCAL_INTS: u64 = 1;
    /// Local byte-slice slots
    pub const LOCAL_BYTES: u64 = 0;
}

/// Argument positions for NoOp calls
pub mod args {
    /// Slot carrying the opcode string
    pub const OPCODE: usize = 0;
    /// Slot carrying the amount when opcode and amount are separate
    pub const AMOUNT: usize = 1;
}
