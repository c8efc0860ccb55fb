//! FlashPool Common Library
//!
//! Shared types, constants and utilities for the FlashPool contract: a
//! pooled-staking application that also grants flash loans.
//!
//! ## Execution Model
//!
//! The contract is a validation function evaluated once per application
//! call, with the whole atomic group visible:
//! - **Atomic groups**: every operation in a group commits, or none does
//! - **Reject is the only abort**: a failed check discards the group
//! - **Emitted payments**: approval may request one outgoing payment
//!
//! ## Modules
//!
//! - **types**: operations, groups, pool records, chain globals
//! - **flash**: group scanner proving same-group loan repayment
//! - **math**: checked repayment/surplus arithmetic and argument decoding
//! - **validation**: `check!` and shared preconditions
//! - **events**: event log for approved transitions
//!
//! This crate is `no_std` compatible when built without the `std` feature.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

// Re-export Vec for submodules based on feature
#[cfg(not(feature = "std"))]
pub use alloc::vec::Vec;
#[cfg(feature = "std")]
pub use std::vec::Vec;

pub mod constants;
pub mod errors;
pub mod events;
pub mod flash;
pub mod math;
pub mod types;
pub mod validation;

// Re-exports for convenience
pub use errors::*;
pub use events::*;
pub use flash::{
    find_duplicate_call, find_repayment, is_repayment, scan_for_duplicate_loan,
    verify_flash_loan, LoanProof, LoanRequest, RepaymentPolicy,
};
pub use math::*;
pub use types::*;
pub use validation::{
    check_payment, find_duplicate_deposit, is_deposit_call, require_arg, require_int_arg,
    require_sender,
};
