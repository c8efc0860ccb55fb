//! Pool Events for FlashPool
//!
//! The contract itself only approves or rejects. Hosts still want a record
//! of what an approved call did, so every approved transition carries an
//! event log that can be indexed off-chain.

use crate::types::Address;
use crate::Vec;
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

/// Event types for indexing and filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
#[borsh(use_discriminant = true)]
#[repr(u8)]
pub enum EventType {
    // Lifecycle Events (0x01 - 0x0F)
    PoolCreated = 0x01,
    ClosedOut = 0x02,

    // Stake Events (0x10 - 0x1F)
    Staked = 0x10,
    Withdrawn = 0x11,

    // Loan Events (0x20 - 0x2F)
    LoanIssued = 0x20,
    FeesRedeemed = 0x21,
}

/// Main event enum containing all possible pool events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum PoolEvent {
    /// Emitted when the pool is created
    PoolCreated { creator: Address },

    /// Emitted on opt-in and fund
    Staked {
        account: Address,
        amount: u64,
        new_stake: u64,
        pool_total: u64,
    },

    /// Emitted on withdrawal
    Withdrawn {
        account: Address,
        amount: u64,
        fee: u64,
        new_stake: u64,
        pool_total: u64,
    },

    /// Emitted when an account leaves the pool
    ClosedOut {
        account: Address,
        paid_out: u64,
        pool_total: u64,
    },

    /// Emitted when a flash loan is disbursed
    LoanIssued {
        borrower: Address,
        amount: u64,
        required_repayment: u64,
        repayment_index: u32,
    },

    /// Emitted when the creator sweeps the fee surplus
    FeesRedeemed { creator: Address, amount: u64 },
}

impl PoolEvent {
    /// Get the event type for filtering
    pub fn event_type(&self) -> EventType {
        match self {
            Self::PoolCreated { .. } => EventType::PoolCreated,
            Self::Staked { .. } => EventType::Staked,
            Self::Withdrawn { .. } => EventType::Withdrawn,
            Self::ClosedOut { .. } => EventType::ClosedOut,
            Self::LoanIssued { .. } => EventType::LoanIssued,
            Self::FeesRedeemed { .. } => EventType::FeesRedeemed,
        }
    }

    /// Serialize event to bytes for storage/transmission
    pub fn to_bytes(&self) -> Vec<u8> {
        borsh::to_vec(self).unwrap_or_default()
    }

    /// Deserialize event from bytes
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        borsh::from_slice(bytes).ok()
    }
}

/// Event log for collecting the events of one evaluation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventLog {
    events: Vec<PoolEvent>,
}

impl EventLog {
    /// Create a new empty event log
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Emit an event (add to log)
    pub fn emit(&mut self, event: PoolEvent) {
        self.events.push(event);
    }

    /// Get all events
    pub fn events(&self) -> &[PoolEvent] {
        &self.events
    }

    /// Take ownership of all events
    pub fn into_events(self) -> Vec<PoolEvent> {
        self.events
    }

    /// Filter events by type
    pub fn filter_by_type(&self, event_type: EventType) -> Vec<&PoolEvent> {
        self.events
            .iter()
            .filter(|e| e.event_type() == event_type)
            .collect()
    }

    /// Check if any events were emitted
    pub fn has_events(&self) -> bool {
        !self.events.is_empty()
    }

    /// Get number of events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Append another log, keeping order
    pub fn extend(&mut self, other: EventLog) {
        self.events.extend(other.events);
    }
}
