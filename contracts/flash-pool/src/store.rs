//! Ledger State Store
//!
//! The ledger owns the pool's state; the contract only reads and writes
//! it through `StateStore`. Two mappings exist: one global record (key
//! `total`) and one local record per opted-in account (key `staked`).
//!
//! `MemoryStore` keeps the same key/value layout in memory for hosts that
//! simulate the ledger, and can be snapshotted with borsh.

use std::collections::BTreeMap;

use borsh::{BorshDeserialize, BorshSerialize};
use flashpool_common::{
    constants::{
        schema,
        state_keys::{GLOBAL_TOTAL, LOCAL_STAKED},
    },
    errors::{FlashPoolError, PoolResult},
    types::{AccountState, Address, GlobalState},
};

/// Access to the pool's persisted state
pub trait StateStore {
    /// Global record, `None` before creation
    fn global(&self) -> Option<GlobalState>;

    /// Write the global record
    fn put_global(&mut self, state: GlobalState);

    /// Local record of an account, `None` if it has not opted in
    fn account(&self, account: &Address) -> Option<AccountState>;

    /// Write an account's local record, opting it in if needed
    fn put_account(&mut self, account: &Address, state: AccountState);

    /// Drop an account's local record
    fn remove_account(&mut self, account: &Address);
}

/// In-memory key/value store with the ledger's layout
#[derive(Debug, Clone, Default, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct MemoryStore {
    global: BTreeMap<Vec<u8>, u64>,
    local: BTreeMap<Address, BTreeMap<Vec<u8>, u64>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opted-in accounts and their records, ordered by address
    pub fn accounts(&self) -> impl Iterator<Item = (&Address, AccountState)> + '_ {
        self.local.iter().map(|(address, kv)| {
            (address, AccountState::new(kv.get(LOCAL_STAKED).copied().unwrap_or(0)))
        })
    }

    /// Number of opted-in accounts
    pub fn account_count(&self) -> usize {
        self.local.len()
    }

    /// Sum of all local stakes, widened so it cannot overflow
    pub fn sum_staked(&self) -> u128 {
        self.accounts().map(|(_, a)| u128::from(a.staked)).sum()
    }

    /// Raw global key lookup
    pub fn global_int(&self, key: &[u8]) -> Option<u64> {
        self.global.get(key).copied()
    }

    /// Raw local key lookup
    pub fn local_int(&self, account: &Address, key: &[u8]) -> Option<u64> {
        self.local.get(account).and_then(|kv| kv.get(key).copied())
    }

    /// Whether the stored keys fit the schema declared at creation
    pub fn fits_schema(&self) -> bool {
        self.global.len() as u64 <= schema::GLOBAL_INTS
            && self.local.values().all(|kv| kv.len() as u64 <= schema::LOCAL_INTS)
    }

    /// Serialize the whole store
    pub fn snapshot(&self) -> Vec<u8> {
        borsh::to_vec(self).unwrap_or_default()
    }

    /// Restore a store from a snapshot
    pub fn restore(bytes: &[u8]) -> PoolResult<Self> {
        borsh::from_slice(bytes).map_err(|_| FlashPoolError::CorruptState)
    }
}

impl StateStore for MemoryStore {
    fn global(&self) -> Option<GlobalState> {
        self.global.get(GLOBAL_TOTAL).map(|total| GlobalState {
            total_staked: *total,
        })
    }

    fn put_global(&mut self, state: GlobalState) {
        self.global.insert(GLOBAL_TOTAL.to_vec(), state.total_staked);
    }

    fn account(&self, account: &Address) -> Option<AccountState> {
        // An opted-in account without the key reads as zero, like the ledger
        self.local
            .get(account)
            .map(|kv| AccountState::new(kv.get(LOCAL_STAKED).copied().unwrap_or(0)))
    }

    fn put_account(&mut self, account: &Address, state: AccountState) {
        self.local
            .entry(*account)
            .or_default()
            .insert(LOCAL_STAKED.to_vec(), state.staked);
    }

    fn remove_account(&mut self, account: &Address) {
        self.local.remove(account);
    }
}
