//! Payment Emitter
//!
//! Approved calls may request one outgoing payment from the pool account.
//! The ledger executes it; the contract only decides receiver and amount.
//! `PaymentEmitter` is the seam between that decision and its execution.

use flashpool_common::{
    check,
    errors::{FlashPoolError, PoolResult},
    types::{Address, ChainState, PaymentInstruction},
};

/// Receiver of approved payment instructions
pub trait PaymentEmitter {
    /// Submit a payment for execution by the ledger
    fn submit(&mut self, payment: PaymentInstruction) -> PoolResult<()>;
}

/// Emitter that records instructions in order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaymentLog {
    payments: Vec<PaymentInstruction>,
}

impl PaymentLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// All submitted payments
    pub fn payments(&self) -> &[PaymentInstruction] {
        &self.payments
    }

    /// Most recent payment
    pub fn last(&self) -> Option<&PaymentInstruction> {
        self.payments.last()
    }

    /// Sum of amounts paid to an address
    pub fn paid_to(&self, receiver: &Address) -> u128 {
        self.payments
            .iter()
            .filter(|p| p.receiver == *receiver)
            .map(|p| u128::from(p.amount))
            .sum()
    }

    pub fn len(&self) -> usize {
        self.payments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payments.is_empty()
    }
}

impl PaymentEmitter for PaymentLog {
    fn submit(&mut self, payment: PaymentInstruction) -> PoolResult<()> {
        self.payments.push(payment);
        Ok(())
    }
}

/// Build a payment the pool account can actually fund.
///
/// The ledger fails an inner payment that would take the pool below its
/// minimum balance, which discards the whole group; the same rule is
/// applied here so the rejection happens before anything is committed.
pub fn payment_from_pool(
    chain: &ChainState,
    receiver: Address,
    amount: u64,
) -> PoolResult<PaymentInstruction> {
    let required = amount
        .checked_add(chain.min_txn_fee)
        .ok_or(FlashPoolError::Overflow)?;
    let available = chain.spendable();
    check!(
        required <= available,
        FlashPoolError::InsufficientLiquidity {
            available,
            required,
        }
    );
    Ok(PaymentInstruction::new(receiver, amount))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CREATOR: Address = [9u8; 32];
    const ALICE: Address = [1u8; 32];

    #[test]
    fn test_payment_log_records_in_order() {
        let mut log = PaymentLog::new();
        log.submit(PaymentInstruction::new(ALICE, 100)).unwrap();
        log.submit(PaymentInstruction::new(CREATOR, 50)).unwrap();
        log.submit(PaymentInstruction::new(ALICE, 25)).unwrap();

        assert_eq!(log.len(), 3);
        assert_eq!(log.last(), Some(&PaymentInstruction::new(ALICE, 25)));
        assert_eq!(log.paid_to(&ALICE), 125);
    }

    #[test]
    fn test_payment_within_spendable_balance() {
        // 100_000 minimum balance, 1_000 fee
        let chain = ChainState::new(3, CREATOR, 101_100);
        let payment = payment_from_pool(&chain, ALICE, 100).unwrap();
        assert_eq!(payment, PaymentInstruction::new(ALICE, 100));
    }

    #[test]
    fn test_payment_exceeding_spendable_balance() {
        let chain = ChainState::new(3, CREATOR, 101_099);
        assert_eq!(
            payment_from_pool(&chain, ALICE, 100),
            Err(FlashPoolError::InsufficientLiquidity { available: 1_099, required: 1_100 })
        );
    }
}
