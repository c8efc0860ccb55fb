//! Integration Tests
//!
//! Whole-group scenarios run through `execute_group` against a
//! `MemoryStore`, carrying the pool balance from one group to the next.

#[cfg(test)]
mod tests {
    use crate::*;
    use flashpool_common::math::itob;
    use flashpool_common::types::{
        application_address, AccountState, Address, AppId, ChainState, GlobalState, Group,
        OnCompletion, Operation, PaymentInstruction,
    };
    use flashpool_common::{EventType, FlashPoolError, PoolEvent, PoolResult, RepaymentPolicy};

    const APP: AppId = 1_001;
    const MIN_BALANCE: u64 = 100_000;

    fn creator() -> Address {
        [9u8; 32]
    }

    fn alice() -> Address {
        [1u8; 32]
    }

    fn bob() -> Address {
        [2u8; 32]
    }

    fn carol() -> Address {
        [3u8; 32]
    }

    fn pool() -> Address {
        application_address(APP)
    }

    /// A deployed pool plus the ledger around it
    struct Harness {
        store: MemoryStore,
        emitter: PaymentLog,
        balance: u64,
        config: PoolConfig,
    }

    impl Harness {
        fn new(config: PoolConfig) -> Self {
            Self {
                store: MemoryStore::new(),
                emitter: PaymentLog::new(),
                // Creator funds the minimum balance up front
                balance: MIN_BALANCE,
                config,
            }
        }

        fn deployed(config: PoolConfig) -> Self {
            let mut harness = Self::new(config);
            harness
                .run(vec![Operation::app_call(creator(), 0, OnCompletion::NoOp, Vec::new())])
                .unwrap();
            harness
        }

        fn run(&mut self, operations: Vec<Operation>) -> PoolResult<GroupReceipt> {
            let group = Group::new(operations)?;
            let chain = ChainState::new(APP, creator(), self.balance);
            let receipt = execute_group(&mut self.store, &mut self.emitter, &group, chain, &self.config)?;
            self.balance = receipt.app_balance;
            Ok(receipt)
        }

        fn opt_in(&mut self, who: Address, deposit: u64) -> PoolResult<GroupReceipt> {
            self.run(vec![
                Operation::payment(who, pool(), deposit),
                Operation::app_call(who, APP, OnCompletion::OptIn, Vec::new()),
            ])
        }

        fn fund(&mut self, who: Address, deposit: u64) -> PoolResult<GroupReceipt> {
            self.run(vec![Operation::payment(who, pool(), deposit), call(who, b"fund", None)])
        }

        fn close_out(&mut self, who: Address) -> PoolResult<GroupReceipt> {
            self.run(vec![Operation::app_call(who, APP, OnCompletion::CloseOut, Vec::new())])
        }

        fn staked(&self, who: &Address) -> Option<u64> {
            self.store.account(who).map(|a| a.staked)
        }

        fn total(&self) -> u64 {
            self.store.global().map(|g| g.total_staked).unwrap_or_default()
        }
    }

    fn call(sender: Address, opcode: &[u8], amount: Option<u64>) -> Operation {
        let mut args = vec![opcode.to_vec()];
        if let Some(amount) = amount {
            args.push(itob(amount).to_vec());
        }
        Operation::app_call(sender, APP, OnCompletion::NoOp, args)
    }

    // ============================================================================
    // Stake / Loan Lifecycle
    // ============================================================================

    #[test]
    fn test_full_pool_lifecycle() {
        let mut pool_env = Harness::deployed(PoolConfig::default());
        assert_eq!(pool_env.store.global(), Some(GlobalState { total_staked: 0 }));

        // 1. Opt in with 1000, then fund 500
        pool_env.opt_in(alice(), 1_000).unwrap();
        pool_env.fund(alice(), 500).unwrap();
        assert_eq!(pool_env.staked(&alice()), Some(1_500));
        assert_eq!(pool_env.total(), 1_500);

        // 2. Flash loan of 100, repaid with 101 in the same group
        let receipt = pool_env
            .run(vec![call(bob(), b"loan", Some(100)), Operation::payment(bob(), pool(), 101)])
            .unwrap();
        assert_eq!(receipt.payments, vec![PaymentInstruction::new(bob(), 100)]);
        assert_eq!(receipt.events.filter_by_type(EventType::LoanIssued).len(), 1);
        assert_eq!(pool_env.total(), 1_500);

        // 3. Withdrawing the full stake cannot cover the payment fee
        let before = pool_env.store.clone();
        assert_eq!(
            pool_env.run(vec![call(alice(), b"withdraw", Some(1_500))]).unwrap_err(),
            FlashPoolError::Underflow
        );
        assert_eq!(pool_env.store, before);

        // 4. A smaller withdrawal goes through once the pool can pay the fee
        pool_env.balance += 10_000;
        let receipt = pool_env.run(vec![call(alice(), b"withdraw", Some(400))]).unwrap();
        assert_eq!(receipt.payments, vec![PaymentInstruction::new(alice(), 400)]);
        assert_eq!(pool_env.staked(&alice()), Some(100));
        assert_eq!(pool_env.total(), 100);
        assert_eq!(pool_env.emitter.len(), 2);
    }

    #[test]
    fn test_stake_invariant_holds_across_accounts() {
        let mut pool_env = Harness::deployed(PoolConfig::default());

        pool_env.opt_in(alice(), 10_000).unwrap();
        pool_env.opt_in(bob(), 25_000).unwrap();
        pool_env.fund(alice(), 2_500).unwrap();
        pool_env.opt_in(carol(), 4_000).unwrap();
        pool_env.close_out(bob()).unwrap();
        pool_env.fund(carol(), 1_000).unwrap();
        pool_env.run(vec![call(alice(), b"withdraw", Some(1_500))]).unwrap();

        assert_eq!(pool_env.store.account_count(), 2);
        assert_eq!(u128::from(pool_env.total()), pool_env.store.sum_staked());
        assert_eq!(pool_env.total(), 10_000 + 5_000);
        // Bob got his stake back minus the payment fee
        assert_eq!(pool_env.emitter.paid_to(&bob()), 24_000);
    }

    #[test]
    fn test_deposit_without_leading_payment_rejected() {
        let mut pool_env = Harness::deployed(PoolConfig::default());
        pool_env.opt_in(alice(), 1_000).unwrap();

        // Payment second instead of first
        let result = pool_env.run(vec![call(alice(), b"fund", None), Operation::payment(alice(), pool(), 500)]);
        assert_eq!(result.unwrap_err(), FlashPoolError::MissingDepositPayment);

        let result = pool_env.run(vec![Operation::app_call(bob(), APP, OnCompletion::OptIn, Vec::new())]);
        assert_eq!(result.unwrap_err(), FlashPoolError::MissingDepositPayment);
        assert_eq!(pool_env.total(), 1_000);
    }

    #[test]
    fn test_one_payment_credits_one_depositor() {
        let group = || {
            vec![
                Operation::payment(alice(), pool(), 1_000),
                call(alice(), b"fund", None),
                call(bob(), b"fund", None),
            ]
        };

        let mut pool_env = Harness::deployed(PoolConfig::default());
        pool_env.opt_in(alice(), 500).unwrap();
        pool_env.opt_in(bob(), 500).unwrap();
        let balance = pool_env.balance;

        assert_eq!(
            pool_env.run(group()).unwrap_err(),
            FlashPoolError::DuplicateDeposit { first: 1, second: 2 }
        );
        assert_eq!(pool_env.total(), 1_000);
        assert_eq!(pool_env.balance, balance);

        // Legacy deployments credit the payment twice
        let mut legacy = Harness::deployed(PoolConfig::legacy());
        legacy.opt_in(alice(), 500).unwrap();
        legacy.opt_in(bob(), 500).unwrap();
        legacy.run(group()).unwrap();
        assert_eq!(legacy.total(), 3_000);
        assert_eq!(legacy.balance, MIN_BALANCE + 2_000);
    }

    // ============================================================================
    // Flash Loan Group Rules
    // ============================================================================

    #[test]
    fn test_loan_repayment_threshold() {
        let mut pool_env = Harness::deployed(PoolConfig::default());
        pool_env.opt_in(alice(), 50_000).unwrap();

        // 12_345 * 101 / 100 = 12_468 (truncated)
        let short = pool_env.run(vec![
            call(bob(), b"loan", Some(12_345)),
            Operation::payment(bob(), pool(), 12_467),
        ]);
        assert!(matches!(short, Err(FlashPoolError::LoanNotRepaid { required: 12_468, .. })));

        // The repayment may sit anywhere in the group
        let exact = pool_env
            .run(vec![
                Operation::payment(carol(), bob(), 1),
                Operation::payment(bob(), pool(), 12_468),
                call(bob(), b"loan", Some(12_345)),
            ])
            .unwrap();
        assert_eq!(exact.payments, vec![PaymentInstruction::new(bob(), 12_345)]);
    }

    #[test]
    fn test_two_loan_calls_rejected_whatever_the_repayment() {
        let mut pool_env = Harness::deployed(PoolConfig::default());
        pool_env.opt_in(alice(), 50_000).unwrap();
        let balance = pool_env.balance;

        let result = pool_env.run(vec![
            call(bob(), b"loan", Some(100)),
            call(bob(), b"loan", Some(100)),
            Operation::payment(bob(), pool(), 1_000_000),
        ]);
        assert!(matches!(result, Err(FlashPoolError::DuplicateLoanRequest { .. })));
        assert_eq!(pool_env.balance, balance);
        assert!(pool_env.emitter.is_empty());
    }

    #[test]
    fn test_third_party_repayment_depends_on_policy() {
        let group = || {
            vec![call(bob(), b"loan", Some(1_000)), Operation::payment(carol(), pool(), 1_010)]
        };

        let mut open = Harness::deployed(PoolConfig::default());
        open.opt_in(alice(), 50_000).unwrap();
        assert!(open.run(group()).is_ok());

        let mut strict = Harness::deployed(PoolConfig {
            repayment_policy: RepaymentPolicy::BorrowerOnly,
            ..PoolConfig::default()
        });
        strict.opt_in(alice(), 50_000).unwrap();
        assert!(matches!(strict.run(group()), Err(FlashPoolError::LoanNotRepaid { .. })));
    }

    // ============================================================================
    // Fee Redemption
    // ============================================================================

    #[test]
    fn test_redeem_collects_loan_fees() {
        let mut pool_env = Harness::deployed(PoolConfig::default());
        pool_env.opt_in(alice(), 2_000_000).unwrap();
        pool_env
            .run(vec![
                call(bob(), b"loan", Some(1_000_000)),
                Operation::payment(bob(), pool(), 1_010_000),
            ])
            .unwrap();
        assert_eq!(pool_env.balance, 2_109_000);

        let receipt = pool_env.run(vec![call(creator(), b"redeem", None)]).unwrap();
        assert_eq!(receipt.payments, vec![PaymentInstruction::new(creator(), 8_000)]);
        assert_eq!(
            receipt.events.events(),
            &[PoolEvent::FeesRedeemed { creator: creator(), amount: 8_000 }]
        );

        // Nothing left: the next redemption would underflow
        assert_eq!(
            pool_env.run(vec![call(creator(), b"redeem", None)]).unwrap_err(),
            FlashPoolError::Underflow
        );
    }

    #[test]
    fn test_redeem_by_non_creator_rejected() {
        let mut pool_env = Harness::deployed(PoolConfig::default());
        pool_env.opt_in(alice(), 2_000_000).unwrap();

        assert!(matches!(
            pool_env.run(vec![call(bob(), b"redeem", None)]),
            Err(FlashPoolError::Unauthorized { .. })
        ));
    }

    // ============================================================================
    // Lifecycle Guards
    // ============================================================================

    #[test]
    fn test_update_and_delete_rejected() {
        let mut pool_env = Harness::deployed(PoolConfig::default());
        for completion in [OnCompletion::UpdateApplication, OnCompletion::DeleteApplication] {
            let result = pool_env.run(vec![Operation::app_call(creator(), APP, completion, Vec::new())]);
            assert!(result.is_err());
        }
        assert_eq!(pool_env.store.global(), Some(GlobalState { total_staked: 0 }));
    }

    #[test]
    fn test_process_rejection_leaves_state_untouched() {
        let mut store = MemoryStore::new();
        store.put_global(GlobalState { total_staked: 5_000 });
        store.put_account(&alice(), AccountState::new(5_000));
        let before = store.clone();
        let mut emitter = PaymentLog::new();

        let group = Group::new(vec![call(alice(), b"withdraw", Some(5_001))]).unwrap();
        let ctx = CallContext::new(ChainState::new(APP, creator(), 1_000_000), &group, 0);
        let decision = process(&mut store, &mut emitter, &ctx, &PoolConfig::default());

        assert!(!decision.is_approved());
        assert!(matches!(decision.error(), Some(FlashPoolError::InsufficientStake { .. })));
        assert_eq!(store, before);
        assert!(emitter.is_empty());
    }

    #[test]
    fn test_process_clear_state_drops_record() {
        let mut store = MemoryStore::new();
        store.put_global(GlobalState { total_staked: 5_000 });
        store.put_account(&alice(), AccountState::new(5_000));

        let group = Group::new(vec![Operation::app_call(alice(), APP, OnCompletion::ClearState, Vec::new())]).unwrap();
        let ctx = CallContext::new(ChainState::new(APP, creator(), 1_000_000), &group, 0);

        assert!(process_clear_state(&mut store, &ctx).is_approved());
        assert_eq!(store.account(&alice()), None);
        assert_eq!(store.global(), Some(GlobalState { total_staked: 5_000 }));
    }

    // ============================================================================
    // Legacy Deployment
    // ============================================================================

    #[test]
    fn test_legacy_close_out_keeps_total() {
        let mut pool_env = Harness::deployed(PoolConfig::legacy());
        pool_env.opt_in(alice(), 10_000).unwrap();
        pool_env.close_out(alice()).unwrap();

        assert_eq!(pool_env.staked(&alice()), None);
        assert_eq!(pool_env.total(), 10_000);
    }

    #[test]
    fn test_legacy_amount_read_from_opcode_slot() {
        let mut pool_env = Harness::deployed(PoolConfig::legacy());
        pool_env.opt_in(alice(), 10_000).unwrap();

        // "withdraw" read as an integer is far above any stake
        let result = pool_env.run(vec![call(alice(), b"withdraw", Some(1_000))]);
        assert!(matches!(result, Err(FlashPoolError::InsufficientStake { requested, .. })
            if requested == u64::from_be_bytes(*b"withdraw")));
    }
}
