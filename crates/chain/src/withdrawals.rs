//! EIP-4895 withdrawal application and the withdrawals-trie root.

use alloy_primitives::{keccak256, B256};
use alloy_rlp::Encodable;
use ward_primitives::Withdrawal;
use ward_state::AccountStateDb;
use ward_trie::ordered_root;

/// The key a withdrawal is indexed under in `withdrawal-hash-to-block`:
/// `keccak256(rlp(withdrawal))`.
pub fn withdrawal_hash(withdrawal: &Withdrawal) -> B256 {
    let mut buf = Vec::new();
    withdrawal.encode(&mut buf);
    keccak256(buf)
}

/// Credits every withdrawal's `amount * 1e9` wei to its recipient, then
/// deletes any recipient left empty (EIP-161) by the credit.
///
/// Applied once, after every transaction in a post-Shanghai block, with its
/// own pass so a zero-value withdrawal to a previously absent address still
/// touches (and, if still empty, removes) the account.
pub fn apply_withdrawals(state: &mut AccountStateDb, withdrawals: &[Withdrawal]) {
    for withdrawal in withdrawals {
        let amount_wei = i128::try_from(withdrawal.amount_wei()).unwrap_or(i128::MAX);
        state.delta_balance(withdrawal.address, amount_wei);
        state.touch_account(withdrawal.address);
    }
    for withdrawal in withdrawals {
        if state.account_is_empty(withdrawal.address) {
            state.delete_account(withdrawal.address);
        }
    }
}

/// The Merkle root committed in a post-Shanghai header's `withdrawals_root`:
/// `root(rlp(index) -> rlp(withdrawal))` over the block's withdrawal list in
/// order.
pub fn withdrawals_root(withdrawals: &[Withdrawal]) -> B256 {
    ordered_root(withdrawals, |withdrawal, out| withdrawal.encode(out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, U256};

    #[test]
    fn withdrawal_credits_balance_in_wei() {
        let mut state = AccountStateDb::new();
        let address = Address::repeat_byte(1);
        let withdrawal = Withdrawal { index: 0, validator_index: 0, address, amount: 5 };
        apply_withdrawals(&mut state, &[withdrawal]);
        assert_eq!(state.get_balance(address), U256::from(5_000_000_000u64));
    }

    #[test]
    fn zero_amount_withdrawal_to_untouched_address_is_pruned() {
        let mut state = AccountStateDb::new();
        let address = Address::repeat_byte(2);
        let withdrawal = Withdrawal { index: 0, validator_index: 0, address, amount: 0 };
        apply_withdrawals(&mut state, &[withdrawal]);
        assert!(!state.account_exists(address));
    }

    #[test]
    fn funded_recipient_survives_the_empty_account_sweep() {
        let mut state = AccountStateDb::new();
        let address = Address::repeat_byte(3);
        state.set_nonce(address, 1);
        let withdrawal = Withdrawal { index: 0, validator_index: 0, address, amount: 0 };
        apply_withdrawals(&mut state, &[withdrawal]);
        assert!(state.account_exists(address));
    }

    #[test]
    fn withdrawals_root_is_empty_trie_root_with_no_withdrawals() {
        assert_eq!(withdrawals_root(&[]), ward_trie::EMPTY_ROOT_HASH);
    }

    #[test]
    fn withdrawal_hash_changes_with_index() {
        let a = withdrawal_hash(&Withdrawal { index: 0, validator_index: 0, address: Address::ZERO, amount: 1 });
        let b = withdrawal_hash(&Withdrawal { index: 1, validator_index: 0, address: Address::ZERO, amount: 1 });
        assert_ne!(a, b);
    }

    #[test]
    fn withdrawals_root_changes_with_withdrawal_list() {
        let a = withdrawals_root(&[Withdrawal { index: 0, validator_index: 0, address: Address::ZERO, amount: 1 }]);
        let b = withdrawals_root(&[Withdrawal { index: 1, validator_index: 0, address: Address::ZERO, amount: 1 }]);
        assert_ne!(a, b);
    }
}
