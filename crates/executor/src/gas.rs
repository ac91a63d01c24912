//! Intrinsic gas, EIP-7623's calldata floor, and the post-execution refund cap.

use ward_forks::{Fork, GasSchedule};
use ward_primitives::Transaction;

/// Per-tuple cost of a transaction's authorization list entries (EIP-7702):
/// each tuple costs `PER_EMPTY_ACCOUNT_COST` intrinsic gas, charged
/// conservatively at intrinsic-gas time since the executor doesn't yet know
/// whether the authority account exists. Once the authority is resolved,
/// `apply_authorizations` refunds the difference down to `PER_AUTH_BASE_COST`
/// for any tuple whose authority account already exists.
pub const PER_EMPTY_ACCOUNT_COST: u64 = 25_000;

/// Per-tuple cost of an EIP-7702 authorization whose authority account
/// already exists, refunded from the conservative `PER_EMPTY_ACCOUNT_COST`
/// charged at intrinsic-gas time.
pub const PER_AUTH_BASE_COST: u64 = 12_500;

/// EIP-7623's floor cost per token of calldata, where a token is one
/// non-zero byte or four zero bytes.
const TOTAL_COST_FLOOR_PER_TOKEN: u64 = 10;

/// A calldata byte's "token" weight for EIP-7623's floor calculation: a
/// non-zero byte is one token, four zero bytes are one token.
fn calldata_tokens(input: &[u8]) -> u64 {
    let zero_bytes = input.iter().filter(|b| **b == 0).count() as u64;
    let non_zero_bytes = input.len() as u64 - zero_bytes;
    zero_bytes + non_zero_bytes * 4
}

/// The plain (pre-EIP-7623) intrinsic gas cost: base cost, calldata cost,
/// creation surcharge, access-list cost, and EIP-7702 authorization cost.
pub fn intrinsic_gas(tx: &Transaction, schedule: &GasSchedule, fork: Fork) -> u64 {
    let mut gas = schedule.tx_base_cost;

    for byte in tx.input().iter() {
        gas += if *byte == 0 { schedule.tx_data_zero_cost } else { schedule.tx_data_non_zero_cost };
    }

    if tx.is_create() {
        gas += schedule.tx_create_cost;
        if fork.is_at_least(Fork::Shanghai) {
            let words = (tx.input().len() as u64 + 31) / 32;
            gas += 2 * words;
        }
    }

    if let Some(access_list) = tx.access_list() {
        gas += access_list.address_count() as u64 * schedule.access_list_address_cost;
        gas += access_list.storage_key_count() as u64 * schedule.access_list_storage_key_cost;
    }

    if fork.is_at_least(Fork::Prague) {
        gas += tx.authorization_list().len() as u64 * PER_EMPTY_ACCOUNT_COST;
    }

    gas
}

/// EIP-7623's calldata gas floor (Prague+): a transaction must pay at least
/// `tx_base_cost + tokens * 10`, even if its actual execution used less.
/// Returns `None` pre-Prague, where there is no floor.
pub fn floor_gas(tx: &Transaction, schedule: &GasSchedule, fork: Fork) -> Option<u64> {
    if fork.is_before(Fork::Prague) {
        return None;
    }
    Some(schedule.tx_base_cost + calldata_tokens(tx.input()) * TOTAL_COST_FLOOR_PER_TOKEN)
}

/// Caps a gross refund at `gas_used / refund_quotient`, per EIP-3529 (quotient
/// 5 from London) and the original EIP-2200 behavior (quotient 2 before).
pub fn capped_refund(gross_refund: i64, gas_used: u64, schedule: &GasSchedule) -> u64 {
    let cap = gas_used / schedule.refund_quotient;
    (gross_refund.max(0) as u64).min(cap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, Bytes, U256};
    use ward_primitives::access_list::{AccessList, AccessListItem};
    use ward_primitives::transaction::{Eip1559Tx, TransactionKind};

    fn sample_tx(input: Vec<u8>, kind: TransactionKind) -> Transaction {
        Transaction::Eip1559(Eip1559Tx {
            chain_id: 1,
            nonce: 0,
            max_priority_fee_per_gas: 1,
            max_fee_per_gas: 1,
            gas_limit: 1_000_000,
            kind,
            value: U256::ZERO,
            input: Bytes::from(input),
            access_list: AccessList::default(),
            y_parity: 0,
            r: U256::from(1),
            s: U256::from(1),
        })
    }

    #[test]
    fn base_cost_with_no_calldata_is_flat_tx_base_cost() {
        let tx = sample_tx(vec![], TransactionKind::Call(Address::ZERO));
        let schedule = GasSchedule::for_fork(Fork::London);
        assert_eq!(intrinsic_gas(&tx, &schedule, Fork::London), schedule.tx_base_cost);
    }

    #[test]
    fn creation_adds_the_create_surcharge() {
        let tx = sample_tx(vec![], TransactionKind::Create);
        let schedule = GasSchedule::for_fork(Fork::London);
        assert_eq!(
            intrinsic_gas(&tx, &schedule, Fork::London),
            schedule.tx_base_cost + schedule.tx_create_cost
        );
    }

    #[test]
    fn access_list_entries_add_their_declared_cost() {
        let tx = Transaction::Eip1559(Eip1559Tx {
            chain_id: 1,
            nonce: 0,
            max_priority_fee_per_gas: 1,
            max_fee_per_gas: 1,
            gas_limit: 1_000_000,
            kind: TransactionKind::Call(Address::ZERO),
            value: U256::ZERO,
            input: Bytes::new(),
            access_list: AccessList(vec![AccessListItem {
                address: Address::repeat_byte(1),
                storage_keys: vec![Default::default(), Default::default()],
            }]),
            y_parity: 0,
            r: U256::from(1),
            s: U256::from(1),
        });
        let schedule = GasSchedule::for_fork(Fork::Berlin);
        let expected =
            schedule.tx_base_cost + schedule.access_list_address_cost + 2 * schedule.access_list_storage_key_cost;
        assert_eq!(intrinsic_gas(&tx, &schedule, Fork::Berlin), expected);
    }

    #[test]
    fn floor_gas_is_none_before_prague() {
        let tx = sample_tx(vec![], TransactionKind::Call(Address::ZERO));
        let schedule = GasSchedule::for_fork(Fork::Cancun);
        assert_eq!(floor_gas(&tx, &schedule, Fork::Cancun), None);
    }

    #[test]
    fn floor_gas_counts_tokens_from_prague() {
        let tx = sample_tx(vec![0, 0, 0, 0, 1], TransactionKind::Call(Address::ZERO));
        let schedule = GasSchedule::for_fork(Fork::Prague);
        // 4 zero bytes = 1 token, 1 non-zero byte = 4 tokens -> 5 tokens * 10.
        assert_eq!(floor_gas(&tx, &schedule, Fork::Prague), Some(schedule.tx_base_cost + 50));
    }

    #[test]
    fn refund_is_capped_at_gas_used_over_quotient() {
        let schedule = GasSchedule::for_fork(Fork::London);
        assert_eq!(capped_refund(100_000, 100_000, &schedule), 20_000);
        assert_eq!(capped_refund(1_000, 100_000, &schedule), 1_000);
    }
}
