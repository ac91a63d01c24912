//! Per-fork gas cost constants.

use crate::fork::Fork;

/// The set of gas constants in effect for a given [Fork].
///
/// Built additively: each field is derived from the base Frontier value plus
/// every delta introduced by forks up to and including `fork`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GasSchedule {
    /// Base cost of a cold `SLOAD`/`EXTCODESIZE`/`BALANCE`/`EXTCODEHASH`/first
    /// `CALL`-family access to an address (EIP-2929), or the flat pre-Berlin
    /// cost of the same operations.
    pub cold_account_access_cost: u64,
    /// Base cost of a cold storage-slot access (EIP-2929's
    /// `COLD_SLOAD_COST`), distinct from `cold_account_access_cost` — an
    /// address becoming warm doesn't warm its storage slots, and vice versa.
    /// `0` before Berlin, when `sload_cost` alone covered every access.
    pub cold_sload_cost: u64,
    /// Cost of a warm repeat access to an address or storage slot (EIP-2929).
    pub warm_storage_read_cost: u64,
    /// Flat `SLOAD` cost before EIP-2929 made warm/cold a thing.
    pub sload_cost: u64,
    /// Cost of an `SSTORE` that sets a previously-zero slot to non-zero.
    pub sstore_set_cost: u64,
    /// Cost of an `SSTORE` that changes a non-zero slot without clearing it.
    pub sstore_reset_cost: u64,
    /// Refund for an `SSTORE` that clears a slot back to zero.
    pub sstore_clear_refund: u64,
    /// Minimum gas that must remain for `SSTORE` to proceed at all
    /// (EIP-2200's reentrancy guard); `0` before Istanbul.
    pub sstore_sentry_gas: u64,
    /// Denominator of the overall refund cap: `effective = gas_used / quotient`.
    pub refund_quotient: u64,
    /// Cost per zero byte of transaction calldata.
    pub tx_data_zero_cost: u64,
    /// Cost per non-zero byte of transaction calldata.
    pub tx_data_non_zero_cost: u64,
    /// Flat transaction base cost.
    pub tx_base_cost: u64,
    /// Additional base cost for a contract-creation transaction.
    pub tx_create_cost: u64,
    /// Cost per address in an EIP-2930 access list.
    pub access_list_address_cost: u64,
    /// Cost per storage key in an EIP-2930 access list.
    pub access_list_storage_key_cost: u64,
    /// Stipend forwarded to a callee on a non-zero value transfer.
    pub call_value_stipend: u64,
    /// Additional cost of a `CALL` that transfers value.
    pub call_value_transfer_cost: u64,
    /// Additional cost of a `CALL`/`CREATE` that brings a new account into existence.
    pub new_account_cost: u64,
    /// Cost per byte of deployed contract code (the deposit cost).
    pub code_deposit_cost: u64,
    /// Maximum deployed contract code size, `None` before EIP-170.
    pub max_code_size: Option<usize>,
    /// Maximum init code size and the per-32-byte-word cost charged against
    /// it, `None` before EIP-3860.
    pub max_initcode_size: Option<usize>,
    /// Per-topic cost of a `LOG` opcode.
    pub log_topic_cost: u64,
    /// Per-byte cost of `LOG` data.
    pub log_data_cost: u64,
    /// Flat cost of any `LOG` opcode.
    pub log_cost: u64,
    /// Whether `0xEF`-prefixed code is rejected at deployment (EIP-3541).
    pub reject_ef_prefixed_code: bool,
}

impl GasSchedule {
    /// Computes the gas schedule in effect at `fork`.
    pub fn for_fork(fork: Fork) -> Self {
        let mut schedule = Self::frontier();

        if fork >= Fork::TangerineWhistle {
            schedule.sload_cost = 200;
        }
        if fork >= Fork::SpuriousDragon {
            schedule.max_code_size = Some(24_576);
        }
        if fork >= Fork::Constantinople && fork != Fork::Petersburg {
            schedule.sstore_sentry_gas = 0;
        }
        if fork >= Fork::Istanbul {
            schedule.sload_cost = 800;
            schedule.sstore_sentry_gas = 2_300;
        }
        if fork >= Fork::Berlin {
            schedule.cold_account_access_cost = 2_600;
            schedule.cold_sload_cost = 2_100;
            schedule.warm_storage_read_cost = 100;
            schedule.sload_cost = schedule.warm_storage_read_cost;
        }
        if fork >= Fork::London {
            schedule.refund_quotient = 5;
            schedule.reject_ef_prefixed_code = true;
            schedule.sstore_clear_refund = 4_800;
        }
        if fork >= Fork::Istanbul {
            schedule.tx_data_non_zero_cost = 16;
        }
        if fork >= Fork::Shanghai {
            schedule.max_initcode_size = Some(49_152);
        }

        schedule
    }

    const fn frontier() -> Self {
        Self {
            cold_account_access_cost: 0,
            cold_sload_cost: 0,
            warm_storage_read_cost: 0,
            sload_cost: 50,
            sstore_set_cost: 20_000,
            sstore_reset_cost: 5_000,
            sstore_clear_refund: 15_000,
            sstore_sentry_gas: 0,
            refund_quotient: 2,
            tx_data_zero_cost: 4,
            tx_data_non_zero_cost: 68,
            tx_base_cost: 21_000,
            tx_create_cost: 32_000,
            access_list_address_cost: 2_400,
            access_list_storage_key_cost: 1_900,
            call_value_stipend: 2_300,
            call_value_transfer_cost: 9_000,
            new_account_cost: 25_000,
            code_deposit_cost: 200,
            max_code_size: None,
            max_initcode_size: None,
            log_topic_cost: 375,
            log_data_cost: 8,
            log_cost: 375,
            reject_ef_prefixed_code: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn berlin_introduces_cold_warm_split() {
        let pre = GasSchedule::for_fork(Fork::Istanbul);
        let post = GasSchedule::for_fork(Fork::Berlin);
        assert_eq!(pre.cold_account_access_cost, 0);
        assert_eq!(post.cold_account_access_cost, 2_600);
        assert_eq!(post.warm_storage_read_cost, 100);
    }

    #[test]
    fn berlin_introduces_distinct_cold_sload_cost() {
        let pre = GasSchedule::for_fork(Fork::Istanbul);
        let post = GasSchedule::for_fork(Fork::Berlin);
        assert_eq!(pre.cold_sload_cost, 0);
        assert_eq!(post.cold_sload_cost, 2_100);
        assert_ne!(post.cold_sload_cost, post.cold_account_access_cost);
    }

    #[test]
    fn london_raises_refund_quotient_and_rejects_ef_code() {
        let schedule = GasSchedule::for_fork(Fork::London);
        assert_eq!(schedule.refund_quotient, 5);
        assert!(schedule.reject_ef_prefixed_code);
    }

    #[test]
    fn spurious_dragon_caps_code_size() {
        let schedule = GasSchedule::for_fork(Fork::SpuriousDragon);
        assert_eq!(schedule.max_code_size, Some(24_576));
    }

    #[test]
    fn shanghai_caps_initcode_size() {
        let schedule = GasSchedule::for_fork(Fork::Shanghai);
        assert_eq!(schedule.max_initcode_size, Some(49_152));
    }
}
