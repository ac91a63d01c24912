//! Building a child header from its parent, carrying every field a given
//! fork expects forward and filling in the ones the fork newly introduces.

use crate::gas_limit::compute_gas_limit;
use alloy_eips::eip1559::{calc_next_block_base_fee, BaseFeeParams};
use alloy_eips::eip4844::calc_excess_blob_gas;
use alloy_primitives::{Address, Bloom, Bytes, B256, B64, U256};
use ward_forks::{compute_difficulty, Fork};
use ward_primitives::header::{BlockHeader, EMPTY_OMMERS_HASH, EMPTY_ROOT_HASH, GENESIS_PARENT_HASH, INITIAL_BASE_FEE};

/// Default gas limit targeted when there is no prior block to inherit one from.
pub const GENESIS_GAS_LIMIT: u64 = 30_000_000;

/// EIP-1559 gas-target divisor: the parent's gas limit divided by this is
/// the target gas usage a London-or-later block is priced against.
pub const ELASTICITY_MULTIPLIER: u64 = 2;

/// EIP-1559 maximum fractional base-fee change per block, `1 / 8`.
pub const BASE_FEE_MAX_CHANGE_DENOMINATOR: u64 = 8;

/// EIP-4844 target blob gas consumed per block (3 blobs' worth at genesis).
pub const TARGET_BLOB_GAS_PER_BLOCK: u64 = 393_216;

/// Proof-of-stake sentinel difficulty, fixed from [Fork::Paris] onward.
pub(crate) const POST_MERGE_DIFFICULTY: U256 = U256::ZERO;

/// Proof-of-stake sentinel nonce, fixed from [Fork::Paris] onward.
pub(crate) const POST_MERGE_NONCE: B64 = B64::ZERO;

/// Fields the caller supplies explicitly when building a child header;
/// anything left `None` is filled in from the parent or the active fork's
/// defaults.
#[derive(Clone, Debug, Default)]
pub struct HeaderOverrides {
    /// Address credited with the block reward and fees.
    pub beneficiary: Address,
    /// State root after this block's execution; usually filled in after
    /// execution rather than at header-construction time, so it defaults
    /// to the parent's.
    pub state_root: Option<B256>,
    /// Root of this block's transaction trie.
    pub transactions_root: Option<B256>,
    /// Root of this block's receipt trie.
    pub receipts_root: Option<B256>,
    /// Logs bloom for this block's receipts.
    pub logs_bloom: Option<Bloom>,
    /// Explicit gas limit target; if absent, computed from the parent.
    pub gas_limit: Option<u64>,
    /// Total gas this block's transactions consumed.
    pub gas_used: u64,
    /// Block timestamp; if absent, `parent.timestamp + 1`.
    pub timestamp: Option<u64>,
    /// Opaque miner data, capped at 32 bytes by convention post-Homestead.
    pub extra_data: Bytes,
    /// PoW mix digest pre-Paris, `PREVRANDAO` output from Paris onward.
    pub mix_hash: Option<B256>,
    /// Root of this block's withdrawal list, from Shanghai onward.
    pub withdrawals_root: Option<B256>,
    /// Total blob gas this block's transactions consumed, from Cancun onward.
    pub blob_gas_used: Option<u64>,
    /// Beacon chain block root, from Cancun onward.
    pub parent_beacon_block_root: Option<B256>,
}

/// Whether the parent header predates London (no `base_fee_per_gas`).
fn parent_is_pre_london(parent: &BlockHeader) -> bool {
    parent.base_fee_per_gas.is_none()
}

/// EIP-1559 base fee the child block is priced at, given its parent.
///
/// Uses [INITIAL_BASE_FEE] for the first London block, whose real parent
/// predates the fee market.
pub(crate) fn next_base_fee(parent: &BlockHeader) -> u64 {
    match parent.base_fee_per_gas {
        None => INITIAL_BASE_FEE,
        Some(parent_base_fee) => {
            let params = BaseFeeParams {
                elasticity_multiplier: ELASTICITY_MULTIPLIER as u128,
                max_change_denominator: BASE_FEE_MAX_CHANGE_DENOMINATOR as u128,
            };
            calc_next_block_base_fee(parent.gas_used as u128, parent.gas_limit as u128, parent_base_fee as u128, params)
                as u64
        }
    }
}

/// Builds the first block of a chain.
pub fn genesis_header(fork: Fork, overrides: HeaderOverrides) -> BlockHeader {
    let gas_limit = overrides.gas_limit.unwrap_or(GENESIS_GAS_LIMIT);
    let difficulty = if fork >= Fork::Paris { POST_MERGE_DIFFICULTY } else { U256::ZERO };
    let nonce = if fork >= Fork::Paris { POST_MERGE_NONCE } else { B64::ZERO };

    BlockHeader {
        parent_hash: GENESIS_PARENT_HASH,
        ommers_hash: EMPTY_OMMERS_HASH,
        beneficiary: overrides.beneficiary,
        state_root: overrides.state_root.unwrap_or(EMPTY_ROOT_HASH),
        transactions_root: overrides.transactions_root.unwrap_or(EMPTY_ROOT_HASH),
        receipts_root: overrides.receipts_root.unwrap_or(EMPTY_ROOT_HASH),
        logs_bloom: overrides.logs_bloom.unwrap_or(Bloom::ZERO),
        difficulty,
        number: 0,
        gas_limit,
        gas_used: overrides.gas_used,
        timestamp: overrides.timestamp.unwrap_or(0),
        extra_data: overrides.extra_data,
        mix_hash: overrides.mix_hash.unwrap_or(B256::ZERO),
        nonce,
        base_fee_per_gas: (fork >= Fork::London).then_some(INITIAL_BASE_FEE),
        withdrawals_root: (fork >= Fork::Shanghai).then(|| overrides.withdrawals_root.unwrap_or(EMPTY_ROOT_HASH)),
        blob_gas_used: (fork >= Fork::Cancun).then(|| overrides.blob_gas_used.unwrap_or(0)),
        excess_blob_gas: (fork >= Fork::Cancun).then_some(0),
        parent_beacon_block_root: (fork >= Fork::Cancun)
            .then(|| overrides.parent_beacon_block_root.unwrap_or(B256::ZERO)),
    }
}

/// Builds the next header in sequence from `parent`, under `fork`'s rules.
///
/// Mirrors each fork's header-construction chain: difficulty and the PoW/PoS
/// mix fields inherit [ward_forks::compute_difficulty]'s verdict, the gas
/// limit target decays/grows toward [GENESIS_GAS_LIMIT] unless the caller
/// pins one, and the London/Shanghai/Cancun-introduced fields are populated
/// only once their fork is active.
pub fn create_header_from_parent(fork: Fork, parent: &BlockHeader, overrides: HeaderOverrides) -> BlockHeader {
    let number = parent.number + 1;
    let timestamp = overrides.timestamp.unwrap_or(parent.timestamp + 1);

    let gas_limit = overrides.gas_limit.unwrap_or_else(|| {
        let target = compute_gas_limit(parent.gas_limit, parent.gas_used, GENESIS_GAS_LIMIT);
        // the first London block doubles the pre-London parent's limit so the
        // new 50%-target baseline lands back where the old limit used to sit.
        if fork >= Fork::London && parent_is_pre_london(parent) {
            parent.gas_limit.saturating_mul(ELASTICITY_MULTIPLIER)
        } else {
            target
        }
    });

    let parent_has_ommers = parent.ommers_hash != EMPTY_OMMERS_HASH;
    let difficulty = compute_difficulty(fork, parent.difficulty, parent.timestamp, parent_has_ommers, number, timestamp);

    let mix_hash = if fork >= Fork::Paris {
        overrides.mix_hash.unwrap_or(parent.mix_hash)
    } else {
        overrides.mix_hash.unwrap_or(B256::ZERO)
    };
    let nonce = if fork >= Fork::Paris { POST_MERGE_NONCE } else { B64::ZERO };

    let base_fee_per_gas = (fork >= Fork::London).then(|| next_base_fee(parent));

    let excess_blob_gas = (fork >= Fork::Cancun).then(|| {
        let parent_excess = parent.excess_blob_gas.unwrap_or(0);
        let parent_used = parent.blob_gas_used.unwrap_or(0);
        calc_excess_blob_gas(parent_excess as u128, parent_used as u128) as u64
    });

    BlockHeader {
        parent_hash: parent.hash_slow(),
        ommers_hash: EMPTY_OMMERS_HASH,
        beneficiary: overrides.beneficiary,
        state_root: overrides.state_root.unwrap_or(parent.state_root),
        transactions_root: overrides.transactions_root.unwrap_or(EMPTY_ROOT_HASH),
        receipts_root: overrides.receipts_root.unwrap_or(EMPTY_ROOT_HASH),
        logs_bloom: overrides.logs_bloom.unwrap_or(Bloom::ZERO),
        difficulty,
        number,
        gas_limit,
        gas_used: overrides.gas_used,
        timestamp,
        extra_data: overrides.extra_data,
        mix_hash,
        nonce,
        base_fee_per_gas,
        withdrawals_root: (fork >= Fork::Shanghai).then(|| overrides.withdrawals_root.unwrap_or(EMPTY_ROOT_HASH)),
        blob_gas_used: (fork >= Fork::Cancun).then(|| overrides.blob_gas_used.unwrap_or(0)),
        excess_blob_gas,
        parent_beacon_block_root: (fork >= Fork::Cancun)
            .then(|| overrides.parent_beacon_block_root.unwrap_or(B256::ZERO)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frontier_parent() -> BlockHeader {
        BlockHeader { number: 5, gas_limit: 10_000_000, gas_used: 0, timestamp: 1_000, ..BlockHeader::default() }
    }

    #[test]
    fn child_number_and_parent_hash_chain_correctly() {
        let parent = frontier_parent();
        let child = create_header_from_parent(Fork::Frontier, &parent, HeaderOverrides::default());
        assert_eq!(child.number, 6);
        assert_eq!(child.parent_hash, parent.hash_slow());
    }

    #[test]
    fn pre_paris_header_has_no_base_fee() {
        let parent = frontier_parent();
        let child = create_header_from_parent(Fork::Berlin, &parent, HeaderOverrides::default());
        assert!(child.base_fee_per_gas.is_none());
    }

    #[test]
    fn first_london_block_doubles_pre_london_parent_gas_limit() {
        let parent = frontier_parent();
        let child = create_header_from_parent(Fork::London, &parent, HeaderOverrides::default());
        assert_eq!(child.gas_limit, parent.gas_limit * ELASTICITY_MULTIPLIER);
        assert_eq!(child.base_fee_per_gas, Some(INITIAL_BASE_FEE));
    }

    #[test]
    fn base_fee_is_unchanged_when_parent_used_exactly_the_target() {
        let parent = BlockHeader {
            number: 100,
            gas_limit: 20_000_000,
            gas_used: 10_000_000,
            timestamp: 1_000,
            base_fee_per_gas: Some(1_000_000_000),
            ..BlockHeader::default()
        };
        let child = create_header_from_parent(Fork::London, &parent, HeaderOverrides::default());
        assert_eq!(child.base_fee_per_gas, Some(1_000_000_000));
    }

    #[test]
    fn base_fee_rises_when_parent_used_more_than_target() {
        let parent = BlockHeader {
            number: 100,
            gas_limit: 20_000_000,
            gas_used: 20_000_000,
            timestamp: 1_000,
            base_fee_per_gas: Some(1_000_000_000),
            ..BlockHeader::default()
        };
        let child = create_header_from_parent(Fork::London, &parent, HeaderOverrides::default());
        assert!(child.base_fee_per_gas.unwrap() > 1_000_000_000);
    }

    #[test]
    fn paris_header_carries_pos_sentinels() {
        let parent = BlockHeader {
            number: 200,
            gas_limit: 20_000_000,
            timestamp: 2_000,
            base_fee_per_gas: Some(1_000_000_000),
            mix_hash: B256::repeat_byte(9),
            ..BlockHeader::default()
        };
        let child = create_header_from_parent(Fork::Paris, &parent, HeaderOverrides::default());
        assert!(child.has_pos_sentinels());
        assert_eq!(child.mix_hash, parent.mix_hash);
    }

    #[test]
    fn cancun_header_carries_blob_fields() {
        let parent = BlockHeader {
            number: 300,
            gas_limit: 20_000_000,
            timestamp: 3_000,
            base_fee_per_gas: Some(1_000_000_000),
            excess_blob_gas: Some(0),
            blob_gas_used: Some(0),
            ..BlockHeader::default()
        };
        let child = create_header_from_parent(Fork::Cancun, &parent, HeaderOverrides::default());
        assert_eq!(child.excess_blob_gas, Some(0));
        assert_eq!(child.blob_gas_used, Some(0));
    }

    #[test]
    fn genesis_header_pre_paris_has_pow_defaults() {
        let header = genesis_header(Fork::Frontier, HeaderOverrides { gas_limit: Some(5_000_000), ..Default::default() });
        assert_eq!(header.number, 0);
        assert_eq!(header.parent_hash, GENESIS_PARENT_HASH);
        assert_eq!(header.gas_limit, 5_000_000);
        assert!(header.base_fee_per_gas.is_none());
    }

    #[test]
    fn genesis_header_post_paris_has_pos_sentinels() {
        let header = genesis_header(Fork::Shanghai, HeaderOverrides::default());
        assert!(header.has_pos_sentinels());
        assert!(header.withdrawals_root.is_some());
    }
}
