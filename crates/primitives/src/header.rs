//! The [BlockHeader] type and its well-known constant hashes.

use alloy_primitives::{keccak256, Address, Bloom, Bytes, B256, B64, U256};
use alloy_rlp::{RlpDecodable, RlpEncodable};

/// Root hash of an empty Merkle-Patricia trie (`rlp(Vec::<u8>::new())` hashed).
pub const EMPTY_ROOT_HASH: B256 = B256::new([
    0x56, 0xe8, 0x1f, 0x17, 0x1b, 0xcc, 0x55, 0xa6, 0xff, 0x83, 0x45, 0xe6, 0x92, 0xc0, 0xf8, 0x6e,
    0x5b, 0x48, 0xe0, 0x1b, 0x99, 0x6c, 0xad, 0xc0, 0x01, 0x62, 0x2f, 0xb5, 0xe3, 0x63, 0xb4, 0x21,
]);

/// `keccak256(rlp([]))`, the ommers hash of a block with no uncles.
pub const EMPTY_OMMERS_HASH: B256 = B256::new([
    0x1d, 0xcc, 0x4d, 0xe8, 0xde, 0xc7, 0x5d, 0x7a, 0xab, 0x85, 0xb5, 0x67, 0xb6, 0xcc, 0xd4, 0x1a,
    0xd3, 0x12, 0x45, 0x1b, 0x94, 0x8a, 0x74, 0x13, 0xf0, 0xa1, 0x42, 0xfd, 0x40, 0xd4, 0x93, 0x47,
]);

/// Sentinel `parent_hash` used by a chain's genesis block.
pub const GENESIS_PARENT_HASH: B256 = B256::ZERO;

/// `INITIAL_BASE_FEE` from EIP-1559, used as the synthetic parent base fee for
/// the first London block (whose real parent predates EIP-1559).
pub const INITIAL_BASE_FEE: u64 = 1_000_000_000;

/// A block header.
///
/// Fields past `nonce` were added by successive forks and are RLP-encoded as
/// a trailing run of `Option<T>`s: once one is absent, every field after it
/// must also be absent (`alloy_rlp`'s `#[rlp(trailing)]` enforces exactly
/// this "monotonic suffix" shape when encoding/decoding).
#[derive(Clone, Debug, PartialEq, Eq, RlpEncodable, RlpDecodable)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[rlp(trailing)]
pub struct BlockHeader {
    /// Hash of the parent block's header.
    pub parent_hash: B256,
    /// Hash of the list of ommer (uncle) headers; [EMPTY_OMMERS_HASH] post-Paris.
    pub ommers_hash: B256,
    /// Address that receives the block reward and transaction fees.
    pub beneficiary: Address,
    /// Root of the state trie after applying this block.
    pub state_root: B256,
    /// Root of the trie of this block's transactions.
    pub transactions_root: B256,
    /// Root of the trie of this block's receipts.
    pub receipts_root: B256,
    /// Bloom filter over the logs produced by this block's transactions.
    pub logs_bloom: Bloom,
    /// Proof-of-work difficulty; `0` post-Paris (replaced by `PREVRANDAO` semantics on `mix_hash`).
    pub difficulty: U256,
    /// Block height.
    pub number: u64,
    /// Maximum gas any transaction in this block may consume, summed.
    pub gas_limit: u64,
    /// Total gas used by this block's transactions.
    pub gas_used: u64,
    /// Unix timestamp at which the block was assembled.
    pub timestamp: u64,
    /// Opaque miner-supplied data, length-bounded by the active fork.
    pub extra_data: Bytes,
    /// Pre-Paris: the PoW mix digest. Post-Paris: `PREVRANDAO`, the RANDAO output.
    pub mix_hash: B256,
    /// Pre-Paris: PoW nonce. Post-Paris: the zero sentinel.
    pub nonce: B64,
    /// EIP-1559 base fee per gas, present from London onward.
    pub base_fee_per_gas: Option<u64>,
    /// EIP-4895 withdrawals trie root, present from Shanghai onward.
    pub withdrawals_root: Option<B256>,
    /// EIP-4844 total blob gas used by this block, present from Cancun onward.
    pub blob_gas_used: Option<u64>,
    /// EIP-4844 rolling excess blob gas, present from Cancun onward.
    pub excess_blob_gas: Option<u64>,
    /// EIP-4788 beacon chain block root, present from Cancun onward.
    pub parent_beacon_block_root: Option<B256>,
}

impl Default for BlockHeader {
    fn default() -> Self {
        Self {
            parent_hash: GENESIS_PARENT_HASH,
            ommers_hash: EMPTY_OMMERS_HASH,
            beneficiary: Address::ZERO,
            state_root: EMPTY_ROOT_HASH,
            transactions_root: EMPTY_ROOT_HASH,
            receipts_root: EMPTY_ROOT_HASH,
            logs_bloom: Bloom::ZERO,
            difficulty: U256::ZERO,
            number: 0,
            gas_limit: 0,
            gas_used: 0,
            timestamp: 0,
            extra_data: Bytes::new(),
            mix_hash: B256::ZERO,
            nonce: B64::ZERO,
            base_fee_per_gas: None,
            withdrawals_root: None,
            blob_gas_used: None,
            excess_blob_gas: None,
            parent_beacon_block_root: None,
        }
    }
}

impl BlockHeader {
    /// Whether this header carries the PoS sentinel values required post-Paris
    /// (`difficulty == 0`, `nonce == 0`, `ommers_hash == EMPTY_OMMERS_HASH`).
    pub fn has_pos_sentinels(&self) -> bool {
        self.difficulty.is_zero() && self.nonce == B64::ZERO && self.ommers_hash == EMPTY_OMMERS_HASH
    }

    /// The RLP-encoding-based block hash, `keccak256(rlp(self))`.
    pub fn hash_slow(&self) -> B256 {
        let mut buf = Vec::with_capacity(alloy_rlp::Encodable::length(self));
        alloy_rlp::Encodable::encode(self, &mut buf);
        keccak256(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn genesis_header_reports_pos_sentinels_when_zeroed() {
        let header = BlockHeader::default();
        assert!(header.has_pos_sentinels());
    }

    #[test]
    fn hash_is_stable_for_identical_headers() {
        let a = BlockHeader::default();
        let b = BlockHeader::default();
        assert_eq!(a.hash_slow(), b.hash_slow());
    }

    #[test]
    fn hash_changes_with_number() {
        let a = BlockHeader::default();
        let b = BlockHeader { number: 1, ..BlockHeader::default() };
        assert_ne!(a.hash_slow(), b.hash_slow());
    }
}
