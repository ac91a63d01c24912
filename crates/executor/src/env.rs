//! The block-level environment a [`crate::TransactionExecutor`] runs transactions against.

use alloy_primitives::{Address, B256, U256};
use ward_forks::Fork;

/// Everything about the enclosing block that every transaction in it shares,
/// independent of any one transaction's fields.
///
/// Built via [`BlockContextBuilder`], mirroring the teacher's builder-style
/// construction of its own block environment.
#[derive(Clone)]
pub struct BlockContext<'a> {
    /// Active hard fork.
    pub fork: Fork,
    /// Block beneficiary (`COINBASE`).
    pub coinbase: Address,
    /// Block timestamp.
    pub timestamp: u64,
    /// Block number.
    pub number: u64,
    /// `DIFFICULTY` pre-Paris, `PREVRANDAO` from Paris on.
    pub difficulty_or_prevrandao: U256,
    /// Total gas all transactions in the block may consume.
    pub gas_limit: u64,
    /// Chain id.
    pub chain_id: u64,
    /// EIP-1559 base fee, `0` pre-London.
    pub base_fee_per_gas: u64,
    /// EIP-4844 blob base fee, `0` pre-Cancun.
    pub blob_base_fee: U256,
    /// Last 256 block hashes, most recent last, for `BLOCKHASH`.
    pub recent_block_hashes: Vec<B256>,
    /// KZG trusted setup backing the point-evaluation precompile.
    pub kzg_settings: &'a c_kzg::KzgSettings,
}

/// Builder for [`BlockContext`]; every field has a sensible zero/empty
/// default except `kzg_settings`, which must be supplied explicitly.
pub struct BlockContextBuilder<'a> {
    fork: Fork,
    coinbase: Address,
    timestamp: u64,
    number: u64,
    difficulty_or_prevrandao: U256,
    gas_limit: u64,
    chain_id: u64,
    base_fee_per_gas: u64,
    blob_base_fee: U256,
    recent_block_hashes: Vec<B256>,
    kzg_settings: &'a c_kzg::KzgSettings,
}

impl<'a> BlockContextBuilder<'a> {
    /// Starts a builder for `fork`, with every other field defaulted to zero/empty.
    pub fn new(fork: Fork, kzg_settings: &'a c_kzg::KzgSettings) -> Self {
        Self {
            fork,
            coinbase: Address::ZERO,
            timestamp: 0,
            number: 0,
            difficulty_or_prevrandao: U256::ZERO,
            gas_limit: 30_000_000,
            chain_id: 1,
            base_fee_per_gas: 0,
            blob_base_fee: U256::ZERO,
            recent_block_hashes: Vec::new(),
            kzg_settings,
        }
    }

    /// Sets the block beneficiary.
    pub fn coinbase(mut self, coinbase: Address) -> Self {
        self.coinbase = coinbase;
        self
    }

    /// Sets the block timestamp and number.
    pub fn block(mut self, number: u64, timestamp: u64) -> Self {
        self.number = number;
        self.timestamp = timestamp;
        self
    }

    /// Sets `DIFFICULTY`/`PREVRANDAO`.
    pub fn difficulty_or_prevrandao(mut self, value: U256) -> Self {
        self.difficulty_or_prevrandao = value;
        self
    }

    /// Sets the block gas limit.
    pub fn gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = gas_limit;
        self
    }

    /// Sets the chain id.
    pub fn chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = chain_id;
        self
    }

    /// Sets the EIP-1559 base fee.
    pub fn base_fee_per_gas(mut self, base_fee: u64) -> Self {
        self.base_fee_per_gas = base_fee;
        self
    }

    /// Sets the EIP-4844 blob base fee.
    pub fn blob_base_fee(mut self, blob_base_fee: U256) -> Self {
        self.blob_base_fee = blob_base_fee;
        self
    }

    /// Sets the last-256-blocks window for `BLOCKHASH`, most recent last.
    pub fn recent_block_hashes(mut self, hashes: Vec<B256>) -> Self {
        self.recent_block_hashes = hashes;
        self
    }

    /// Finishes the builder.
    pub fn build(self) -> BlockContext<'a> {
        BlockContext {
            fork: self.fork,
            coinbase: self.coinbase,
            timestamp: self.timestamp,
            number: self.number,
            difficulty_or_prevrandao: self.difficulty_or_prevrandao,
            gas_limit: self.gas_limit,
            chain_id: self.chain_id,
            base_fee_per_gas: self.base_fee_per_gas,
            blob_base_fee: self.blob_base_fee,
            recent_block_hashes: self.recent_block_hashes,
            kzg_settings: self.kzg_settings,
        }
    }
}
