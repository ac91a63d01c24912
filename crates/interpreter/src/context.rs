//! Read-only block and transaction environment visible to opcodes.

use alloy_primitives::{Address, B256, U256};
use ward_forks::{Fork, GasSchedule};

/// Everything about the enclosing block and transaction that opcodes can
/// observe, but never mutate. Shared (via `&ExecutionContext`) across every
/// frame of a single transaction.
#[derive(Clone)]
pub struct ExecutionContext<'a> {
    /// Active hard fork, pins both opcode availability and gas pricing.
    pub fork: Fork,
    /// Gas schedule for `fork`, cached so frames don't recompute it per opcode.
    pub gas_schedule: GasSchedule,
    /// `COINBASE`.
    pub coinbase: Address,
    /// `TIMESTAMP`.
    pub timestamp: u64,
    /// `NUMBER`.
    pub block_number: u64,
    /// `DIFFICULTY` pre-Paris, `PREVRANDAO` from Paris on.
    pub difficulty_or_prevrandao: U256,
    /// `GASLIMIT`.
    pub block_gas_limit: u64,
    /// `CHAINID`.
    pub chain_id: u64,
    /// `BASEFEE`, zero pre-London.
    pub base_fee_per_gas: U256,
    /// `BLOBBASEFEE`, zero pre-Cancun.
    pub blob_base_fee: U256,
    /// `ORIGIN`.
    pub origin: Address,
    /// `GASPRICE`: the effective gas price paid by this transaction.
    pub gas_price: U256,
    /// `BLOBHASH` operand source: the transaction's blob versioned hashes.
    pub blob_hashes: Vec<B256>,
    /// Last 256 block hashes for `BLOCKHASH`, most recent last.
    pub recent_block_hashes: Vec<B256>,
    /// KZG trusted setup backing the point-evaluation precompile (`0x0a`).
    /// Shared across every frame since loading it is expensive; unused
    /// before Cancun.
    pub kzg_settings: &'a c_kzg::KzgSettings,
}

impl<'a> ExecutionContext<'a> {
    /// `BLOCKHASH(number)`: zero if `number` is outside the last 256 blocks
    /// or is not strictly less than the current block.
    pub fn block_hash(&self, number: u64) -> B256 {
        if number >= self.block_number {
            return B256::ZERO;
        }
        let distance = self.block_number - number;
        if distance == 0 || distance > 256 || distance as usize > self.recent_block_hashes.len() {
            return B256::ZERO;
        }
        self.recent_block_hashes[self.recent_block_hashes.len() - distance as usize]
    }

    /// `BLOBHASH(index)`: zero bytes if `index` is out of range.
    pub fn blob_hash(&self, index: usize) -> B256 {
        self.blob_hashes.get(index).copied().unwrap_or(B256::ZERO)
    }
}
