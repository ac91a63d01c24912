//! The genesis params dict: the handful of fields a chain's operator
//! supplies explicitly to seed block zero, with every other header field
//! filled in by convention.

use crate::header::{genesis_header, HeaderOverrides};
use alloy_primitives::{Address, Bytes, B256, B64, U256};
use ward_forks::Fork;
use ward_primitives::header::BlockHeader;

/// The recognized genesis configuration keys.
///
/// `state_root` is left `None` when it should be computed from the genesis
/// account allocations rather than supplied directly.
#[derive(Clone, Debug)]
pub struct GenesisParams {
    /// Address credited with the genesis block reward (usually the zero address).
    pub coinbase: Address,
    /// State root; if absent, the caller computes it from genesis allocations
    /// before calling [Self::header].
    pub state_root: Option<B256>,
    /// Genesis difficulty; `0` for a chain launched post-Paris.
    pub difficulty: U256,
    /// Genesis gas limit.
    pub gas_limit: u64,
    /// Genesis timestamp.
    pub timestamp: u64,
    /// Opaque miner data.
    pub extra_data: Bytes,
    /// Genesis mix hash.
    pub mix_hash: B256,
    /// Genesis nonce.
    pub nonce: B64,
}

impl Default for GenesisParams {
    fn default() -> Self {
        Self {
            coinbase: Address::ZERO,
            state_root: None,
            difficulty: U256::ZERO,
            gas_limit: crate::header::GENESIS_GAS_LIMIT,
            timestamp: 0,
            extra_data: Bytes::new(),
            mix_hash: B256::ZERO,
            nonce: B64::ZERO,
        }
    }
}

impl GenesisParams {
    /// Builds the genesis header for `fork`.
    ///
    /// `difficulty` and `nonce` are honored verbatim pre-Paris; from Paris
    /// onward the proof-of-stake sentinels take precedence regardless of
    /// what was supplied, matching the rest of the chain's post-merge headers.
    pub fn header(&self, fork: Fork) -> BlockHeader {
        let overrides = HeaderOverrides {
            beneficiary: self.coinbase,
            state_root: self.state_root,
            gas_limit: Some(self.gas_limit),
            timestamp: Some(self.timestamp),
            extra_data: self.extra_data.clone(),
            mix_hash: Some(self.mix_hash),
            ..Default::default()
        };
        let mut header = genesis_header(fork, overrides);
        if fork < Fork::Paris {
            header.difficulty = self.difficulty;
            header.nonce = self.nonce;
        }
        header
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frontier_genesis_honors_supplied_difficulty_and_nonce() {
        let params = GenesisParams { difficulty: U256::from(17_179_869_184u64), nonce: B64::from(42u64), ..Default::default() };
        let header = params.header(Fork::Frontier);
        assert_eq!(header.difficulty, U256::from(17_179_869_184u64));
        assert_eq!(header.nonce, B64::from(42u64));
        assert_eq!(header.number, 0);
    }

    #[test]
    fn post_paris_genesis_ignores_pow_fields_for_pos_sentinels() {
        let params = GenesisParams { difficulty: U256::from(5), ..Default::default() };
        let header = params.header(Fork::Shanghai);
        assert!(header.has_pos_sentinels());
    }
}
