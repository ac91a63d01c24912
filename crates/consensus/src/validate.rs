//! Checking a header against its parent and the rules of the fork active at
//! its block number.

use crate::errors::{ConsensusError, ConsensusResult};
use crate::gas_limit::gas_limit_bounds;
use crate::header::next_base_fee;
use alloy_eips::eip4844::calc_excess_blob_gas;
use ward_forks::{compute_difficulty, Fork};
use ward_primitives::header::{BlockHeader, EMPTY_OMMERS_HASH};

/// Maximum length of the miner-supplied `extra_data` field, post-Homestead.
pub const MAXIMUM_EXTRA_DATA_LENGTH: usize = 32;

/// Checks `header` against `parent` under `fork`'s rules.
///
/// Validates numbering, timestamp monotonicity, the gas-limit adjustment
/// band, `gas_used <= gas_limit`, the `extra_data` length cap, the
/// difficulty formula, base-fee evolution (London onward), blob-gas
/// evolution (Cancun onward), and the proof-of-stake sentinel fields
/// (Paris onward).
pub fn validate_header(fork: Fork, header: &BlockHeader, parent: &BlockHeader) -> ConsensusResult<()> {
    if header.number != parent.number + 1 {
        return Err(ConsensusError::NonSequentialNumber { parent: parent.number, actual: header.number });
    }
    if header.timestamp <= parent.timestamp {
        return Err(ConsensusError::TimestampNotIncreasing { parent: parent.timestamp, actual: header.timestamp });
    }

    // The gas-limit bound check always uses the plain, undoubled band around
    // the parent's limit, even across the London transition: only the
    // *default target* a new header is built with doubles there, not the
    // range a proposed limit is checked against.
    let (lower, upper) = gas_limit_bounds(parent.gas_limit);
    if header.gas_limit < lower || header.gas_limit > upper {
        return Err(ConsensusError::GasLimitOutOfBounds { lower, upper, actual: header.gas_limit });
    }

    if header.gas_used > header.gas_limit {
        return Err(ConsensusError::GasUsedExceedsLimit { limit: header.gas_limit, used: header.gas_used });
    }

    if header.extra_data.len() > MAXIMUM_EXTRA_DATA_LENGTH {
        return Err(ConsensusError::ExtraDataTooLong {
            maximum: MAXIMUM_EXTRA_DATA_LENGTH,
            actual: header.extra_data.len(),
        });
    }

    let parent_has_ommers = parent.ommers_hash != EMPTY_OMMERS_HASH;
    let expected_difficulty =
        compute_difficulty(fork, parent.difficulty, parent.timestamp, parent_has_ommers, header.number, header.timestamp);
    if header.difficulty != expected_difficulty {
        return Err(ConsensusError::WrongDifficulty { expected: expected_difficulty, actual: header.difficulty });
    }

    if fork >= Fork::London {
        let actual = header.base_fee_per_gas.ok_or(ConsensusError::MissingBaseFee)?;
        let expected = next_base_fee(parent);
        if actual != expected {
            return Err(ConsensusError::WrongBaseFee { expected, actual });
        }
    } else if header.base_fee_per_gas.is_some() {
        return Err(ConsensusError::UnexpectedBaseFee);
    }

    if fork >= Fork::Shanghai && header.withdrawals_root.is_none() {
        return Err(ConsensusError::MissingWithdrawalsRoot);
    }

    if fork >= Fork::Cancun {
        header.blob_gas_used.ok_or(ConsensusError::MissingBlobGasFields)?;
        let actual_excess = header.excess_blob_gas.ok_or(ConsensusError::MissingBlobGasFields)?;
        let parent_excess = parent.excess_blob_gas.unwrap_or(0);
        let parent_used = parent.blob_gas_used.unwrap_or(0);
        let expected_excess = calc_excess_blob_gas(parent_excess as u128, parent_used as u128) as u64;
        if actual_excess != expected_excess {
            return Err(ConsensusError::WrongExcessBlobGas { expected: expected_excess, actual: actual_excess });
        }
    }

    if fork >= Fork::Paris && !header.has_pos_sentinels() {
        return Err(ConsensusError::MissingPoSSentinels);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::U256;

    fn valid_child_of(fork: Fork, parent: &BlockHeader) -> BlockHeader {
        crate::header::create_header_from_parent(fork, parent, Default::default())
    }

    #[test]
    fn accepts_a_correctly_built_child() {
        let parent = BlockHeader { number: 10, gas_limit: 10_000_000, timestamp: 1_000, ..BlockHeader::default() };
        let child = valid_child_of(Fork::Byzantium, &parent);
        assert!(validate_header(Fork::Byzantium, &child, &parent).is_ok());
    }

    #[test]
    fn rejects_non_sequential_number() {
        let parent = BlockHeader { number: 10, gas_limit: 10_000_000, timestamp: 1_000, ..BlockHeader::default() };
        let mut child = valid_child_of(Fork::Byzantium, &parent);
        child.number = 12;
        assert!(matches!(
            validate_header(Fork::Byzantium, &child, &parent),
            Err(ConsensusError::NonSequentialNumber { .. })
        ));
    }

    #[test]
    fn rejects_non_increasing_timestamp() {
        let parent = BlockHeader { number: 10, gas_limit: 10_000_000, timestamp: 1_000, ..BlockHeader::default() };
        let mut child = valid_child_of(Fork::Byzantium, &parent);
        child.timestamp = parent.timestamp;
        assert!(matches!(
            validate_header(Fork::Byzantium, &child, &parent),
            Err(ConsensusError::TimestampNotIncreasing { .. })
        ));
    }

    #[test]
    fn rejects_gas_limit_jump_past_the_adjustment_band() {
        let parent = BlockHeader { number: 10, gas_limit: 10_000_000, timestamp: 1_000, ..BlockHeader::default() };
        let mut child = valid_child_of(Fork::Byzantium, &parent);
        child.gas_limit = parent.gas_limit * 2;
        assert!(matches!(
            validate_header(Fork::Byzantium, &child, &parent),
            Err(ConsensusError::GasLimitOutOfBounds { .. })
        ));
    }

    #[test]
    fn rejects_gas_used_above_limit() {
        let parent = BlockHeader { number: 10, gas_limit: 10_000_000, timestamp: 1_000, ..BlockHeader::default() };
        let mut child = valid_child_of(Fork::Byzantium, &parent);
        child.gas_used = child.gas_limit + 1;
        assert!(matches!(
            validate_header(Fork::Byzantium, &child, &parent),
            Err(ConsensusError::GasUsedExceedsLimit { .. })
        ));
    }

    #[test]
    fn rejects_wrong_difficulty() {
        let parent = BlockHeader { number: 10, gas_limit: 10_000_000, timestamp: 1_000, ..BlockHeader::default() };
        let mut child = valid_child_of(Fork::Byzantium, &parent);
        child.difficulty += U256::from(1);
        assert!(matches!(
            validate_header(Fork::Byzantium, &child, &parent),
            Err(ConsensusError::WrongDifficulty { .. })
        ));
    }

    #[test]
    fn rejects_missing_base_fee_post_london() {
        let parent = BlockHeader {
            number: 10,
            gas_limit: 10_000_000,
            timestamp: 1_000,
            base_fee_per_gas: Some(1_000_000_000),
            ..BlockHeader::default()
        };
        let mut child = valid_child_of(Fork::London, &parent);
        child.base_fee_per_gas = None;
        assert!(matches!(validate_header(Fork::London, &child, &parent), Err(ConsensusError::MissingBaseFee)));
    }

    #[test]
    fn rejects_unexpected_base_fee_pre_london() {
        let parent = BlockHeader { number: 10, gas_limit: 10_000_000, timestamp: 1_000, ..BlockHeader::default() };
        let mut child = valid_child_of(Fork::Berlin, &parent);
        child.base_fee_per_gas = Some(1_000_000_000);
        assert!(matches!(validate_header(Fork::Berlin, &child, &parent), Err(ConsensusError::UnexpectedBaseFee)));
    }

    #[test]
    fn rejects_missing_pos_sentinels_post_paris() {
        let parent = BlockHeader {
            number: 10,
            gas_limit: 10_000_000,
            timestamp: 1_000,
            base_fee_per_gas: Some(1_000_000_000),
            ..BlockHeader::default()
        };
        let mut child = valid_child_of(Fork::Paris, &parent);
        child.nonce = alloy_primitives::B64::from(1u64);
        assert!(matches!(validate_header(Fork::Paris, &child, &parent), Err(ConsensusError::MissingPoSSentinels)));
    }

    #[test]
    fn rejects_extra_data_past_32_bytes() {
        let parent = BlockHeader { number: 10, gas_limit: 10_000_000, timestamp: 1_000, ..BlockHeader::default() };
        let mut child = valid_child_of(Fork::Byzantium, &parent);
        child.extra_data = alloy_primitives::Bytes::from(vec![0u8; 33]);
        assert!(matches!(
            validate_header(Fork::Byzantium, &child, &parent),
            Err(ConsensusError::ExtraDataTooLong { .. })
        ));
    }

    #[test]
    fn rejects_wrong_excess_blob_gas_post_cancun() {
        let parent = BlockHeader {
            number: 10,
            gas_limit: 10_000_000,
            timestamp: 1_000,
            base_fee_per_gas: Some(1_000_000_000),
            excess_blob_gas: Some(0),
            blob_gas_used: Some(0),
            ..BlockHeader::default()
        };
        let mut child = valid_child_of(Fork::Cancun, &parent);
        child.excess_blob_gas = Some(999);
        assert!(matches!(
            validate_header(Fork::Cancun, &child, &parent),
            Err(ConsensusError::WrongExcessBlobGas { .. })
        ));
    }
}
