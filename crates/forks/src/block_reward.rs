//! Static block rewards.
//!
//! Proof-of-work mining rewards; meaningless post-Paris since new ether
//! issuance moved to the consensus layer. Kept for pre-merge block
//! construction and for faithfully replaying historical blocks.

use crate::fork::Fork;
use alloy_primitives::U256;

const ETHER: u128 = 1_000_000_000_000_000_000;

/// The static block reward in wei for the miner of a block at `fork`.
/// `U256::ZERO` from [Fork::Paris] onward.
pub fn block_reward(fork: Fork) -> U256 {
    if fork >= Fork::Paris {
        U256::ZERO
    } else if fork >= Fork::Constantinople {
        U256::from(2 * ETHER)
    } else if fork >= Fork::Byzantium {
        U256::from(3 * ETHER)
    } else {
        U256::from(5 * ETHER)
    }
}

/// The ommer (uncle) inclusion reward paid to the block that references an
/// ommer `ommer_distance` blocks behind it, and the ommer's own reward.
/// Both scale with the static [block_reward]; ommers do not exist once
/// proof-of-stake removes block production races (Paris+), so callers
/// should not invoke this for post-merge blocks.
pub fn ommer_inclusion_reward(fork: Fork) -> U256 {
    block_reward(fork) / U256::from(32)
}

/// The reward paid to an ommer itself, scaled by how many blocks behind the
/// including block it is (`distance` in `1..=6`).
pub fn ommer_reward(fork: Fork, distance: u64) -> U256 {
    let reward = block_reward(fork);
    (reward * U256::from(8 - distance.min(8))) / U256::from(8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reward_steps_down_across_forks() {
        assert_eq!(block_reward(Fork::Frontier), U256::from(5 * ETHER));
        assert_eq!(block_reward(Fork::Byzantium), U256::from(3 * ETHER));
        assert_eq!(block_reward(Fork::Constantinople), U256::from(2 * ETHER));
        assert_eq!(block_reward(Fork::Paris), U256::ZERO);
    }

    #[test]
    fn ommer_reward_decreases_with_distance() {
        let close = ommer_reward(Fork::Frontier, 1);
        let far = ommer_reward(Fork::Frontier, 6);
        assert!(close > far);
    }
}
