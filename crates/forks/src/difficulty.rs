//! Per-fork block difficulty formulas, including the difficulty-bomb delays.

use crate::fork::Fork;
use alloy_primitives::U256;

/// Number of blocks the difficulty bomb is artificially delayed by, as of a
/// given fork (cumulative across Byzantium/Constantinople/Muir
/// Glacier/London/Arrow Glacier/Gray Glacier).
fn bomb_delay_blocks(fork: Fork) -> u64 {
    if fork >= Fork::GrayGlacier {
        11_400_000
    } else if fork >= Fork::ArrowGlacier {
        10_700_000
    } else if fork >= Fork::London {
        9_700_000
    } else if fork >= Fork::MuirGlacier {
        9_000_000
    } else if fork >= Fork::Constantinople {
        5_000_000
    } else {
        0
    }
}

/// Computes the block difficulty for `fork` given the parent header's
/// difficulty, timestamp, and whether it has ommers, plus this block's own
/// number and timestamp.
///
/// Returns `U256::ZERO` from [Fork::Paris] onward: difficulty is replaced by
/// `PREVRANDAO` and the header's `difficulty` field is a fixed zero sentinel.
pub fn compute_difficulty(
    fork: Fork,
    parent_difficulty: U256,
    parent_timestamp: u64,
    parent_has_ommers: bool,
    block_number: u64,
    timestamp: u64,
) -> U256 {
    if fork >= Fork::Paris {
        return U256::ZERO;
    }

    let elapsed = timestamp.saturating_sub(parent_timestamp) as i64;

    let sigma = if fork >= Fork::Byzantium {
        let y = if parent_has_ommers { 2 } else { 1 };
        (y - elapsed / 9).max(-99)
    } else if fork >= Fork::Homestead {
        (1 - elapsed / 10).max(-99)
    } else {
        // Frontier: step function, not a linear adjustment.
        if elapsed < 13 {
            1
        } else {
            -1
        }
    };

    let adjustment = parent_difficulty / U256::from(2048) * U256::from(sigma.unsigned_abs());
    let mut difficulty = if sigma >= 0 { parent_difficulty + adjustment } else { parent_difficulty.saturating_sub(adjustment) };

    const MIN_DIFFICULTY: u64 = 131_072;
    if difficulty < U256::from(MIN_DIFFICULTY) {
        difficulty = U256::from(MIN_DIFFICULTY);
    }

    let bomb_block = block_number.saturating_sub(bomb_delay_blocks(fork));
    let fake_epoch = bomb_block / 100_000;
    if fake_epoch >= 2 {
        let exponent = (fake_epoch - 2) as u32;
        if exponent < 256 {
            difficulty += U256::from(2u64).pow(U256::from(exponent));
        }
    }

    difficulty
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paris_and_later_have_zero_difficulty() {
        assert_eq!(compute_difficulty(Fork::Paris, U256::from(1_000_000), 0, false, 1, 13), U256::ZERO);
    }

    #[test]
    fn difficulty_never_drops_below_minimum() {
        let result = compute_difficulty(Fork::Frontier, U256::from(100_000), 0, false, 1, 1000);
        assert!(result >= U256::from(131_072u64));
    }

    #[test]
    fn faster_blocks_increase_difficulty_post_homestead() {
        let slow = compute_difficulty(Fork::Homestead, U256::from(10_000_000), 0, false, 1, 20);
        let fast = compute_difficulty(Fork::Homestead, U256::from(10_000_000), 0, false, 1, 5);
        assert!(fast > slow);
    }

    #[test]
    fn later_bomb_delay_produces_lower_difficulty_contribution_at_same_block() {
        let byzantium =
            compute_difficulty(Fork::Byzantium, U256::from(10_000_000), 0, false, 5_500_000, 10);
        let muir_glacier =
            compute_difficulty(Fork::MuirGlacier, U256::from(10_000_000), 0, false, 5_500_000, 10);
        assert!(muir_glacier <= byzantium);
    }
}
