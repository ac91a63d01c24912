//! Tracking which block numbers are missing from header storage.
//!
//! Headers are not always written in strict ascending order (a node may
//! backfill history after syncing forward from a checkpoint), so the chain
//! keeps an explicit ledger of missing ranges rather than inferring gaps from
//! "highest number seen".

use crate::errors::{ChainError, ChainResult};
use alloy_rlp::{RlpDecodable, RlpEncodable};

/// One inclusive range `[low, high]` of block numbers with no stored header.
#[derive(Clone, Copy, Debug, PartialEq, Eq, RlpEncodable, RlpDecodable)]
pub struct GapRange {
    /// Lowest missing block number in the range.
    pub low: u64,
    /// Highest missing block number in the range.
    pub high: u64,
}

/// The classification [`ChainGaps::fill_gap`] assigns to writing a header at
/// block number `n`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GapFillOutcome {
    /// `n` was already present (outside every gap, below the tip); the write
    /// is a duplicate and the gap ledger is unchanged.
    NoChange,
    /// `n == tip_child`: the chain's contiguous prefix grows by one and the
    /// tip advances.
    TailWrite,
    /// `n > tip_child`: a new gap opens for every block between the old tip
    /// and `n`, and the tip advances past `n`.
    NewGap(GapRange),
    /// `n` was the only missing block in its gap; the gap disappears entirely.
    GapFill(GapRange),
    /// `n` sat at one edge of its gap; the gap shrinks by one from that edge.
    GapShrink(GapRange),
    /// `n` sat strictly inside its gap; the gap splits into two smaller ones.
    GapSplit(GapRange, GapRange),
}

/// Which blocks are missing from header storage, plus the next block number
/// expected to extend the contiguous prefix ending at the tip.
#[derive(Clone, Debug, Default, PartialEq, Eq, RlpEncodable, RlpDecodable)]
pub struct ChainGaps {
    /// Missing ranges, kept sorted and disjoint.
    pub gaps: Vec<GapRange>,
    /// The next block number that extends the contiguous run of present
    /// blocks ending just below it.
    pub tip_child: u64,
}

impl ChainGaps {
    /// A ledger with no missing blocks and a tip starting at `first_block`
    /// (`0` for a chain synced from genesis).
    pub fn starting_at(first_block: u64) -> Self {
        Self { gaps: Vec::new(), tip_child: first_block }
    }

    /// Classifies writing a header at block number `n`, updating the ledger
    /// to match.
    ///
    /// # Errors
    /// Returns [`ChainError::GapTrackingCorrupted`] if `n` falls inside more
    /// than one tracked gap (the gaps are not supposed to overlap) or inside
    /// a gap whose bounds are inverted.
    pub fn fill_gap(&mut self, n: u64) -> ChainResult<GapFillOutcome> {
        let containing: Vec<usize> =
            self.gaps.iter().enumerate().filter(|(_, g)| g.low <= n && n <= g.high).map(|(i, _)| i).collect();

        if containing.len() > 1 {
            return Err(ChainError::GapTrackingCorrupted { number: n });
        }

        if let Some(index) = containing.first().copied() {
            let gap = self.gaps[index];
            if gap.low > gap.high {
                return Err(ChainError::GapTrackingCorrupted { number: n });
            }
            return Ok(self.fill_within_gap(index, gap, n));
        }

        if n < self.tip_child {
            return Ok(GapFillOutcome::NoChange);
        }

        if n == self.tip_child {
            self.tip_child = n + 1;
            return Ok(GapFillOutcome::TailWrite);
        }

        let new_gap = GapRange { low: self.tip_child, high: n - 1 };
        self.gaps.push(new_gap);
        self.gaps.sort_by_key(|g| g.low);
        self.tip_child = n + 1;
        Ok(GapFillOutcome::NewGap(new_gap))
    }

    fn fill_within_gap(&mut self, index: usize, gap: GapRange, n: u64) -> GapFillOutcome {
        if gap.low == gap.high {
            self.gaps.remove(index);
            return GapFillOutcome::GapFill(gap);
        }
        if n == gap.low {
            let shrunk = GapRange { low: gap.low + 1, high: gap.high };
            self.gaps[index] = shrunk;
            return GapFillOutcome::GapShrink(shrunk);
        }
        if n == gap.high {
            let shrunk = GapRange { low: gap.low, high: gap.high - 1 };
            self.gaps[index] = shrunk;
            return GapFillOutcome::GapShrink(shrunk);
        }
        let left = GapRange { low: gap.low, high: n - 1 };
        let right = GapRange { low: n + 1, high: gap.high };
        self.gaps.splice(index..=index, [left, right]);
        GapFillOutcome::GapSplit(left, right)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequential_writes_are_tail_writes() {
        let mut gaps = ChainGaps::starting_at(0);
        assert_eq!(gaps.fill_gap(0).unwrap(), GapFillOutcome::TailWrite);
        assert_eq!(gaps.fill_gap(1).unwrap(), GapFillOutcome::TailWrite);
        assert_eq!(gaps.tip_child, 2);
        assert!(gaps.gaps.is_empty());
    }

    #[test]
    fn writing_past_the_tip_opens_a_new_gap() {
        let mut gaps = ChainGaps::starting_at(0);
        let outcome = gaps.fill_gap(5).unwrap();
        assert_eq!(outcome, GapFillOutcome::NewGap(GapRange { low: 0, high: 4 }));
        assert_eq!(gaps.tip_child, 6);
    }

    #[test]
    fn writing_the_tail_of_an_existing_gap_is_duplicate() {
        let mut gaps = ChainGaps::starting_at(0);
        gaps.fill_gap(5).unwrap();
        assert_eq!(gaps.fill_gap(2).unwrap(), GapFillOutcome::GapShrink(GapRange { low: 0, high: 1 }));
        assert_eq!(gaps.fill_gap(2).unwrap(), GapFillOutcome::NoChange);
    }

    #[test]
    fn filling_a_single_element_gap_removes_it() {
        let mut gaps = ChainGaps::starting_at(0);
        gaps.gaps.push(GapRange { low: 3, high: 3 });
        let outcome = gaps.fill_gap(3).unwrap();
        assert_eq!(outcome, GapFillOutcome::GapFill(GapRange { low: 3, high: 3 }));
        assert!(gaps.gaps.is_empty());
    }

    #[test]
    fn filling_an_edge_of_a_multi_block_gap_shrinks_it() {
        let mut gaps = ChainGaps::starting_at(0);
        gaps.gaps.push(GapRange { low: 3, high: 6 });
        let outcome = gaps.fill_gap(3).unwrap();
        assert_eq!(outcome, GapFillOutcome::GapShrink(GapRange { low: 4, high: 6 }));

        let outcome = gaps.fill_gap(6).unwrap();
        assert_eq!(outcome, GapFillOutcome::GapShrink(GapRange { low: 4, high: 5 }));
    }

    #[test]
    fn filling_the_middle_of_a_gap_splits_it() {
        let mut gaps = ChainGaps::starting_at(0);
        gaps.gaps.push(GapRange { low: 3, high: 7 });
        let outcome = gaps.fill_gap(5).unwrap();
        assert_eq!(outcome, GapFillOutcome::GapSplit(GapRange { low: 3, high: 4 }, GapRange { low: 6, high: 7 }));
    }

    #[test]
    fn a_block_number_inside_two_overlapping_gaps_is_corruption() {
        let mut gaps = ChainGaps::starting_at(0);
        gaps.gaps.push(GapRange { low: 3, high: 5 });
        gaps.gaps.push(GapRange { low: 4, high: 6 });
        assert!(matches!(gaps.fill_gap(4), Err(ChainError::GapTrackingCorrupted { number: 4 })));
    }
}
