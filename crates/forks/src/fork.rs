//! The [Fork] enum and the schedule mapping block numbers to forks.

/// A protocol upgrade, in activation order. Every fork implicitly includes
/// every rule of every fork before it unless explicitly noted otherwise
/// (Petersburg is the one fork that *removes* a prior change, EIP-1283).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Fork {
    /// The genesis ruleset.
    Frontier,
    /// Adds `DELEGATECALL`, raises the contract-creation OOG behavior.
    Homestead,
    /// The irregular state change that forked off the DAO attacker's funds;
    /// no opcode or gas changes.
    DaoFork,
    /// EIP-150: raises the cost of IO-heavy opcodes, introduces the 63/64
    /// call-gas forwarding rule.
    TangerineWhistle,
    /// EIP-155 replay protection, EIP-170 24576-byte code size cap.
    SpuriousDragon,
    /// `REVERT`, `RETURNDATASIZE`/`RETURNDATACOPY`, `STATICCALL`; receipts
    /// carry a status byte instead of a state root.
    Byzantium,
    /// `CREATE2`, `EXTCODEHASH`, `SHL`/`SHR`/`SAR`, EIP-1283 net gas metering.
    Constantinople,
    /// Constantinople, minus EIP-1283 (reentrancy concerns deferred it).
    Petersburg,
    /// `CHAINID`, `SELFBALANCE`, EIP-2200 (net metering reinstated with a
    /// sentry gas floor), EIP-1884 repricing.
    Istanbul,
    /// Difficulty bomb delay only; no opcode or gas changes.
    MuirGlacier,
    /// EIP-2929 warm/cold access sets, EIP-2930 access-list transactions.
    Berlin,
    /// EIP-1559 fee market, `BASEFEE`, EIP-3529 refund cap, EIP-3541 reject
    /// `0xEF`-prefixed deployed code.
    London,
    /// Difficulty bomb delay only.
    ArrowGlacier,
    /// Difficulty bomb delay only.
    GrayGlacier,
    /// The Merge: `PREVRANDAO` replaces `DIFFICULTY`, proof-of-stake header
    /// sentinels enforced.
    Paris,
    /// `PUSH0`, warm `COINBASE`, EIP-3860 initcode size limit, withdrawals.
    Shanghai,
    /// `TLOAD`/`TSTORE`, `MCOPY`, `BLOBHASH`, `BLOBBASEFEE`, the point
    /// evaluation precompile, `SELFDESTRUCT` downgraded to a same-tx-only no-op.
    Cancun,
    /// BLS12-381 precompiles, EIP-7623 calldata floor, EIP-7702 delegation.
    Prague,
}

impl Fork {
    /// Every fork, in activation order.
    pub const ALL: [Self; 18] = [
        Self::Frontier,
        Self::Homestead,
        Self::DaoFork,
        Self::TangerineWhistle,
        Self::SpuriousDragon,
        Self::Byzantium,
        Self::Constantinople,
        Self::Petersburg,
        Self::Istanbul,
        Self::MuirGlacier,
        Self::Berlin,
        Self::London,
        Self::ArrowGlacier,
        Self::GrayGlacier,
        Self::Paris,
        Self::Shanghai,
        Self::Cancun,
        Self::Prague,
    ];

    /// Whether `self` is at least as new as `other`.
    pub fn is_at_least(self, other: Self) -> bool {
        self >= other
    }

    /// Whether `self` has been superseded by `other` (i.e. `self < other`).
    pub fn is_before(self, other: Self) -> bool {
        self < other
    }
}

/// A monotonic sequence of `(start_block, fork)` pairs configuring which
/// ruleset applies at a given block number.
#[derive(Clone, Debug)]
pub struct ForkSchedule {
    transitions: Vec<(u64, Fork)>,
}

impl ForkSchedule {
    /// Builds a schedule from explicit `(start_block, fork)` pairs. `pairs`
    /// need not be sorted; it is sorted by `start_block` on construction.
    pub fn new(mut pairs: Vec<(u64, Fork)>) -> Self {
        pairs.sort_by_key(|(block, _)| *block);
        Self { transitions: pairs }
    }

    /// Ethereum mainnet's activation block numbers.
    pub fn mainnet() -> Self {
        Self::new(vec![
            (0, Fork::Frontier),
            (1_150_000, Fork::Homestead),
            (1_920_000, Fork::DaoFork),
            (2_463_000, Fork::TangerineWhistle),
            (2_675_000, Fork::SpuriousDragon),
            (4_370_000, Fork::Byzantium),
            (7_280_000, Fork::Constantinople),
            (7_280_001, Fork::Petersburg),
            (9_069_000, Fork::Istanbul),
            (9_200_000, Fork::MuirGlacier),
            (12_244_000, Fork::Berlin),
            (12_965_000, Fork::London),
            (13_773_000, Fork::ArrowGlacier),
            (15_050_000, Fork::GrayGlacier),
            (15_537_394, Fork::Paris),
            (17_034_870, Fork::Shanghai),
            (19_426_587, Fork::Cancun),
            (u64::MAX, Fork::Prague),
        ])
    }

    /// The latest fork whose `start_block <= block_number`.
    pub fn fork_at(&self, block_number: u64) -> Fork {
        self.transitions
            .iter()
            .rev()
            .find(|(start, _)| *start <= block_number)
            .map(|(_, fork)| *fork)
            .unwrap_or(Fork::Frontier)
    }
}

impl Default for ForkSchedule {
    fn default() -> Self {
        Self::mainnet()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fork_ordering_is_activation_order() {
        assert!(Fork::Frontier < Fork::Homestead);
        assert!(Fork::London < Fork::Paris);
        assert!(Fork::Cancun < Fork::Prague);
    }

    #[test]
    fn schedule_selects_latest_fork_not_exceeding_block() {
        let schedule = ForkSchedule::mainnet();
        assert_eq!(schedule.fork_at(0), Fork::Frontier);
        assert_eq!(schedule.fork_at(12_965_000), Fork::London);
        assert_eq!(schedule.fork_at(12_965_001), Fork::London);
        assert_eq!(schedule.fork_at(15_537_394), Fork::Paris);
    }

    #[test]
    fn unsorted_pairs_are_sorted_on_construction() {
        let schedule = ForkSchedule::new(vec![(100, Fork::London), (0, Fork::Frontier)]);
        assert_eq!(schedule.fork_at(50), Fork::Frontier);
        assert_eq!(schedule.fork_at(150), Fork::London);
    }
}
