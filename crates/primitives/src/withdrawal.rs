//! EIP-4895 validator withdrawals.

use alloy_primitives::Address;
use alloy_rlp::{RlpDecodable, RlpEncodable};

/// A single validator withdrawal, processed after all transactions in a
/// post-Shanghai block.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, RlpEncodable, RlpDecodable)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Withdrawal {
    /// Monotonically increasing global withdrawal index.
    pub index: u64,
    /// Index of the withdrawing validator within the beacon chain's validator set.
    pub validator_index: u64,
    /// The recipient of the withdrawal.
    pub address: Address,
    /// Amount withdrawn, in Gwei (`1e9` wei).
    pub amount: u64,
}

impl Withdrawal {
    /// The withdrawal amount converted to wei (`amount * 1e9`).
    pub fn amount_wei(&self) -> alloy_primitives::U256 {
        alloy_primitives::U256::from(self.amount) * alloy_primitives::U256::from(1_000_000_000u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_gwei_withdrawal_credits_one_gwei_in_wei() {
        let w = Withdrawal { index: 0, validator_index: 0, address: Address::ZERO, amount: 1_000_000_000 };
        assert_eq!(w.amount_wei(), alloy_primitives::U256::from(1_000_000_000_000_000_000u64));
    }
}
