//! Seeding an [AccountStateDb] from a genesis allocation list.

use crate::db::AccountStateDb;
use alloy_primitives::{Address, Bytes, U256, B256};

/// One entry of a genesis allocation: the starting balance, nonce, code, and
/// storage slots an address is created with before block 0 is ever applied.
#[derive(Clone, Debug, Default)]
pub struct GenesisAccount {
    /// Starting balance, in wei.
    pub balance: U256,
    /// Starting nonce.
    pub nonce: u64,
    /// Starting code, empty for an EOA.
    pub code: Bytes,
    /// Starting storage slots.
    pub storage: Vec<(B256, U256)>,
}

impl AccountStateDb {
    /// Seeds an empty database from a genesis allocation list.
    ///
    /// Intended to run once, before block 0; it writes directly rather than
    /// going through `checkpoint`/`commit`, since there is no transaction to
    /// roll back to.
    pub fn seed_genesis<I>(&mut self, allocations: I)
    where
        I: IntoIterator<Item = (Address, GenesisAccount)>,
    {
        for (address, account) in allocations {
            self.set_balance(address, account.balance);
            self.set_nonce(address, account.nonce);
            if !account.code.is_empty() {
                self.set_code(address, account.code);
            }
            for (slot, value) in account.storage {
                self.set_storage(address, slot, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_account_balance_and_code_are_readable() {
        let mut state = AccountStateDb::new();
        let address = Address::repeat_byte(0x42);
        let account = GenesisAccount {
            balance: U256::from(1_000),
            nonce: 3,
            code: Bytes::from_static(&[0x60, 0x00]),
            storage: vec![(B256::ZERO, U256::from(7))],
        };
        state.seed_genesis([(address, account)]);

        assert_eq!(state.get_balance(address), U256::from(1_000));
        assert_eq!(state.get_nonce(address), 3);
        assert_eq!(state.get_code(address), Bytes::from_static(&[0x60, 0x00]));
        assert_eq!(state.get_storage(address, B256::ZERO), U256::from(7));
    }
}
