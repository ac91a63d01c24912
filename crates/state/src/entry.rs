//! Undo-log entries recorded for every state mutation.

use alloy_primitives::{Address, Bytes, B256, U256};

/// One reversible state mutation, as recorded in [ward_journal::Journal].
///
/// Each variant carries the value overwritten by the mutation it
/// accompanies; [crate::AccountStateDb::discard] walks a checkpoint's
/// entries in reverse and restores each `old` value.
#[derive(Clone, Debug)]
pub enum JournalEntry {
    /// An account record was inserted where none existed before; reverted by
    /// removing it entirely rather than restoring a prior value.
    AccountCreated {
        /// The account that was created.
        address: Address,
    },
    /// `set_balance`/`delta_balance` overwrote a prior balance.
    BalanceChange {
        /// The account whose balance changed.
        address: Address,
        /// The balance before the change.
        old: U256,
    },
    /// `set_nonce`/`increment_nonce` overwrote a prior nonce.
    NonceChange {
        /// The account whose nonce changed.
        address: Address,
        /// The nonce before the change.
        old: u64,
    },
    /// `set_code`/`delete_code` overwrote prior code.
    CodeChange {
        /// The account whose code changed.
        address: Address,
        /// The code hash before the change.
        old_code_hash: B256,
        /// The code before the change, if any was cached.
        old_code: Option<Bytes>,
    },
    /// `set_storage` overwrote a prior storage slot value.
    StorageChange {
        /// The account whose storage changed.
        address: Address,
        /// The slot that changed.
        slot: B256,
        /// The slot's value before the change.
        old: U256,
    },
    /// `delete_storage` cleared every slot of an account; `old` is the full
    /// prior slot map, restored verbatim on revert.
    StorageCleared {
        /// The account whose storage was cleared.
        address: Address,
        /// Every non-zero slot that existed before the clear.
        old: Vec<(B256, U256)>,
    },
    /// `set_transient_storage` overwrote a prior transient slot value.
    TransientStorageChange {
        /// The account whose transient storage changed.
        address: Address,
        /// The slot that changed.
        slot: B256,
        /// The slot's value before the change.
        old: U256,
    },
    /// `delete_account` removed an account from the state trie.
    AccountDestroyed {
        /// The account that was destroyed.
        address: Address,
        /// Its nonce before destruction.
        nonce: u64,
        /// Its balance before destruction.
        balance: U256,
        /// Its code hash before destruction.
        code_hash: B256,
        /// Its code before destruction, if cached.
        code: Option<Bytes>,
        /// Its non-zero storage slots before destruction.
        storage: Vec<(B256, U256)>,
    },
    /// `mark_address_warm` warmed a previously cold address (EIP-2929).
    AddressWarmed {
        /// The address that was warmed.
        address: Address,
    },
    /// `mark_storage_warm` warmed a previously cold storage slot (EIP-2929).
    StorageWarmed {
        /// The account whose slot was warmed.
        address: Address,
        /// The slot that was warmed.
        slot: B256,
    },
    /// `touch_account` marked a previously untouched account as touched.
    AccountTouched {
        /// The account that was touched.
        address: Address,
    },
}
