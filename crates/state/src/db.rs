//! The journaled, trie-backed account state database.

use crate::backend::Persistence;
use crate::entry::JournalEntry;
use crate::errors::StateError;
use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use std::collections::{HashMap, HashSet};
use tracing::trace;
use ward_journal::{Checkpoint, Journal};
use ward_primitives::account::{code_hash as hash_code, EMPTY_CODE_HASH};
use ward_trie::{state_root as compute_state_root, storage_root as compute_storage_root, AccountLeaf, EMPTY_ROOT_HASH};

#[derive(Clone, Debug)]
struct AccountRecord {
    nonce: u64,
    balance: U256,
    code_hash: B256,
    code: Option<Bytes>,
    storage: HashMap<B256, U256>,
}

impl Default for AccountRecord {
    fn default() -> Self {
        Self { nonce: 0, balance: U256::ZERO, code_hash: EMPTY_CODE_HASH, code: None, storage: HashMap::new() }
    }
}

impl AccountRecord {
    fn non_zero_storage(&self) -> Vec<(B256, U256)> {
        self.storage.iter().filter(|(_, v)| !v.is_zero()).map(|(k, v)| (*k, *v)).collect()
    }
}

/// The journaled, trie-backed account state database (C3) plus transient
/// storage (C4).
///
/// Owns every account's balance, nonce, code, and storage, along with the
/// EIP-2929 warm/cold access sets and the undo-log that makes every write
/// revertible to a prior [Checkpoint].
#[derive(Debug)]
pub struct AccountStateDb {
    accounts: HashMap<Address, AccountRecord>,
    code_by_hash: HashMap<B256, Bytes>,
    transient: HashMap<(Address, B256), U256>,
    warm_addresses: HashSet<Address>,
    warm_storage: HashSet<(Address, B256)>,
    touched: HashSet<Address>,
    journal: Journal<JournalEntry>,
    /// Captured by `lock_changes`; the original value of every slot as of
    /// the start of the current transaction, for EIP-2200 net gas metering.
    original_storage: HashMap<(Address, B256), U256>,
    state_root_stale: bool,
}

impl Default for AccountStateDb {
    fn default() -> Self {
        Self {
            accounts: HashMap::new(),
            code_by_hash: HashMap::new(),
            transient: HashMap::new(),
            warm_addresses: HashSet::new(),
            warm_storage: HashSet::new(),
            touched: HashSet::new(),
            journal: Journal::new(),
            original_storage: HashMap::new(),
            state_root_stale: true,
        }
    }
}

impl AccountStateDb {
    /// An empty state database, as at genesis before any account is loaded.
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&mut self, entry: JournalEntry) {
        self.state_root_stale = true;
        self.journal.record(entry);
    }

    fn entry_or_create(&mut self, address: Address) -> &mut AccountRecord {
        if !self.accounts.contains_key(&address) {
            self.record(JournalEntry::AccountCreated { address });
            self.accounts.insert(address, AccountRecord::default());
        }
        self.accounts.get_mut(&address).expect("just inserted")
    }

    // -- balance --------------------------------------------------------

    /// The account's balance, `0` if it does not exist.
    pub fn get_balance(&self, address: Address) -> U256 {
        self.accounts.get(&address).map(|a| a.balance).unwrap_or(U256::ZERO)
    }

    /// Overwrites the account's balance, creating it if absent.
    pub fn set_balance(&mut self, address: Address, balance: U256) {
        let old = self.get_balance(address);
        if old == balance {
            return;
        }
        self.record(JournalEntry::BalanceChange { address, old });
        self.entry_or_create(address).balance = balance;
    }

    /// Applies a signed delta to the account's balance.
    ///
    /// The caller guarantees the delta never underflows; this is enforced by
    /// callers validating sufficient balance before debiting (the executor's
    /// pre-execution balance check), not here.
    pub fn delta_balance(&mut self, address: Address, delta: i128) {
        let old = self.get_balance(address);
        let new = if delta >= 0 {
            old + U256::from(delta as u128)
        } else {
            old - U256::from((-delta) as u128)
        };
        self.set_balance(address, new);
    }

    // -- nonce ------------------------------------------------------------

    /// The account's nonce, `0` if it does not exist.
    pub fn get_nonce(&self, address: Address) -> u64 {
        self.accounts.get(&address).map(|a| a.nonce).unwrap_or(0)
    }

    /// Overwrites the account's nonce, creating it if absent.
    pub fn set_nonce(&mut self, address: Address, nonce: u64) {
        let old = self.get_nonce(address);
        if old == nonce {
            return;
        }
        self.record(JournalEntry::NonceChange { address, old });
        self.entry_or_create(address).nonce = nonce;
    }

    /// Increments the account's nonce by one.
    pub fn increment_nonce(&mut self, address: Address) -> Result<(), StateError> {
        let old = self.get_nonce(address);
        let new = old.checked_add(1).ok_or(StateError::NonceOverflow)?;
        self.set_nonce(address, new);
        Ok(())
    }

    // -- code ---------------------------------------------------------------

    /// The account's code, empty if it has none.
    pub fn get_code(&self, address: Address) -> Bytes {
        let Some(account) = self.accounts.get(&address) else { return Bytes::new() };
        if let Some(code) = &account.code {
            return code.clone();
        }
        self.code_by_hash.get(&account.code_hash).cloned().unwrap_or_default()
    }

    /// The account's code hash; `keccak256("")` for accounts with no code.
    pub fn get_code_hash(&self, address: Address) -> B256 {
        self.accounts.get(&address).map(|a| a.code_hash).unwrap_or(EMPTY_CODE_HASH)
    }

    /// Sets the account's code, implicitly updating `code_hash = keccak(code)`.
    pub fn set_code(&mut self, address: Address, code: Bytes) {
        let old_code_hash = self.get_code_hash(address);
        let old_code = self.accounts.get(&address).and_then(|a| a.code.clone());
        self.record(JournalEntry::CodeChange { address, old_code_hash, old_code });

        let code_hash = hash_code(&code);
        self.code_by_hash.insert(code_hash, code.clone());
        let account = self.entry_or_create(address);
        account.code_hash = code_hash;
        account.code = Some(code);
    }

    /// Clears the account's code back to empty.
    pub fn delete_code(&mut self, address: Address) {
        let old_code_hash = self.get_code_hash(address);
        let old_code = self.accounts.get(&address).and_then(|a| a.code.clone());
        if old_code_hash == EMPTY_CODE_HASH {
            return;
        }
        self.record(JournalEntry::CodeChange { address, old_code_hash, old_code });
        let account = self.entry_or_create(address);
        account.code_hash = EMPTY_CODE_HASH;
        account.code = None;
    }

    // -- storage --------------------------------------------------------------

    /// The value stored at `slot`, `0` if unset. Slot `0` is a legitimate
    /// in-band value, not absence; absence and the zero value are
    /// indistinguishable at this layer by design.
    pub fn get_storage(&self, address: Address, slot: B256) -> U256 {
        self.accounts.get(&address).and_then(|a| a.storage.get(&slot)).copied().unwrap_or(U256::ZERO)
    }

    /// The slot's value as of the start of the current transaction
    /// (captured by [Self::lock_changes]), used for EIP-2200 net gas
    /// metering. Falls back to the current value if `lock_changes` has not
    /// yet observed this slot (e.g. the very first write within a tx).
    pub fn get_original_storage(&self, address: Address, slot: B256) -> U256 {
        self.original_storage.get(&(address, slot)).copied().unwrap_or_else(|| self.get_storage(address, slot))
    }

    /// Overwrites `slot`'s value, creating the account if absent.
    pub fn set_storage(&mut self, address: Address, slot: B256, value: U256) {
        let old = self.get_storage(address, slot);
        if old == value {
            return;
        }
        self.original_storage.entry((address, slot)).or_insert(old);
        self.record(JournalEntry::StorageChange { address, slot, old });
        self.entry_or_create(address).storage.insert(slot, value);
    }

    /// Clears every storage slot of an account (used by `SELFDESTRUCT`
    /// pre-Cancun and by contract redeployment at the same address).
    pub fn delete_storage(&mut self, address: Address) {
        let Some(account) = self.accounts.get(&address) else { return };
        let old = account.non_zero_storage();
        if old.is_empty() {
            return;
        }
        self.record(JournalEntry::StorageCleared { address, old });
        self.entry_or_create(address).storage.clear();
    }

    /// Removes the account entirely from the state trie.
    pub fn delete_account(&mut self, address: Address) {
        let Some(account) = self.accounts.remove(&address) else { return };
        self.record(JournalEntry::AccountDestroyed {
            address,
            nonce: account.nonce,
            balance: account.balance,
            code_hash: account.code_hash,
            code: account.code.clone(),
            storage: account.non_zero_storage(),
        });
    }

    // -- existence / emptiness --------------------------------------------

    /// Whether the account has ever been created in this state.
    pub fn account_exists(&self, address: Address) -> bool {
        self.accounts.contains_key(&address)
    }

    /// Whether the account has non-zero nonce or non-empty code (EIP-161).
    pub fn account_has_code_or_nonce(&self, address: Address) -> bool {
        self.accounts.get(&address).map(|a| a.nonce != 0 || a.code_hash != EMPTY_CODE_HASH).unwrap_or(false)
    }

    /// EIP-161 emptiness: zero nonce, zero balance, no code.
    pub fn account_is_empty(&self, address: Address) -> bool {
        match self.accounts.get(&address) {
            None => true,
            Some(a) => a.nonce == 0 && a.balance.is_zero() && a.code_hash == EMPTY_CODE_HASH,
        }
    }

    /// Marks the account as touched this transaction, for EIP-161 end-of-tx
    /// empty-account pruning.
    pub fn touch_account(&mut self, address: Address) {
        if self.touched.insert(address) {
            self.record(JournalEntry::AccountTouched { address });
        }
    }

    /// Accounts touched since the journal was last fully unwound; the
    /// executor sweeps this set for empty accounts to delete after each
    /// transaction.
    pub fn touched_accounts(&self) -> impl Iterator<Item = Address> + '_ {
        self.touched.iter().copied()
    }

    // -- EIP-2929 warm/cold tracking --------------------------------------

    /// Whether `address` has already been accessed this transaction.
    pub fn is_address_warm(&self, address: Address) -> bool {
        self.warm_addresses.contains(&address)
    }

    /// Marks `address` as accessed, returning whether it was already warm.
    pub fn mark_address_warm(&mut self, address: Address) -> bool {
        let was_warm = !self.warm_addresses.insert(address);
        if !was_warm {
            self.record(JournalEntry::AddressWarmed { address });
        }
        was_warm
    }

    /// Whether `(address, slot)` has already been accessed this transaction.
    pub fn is_storage_warm(&self, address: Address, slot: B256) -> bool {
        self.warm_storage.contains(&(address, slot))
    }

    /// Marks `(address, slot)` as accessed, returning whether it was already warm.
    pub fn mark_storage_warm(&mut self, address: Address, slot: B256) -> bool {
        let was_warm = !self.warm_storage.insert((address, slot));
        if !was_warm {
            self.record(JournalEntry::StorageWarmed { address, slot });
        }
        was_warm
    }

    // -- transient storage (C4) -------------------------------------------

    /// The transient value stored at `slot`, `0` if unset.
    pub fn get_transient_storage(&self, address: Address, slot: B256) -> U256 {
        self.transient.get(&(address, slot)).copied().unwrap_or(U256::ZERO)
    }

    /// Overwrites `slot`'s transient value.
    pub fn set_transient_storage(&mut self, address: Address, slot: B256, value: U256) {
        let old = self.get_transient_storage(address, slot);
        if old == value {
            return;
        }
        self.journal.record(JournalEntry::TransientStorageChange { address, slot, old });
        self.transient.insert((address, slot), value);
    }

    /// Clears all transient storage; called unconditionally at the boundary
    /// between transactions, independent of the journal.
    pub fn clear_transient_storage(&mut self) {
        self.transient.clear();
    }

    // -- checkpoint / commit / discard ------------------------------------

    /// Opens a new undo scope, mirroring a `CALL`/`CREATE` frame.
    pub fn checkpoint(&mut self) -> Checkpoint {
        self.journal.checkpoint()
    }

    /// Keeps every change made since `checkpoint`, folding it into the
    /// enclosing scope so an outer `discard` can still undo it.
    pub fn commit(&mut self, checkpoint: Checkpoint) {
        self.journal.commit(checkpoint);
    }

    /// Reverts every change made since `checkpoint`.
    pub fn discard(&mut self, checkpoint: Checkpoint) {
        for entry in self.journal.discard(checkpoint) {
            self.undo(entry);
        }
    }

    fn undo(&mut self, entry: JournalEntry) {
        match entry {
            JournalEntry::AccountCreated { address } => {
                self.accounts.remove(&address);
            }
            JournalEntry::BalanceChange { address, old } => {
                self.accounts.entry(address).or_default().balance = old;
            }
            JournalEntry::NonceChange { address, old } => {
                self.accounts.entry(address).or_default().nonce = old;
            }
            JournalEntry::CodeChange { address, old_code_hash, old_code } => {
                let account = self.accounts.entry(address).or_default();
                account.code_hash = old_code_hash;
                account.code = old_code;
            }
            JournalEntry::StorageChange { address, slot, old } => {
                self.accounts.entry(address).or_default().storage.insert(slot, old);
            }
            JournalEntry::StorageCleared { address, old } => {
                let account = self.accounts.entry(address).or_default();
                for (slot, value) in old {
                    account.storage.insert(slot, value);
                }
            }
            JournalEntry::TransientStorageChange { address, slot, old } => {
                self.transient.insert((address, slot), old);
            }
            JournalEntry::AccountDestroyed { address, nonce, balance, code_hash, code, storage } => {
                let mut record = AccountRecord { nonce, balance, code_hash, code, storage: HashMap::new() };
                for (slot, value) in storage {
                    record.storage.insert(slot, value);
                }
                self.accounts.insert(address, record);
            }
            JournalEntry::AddressWarmed { address } => {
                self.warm_addresses.remove(&address);
            }
            JournalEntry::StorageWarmed { address, slot } => {
                self.warm_storage.remove(&(address, slot));
            }
            JournalEntry::AccountTouched { address } => {
                self.touched.remove(&address);
            }
        }
    }

    /// Freezes the current storage values as the "original" values for
    /// EIP-2200 net gas metering, and clears per-transaction warm/transient
    /// state. Called once at the start of each transaction.
    pub fn lock_changes(&mut self) {
        self.original_storage.clear();
        self.warm_addresses.clear();
        self.warm_storage.clear();
        self.touched.clear();
        self.clear_transient_storage();
    }

    // -- state root / persistence ------------------------------------------

    /// Rebuilds every touched account's storage trie, then the main state
    /// trie, returning the new state root.
    ///
    /// Expensive: walks every account currently loaded. Called once per
    /// receipt pre-Byzantium, once per block post-Byzantium.
    pub fn make_state_root(&mut self) -> B256 {
        let mut leaves = Vec::with_capacity(self.accounts.len());
        for (address, record) in &self.accounts {
            let storage_root = if record.storage.is_empty() {
                EMPTY_ROOT_HASH
            } else {
                compute_storage_root(&record.non_zero_storage())
            };
            let account = ward_primitives::Account {
                nonce: record.nonce,
                balance: record.balance,
                storage_root,
                code_hash: record.code_hash,
            };
            leaves.push(AccountLeaf { hashed_address: keccak256(address.as_slice()), account });
        }
        let root = compute_state_root(leaves);
        self.state_root_stale = false;
        trace!(target: "ward_state", %root, accounts = self.accounts.len(), "state root recomputed");
        root
    }

    /// Flushes account records and code blobs to `backend`.
    ///
    /// # Errors
    /// Returns [StateError::StaleStateRoot] if a write happened after the
    /// last [Self::make_state_root] call.
    pub fn persist(&self, backend: &dyn Persistence) -> Result<(), StateError> {
        if self.state_root_stale {
            return Err(StateError::StaleStateRoot);
        }
        for (address, record) in &self.accounts {
            backend.put_account(*address, record.nonce, record.balance, record.code_hash);
            if let Some(code) = &record.code {
                backend.put_code(record.code_hash, code.clone());
            }
        }
        for (hash, code) in &self.code_by_hash {
            backend.put_code(*hash, code.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::Address;

    #[test]
    fn discard_restores_balance_across_nested_checkpoints() {
        let mut state = AccountStateDb::new();
        let addr = Address::repeat_byte(1);
        state.set_balance(addr, U256::from(100));

        let cp = state.checkpoint();
        state.set_balance(addr, U256::from(500));
        assert_eq!(state.get_balance(addr), U256::from(500));

        state.discard(cp);
        assert_eq!(state.get_balance(addr), U256::from(100));
    }

    #[test]
    fn commit_keeps_changes_but_stays_revertible_by_outer_checkpoint() {
        let mut state = AccountStateDb::new();
        let addr = Address::repeat_byte(2);
        let outer = state.checkpoint();
        let inner = state.checkpoint();
        state.set_nonce(addr, 7);
        state.commit(inner);
        assert_eq!(state.get_nonce(addr), 7);
        state.discard(outer);
        assert_eq!(state.get_nonce(addr), 0);
    }

    #[test]
    fn set_code_updates_code_hash() {
        let mut state = AccountStateDb::new();
        let addr = Address::repeat_byte(3);
        state.set_code(addr, Bytes::from_static(&[0x60, 0x00]));
        assert_eq!(state.get_code_hash(addr), hash_code(&[0x60, 0x00]));
    }

    #[test]
    fn empty_account_has_default_code_hash() {
        let state = AccountStateDb::new();
        assert_eq!(state.get_code_hash(Address::repeat_byte(9)), EMPTY_CODE_HASH);
    }

    #[test]
    fn account_is_empty_until_funded_or_given_code() {
        let mut state = AccountStateDb::new();
        let addr = Address::repeat_byte(4);
        assert!(state.account_is_empty(addr));
        state.set_balance(addr, U256::from(1));
        assert!(!state.account_is_empty(addr));
    }

    #[test]
    fn delete_account_is_reverted_by_discard() {
        let mut state = AccountStateDb::new();
        let addr = Address::repeat_byte(5);
        state.set_balance(addr, U256::from(10));
        state.set_storage(addr, B256::repeat_byte(1), U256::from(42));

        let cp = state.checkpoint();
        state.delete_account(addr);
        assert!(!state.account_exists(addr));
        state.discard(cp);

        assert_eq!(state.get_balance(addr), U256::from(10));
        assert_eq!(state.get_storage(addr, B256::repeat_byte(1)), U256::from(42));
    }

    #[test]
    fn warm_tracking_is_reverted_by_discard() {
        let mut state = AccountStateDb::new();
        let addr = Address::repeat_byte(6);
        let cp = state.checkpoint();
        assert!(!state.mark_address_warm(addr));
        assert!(state.is_address_warm(addr));
        state.discard(cp);
        assert!(!state.is_address_warm(addr));
    }

    #[test]
    fn original_storage_reflects_value_at_lock_changes() {
        let mut state = AccountStateDb::new();
        let addr = Address::repeat_byte(7);
        let slot = B256::repeat_byte(1);
        state.set_storage(addr, slot, U256::from(1));
        state.lock_changes();
        state.set_storage(addr, slot, U256::from(2));
        assert_eq!(state.get_original_storage(addr, slot), U256::from(1));
        assert_eq!(state.get_storage(addr, slot), U256::from(2));
    }

    #[test]
    fn state_root_is_empty_trie_root_with_no_accounts() {
        let mut state = AccountStateDb::new();
        assert_eq!(state.make_state_root(), EMPTY_ROOT_HASH);
    }

    #[test]
    fn persist_requires_fresh_state_root() {
        let mut state = AccountStateDb::new();
        state.set_balance(Address::repeat_byte(8), U256::from(1));
        let backend = crate::backend::InMemoryPersistence::default();
        assert!(matches!(state.persist(&backend), Err(StateError::StaleStateRoot)));
        state.make_state_root();
        assert!(state.persist(&backend).is_ok());
    }
}
