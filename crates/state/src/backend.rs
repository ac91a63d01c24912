//! Durable storage for account records and code blobs.

use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_rlp::{Encodable, Header};
use std::sync::Mutex;
use tracing::debug;

/// A sink for flushing account records and code blobs out of
/// [crate::AccountStateDb]. Implementations need not be transactional; the
/// journal above this layer is what guarantees atomicity of a block's
/// writes, not the backend itself.
pub trait Persistence {
    /// Persists an account's RLP-independent fields.
    fn put_account(&self, address: Address, nonce: u64, balance: U256, code_hash: B256);

    /// Persists a code blob keyed by its hash.
    fn put_code(&self, code_hash: B256, code: Bytes);
}

/// A [Persistence] backend over an on-disk RocksDB instance.
///
/// Two column families are used: `accounts` (address -> RLP-encoded
/// `(nonce, balance, code_hash)`) and `code` (code hash -> raw bytecode).
#[derive(Debug)]
pub struct RocksPersistence {
    db: rocksdb::DB,
}

impl RocksPersistence {
    /// Opens (creating if absent) a RocksDB instance at `path`.
    pub fn open(path: &std::path::Path) -> Result<Self, rocksdb::Error> {
        let mut opts = rocksdb::Options::default();
        opts.create_if_missing(true);
        let db = rocksdb::DB::open(&opts, path)?;
        Ok(Self { db })
    }
}

impl Persistence for RocksPersistence {
    fn put_account(&self, address: Address, nonce: u64, balance: U256, code_hash: B256) {
        let value = encode_account_record(nonce, balance, code_hash);
        if let Err(error) = self.db.put(address.as_slice(), &value) {
            debug!(target: "ward_state::backend", %address, %error, "failed to persist account");
        }
    }

    fn put_code(&self, code_hash: B256, code: Bytes) {
        if let Err(error) = self.db.put(code_hash.as_slice(), code.as_ref()) {
            debug!(target: "ward_state::backend", %code_hash, %error, "failed to persist code");
        }
    }
}

/// RLP-encodes `[nonce, balance, code_hash]` as a list, the on-disk
/// representation used by [RocksPersistence::put_account].
fn encode_account_record(nonce: u64, balance: U256, code_hash: B256) -> Vec<u8> {
    let payload_length = nonce.length() + balance.length() + code_hash.length();
    let mut out = Vec::with_capacity(alloy_rlp::length_of_length(payload_length) + payload_length);
    Header { list: true, payload_length }.encode(&mut out);
    nonce.encode(&mut out);
    balance.encode(&mut out);
    code_hash.encode(&mut out);
    out
}

/// An in-memory [Persistence] backend, used in tests and for ephemeral
/// (non-archival) execution.
#[derive(Debug, Default)]
pub struct InMemoryPersistence {
    accounts: Mutex<std::collections::HashMap<Address, (u64, U256, B256)>>,
    code: Mutex<std::collections::HashMap<B256, Bytes>>,
}

impl Persistence for InMemoryPersistence {
    fn put_account(&self, address: Address, nonce: u64, balance: U256, code_hash: B256) {
        self.accounts.lock().expect("lock poisoned").insert(address, (nonce, balance, code_hash));
    }

    fn put_code(&self, code_hash: B256, code: Bytes) {
        self.code.lock().expect("lock poisoned").insert(code_hash, code);
    }
}
