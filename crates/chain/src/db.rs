//! Durable storage for headers, the canonical-chain index, and the
//! header-gap ledger.
//!
//! Code and trie-node persistence stay with [`ward_state::backend::Persistence`]
//! — this module owns only the chain-level indices [`crate::Chain`] needs to
//! import blocks and reorg between branches.

use crate::block::{Block, BlockBody};
use crate::gaps::ChainGaps;
use alloy_primitives::{B256, U256};
use alloy_rlp::{BufMut, Decodable, Encodable, Header as RlpHeader};
use std::collections::HashMap;
use ward_primitives::header::BlockHeader;
use ward_primitives::receipt::ReceiptEnvelope;
use ward_primitives::transaction::Transaction;
use ward_primitives::withdrawal::Withdrawal;

/// Where a transaction or withdrawal was included: `(block_number, index)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockLocation {
    /// The including block's number.
    pub block_number: u64,
    /// The transaction's (or withdrawal's) index within that block.
    pub index: u64,
}

/// The chain-level indices a [`crate::Chain`] reads and writes during
/// import and reorg.
///
/// Implementations need not be transactional across methods; [`crate::Chain`]
/// only calls these after a block has already passed validation and state
/// execution, so a crash mid-write leaves at worst an orphaned record, never
/// a canonical pointer to a block whose header was never persisted.
pub trait ChainDb {
    /// Looks up a stored header by its hash.
    fn header_by_hash(&self, hash: B256) -> Option<BlockHeader>;

    /// The canonical hash at `number`, if any block has been canonicalized there.
    fn hash_by_number(&self, number: u64) -> Option<B256>;

    /// The full stored body (transactions, ommers, withdrawals) for a block hash.
    fn body_by_hash(&self, hash: B256) -> Option<BlockBody>;

    /// The receipts stored for a block hash.
    fn receipts_by_hash(&self, hash: B256) -> Option<Vec<ReceiptEnvelope>>;

    /// Where `tx_hash` was included, if it has been indexed.
    fn transaction_location(&self, tx_hash: B256) -> Option<BlockLocation>;

    /// The current canonical chain head, if one has been set.
    fn canonical_head(&self) -> Option<B256>;

    /// The current header-gap ledger.
    fn gaps(&self) -> ChainGaps;

    /// A block's cumulative pre-Paris difficulty score, if recorded.
    fn score(&self, hash: B256) -> Option<U256>;

    /// Persists a full block (header, body, receipts) and its difficulty
    /// score, independent of canonicalization.
    fn put_block(&mut self, block: &Block, receipts: &[ReceiptEnvelope], score: U256);

    /// Indexes `tx_hash` as included at `location`.
    fn put_transaction_location(&mut self, tx_hash: B256, location: BlockLocation);

    /// Removes `tx_hash`'s index, used when decanonicalizing a branch.
    fn remove_transaction_location(&mut self, tx_hash: B256);

    /// Records `hash` as the canonical block at `number`.
    fn canonicalize(&mut self, number: u64, hash: B256);

    /// Removes the canonical pointer at `number`.
    fn decanonicalize(&mut self, number: u64);

    /// Sets the canonical chain head.
    fn set_canonical_head(&mut self, hash: B256);

    /// Overwrites the header-gap ledger.
    fn set_gaps(&mut self, gaps: ChainGaps);
}

/// An in-memory [`ChainDb`], used in tests and for ephemeral execution.
#[derive(Debug, Default)]
pub struct InMemoryChainDb {
    headers: HashMap<B256, BlockHeader>,
    bodies: HashMap<B256, BlockBody>,
    receipts: HashMap<B256, Vec<ReceiptEnvelope>>,
    scores: HashMap<B256, U256>,
    number_to_hash: HashMap<u64, B256>,
    tx_location: HashMap<B256, BlockLocation>,
    canonical_head: Option<B256>,
    gaps: ChainGaps,
}

impl ChainDb for InMemoryChainDb {
    fn header_by_hash(&self, hash: B256) -> Option<BlockHeader> {
        self.headers.get(&hash).cloned()
    }

    fn hash_by_number(&self, number: u64) -> Option<B256> {
        self.number_to_hash.get(&number).copied()
    }

    fn body_by_hash(&self, hash: B256) -> Option<BlockBody> {
        self.bodies.get(&hash).cloned()
    }

    fn receipts_by_hash(&self, hash: B256) -> Option<Vec<ReceiptEnvelope>> {
        self.receipts.get(&hash).cloned()
    }

    fn transaction_location(&self, tx_hash: B256) -> Option<BlockLocation> {
        self.tx_location.get(&tx_hash).copied()
    }

    fn canonical_head(&self) -> Option<B256> {
        self.canonical_head
    }

    fn gaps(&self) -> ChainGaps {
        self.gaps.clone()
    }

    fn score(&self, hash: B256) -> Option<U256> {
        self.scores.get(&hash).copied()
    }

    fn put_block(&mut self, block: &Block, receipts: &[ReceiptEnvelope], score: U256) {
        let hash = block.hash();
        self.headers.insert(hash, block.header.clone());
        self.bodies.insert(hash, block.body.clone());
        self.receipts.insert(hash, receipts.to_vec());
        self.scores.insert(hash, score);
    }

    fn put_transaction_location(&mut self, tx_hash: B256, location: BlockLocation) {
        self.tx_location.insert(tx_hash, location);
    }

    fn remove_transaction_location(&mut self, tx_hash: B256) {
        self.tx_location.remove(&tx_hash);
    }

    fn canonicalize(&mut self, number: u64, hash: B256) {
        self.number_to_hash.insert(number, hash);
    }

    fn decanonicalize(&mut self, number: u64) {
        self.number_to_hash.remove(&number);
    }

    fn set_canonical_head(&mut self, hash: B256) {
        self.canonical_head = Some(hash);
    }

    fn set_gaps(&mut self, gaps: ChainGaps) {
        self.gaps = gaps;
    }
}

const CANONICAL_HEAD_KEY: &[u8] = b"v1:canonical_head_hash";
const CHAIN_GAPS_KEY: &[u8] = b"v1:header_chain_gaps";

fn number_to_hash_key(number: u64) -> Vec<u8> {
    let mut key = Vec::from(*b"block-number-to-hash:");
    key.extend_from_slice(&number.to_be_bytes());
    key
}

fn score_key(hash: B256) -> Vec<u8> {
    let mut key = Vec::from(*b"block-hash-to-score:");
    key.extend_from_slice(hash.as_slice());
    key
}

fn tx_location_key(tx_hash: B256) -> Vec<u8> {
    let mut key = Vec::from(*b"transaction-hash-to-block:");
    key.extend_from_slice(tx_hash.as_slice());
    key
}

fn body_key(hash: B256) -> Vec<u8> {
    let mut key = Vec::from(*b"ward-chain:body:");
    key.extend_from_slice(hash.as_slice());
    key
}

fn receipts_key(hash: B256) -> Vec<u8> {
    let mut key = Vec::from(*b"ward-chain:receipts:");
    key.extend_from_slice(hash.as_slice());
    key
}

fn encode_location(location: BlockLocation) -> Vec<u8> {
    let payload_length = location.block_number.length() + location.index.length();
    let mut out = Vec::with_capacity(alloy_rlp::length_of_length(payload_length) + payload_length);
    RlpHeader { list: true, payload_length }.encode(&mut out);
    location.block_number.encode(&mut out);
    location.index.encode(&mut out);
    out
}

fn decode_location(mut buf: &[u8]) -> Option<BlockLocation> {
    let header = RlpHeader::decode(&mut buf).ok()?;
    if !header.list {
        return None;
    }
    let block_number = u64::decode(&mut buf).ok()?;
    let index = u64::decode(&mut buf).ok()?;
    Some(BlockLocation { block_number, index })
}

fn encode_transactions(transactions: &[Transaction], out: &mut Vec<u8>) {
    let mut inner = Vec::new();
    for tx in transactions {
        tx.encode_for_rlp_container(&mut inner);
    }
    RlpHeader { list: true, payload_length: inner.len() }.encode(out);
    out.extend_from_slice(&inner);
}

fn decode_transactions(buf: &mut &[u8]) -> alloy_rlp::Result<Vec<Transaction>> {
    let header = RlpHeader::decode(buf)?;
    if !header.list {
        return Err(alloy_rlp::Error::UnexpectedString);
    }
    let mut body = &buf[..header.payload_length];
    *buf = &buf[header.payload_length..];
    let mut out = Vec::new();
    while !body.is_empty() {
        out.push(Transaction::decode_from_rlp_container(&mut body)?);
    }
    Ok(out)
}

fn encode_withdrawals(withdrawals: &Option<Vec<Withdrawal>>, out: &mut Vec<u8>) {
    match withdrawals {
        None => out.put_u8(alloy_rlp::EMPTY_STRING_CODE),
        Some(list) => list.encode(out),
    }
}

fn decode_withdrawals(buf: &mut &[u8]) -> alloy_rlp::Result<Option<Vec<Withdrawal>>> {
    if buf.first() == Some(&alloy_rlp::EMPTY_STRING_CODE) {
        *buf = &buf[1..];
        return Ok(None);
    }
    Ok(Some(Vec::<Withdrawal>::decode(buf)?))
}

fn encode_body(body: &BlockBody) -> Vec<u8> {
    let mut transactions = Vec::new();
    encode_transactions(&body.transactions, &mut transactions);
    let mut ommers = Vec::new();
    body.ommers.encode(&mut ommers);
    let mut withdrawals = Vec::new();
    encode_withdrawals(&body.withdrawals, &mut withdrawals);

    let payload_length = transactions.len() + ommers.len() + withdrawals.len();
    let mut out = Vec::with_capacity(alloy_rlp::length_of_length(payload_length) + payload_length);
    RlpHeader { list: true, payload_length }.encode(&mut out);
    out.extend_from_slice(&transactions);
    out.extend_from_slice(&ommers);
    out.extend_from_slice(&withdrawals);
    out
}

fn decode_body(mut buf: &[u8]) -> Option<BlockBody> {
    let header = RlpHeader::decode(&mut buf).ok()?;
    if !header.list {
        return None;
    }
    let transactions = decode_transactions(&mut buf).ok()?;
    let ommers = Vec::<BlockHeader>::decode(&mut buf).ok()?;
    let withdrawals = decode_withdrawals(&mut buf).ok()?;
    Some(BlockBody { transactions, ommers, withdrawals })
}

fn encode_receipts(receipts: &[ReceiptEnvelope]) -> Vec<u8> {
    let mut inner = Vec::new();
    for receipt in receipts {
        receipt.encode_for_rlp_container(&mut inner);
    }
    let mut out = Vec::with_capacity(alloy_rlp::length_of_length(inner.len()) + inner.len());
    RlpHeader { list: true, payload_length: inner.len() }.encode(&mut out);
    out.extend_from_slice(&inner);
    out
}

fn decode_receipts(mut buf: &[u8]) -> Option<Vec<ReceiptEnvelope>> {
    let header = RlpHeader::decode(&mut buf).ok()?;
    if !header.list {
        return None;
    }
    let mut body = &buf[..header.payload_length];
    let mut out = Vec::new();
    while !body.is_empty() {
        out.push(ReceiptEnvelope::decode_from_rlp_container(&mut body).ok()?);
    }
    Some(out)
}

const HEADER_CACHE_CAPACITY: usize = 1024;

/// A [`ChainDb`] over an on-disk RocksDB instance, keyed exactly per the
/// workspace's persisted-state layout (`block-number-to-hash:<u64_be>`,
/// `transaction-hash-to-block:<hash>`, `v1:canonical_head_hash`,
/// `v1:header_chain_gaps`, headers under their own `keccak(rlp(header))`).
///
/// Block bodies and receipts are not named by the persisted layout's key
/// list; they are stored under a `ward-chain:` prefix so reorg bookkeeping
/// (looking up which transaction hashes a decanonicalized block contained)
/// does not depend on the caller re-supplying the block.
///
/// Headers are re-read once per imported block (parent lookup, reorg
/// walk-back) and rarely change once written, so they are cached in front of
/// the RocksDB read path the same way a chain-following RPC provider caches
/// the headers it has already fetched.
pub struct RocksChainDb {
    db: rocksdb::DB,
    header_cache: std::sync::Mutex<lru::LruCache<B256, BlockHeader>>,
}

impl std::fmt::Debug for RocksChainDb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RocksChainDb").finish_non_exhaustive()
    }
}

impl RocksChainDb {
    /// Opens (creating if absent) a RocksDB instance at `path`.
    pub fn open(path: &std::path::Path) -> Result<Self, rocksdb::Error> {
        let mut opts = rocksdb::Options::default();
        opts.create_if_missing(true);
        let db = rocksdb::DB::open(&opts, path)?;
        let header_cache = std::sync::Mutex::new(lru::LruCache::new(
            std::num::NonZeroUsize::new(HEADER_CACHE_CAPACITY).unwrap(),
        ));
        Ok(Self { db, header_cache })
    }

    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.db.get(key).ok().flatten()
    }

    fn put(&self, key: &[u8], value: &[u8]) {
        let _ = self.db.put(key, value);
    }

    fn delete(&self, key: &[u8]) {
        let _ = self.db.delete(key);
    }
}

impl ChainDb for RocksChainDb {
    fn header_by_hash(&self, hash: B256) -> Option<BlockHeader> {
        if let Some(header) = self.header_cache.lock().unwrap().get(&hash) {
            return Some(header.clone());
        }
        let bytes = self.get(hash.as_slice())?;
        let header = BlockHeader::decode(&mut bytes.as_slice()).ok()?;
        self.header_cache.lock().unwrap().put(hash, header.clone());
        Some(header)
    }

    fn hash_by_number(&self, number: u64) -> Option<B256> {
        let bytes = self.get(&number_to_hash_key(number))?;
        B256::decode(&mut bytes.as_slice()).ok()
    }

    fn body_by_hash(&self, hash: B256) -> Option<BlockBody> {
        let bytes = self.get(&body_key(hash))?;
        decode_body(&bytes)
    }

    fn receipts_by_hash(&self, hash: B256) -> Option<Vec<ReceiptEnvelope>> {
        let bytes = self.get(&receipts_key(hash))?;
        decode_receipts(&bytes)
    }

    fn transaction_location(&self, tx_hash: B256) -> Option<BlockLocation> {
        let bytes = self.get(&tx_location_key(tx_hash))?;
        decode_location(&bytes)
    }

    fn canonical_head(&self) -> Option<B256> {
        let bytes = self.get(CANONICAL_HEAD_KEY)?;
        (bytes.len() == 32).then(|| B256::from_slice(&bytes))
    }

    fn gaps(&self) -> ChainGaps {
        self.get(CHAIN_GAPS_KEY)
            .and_then(|bytes| ChainGaps::decode(&mut bytes.as_slice()).ok())
            .unwrap_or_default()
    }

    fn score(&self, hash: B256) -> Option<U256> {
        let bytes = self.get(&score_key(hash))?;
        U256::decode(&mut bytes.as_slice()).ok()
    }

    fn put_block(&mut self, block: &Block, receipts: &[ReceiptEnvelope], score: U256) {
        let hash = block.hash();
        let mut header_bytes = Vec::new();
        block.header.encode(&mut header_bytes);
        self.put(hash.as_slice(), &header_bytes);
        self.put(&body_key(hash), &encode_body(&block.body));
        self.put(&receipts_key(hash), &encode_receipts(receipts));

        let mut score_bytes = Vec::new();
        score.encode(&mut score_bytes);
        self.put(&score_key(hash), &score_bytes);

        self.header_cache.lock().unwrap().put(hash, block.header.clone());
    }

    fn put_transaction_location(&mut self, tx_hash: B256, location: BlockLocation) {
        self.put(&tx_location_key(tx_hash), &encode_location(location));
    }

    fn remove_transaction_location(&mut self, tx_hash: B256) {
        self.delete(&tx_location_key(tx_hash));
    }

    fn canonicalize(&mut self, number: u64, hash: B256) {
        let mut hash_bytes = Vec::new();
        hash.encode(&mut hash_bytes);
        self.put(&number_to_hash_key(number), &hash_bytes);
    }

    fn decanonicalize(&mut self, number: u64) {
        self.delete(&number_to_hash_key(number));
    }

    fn set_canonical_head(&mut self, hash: B256) {
        self.put(CANONICAL_HEAD_KEY, hash.as_slice());
    }

    fn set_gaps(&mut self, gaps: ChainGaps) {
        let mut bytes = Vec::new();
        gaps.encode(&mut bytes);
        self.put(CHAIN_GAPS_KEY, &bytes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::Block;
    use ward_primitives::header::BlockHeader;

    fn sample_block(number: u64, parent_hash: B256) -> Block {
        let header = BlockHeader { number, parent_hash, ..BlockHeader::default() };
        Block { header, body: BlockBody::default() }
    }

    #[test]
    fn in_memory_db_round_trips_a_block() {
        let mut db = InMemoryChainDb::default();
        let block = sample_block(1, B256::ZERO);
        let hash = block.hash();
        db.put_block(&block, &[], U256::from(100));

        assert_eq!(db.header_by_hash(hash).unwrap().number, 1);
        assert!(db.body_by_hash(hash).is_some());
        assert_eq!(db.score(hash), Some(U256::from(100)));
    }

    #[test]
    fn in_memory_db_tracks_canonical_pointers() {
        let mut db = InMemoryChainDb::default();
        let block = sample_block(1, B256::ZERO);
        let hash = block.hash();
        db.canonicalize(1, hash);
        db.set_canonical_head(hash);
        assert_eq!(db.hash_by_number(1), Some(hash));
        assert_eq!(db.canonical_head(), Some(hash));

        db.decanonicalize(1);
        assert_eq!(db.hash_by_number(1), None);
    }

    #[test]
    fn in_memory_db_tracks_transaction_locations() {
        let mut db = InMemoryChainDb::default();
        let tx_hash = B256::repeat_byte(7);
        db.put_transaction_location(tx_hash, BlockLocation { block_number: 5, index: 2 });
        assert_eq!(db.transaction_location(tx_hash), Some(BlockLocation { block_number: 5, index: 2 }));
        db.remove_transaction_location(tx_hash);
        assert_eq!(db.transaction_location(tx_hash), None);
    }

    #[test]
    fn location_rlp_round_trips() {
        let location = BlockLocation { block_number: 42, index: 3 };
        let encoded = encode_location(location);
        assert_eq!(decode_location(&encoded), Some(location));
    }
}
