//! Trie root computation.
//!
//! Rather than maintain a persistent node-by-node trie on disk, state roots
//! are recomputed from the full set of leaves each time one is requested:
//! accounts/storage slots are kept in [ward_state](../ward_state/index.html)'s
//! flat maps, and [state_root]/[storage_root] fold them into an
//! [alloy_trie::HashBuilder] in hashed-key order. This trades some
//! recomputation cost for not needing to persist or prove individual trie
//! nodes, which this engine never exposes to callers.

use alloy_primitives::{keccak256, Bytes, B256, U256};
use alloy_rlp::{BufMut, Decodable, Encodable, Header};
use alloy_trie::{HashBuilder, Nibbles};
use ward_primitives::Account;

/// Computes the ordered-list trie root used for transactions, receipts, and
/// withdrawals: `root(rlp(index) -> encode(item))` over `0..items.len()`.
///
/// Grounded in the index-key RLP encoding used for Ethereum's transaction and
/// receipt tries (the key is the item's position in the block, RLP-encoded).
pub fn ordered_root<T, F>(items: &[T], mut encode: F) -> B256
where
    F: FnMut(&T, &mut dyn BufMut),
{
    let mut hb = HashBuilder::default();
    let mut index_buf = Vec::new();
    let mut value_buf = Vec::new();
    for (i, item) in items.iter().enumerate() {
        index_buf.clear();
        i.encode(&mut index_buf);
        value_buf.clear();
        encode(item, &mut value_buf);
        hb.add_leaf(Nibbles::unpack(&index_buf), &value_buf);
    }
    hb.root()
}

/// One account leaf contributing to [state_root]: the account's hashed
/// address and its RLP-encoded trie representation.
pub struct AccountLeaf {
    /// `keccak256(address)`.
    pub hashed_address: B256,
    /// The account, with `storage_root` already set from that account's own
    /// [storage_root] computation.
    pub account: Account,
}

/// Computes the world state trie root from a set of account leaves.
///
/// Leaves are sorted by hashed address before insertion; [HashBuilder]
/// requires leaves to be added in ascending nibble-path order.
pub fn state_root(mut leaves: Vec<AccountLeaf>) -> B256 {
    leaves.sort_by_key(|leaf| leaf.hashed_address);
    let mut hb = HashBuilder::default();
    let mut buf = Vec::new();
    for leaf in &leaves {
        buf.clear();
        leaf.account.encode(&mut buf);
        hb.add_leaf(Nibbles::unpack(leaf.hashed_address), &buf);
    }
    hb.root()
}

/// Computes an account's storage trie root from its non-zero storage slots.
///
/// Storage values are RLP-encoded as `U256` with leading zero bytes
/// stripped, matching Ethereum's storage trie leaf encoding. Slots holding
/// the zero value are not represented in the trie at all and must be
/// excluded by the caller.
pub fn storage_root(slots: &[(B256, U256)]) -> B256 {
    let mut hashed: Vec<(B256, U256)> =
        slots.iter().map(|(slot, value)| (keccak256(slot.as_slice()), *value)).collect();
    hashed.sort_by_key(|(hashed_slot, _)| *hashed_slot);

    let mut hb = HashBuilder::default();
    let mut buf = Vec::new();
    for (hashed_slot, value) in &hashed {
        buf.clear();
        value.encode(&mut buf);
        hb.add_leaf(Nibbles::unpack(hashed_slot), &buf);
    }
    hb.root()
}

/// Decodes a length-prefixed RLP list payload length, used when walking a
/// block body to count transactions/withdrawals without fully decoding each.
pub fn rlp_list_len(buf: &mut &[u8]) -> alloy_rlp::Result<usize> {
    let header = Header::decode(buf)?;
    if !header.list {
        return Err(alloy_rlp::Error::UnexpectedString);
    }
    Ok(header.payload_length)
}

/// Wraps an already-RLP-encoded item as an opaque [Bytes] value, used when a
/// typed transaction/receipt must itself be treated as a trie leaf value.
pub fn as_leaf_value(encoded: Vec<u8>) -> Bytes {
    Bytes::from(encoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::Address;

    #[test]
    fn empty_ordered_root_is_empty_trie_root() {
        let items: Vec<u8> = Vec::new();
        let root = ordered_root(&items, |_, _| {});
        assert_eq!(root, alloy_trie::EMPTY_ROOT_HASH);
    }

    #[test]
    fn state_root_changes_with_account_balance() {
        let address = Address::repeat_byte(1);
        let hashed_address = keccak256(address.as_slice());

        let base = Account { nonce: 0, balance: U256::from(1), ..Default::default() };
        let root_a = state_root(vec![AccountLeaf { hashed_address, account: base }]);

        let bumped = Account { nonce: 0, balance: U256::from(2), ..Default::default() };
        let root_b = state_root(vec![AccountLeaf { hashed_address, account: bumped }]);

        assert_ne!(root_a, root_b);
    }

    #[test]
    fn storage_root_is_empty_when_no_slots_set() {
        assert_eq!(storage_root(&[]), alloy_trie::EMPTY_ROOT_HASH);
    }

    #[test]
    fn storage_root_is_order_independent() {
        let a = (B256::repeat_byte(1), U256::from(10));
        let b = (B256::repeat_byte(2), U256::from(20));
        assert_eq!(storage_root(&[a, b]), storage_root(&[b, a]));
    }
}
