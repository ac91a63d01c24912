//! Merkle-Patricia trie root computation for world state, account storage,
//! and per-block ordered lists (transactions, receipts, withdrawals).

#![warn(missing_docs, unreachable_pub)]

mod root;
pub use root::{as_leaf_value, ordered_root, rlp_list_len, state_root, storage_root, AccountLeaf};

pub use alloy_trie::{Nibbles, EMPTY_ROOT_HASH};
