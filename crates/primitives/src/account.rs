//! The [Account] type.

use crate::header::EMPTY_ROOT_HASH;
use alloy_primitives::{keccak256, B256, U256};
use alloy_rlp::{RlpDecodable, RlpEncodable};

/// `keccak256("")`, the code hash of an account with no code.
pub const EMPTY_CODE_HASH: B256 = B256::new([
    0xc5, 0xd2, 0x46, 0x01, 0x86, 0xf7, 0x23, 0x3c, 0x92, 0x7e, 0x7d, 0xb2, 0xdc, 0xc7, 0x03, 0xc0,
    0xe5, 0x00, 0xb6, 0x53, 0xca, 0x82, 0x27, 0x3b, 0x7b, 0xfa, 0xd8, 0x04, 0x5d, 0x85, 0xa4, 0x70,
]);

/// An Ethereum account as represented in the state trie.
///
/// Storage is not embedded here: it lives in a separate per-account trie whose
/// root is [Account::storage_root]. The account database (`ward-state`) is
/// responsible for keeping `storage_root` and `code_hash` in sync with the
/// journaled storage and code maps.
#[derive(Clone, Copy, Debug, PartialEq, Eq, RlpEncodable, RlpDecodable)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Account {
    /// Number of transactions sent from this account, or (for contracts) the
    /// number of contract-creations.
    pub nonce: u64,
    /// Account balance, in wei.
    pub balance: U256,
    /// Root of this account's storage trie.
    pub storage_root: B256,
    /// `keccak256` of this account's code.
    pub code_hash: B256,
}

impl Default for Account {
    fn default() -> Self {
        Self { nonce: 0, balance: U256::ZERO, storage_root: EMPTY_ROOT_HASH, code_hash: EMPTY_CODE_HASH }
    }
}

impl Account {
    /// An account is empty per EIP-161 iff it has no balance, no nonce, and no code.
    pub fn is_empty(&self) -> bool {
        self.nonce == 0 && self.balance.is_zero() && self.code_hash == EMPTY_CODE_HASH
    }

    /// Whether this account has code or a non-zero nonce (i.e. it is not a
    /// plain EOA with no history).
    pub fn has_code_or_nonce(&self) -> bool {
        self.code_hash != EMPTY_CODE_HASH || self.nonce != 0
    }
}

/// Computes `keccak256` of the given code, returning [EMPTY_CODE_HASH] for empty input.
pub fn code_hash(code: &[u8]) -> B256 {
    if code.is_empty() {
        EMPTY_CODE_HASH
    } else {
        keccak256(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_account_is_empty() {
        assert!(Account::default().is_empty());
    }

    #[test]
    fn funded_account_is_not_empty() {
        let account = Account { balance: U256::from(1), ..Default::default() };
        assert!(!account.is_empty());
    }

    #[test]
    fn empty_code_hash_matches_keccak_of_empty_slice() {
        assert_eq!(code_hash(&[]), EMPTY_CODE_HASH);
        assert_eq!(EMPTY_CODE_HASH, keccak256([]));
    }
}
