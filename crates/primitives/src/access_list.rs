//! EIP-2930 access lists, pre-declaring the addresses/slots a transaction will touch.

use alloy_primitives::{Address, B256};
use alloy_rlp::{RlpDecodable, RlpEncodable};

/// One entry of an [AccessList]: an address plus the storage slots within it
/// to pre-warm.
#[derive(Clone, Debug, Default, PartialEq, Eq, RlpEncodable, RlpDecodable)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AccessListItem {
    /// The address to pre-warm.
    pub address: Address,
    /// The storage slots within `address` to pre-warm.
    pub storage_keys: Vec<B256>,
}

/// A transaction's EIP-2930 access list.
#[derive(Clone, Debug, Default, PartialEq, Eq, RlpEncodable, RlpDecodable)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AccessList(pub Vec<AccessListItem>);

impl AccessList {
    /// Total number of addresses named in the list.
    pub fn address_count(&self) -> usize {
        self.0.len()
    }

    /// Total number of storage keys named across every entry in the list.
    pub fn storage_key_count(&self) -> usize {
        self.0.iter().map(|item| item.storage_keys.len()).sum()
    }

    /// Iterates `(address, slot)` pairs, flattening the per-address slot lists.
    pub fn iter_storage(&self) -> impl Iterator<Item = (Address, B256)> + '_ {
        self.0.iter().flat_map(|item| item.storage_keys.iter().map(move |slot| (item.address, *slot)))
    }

    /// Iterates the addresses named in the list.
    pub fn iter_addresses(&self) -> impl Iterator<Item = Address> + '_ {
        self.0.iter().map(|item| item.address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_addresses_and_keys_independently() {
        let list = AccessList(vec![
            AccessListItem { address: Address::repeat_byte(1), storage_keys: vec![B256::ZERO, B256::repeat_byte(1)] },
            AccessListItem { address: Address::repeat_byte(2), storage_keys: vec![] },
        ]);
        assert_eq!(list.address_count(), 2);
        assert_eq!(list.storage_key_count(), 2);
    }
}
