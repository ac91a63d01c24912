//! The [Log] type, emitted by the `LOG0`..`LOG4` opcodes.

use alloy_primitives::{Address, Bloom, Bytes, B256};
use alloy_rlp::{RlpDecodable, RlpEncodable};

/// A single event log entry.
#[derive(Clone, Debug, PartialEq, Eq, RlpEncodable, RlpDecodable)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Log {
    /// The address of the contract that emitted the log.
    pub address: Address,
    /// Indexed topics, at most 4 (`LOG0` has none, `LOG4` has four).
    pub topics: Vec<B256>,
    /// Unindexed log data.
    pub data: Bytes,
}

impl Log {
    /// Folds this log's address and topics into `bloom`.
    pub fn add_to_bloom(&self, bloom: &mut Bloom) {
        bloom.accrue(alloy_primitives::bloom::BloomInput::Raw(self.address.as_slice()));
        for topic in &self.topics {
            bloom.accrue(alloy_primitives::bloom::BloomInput::Raw(topic.as_slice()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bloom_accumulates_address_and_topics() {
        let log = Log { address: Address::repeat_byte(1), topics: vec![B256::repeat_byte(2)], data: Bytes::new() };
        let mut bloom = Bloom::ZERO;
        log.add_to_bloom(&mut bloom);
        assert_ne!(bloom, Bloom::ZERO);
    }
}
