//! Transaction receipts: per-transaction execution outcome, logs, and bloom.

use crate::log::Log;
use crate::transaction::TxType;
use alloy_primitives::{Bloom, B256};
use alloy_rlp::{Buf, BufMut, Decodable, Encodable, RlpDecodable, RlpEncodable};

/// Pre- or post-Byzantium success discriminant.
///
/// Before Byzantium a receipt carried the post-state root; EIP-658 replaced
/// that with a bare status byte (`0` or `1`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ReceiptOutcome {
    /// Pre-Byzantium: the intermediate state root after this transaction applied.
    StateRoot(B256),
    /// Post-Byzantium (EIP-658): `true` if the transaction succeeded.
    Status(bool),
}

impl Encodable for ReceiptOutcome {
    fn encode(&self, out: &mut dyn BufMut) {
        match self {
            Self::StateRoot(root) => root.encode(out),
            Self::Status(true) => 1u8.encode(out),
            Self::Status(false) => 0u8.encode(out),
        }
    }

    fn length(&self) -> usize {
        match self {
            Self::StateRoot(root) => root.length(),
            Self::Status(_) => 1u8.length(),
        }
    }
}

impl Decodable for ReceiptOutcome {
    fn decode(buf: &mut &[u8]) -> alloy_rlp::Result<Self> {
        // A status byte RLP-encodes to a single byte (0x00, the canonical
        // zero-string encoding, or 0x01). A state root is always the 32-byte
        // string header 0xa0 followed by 32 bytes.
        match buf.first() {
            Some(0x80) | Some(0x01) => {
                let status = u8::decode(buf)?;
                Ok(Self::Status(status != 0))
            }
            _ => Ok(Self::StateRoot(B256::decode(buf)?)),
        }
    }
}

/// The outcome of executing one transaction.
#[derive(Clone, Debug, PartialEq, Eq, RlpEncodable, RlpDecodable)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Receipt {
    /// Success/state-root discriminant.
    pub outcome: ReceiptOutcome,
    /// Total gas used by the block up to and including this transaction.
    pub cumulative_gas_used: u64,
    /// Bloom filter over this transaction's logs' addresses and topics.
    pub logs_bloom: Bloom,
    /// Logs emitted during execution.
    pub logs: Vec<Log>,
}

impl Receipt {
    /// Builds the logs bloom from `logs` and assembles a [Receipt].
    pub fn new(outcome: ReceiptOutcome, cumulative_gas_used: u64, logs: Vec<Log>) -> Self {
        let mut logs_bloom = Bloom::ZERO;
        for log in &logs {
            log.add_to_bloom(&mut logs_bloom);
        }
        Self { outcome, cumulative_gas_used, logs_bloom, logs }
    }

    /// Whether the transaction succeeded, for post-Byzantium receipts.
    /// Pre-Byzantium receipts carry a state root instead and have no direct
    /// success flag; this returns `true` for them as a conservative default,
    /// matching the chain's own success-independent continuation rule.
    pub fn succeeded(&self) -> bool {
        match self.outcome {
            ReceiptOutcome::Status(status) => status,
            ReceiptOutcome::StateRoot(_) => true,
        }
    }
}

/// A receipt together with the [TxType] of the transaction it belongs to.
///
/// Wire representation mirrors [crate::transaction::Transaction]: legacy
/// receipts are a bare RLP list, typed receipts are `type_byte ‖
/// rlp(receipt)` wrapped in an RLP bytestring when embedded in a receipts
/// trie leaf.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReceiptEnvelope {
    /// The type of the transaction this receipt corresponds to.
    pub tx_type: TxType,
    /// The receipt itself.
    pub receipt: Receipt,
}

impl ReceiptEnvelope {
    /// Encodes this receipt for embedding inside a receipts trie leaf.
    pub fn encode_for_rlp_container(&self, out: &mut dyn BufMut) {
        match self.tx_type {
            TxType::Legacy => self.receipt.encode(out),
            other => {
                let mut inner = Vec::new();
                inner.push(other.type_byte().expect("typed receipt always has a type byte"));
                self.receipt.encode(&mut inner);
                alloy_primitives::Bytes::from(inner).encode(out);
            }
        }
    }

    /// Decodes a receipt that was embedded inside a receipts trie leaf.
    pub fn decode_from_rlp_container(buf: &mut &[u8]) -> alloy_rlp::Result<Self> {
        match buf.first() {
            Some(0xc0..=0xff) => {
                let receipt = Receipt::decode(buf)?;
                Ok(Self { tx_type: TxType::Legacy, receipt })
            }
            Some(_) => {
                let bytes = alloy_primitives::Bytes::decode(buf)?;
                let mut body = bytes.as_ref();
                let tx_type = match body.first() {
                    Some(0x01) => TxType::Eip2930,
                    Some(0x02) => TxType::Eip1559,
                    Some(0x03) => TxType::Eip4844,
                    Some(0x04) => TxType::Eip7702,
                    _ => return Err(alloy_rlp::Error::Custom("unknown receipt type")),
                };
                body.advance(1);
                let receipt = Receipt::decode(&mut body)?;
                Ok(Self { tx_type, receipt })
            }
            None => Err(alloy_rlp::Error::InputTooShort),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::Address;
    use alloy_rlp::Encodable;

    #[test]
    fn bloom_is_derived_from_logs_on_construction() {
        let log = Log { address: Address::repeat_byte(4), topics: vec![B256::repeat_byte(5)], data: Default::default() };
        let receipt = Receipt::new(ReceiptOutcome::Status(true), 21000, vec![log]);
        assert_ne!(receipt.logs_bloom, Bloom::ZERO);
    }

    #[test]
    fn status_receipt_roundtrips_through_rlp() {
        let receipt = Receipt::new(ReceiptOutcome::Status(true), 50_000, vec![]);
        let mut buf = Vec::new();
        receipt.encode(&mut buf);
        let decoded = Receipt::decode(&mut buf.as_slice()).unwrap();
        assert_eq!(receipt, decoded);
    }

    #[test]
    fn state_root_receipt_roundtrips_through_rlp() {
        let receipt = Receipt::new(ReceiptOutcome::StateRoot(B256::repeat_byte(9)), 50_000, vec![]);
        let mut buf = Vec::new();
        receipt.encode(&mut buf);
        let decoded = Receipt::decode(&mut buf.as_slice()).unwrap();
        assert_eq!(receipt, decoded);
    }

    #[test]
    fn typed_receipt_envelope_roundtrips() {
        let envelope = ReceiptEnvelope {
            tx_type: TxType::Eip1559,
            receipt: Receipt::new(ReceiptOutcome::Status(false), 30_000, vec![]),
        };
        let mut buf = Vec::new();
        envelope.encode_for_rlp_container(&mut buf);
        let decoded = ReceiptEnvelope::decode_from_rlp_container(&mut buf.as_slice()).unwrap();
        assert_eq!(envelope, decoded);
    }
}
