//! A full block: header plus body (transactions, ommers, post-Shanghai
//! withdrawals), and the trie roots committed in its header.

use alloy_primitives::B256;
use ward_primitives::header::BlockHeader;
use ward_primitives::receipt::ReceiptEnvelope;
use ward_primitives::transaction::Transaction;
use ward_primitives::withdrawal::Withdrawal;
use ward_trie::ordered_root;

/// Everything in a block besides its header.
#[derive(Clone, Debug, Default)]
pub struct BlockBody {
    /// The block's transactions, in inclusion order.
    pub transactions: Vec<Transaction>,
    /// Uncle headers; always empty post-Paris.
    pub ommers: Vec<BlockHeader>,
    /// Validator withdrawals, `Some` from Shanghai onward, `None` before.
    pub withdrawals: Option<Vec<Withdrawal>>,
}

/// A full block: its header and everything [`BlockBody`] holds.
#[derive(Clone, Debug)]
pub struct Block {
    /// The block's header.
    pub header: BlockHeader,
    /// The block's body.
    pub body: BlockBody,
}

impl Block {
    /// The block hash, `keccak256(rlp(header))`.
    pub fn hash(&self) -> B256 {
        self.header.hash_slow()
    }
}

/// The transactions-trie root: `root(rlp(index) -> tx)` over `body.transactions`.
///
/// Legacy transactions contribute a bare RLP list leaf value; typed
/// transactions contribute their `type_byte ‖ rlp(fields)` concatenation
/// wrapped in an RLP bytestring, per [`Transaction::encode_for_rlp_container`].
pub fn transactions_root(transactions: &[Transaction]) -> B256 {
    ordered_root(transactions, |tx, out| tx.encode_for_rlp_container(out))
}

/// The receipts-trie root: `root(rlp(index) -> receipt)` over the block's
/// per-transaction receipts, in the same order as `body.transactions`.
pub fn receipts_root(receipts: &[ReceiptEnvelope]) -> B256 {
    ordered_root(receipts, |receipt, out| receipt.encode_for_rlp_container(out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, Bytes, U256};
    use ward_primitives::receipt::{Receipt, ReceiptOutcome};
    use ward_primitives::transaction::{LegacyTx, Signature, TransactionKind};
    use ward_primitives::TxType;

    fn sample_tx(nonce: u64) -> Transaction {
        Transaction::Legacy(LegacyTx {
            nonce,
            gas_price: 1,
            gas_limit: 21_000,
            kind: TransactionKind::Call(Address::repeat_byte(0xaa)),
            value: U256::ZERO,
            input: Bytes::new(),
            chain_id: Some(1),
            signature: Signature { y_parity: 0, r: U256::from(1), s: U256::from(1) },
        })
    }

    #[test]
    fn transactions_root_is_empty_trie_root_with_no_transactions() {
        assert_eq!(transactions_root(&[]), ward_trie::EMPTY_ROOT_HASH);
    }

    #[test]
    fn transactions_root_changes_with_transaction_list() {
        let a = transactions_root(&[sample_tx(0)]);
        let b = transactions_root(&[sample_tx(1)]);
        assert_ne!(a, b);
    }

    #[test]
    fn receipts_root_changes_with_receipt_contents() {
        let a = receipts_root(&[ReceiptEnvelope {
            tx_type: TxType::Legacy,
            receipt: Receipt::new(ReceiptOutcome::Status(true), 21_000, vec![]),
        }]);
        let b = receipts_root(&[ReceiptEnvelope {
            tx_type: TxType::Legacy,
            receipt: Receipt::new(ReceiptOutcome::Status(false), 21_000, vec![]),
        }]);
        assert_ne!(a, b);
    }
}
