//! Errors for the `ward-chain` crate.

use alloy_primitives::B256;

/// The error type for [`crate::Chain::import_block`] and the [`crate::ChainDb`]
/// it drives.
///
/// Mirrors the three-tier split the rest of this workspace uses: a failed
/// header check or execution is an ordinary rejected import
/// ([`Self::HeaderValidation`], [`Self::Execution`], the root-mismatch
/// variants); [`Self::HeaderNotFound`] and [`Self::GapTrackingCorrupted`]
/// indicate the backing store itself is in an inconsistent state and should
/// not be silently recovered from.
#[derive(derive_more::Display, Debug)]
pub enum ChainError {
    /// A header a caller asserted must exist (a parent, a reorg ancestor)
    /// was not found in the backing store.
    #[display("header not found: {hash}")]
    HeaderNotFound {
        /// The missing header's hash.
        hash: B256,
    },
    /// [`crate::gaps::ChainGaps::fill_gap`] observed a block number present
    /// in more than one tracked gap, or a gap whose bounds are inverted.
    /// Indicates the gap ledger itself has drifted from the headers actually
    /// stored, not a rejected block.
    #[display("chain gap tracking is corrupted at block {number}")]
    GapTrackingCorrupted {
        /// The block number whose gap membership was ambiguous.
        number: u64,
    },
    /// The header failed the fork's header-validation rules.
    #[display("header validation failed: {_0}")]
    HeaderValidation(ward_consensus::ConsensusError),
    /// Executing one of the block's transactions failed.
    #[display("transaction execution failed: {_0}")]
    Execution(ward_executor::ExecutorError),
    /// The state root computed after applying the block's transactions and
    /// withdrawals did not match the header's declared `state_root`.
    #[display("state root mismatch: header declares {expected}, computed {actual}")]
    StateRootMismatch {
        /// The header's declared root.
        expected: B256,
        /// The root actually computed.
        actual: B256,
    },
    /// The computed transactions-trie root did not match the header's
    /// `transactions_root`.
    #[display("transactions root mismatch: header declares {expected}, computed {actual}")]
    TransactionsRootMismatch {
        /// The header's declared root.
        expected: B256,
        /// The root actually computed.
        actual: B256,
    },
    /// The computed receipts-trie root did not match the header's
    /// `receipts_root`.
    #[display("receipts root mismatch: header declares {expected}, computed {actual}")]
    ReceiptsRootMismatch {
        /// The header's declared root.
        expected: B256,
        /// The root actually computed.
        actual: B256,
    },
    /// The computed withdrawals-trie root did not match the header's
    /// `withdrawals_root`.
    #[display("withdrawals root mismatch: header declares {expected}, computed {actual}")]
    WithdrawalsRootMismatch {
        /// The header's declared root.
        expected: B256,
        /// The root actually computed.
        actual: B256,
    },
    /// A post-Shanghai block carried no withdrawals list at all.
    #[display("post-Shanghai block is missing its withdrawals list")]
    MissingWithdrawals,
    /// Cumulative gas used across the block's receipts did not match the
    /// header's declared `gas_used`.
    #[display("block gas used mismatch: header declares {expected}, computed {actual}")]
    GasUsedMismatch {
        /// The header's declared total.
        expected: u64,
        /// The total actually accumulated across receipts.
        actual: u64,
    },
    /// Walking a reorg's old branch back toward the new branch never met a
    /// common ancestor before running out of stored headers.
    #[display("no common ancestor found for reorg at block {at_number}")]
    ReorgAncestorNotFound {
        /// The block number import was attempted at.
        at_number: u64,
    },
    /// A block's declared difficulty score could not be read back for reorg
    /// comparison (pre-Paris only; post-Paris chains do not compare scores).
    #[display("missing cumulative difficulty score for block {hash}")]
    MissingScore {
        /// The block whose score is missing.
        hash: B256,
    },
}

impl core::error::Error for ChainError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::HeaderValidation(err) => Some(err),
            Self::Execution(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ward_consensus::ConsensusError> for ChainError {
    fn from(err: ward_consensus::ConsensusError) -> Self {
        Self::HeaderValidation(err)
    }
}

impl From<ward_executor::ExecutorError> for ChainError {
    fn from(err: ward_executor::ExecutorError) -> Self {
        Self::Execution(err)
    }
}

/// A [`Result`] type for [`ChainError`].
pub type ChainResult<T> = Result<T, ChainError>;
