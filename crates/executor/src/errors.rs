//! Errors for the `ward-executor` crate.

/// The error type for [`crate::TransactionExecutor`].
///
/// [`TransactionExecutor`]: crate::TransactionExecutor
#[derive(derive_more::Display, Debug)]
pub enum ExecutorError {
    /// The sender's nonce did not match the transaction's.
    #[display("nonce mismatch: account has {account}, transaction has {transaction}")]
    NonceMismatch {
        /// The account's current nonce.
        account: u64,
        /// The nonce carried by the transaction.
        transaction: u64,
    },
    /// The sender's balance cannot cover `gas_limit * gas_price + value` (plus
    /// blob gas, for an EIP-4844 transaction).
    #[display("sender balance insufficient to cover upfront cost")]
    InsufficientBalance,
    /// The transaction's gas limit is below the intrinsic cost of merely
    /// including it (EIP-2 base cost, calldata cost, access-list cost,
    /// EIP-7702 authorization cost, EIP-7623 calldata floor).
    #[display("gas limit {limit} below intrinsic gas cost {intrinsic}")]
    IntrinsicGasTooLow {
        /// The transaction's declared gas limit.
        limit: u64,
        /// The computed intrinsic cost.
        intrinsic: u64,
    },
    /// The transaction's gas limit exceeds what remains of the block's gas limit.
    #[display("transaction gas limit {limit} exceeds remaining block gas {remaining}")]
    BlockGasLimitExceeded {
        /// The transaction's declared gas limit.
        limit: u64,
        /// Gas remaining in the block before this transaction.
        remaining: u64,
    },
    /// `max_fee_per_gas` is below the block's base fee (post-London).
    #[display("max fee per gas {max_fee} below block base fee {base_fee}")]
    FeeCapTooLow {
        /// The transaction's `max_fee_per_gas`.
        max_fee: u128,
        /// The block's base fee.
        base_fee: u128,
    },
    /// `max_priority_fee_per_gas` exceeds `max_fee_per_gas`.
    #[display("priority fee {priority} exceeds fee cap {max_fee}")]
    TipAboveFeeCap {
        /// The transaction's `max_priority_fee_per_gas`.
        priority: u128,
        /// The transaction's `max_fee_per_gas`.
        max_fee: u128,
    },
    /// An EIP-4844 transaction carried no blobs, or the blob gas used would
    /// exceed the block's per-block blob gas cap.
    #[display("invalid blob transaction: {reason}")]
    InvalidBlobTransaction {
        /// Human-readable reason, not matched on by callers.
        reason: &'static str,
    },
    /// An EIP-4844 transaction's `max_fee_per_blob_gas` is below the block's blob base fee.
    #[display("blob fee cap {max_fee} below block blob base fee {blob_base_fee}")]
    BlobFeeCapTooLow {
        /// The transaction's `max_fee_per_blob_gas`.
        max_fee: u128,
        /// The block's blob base fee.
        blob_base_fee: u128,
    },
    /// Sender account has code (and isn't a delegated EOA), so it cannot
    /// originate a transaction (EIP-3607).
    #[display("sender account has code and is not a delegated EOA")]
    SenderNotAnEoa,
    /// Recovering the sender from the transaction signature failed.
    #[display("sender recovery failed: {_0}")]
    SenderRecovery(ward_primitives::transaction::SenderRecoveryError),
    /// Recovering an EIP-7702 authorization's authority failed.
    #[display("authorization recovery failed: {_0}")]
    AuthorizationRecovery(ward_primitives::authorization::AuthorizationRecoveryError),
}

impl core::error::Error for ExecutorError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::SenderRecovery(err) => Some(err),
            Self::AuthorizationRecovery(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ward_primitives::transaction::SenderRecoveryError> for ExecutorError {
    fn from(err: ward_primitives::transaction::SenderRecoveryError) -> Self {
        Self::SenderRecovery(err)
    }
}

impl From<ward_primitives::authorization::AuthorizationRecoveryError> for ExecutorError {
    fn from(err: ward_primitives::authorization::AuthorizationRecoveryError) -> Self {
        Self::AuthorizationRecovery(err)
    }
}

/// A [`Result`] type for [`ExecutorError`].
pub type ExecutorResult<T> = Result<T, ExecutorError>;
