//! Header validation failures.

use alloy_primitives::U256;

/// Why a header was rejected by [crate::validate_header].
#[derive(derive_more::Display, Debug)]
pub enum ConsensusError {
    /// `number` did not increase by exactly one over the parent.
    #[display("block number {actual} does not follow parent number {parent}")]
    NonSequentialNumber {
        /// The parent's block number.
        parent: u64,
        /// The block's actual number.
        actual: u64,
    },
    /// `timestamp` did not strictly increase over the parent's.
    #[display("timestamp {actual} does not exceed parent timestamp {parent}")]
    TimestampNotIncreasing {
        /// The parent's timestamp.
        parent: u64,
        /// The block's actual timestamp.
        actual: u64,
    },
    /// `gas_limit` fell outside the `+-1/1024` band around the parent's.
    #[display("gas limit {actual} outside [{lower}, {upper}]")]
    GasLimitOutOfBounds {
        /// Inclusive lower bound.
        lower: u64,
        /// Inclusive upper bound.
        upper: u64,
        /// The block's actual gas limit.
        actual: u64,
    },
    /// `gas_limit` fell below the network-wide minimum.
    #[display("gas limit {actual} below minimum {minimum}")]
    GasLimitBelowMinimum {
        /// The network minimum.
        minimum: u64,
        /// The block's actual gas limit.
        actual: u64,
    },
    /// `gas_used` exceeded `gas_limit`.
    #[display("gas used {used} exceeds gas limit {limit}")]
    GasUsedExceedsLimit {
        /// The block's gas limit.
        limit: u64,
        /// The block's gas used.
        used: u64,
    },
    /// `extra_data` exceeded the 32-byte cap.
    #[display("extra data length {actual} exceeds maximum {maximum}")]
    ExtraDataTooLong {
        /// The maximum allowed length.
        maximum: usize,
        /// The actual length.
        actual: usize,
    },
    /// `difficulty` did not match the value the formula for the active fork produces.
    #[display("difficulty {actual} does not match expected {expected}")]
    WrongDifficulty {
        /// The expected difficulty.
        expected: U256,
        /// The header's actual difficulty.
        actual: U256,
    },
    /// A header past [ward_forks::Fork::Paris] lacked the proof-of-stake sentinel values.
    #[display("header is missing the post-merge proof-of-stake sentinel values")]
    MissingPoSSentinels,
    /// `base_fee_per_gas` did not match the value EIP-1559 evolution produces.
    #[display("base fee {actual} does not match expected {expected}")]
    WrongBaseFee {
        /// The expected base fee.
        expected: u64,
        /// The header's actual base fee.
        actual: u64,
    },
    /// A header from London onward lacked `base_fee_per_gas`.
    #[display("header is missing base_fee_per_gas at or after the London fork")]
    MissingBaseFee,
    /// A pre-London header carried `base_fee_per_gas`.
    #[display("header carries base_fee_per_gas before the London fork")]
    UnexpectedBaseFee,
    /// `excess_blob_gas` did not match the value EIP-4844 evolution produces.
    #[display("excess blob gas {actual} does not match expected {expected}")]
    WrongExcessBlobGas {
        /// The expected excess blob gas.
        expected: u64,
        /// The header's actual excess blob gas.
        actual: u64,
    },
    /// A header from Cancun onward lacked one of the blob-gas fields.
    #[display("header is missing blob gas fields at or after the Cancun fork")]
    MissingBlobGasFields,
    /// A header from Shanghai onward lacked `withdrawals_root`.
    #[display("header is missing withdrawals_root at or after the Shanghai fork")]
    MissingWithdrawalsRoot,
}

impl core::error::Error for ConsensusError {}

/// The result of header validation.
pub type ConsensusResult<T> = Result<T, ConsensusError>;
