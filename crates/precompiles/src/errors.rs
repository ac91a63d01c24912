//! Errors a precompile's execution function can raise.

/// Failure modes for precompile execution. All are fatal to the current
/// call frame, mirroring an ordinary opcode error — a failing precompile
/// burns the gas given to it and reverts state changes made in its frame.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PrecompileError {
    /// Not enough gas was supplied to cover the precompile's cost.
    #[error("out of gas in precompile")]
    OutOfGas,
    /// The input could not be interpreted (wrong length, invalid point encoding, etc).
    #[error("malformed precompile input: {0}")]
    InvalidInput(String),
    /// No precompile is defined at this address for the active fork.
    #[error("no precompile at this address")]
    NotAPrecompile,
}
