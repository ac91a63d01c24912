//! Errors a running [`crate::frame::Computation`] can raise.

/// A failure inside a call frame. Every variant carries, via
/// [`VMError::burns_gas`] and [`VMError::erases_return_data`], how the
/// frame's parent must react — Revert is the only variant that returns
/// unspent gas and preserves return data.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum VMError {
    /// Not enough gas remained to pay for an opcode's static or dynamic cost.
    #[error("out of gas")]
    OutOfGas,
    /// Stack underflow: an opcode popped more items than were present.
    #[error("stack underflow")]
    InsufficientStack,
    /// Stack overflow: a push would exceed the 1024-item depth limit.
    #[error("stack overflow")]
    FullStack,
    /// `JUMP`/`JUMPI` targeted a position that is not a valid `JUMPDEST`.
    #[error("invalid jump destination")]
    InvalidJumpDestination,
    /// The opcode byte has no defined instruction under the active fork.
    #[error("invalid instruction")]
    InvalidInstruction,
    /// A `CALL` or top-level message carried more value than the sender holds.
    #[error("insufficient funds for transfer")]
    InsufficientFunds,
    /// Call depth exceeded 1024.
    #[error("stack depth limit exceeded")]
    StackDepthLimit,
    /// `CREATE`/`CREATE2` targeted an address that already has code or a nonzero nonce.
    #[error("contract creation collision")]
    ContractCreationCollision,
    /// The computed `CREATE2` address did not match an externally expected one.
    #[error("incorrect contract creation address")]
    IncorrectContractCreationAddress,
    /// `REVERT`: unwinds the frame but does not burn gas or erase return data.
    #[error("execution reverted")]
    Revert,
    /// A state-modifying opcode ran inside a `STATICCALL` context.
    #[error("write protection violated in static context")]
    WriteProtection,
    /// A read reached past the bounds of return data or similar fixed buffer.
    #[error("out of bounds read")]
    OutOfBoundsRead,
    /// Deployed code begins with the reserved `0xEF` byte (EIP-3541).
    #[error("reserved bytes in code")]
    ReservedBytesInCode,
}

impl VMError {
    /// Whether unspent gas is burned (forfeited) when this error terminates a frame.
    pub const fn burns_gas(&self) -> bool {
        !matches!(self, Self::Revert)
    }

    /// Whether the parent's view of this frame's return data is erased.
    pub const fn erases_return_data(&self) -> bool {
        !matches!(self, Self::Revert)
    }
}
