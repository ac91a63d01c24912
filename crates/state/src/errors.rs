//! Errors surfaced by [crate::AccountStateDb].

/// Errors returned by account state operations.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum StateError {
    /// `increment_nonce` would overflow `u64`; fatal, the EVM has no defined
    /// behavior beyond `u64::MAX` nonces.
    #[error("nonce overflow for account")]
    NonceOverflow,
    /// [crate::AccountStateDb::persist] was called without a preceding
    /// [crate::AccountStateDb::make_state_root] with no intervening writes.
    #[error("state root is stale; call make_state_root before persist")]
    StaleStateRoot,
    /// A checkpoint was committed or discarded out of stack order.
    #[error("checkpoint used out of order")]
    CheckpointOutOfOrder,
}
