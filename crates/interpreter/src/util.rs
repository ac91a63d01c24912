//! Small conversions shared across opcode implementations.

use alloy_primitives::{B256, U256};

/// A storage slot key as the state database wants it (`B256`) from the
/// 256-bit word the stack holds it as.
pub fn u256_to_b256(value: U256) -> B256 {
    B256::from(value.to_be_bytes::<32>())
}

/// The stack-word view of a storage slot value read back from the state database.
pub fn b256_to_u256(value: B256) -> U256 {
    U256::from_be_bytes(value.0)
}
