//! Well-known precompile addresses, `0x01`-`0x0A`.

use alloy_primitives::{address, Address};

/// `ECRECOVER`.
pub const ECRECOVER: Address = address!("0000000000000000000000000000000000000001");
/// `SHA2-256`.
pub const SHA256: Address = address!("0000000000000000000000000000000000000002");
/// `RIPEMD-160`.
pub const RIPEMD160: Address = address!("0000000000000000000000000000000000000003");
/// `IDENTITY`.
pub const IDENTITY: Address = address!("0000000000000000000000000000000000000004");
/// `MODEXP`.
pub const MODEXP: Address = address!("0000000000000000000000000000000000000005");
/// `ECADD` (bn128 point addition).
pub const BN128_ADD: Address = address!("0000000000000000000000000000000000000006");
/// `ECMUL` (bn128 scalar multiplication).
pub const BN128_MUL: Address = address!("0000000000000000000000000000000000000007");
/// `ECPAIRING` (bn128 pairing check).
pub const BN128_PAIRING: Address = address!("0000000000000000000000000000000000000008");
/// `BLAKE2F` compression function.
pub const BLAKE2F: Address = address!("0000000000000000000000000000000000000009");
/// `KZG_POINT_EVALUATION`.
pub const POINT_EVALUATION: Address = address!("000000000000000000000000000000000000000a");
