//! Address-to-implementation routing, gated by the active hard fork.

use crate::{addresses, bn128, ecrecover, hash, modexp, point_evaluation};
use crate::errors::PrecompileError;
use alloy_primitives::{Address, Bytes};
use c_kzg::KzgSettings;
use ward_forks::Fork;

/// Returns `true` if `address` names a precompile under `fork`.
pub fn is_precompile(address: Address, fork: Fork) -> bool {
    precompile_gas_cost(address, fork, &[]).is_some()
}

/// Computes the gas cost of calling the precompile at `address` with
/// `input`, or `None` if no precompile lives at that address under `fork`.
///
/// `BLAKE2F`'s cost depends on a well-formed input; a malformed call is
/// reported as [`PrecompileError::InvalidInput`] by [`execute`], not here —
/// callers that only want cost should treat a `0` from this path as "pay for
/// 213 zero bytes", letting `execute` raise the real error.
pub fn precompile_gas_cost(address: Address, fork: Fork, input: &[u8]) -> Option<u64> {
    match address {
        addresses::ECRECOVER => Some(ecrecover::GAS_COST),
        addresses::SHA256 => Some(hash::sha256_gas_cost(input.len())),
        addresses::RIPEMD160 => Some(hash::ripemd160_gas_cost(input.len())),
        addresses::IDENTITY => Some(hash::identity_gas_cost(input.len())),
        addresses::MODEXP if fork.is_at_least(Fork::Byzantium) => Some(modexp::gas_cost(input)),
        addresses::BN128_ADD if fork.is_at_least(Fork::Byzantium) => Some(bn128::add_gas_cost(fork)),
        addresses::BN128_MUL if fork.is_at_least(Fork::Byzantium) => Some(bn128::mul_gas_cost(fork)),
        addresses::BN128_PAIRING if fork.is_at_least(Fork::Byzantium) => {
            Some(bn128::pairing_gas_cost(fork, input.len()))
        }
        addresses::BLAKE2F if fork.is_at_least(Fork::Istanbul) => crate::blake2f::gas_cost(input).ok(),
        addresses::POINT_EVALUATION if fork.is_at_least(Fork::Cancun) => {
            Some(point_evaluation::GAS_COST)
        }
        _ => None,
    }
}

/// Runs the precompile at `address` against `input`. `kzg_settings` is only
/// consulted by the point-evaluation precompile (`0x0a`); every other
/// address ignores it.
///
/// Returns `Err(PrecompileError::NotAPrecompile)` if `address` is not a
/// precompile under `fork`, so callers can treat "not a precompile" and
/// "precompile rejected its input" uniformly as frame-terminating errors.
pub fn execute(
    address: Address,
    input: &[u8],
    fork: Fork,
    kzg_settings: &KzgSettings,
) -> Result<Bytes, PrecompileError> {
    match address {
        addresses::ECRECOVER => ecrecover::execute(input),
        addresses::SHA256 => hash::sha256(input),
        addresses::RIPEMD160 => hash::ripemd160(input),
        addresses::IDENTITY => hash::identity(input),
        addresses::MODEXP if fork.is_at_least(Fork::Byzantium) => modexp::execute(input),
        addresses::BN128_ADD if fork.is_at_least(Fork::Byzantium) => bn128::add(input),
        addresses::BN128_MUL if fork.is_at_least(Fork::Byzantium) => bn128::mul(input),
        addresses::BN128_PAIRING if fork.is_at_least(Fork::Byzantium) => bn128::pairing(input),
        addresses::BLAKE2F if fork.is_at_least(Fork::Istanbul) => crate::blake2f::execute(input),
        addresses::POINT_EVALUATION if fork.is_at_least(Fork::Cancun) => {
            point_evaluation::execute(input, kzg_settings)
        }
        _ => Err(PrecompileError::NotAPrecompile),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modexp_is_not_a_precompile_before_byzantium() {
        assert!(!is_precompile(addresses::MODEXP, Fork::Homestead));
        assert!(is_precompile(addresses::MODEXP, Fork::Byzantium));
    }

    #[test]
    fn blake2f_gated_to_istanbul() {
        assert!(!is_precompile(addresses::BLAKE2F, Fork::Byzantium));
        assert!(is_precompile(addresses::BLAKE2F, Fork::Istanbul));
    }

    #[test]
    fn point_evaluation_gated_to_cancun() {
        assert!(!is_precompile(addresses::POINT_EVALUATION, Fork::London));
        assert!(is_precompile(addresses::POINT_EVALUATION, Fork::Cancun));
    }

    #[test]
    fn unknown_address_is_not_a_precompile() {
        assert!(!is_precompile(Address::ZERO, Fork::Cancun));
    }
}
