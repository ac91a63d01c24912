//! `0x06 ECADD`, `0x07 ECMUL`, `0x08 ECPAIRING` over the alt_bn128 curve,
//! active from Byzantium. Istanbul (EIP-1108) reprices `ECADD`/`ECMUL`
//! sharply downward; `ECPAIRING`'s base/per-pair costs drop at the same
//! fork.

use crate::errors::PrecompileError;
use alloy_primitives::Bytes;
use bn::{pairing_batch, AffineG1, AffineG2, Fq, Fq2, Group, Gt, G1, G2};
use ward_forks::Fork;

const FIELD_ELEMENT_LEN: usize = 32;
const POINT_LEN: usize = 64;
const PAIR_LEN: usize = 192;

/// `ECADD` gas cost.
pub const fn add_gas_cost(fork: Fork) -> u64 {
    if fork.is_at_least(Fork::Istanbul) {
        150
    } else {
        500
    }
}

/// `ECMUL` gas cost.
pub const fn mul_gas_cost(fork: Fork) -> u64 {
    if fork.is_at_least(Fork::Istanbul) {
        6_000
    } else {
        40_000
    }
}

/// `ECPAIRING` gas cost for `input_len` bytes of input.
pub fn pairing_gas_cost(fork: Fork, input_len: usize) -> u64 {
    let pairs = (input_len / PAIR_LEN) as u64;
    if fork.is_at_least(Fork::Istanbul) {
        34_000 * pairs + 45_000
    } else {
        80_000 * pairs + 100_000
    }
}

fn read_fq(bytes: &[u8]) -> Result<Fq, PrecompileError> {
    Fq::from_slice(bytes).map_err(|_| PrecompileError::InvalidInput("invalid bn128 field element".into()))
}

fn read_point(bytes: &[u8]) -> Result<G1, PrecompileError> {
    let x = read_fq(&bytes[0..FIELD_ELEMENT_LEN])?;
    let y = read_fq(&bytes[FIELD_ELEMENT_LEN..POINT_LEN])?;
    if x.is_zero() && y.is_zero() {
        return Ok(G1::zero());
    }
    AffineG1::new(x, y)
        .map(Into::into)
        .map_err(|_| PrecompileError::InvalidInput("point not on bn128 curve".into()))
}

fn write_point(point: G1) -> Bytes {
    let mut out = [0u8; POINT_LEN];
    if let Some(affine) = AffineG1::from_jacobian(point) {
        affine.x().to_big_endian(&mut out[0..FIELD_ELEMENT_LEN]).ok();
        affine.y().to_big_endian(&mut out[FIELD_ELEMENT_LEN..POINT_LEN]).ok();
    }
    Bytes::copy_from_slice(&out)
}

fn pad_to(input: &[u8], len: usize) -> Vec<u8> {
    let mut out = vec![0u8; len];
    let n = input.len().min(len);
    out[..n].copy_from_slice(&input[..n]);
    out
}

/// `ECADD`: `p1 + p2`.
pub fn add(input: &[u8]) -> Result<Bytes, PrecompileError> {
    let input = pad_to(input, 2 * POINT_LEN);
    let p1 = read_point(&input[0..POINT_LEN])?;
    let p2 = read_point(&input[POINT_LEN..2 * POINT_LEN])?;
    Ok(write_point(p1 + p2))
}

/// `ECMUL`: `p1 * scalar`.
pub fn mul(input: &[u8]) -> Result<Bytes, PrecompileError> {
    let input = pad_to(input, POINT_LEN + FIELD_ELEMENT_LEN);
    let p1 = read_point(&input[0..POINT_LEN])?;
    let scalar = bn::Fr::from_slice(&input[POINT_LEN..POINT_LEN + FIELD_ELEMENT_LEN])
        .map_err(|_| PrecompileError::InvalidInput("invalid bn128 scalar".into()))?;
    Ok(write_point(p1 * scalar))
}

/// `ECPAIRING`: returns 32-byte `1` if the pairing product equals the
/// identity, `0` otherwise. Input length must be a multiple of 192 bytes.
pub fn pairing(input: &[u8]) -> Result<Bytes, PrecompileError> {
    if input.len() % PAIR_LEN != 0 {
        return Err(PrecompileError::InvalidInput(
            "ecpairing input length must be a multiple of 192".into(),
        ));
    }

    let mut pairs = Vec::with_capacity(input.len() / PAIR_LEN);
    for chunk in input.chunks_exact(PAIR_LEN) {
        let g1 = read_point(&chunk[0..POINT_LEN])?;
        let x = Fq2::new(read_fq(&chunk[96..128])?, read_fq(&chunk[64..96])?);
        let y = Fq2::new(read_fq(&chunk[160..192])?, read_fq(&chunk[128..160])?);
        let g2: G2 = if x.is_zero() && y.is_zero() {
            G2::zero()
        } else {
            AffineG2::new(x, y)
                .map(Into::into)
                .map_err(|_| PrecompileError::InvalidInput("point not on bn128 twist".into()))?
        };
        pairs.push((g1, g2));
    }

    let result = pairing_batch(&pairs) == Gt::one();
    let mut out = [0u8; 32];
    if result {
        out[31] = 1;
    }
    Ok(Bytes::copy_from_slice(&out))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_identity_is_identity() {
        let input = [0u8; 128];
        let out = add(&input).unwrap();
        assert_eq!(out.as_ref(), &[0u8; 64]);
    }

    #[test]
    fn pairing_rejects_misaligned_input() {
        assert!(pairing(&[0u8; 10]).is_err());
    }

    #[test]
    fn pairing_of_empty_input_is_true() {
        let out = pairing(&[]).unwrap();
        assert_eq!(out[31], 1);
    }

    #[test]
    fn istanbul_reprices_add_and_mul() {
        assert_eq!(add_gas_cost(Fork::Byzantium), 500);
        assert_eq!(add_gas_cost(Fork::Istanbul), 150);
        assert_eq!(mul_gas_cost(Fork::Byzantium), 40_000);
        assert_eq!(mul_gas_cost(Fork::Istanbul), 6_000);
    }
}
