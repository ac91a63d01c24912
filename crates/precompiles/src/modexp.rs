//! `0x05 MODEXP`, active from Byzantium. Gas pricing follows EIP-2565
//! (Berlin), which this module implements unconditionally — EIP-2565 is
//! strictly cheaper than the original Byzantium formula and mainnet never
//! ran the old one in anger by the time this dispatch table starts.

use crate::errors::PrecompileError;
use alloy_primitives::Bytes;
use num_bigint::BigUint;

const HEADER_LEN: usize = 96;

struct Lengths {
    base_len: usize,
    exp_len: usize,
    mod_len: usize,
}

fn read_lengths(input: &[u8]) -> Lengths {
    let read_len = |slice: &[u8]| -> usize {
        let mut buf = [0u8; 32];
        let n = slice.len().min(32);
        buf[32 - n..].copy_from_slice(&slice[..n]);
        // Saturate rather than overflow on the (unreachable on real chains) case
        // of a length field exceeding usize::MAX.
        usize::try_from(u64::from_be_bytes(buf[24..32].try_into().unwrap())).unwrap_or(usize::MAX)
    };
    let padded = pad_to(input, HEADER_LEN);
    Lengths {
        base_len: read_len(&padded[0..32]),
        exp_len: read_len(&padded[32..64]),
        mod_len: read_len(&padded[64..96]),
    }
}

fn pad_to(input: &[u8], len: usize) -> Vec<u8> {
    let mut out = vec![0u8; len];
    let n = input.len().min(len);
    out[..n].copy_from_slice(&input[..n]);
    out
}

/// Multiplication complexity per EIP-2565: `ceil(max(base_len,mod_len)/8)^2`.
fn multiplication_complexity(base_len: usize, mod_len: usize) -> u64 {
    let max_len = base_len.max(mod_len) as u64;
    let words = (max_len + 7) / 8;
    words * words
}

/// Iteration count per EIP-2565, based on the bit length of the exponent.
fn iteration_count(exp_len: usize, exponent_head: &[u8]) -> u64 {
    let exp_len = exp_len as u64;
    let top_bits = bit_length(exponent_head) as u64;
    let bits_above_head = top_bits.saturating_sub(1);
    if exp_len <= 32 {
        bits_above_head
    } else {
        8 * (exp_len - 32) + bits_above_head
    }
}

fn bit_length(bytes: &[u8]) -> u32 {
    for (i, b) in bytes.iter().enumerate() {
        if *b != 0 {
            return (bytes.len() - i) as u32 * 8 - b.leading_zeros();
        }
    }
    0
}

/// Computes the gas cost for a `MODEXP` call given its raw input.
pub fn gas_cost(input: &[u8]) -> u64 {
    let lengths = read_lengths(input);
    let body = if input.len() > HEADER_LEN { &input[HEADER_LEN..] } else { &[] };
    let body = pad_to(body, lengths.base_len + lengths.exp_len + lengths.mod_len);

    let exp_head_len = lengths.exp_len.min(32);
    let exponent_head = &body[lengths.base_len..lengths.base_len + exp_head_len];

    let complexity = multiplication_complexity(lengths.base_len, lengths.mod_len);
    let iterations = iteration_count(lengths.exp_len, exponent_head);
    (complexity * iterations.max(1) / 3).max(200)
}

/// Executes `MODEXP`: `base^exp mod modulus`, big-endian throughout, output
/// padded/truncated to `mod_len` bytes. A zero modulus yields an all-zero
/// output of `mod_len` bytes, matching the reference clients rather than
/// erroring.
pub fn execute(input: &[u8]) -> Result<Bytes, PrecompileError> {
    let lengths = read_lengths(input);
    let body = if input.len() > HEADER_LEN { &input[HEADER_LEN..] } else { &[] };
    let body = pad_to(body, lengths.base_len + lengths.exp_len + lengths.mod_len);

    let base = BigUint::from_bytes_be(&body[0..lengths.base_len]);
    let exponent =
        BigUint::from_bytes_be(&body[lengths.base_len..lengths.base_len + lengths.exp_len]);
    let modulus = BigUint::from_bytes_be(
        &body[lengths.base_len + lengths.exp_len..lengths.base_len + lengths.exp_len + lengths.mod_len],
    );

    let zero = BigUint::from(0u32);
    let result = if modulus == zero { zero.clone() } else { base.modpow(&exponent, &modulus) };

    let mut output = vec![0u8; lengths.mod_len];
    let result_bytes = result.to_bytes_be();
    let offset = lengths.mod_len.saturating_sub(result_bytes.len());
    output[offset..].copy_from_slice(&result_bytes[result_bytes.len().saturating_sub(lengths.mod_len)..]);
    Ok(Bytes::from(output))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_call(base: &[u8], exp: &[u8], modulus: &[u8]) -> Vec<u8> {
        let mut input = vec![0u8; 96];
        input[24..32].copy_from_slice(&(base.len() as u64).to_be_bytes());
        input[56..64].copy_from_slice(&(exp.len() as u64).to_be_bytes());
        input[88..96].copy_from_slice(&(modulus.len() as u64).to_be_bytes());
        input.extend_from_slice(base);
        input.extend_from_slice(exp);
        input.extend_from_slice(modulus);
        input
    }

    #[test]
    fn three_mod_five_to_the_two() {
        let input = encode_call(&[3], &[2], &[5]);
        let out = execute(&input).unwrap();
        assert_eq!(out.as_ref(), &[4]); // 3^2 mod 5 = 9 mod 5 = 4
    }

    #[test]
    fn zero_modulus_yields_zero_output() {
        let input = encode_call(&[3], &[2], &[0]);
        let out = execute(&input).unwrap();
        assert_eq!(out.as_ref(), &[0]);
    }

    #[test]
    fn gas_cost_has_a_floor() {
        let input = encode_call(&[1], &[1], &[1]);
        assert_eq!(gas_cost(&input), 200);
    }
}
