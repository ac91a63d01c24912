//! `0x02 SHA2-256`, `0x03 RIPEMD-160`, `0x04 IDENTITY`.

use crate::errors::PrecompileError;
use alloy_primitives::Bytes;
use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

const fn words(len: usize) -> u64 {
    ((len + 31) / 32) as u64
}

/// Gas cost for `SHA2-256`.
pub const fn sha256_gas_cost(input_len: usize) -> u64 {
    60 + 12 * words(input_len)
}

/// `SHA2-256`.
pub fn sha256(input: &[u8]) -> Result<Bytes, PrecompileError> {
    let digest = Sha256::digest(input);
    Ok(Bytes::copy_from_slice(&digest))
}

/// Gas cost for `RIPEMD-160`.
pub const fn ripemd160_gas_cost(input_len: usize) -> u64 {
    600 + 120 * words(input_len)
}

/// `RIPEMD-160`, left-padded to 32 bytes per the yellow paper's output convention.
pub fn ripemd160(input: &[u8]) -> Result<Bytes, PrecompileError> {
    let digest = Ripemd160::digest(input);
    let mut output = [0u8; 32];
    output[12..].copy_from_slice(&digest);
    Ok(Bytes::copy_from_slice(&output))
}

/// Gas cost for `IDENTITY`.
pub const fn identity_gas_cost(input_len: usize) -> u64 {
    15 + 3 * words(input_len)
}

/// `IDENTITY` — returns its input unchanged.
pub fn identity(input: &[u8]) -> Result<Bytes, PrecompileError> {
    Ok(Bytes::copy_from_slice(input))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_known_vector() {
        let out = sha256(b"").unwrap();
        assert_eq!(
            hex::encode(&out),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b85"
        );
    }

    #[test]
    fn ripemd160_padded_to_32_bytes() {
        let out = ripemd160(b"").unwrap();
        assert_eq!(out.len(), 32);
        assert_eq!(&out[..12], &[0u8; 12]);
    }

    #[test]
    fn identity_echoes_input() {
        assert_eq!(identity(b"hello").unwrap(), Bytes::from_static(b"hello"));
    }

    #[test]
    fn gas_cost_rounds_up_to_word() {
        assert_eq!(sha256_gas_cost(0), 60);
        assert_eq!(sha256_gas_cost(1), 72);
        assert_eq!(sha256_gas_cost(32), 72);
        assert_eq!(sha256_gas_cost(33), 84);
    }

    mod hex {
        pub fn encode(bytes: &[u8]) -> String {
            bytes.iter().map(|b| format!("{:02x}", b)).collect()
        }
    }
}
