//! `0x01 ECRECOVER`.

use crate::errors::PrecompileError;
use alloy_primitives::{keccak256, Bytes, B256, U256};

/// Flat gas cost, unchanged since Frontier.
pub const GAS_COST: u64 = 3_000;

/// Recovers the signing address from `(hash, v, r, s)`, zero-padding the
/// output to 32 bytes (address right-aligned) or returning empty output if
/// recovery fails — `ECRECOVER` never reverts on bad input, it just yields
/// nothing.
pub fn execute(input: &[u8]) -> Result<Bytes, PrecompileError> {
    let mut padded = [0u8; 128];
    let n = input.len().min(128);
    padded[..n].copy_from_slice(&input[..n]);

    let hash = B256::from_slice(&padded[0..32]);
    let v = U256::from_be_slice(&padded[32..64]);
    let r = U256::from_be_slice(&padded[64..96]);
    let s = U256::from_be_slice(&padded[96..128]);

    let Ok(recovery_byte) = u8::try_from(v) else { return Ok(Bytes::new()) };
    let Some(y_parity) = recovery_byte.checked_sub(27) else { return Ok(Bytes::new()) };
    if y_parity > 1 {
        return Ok(Bytes::new());
    }

    let mut sig_bytes = [0u8; 64];
    sig_bytes[..32].copy_from_slice(&r.to_be_bytes::<32>());
    sig_bytes[32..].copy_from_slice(&s.to_be_bytes::<32>());

    let Ok(signature) = k256::ecdsa::Signature::from_slice(&sig_bytes) else { return Ok(Bytes::new()) };
    let Some(recovery_id) = k256::ecdsa::RecoveryId::from_byte(y_parity) else { return Ok(Bytes::new()) };
    let Ok(verifying_key) =
        k256::ecdsa::VerifyingKey::recover_from_prehash(hash.as_slice(), &signature, recovery_id)
    else {
        return Ok(Bytes::new());
    };

    let encoded = verifying_key.to_encoded_point(false);
    let address_hash = keccak256(&encoded.as_bytes()[1..]);
    let mut output = [0u8; 32];
    output[12..].copy_from_slice(&address_hash[12..]);
    Ok(Bytes::copy_from_slice(&output))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_recovery_byte_yields_empty_output() {
        let mut input = [0u8; 128];
        input[63] = 99; // v = 99, invalid
        assert_eq!(execute(&input).unwrap(), Bytes::new());
    }

    #[test]
    fn short_input_is_zero_padded() {
        assert_eq!(execute(&[]).unwrap(), Bytes::new());
    }
}
