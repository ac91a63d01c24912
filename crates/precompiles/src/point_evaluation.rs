//! `0x0A` KZG point evaluation precompile (EIP-4844), active from Cancun.

use crate::errors::PrecompileError;
use alloy_primitives::{Bytes, B256};
use c_kzg::{Bytes32, Bytes48, KzgProof, KzgSettings};

/// Flat gas cost, independent of input.
pub const GAS_COST: u64 = 50_000;

/// The 32-byte success return value: `FIELD_ELEMENTS_PER_BLOB` followed by
/// `BLS_MODULUS`, matching the reference implementation's convention so
/// callers can sanity-check the precompile's own constants.
const FIELD_ELEMENTS_PER_BLOB: u64 = 4096;
const BLS_MODULUS: [u8; 32] = [
    0x73, 0xed, 0xa7, 0x53, 0x29, 0x9d, 0x7d, 0x48, 0x33, 0x39, 0xd8, 0x08, 0x09, 0xa1, 0xd8, 0x05,
    0x53, 0xbd, 0xa4, 0x02, 0xff, 0xfe, 0x5b, 0xfe, 0xff, 0xff, 0xff, 0x00, 0x00, 0x00, 0x00, 0x01,
];

fn success_output() -> Bytes {
    let mut out = [0u8; 64];
    out[24..32].copy_from_slice(&FIELD_ELEMENTS_PER_BLOB.to_be_bytes());
    out[32..64].copy_from_slice(&BLS_MODULUS);
    Bytes::copy_from_slice(&out)
}

/// Verifies a KZG point-evaluation proof. Input layout: `versioned_hash(32)
/// || z(32) || y(32) || commitment(48) || proof(48)`, exactly 192 bytes.
/// Checks `kzg_to_versioned_hash(commitment) == versioned_hash` before
/// calling into `c-kzg`'s proof verifier.
pub fn execute(input: &[u8], settings: &KzgSettings) -> Result<Bytes, PrecompileError> {
    if input.len() != 192 {
        return Err(PrecompileError::InvalidInput(
            "point evaluation input must be 192 bytes".into(),
        ));
    }

    let versioned_hash = B256::from_slice(&input[0..32]);
    let z = &input[32..64];
    let y = &input[64..96];
    let commitment = &input[96..144];
    let proof = &input[144..192];

    let computed_hash = kzg_to_versioned_hash(commitment);
    if computed_hash != versioned_hash {
        return Err(PrecompileError::InvalidInput("commitment does not match versioned hash".into()));
    }

    let commitment = Bytes48::from_bytes(commitment)
        .map_err(|e| PrecompileError::InvalidInput(format!("invalid kzg commitment: {e}")))?;
    let proof = Bytes48::from_bytes(proof)
        .map_err(|e| PrecompileError::InvalidInput(format!("invalid kzg proof: {e}")))?;
    let z = Bytes32::from_bytes(z).map_err(|e| PrecompileError::InvalidInput(format!("invalid z: {e}")))?;
    let y = Bytes32::from_bytes(y).map_err(|e| PrecompileError::InvalidInput(format!("invalid y: {e}")))?;

    let valid = KzgProof::verify_kzg_proof(&commitment, &z, &y, &proof, settings)
        .map_err(|e| PrecompileError::InvalidInput(format!("kzg verification error: {e}")))?;

    if !valid {
        return Err(PrecompileError::InvalidInput("kzg proof did not verify".into()));
    }

    Ok(success_output())
}

/// `kzg_to_versioned_hash` from EIP-4844: `0x01 || sha256(commitment)[1..]`.
fn kzg_to_versioned_hash(commitment: &[u8]) -> B256 {
    use sha2::{Digest, Sha256};
    let digest = Sha256::digest(commitment);
    let mut out = [0u8; 32];
    out[0] = 0x01;
    out[1..].copy_from_slice(&digest[1..]);
    B256::from(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn versioned_hash_has_blob_version_prefix() {
        let hash = kzg_to_versioned_hash(&[0u8; 48]);
        assert_eq!(hash[0], 0x01);
    }

    #[test]
    fn success_output_encodes_field_elements_per_blob() {
        let out = success_output();
        assert_eq!(&out[24..32], &FIELD_ELEMENTS_PER_BLOB.to_be_bytes());
        assert_eq!(&out[32..64], &BLS_MODULUS);
    }
}
