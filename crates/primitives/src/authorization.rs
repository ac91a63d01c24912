//! EIP-7702 authorization tuples, letting an EOA delegate its code to a contract.

use alloy_primitives::{keccak256, Address, B256};
use alloy_rlp::{RlpDecodable, RlpEncodable};
use k256::ecdsa::{RecoveryId, Signature as K256Signature, VerifyingKey};

/// The `0xef01` magic prefix used by delegation indicators (`0xef0100 ‖
/// address`), distinguishing a delegated EOA from ordinary contract code.
pub const DELEGATION_PREFIX: [u8; 2] = [0xef, 0x01];

/// One unsigned authorization tuple from an EIP-7702 transaction's
/// authorization list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, RlpEncodable, RlpDecodable)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Authorization {
    /// Chain ID this authorization is valid on, or `0` for any chain.
    pub chain_id: u64,
    /// The contract address the authority delegates its code to.
    pub address: Address,
    /// The authority's expected nonce at the time the authorization is applied.
    pub nonce: u64,
}

impl Authorization {
    /// The EIP-7702-specific signing hash: `keccak256(0x05 ‖ rlp([chain_id, address, nonce]))`.
    pub fn signature_hash(&self) -> B256 {
        let mut buf = Vec::with_capacity(1 + alloy_rlp::Encodable::length(self));
        buf.push(0x05);
        alloy_rlp::Encodable::encode(self, &mut buf);
        keccak256(buf)
    }
}

/// A signed [Authorization], as carried on the wire inside an EIP-7702
/// transaction's authorization list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SignedAuthorization {
    /// The unsigned authorization tuple.
    pub inner: Authorization,
    /// `y_parity` of the authorizing signature.
    pub y_parity: u8,
    /// `r` component of the authorizing signature.
    pub r: B256,
    /// `s` component of the authorizing signature.
    pub s: B256,
}

/// Errors recovering the authority of a [SignedAuthorization].
#[derive(thiserror::Error, Debug)]
pub enum AuthorizationRecoveryError {
    /// The `r`/`s` scalars or `y_parity` did not form a valid signature.
    #[error("malformed authorization signature")]
    InvalidSignature,
}

impl SignedAuthorization {
    /// Recovers the authority address from the signature over [Authorization::signature_hash].
    pub fn recover_authority(&self) -> Result<Address, AuthorizationRecoveryError> {
        let mut sig_bytes = [0u8; 64];
        sig_bytes[..32].copy_from_slice(self.r.as_slice());
        sig_bytes[32..].copy_from_slice(self.s.as_slice());
        let signature = K256Signature::from_slice(&sig_bytes)
            .map_err(|_| AuthorizationRecoveryError::InvalidSignature)?;
        let recovery_id = RecoveryId::from_byte(self.y_parity)
            .ok_or(AuthorizationRecoveryError::InvalidSignature)?;
        let verifying_key = VerifyingKey::recover_from_prehash(
            self.inner.signature_hash().as_slice(),
            &signature,
            recovery_id,
        )
        .map_err(|_| AuthorizationRecoveryError::InvalidSignature)?;
        let encoded = verifying_key.to_encoded_point(false);
        let hash = keccak256(&encoded.as_bytes()[1..]);
        Ok(Address::from_slice(&hash[12..]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_hash_is_deterministic() {
        let auth = Authorization { chain_id: 1, address: Address::repeat_byte(9), nonce: 3 };
        assert_eq!(auth.signature_hash(), auth.signature_hash());
    }
}
