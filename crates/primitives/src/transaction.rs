//! Typed transaction envelopes: legacy plus EIP-2930/1559/4844/7702.
//!
//! Every typed variant serializes on the wire as `type_byte ‖ rlp(fields)`;
//! that concatenation is itself wrapped in an RLP bytestring only when it is
//! embedded inside another RLP structure (a block body, a receipts trie leaf)
//! — never when transmitted standalone. [TxEnvelope::encode_for_rlp_container]
//! and [TxEnvelope::decode_from_rlp_container] implement that distinction;
//! [TxEnvelope::encode_standalone]/[TxEnvelope::decode_standalone] are the
//! bare concatenation.

use crate::access_list::AccessList;
use crate::authorization::SignedAuthorization;
use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use alloy_rlp::{Buf, BufMut, Decodable, Encodable, Header, RlpDecodable, RlpEncodable};

/// secp256k1 curve order, `n`.
pub const SECP256K1N: U256 = U256::from_be_bytes([
    0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xfe,
    0xba, 0xae, 0xdc, 0xe6, 0xaf, 0x48, 0xa0, 0x3b, 0xbf, 0xd2, 0x5e, 0x8c, 0xd0, 0x36, 0x41, 0x41,
]);

/// The discriminating type byte of a typed transaction (legacy has none).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TxType {
    /// No leading type byte; `v` encodes `chain_id` and `y_parity` together.
    Legacy,
    /// `0x01`, EIP-2930.
    Eip2930,
    /// `0x02`, EIP-1559.
    Eip1559,
    /// `0x03`, EIP-4844.
    Eip4844,
    /// `0x04`, EIP-7702.
    Eip7702,
}

impl TxType {
    /// The wire type byte, or `None` for legacy transactions.
    pub const fn type_byte(self) -> Option<u8> {
        match self {
            Self::Legacy => None,
            Self::Eip2930 => Some(0x01),
            Self::Eip1559 => Some(0x02),
            Self::Eip4844 => Some(0x03),
            Self::Eip7702 => Some(0x04),
        }
    }
}

/// The destination of a transaction: either a `CALL` target or a contract creation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TransactionKind {
    /// Create a new contract.
    #[default]
    Create,
    /// Call (or transfer to) an existing address.
    Call(Address),
}

impl Encodable for TransactionKind {
    fn encode(&self, out: &mut dyn BufMut) {
        match self {
            Self::Create => out.put_u8(alloy_rlp::EMPTY_STRING_CODE),
            Self::Call(addr) => addr.encode(out),
        }
    }

    fn length(&self) -> usize {
        match self {
            Self::Create => 1,
            Self::Call(addr) => addr.length(),
        }
    }
}

impl Decodable for TransactionKind {
    fn decode(buf: &mut &[u8]) -> alloy_rlp::Result<Self> {
        if let Some(&first) = buf.first() {
            if first == alloy_rlp::EMPTY_STRING_CODE {
                buf.advance(1);
                return Ok(Self::Create);
            }
        }
        Ok(Self::Call(Address::decode(buf)?))
    }
}

/// An ECDSA signature over a transaction's signing hash.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Signature {
    /// Recovery id, `0` or `1`.
    pub y_parity: u8,
    /// `r` component.
    pub r: U256,
    /// `s` component.
    pub s: U256,
}

impl Signature {
    /// Whether `r` and `s` are each below the curve order, and `s` is at most
    /// `N/2` (post-Homestead malleability protection, EIP-2).
    pub fn is_valid(&self) -> bool {
        self.r < SECP256K1N && self.s < SECP256K1N && self.s <= SECP256K1N >> 1
    }
}

/// A legacy (pre-EIP-2718) transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LegacyTx {
    /// Sender's nonce at submission time.
    pub nonce: u64,
    /// Flat gas price, paid fully to the miner/coinbase.
    pub gas_price: u128,
    /// Gas limit.
    pub gas_limit: u64,
    /// Call target or contract creation.
    pub kind: TransactionKind,
    /// Value transferred, in wei.
    pub value: U256,
    /// Calldata or init code.
    pub input: Bytes,
    /// `Some(chain_id)` for EIP-155 replay-protected transactions, `None` for
    /// the original pre-155 encoding where `v` is bare `27`/`28`.
    pub chain_id: Option<u64>,
    /// The transaction's signature.
    pub signature: Signature,
}

#[derive(RlpEncodable)]
struct LegacyUnsigned {
    nonce: u64,
    gas_price: u128,
    gas_limit: u64,
    kind: TransactionKind,
    value: U256,
    input: Bytes,
}

impl LegacyTx {
    fn unsigned(&self) -> LegacyUnsigned {
        LegacyUnsigned {
            nonce: self.nonce,
            gas_price: self.gas_price,
            gas_limit: self.gas_limit,
            kind: self.kind,
            value: self.value,
            input: self.input.clone(),
        }
    }

    /// The EIP-155 signing hash: `keccak256(rlp([..fields, chain_id, 0, 0]))`
    /// if `chain_id` is set, else the pre-155 `keccak256(rlp([..fields]))`.
    pub fn signature_hash(&self) -> B256 {
        let unsigned = self.unsigned();
        let mut buf = Vec::new();
        match self.chain_id {
            None => {
                unsigned.encode(&mut buf);
            }
            Some(chain_id) => {
                let tail_len = chain_id.length() + 1 + 1;
                let header = Header { list: true, payload_length: unsigned.length_fields() + tail_len };
                header.encode(&mut buf);
                unsigned.encode_fields(&mut buf);
                chain_id.encode(&mut buf);
                0u8.encode(&mut buf);
                0u8.encode(&mut buf);
            }
        }
        keccak256(buf)
    }

    /// The `v` value as it appears on the wire: `27 + y_parity` pre-155, or
    /// `chain_id*2 + 35 + y_parity` post-155.
    pub fn wire_v(&self) -> u64 {
        match self.chain_id {
            None => 27 + self.signature.y_parity as u64,
            Some(chain_id) => chain_id * 2 + 35 + self.signature.y_parity as u64,
        }
    }
}

impl LegacyUnsigned {
    fn length_fields(&self) -> usize {
        self.nonce.length()
            + self.gas_price.length()
            + self.gas_limit.length()
            + self.kind.length()
            + self.value.length()
            + self.input.length()
    }

    fn encode_fields(&self, out: &mut dyn BufMut) {
        self.nonce.encode(out);
        self.gas_price.encode(out);
        self.gas_limit.encode(out);
        self.kind.encode(out);
        self.value.encode(out);
        self.input.encode(out);
    }
}

impl Encodable for LegacyTx {
    fn encode(&self, out: &mut dyn BufMut) {
        let unsigned = self.unsigned();
        let v = self.wire_v();
        let payload_length =
            unsigned.length_fields() + v.length() + self.signature.r.length() + self.signature.s.length();
        Header { list: true, payload_length }.encode(out);
        unsigned.encode_fields(out);
        v.encode(out);
        self.signature.r.encode(out);
        self.signature.s.encode(out);
    }

    fn length(&self) -> usize {
        let unsigned = self.unsigned();
        let v = self.wire_v();
        let payload_length =
            unsigned.length_fields() + v.length() + self.signature.r.length() + self.signature.s.length();
        alloy_rlp::length_of_length(payload_length) + payload_length
    }
}

impl Decodable for LegacyTx {
    fn decode(buf: &mut &[u8]) -> alloy_rlp::Result<Self> {
        let header = Header::decode(buf)?;
        if !header.list {
            return Err(alloy_rlp::Error::UnexpectedString);
        }
        let nonce = u64::decode(buf)?;
        let gas_price = u128::decode(buf)?;
        let gas_limit = u64::decode(buf)?;
        let kind = TransactionKind::decode(buf)?;
        let value = U256::decode(buf)?;
        let input = Bytes::decode(buf)?;
        let v = u64::decode(buf)?;
        let r = U256::decode(buf)?;
        let s = U256::decode(buf)?;

        let (chain_id, y_parity) = if v >= 35 {
            (Some((v - 35) / 2), ((v - 35) % 2) as u8)
        } else {
            (None, (v - 27) as u8)
        };

        Ok(Self {
            nonce,
            gas_price,
            gas_limit,
            kind,
            value,
            input,
            chain_id,
            signature: Signature { y_parity, r, s },
        })
    }
}

/// An EIP-2930 transaction: legacy plus a chain id and access list, `y_parity` replacing `v`.
#[derive(Clone, Debug, PartialEq, Eq, RlpEncodable, RlpDecodable)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Eip2930Tx {
    /// The chain this transaction is valid on.
    pub chain_id: u64,
    /// Sender's nonce at submission time.
    pub nonce: u64,
    /// Flat gas price, paid fully to the miner/coinbase.
    pub gas_price: u128,
    /// Gas limit.
    pub gas_limit: u64,
    /// Call target or contract creation.
    pub kind: TransactionKind,
    /// Value transferred, in wei.
    pub value: U256,
    /// Calldata or init code.
    pub input: Bytes,
    /// Pre-declared, pre-warmed addresses and storage slots.
    pub access_list: AccessList,
    /// Recovery id of the signature.
    pub y_parity: u8,
    /// `r` component of the signature.
    pub r: U256,
    /// `s` component of the signature.
    pub s: U256,
}

#[derive(RlpEncodable)]
struct Eip2930Unsigned {
    chain_id: u64,
    nonce: u64,
    gas_price: u128,
    gas_limit: u64,
    kind: TransactionKind,
    value: U256,
    input: Bytes,
    access_list: AccessList,
}

impl Eip2930Tx {
    /// `keccak256(0x01 ‖ rlp([..unsigned fields]))`.
    pub fn signature_hash(&self) -> B256 {
        let unsigned = Eip2930Unsigned {
            chain_id: self.chain_id,
            nonce: self.nonce,
            gas_price: self.gas_price,
            gas_limit: self.gas_limit,
            kind: self.kind,
            value: self.value,
            input: self.input.clone(),
            access_list: self.access_list.clone(),
        };
        let mut buf = vec![0x01u8];
        unsigned.encode(&mut buf);
        keccak256(buf)
    }

    /// Signature validity, per [Signature::is_valid].
    pub fn signature(&self) -> Signature {
        Signature { y_parity: self.y_parity, r: self.r, s: self.s }
    }
}

/// An EIP-1559 transaction: replaces `gas_price` with a priority fee/fee cap pair.
#[derive(Clone, Debug, PartialEq, Eq, RlpEncodable, RlpDecodable)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Eip1559Tx {
    /// The chain this transaction is valid on.
    pub chain_id: u64,
    /// Sender's nonce at submission time.
    pub nonce: u64,
    /// Tip paid to the block proposer per unit of gas.
    pub max_priority_fee_per_gas: u128,
    /// Maximum total fee (base fee + tip) the sender will pay per unit of gas.
    pub max_fee_per_gas: u128,
    /// Gas limit.
    pub gas_limit: u64,
    /// Call target or contract creation.
    pub kind: TransactionKind,
    /// Value transferred, in wei.
    pub value: U256,
    /// Calldata or init code.
    pub input: Bytes,
    /// Pre-declared, pre-warmed addresses and storage slots.
    pub access_list: AccessList,
    /// Recovery id of the signature.
    pub y_parity: u8,
    /// `r` component of the signature.
    pub r: U256,
    /// `s` component of the signature.
    pub s: U256,
}

#[derive(RlpEncodable)]
struct Eip1559Unsigned {
    chain_id: u64,
    nonce: u64,
    max_priority_fee_per_gas: u128,
    max_fee_per_gas: u128,
    gas_limit: u64,
    kind: TransactionKind,
    value: U256,
    input: Bytes,
    access_list: AccessList,
}

impl Eip1559Tx {
    /// `keccak256(0x02 ‖ rlp([..unsigned fields]))`.
    pub fn signature_hash(&self) -> B256 {
        let unsigned = Eip1559Unsigned {
            chain_id: self.chain_id,
            nonce: self.nonce,
            max_priority_fee_per_gas: self.max_priority_fee_per_gas,
            max_fee_per_gas: self.max_fee_per_gas,
            gas_limit: self.gas_limit,
            kind: self.kind,
            value: self.value,
            input: self.input.clone(),
            access_list: self.access_list.clone(),
        };
        let mut buf = vec![0x02u8];
        unsigned.encode(&mut buf);
        keccak256(buf)
    }

    /// The effective gas price paid given the block's base fee:
    /// `min(max_fee_per_gas, base_fee_per_gas + max_priority_fee_per_gas)`.
    pub fn effective_gas_price(&self, base_fee_per_gas: u64) -> u128 {
        let tip = self.max_priority_fee_per_gas.min(self.max_fee_per_gas.saturating_sub(base_fee_per_gas as u128));
        (base_fee_per_gas as u128 + tip).min(self.max_fee_per_gas)
    }

    /// Signature validity, per [Signature::is_valid].
    pub fn signature(&self) -> Signature {
        Signature { y_parity: self.y_parity, r: self.r, s: self.s }
    }
}

/// An EIP-4844 blob-carrying transaction.
#[derive(Clone, Debug, PartialEq, Eq, RlpEncodable, RlpDecodable)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Eip4844Tx {
    /// The chain this transaction is valid on.
    pub chain_id: u64,
    /// Sender's nonce at submission time.
    pub nonce: u64,
    /// Tip paid to the block proposer per unit of gas.
    pub max_priority_fee_per_gas: u128,
    /// Maximum total fee (base fee + tip) the sender will pay per unit of gas.
    pub max_fee_per_gas: u128,
    /// Gas limit.
    pub gas_limit: u64,
    /// Blob transactions may not create contracts; always a [TransactionKind::Call].
    pub to: Address,
    /// Value transferred, in wei.
    pub value: U256,
    /// Calldata.
    pub input: Bytes,
    /// Pre-declared, pre-warmed addresses and storage slots.
    pub access_list: AccessList,
    /// Maximum fee the sender will pay per unit of blob gas.
    pub max_fee_per_blob_gas: u128,
    /// Versioned hashes of the attached blobs; each must begin with the KZG
    /// version byte `0x01`.
    pub blob_versioned_hashes: Vec<B256>,
    /// Recovery id of the signature.
    pub y_parity: u8,
    /// `r` component of the signature.
    pub r: U256,
    /// `s` component of the signature.
    pub s: U256,
}

#[derive(RlpEncodable)]
struct Eip4844Unsigned {
    chain_id: u64,
    nonce: u64,
    max_priority_fee_per_gas: u128,
    max_fee_per_gas: u128,
    gas_limit: u64,
    to: Address,
    value: U256,
    input: Bytes,
    access_list: AccessList,
    max_fee_per_blob_gas: u128,
    blob_versioned_hashes: Vec<B256>,
}

/// KZG commitment version byte every blob versioned hash must start with.
pub const BLOB_VERSIONED_HASH_VERSION: u8 = 0x01;

impl Eip4844Tx {
    /// `keccak256(0x03 ‖ rlp([..unsigned fields]))`.
    pub fn signature_hash(&self) -> B256 {
        let unsigned = Eip4844Unsigned {
            chain_id: self.chain_id,
            nonce: self.nonce,
            max_priority_fee_per_gas: self.max_priority_fee_per_gas,
            max_fee_per_gas: self.max_fee_per_gas,
            gas_limit: self.gas_limit,
            to: self.to,
            value: self.value,
            input: self.input.clone(),
            access_list: self.access_list.clone(),
            max_fee_per_blob_gas: self.max_fee_per_blob_gas,
            blob_versioned_hashes: self.blob_versioned_hashes.clone(),
        };
        let mut buf = vec![0x03u8];
        unsigned.encode(&mut buf);
        keccak256(buf)
    }

    /// Whether every blob hash carries the expected KZG version byte.
    pub fn has_valid_blob_versions(&self) -> bool {
        self.blob_versioned_hashes.iter().all(|hash| hash[0] == BLOB_VERSIONED_HASH_VERSION)
    }

    /// Total blob gas consumed: `GAS_PER_BLOB * blob_versioned_hashes.len()`.
    pub fn blob_gas_used(&self) -> u64 {
        const GAS_PER_BLOB: u64 = 1 << 17;
        GAS_PER_BLOB * self.blob_versioned_hashes.len() as u64
    }

    /// Signature validity, per [Signature::is_valid].
    pub fn signature(&self) -> Signature {
        Signature { y_parity: self.y_parity, r: self.r, s: self.s }
    }
}

/// An EIP-7702 transaction, carrying a list of signed code-delegation authorizations.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Eip7702Tx {
    /// The chain this transaction is valid on.
    pub chain_id: u64,
    /// Sender's nonce at submission time.
    pub nonce: u64,
    /// Tip paid to the block proposer per unit of gas.
    pub max_priority_fee_per_gas: u128,
    /// Maximum total fee (base fee + tip) the sender will pay per unit of gas.
    pub max_fee_per_gas: u128,
    /// Gas limit.
    pub gas_limit: u64,
    /// Call target; EIP-7702 transactions cannot create contracts.
    pub to: Address,
    /// Value transferred, in wei.
    pub value: U256,
    /// Calldata.
    pub input: Bytes,
    /// Pre-declared, pre-warmed addresses and storage slots.
    pub access_list: AccessList,
    /// Signed authorizations to apply before execution.
    pub authorization_list: Vec<SignedAuthorization>,
    /// Recovery id of the signature.
    pub y_parity: u8,
    /// `r` component of the signature.
    pub r: U256,
    /// `s` component of the signature.
    pub s: U256,
}

impl Eip7702Tx {
    /// `keccak256(0x04 ‖ rlp([..unsigned fields]))`.
    ///
    /// Authorization tuples are each signed separately
    /// ([crate::authorization::Authorization::signature_hash]); this hash
    /// only covers the outer transaction.
    pub fn signature_hash(&self) -> B256 {
        let mut inner = Vec::new();
        self.chain_id.encode(&mut inner);
        self.nonce.encode(&mut inner);
        self.max_priority_fee_per_gas.encode(&mut inner);
        self.max_fee_per_gas.encode(&mut inner);
        self.gas_limit.encode(&mut inner);
        self.to.encode(&mut inner);
        self.value.encode(&mut inner);
        self.input.encode(&mut inner);
        self.access_list.encode(&mut inner);
        encode_authorization_list(&self.authorization_list, &mut inner);
        let header = Header { list: true, payload_length: inner.len() };
        let mut buf = vec![0x04u8];
        header.encode(&mut buf);
        buf.extend_from_slice(&inner);
        keccak256(buf)
    }

    /// Signature validity, per [Signature::is_valid].
    pub fn signature(&self) -> Signature {
        Signature { y_parity: self.y_parity, r: self.r, s: self.s }
    }
}

fn encode_authorization_list(list: &[SignedAuthorization], out: &mut Vec<u8>) {
    let mut items = Vec::with_capacity(list.len());
    let mut total = 0usize;
    for auth in list {
        let mut item = Vec::new();
        auth.inner.chain_id.encode(&mut item);
        auth.inner.address.encode(&mut item);
        auth.inner.nonce.encode(&mut item);
        auth.y_parity.encode(&mut item);
        U256::from_be_bytes(auth.r.0).encode(&mut item);
        U256::from_be_bytes(auth.s.0).encode(&mut item);
        let inner_len = item.len();
        let header = Header { list: true, payload_length: inner_len };
        let mut wrapped = Vec::with_capacity(alloy_rlp::length_of_length(inner_len) + inner_len);
        header.encode(&mut wrapped);
        wrapped.extend_from_slice(&item);
        total += wrapped.len();
        items.push(wrapped);
    }
    Header { list: true, payload_length: total }.encode(out);
    for item in items {
        out.extend_from_slice(&item);
    }
}

/// A fully typed transaction envelope.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Transaction {
    /// Pre-EIP-2718 legacy transaction.
    Legacy(LegacyTx),
    /// `0x01` EIP-2930 transaction.
    Eip2930(Eip2930Tx),
    /// `0x02` EIP-1559 transaction.
    Eip1559(Eip1559Tx),
    /// `0x03` EIP-4844 transaction.
    Eip4844(Eip4844Tx),
    /// `0x04` EIP-7702 transaction.
    Eip7702(Eip7702Tx),
}

/// An alias kept for callers used to the "envelope" terminology (e.g. reading
/// a transaction out of a block body).
pub type TxEnvelope = Transaction;

impl Transaction {
    /// This transaction's [TxType].
    pub fn tx_type(&self) -> TxType {
        match self {
            Self::Legacy(_) => TxType::Legacy,
            Self::Eip2930(_) => TxType::Eip2930,
            Self::Eip1559(_) => TxType::Eip1559,
            Self::Eip4844(_) => TxType::Eip4844,
            Self::Eip7702(_) => TxType::Eip7702,
        }
    }

    /// The gas limit supplied by the sender.
    pub fn gas_limit(&self) -> u64 {
        match self {
            Self::Legacy(tx) => tx.gas_limit,
            Self::Eip2930(tx) => tx.gas_limit,
            Self::Eip1559(tx) => tx.gas_limit,
            Self::Eip4844(tx) => tx.gas_limit,
            Self::Eip7702(tx) => tx.gas_limit,
        }
    }

    /// The sender's nonce.
    pub fn nonce(&self) -> u64 {
        match self {
            Self::Legacy(tx) => tx.nonce,
            Self::Eip2930(tx) => tx.nonce,
            Self::Eip1559(tx) => tx.nonce,
            Self::Eip4844(tx) => tx.nonce,
            Self::Eip7702(tx) => tx.nonce,
        }
    }

    /// Value transferred, in wei.
    pub fn value(&self) -> U256 {
        match self {
            Self::Legacy(tx) => tx.value,
            Self::Eip2930(tx) => tx.value,
            Self::Eip1559(tx) => tx.value,
            Self::Eip4844(tx) => tx.value,
            Self::Eip7702(tx) => tx.value,
        }
    }

    /// Calldata (or init code, for a creation).
    pub fn input(&self) -> &Bytes {
        match self {
            Self::Legacy(tx) => &tx.input,
            Self::Eip2930(tx) => &tx.input,
            Self::Eip1559(tx) => &tx.input,
            Self::Eip4844(tx) => &tx.input,
            Self::Eip7702(tx) => &tx.input,
        }
    }

    /// The call destination, or `None` for a contract creation.
    pub fn to(&self) -> Option<Address> {
        match self {
            Self::Legacy(tx) => match tx.kind {
                TransactionKind::Call(addr) => Some(addr),
                TransactionKind::Create => None,
            },
            Self::Eip2930(tx) => match tx.kind {
                TransactionKind::Call(addr) => Some(addr),
                TransactionKind::Create => None,
            },
            Self::Eip1559(tx) => match tx.kind {
                TransactionKind::Call(addr) => Some(addr),
                TransactionKind::Create => None,
            },
            Self::Eip4844(tx) => Some(tx.to),
            Self::Eip7702(tx) => Some(tx.to),
        }
    }

    /// Whether this transaction creates a new contract.
    pub fn is_create(&self) -> bool {
        self.to().is_none()
    }

    /// The chain id this transaction is bound to, if any.
    pub fn chain_id(&self) -> Option<u64> {
        match self {
            Self::Legacy(tx) => tx.chain_id,
            Self::Eip2930(tx) => Some(tx.chain_id),
            Self::Eip1559(tx) => Some(tx.chain_id),
            Self::Eip4844(tx) => Some(tx.chain_id),
            Self::Eip7702(tx) => Some(tx.chain_id),
        }
    }

    /// The access list, empty for legacy transactions.
    pub fn access_list(&self) -> Option<&AccessList> {
        match self {
            Self::Legacy(_) => None,
            Self::Eip2930(tx) => Some(&tx.access_list),
            Self::Eip1559(tx) => Some(&tx.access_list),
            Self::Eip4844(tx) => Some(&tx.access_list),
            Self::Eip7702(tx) => Some(&tx.access_list),
        }
    }

    /// `max_fee_per_gas` for fee-market transactions, or the flat `gas_price`
    /// for legacy/access-list transactions.
    pub fn max_fee_per_gas(&self) -> u128 {
        match self {
            Self::Legacy(tx) => tx.gas_price,
            Self::Eip2930(tx) => tx.gas_price,
            Self::Eip1559(tx) => tx.max_fee_per_gas,
            Self::Eip4844(tx) => tx.max_fee_per_gas,
            Self::Eip7702(tx) => tx.max_fee_per_gas,
        }
    }

    /// `max_priority_fee_per_gas`, or the flat `gas_price` for legacy/access-list transactions.
    pub fn max_priority_fee_per_gas(&self) -> u128 {
        match self {
            Self::Legacy(tx) => tx.gas_price,
            Self::Eip2930(tx) => tx.gas_price,
            Self::Eip1559(tx) => tx.max_priority_fee_per_gas,
            Self::Eip4844(tx) => tx.max_priority_fee_per_gas,
            Self::Eip7702(tx) => tx.max_priority_fee_per_gas,
        }
    }

    /// The effective gas price paid given the block's base fee.
    pub fn effective_gas_price(&self, base_fee_per_gas: u64) -> u128 {
        match self {
            Self::Legacy(tx) => tx.gas_price,
            Self::Eip2930(tx) => tx.gas_price,
            Self::Eip1559(tx) => tx.effective_gas_price(base_fee_per_gas),
            Self::Eip4844(tx) => {
                let tip = tx.max_priority_fee_per_gas.min(tx.max_fee_per_gas.saturating_sub(base_fee_per_gas as u128));
                (base_fee_per_gas as u128 + tip).min(tx.max_fee_per_gas)
            }
            Self::Eip7702(tx) => {
                let tip = tx.max_priority_fee_per_gas.min(tx.max_fee_per_gas.saturating_sub(base_fee_per_gas as u128));
                (base_fee_per_gas as u128 + tip).min(tx.max_fee_per_gas)
            }
        }
    }

    /// `Some(max_fee_per_blob_gas)` for EIP-4844 transactions.
    pub fn max_fee_per_blob_gas(&self) -> Option<u128> {
        match self {
            Self::Eip4844(tx) => Some(tx.max_fee_per_blob_gas),
            _ => None,
        }
    }

    /// Blob versioned hashes, empty outside EIP-4844.
    pub fn blob_versioned_hashes(&self) -> &[B256] {
        match self {
            Self::Eip4844(tx) => &tx.blob_versioned_hashes,
            _ => &[],
        }
    }

    /// The authorization list, empty outside EIP-7702.
    pub fn authorization_list(&self) -> &[SignedAuthorization] {
        match self {
            Self::Eip7702(tx) => &tx.authorization_list,
            _ => &[],
        }
    }

    /// The transaction's signature.
    pub fn signature(&self) -> Signature {
        match self {
            Self::Legacy(tx) => tx.signature,
            Self::Eip2930(tx) => tx.signature(),
            Self::Eip1559(tx) => tx.signature(),
            Self::Eip4844(tx) => tx.signature(),
            Self::Eip7702(tx) => Signature { y_parity: tx.y_parity, r: tx.r, s: tx.s },
        }
    }

    /// The hash signed by the sender.
    pub fn signature_hash(&self) -> B256 {
        match self {
            Self::Legacy(tx) => tx.signature_hash(),
            Self::Eip2930(tx) => tx.signature_hash(),
            Self::Eip1559(tx) => tx.signature_hash(),
            Self::Eip4844(tx) => tx.signature_hash(),
            Self::Eip7702(tx) => tx.signature_hash(),
        }
    }

    /// Recovers the sender's address from the signature.
    pub fn recover_sender(&self) -> Result<Address, SenderRecoveryError> {
        let signature = self.signature();
        if !signature.is_valid() {
            return Err(SenderRecoveryError::InvalidSignature);
        }
        let mut sig_bytes = [0u8; 64];
        sig_bytes[..32].copy_from_slice(&signature.r.to_be_bytes::<32>());
        sig_bytes[32..].copy_from_slice(&signature.s.to_be_bytes::<32>());
        let sig = k256::ecdsa::Signature::from_slice(&sig_bytes)
            .map_err(|_| SenderRecoveryError::InvalidSignature)?;
        let recovery_id = k256::ecdsa::RecoveryId::from_byte(signature.y_parity)
            .ok_or(SenderRecoveryError::InvalidSignature)?;
        let verifying_key = k256::ecdsa::VerifyingKey::recover_from_prehash(
            self.signature_hash().as_slice(),
            &sig,
            recovery_id,
        )
        .map_err(|_| SenderRecoveryError::InvalidSignature)?;
        let encoded = verifying_key.to_encoded_point(false);
        let hash = keccak256(&encoded.as_bytes()[1..]);
        Ok(Address::from_slice(&hash[12..]))
    }

    /// The transaction hash, `keccak256` of the full wire encoding
    /// (`type_byte ‖ rlp(signed fields)` for typed transactions).
    pub fn hash(&self) -> B256 {
        let mut buf = Vec::new();
        self.encode_standalone(&mut buf);
        keccak256(buf)
    }

    /// Encodes the bare `type_byte ‖ rlp(fields)` concatenation (not itself
    /// wrapped in an RLP bytestring header). Used when a typed transaction is
    /// transmitted standalone.
    pub fn encode_standalone(&self, out: &mut Vec<u8>) {
        match self {
            Self::Legacy(tx) => tx.encode(out),
            Self::Eip2930(tx) => {
                out.push(0x01);
                tx.encode(out);
            }
            Self::Eip1559(tx) => {
                out.push(0x02);
                tx.encode(out);
            }
            Self::Eip4844(tx) => {
                out.push(0x03);
                tx.encode(out);
            }
            Self::Eip7702(tx) => {
                out.push(0x04);
                encode_eip7702_fields(tx, out);
            }
        }
    }

    /// Decodes the bare `type_byte ‖ rlp(fields)` concatenation.
    pub fn decode_standalone(buf: &mut &[u8]) -> alloy_rlp::Result<Self> {
        match buf.first() {
            None => Err(alloy_rlp::Error::InputTooShort),
            Some(0xc0..=0xff) => Ok(Self::Legacy(LegacyTx::decode(buf)?)),
            Some(0x01) => {
                buf.advance(1);
                Ok(Self::Eip2930(Eip2930Tx::decode(buf)?))
            }
            Some(0x02) => {
                buf.advance(1);
                Ok(Self::Eip1559(Eip1559Tx::decode(buf)?))
            }
            Some(0x03) => {
                buf.advance(1);
                Ok(Self::Eip4844(Eip4844Tx::decode(buf)?))
            }
            Some(0x04) => {
                buf.advance(1);
                Ok(Self::Eip7702(decode_eip7702_fields(buf)?))
            }
            Some(_) => Err(alloy_rlp::Error::Custom("unknown transaction type")),
        }
    }

    /// Encodes this transaction for embedding inside another RLP structure
    /// (a block body list, a receipts trie leaf): legacy transactions encode
    /// as a bare RLP list, typed transactions are wrapped in an RLP bytestring.
    pub fn encode_for_rlp_container(&self, out: &mut dyn BufMut) {
        match self {
            Self::Legacy(tx) => tx.encode(out),
            other => {
                let mut inner = Vec::new();
                other.encode_standalone(&mut inner);
                Bytes::from(inner).encode(out);
            }
        }
    }

    /// Decodes a transaction that was embedded inside another RLP structure.
    pub fn decode_from_rlp_container(buf: &mut &[u8]) -> alloy_rlp::Result<Self> {
        match buf.first() {
            Some(0xc0..=0xff) => Ok(Self::Legacy(LegacyTx::decode(buf)?)),
            Some(_) => {
                let bytes = Bytes::decode(buf)?;
                Self::decode_standalone(&mut bytes.as_ref())
            }
            None => Err(alloy_rlp::Error::InputTooShort),
        }
    }
}

/// Errors recovering a transaction's sender from its signature.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum SenderRecoveryError {
    /// `r`/`s` out of range, or the recovery id/signature did not validate.
    #[error("invalid transaction signature")]
    InvalidSignature,
}

impl Encodable for Eip7702Tx {
    fn encode(&self, out: &mut dyn BufMut) {
        encode_eip7702_fields(self, out);
    }

    fn length(&self) -> usize {
        let mut buf = Vec::new();
        encode_eip7702_fields(self, &mut buf);
        buf.len()
    }
}

fn encode_eip7702_fields(tx: &Eip7702Tx, out: &mut dyn BufMut) {
    let mut inner = Vec::new();
    tx.chain_id.encode(&mut inner);
    tx.nonce.encode(&mut inner);
    tx.max_priority_fee_per_gas.encode(&mut inner);
    tx.max_fee_per_gas.encode(&mut inner);
    tx.gas_limit.encode(&mut inner);
    tx.to.encode(&mut inner);
    tx.value.encode(&mut inner);
    tx.input.encode(&mut inner);
    tx.access_list.encode(&mut inner);
    encode_authorization_list(&tx.authorization_list, &mut inner);
    tx.y_parity.encode(&mut inner);
    U256::from_be_bytes(tx.r.to_be_bytes()).encode(&mut inner);
    U256::from_be_bytes(tx.s.to_be_bytes()).encode(&mut inner);
    Header { list: true, payload_length: inner.len() }.encode(out);
    out.put_slice(&inner);
}

fn decode_eip7702_fields(buf: &mut &[u8]) -> alloy_rlp::Result<Eip7702Tx> {
    let header = Header::decode(buf)?;
    if !header.list {
        return Err(alloy_rlp::Error::UnexpectedString);
    }
    let chain_id = u64::decode(buf)?;
    let nonce = u64::decode(buf)?;
    let max_priority_fee_per_gas = u128::decode(buf)?;
    let max_fee_per_gas = u128::decode(buf)?;
    let gas_limit = u64::decode(buf)?;
    let to = Address::decode(buf)?;
    let value = U256::decode(buf)?;
    let input = Bytes::decode(buf)?;
    let access_list = AccessList::decode(buf)?;

    let auth_header = Header::decode(buf)?;
    if !auth_header.list {
        return Err(alloy_rlp::Error::UnexpectedString);
    }
    let mut remaining = &buf[..auth_header.payload_length];
    let mut authorization_list = Vec::new();
    while !remaining.is_empty() {
        let item_header = Header::decode(&mut remaining)?;
        if !item_header.list {
            return Err(alloy_rlp::Error::UnexpectedString);
        }
        let auth_chain_id = u64::decode(&mut remaining)?;
        let address = Address::decode(&mut remaining)?;
        let auth_nonce = u64::decode(&mut remaining)?;
        let y_parity = u8::decode(&mut remaining)?;
        let r = U256::decode(&mut remaining)?;
        let s = U256::decode(&mut remaining)?;
        authorization_list.push(SignedAuthorization {
            inner: crate::authorization::Authorization { chain_id: auth_chain_id, address, nonce: auth_nonce },
            y_parity,
            r: B256::from(r.to_be_bytes()),
            s: B256::from(s.to_be_bytes()),
        });
    }
    buf.advance(auth_header.payload_length);

    let y_parity = u8::decode(buf)?;
    let r = U256::decode(buf)?;
    let s = U256::decode(buf)?;

    Ok(Eip7702Tx {
        chain_id,
        nonce,
        max_priority_fee_per_gas,
        max_fee_per_gas,
        gas_limit,
        to,
        value,
        input,
        access_list,
        authorization_list,
        y_parity,
        r,
        s,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_1559() -> Eip1559Tx {
        Eip1559Tx {
            chain_id: 1,
            nonce: 0,
            max_priority_fee_per_gas: 80,
            max_fee_per_gas: 150,
            gas_limit: 21000,
            kind: TransactionKind::Call(Address::repeat_byte(2)),
            value: U256::from(100),
            input: Bytes::new(),
            access_list: AccessList::default(),
            y_parity: 1,
            r: U256::from(1),
            s: U256::from(1),
        }
    }

    #[test]
    fn eip1559_effective_gas_price_is_capped_by_max_fee() {
        let tx = sample_1559();
        assert_eq!(tx.effective_gas_price(100), 150);
    }

    #[test]
    fn eip1559_effective_gas_price_tracks_base_fee_plus_tip_when_below_cap() {
        let mut tx = sample_1559();
        tx.max_fee_per_gas = 1_000;
        assert_eq!(tx.effective_gas_price(100), 180);
    }

    #[test]
    fn legacy_roundtrips_through_rlp() {
        let tx = LegacyTx {
            nonce: 9,
            gas_price: 7,
            gas_limit: 21000,
            kind: TransactionKind::Call(Address::repeat_byte(3)),
            value: U256::from(5),
            input: Bytes::new(),
            chain_id: Some(1),
            signature: Signature { y_parity: 0, r: U256::from(10), s: U256::from(20) },
        };
        let mut buf = Vec::new();
        tx.encode(&mut buf);
        let decoded = LegacyTx::decode(&mut buf.as_slice()).unwrap();
        assert_eq!(tx, decoded);
    }

    #[test]
    fn transaction_kind_roundtrips() {
        let create = TransactionKind::Create;
        let mut buf = Vec::new();
        create.encode(&mut buf);
        assert_eq!(TransactionKind::decode(&mut buf.as_slice()).unwrap(), create);

        let call = TransactionKind::Call(Address::repeat_byte(7));
        let mut buf = Vec::new();
        call.encode(&mut buf);
        assert_eq!(TransactionKind::decode(&mut buf.as_slice()).unwrap(), call);
    }

    #[test]
    fn blob_versioned_hash_validation_rejects_wrong_prefix() {
        let mut tx = Eip4844Tx {
            chain_id: 1,
            nonce: 0,
            max_priority_fee_per_gas: 1,
            max_fee_per_gas: 1,
            gas_limit: 21000,
            to: Address::ZERO,
            value: U256::ZERO,
            input: Bytes::new(),
            access_list: AccessList::default(),
            max_fee_per_blob_gas: 1,
            blob_versioned_hashes: vec![B256::ZERO],
            y_parity: 0,
            r: U256::from(1),
            s: U256::from(1),
        };
        assert!(!tx.has_valid_blob_versions());
        tx.blob_versioned_hashes = vec![{
            let mut h = B256::ZERO;
            h.0[0] = BLOB_VERSIONED_HASH_VERSION;
            h
        }];
        assert!(tx.has_valid_blob_versions());
    }
}
