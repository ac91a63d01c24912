//! Primitive types shared across the `ward` crates: accounts, block headers,
//! typed transactions, receipts, logs, and withdrawals.

#![warn(missing_docs, unreachable_pub)]

extern crate alloc;

pub mod account;
pub use account::Account;

pub mod header;
pub use header::{BlockHeader, EMPTY_OMMERS_HASH, EMPTY_ROOT_HASH, GENESIS_PARENT_HASH};

pub mod log;
pub use log::Log;

pub mod access_list;
pub use access_list::{AccessList, AccessListItem};

pub mod authorization;
pub use authorization::{Authorization, SignedAuthorization};

pub mod transaction;
pub use transaction::{
    Eip1559Tx, Eip2930Tx, Eip4844Tx, Eip7702Tx, LegacyTx, Transaction, TransactionKind,
    TxEnvelope, TxType,
};

pub mod receipt;
pub use receipt::{Receipt, ReceiptEnvelope};

pub mod withdrawal;
pub use withdrawal::Withdrawal;

/// A 32-byte opaque hash, as used for block hashes, state roots, and code hashes.
pub type Hash32 = alloy_primitives::B256;

/// A 20-byte account address.
pub type Address = alloy_primitives::Address;

/// An unsigned 256-bit integer, used for balances, storage values, and gas prices.
pub type Word = alloy_primitives::U256;
