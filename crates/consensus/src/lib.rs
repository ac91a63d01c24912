//! Block header construction and validation (C11): the gas-limit adjustment
//! band, per-fork difficulty, EIP-1559 base-fee evolution, EIP-4844 blob-gas
//! evolution, and the genesis header.

#![warn(missing_docs, unreachable_pub)]

mod errors;
mod gas_limit;
mod genesis;
mod header;
mod validate;

pub use errors::{ConsensusError, ConsensusResult};
pub use gas_limit::{compute_gas_limit, gas_limit_bounds, GAS_LIMIT_MAXIMUM, GAS_LIMIT_MINIMUM};
pub use genesis::GenesisParams;
pub use header::{
    create_header_from_parent, genesis_header, HeaderOverrides, BASE_FEE_MAX_CHANGE_DENOMINATOR,
    ELASTICITY_MULTIPLIER, GENESIS_GAS_LIMIT, TARGET_BLOB_GAS_PER_BLOCK,
};
pub use validate::{validate_header, MAXIMUM_EXTRA_DATA_LENGTH};
