//! Precompiled contract dispatch: address routing, per-fork gas accounting,
//! and the handful of cryptographic primitives Ethereum exposes as
//! precompiles rather than opcodes.

#![warn(missing_docs, unreachable_pub)]

mod addresses;
mod blake2f;
mod bn128;
mod dispatch;
mod ecrecover;
mod errors;
mod hash;
mod modexp;
mod point_evaluation;

pub use addresses::{
    BLAKE2F, BN128_ADD, BN128_MUL, BN128_PAIRING, ECRECOVER, IDENTITY, MODEXP, POINT_EVALUATION,
    RIPEMD160, SHA256,
};
pub use dispatch::{execute, is_precompile, precompile_gas_cost};
pub use errors::PrecompileError;
