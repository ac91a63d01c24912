//! Whole-transaction execution (C9): validation, intrinsic/floor gas, fee
//! settlement, EIP-7702 authorization application, and dispatch into
//! `ward-interpreter` for the top-level `CALL` or contract-creation frame.

#![warn(missing_docs, unreachable_pub)]

mod env;
mod errors;
mod executor;
mod gas;

pub use env::{BlockContext, BlockContextBuilder};
pub use errors::{ExecutorError, ExecutorResult};
pub use executor::{ExecutionOutcome, GasAccounting, TransactionExecutor};
pub use gas::{capped_refund, floor_gas, intrinsic_gas, PER_EMPTY_ACCOUNT_COST};
