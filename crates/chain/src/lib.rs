//! Block import, reorg handling, withdrawals, and header-gap tracking
//! (C13/C14/C16) atop the executor and state layers.

#![warn(missing_docs, unreachable_pub)]

mod block;
mod chain;
mod db;
mod errors;
mod gaps;
mod withdrawals;

pub use block::{receipts_root, transactions_root, Block, BlockBody};
pub use chain::{Chain, ImportOutcome, Witness};
pub use db::{BlockLocation, ChainDb, InMemoryChainDb, RocksChainDb};
pub use errors::{ChainError, ChainResult};
pub use gaps::{ChainGaps, GapFillOutcome, GapRange};
pub use withdrawals::{apply_withdrawals, withdrawal_hash, withdrawals_root};
