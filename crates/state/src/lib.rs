//! The journaled, trie-backed account state database (C3) and its
//! per-transaction transient storage companion (C4).

#![warn(missing_docs, unreachable_pub)]

mod backend;
mod db;
mod entry;
mod errors;
mod genesis;

pub use backend::{InMemoryPersistence, Persistence, RocksPersistence};
pub use db::AccountStateDb;
pub use entry::JournalEntry;
pub use errors::StateError;
pub use genesis::GenesisAccount;
