//! # quiniela-store
//!
//! Storage contracts for the two document collections (pools and entries)
//! and a reference in-memory backend.
//!
//! Other crates only ever see the [`PoolStore`] and [`EntryStore`] traits;
//! the backing document database is injected by the caller.

pub mod memory;
pub mod snapshot;
pub mod store;

pub use memory::MemoryStore;
pub use snapshot::{StoreSnapshot, load_snapshot, save_snapshot};
pub use store::{EntryPage, EntryStore, PoolStore};
