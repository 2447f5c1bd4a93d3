//! Cairn Storage - Graph store implementations
//!
//! This crate provides the in-memory graph store used by the CLI and tests,
//! together with the JSON snapshot format it loads from.

pub mod error;
pub mod memory;
pub mod snapshot;

pub use error::{StorageError, StorageResult};
pub use memory::MemoryStore;
pub use snapshot::{GraphSnapshot, SnapshotEdge};
