//! Durable storage for the store state
//!
//! - `persistence`: versioned JSON blob on disk, best-effort save/load
//! - `debounce`: quiet-period write scheduler
//! - `error`: typed storage errors

pub mod debounce;
pub mod error;
pub mod persistence;

pub use debounce::DebouncedWriter;
pub use error::{StorageError, StorageResult};
pub use persistence::StatePersistence;
