//! Durable stores for the launcher core.
//!
//! Every store is a JSON file with an in-memory copy behind a mutex; all
//! mutations are read-modify-write sequences under that lock, persisted
//! write-through. The original design relied on a single-threaded control
//! flow for atomicity; here the locking is explicit.

mod file;
pub mod installed;
pub mod keyed;
pub mod library;

pub use installed::InstalledStore;
pub use keyed::KeyedStore;
pub use library::LibraryStore;

/// Errors produced by the durable stores.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
