//! Transcript and conversation-state persistence with a gchat store adapter.
//!
//! ```rust
//! use gmemory::{MemoryBackendConfig, create_memory_backend};
//!
//! let backend = create_memory_backend(MemoryBackendConfig::InMemory)
//!     .expect("in-memory backend should build");
//! let _store = gmemory::MemoryTranscriptStore::new(backend);
//! ```

mod adapter;
mod backend;
mod backends;
mod error;

pub mod prelude {
    pub use crate::{
        FilesystemMemoryBackend, InMemoryMemoryBackend, MemoryBackend, MemoryBackendConfig,
        MemoryError, MemoryErrorKind, MemoryTranscriptStore, SqliteMemoryBackend,
        create_default_memory_backend, create_memory_backend,
    };
}

pub use adapter::MemoryTranscriptStore;
pub use backend::{
    FilesystemMemoryBackend, InMemoryMemoryBackend, MemoryBackend, MemoryBackendConfig,
    SqliteMemoryBackend, create_default_memory_backend, create_memory_backend,
};
pub use error::{MemoryError, MemoryErrorKind};
