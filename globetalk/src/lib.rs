//! Unified facade over the GlobeTalk workspace crates.
//!
//! This crate is the single dependency for most applications. It re-exports
//! the country, chat, memory and observability crates and wires them into a
//! ready-to-use runtime from environment configuration.
//!
//! ```rust
//! use std::sync::Arc;
//! use globetalk::prelude::*;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let config = RuntimeConfig::default().with_memory(MemoryBackendConfig::InMemory);
//! let runtime = build_runtime_with_source(config, Arc::new(OfflineCountrySource))?;
//!
//! let turn = runtime.chat.run_turn(turn("session-1", "hello")).await?;
//! assert_eq!(turn.step, ConversationStep::SelectCountry);
//! # Ok(())
//! # }
//! ```

mod config;
mod error;

pub mod prelude;
pub mod runtime;
pub mod util;

pub use gchat;
pub use gcommon;
pub use gcountry;
pub use gmemory;
pub use gobserve;

pub use gchat::{
    ChatError, ChatErrorKind, ChatService, ChatServiceBuilder, ChatTurnRequest, ChatTurnResult,
    ConversationState, ConversationStep, DialogueEngine, DialogueHooks, InMemoryTranscriptStore,
    MenuOption, MessageRole, NoopDialogueHooks, Transcript, TranscriptMessage, TranscriptStore,
};
pub use gcommon::{BoxFuture, SessionId, UserId};
pub use gcountry::{
    COUNTRY_NOT_FOUND, CountryError, CountryErrorKind, CountryLookup, CountryProperty,
    CountryRecord, CountryResolver, CountryResolverBuilder, CountrySource, CountryStore,
    DEFAULT_NAME_LIST_TTL, DEFAULT_RECORD_TTL, NoopResolverHooks, OfflineCountrySource,
    ResolverOperationHooks, RestCountriesSource, RetryPolicy, format_area, format_population,
};
pub use gmemory::{
    FilesystemMemoryBackend, InMemoryMemoryBackend, MemoryBackend, MemoryBackendConfig,
    MemoryError, MemoryErrorKind, MemoryTranscriptStore, SqliteMemoryBackend,
    create_memory_backend,
};
pub use gobserve::{
    MetricsObservabilityHooks, ObservabilityHooks, SafeDialogueHooks, SafeResolverHooks,
    TracingObservabilityHooks,
};

pub use config::{DEFAULT_API_BASE_URL, RuntimeConfig};
pub use error::{RuntimeError, RuntimeErrorKind};
pub use runtime::{RuntimeBundle, build_runtime, build_runtime_with_source};
pub use util::{MemoryKind, new_session_id, parse_memory_kind, turn, user_turn};

#[cfg(test)]
mod tests {
    use crate::{CountryError, MemoryError, RuntimeError, RuntimeErrorKind};

    #[test]
    fn crate_errors_convert_into_runtime_errors() {
        let country: RuntimeError = CountryError::data_load("bad dataset").into();
        assert_eq!(country.kind, RuntimeErrorKind::Country);
        assert!(country.message.contains("bad dataset"));

        let memory: RuntimeError = MemoryError::storage("disk full").into();
        assert_eq!(memory.kind, RuntimeErrorKind::Memory);
        assert_eq!(memory.to_string(), "Memory: Storage: disk full");
    }
}
