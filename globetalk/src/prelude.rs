//! Common imports for most GlobeTalk applications.

pub use crate::{
    build_runtime, build_runtime_with_source, new_session_id, parse_memory_kind, turn, user_turn,
};
pub use crate::{
    BoxFuture, ChatError, ChatErrorKind, ChatService, ChatTurnRequest, ChatTurnResult,
    ConversationState, ConversationStep, CountryError, CountryLookup, CountryRecord,
    CountryResolver, CountrySource, CountryStore, DialogueHooks, MemoryBackend,
    MemoryBackendConfig, MemoryTranscriptStore, MessageRole, ObservabilityHooks,
    OfflineCountrySource, ResolverOperationHooks, RestCountriesSource, RetryPolicy,
    RuntimeBundle, RuntimeConfig, RuntimeError, RuntimeErrorKind, SessionId, Transcript,
    TranscriptStore, UserId,
};
