//! Country dialogue over a step machine, with per-session chat orchestration.
//!
//! ```rust
//! use std::sync::Arc;
//! use gchat::prelude::*;
//! use gcountry::{CountryResolver, CountryStore, OfflineCountrySource};
//!
//! # async fn demo() -> Result<(), ChatError> {
//! let countries = Arc::new(CountryStore::bundled().expect("bundled dataset"));
//! let resolver = CountryResolver::builder(Arc::new(OfflineCountrySource), countries).build();
//! let service = ChatService::builder(Arc::new(resolver)).build();
//!
//! service.run_turn(ChatTurnRequest::new("s1", "hello")).await?;
//! let turn = service.run_turn(ChatTurnRequest::new("s1", "Spain")).await?;
//! assert_eq!(turn.step, ConversationStep::ChooseOption);
//! # Ok(())
//! # }
//! ```

mod engine;
mod error;
mod hooks;
pub mod render;
mod service;
mod state;
mod store;
mod types;

pub mod prelude {
    pub use crate::{
        ChatError, ChatErrorKind, ChatService, ChatServiceBuilder, ChatTurnRequest,
        ChatTurnResult, ConversationState, ConversationStep, DialogueEngine, DialogueHooks,
        InMemoryTranscriptStore, MessageRole, NoopDialogueHooks, Transcript, TranscriptStore,
    };
    pub use gcommon::{SessionId, UserId};
}

pub use engine::{DialogueEngine, MenuOption};
pub use error::{ChatError, ChatErrorKind};
pub use hooks::{DialogueHooks, NoopDialogueHooks};
pub use service::{ChatService, ChatServiceBuilder};
pub use state::{ConversationState, ConversationStep};
pub use store::{InMemoryTranscriptStore, TranscriptStore};
pub use types::{ChatTurnRequest, ChatTurnResult, MessageRole, Transcript, TranscriptMessage};
pub use gcommon::{SessionId, UserId};
