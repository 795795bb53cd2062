//! Adapter that exposes gmemory as a gchat TranscriptStore.

use std::sync::Arc;

use gchat::{
    ChatError, ConversationState, MessageRole, Transcript, TranscriptMessage, TranscriptStore,
};
use gcommon::{BoxFuture, SessionId, UserId};

use crate::backend::MemoryBackend;
use crate::error::{MemoryError, MemoryErrorKind};

#[derive(Clone)]
pub struct MemoryTranscriptStore {
    backend: Arc<dyn MemoryBackend>,
}

impl MemoryTranscriptStore {
    pub fn new(backend: Arc<dyn MemoryBackend>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> Arc<dyn MemoryBackend> {
        Arc::clone(&self.backend)
    }
}

impl TranscriptStore for MemoryTranscriptStore {
    fn find_by_session<'a>(
        &'a self,
        session_id: &'a SessionId,
    ) -> BoxFuture<'a, Result<Option<Transcript>, ChatError>> {
        Box::pin(async move {
            self.backend
                .load_transcript(session_id)
                .await
                .map_err(memory_error_to_chat_error)
        })
    }

    fn append<'a>(
        &'a self,
        session_id: &'a SessionId,
        user_id: &'a UserId,
        role: MessageRole,
        content: String,
    ) -> BoxFuture<'a, Result<(), ChatError>> {
        Box::pin(async move {
            self.backend
                .append_message(session_id, user_id, TranscriptMessage::new(role, content))
                .await
                .map_err(memory_error_to_chat_error)
        })
    }

    fn save_context<'a>(
        &'a self,
        session_id: &'a SessionId,
        user_id: &'a UserId,
        context: ConversationState,
    ) -> BoxFuture<'a, Result<(), ChatError>> {
        Box::pin(async move {
            self.backend
                .save_context(session_id, user_id, context)
                .await
                .map_err(memory_error_to_chat_error)
        })
    }
}

fn memory_error_to_chat_error(error: MemoryError) -> ChatError {
    match error.kind {
        MemoryErrorKind::InvalidRequest => ChatError::invalid_request(error.to_string()),
        _ => ChatError::store(error.to_string()),
    }
}
