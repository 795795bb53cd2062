//! Transcript storage contracts and a basic in-memory implementation.

use std::collections::HashMap;
use std::sync::Mutex;

use gcommon::{BoxFuture, SessionId, UserId};

use crate::{ChatError, ConversationState, MessageRole, Transcript};

pub trait TranscriptStore: Send + Sync {
    fn find_by_session<'a>(
        &'a self,
        session_id: &'a SessionId,
    ) -> BoxFuture<'a, Result<Option<Transcript>, ChatError>>;

    /// Appends one message, creating the transcript on first use.
    fn append<'a>(
        &'a self,
        session_id: &'a SessionId,
        user_id: &'a UserId,
        role: MessageRole,
        content: String,
    ) -> BoxFuture<'a, Result<(), ChatError>>;

    /// Replaces the stored conversation state snapshot.
    fn save_context<'a>(
        &'a self,
        session_id: &'a SessionId,
        user_id: &'a UserId,
        context: ConversationState,
    ) -> BoxFuture<'a, Result<(), ChatError>>;
}

#[derive(Debug, Default)]
pub struct InMemoryTranscriptStore {
    transcripts: Mutex<HashMap<SessionId, Transcript>>,
}

impl InMemoryTranscriptStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_transcript<T>(
        &self,
        session_id: &SessionId,
        user_id: &UserId,
        update: impl FnOnce(&mut Transcript) -> T,
    ) -> Result<T, ChatError> {
        let mut transcripts = self
            .transcripts
            .lock()
            .map_err(|_| ChatError::store("transcript store lock poisoned"))?;

        let transcript = transcripts
            .entry(session_id.clone())
            .or_insert_with(|| Transcript::new(session_id.clone(), user_id.clone()));
        Ok(update(transcript))
    }
}

impl TranscriptStore for InMemoryTranscriptStore {
    fn find_by_session<'a>(
        &'a self,
        session_id: &'a SessionId,
    ) -> BoxFuture<'a, Result<Option<Transcript>, ChatError>> {
        Box::pin(async move {
            let transcripts = self
                .transcripts
                .lock()
                .map_err(|_| ChatError::store("transcript store lock poisoned"))?;

            Ok(transcripts.get(session_id).cloned())
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
            self.with_transcript(session_id, user_id, |transcript| {
                transcript.push(role, content)
            })
        })
    }

    fn save_context<'a>(
        &'a self,
        session_id: &'a SessionId,
        user_id: &'a UserId,
        context: ConversationState,
    ) -> BoxFuture<'a, Result<(), ChatError>> {
        Box::pin(async move {
            self.with_transcript(session_id, user_id, |transcript| {
                transcript.set_context(context)
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ConversationStep;

    #[tokio::test]
    async fn append_creates_and_extends_transcript() {
        let store = InMemoryTranscriptStore::new();
        let session = SessionId::from("s1");
        let user = UserId::from("u1");

        assert!(store.find_by_session(&session).await.expect("find").is_none());

        store
            .append(&session, &user, MessageRole::User, "hello".to_string())
            .await
            .expect("append user");
        store
            .append(&session, &user, MessageRole::Bot, "welcome".to_string())
            .await
            .expect("append bot");

        let transcript = store
            .find_by_session(&session)
            .await
            .expect("find")
            .expect("transcript");
        assert_eq!(transcript.user_id, user);
        assert_eq!(transcript.messages.len(), 2);
        assert_eq!(transcript.messages[1].role, MessageRole::Bot);
        assert!(transcript.last_updated >= transcript.created_at);
    }

    #[tokio::test]
    async fn save_context_replaces_snapshot() {
        let store = InMemoryTranscriptStore::new();
        let session = SessionId::from("s2");
        let user = UserId::anonymous();

        let mut state = ConversationState::new(session.clone());
        store
            .save_context(&session, &user, state.clone())
            .await
            .expect("save");

        state.select_country("Chile");
        store
            .save_context(&session, &user, state.clone())
            .await
            .expect("save again");

        let transcript = store
            .find_by_session(&session)
            .await
            .expect("find")
            .expect("transcript");
        let context = transcript.context.expect("context");
        assert_eq!(context.current_step, ConversationStep::ChooseOption);
        assert!(transcript.messages.is_empty());
    }
}
