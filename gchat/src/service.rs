//! Chat service: per-session serialization, state restore, and transcript
//! persistence around the dialogue engine.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use gcommon::{SessionId, UserId};
use gcountry::CountryLookup;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::{
    ChatError, ChatTurnRequest, ChatTurnResult, ConversationState, DialogueEngine, DialogueHooks,
    InMemoryTranscriptStore, MessageRole, NoopDialogueHooks, Transcript, TranscriptStore,
};

/// Live state for one session plus the time its last turn ended.
struct LiveSession {
    state: Option<ConversationState>,
    touched: Instant,
}

impl Default for LiveSession {
    fn default() -> Self {
        Self {
            state: None,
            touched: Instant::now(),
        }
    }
}

type SessionSlot = Arc<Mutex<LiveSession>>;

#[derive(Clone)]
pub struct ChatService {
    engine: Arc<DialogueEngine>,
    store: Arc<dyn TranscriptStore>,
    sessions: Arc<DashMap<SessionId, SessionSlot>>,
    idle_timeout: Option<Duration>,
}

impl ChatService {
    pub fn new(engine: DialogueEngine, store: Arc<dyn TranscriptStore>) -> Self {
        Self {
            engine: Arc::new(engine),
            store,
            sessions: Arc::new(DashMap::new()),
            idle_timeout: None,
        }
    }

    pub fn builder(lookup: Arc<dyn CountryLookup>) -> ChatServiceBuilder {
        ChatServiceBuilder::new(lookup)
    }

    /// Evicts live sessions before each turn once they sit idle this long.
    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = Some(idle_timeout);
        self
    }

    pub fn idle_timeout(&self) -> Option<Duration> {
        self.idle_timeout
    }

    /// Runs one user turn. Turns for the same session are serialized; turns
    /// for different sessions run independently.
    ///
    /// The turn only takes effect once its messages and context are stored.
    /// A store failure leaves the session where it was before the turn.
    pub async fn run_turn(&self, request: ChatTurnRequest) -> Result<ChatTurnResult, ChatError> {
        if request.user_input.trim().is_empty() {
            return Err(ChatError::invalid_request("user_input must not be empty"));
        }

        if let Some(max_idle) = self.idle_timeout {
            self.purge_idle(max_idle);
        }

        let ChatTurnRequest {
            session_id,
            user_id,
            user_input,
        } = request;

        let (slot, mut live) = self.acquire(&session_id).await;
        live.touched = Instant::now();

        let before = match live.state.take() {
            Some(state) => state,
            None => self.restore(&session_id).await?,
        };

        let mut state = before.clone();
        let reply = self.engine.process(&user_input, &mut state).await;
        let result = ChatTurnResult::from_state(reply.clone(), &state);
        let finished = state.is_finished();

        let saved = self
            .save_turn(&session_id, &user_id, user_input, reply, state.clone())
            .await;
        live.touched = Instant::now();

        if let Err(error) = saved {
            tracing::warn!(
                session_id = %session_id,
                error = %error,
                "turn not stored; session left at its previous step"
            );
            live.state = Some(before);
            return Err(error);
        }

        if finished {
            drop(live);
            self.sessions
                .remove_if(&session_id, |_, current| Arc::ptr_eq(current, &slot));
            tracing::debug!(session_id = %session_id, "conversation finished");
        } else {
            live.state = Some(state);
        }

        Ok(result)
    }

    pub async fn transcript(&self, session_id: &SessionId) -> Result<Option<Transcript>, ChatError> {
        self.store.find_by_session(session_id).await
    }

    /// Sessions with live in-process state.
    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }

    /// Drops live state for sessions whose last turn ended at least
    /// `max_idle` ago. Sessions with a turn in flight are kept. An evicted
    /// session resumes from its stored context on its next turn.
    pub fn purge_idle(&self, max_idle: Duration) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, slot| match slot.try_lock() {
            Ok(live) => live.touched.elapsed() < max_idle,
            Err(_) => true,
        });
        let evicted = before.saturating_sub(self.sessions.len());
        if evicted > 0 {
            tracing::debug!(evicted, "evicted idle sessions");
        }
        evicted
    }

    /// Locks the session's slot, retrying when the slot was evicted or
    /// finished while this turn waited on it.
    async fn acquire(&self, session_id: &SessionId) -> (SessionSlot, OwnedMutexGuard<LiveSession>) {
        loop {
            let slot = self
                .sessions
                .entry(session_id.clone())
                .or_default()
                .clone();
            let live = slot.clone().lock_owned().await;
            let current = self
                .sessions
                .get(session_id)
                .is_some_and(|entry| Arc::ptr_eq(entry.value(), &slot));
            if current {
                return (slot, live);
            }
        }
    }

    async fn save_turn(
        &self,
        session_id: &SessionId,
        user_id: &UserId,
        user_input: String,
        reply: String,
        state: ConversationState,
    ) -> Result<(), ChatError> {
        self.store
            .append(session_id, user_id, MessageRole::User, user_input)
            .await?;
        self.store
            .append(session_id, user_id, MessageRole::Bot, reply)
            .await?;
        self.store.save_context(session_id, user_id, state).await
    }

    /// Picks up a stored conversation, or starts fresh when there is none or
    /// the stored one already ended.
    async fn restore(&self, session_id: &SessionId) -> Result<ConversationState, ChatError> {
        let stored = self
            .store
            .find_by_session(session_id)
            .await?
            .and_then(|transcript| transcript.context);

        match stored {
            Some(mut state) if !state.is_finished() => {
                tracing::debug!(
                    session_id = %session_id,
                    step = %state.current_step,
                    "restored conversation state"
                );
                state.session_id = session_id.clone();
                Ok(state)
            }
            _ => Ok(ConversationState::new(session_id.clone())),
        }
    }
}

pub struct ChatServiceBuilder {
    lookup: Arc<dyn CountryLookup>,
    store: Option<Arc<dyn TranscriptStore>>,
    hooks: Arc<dyn DialogueHooks>,
    idle_timeout: Option<Duration>,
}

impl ChatServiceBuilder {
    pub fn new(lookup: Arc<dyn CountryLookup>) -> Self {
        Self {
            lookup,
            store: None,
            hooks: Arc::new(NoopDialogueHooks),
            idle_timeout: None,
        }
    }

    pub fn store(mut self, store: Arc<dyn TranscriptStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn hooks(mut self, hooks: Arc<dyn DialogueHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = Some(idle_timeout);
        self
    }

    pub fn build(self) -> ChatService {
        let engine = DialogueEngine::new(self.lookup).with_hooks(self.hooks);
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(InMemoryTranscriptStore::new()));
        let service = ChatService::new(engine, store);
        match self.idle_timeout {
            Some(idle_timeout) => service.with_idle_timeout(idle_timeout),
            None => service,
        }
    }
}

#[cfg(test)]
mod tests {
    use gcountry::{CountryResolver, CountryStore, OfflineCountrySource};

    use std::sync::atomic::{AtomicUsize, Ordering};

    use gcommon::BoxFuture;

    use super::*;
    use crate::{ChatErrorKind, ConversationStep, render};

    /// In-memory store that rejects the next `fail_appends` appends and the
    /// next `fail_saves` context saves.
    #[derive(Default)]
    struct FlakyStore {
        inner: InMemoryTranscriptStore,
        fail_appends: AtomicUsize,
        fail_saves: AtomicUsize,
    }

    impl FlakyStore {
        fn take_failure(counter: &AtomicUsize) -> bool {
            counter
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
                .is_ok()
        }
    }

    impl TranscriptStore for FlakyStore {
        fn find_by_session<'a>(
            &'a self,
            session_id: &'a SessionId,
        ) -> BoxFuture<'a, Result<Option<Transcript>, ChatError>> {
            self.inner.find_by_session(session_id)
        }

        fn append<'a>(
            &'a self,
            session_id: &'a SessionId,
            user_id: &'a UserId,
            role: MessageRole,
            content: String,
        ) -> BoxFuture<'a, Result<(), ChatError>> {
            if Self::take_failure(&self.fail_appends) {
                return Box::pin(async { Err(ChatError::store("disk full")) });
            }
            self.inner.append(session_id, user_id, role, content)
        }

        fn save_context<'a>(
            &'a self,
            session_id: &'a SessionId,
            user_id: &'a UserId,
            context: ConversationState,
        ) -> BoxFuture<'a, Result<(), ChatError>> {
            if Self::take_failure(&self.fail_saves) {
                return Box::pin(async { Err(ChatError::store("disk full")) });
            }
            self.inner.save_context(session_id, user_id, context)
        }
    }

    fn service_with(store: Arc<dyn TranscriptStore>) -> ChatService {
        let countries = Arc::new(CountryStore::bundled().expect("bundled dataset"));
        let resolver = CountryResolver::builder(Arc::new(OfflineCountrySource), countries).build();
        ChatService::builder(Arc::new(resolver)).store(store).build()
    }

    #[tokio::test]
    async fn run_turn_rejects_blank_input() {
        let store = Arc::new(InMemoryTranscriptStore::new());
        let service = service_with(store.clone());

        let error = service
            .run_turn(ChatTurnRequest::new("s1", "   "))
            .await
            .expect_err("blank input should fail");

        assert_eq!(error.kind, ChatErrorKind::InvalidRequest);
        assert!(
            store
                .find_by_session(&SessionId::from("s1"))
                .await
                .expect("find")
                .is_none()
        );
    }

    #[tokio::test]
    async fn run_turn_persists_both_messages_and_context() {
        let store = Arc::new(InMemoryTranscriptStore::new());
        let service = service_with(store.clone());

        let result = service
            .run_turn(ChatTurnRequest::new("s2", "hello").with_user("u1"))
            .await
            .expect("turn");
        assert_eq!(result.reply, render::WELCOME_MESSAGE);
        assert_eq!(result.step, ConversationStep::SelectCountry);

        let transcript = service
            .transcript(&SessionId::from("s2"))
            .await
            .expect("find")
            .expect("transcript");
        assert_eq!(transcript.user_id.as_str(), "u1");
        assert_eq!(transcript.messages.len(), 2);
        assert_eq!(transcript.messages[0].role, MessageRole::User);
        assert_eq!(transcript.messages[0].content, "hello");
        assert_eq!(transcript.messages[1].content, render::WELCOME_MESSAGE);
        assert_eq!(
            transcript.context.map(|context| context.current_step),
            Some(ConversationStep::SelectCountry)
        );
    }

    #[tokio::test]
    async fn state_is_restored_from_stored_context() {
        let store = Arc::new(InMemoryTranscriptStore::new());
        let first = service_with(store.clone());
        first
            .run_turn(ChatTurnRequest::new("s3", "hello"))
            .await
            .expect("welcome");
        first
            .run_turn(ChatTurnRequest::new("s3", "Kenya"))
            .await
            .expect("select");

        let second = service_with(store);
        let result = second
            .run_turn(ChatTurnRequest::new("s3", "B"))
            .await
            .expect("option");

        assert!(result.reply.starts_with("The national animal of Kenya is Lion."));
        assert_eq!(result.selected_country.as_deref(), Some("Kenya"));
    }

    #[tokio::test]
    async fn finished_conversation_starts_fresh() {
        let store = Arc::new(InMemoryTranscriptStore::new());
        let service = service_with(store);

        for input in ["hello", "Spain", "G"] {
            service
                .run_turn(ChatTurnRequest::new("s4", input))
                .await
                .expect("turn");
        }
        assert_eq!(service.active_sessions(), 0);

        let result = service
            .run_turn(ChatTurnRequest::new("s4", "Spain"))
            .await
            .expect("new conversation");
        assert_eq!(result.reply, render::WELCOME_MESSAGE);
        assert_eq!(service.active_sessions(), 1);
    }

    #[tokio::test]
    async fn concurrent_turns_for_one_session_are_serialized() {
        let store = Arc::new(InMemoryTranscriptStore::new());
        let service = service_with(store);

        let turns = (0..8).map(|index| {
            let service = service.clone();
            tokio::spawn(async move {
                service
                    .run_turn(ChatTurnRequest::new("shared", format!("input {index}")))
                    .await
            })
        });

        let mut welcomes = 0;
        for turn in turns.collect::<Vec<_>>() {
            let result = turn.await.expect("join").expect("turn");
            if result.reply == render::WELCOME_MESSAGE {
                welcomes += 1;
            }
        }
        assert_eq!(welcomes, 1);

        let transcript = service
            .transcript(&SessionId::from("shared"))
            .await
            .expect("find")
            .expect("transcript");
        assert_eq!(transcript.messages.len(), 16);
        assert_eq!(
            transcript.context.map(|context| context.interaction_count),
            Some(8)
        );
    }

    #[tokio::test]
    async fn failed_store_leaves_session_at_previous_step() {
        let store = Arc::new(FlakyStore::default());
        store.fail_appends.store(1, Ordering::SeqCst);
        let service = service_with(store.clone());

        let error = service
            .run_turn(ChatTurnRequest::new("flaky", "hello"))
            .await
            .expect_err("append should fail");
        assert_eq!(error.kind, ChatErrorKind::Store);

        let retried = service
            .run_turn(ChatTurnRequest::new("flaky", "hello"))
            .await
            .expect("retried turn");
        assert_eq!(retried.reply, render::WELCOME_MESSAGE);
        assert_eq!(retried.step, ConversationStep::SelectCountry);

        let transcript = service
            .transcript(&SessionId::from("flaky"))
            .await
            .expect("find")
            .expect("transcript");
        let contents: Vec<&str> = transcript
            .messages
            .iter()
            .map(|message| message.content.as_str())
            .collect();
        assert_eq!(contents, vec!["hello", render::WELCOME_MESSAGE]);
    }

    #[tokio::test]
    async fn failed_store_on_exit_keeps_conversation_open() {
        let store = Arc::new(FlakyStore::default());
        let service = service_with(store.clone());

        for input in ["hello", "Spain"] {
            service
                .run_turn(ChatTurnRequest::new("leaving", input))
                .await
                .expect("turn");
        }

        store.fail_saves.store(1, Ordering::SeqCst);
        service
            .run_turn(ChatTurnRequest::new("leaving", "G"))
            .await
            .expect_err("save should fail");
        assert_eq!(service.active_sessions(), 1);

        let result = service
            .run_turn(ChatTurnRequest::new("leaving", "A"))
            .await
            .expect("option after failed exit");
        assert!(result.reply.starts_with("The capital of Spain is Madrid."));
        assert_eq!(result.step, ConversationStep::ChooseOption);
    }

    #[tokio::test]
    async fn idle_sessions_are_evicted_and_restored_from_store() {
        let store = Arc::new(InMemoryTranscriptStore::new());
        let service = service_with(store);

        for input in ["hello", "Spain"] {
            service
                .run_turn(ChatTurnRequest::new("idle", input))
                .await
                .expect("turn");
        }
        assert_eq!(service.purge_idle(Duration::from_secs(3600)), 0);
        assert_eq!(service.active_sessions(), 1);

        assert_eq!(service.purge_idle(Duration::ZERO), 1);
        assert_eq!(service.active_sessions(), 0);

        let result = service
            .run_turn(ChatTurnRequest::new("idle", "A"))
            .await
            .expect("restored turn");
        assert!(result.reply.starts_with("The capital of Spain is Madrid."));
        assert_eq!(result.selected_country.as_deref(), Some("Spain"));
        assert_eq!(service.active_sessions(), 1);
    }

    #[tokio::test]
    async fn idle_timeout_sweeps_other_sessions_on_each_turn() {
        let countries = Arc::new(CountryStore::bundled().expect("bundled dataset"));
        let resolver = CountryResolver::builder(Arc::new(OfflineCountrySource), countries).build();
        let service = ChatService::builder(Arc::new(resolver))
            .idle_timeout(Duration::ZERO)
            .build();
        assert_eq!(service.idle_timeout(), Some(Duration::ZERO));

        service
            .run_turn(ChatTurnRequest::new("first", "hello"))
            .await
            .expect("first");
        service
            .run_turn(ChatTurnRequest::new("second", "hello"))
            .await
            .expect("second");

        assert_eq!(service.active_sessions(), 1);
    }
}
