//! Memory backend trait and in-memory backend implementation.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use gchat::{ConversationState, Transcript, TranscriptMessage};
use gcommon::{BoxFuture, SessionId, UserId};

use crate::backends::filesystem::default_filesystem_root;
use crate::backends::sqlite::default_sqlite_path;
use crate::error::MemoryError;

pub use crate::backends::filesystem::FilesystemMemoryBackend;
pub use crate::backends::sqlite::SqliteMemoryBackend;

pub trait MemoryBackend: Send + Sync {
    fn load_transcript<'a>(
        &'a self,
        session_id: &'a SessionId,
    ) -> BoxFuture<'a, Result<Option<Transcript>, MemoryError>>;

    /// Appends a message, creating the transcript for `user_id` if needed.
    fn append_message<'a>(
        &'a self,
        session_id: &'a SessionId,
        user_id: &'a UserId,
        message: TranscriptMessage,
    ) -> BoxFuture<'a, Result<(), MemoryError>>;

    fn save_context<'a>(
        &'a self,
        session_id: &'a SessionId,
        user_id: &'a UserId,
        context: ConversationState,
    ) -> BoxFuture<'a, Result<(), MemoryError>>;

    /// The user's most recently updated transcript.
    fn find_latest_for_user<'a>(
        &'a self,
        user_id: &'a UserId,
    ) -> BoxFuture<'a, Result<Option<Transcript>, MemoryError>>;

    /// Deletes transcripts last updated before `cutoff`; returns how many.
    fn purge_older_than<'a>(
        &'a self,
        cutoff: SystemTime,
    ) -> BoxFuture<'a, Result<usize, MemoryError>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemoryBackendConfig {
    Sqlite { path: PathBuf },
    Filesystem { root: PathBuf },
    InMemory,
}

impl MemoryBackendConfig {
    pub fn sqlite_default() -> Self {
        Self::Sqlite {
            path: default_sqlite_path(),
        }
    }

    pub fn filesystem_default() -> Self {
        Self::Filesystem {
            root: default_filesystem_root(),
        }
    }
}

impl Default for MemoryBackendConfig {
    fn default() -> Self {
        Self::sqlite_default()
    }
}

pub fn create_memory_backend(
    config: MemoryBackendConfig,
) -> Result<Arc<dyn MemoryBackend>, MemoryError> {
    match config {
        MemoryBackendConfig::Sqlite { path } => Ok(Arc::new(SqliteMemoryBackend::new(path)?)),
        MemoryBackendConfig::Filesystem { root } => {
            Ok(Arc::new(FilesystemMemoryBackend::new(root)?))
        }
        MemoryBackendConfig::InMemory => Ok(Arc::new(InMemoryMemoryBackend::new())),
    }
}

pub fn create_default_memory_backend() -> Result<Arc<dyn MemoryBackend>, MemoryError> {
    create_memory_backend(MemoryBackendConfig::default())
}

#[derive(Debug, Default)]
pub struct InMemoryMemoryBackend {
    transcripts: Mutex<HashMap<SessionId, Transcript>>,
}

impl InMemoryMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn transcripts(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<SessionId, Transcript>>, MemoryError> {
        self.transcripts
            .lock()
            .map_err(|_| MemoryError::storage("memory backend lock poisoned"))
    }
}

impl MemoryBackend for InMemoryMemoryBackend {
    fn load_transcript<'a>(
        &'a self,
        session_id: &'a SessionId,
    ) -> BoxFuture<'a, Result<Option<Transcript>, MemoryError>> {
        Box::pin(async move { Ok(self.transcripts()?.get(session_id).cloned()) })
    }

    fn append_message<'a>(
        &'a self,
        session_id: &'a SessionId,
        user_id: &'a UserId,
        message: TranscriptMessage,
    ) -> BoxFuture<'a, Result<(), MemoryError>> {
        Box::pin(async move {
            let mut transcripts = self.transcripts()?;
            let transcript = transcripts
                .entry(session_id.clone())
                .or_insert_with(|| Transcript {
                    created_at: message.timestamp,
                    last_updated: message.timestamp,
                    ..Transcript::new(session_id.clone(), user_id.clone())
                });
            transcript.last_updated = message.timestamp.max(transcript.last_updated);
            transcript.messages.push(message);
            Ok(())
        })
    }

    fn save_context<'a>(
        &'a self,
        session_id: &'a SessionId,
        user_id: &'a UserId,
        context: ConversationState,
    ) -> BoxFuture<'a, Result<(), MemoryError>> {
        Box::pin(async move {
            let mut transcripts = self.transcripts()?;
            transcripts
                .entry(session_id.clone())
                .or_insert_with(|| Transcript::new(session_id.clone(), user_id.clone()))
                .set_context(context);
            Ok(())
        })
    }

    fn find_latest_for_user<'a>(
        &'a self,
        user_id: &'a UserId,
    ) -> BoxFuture<'a, Result<Option<Transcript>, MemoryError>> {
        Box::pin(async move {
            let transcripts = self.transcripts()?;
            Ok(transcripts
                .values()
                .filter(|transcript| &transcript.user_id == user_id)
                .max_by_key(|transcript| transcript.last_updated)
                .cloned())
        })
    }

    fn purge_older_than<'a>(
        &'a self,
        cutoff: SystemTime,
    ) -> BoxFuture<'a, Result<usize, MemoryError>> {
        Box::pin(async move {
            let mut transcripts = self.transcripts()?;
            let before = transcripts.len();
            transcripts.retain(|_, transcript| transcript.last_updated >= cutoff);
            Ok(before - transcripts.len())
        })
    }
}
