use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::SystemTime;

use gchat::{ConversationState, Transcript, TranscriptMessage};
use gcommon::{BoxFuture, SessionId, UserId};
use serde::{Deserialize, Serialize};

use super::{decode_system_time, encode_system_time, role_from_str};
use crate::backend::MemoryBackend;
use crate::error::MemoryError;

/// One pretty-printed JSON document per session under `<root>/sessions`.
#[derive(Debug)]
pub struct FilesystemMemoryBackend {
    root: PathBuf,
    lock: Mutex<()>,
}

impl FilesystemMemoryBackend {
    pub fn new(root: impl AsRef<Path>) -> Result<Self, MemoryError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(root.join("sessions")).map_err(|error| {
            MemoryError::storage(format!("failed to create filesystem backend root: {error}"))
        })?;
        Ok(Self {
            root,
            lock: Mutex::new(()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn guard(&self) -> Result<MutexGuard<'_, ()>, MemoryError> {
        self.lock
            .lock()
            .map_err(|_| MemoryError::storage("filesystem backend lock poisoned"))
    }

    fn sessions_dir(&self) -> PathBuf {
        self.root.join("sessions")
    }

    fn session_path(&self, session_id: &SessionId) -> PathBuf {
        self.sessions_dir().join(format!(
            "{}.json",
            hex_encode(session_id.as_str().as_bytes())
        ))
    }

    fn read_file(path: &Path) -> Result<PersistedTranscript, MemoryError> {
        let bytes = fs::read(path).map_err(|error| {
            MemoryError::storage(format!("failed to read transcript file: {error}"))
        })?;
        serde_json::from_slice::<PersistedTranscript>(&bytes).map_err(|error| {
            MemoryError::storage(format!("failed to deserialize transcript: {error}"))
        })
    }

    fn load_state(&self, session_id: &SessionId) -> Result<Option<PersistedTranscript>, MemoryError> {
        let path = self.session_path(session_id);
        if !path.exists() {
            return Ok(None);
        }
        Self::read_file(&path).map(Some)
    }

    fn save_state(
        &self,
        session_id: &SessionId,
        state: &PersistedTranscript,
    ) -> Result<(), MemoryError> {
        let path = self.session_path(session_id);
        let bytes = serde_json::to_vec_pretty(state).map_err(|error| {
            MemoryError::storage(format!("failed to serialize transcript: {error}"))
        })?;

        write_atomic(&path, &bytes)
    }

    /// Loads the session, or starts a transcript dated `at`.
    fn load_or_new(
        &self,
        session_id: &SessionId,
        user_id: &UserId,
        at: SystemTime,
    ) -> Result<PersistedTranscript, MemoryError> {
        match self.load_state(session_id)? {
            Some(state) => Ok(state),
            None => PersistedTranscript::from_transcript(Transcript {
                created_at: at,
                last_updated: at,
                ..Transcript::new(session_id.clone(), user_id.clone())
            }),
        }
    }

    /// Every stored transcript file with its parsed contents.
    fn scan(&self) -> Result<Vec<(PathBuf, PersistedTranscript)>, MemoryError> {
        let entries = fs::read_dir(self.sessions_dir()).map_err(|error| {
            MemoryError::storage(format!("failed to list transcript files: {error}"))
        })?;

        let mut transcripts = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|error| {
                    MemoryError::storage(format!("failed to read transcript entry: {error}"))
                })?
                .path();
            if path.extension().and_then(|extension| extension.to_str()) != Some("json") {
                continue;
            }
            let state = Self::read_file(&path)?;
            transcripts.push((path, state));
        }
        Ok(transcripts)
    }
}

impl MemoryBackend for FilesystemMemoryBackend {
    fn load_transcript<'a>(
        &'a self,
        session_id: &'a SessionId,
    ) -> BoxFuture<'a, Result<Option<Transcript>, MemoryError>> {
        Box::pin(async move {
            let _guard = self.guard()?;
            self.load_state(session_id)?
                .map(PersistedTranscript::into_transcript)
                .transpose()
        })
    }

    fn append_message<'a>(
        &'a self,
        session_id: &'a SessionId,
        user_id: &'a UserId,
        message: TranscriptMessage,
    ) -> BoxFuture<'a, Result<(), MemoryError>> {
        Box::pin(async move {
            let _guard = self.guard()?;
            let mut state = self.load_or_new(session_id, user_id, message.timestamp)?;
            let persisted = PersistedMessage::from_message(message)?;
            state.touch(persisted.timestamp_secs, persisted.timestamp_nanos);
            state.messages.push(persisted);
            self.save_state(session_id, &state)
        })
    }

    fn save_context<'a>(
        &'a self,
        session_id: &'a SessionId,
        user_id: &'a UserId,
        context: ConversationState,
    ) -> BoxFuture<'a, Result<(), MemoryError>> {
        Box::pin(async move {
            let _guard = self.guard()?;
            let now = SystemTime::now();
            let mut state = self.load_or_new(session_id, user_id, now)?;
            let (secs, nanos) = encode_system_time(now)?;
            state.context = Some(context);
            state.touch(secs, nanos);
            self.save_state(session_id, &state)
        })
    }

    fn find_latest_for_user<'a>(
        &'a self,
        user_id: &'a UserId,
    ) -> BoxFuture<'a, Result<Option<Transcript>, MemoryError>> {
        Box::pin(async move {
            let _guard = self.guard()?;
            self.scan()?
                .into_iter()
                .map(|(_, state)| state)
                .filter(|state| &state.user_id == user_id)
                .max_by_key(|state| (state.last_updated_secs, state.last_updated_nanos))
                .map(PersistedTranscript::into_transcript)
                .transpose()
        })
    }

    fn purge_older_than<'a>(
        &'a self,
        cutoff: SystemTime,
    ) -> BoxFuture<'a, Result<usize, MemoryError>> {
        Box::pin(async move {
            let _guard = self.guard()?;
            let cutoff = encode_system_time(cutoff)?;
            let mut removed = 0;
            for (path, state) in self.scan()? {
                if (state.last_updated_secs, state.last_updated_nanos) < cutoff {
                    fs::remove_file(&path).map_err(|error| {
                        MemoryError::storage(format!("failed to remove transcript file: {error}"))
                    })?;
                    removed += 1;
                }
            }
            tracing::debug!(removed, root = %self.root.display(), "purged filesystem transcripts");
            Ok(removed)
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersistedTranscript {
    session_id: SessionId,
    user_id: UserId,
    messages: Vec<PersistedMessage>,
    #[serde(default)]
    context: Option<ConversationState>,
    created_at_secs: i64,
    created_at_nanos: i64,
    last_updated_secs: i64,
    last_updated_nanos: i64,
}

impl PersistedTranscript {
    fn from_transcript(transcript: Transcript) -> Result<Self, MemoryError> {
        let (created_at_secs, created_at_nanos) = encode_system_time(transcript.created_at)?;
        let (last_updated_secs, last_updated_nanos) = encode_system_time(transcript.last_updated)?;
        Ok(Self {
            session_id: transcript.session_id,
            user_id: transcript.user_id,
            messages: transcript
                .messages
                .into_iter()
                .map(PersistedMessage::from_message)
                .collect::<Result<_, _>>()?,
            context: transcript.context,
            created_at_secs,
            created_at_nanos,
            last_updated_secs,
            last_updated_nanos,
        })
    }

    fn into_transcript(self) -> Result<Transcript, MemoryError> {
        Ok(Transcript {
            session_id: self.session_id,
            user_id: self.user_id,
            messages: self
                .messages
                .into_iter()
                .map(PersistedMessage::into_message)
                .collect::<Result<_, _>>()?,
            context: self.context,
            created_at: decode_system_time(self.created_at_secs, self.created_at_nanos)?,
            last_updated: decode_system_time(self.last_updated_secs, self.last_updated_nanos)?,
        })
    }

    fn touch(&mut self, secs: i64, nanos: i64) {
        if (secs, nanos) > (self.last_updated_secs, self.last_updated_nanos) {
            self.last_updated_secs = secs;
            self.last_updated_nanos = nanos;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersistedMessage {
    role: String,
    content: String,
    timestamp_secs: i64,
    timestamp_nanos: i64,
}

impl PersistedMessage {
    fn from_message(message: TranscriptMessage) -> Result<Self, MemoryError> {
        let (timestamp_secs, timestamp_nanos) = encode_system_time(message.timestamp)?;
        Ok(Self {
            role: message.role.as_str().to_string(),
            content: message.content,
            timestamp_secs,
            timestamp_nanos,
        })
    }

    fn into_message(self) -> Result<TranscriptMessage, MemoryError> {
        Ok(TranscriptMessage {
            role: role_from_str(&self.role)?,
            content: self.content,
            timestamp: decode_system_time(self.timestamp_secs, self.timestamp_nanos)?,
        })
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), MemoryError> {
    let Some(parent) = path.parent() else {
        return Err(MemoryError::storage(
            "transcript file missing parent directory",
        ));
    };
    fs::create_dir_all(parent).map_err(|error| {
        MemoryError::storage(format!("failed to create parent directory: {error}"))
    })?;

    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, bytes).map_err(|error| {
        MemoryError::storage(format!("failed to write temporary transcript file: {error}"))
    })?;

    fs::rename(&tmp, path).map_err(|error| {
        MemoryError::storage(format!("failed to finalize transcript file: {error}"))
    })
}

fn hex_encode(input: &[u8]) -> String {
    let mut output = String::with_capacity(input.len() * 2);
    for byte in input {
        output.push(nibble_to_hex(byte >> 4));
        output.push(nibble_to_hex(byte & 0x0f));
    }
    output
}

fn nibble_to_hex(nibble: u8) -> char {
    match nibble {
        0..=9 => (b'0' + nibble) as char,
        10..=15 => (b'a' + (nibble - 10)) as char,
        _ => '0',
    }
}

pub(crate) fn default_filesystem_root() -> PathBuf {
    if let Some(explicit) = std::env::var_os("GLOBETALK_FS_ROOT") {
        return PathBuf::from(explicit);
    }

    if let Some(home) = std::env::var_os("HOME").or_else(|| std::env::var_os("USERPROFILE")) {
        return PathBuf::from(home).join(".globetalk").join("transcripts");
    }

    PathBuf::from("globetalk-transcripts")
}
