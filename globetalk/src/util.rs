//! Small convenience helpers for sessions and turns.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::{ChatTurnRequest, MemoryBackendConfig, SessionId, UserId};

/// Storage backend named by `GLOBETALK_MEMORY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryKind {
    Sqlite,
    Filesystem,
    InMemory,
}

impl MemoryKind {
    pub fn default_config(self) -> MemoryBackendConfig {
        match self {
            Self::Sqlite => MemoryBackendConfig::sqlite_default(),
            Self::Filesystem => MemoryBackendConfig::filesystem_default(),
            Self::InMemory => MemoryBackendConfig::InMemory,
        }
    }
}

pub fn parse_memory_kind(value: &str) -> Option<MemoryKind> {
    match value.trim().to_ascii_lowercase().as_str() {
        "sqlite" | "sqlite3" => Some(MemoryKind::Sqlite),
        "filesystem" | "fs" | "file" => Some(MemoryKind::Filesystem),
        "memory" | "in-memory" | "in_memory" => Some(MemoryKind::InMemory),
        _ => None,
    }
}

static SESSION_COUNTER: AtomicU64 = AtomicU64::new(0);

/// A fresh session id such as `cli-4242-1700000000123456789-0`.
pub fn new_session_id(prefix: &str) -> SessionId {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos())
        .unwrap_or_default();
    let sequence = SESSION_COUNTER.fetch_add(1, Ordering::Relaxed);
    SessionId::new(format!("{prefix}-{}-{nanos}-{sequence}", std::process::id()))
}

pub fn turn(session_id: impl Into<SessionId>, user_input: impl Into<String>) -> ChatTurnRequest {
    ChatTurnRequest::new(session_id, user_input)
}

pub fn user_turn(
    session_id: impl Into<SessionId>,
    user_id: impl Into<UserId>,
    user_input: impl Into<String>,
) -> ChatTurnRequest {
    ChatTurnRequest::new(session_id, user_input).with_user(user_id)
}
