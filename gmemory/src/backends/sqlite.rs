use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, SystemTime};

use gchat::{ConversationState, Transcript, TranscriptMessage};
use gcommon::{BoxFuture, SessionId, UserId};
use rusqlite::{Connection, OptionalExtension, Transaction, params};

use super::{decode_system_time, encode_system_time, role_from_str};
use crate::backend::MemoryBackend;
use crate::error::MemoryError;

#[derive(Debug)]
pub struct SqliteMemoryBackend {
    connection: Mutex<Connection>,
}

impl SqliteMemoryBackend {
    pub fn new(path: impl AsRef<Path>) -> Result<Self, MemoryError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|error| {
                MemoryError::storage(format!(
                    "failed to create sqlite parent directory: {error}"
                ))
            })?;
        }

        let connection = Connection::open(path).map_err(|error| {
            MemoryError::storage(format!("failed to open sqlite database: {error}"))
        })?;
        Self::from_connection(connection)
    }

    pub fn new_in_memory() -> Result<Self, MemoryError> {
        let connection = Connection::open_in_memory().map_err(|error| {
            MemoryError::storage(format!("failed to open in-memory sqlite database: {error}"))
        })?;
        Self::from_connection(connection)
    }

    fn from_connection(connection: Connection) -> Result<Self, MemoryError> {
        connection
            .busy_timeout(Duration::from_secs(5))
            .map_err(|error| {
                MemoryError::storage(format!("failed to configure sqlite busy timeout: {error}"))
            })?;
        let backend = Self {
            connection: Mutex::new(connection),
        };
        backend.initialize_schema()?;
        Ok(backend)
    }

    fn connection(&self) -> Result<MutexGuard<'_, Connection>, MemoryError> {
        self.connection
            .lock()
            .map_err(|_| MemoryError::storage("sqlite backend lock poisoned"))
    }

    fn initialize_schema(&self) -> Result<(), MemoryError> {
        let conn = self.connection()?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;

            CREATE TABLE IF NOT EXISTS transcripts (
                session_id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                context_json TEXT,
                created_at_secs INTEGER NOT NULL,
                created_at_nanos INTEGER NOT NULL,
                last_updated_secs INTEGER NOT NULL,
                last_updated_nanos INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_transcripts_user_updated
            ON transcripts(user_id, last_updated_secs, last_updated_nanos);

            CREATE TABLE IF NOT EXISTS transcript_messages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id TEXT NOT NULL,
                role TEXT NOT NULL,
                content TEXT NOT NULL,
                created_at_secs INTEGER NOT NULL,
                created_at_nanos INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_transcript_messages_session_id
            ON transcript_messages(session_id, id);
            ",
        )
        .map_err(|error| {
            MemoryError::storage(format!("failed to initialize sqlite schema: {error}"))
        })?;

        Ok(())
    }

    /// Creates the transcript row if missing, otherwise moves `last_updated`
    /// forward to `at`.
    fn upsert_transcript(
        tx: &Transaction<'_>,
        session_id: &SessionId,
        user_id: &UserId,
        at: (i64, i64),
    ) -> Result<(), MemoryError> {
        tx.execute(
            "
            INSERT INTO transcripts (
                session_id,
                user_id,
                context_json,
                created_at_secs,
                created_at_nanos,
                last_updated_secs,
                last_updated_nanos
            )
            VALUES (?1, ?2, NULL, ?3, ?4, ?3, ?4)
            ON CONFLICT(session_id) DO UPDATE SET
                last_updated_secs = excluded.last_updated_secs,
                last_updated_nanos = excluded.last_updated_nanos
            WHERE (excluded.last_updated_secs, excluded.last_updated_nanos)
                > (transcripts.last_updated_secs, transcripts.last_updated_nanos)
            ",
            params![session_id.as_str(), user_id.as_str(), at.0, at.1],
        )
        .map_err(|error| MemoryError::storage(format!("failed to upsert transcript: {error}")))?;
        Ok(())
    }

    fn load_transcript_row(
        conn: &Connection,
        session_id: &str,
    ) -> Result<Option<Transcript>, MemoryError> {
        let row = conn
            .query_row(
                "
                SELECT
                    user_id,
                    context_json,
                    created_at_secs,
                    created_at_nanos,
                    last_updated_secs,
                    last_updated_nanos
                FROM transcripts
                WHERE session_id = ?1
                ",
                params![session_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, Option<String>>(1)?,
                        row.get::<_, i64>(2)?,
                        row.get::<_, i64>(3)?,
                        row.get::<_, i64>(4)?,
                        row.get::<_, i64>(5)?,
                    ))
                },
            )
            .optional()
            .map_err(|error| {
                MemoryError::storage(format!("failed to query transcript row: {error}"))
            })?;

        let Some((user_id, context_json, created_secs, created_nanos, updated_secs, updated_nanos)) =
            row
        else {
            return Ok(None);
        };

        let context = context_json
            .map(|raw| {
                serde_json::from_str::<ConversationState>(&raw).map_err(|error| {
                    MemoryError::storage(format!("failed to deserialize context: {error}"))
                })
            })
            .transpose()?;

        Ok(Some(Transcript {
            session_id: SessionId::from(session_id),
            user_id: UserId::from(user_id),
            messages: Self::load_messages(conn, session_id)?,
            context,
            created_at: decode_system_time(created_secs, created_nanos)?,
            last_updated: decode_system_time(updated_secs, updated_nanos)?,
        }))
    }

    fn load_messages(
        conn: &Connection,
        session_id: &str,
    ) -> Result<Vec<TranscriptMessage>, MemoryError> {
        let mut stmt = conn
            .prepare(
                "
                SELECT role, content, created_at_secs, created_at_nanos
                FROM transcript_messages
                WHERE session_id = ?1
                ORDER BY id ASC
                ",
            )
            .map_err(|error| {
                MemoryError::storage(format!("failed to prepare transcript query: {error}"))
            })?;
        let rows = stmt
            .query_map(params![session_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, i64>(3)?,
                ))
            })
            .map_err(|error| {
                MemoryError::storage(format!("failed to query transcript rows: {error}"))
            })?;

        let mut messages = Vec::new();
        for row in rows {
            let (role, content, secs, nanos) = row.map_err(|error| {
                MemoryError::storage(format!("failed to read transcript row: {error}"))
            })?;
            messages.push(TranscriptMessage {
                role: role_from_str(&role)?,
                content,
                timestamp: decode_system_time(secs, nanos)?,
            });
        }
        Ok(messages)
    }
}

impl MemoryBackend for SqliteMemoryBackend {
    fn load_transcript<'a>(
        &'a self,
        session_id: &'a SessionId,
    ) -> BoxFuture<'a, Result<Option<Transcript>, MemoryError>> {
        Box::pin(async move {
            let conn = self.connection()?;
            Self::load_transcript_row(&conn, session_id.as_str())
        })
    }

    fn append_message<'a>(
        &'a self,
        session_id: &'a SessionId,
        user_id: &'a UserId,
        message: TranscriptMessage,
    ) -> BoxFuture<'a, Result<(), MemoryError>> {
        Box::pin(async move {
            let at = encode_system_time(message.timestamp)?;
            let mut conn = self.connection()?;
            let tx = conn.transaction().map_err(|error| {
                MemoryError::storage(format!("failed to begin sqlite transaction: {error}"))
            })?;

            Self::upsert_transcript(&tx, session_id, user_id, at)?;
            tx.execute(
                "
                INSERT INTO transcript_messages (
                    session_id,
                    role,
                    content,
                    created_at_secs,
                    created_at_nanos
                )
                VALUES (?1, ?2, ?3, ?4, ?5)
                ",
                params![
                    session_id.as_str(),
                    message.role.as_str(),
                    message.content,
                    at.0,
                    at.1
                ],
            )
            .map_err(|error| {
                MemoryError::storage(format!("failed to append transcript message: {error}"))
            })?;

            tx.commit().map_err(|error| {
                MemoryError::storage(format!("failed to commit transcript message: {error}"))
            })
        })
    }

    fn save_context<'a>(
        &'a self,
        session_id: &'a SessionId,
        user_id: &'a UserId,
        context: ConversationState,
    ) -> BoxFuture<'a, Result<(), MemoryError>> {
        Box::pin(async move {
            let at = encode_system_time(SystemTime::now())?;
            let context_json = serde_json::to_string(&context).map_err(|error| {
                MemoryError::storage(format!("failed to serialize context: {error}"))
            })?;
            let mut conn = self.connection()?;
            let tx = conn.transaction().map_err(|error| {
                MemoryError::storage(format!("failed to begin sqlite transaction: {error}"))
            })?;

            Self::upsert_transcript(&tx, session_id, user_id, at)?;
            tx.execute(
                "UPDATE transcripts SET context_json = ?2 WHERE session_id = ?1",
                params![session_id.as_str(), context_json],
            )
            .map_err(|error| {
                MemoryError::storage(format!("failed to save conversation context: {error}"))
            })?;

            tx.commit().map_err(|error| {
                MemoryError::storage(format!("failed to commit conversation context: {error}"))
            })
        })
    }

    fn find_latest_for_user<'a>(
        &'a self,
        user_id: &'a UserId,
    ) -> BoxFuture<'a, Result<Option<Transcript>, MemoryError>> {
        Box::pin(async move {
            let conn = self.connection()?;
            let session_id = conn
                .query_row(
                    "
                    SELECT session_id
                    FROM transcripts
                    WHERE user_id = ?1
                    ORDER BY last_updated_secs DESC, last_updated_nanos DESC
                    LIMIT 1
                    ",
                    params![user_id.as_str()],
                    |row| row.get::<_, String>(0),
                )
                .optional()
                .map_err(|error| {
                    MemoryError::storage(format!("failed to query latest transcript: {error}"))
                })?;

            match session_id {
                Some(session_id) => Self::load_transcript_row(&conn, &session_id),
                None => Ok(None),
            }
        })
    }

    fn purge_older_than<'a>(
        &'a self,
        cutoff: SystemTime,
    ) -> BoxFuture<'a, Result<usize, MemoryError>> {
        Box::pin(async move {
            let (secs, nanos) = encode_system_time(cutoff)?;
            let mut conn = self.connection()?;
            let tx = conn.transaction().map_err(|error| {
                MemoryError::storage(format!("failed to begin sqlite transaction: {error}"))
            })?;

            tx.execute(
                "
                DELETE FROM transcript_messages
                WHERE session_id IN (
                    SELECT session_id FROM transcripts
                    WHERE last_updated_secs < ?1
                       OR (last_updated_secs = ?1 AND last_updated_nanos < ?2)
                )
                ",
                params![secs, nanos],
            )
            .map_err(|error| {
                MemoryError::storage(format!("failed to purge transcript messages: {error}"))
            })?;
            let removed = tx
                .execute(
                    "
                    DELETE FROM transcripts
                    WHERE last_updated_secs < ?1
                       OR (last_updated_secs = ?1 AND last_updated_nanos < ?2)
                    ",
                    params![secs, nanos],
                )
                .map_err(|error| {
                    MemoryError::storage(format!("failed to purge transcripts: {error}"))
                })?;

            tx.commit().map_err(|error| {
                MemoryError::storage(format!("failed to commit transcript purge: {error}"))
            })?;
            tracing::debug!(removed, "purged sqlite transcripts");
            Ok(removed)
        })
    }
}

pub(crate) fn default_sqlite_path() -> PathBuf {
    if let Some(explicit) = std::env::var_os("GLOBETALK_SQLITE_PATH") {
        return PathBuf::from(explicit);
    }

    if let Some(home) = std::env::var_os("HOME").or_else(|| std::env::var_os("USERPROFILE")) {
        return PathBuf::from(home)
            .join(".globetalk")
            .join("transcripts.sqlite3");
    }

    PathBuf::from("globetalk-transcripts.sqlite3")
}
