//! SQLite-backed session store

use super::types::next_timestamp;
use super::{Role, Session, SessionError, SessionResult, SessionStore, Turn};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS sessions (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    created_at TEXT NOT NULL,
    context TEXT NOT NULL DEFAULT '{}'
);

CREATE INDEX IF NOT EXISTS idx_sessions_user ON sessions(user_id);

CREATE TABLE IF NOT EXISTS turns (
    session_id TEXT NOT NULL,
    sequence_id INTEGER NOT NULL,
    role TEXT NOT NULL,
    message TEXT NOT NULL,
    created_at TEXT NOT NULL,

    PRIMARY KEY (session_id, sequence_id),
    FOREIGN KEY (session_id) REFERENCES sessions(id) ON DELETE CASCADE
);
";

/// Thread-safe store handle. One connection, serialized by a mutex, so a
/// turn's sequence number and timestamp are computed atomically.
#[derive(Clone)]
pub struct SqliteSessionStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteSessionStore {
    /// Open or create a database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> SessionResult<Self> {
        Self::init(Connection::open(path)?)
    }

    /// Open an in-memory database
    pub fn open_in_memory() -> SessionResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> SessionResult<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> SessionResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| SessionError::Storage("database lock poisoned".to_string()))
    }
}

fn format_datetime(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_datetime(s: &str) -> SessionResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| SessionError::Storage(format!("bad timestamp '{s}': {e}")))
}

fn session_exists(conn: &Connection, id: &str) -> SessionResult<bool> {
    Ok(conn
        .query_row("SELECT 1 FROM sessions WHERE id = ?1", params![id], |_| Ok(()))
        .optional()?
        .is_some())
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    async fn insert(&self, session: Session) -> SessionResult<()> {
        let conn = self.lock()?;
        if session_exists(&conn, &session.id)? {
            return Err(SessionError::IdCollision(session.id));
        }
        let context = serde_json::to_string(&session.context)
            .map_err(|e| SessionError::Storage(e.to_string()))?;
        conn.execute(
            "INSERT INTO sessions (id, user_id, created_at, context) VALUES (?1, ?2, ?3, ?4)",
            params![session.id, session.user_id, format_datetime(session.created_at), context],
        )?;
        for (seq, turn) in session.turns.iter().enumerate() {
            conn.execute(
                "INSERT INTO turns (session_id, sequence_id, role, message, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    session.id,
                    i64::try_from(seq).unwrap_or(i64::MAX),
                    turn.role.as_str(),
                    turn.message,
                    format_datetime(turn.timestamp)
                ],
            )?;
        }
        Ok(())
    }

    async fn get(&self, id: &str) -> SessionResult<Option<Session>> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                "SELECT id, user_id, created_at, context FROM sessions WHERE id = ?1",
                params![id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()?;
        let Some((id, user_id, created_at, context)) = row else {
            return Ok(None);
        };

        let mut stmt = conn.prepare(
            "SELECT role, message, created_at FROM turns
             WHERE session_id = ?1 ORDER BY sequence_id",
        )?;
        let rows = stmt
            .query_map(params![id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut turns = Vec::with_capacity(rows.len());
        for (role, message, timestamp) in rows {
            turns.push(Turn {
                role: role.parse().map_err(SessionError::Storage)?,
                message,
                timestamp: parse_datetime(&timestamp)?,
            });
        }

        Ok(Some(Session {
            created_at: parse_datetime(&created_at)?,
            context: serde_json::from_str(&context)
                .map_err(|e| SessionError::Storage(e.to_string()))?,
            id,
            user_id,
            turns,
        }))
    }

    async fn append_turn(&self, id: &str, role: Role, message: &str) -> SessionResult<Option<Turn>> {
        let conn = self.lock()?;
        if !session_exists(&conn, id)? {
            return Ok(None);
        }

        let last = conn
            .query_row(
                "SELECT sequence_id, created_at FROM turns
                 WHERE session_id = ?1 ORDER BY sequence_id DESC LIMIT 1",
                params![id],
                |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?;
        let (next_seq, last_timestamp) = match last {
            Some((seq, ts)) => (seq + 1, Some(parse_datetime(&ts)?)),
            None => (0, None),
        };

        let turn = Turn {
            role,
            message: message.to_string(),
            timestamp: next_timestamp(last_timestamp, Utc::now()),
        };
        conn.execute(
            "INSERT INTO turns (session_id, sequence_id, role, message, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![id, next_seq, role.as_str(), message, format_datetime(turn.timestamp)],
        )?;
        Ok(Some(turn))
    }

    async fn set_context(&self, id: &str, key: &str, value: Value) -> SessionResult<bool> {
        let conn = self.lock()?;
        let stored = conn
            .query_row(
                "SELECT context FROM sessions WHERE id = ?1",
                params![id],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        let Some(stored) = stored else {
            return Ok(false);
        };

        let mut context: BTreeMap<String, Value> =
            serde_json::from_str(&stored).map_err(|e| SessionError::Storage(e.to_string()))?;
        context.insert(key.to_string(), value);
        let context = serde_json::to_string(&context).map_err(|e| SessionError::Storage(e.to_string()))?;

        conn.execute(
            "UPDATE sessions SET context = ?2 WHERE id = ?1",
            params![id, context],
        )?;
        Ok(true)
    }

    async fn delete(&self, id: &str) -> SessionResult<bool> {
        let conn = self.lock()?;
        let deleted = conn.execute("DELETE FROM sessions WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }
}
