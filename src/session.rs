//! Per-user tutoring sessions
//!
//! A session is created for one user, accumulates an append-only list of
//! turns and a free-form context map, and is eventually deleted. Storage is
//! behind [`SessionStore`]; lifecycle rules live in [`SessionManager`].

mod manager;
mod memory;
mod sqlite;
mod store;
mod types;

pub use manager::{MissingSessionPolicy, SessionManager, ANONYMOUS_USER};
pub use memory::InMemorySessionStore;
pub use sqlite::SqliteSessionStore;
pub use store::SessionStore;
pub use types::{Role, Session, Turn};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Session not found: {0}")]
    NotFound(String),
    #[error("Session {session_id} does not belong to user {user_id}")]
    OwnershipMismatch { session_id: String, user_id: String },
    #[error("Invalid user id: {0}")]
    InvalidUser(String),
    #[error("Session id already exists: {0}")]
    IdCollision(String),
    #[error("Session storage error: {0}")]
    Storage(String),
}

impl From<rusqlite::Error> for SessionError {
    fn from(e: rusqlite::Error) -> Self {
        SessionError::Storage(e.to_string())
    }
}

pub type SessionResult<T> = Result<T, SessionError>;
