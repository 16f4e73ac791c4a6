//! Storage seam for sessions

use super::{Role, Session, SessionResult, Turn};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Durable or in-process session storage.
///
/// Implementations serialize appends per session and stamp turns with
/// strictly increasing timestamps. Operations on a missing id report it
/// through their return value rather than an error, so callers decide
/// whether absence matters.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Store a new session. Fails with `IdCollision` if the id is taken.
    async fn insert(&self, session: Session) -> SessionResult<()>;

    /// Snapshot of a session
    async fn get(&self, id: &str) -> SessionResult<Option<Session>>;

    /// Append a turn; `None` if the session doesn't exist
    async fn append_turn(&self, id: &str, role: Role, message: &str) -> SessionResult<Option<Turn>>;

    /// Set one context entry; `false` if the session doesn't exist
    async fn set_context(&self, id: &str, key: &str, value: Value) -> SessionResult<bool>;

    /// Remove a session and its turns; `false` if it didn't exist
    async fn delete(&self, id: &str) -> SessionResult<bool>;
}

// ============================================================================
// Arc implementation for trait objects
// ============================================================================

#[async_trait]
impl<T: SessionStore + ?Sized> SessionStore for Arc<T> {
    async fn insert(&self, session: Session) -> SessionResult<()> {
        (**self).insert(session).await
    }

    async fn get(&self, id: &str) -> SessionResult<Option<Session>> {
        (**self).get(id).await
    }

    async fn append_turn(&self, id: &str, role: Role, message: &str) -> SessionResult<Option<Turn>> {
        (**self).append_turn(id, role, message).await
    }

    async fn set_context(&self, id: &str, key: &str, value: Value) -> SessionResult<bool> {
        (**self).set_context(id, key, value).await
    }

    async fn delete(&self, id: &str) -> SessionResult<bool> {
        (**self).delete(id).await
    }
}
