//! Session lifecycle and ownership rules

use super::{Role, Session, SessionError, SessionResult, SessionStore, Turn};
use chrono::Utc;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

/// User id for requests that don't name one
pub const ANONYMOUS_USER: &str = "anonymous_user";

const MAX_USER_ID_CHARS: usize = 128;
const MAX_ID_ATTEMPTS: usize = 3;

/// What to do when a turn is appended to a session that doesn't exist
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MissingSessionPolicy {
    /// Log a warning and drop the turn
    #[default]
    Ignore,
    /// Fail with `NotFound`
    Reject,
}

impl FromStr for MissingSessionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ignore" => Ok(Self::Ignore),
            "reject" => Ok(Self::Reject),
            other => Err(format!("expected 'ignore' or 'reject', got '{other}'")),
        }
    }
}

impl fmt::Display for MissingSessionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Ignore => "ignore",
            Self::Reject => "reject",
        })
    }
}

/// Owns every session through an injected store
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    policy: MissingSessionPolicy,
}

impl SessionManager {
    pub fn new(store: Arc<dyn SessionStore>, policy: MissingSessionPolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> MissingSessionPolicy {
        self.policy
    }

    /// Create an empty session for `user_id`
    pub async fn create_session(&self, user_id: &str) -> SessionResult<Session> {
        let user_id = validate_user_id(user_id)?;
        let mut last_id = String::new();

        for attempt in 1..=MAX_ID_ATTEMPTS {
            let id = format!("session_{}", Uuid::new_v4().simple());
            let session = Session::new(&id, user_id, Utc::now());
            match self.store.insert(session.clone()).await {
                Ok(()) => {
                    tracing::info!(session_id = %id, user_id = %user_id, "Session created");
                    return Ok(session);
                }
                Err(SessionError::IdCollision(_)) => {
                    tracing::warn!(session_id = %id, attempt, "Session id collision, retrying");
                    last_id = id;
                }
                Err(e) => return Err(e),
            }
        }

        Err(SessionError::IdCollision(last_id))
    }

    pub async fn get_session(&self, id: &str) -> SessionResult<Session> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| SessionError::NotFound(id.to_string()))
    }

    /// Like [`get_session`](Self::get_session), but also checks the owner
    pub async fn get_owned_session(&self, id: &str, user_id: &str) -> SessionResult<Session> {
        // Owners are stored trimmed by create_session
        let user_id = user_id.trim();
        let session = self.get_session(id).await?;
        if session.user_id != user_id {
            tracing::warn!(session_id = %id, user_id = %user_id, "Session ownership mismatch");
            return Err(SessionError::OwnershipMismatch {
                session_id: id.to_string(),
                user_id: user_id.to_string(),
            });
        }
        Ok(session)
    }

    /// Append a turn. A missing session follows the configured policy:
    /// `Ignore` returns `Ok(None)`, `Reject` returns `NotFound`.
    pub async fn append_turn(&self, id: &str, role: Role, message: &str) -> SessionResult<Option<Turn>> {
        match self.store.append_turn(id, role, message).await? {
            Some(turn) => Ok(Some(turn)),
            None => match self.policy {
                MissingSessionPolicy::Ignore => {
                    tracing::warn!(session_id = %id, role = %role, "Dropping turn for missing session");
                    Ok(None)
                }
                MissingSessionPolicy::Reject => Err(SessionError::NotFound(id.to_string())),
            },
        }
    }

    pub async fn set_context(&self, id: &str, key: &str, value: Value) -> SessionResult<()> {
        if self.store.set_context(id, key, value).await? {
            Ok(())
        } else {
            Err(SessionError::NotFound(id.to_string()))
        }
    }

    pub async fn delete_session(&self, id: &str) -> SessionResult<()> {
        if self.store.delete(id).await? {
            tracing::info!(session_id = %id, "Session deleted");
            Ok(())
        } else {
            Err(SessionError::NotFound(id.to_string()))
        }
    }

    pub async fn delete_owned_session(&self, id: &str, user_id: &str) -> SessionResult<()> {
        self.get_owned_session(id, user_id).await?;
        self.delete_session(id).await
    }

    /// Pick the session a query belongs to.
    ///
    /// No id creates a session; an unknown id is replaced by a fresh one;
    /// a session owned by someone else is an `OwnershipMismatch`.
    pub async fn resolve_for_query(&self, session_id: Option<&str>, user_id: &str) -> SessionResult<Session> {
        let Some(id) = session_id.map(str::trim).filter(|id| !id.is_empty()) else {
            return self.create_session(user_id).await;
        };

        match self.get_owned_session(id, user_id).await {
            Err(SessionError::NotFound(_)) => {
                tracing::info!(session_id = %id, user_id = %user_id, "Unknown session, creating a replacement");
                self.create_session(user_id).await
            }
            other => other,
        }
    }
}

fn validate_user_id(user_id: &str) -> SessionResult<&str> {
    let trimmed = user_id.trim();
    if trimmed.is_empty() {
        return Err(SessionError::InvalidUser("user id is empty".to_string()));
    }
    if trimmed.chars().count() > MAX_USER_ID_CHARS {
        return Err(SessionError::InvalidUser(format!(
            "user id is longer than {MAX_USER_ID_CHARS} characters"
        )));
    }
    if trimmed.chars().any(char::is_control) {
        return Err(SessionError::InvalidUser(
            "user id contains control characters".to_string(),
        ));
    }
    Ok(trimmed)
}
