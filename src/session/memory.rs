//! In-process session store

use super::{Role, Session, SessionError, SessionResult, SessionStore, Turn};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

/// The map lock guards membership; each session's mutex guards its turns
/// and context, so appends to different sessions never contend.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, Arc<Mutex<Session>>>>,
}

fn poisoned<T>(_: PoisonError<T>) -> SessionError {
    SessionError::Storage("session lock poisoned".to_string())
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> SessionResult<usize> {
        Ok(self.sessions.read().map_err(poisoned)?.len())
    }

    pub fn is_empty(&self) -> SessionResult<bool> {
        Ok(self.len()? == 0)
    }

    fn entry(&self, id: &str) -> SessionResult<Option<Arc<Mutex<Session>>>> {
        Ok(self.sessions.read().map_err(poisoned)?.get(id).cloned())
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn insert(&self, session: Session) -> SessionResult<()> {
        let mut sessions = self.sessions.write().map_err(poisoned)?;
        if sessions.contains_key(&session.id) {
            return Err(SessionError::IdCollision(session.id));
        }
        sessions.insert(session.id.clone(), Arc::new(Mutex::new(session)));
        Ok(())
    }

    async fn get(&self, id: &str) -> SessionResult<Option<Session>> {
        match self.entry(id)? {
            Some(entry) => Ok(Some(entry.lock().map_err(poisoned)?.clone())),
            None => Ok(None),
        }
    }

    async fn append_turn(&self, id: &str, role: Role, message: &str) -> SessionResult<Option<Turn>> {
        let Some(entry) = self.entry(id)? else {
            return Ok(None);
        };
        let mut session = entry.lock().map_err(poisoned)?;
        Ok(Some(session.push_turn(role, message, Utc::now()).clone()))
    }

    async fn set_context(&self, id: &str, key: &str, value: Value) -> SessionResult<bool> {
        let Some(entry) = self.entry(id)? else {
            return Ok(false);
        };
        entry
            .lock()
            .map_err(poisoned)?
            .context
            .insert(key.to_string(), value);
        Ok(true)
    }

    async fn delete(&self, id: &str) -> SessionResult<bool> {
        Ok(self.sessions.write().map_err(poisoned)?.remove(id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn session(id: &str, user: &str) -> Session {
        Session::new(id, user, Utc::now())
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let store = InMemorySessionStore::new();
        store.insert(session("s1", "alice")).await.unwrap();

        let got = store.get("s1").await.unwrap().unwrap();
        assert_eq!(got.user_id, "alice");
        assert!(store.get("missing").await.unwrap().is_none());
        assert_eq!(store.len().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_insert_collision() {
        let store = InMemorySessionStore::new();
        store.insert(session("s1", "alice")).await.unwrap();
        let err = store.insert(session("s1", "bob")).await.unwrap_err();
        assert!(matches!(err, SessionError::IdCollision(id) if id == "s1"));

        // The original owner is untouched
        assert_eq!(store.get("s1").await.unwrap().unwrap().user_id, "alice");
    }

    #[tokio::test]
    async fn test_append_and_context() {
        let store = InMemorySessionStore::new();
        store.insert(session("s1", "alice")).await.unwrap();

        store.append_turn("s1", Role::User, "hi").await.unwrap().unwrap();
        store.append_turn("s1", Role::Assistant, "hello").await.unwrap().unwrap();
        assert!(store.set_context("s1", "domain", json!("math")).await.unwrap());

        let got = store.get("s1").await.unwrap().unwrap();
        assert_eq!(got.turns.len(), 2);
        assert_eq!(got.turns[1].role, Role::Assistant);
        assert!(got.turns[0].timestamp < got.turns[1].timestamp);
        assert_eq!(got.context["domain"], json!("math"));
    }

    #[tokio::test]
    async fn test_missing_session_operations() {
        let store = InMemorySessionStore::new();
        assert!(store.append_turn("nope", Role::User, "x").await.unwrap().is_none());
        assert!(!store.set_context("nope", "k", json!(1)).await.unwrap());
        assert!(!store.delete("nope").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete() {
        let store = InMemorySessionStore::new();
        store.insert(session("s1", "alice")).await.unwrap();
        assert!(store.delete("s1").await.unwrap());
        assert!(store.get("s1").await.unwrap().is_none());
        assert!(store.is_empty().unwrap());
    }

    #[tokio::test]
    async fn test_concurrent_appends_are_not_lost() {
        let store = Arc::new(InMemorySessionStore::new());
        store.insert(session("s1", "alice")).await.unwrap();

        let mut handles = Vec::new();
        for i in 0..32 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store
                    .append_turn("s1", Role::User, &format!("msg {i}"))
                    .await
                    .unwrap()
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let got = store.get("s1").await.unwrap().unwrap();
        assert_eq!(got.turns.len(), 32);
        assert!(got.turns.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
    }
}
