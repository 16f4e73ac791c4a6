//! API request and response types

use crate::session::{Session, Turn};
use crate::tools::ToolDefinition;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Request to answer a question
#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub query: String,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Request to open a session
#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub user_id: String,
}

/// Response for a newly opened session
#[derive(Debug, Serialize)]
pub struct CreateSessionResponse {
    pub session_id: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub message: &'static str,
}

/// Optional owner check on session routes
#[derive(Debug, Deserialize)]
pub struct OwnerQuery {
    #[serde(default)]
    pub user_id: Option<String>,
}

/// A session with its full history
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session_id: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub conversation_history: Vec<Turn>,
    pub context: BTreeMap<String, Value>,
}

impl From<Session> for SessionResponse {
    fn from(session: Session) -> Self {
        Self {
            last_activity: session.last_activity(),
            session_id: session.id,
            user_id: session.user_id,
            created_at: session.created_at,
            conversation_history: session.turns,
            context: session.context,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// The routing agent
#[derive(Debug, Serialize)]
pub struct TutorInfo {
    pub id: &'static str,
    pub name: &'static str,
    #[serde(rename = "type")]
    pub kind: &'static str,
}

/// One subject specialist and the tools it carries
#[derive(Debug, Serialize)]
pub struct SpecialistInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub capabilities: &'static [&'static str],
    pub tools: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct AgentsResponse {
    pub tutor: TutorInfo,
    pub specialists: BTreeMap<&'static str, SpecialistInfo>,
}

#[derive(Debug, Serialize)]
pub struct ToolsResponse {
    pub tools: Vec<ToolDefinition>,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
