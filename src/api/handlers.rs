//! HTTP request handlers

use super::types::{
    AgentsResponse, CreateSessionRequest, CreateSessionResponse, ErrorResponse, MessageResponse,
    OwnerQuery, QueryRequest, SessionResponse, SpecialistInfo, ToolsResponse, TutorInfo,
};
use super::AppState;
use crate::dispatch::{DispatchError, QueryOutcome, ORCHESTRATOR_ID};
use crate::session::SessionError;
use crate::tools::{Domain, ToolOutput};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::Value;

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/query", post(process_query))
        .route("/api/session/new", post(create_session))
        .route("/api/session/:id", get(get_session).delete(delete_session))
        .route("/api/agents", get(list_agents))
        .route("/api/tools", get(list_tools))
        .route("/api/tools/:name", post(run_tool))
        .with_state(state)
}

// ============================================================
// Queries
// ============================================================

async fn process_query(
    State(state): State<AppState>,
    Json(req): Json<QueryRequest>,
) -> Result<Json<QueryOutcome>, AppError> {
    let outcome = state
        .dispatcher
        .handle_query(&req.query, req.session_id.as_deref(), req.user_id.as_deref())
        .await?;
    Ok(Json(outcome))
}

// ============================================================
// Sessions
// ============================================================

async fn create_session(
    State(state): State<AppState>,
    Json(req): Json<CreateSessionRequest>,
) -> Result<Json<CreateSessionResponse>, AppError> {
    let session = state.dispatcher.sessions().create_session(&req.user_id).await?;
    Ok(Json(CreateSessionResponse {
        session_id: session.id,
        user_id: session.user_id,
        created_at: session.created_at,
        message: "New session created successfully",
    }))
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(owner): Query<OwnerQuery>,
) -> Result<Json<SessionResponse>, AppError> {
    let sessions = state.dispatcher.sessions();
    let session = match owner.user_id.as_deref() {
        Some(user_id) => sessions.get_owned_session(&id, user_id).await?,
        None => sessions.get_session(&id).await?,
    };
    Ok(Json(session.into()))
}

async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(owner): Query<OwnerQuery>,
) -> Result<Json<MessageResponse>, AppError> {
    let sessions = state.dispatcher.sessions();
    match owner.user_id.as_deref() {
        Some(user_id) => sessions.delete_owned_session(&id, user_id).await?,
        None => sessions.delete_session(&id).await?,
    }
    Ok(Json(MessageResponse {
        message: "Session cleared successfully",
    }))
}

// ============================================================
// Agents and tools
// ============================================================

async fn list_agents(State(state): State<AppState>) -> Json<AgentsResponse> {
    let tools = state.dispatcher.tools();
    let specialists = Domain::SPECIALISTS
        .into_iter()
        .map(|domain| {
            let info = SpecialistInfo {
                id: domain.agent_id(),
                name: domain.agent_name(),
                capabilities: domain.capabilities(),
                tools: tools.for_domain(domain).into_iter().map(|d| d.name).collect(),
            };
            (domain.as_str(), info)
        })
        .collect();

    Json(AgentsResponse {
        tutor: TutorInfo {
            id: ORCHESTRATOR_ID,
            name: Domain::General.agent_name(),
            kind: "orchestrator",
        },
        specialists,
    })
}

async fn list_tools(State(state): State<AppState>) -> Json<ToolsResponse> {
    Json(ToolsResponse {
        tools: state.dispatcher.tools().definitions(),
    })
}

async fn run_tool(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(input): Json<Value>,
) -> Result<Json<ToolOutput>, AppError> {
    state
        .dispatcher
        .tools()
        .execute(&name, input)
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Tool not found: {name}")))
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    NotFound(String),
    Forbidden(String),
    Internal(String),
}

impl From<SessionError> for AppError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::NotFound(_) => AppError::NotFound(e.to_string()),
            SessionError::OwnershipMismatch { .. } => AppError::Forbidden(e.to_string()),
            SessionError::InvalidUser(_) => AppError::BadRequest(e.to_string()),
            SessionError::IdCollision(_) | SessionError::Storage(_) => {
                tracing::error!(error = %e, "Session store failure");
                AppError::Internal(e.to_string())
            }
        }
    }
}

impl From<DispatchError> for AppError {
    fn from(e: DispatchError) -> Self {
        match e {
            DispatchError::EmptyQuery => AppError::BadRequest(e.to_string()),
            DispatchError::Session(e) => e.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
