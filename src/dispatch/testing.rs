//! Mock classifier for dispatcher tests

use super::{Classification, ClassifierError, ClassifyRequest, QueryClassifier, ToolCall};
use crate::session::Turn;
use crate::tools::Domain;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Owned copy of a `ClassifyRequest`
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub query: String,
    pub session_id: String,
    pub user_id: String,
    pub history: Vec<Turn>,
}

/// Classifier that returns queued verdicts in order
#[derive(Default)]
pub struct MockClassifier {
    responses: Mutex<VecDeque<Result<Classification, ClassifierError>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue(&self, response: Result<Classification, ClassifierError>) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub fn queue_tool_call(&self, domain: Domain, tool: &str, input: Value) {
        self.queue(Ok(Classification {
            domain,
            tool_call: Some(ToolCall {
                name: tool.to_string(),
                input,
            }),
            answer: None,
        }));
    }

    pub fn queue_answer(&self, domain: Domain, answer: &str) {
        self.queue(Ok(Classification {
            domain,
            tool_call: None,
            answer: Some(answer.to_string()),
        }));
    }

    pub fn recorded_requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl QueryClassifier for MockClassifier {
    async fn classify(&self, request: &ClassifyRequest<'_>) -> Result<Classification, ClassifierError> {
        self.requests.lock().unwrap().push(RecordedRequest {
            query: request.query.to_string(),
            session_id: request.session_id.to_string(),
            user_id: request.user_id.to_string(),
            history: request.history.to_vec(),
        });
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ClassifierError::Request("No mock response queued".to_string())))
    }
}
