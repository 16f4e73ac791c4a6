//! Classifier seam and its HTTP adapter

use crate::session::Turn;
use crate::tools::{Domain, ToolDefinition};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Everything a classifier sees about a query
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ClassifyRequest<'a> {
    pub query: &'a str,
    pub session_id: &'a str,
    pub user_id: &'a str,
    /// Most recent turns, oldest first, excluding `query`
    pub history: &'a [Turn],
}

/// A tool the classifier wants run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub name: String,
    #[serde(default = "empty_object")]
    pub input: Value,
}

fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}

/// Classifier verdict: the domain, and either a tool call, a direct answer, or both
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    #[serde(deserialize_with = "lenient_domain")]
    pub domain: Domain,
    #[serde(default)]
    pub tool_call: Option<ToolCall>,
    #[serde(default)]
    pub answer: Option<String>,
}

/// Accept any spelling `Domain::from_str` accepts; unknown labels become `General`
fn lenient_domain<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Domain, D::Error> {
    let label = String::deserialize(deserializer)?;
    Ok(label.parse().unwrap_or(Domain::General))
}

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("classifier request failed: {0}")]
    Request(String),

    #[error("classifier returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("classifier response invalid: {0}")]
    InvalidResponse(String),
}

/// Decides what a query is about
#[async_trait]
pub trait QueryClassifier: Send + Sync {
    async fn classify(&self, request: &ClassifyRequest<'_>) -> Result<Classification, ClassifierError>;
}

#[derive(Serialize)]
struct HttpClassifyBody<'a> {
    #[serde(flatten)]
    request: &'a ClassifyRequest<'a>,
    tools: &'a [ToolDefinition],
}

/// Posts queries to an external classifier service as JSON
pub struct HttpClassifier {
    client: Client,
    url: String,
    tools: Vec<ToolDefinition>,
}

impl HttpClassifier {
    /// `tools` is sent with every request so the service knows the available calls
    pub fn new(
        url: impl Into<String>,
        timeout: Duration,
        tools: Vec<ToolDefinition>,
    ) -> Result<Self, ClassifierError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClassifierError::Request(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            url: url.into(),
            tools,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl QueryClassifier for HttpClassifier {
    async fn classify(&self, request: &ClassifyRequest<'_>) -> Result<Classification, ClassifierError> {
        let start = std::time::Instant::now();
        let body = HttpClassifyBody {
            request,
            tools: &self.tools,
        };

        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ClassifierError::Request(format!("Request timeout: {e}"))
                } else if e.is_connect() {
                    ClassifierError::Request(format!("Connection failed: {e}"))
                } else {
                    ClassifierError::Request(e.to_string())
                }
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ClassifierError::Request(format!("Failed to read response: {e}")))?;

        tracing::debug!(
            status = status.as_u16(),
            duration_ms = %start.elapsed().as_millis(),
            "Classifier responded"
        );

        if !status.is_success() {
            return Err(ClassifierError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        serde_json::from_str(&text).map_err(|e| ClassifierError::InvalidResponse(format!("{e} - body: {text}")))
    }
}
