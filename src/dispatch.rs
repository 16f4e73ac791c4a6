//! Query dispatcher
//!
//! A query is classified by an external `QueryClassifier` into a subject
//! domain and, optionally, a tool call. The dispatcher runs the tool,
//! records both sides of the exchange in the session, and returns the text.

mod classifier;
#[cfg(test)]
pub mod testing;

pub use classifier::{
    Classification, ClassifierError, ClassifyRequest, HttpClassifier, QueryClassifier, ToolCall,
};

use crate::session::{Role, SessionError, SessionManager, ANONYMOUS_USER};
use crate::tools::{Domain, ToolOutput, ToolRegistry};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

/// Agent id reported when no specialist answered
pub const ORCHESTRATOR_ID: &str = "ai_tutor_orchestrator";

/// Turns of recent history sent to the classifier
const HISTORY_WINDOW: usize = 10;

const CLASSIFIER_UNAVAILABLE: &str =
    "I apologize, but I'm currently unable to process your request. Please try again later.";

const NO_ANSWER: &str = "I couldn't find an answer to that question. \
    Try rephrasing it, or ask about math, physics, biology or chemistry.";

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Query cannot be empty")]
    EmptyQuery,

    #[error(transparent)]
    Session(#[from] SessionError),
}

/// What a handled query produced
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryOutcome {
    pub response: String,
    pub session_id: String,
    pub user_id: String,
    pub agent_used: String,
    pub domain: Domain,
}

/// Answer text plus where it came from
struct Answer {
    text: String,
    domain: Domain,
    tool: Option<String>,
}

#[derive(Clone)]
pub struct Dispatcher {
    sessions: SessionManager,
    tools: Arc<ToolRegistry>,
    classifier: Option<Arc<dyn QueryClassifier>>,
}

impl Dispatcher {
    pub fn new(
        sessions: SessionManager,
        tools: Arc<ToolRegistry>,
        classifier: Option<Arc<dyn QueryClassifier>>,
    ) -> Self {
        Self {
            sessions,
            tools,
            classifier,
        }
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn has_classifier(&self) -> bool {
        self.classifier.is_some()
    }

    /// Handle one query end to end.
    ///
    /// A blank `user_id` means the anonymous user. The session is resolved
    /// (created or replaced as needed), the query and the answer are appended
    /// as turns, and the answering domain is kept in the session context.
    pub async fn handle_query(
        &self,
        query: &str,
        session_id: Option<&str>,
        user_id: Option<&str>,
    ) -> Result<QueryOutcome, DispatchError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(DispatchError::EmptyQuery);
        }
        let user_id = user_id
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .unwrap_or(ANONYMOUS_USER);

        let session = self.sessions.resolve_for_query(session_id, user_id).await?;
        self.sessions.append_turn(&session.id, Role::User, query).await?;

        let history_start = session.turns.len().saturating_sub(HISTORY_WINDOW);
        let request = ClassifyRequest {
            query,
            session_id: &session.id,
            user_id: &session.user_id,
            history: &session.turns[history_start..],
        };
        let answer = self.answer(&request).await;

        self.sessions
            .append_turn(&session.id, Role::Assistant, &answer.text)
            .await?;
        if answer.domain != Domain::General {
            self.record_context(&session.id, &answer).await?;
        }

        let agent_used = answer.domain.agent_id().to_string();
        tracing::info!(
            session_id = %session.id,
            user_id = %session.user_id,
            domain = %answer.domain,
            tool = answer.tool.as_deref().unwrap_or("none"),
            "Query answered"
        );

        Ok(QueryOutcome {
            response: answer.text,
            session_id: session.id,
            user_id: session.user_id,
            agent_used,
            domain: answer.domain,
        })
    }

    async fn answer(&self, request: &ClassifyRequest<'_>) -> Answer {
        let Some(classifier) = &self.classifier else {
            return Answer {
                text: fallback_response(request.query),
                domain: Domain::General,
                tool: None,
            };
        };

        let classification = match classifier.classify(request).await {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(session_id = %request.session_id, error = %e, "Classifier failed");
                return Answer {
                    text: CLASSIFIER_UNAVAILABLE.to_string(),
                    domain: Domain::General,
                    tool: None,
                };
            }
        };

        let Classification {
            domain,
            tool_call,
            answer,
        } = classification;

        let Some(call) = tool_call else {
            return Answer {
                text: answer.unwrap_or_else(|| NO_ANSWER.to_string()),
                domain,
                tool: None,
            };
        };

        let output = match self.tools.execute(&call.name, call.input).await {
            Some(output) => output,
            None => {
                tracing::warn!(tool = %call.name, domain = %domain, "Classifier chose an unknown tool");
                ToolOutput::error(
                    crate::toolkit::CalcErrorKind::Unsupported,
                    format!("The '{}' tool is not available.", call.name),
                )
            }
        };

        let text = match answer {
            Some(intro) if output.success && !intro.trim().is_empty() => {
                format!("{}\n\n{}", intro.trim(), output.output)
            }
            _ => output.output,
        };

        Answer {
            text,
            domain,
            tool: Some(call.name),
        }
    }

    async fn record_context(&self, session_id: &str, answer: &Answer) -> Result<(), SessionError> {
        let mut entries = vec![("last_domain", json!(answer.domain))];
        if let Some(tool) = &answer.tool {
            entries.push(("last_tool", json!(tool)));
        }

        for (key, value) in entries {
            match self.sessions.set_context(session_id, key, value).await {
                // Deleted while the query was in flight; the policy already decided on the turns
                Err(SessionError::NotFound(_)) => return Ok(()),
                other => other?,
            }
        }
        Ok(())
    }
}

/// Reply used when no classifier is configured
pub fn fallback_response(query: &str) -> String {
    format!(
        "🎓 **AI Tutor Response (Fallback Mode)**\n\n\
         I received your query: '{query}'\n\n\
         ⚠️ **Note**: No query classifier is configured, so questions can't be routed to a \
         specialist. The calculators are still available directly through the tools API.\n\n\
         💡 **What I can help with**:\n\
         - Mathematics (algebra, calculus, equations)\n\
         - Physics (mechanics, constants, conversions)\n\
         - Biology (cells, genetics, organisms)\n\
         - Chemistry (elements, reactions, calculations)\n\
         - General educational questions\n\n\
         Configure a classifier to enable full tutoring."
    )
}

#[cfg(test)]
mod tests {
    use super::testing::MockClassifier;
    use super::*;
    use crate::session::{InMemorySessionStore, MissingSessionPolicy};
    use serde_json::json;

    fn dispatcher(classifier: Option<Arc<dyn QueryClassifier>>) -> Dispatcher {
        let sessions = SessionManager::new(
            Arc::new(InMemorySessionStore::new()),
            MissingSessionPolicy::Ignore,
        );
        Dispatcher::new(sessions, Arc::new(ToolRegistry::standard()), classifier)
    }

    #[tokio::test]
    async fn test_fallback_without_classifier() {
        let d = dispatcher(None);
        let outcome = d.handle_query("What is DNA?", None, None).await.unwrap();

        assert!(outcome.response.contains("Fallback Mode"));
        assert!(outcome.response.contains("I received your query: 'What is DNA?'"));
        assert_eq!(outcome.user_id, ANONYMOUS_USER);
        assert_eq!(outcome.agent_used, ORCHESTRATOR_ID);
        assert_eq!(outcome.domain, Domain::General);

        let session = d.sessions().get_session(&outcome.session_id).await.unwrap();
        assert_eq!(session.turns.len(), 2);
        assert_eq!(session.turns[0].role, Role::User);
        assert_eq!(session.turns[1].message, outcome.response);
    }

    #[tokio::test]
    async fn test_tool_call_runs_calculator() {
        let mock = Arc::new(MockClassifier::new());
        mock.queue_tool_call(
            Domain::Chemistry,
            "calculate_molar_mass",
            json!({"formula": "H2O"}),
        );
        let d = dispatcher(Some(mock.clone()));

        let outcome = d.handle_query("molar mass of water?", None, Some("alice")).await.unwrap();
        assert!(outcome.response.ends_with("Total: 18.015 g/mol"));
        assert_eq!(outcome.agent_used, "chemistry_agent");
        assert_eq!(outcome.domain, Domain::Chemistry);

        let session = d.sessions().get_session(&outcome.session_id).await.unwrap();
        assert_eq!(session.context["last_domain"], json!("chemistry"));
        assert_eq!(session.context["last_tool"], json!("calculate_molar_mass"));

        let requests = mock.recorded_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].query, "molar mass of water?");
        assert_eq!(requests[0].user_id, "alice");
    }

    #[tokio::test]
    async fn test_answer_prefixes_successful_tool_output() {
        let mock = Arc::new(MockClassifier::new());
        mock.queue(Ok(Classification {
            domain: Domain::Math,
            tool_call: Some(ToolCall {
                name: "calculate_expression".to_string(),
                input: json!({"expression": "6*7"}),
            }),
            answer: Some("Let's multiply.".to_string()),
        }));
        let d = dispatcher(Some(mock));

        let outcome = d.handle_query("6 times 7", None, None).await.unwrap();
        assert_eq!(outcome.response, "Let's multiply.\n\nResult: 42");
    }

    #[tokio::test]
    async fn test_tool_failure_text_is_returned() {
        let mock = Arc::new(MockClassifier::new());
        mock.queue_tool_call(Domain::Chemistry, "calculate_ph", json!({"concentration": -1}));
        let d = dispatcher(Some(mock));

        let outcome = d.handle_query("pH of -1 M?", None, None).await.unwrap();
        assert!(outcome.response.starts_with("Concentration must be a positive number"));
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let mock = Arc::new(MockClassifier::new());
        mock.queue_tool_call(Domain::WebSearch, "tavily_search", json!({"query": "news"}));
        let d = dispatcher(Some(mock));

        let outcome = d.handle_query("latest news", None, None).await.unwrap();
        assert_eq!(outcome.response, "The 'tavily_search' tool is not available.");
        assert_eq!(outcome.agent_used, "web_search_agent");
    }

    #[tokio::test]
    async fn test_plain_answer_and_missing_answer() {
        let mock = Arc::new(MockClassifier::new());
        mock.queue_answer(Domain::Biology, "Mitochondria produce ATP.");
        mock.queue(Ok(Classification {
            domain: Domain::General,
            tool_call: None,
            answer: None,
        }));
        let d = dispatcher(Some(mock));

        let first = d.handle_query("what do mitochondria do", None, None).await.unwrap();
        assert_eq!(first.response, "Mitochondria produce ATP.");

        let second = d
            .handle_query("hmm", Some(&first.session_id), None)
            .await
            .unwrap();
        assert_eq!(second.session_id, first.session_id);
        assert_eq!(second.response, NO_ANSWER);
    }

    #[tokio::test]
    async fn test_classifier_error_apologizes() {
        let mock = Arc::new(MockClassifier::new());
        mock.queue(Err(ClassifierError::Request("connection refused".to_string())));
        let d = dispatcher(Some(mock));

        let outcome = d.handle_query("help", None, None).await.unwrap();
        assert_eq!(outcome.response, CLASSIFIER_UNAVAILABLE);
        assert_eq!(outcome.domain, Domain::General);
    }

    #[tokio::test]
    async fn test_history_is_sent_to_classifier() {
        let mock = Arc::new(MockClassifier::new());
        mock.queue_answer(Domain::Math, "first");
        mock.queue_answer(Domain::Math, "second");
        let d = dispatcher(Some(mock.clone()));

        let first = d.handle_query("q1", None, None).await.unwrap();
        d.handle_query("q2", Some(&first.session_id), None).await.unwrap();

        let requests = mock.recorded_requests();
        assert!(requests[0].history.is_empty());
        let messages: Vec<_> = requests[1].history.iter().map(|t| t.message.as_str()).collect();
        assert_eq!(messages, vec!["q1", "first"]);
    }

    #[tokio::test]
    async fn test_empty_query_rejected() {
        let d = dispatcher(None);
        assert!(matches!(
            d.handle_query("   ", None, None).await,
            Err(DispatchError::EmptyQuery)
        ));
    }

    #[tokio::test]
    async fn test_ownership_mismatch_propagates() {
        let d = dispatcher(None);
        let outcome = d.handle_query("hi", None, Some("alice")).await.unwrap();

        let err = d
            .handle_query("hi", Some(&outcome.session_id), Some("mallory"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DispatchError::Session(SessionError::OwnershipMismatch { .. })
        ));
    }

    #[tokio::test]
    async fn test_unknown_session_is_replaced() {
        let d = dispatcher(None);
        let outcome = d
            .handle_query("hi", Some("session_gone"), Some("alice"))
            .await
            .unwrap();
        assert_ne!(outcome.session_id, "session_gone");
        assert!(outcome.session_id.starts_with("session_"));
    }
}
