//! AI Tutor server
//!
//! Reads `TUTOR_*` configuration, opens the session store, and serves the
//! HTTP API.

use ai_tutor::api::{create_router, AppState};
use ai_tutor::config::{Config, SessionBackend};
use ai_tutor::dispatch::{Dispatcher, HttpClassifier, QueryClassifier};
use ai_tutor::session::{InMemorySessionStore, SessionManager, SessionStore, SqliteSessionStore};
use ai_tutor::tools::ToolRegistry;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ai_tutor=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    let config = Config::from_env()?;

    let store: Arc<dyn SessionStore> = match &config.sessions {
        SessionBackend::Memory => {
            tracing::info!("Using in-memory session store");
            Arc::new(InMemorySessionStore::new())
        }
        SessionBackend::Sqlite(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            tracing::info!(path = %path.display(), "Opening session database");
            Arc::new(SqliteSessionStore::open(path)?)
        }
    };
    let sessions = SessionManager::new(store, config.missing_session_policy);

    let tools = Arc::new(ToolRegistry::standard());

    let classifier: Option<Arc<dyn QueryClassifier>> = match &config.classifier_url {
        Some(url) => {
            tracing::info!(url = %url, timeout_secs = config.classifier_timeout.as_secs(), "Using HTTP classifier");
            let classifier = HttpClassifier::new(url.clone(), config.classifier_timeout, tools.definitions())?;
            Some(Arc::new(classifier) as Arc<dyn QueryClassifier>)
        }
        None => {
            tracing::warn!("No classifier configured. Set TUTOR_CLASSIFIER_URL; queries will be answered in fallback mode.");
            None
        }
    };

    let state = AppState::new(Dispatcher::new(sessions, tools, classifier));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(state).layer(cors).layer(TraceLayer::new_for_http());

    let addr = config.addr();
    tracing::info!(
        policy = %config.missing_session_policy,
        "AI Tutor server listening on {}",
        addr
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
