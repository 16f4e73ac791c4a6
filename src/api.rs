//! HTTP API for the tutor
//!
//! Queries, session management, and direct calculator access.

mod handlers;
mod types;

pub use handlers::create_router;
pub use types::*;

use crate::dispatch::Dispatcher;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
}

impl AppState {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
        }
    }
}
