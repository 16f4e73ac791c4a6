//! AI Tutor - educational query router
//!
//! Deterministic science calculators exposed as tools, per-user tutoring
//! sessions, and a dispatcher that routes classified queries to the right
//! calculator.

pub mod api;
pub mod config;
pub mod dispatch;
pub mod session;
pub mod toolkit;
pub mod tools;
