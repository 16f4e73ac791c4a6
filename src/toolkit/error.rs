//! Calculator error types

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Calculator error with classification
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct CalcError {
    pub kind: CalcErrorKind,
    pub message: String,
}

pub type CalcResult<T> = Result<T, CalcError>;

impl CalcError {
    pub fn new(kind: CalcErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// A key that is not in a table. The message lists every valid key.
    pub fn lookup_miss<I, S>(what: &str, key: &str, available: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let available = available
            .into_iter()
            .map(|s| s.as_ref().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        Self::new(
            CalcErrorKind::LookupMiss,
            format!("{what} '{key}' not found. Available: {available}"),
        )
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(CalcErrorKind::Parse, message)
    }

    pub fn domain(message: impl Into<String>) -> Self {
        Self::new(CalcErrorKind::Domain, message)
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::new(CalcErrorKind::Unsupported, message)
    }
}

/// Error classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalcErrorKind {
    /// Key or category not found; the message enumerates valid options
    LookupMiss,
    /// Malformed formula, equation or expression syntax
    Parse,
    /// Mathematically undefined input
    Domain,
    /// Valid syntax for a feature outside the calculator's scope
    Unsupported,
}
