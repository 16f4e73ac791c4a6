//! Session and turn types

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Who produced a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// One entry in a session's history. Never mutated once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// One user's ongoing interaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub turns: Vec<Turn>,
    pub context: BTreeMap<String, Value>,
}

impl Session {
    pub fn new(id: impl Into<String>, user_id: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            user_id: user_id.into(),
            created_at,
            turns: Vec::new(),
            context: BTreeMap::new(),
        }
    }

    pub fn last_activity(&self) -> DateTime<Utc> {
        self.turns.last().map_or(self.created_at, |t| t.timestamp)
    }

    /// Append a turn stamped at `now`, or just after the previous turn if
    /// the clock hasn't moved past it
    pub fn push_turn(&mut self, role: Role, message: impl Into<String>, now: DateTime<Utc>) -> &Turn {
        let timestamp = next_timestamp(self.turns.last().map(|t| t.timestamp), now);
        self.turns.push(Turn {
            role,
            message: message.into(),
            timestamp,
        });
        &self.turns[self.turns.len() - 1]
    }
}

/// Strictly increasing turn timestamps
pub(crate) fn next_timestamp(last: Option<DateTime<Utc>>, now: DateTime<Utc>) -> DateTime<Utc> {
    match last {
        Some(last) if now <= last => last + Duration::microseconds(1),
        _ => now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip_str() {
        for role in [Role::User, Role::Assistant] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("system".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Assistant).unwrap(), "\"assistant\"");
    }

    #[test]
    fn test_push_turn_strictly_increasing_with_frozen_clock() {
        let now = Utc::now();
        let mut session = Session::new("s", "u", now);
        session.push_turn(Role::User, "a", now);
        session.push_turn(Role::Assistant, "b", now);
        session.push_turn(Role::User, "c", now - Duration::seconds(5));

        let stamps: Vec<_> = session.turns.iter().map(|t| t.timestamp).collect();
        assert!(stamps.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(stamps[1] - stamps[0], Duration::microseconds(1));
    }

    #[test]
    fn test_last_activity() {
        let now = Utc::now();
        let mut session = Session::new("s", "u", now);
        assert_eq!(session.last_activity(), now);
        let later = now + Duration::seconds(3);
        session.push_turn(Role::User, "hi", later);
        assert_eq!(session.last_activity(), later);
    }
}
