//! Server configuration from `TUTOR_*` environment variables

use crate::session::MissingSessionPolicy;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_CLASSIFIER_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid {var}={value:?}: {reason}")]
pub struct ConfigError {
    pub var: &'static str,
    pub value: String,
    pub reason: String,
}

/// Where sessions live
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionBackend {
    Memory,
    Sqlite(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub sessions: SessionBackend,
    pub classifier_url: Option<String>,
    pub classifier_timeout: Duration,
    pub missing_session_policy: MissingSessionPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: IpAddr::from([0, 0, 0, 0]),
            port: DEFAULT_PORT,
            sessions: SessionBackend::Memory,
            classifier_url: None,
            classifier_timeout: Duration::from_secs(DEFAULT_CLASSIFIER_TIMEOUT_SECS),
            missing_session_policy: MissingSessionPolicy::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from any variable source. Unset or blank variables take their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| lookup(var).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Self::default();

        if let Some(host) = get("TUTOR_HOST") {
            config.host = parse("TUTOR_HOST", &host)?;
        }
        if let Some(port) = get("TUTOR_PORT") {
            config.port = parse("TUTOR_PORT", &port)?;
        }
        if let Some(path) = get("TUTOR_SESSION_DB") {
            config.sessions = SessionBackend::Sqlite(PathBuf::from(path));
        }
        if let Some(url) = get("TUTOR_CLASSIFIER_URL") {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError {
                    var: "TUTOR_CLASSIFIER_URL",
                    value: url,
                    reason: "expected an http:// or https:// URL".to_string(),
                });
            }
            config.classifier_url = Some(url);
        }
        if let Some(secs) = get("TUTOR_CLASSIFIER_TIMEOUT_SECS") {
            let secs: u64 = parse("TUTOR_CLASSIFIER_TIMEOUT_SECS", &secs)?;
            if secs == 0 {
                return Err(ConfigError {
                    var: "TUTOR_CLASSIFIER_TIMEOUT_SECS",
                    value: secs.to_string(),
                    reason: "must be at least 1".to_string(),
                });
            }
            config.classifier_timeout = Duration::from_secs(secs);
        }
        if let Some(policy) = get("TUTOR_MISSING_SESSION_POLICY") {
            config.missing_session_policy = parse("TUTOR_MISSING_SESSION_POLICY", &policy)?;
        }

        Ok(config)
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn parse<T>(var: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|e: T::Err| ConfigError {
        var,
        value: value.to_string(),
        reason: e.to_string(),
    })
}
