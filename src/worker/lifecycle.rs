//! Worker lifecycle: states, the persisted registration, client messages.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::ErrorKind;
use std::path::Path;
use tokio::fs;

/// File name of the registration record inside the cache directory.
pub const REGISTRATION_FILE: &str = "registration.json";

/// Where a worker is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerState {
    Parsed,
    Installing,
    Installed,
    Activating,
    Activated,
    /// Install failed, or a newer version took over.
    Redundant,
}

impl WorkerState {
    /// Whether moving to `next` is a legal transition.
    pub fn can_transition_to(self, next: WorkerState) -> bool {
        use WorkerState::*;

        matches!(
            (self, next),
            (Parsed, Installing)
                | (Installing, Installed)
                | (Installed, Activating)
                | (Activating, Activated)
                | (_, Redundant)
        ) && self != Redundant
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Parsed => "parsed",
            Self::Installing => "installing",
            Self::Installed => "installed",
            Self::Activating => "activating",
            Self::Activated => "activated",
            Self::Redundant => "redundant",
        }
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which worker versions control the scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    pub scope: String,
    /// Version currently controlling clients.
    pub active: Option<String>,
    /// Installed version waiting for the active one to let go.
    pub waiting: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Registration {
    /// A fresh registration with no workers.
    pub fn new(scope: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            active: None,
            waiting: None,
            updated_at: None,
        }
    }

    /// Load from disk; `None` if never saved.
    pub async fn load(path: &Path) -> Result<Option<Self>> {
        let json = match fs::read(path).await {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read registration {:?}", path))
            }
        };

        let registration = serde_json::from_slice(&json)
            .with_context(|| format!("Corrupt registration {:?}", path))?;
        Ok(Some(registration))
    }

    /// Write to disk, stamping the update time.
    pub async fn save(&mut self, path: &Path) -> Result<()> {
        self.updated_at = Some(Utc::now());

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_vec_pretty(self)?;
        fs::write(path, json)
            .await
            .with_context(|| format!("Failed to write registration {:?}", path))
    }
}

/// Messages a page can post to the worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientMessage {
    /// Activate a waiting worker now instead of after all tabs close.
    SkipWaiting,
}

impl ClientMessage {
    /// Parse a JSON message; anything unrecognized is `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        serde_json::from_str(raw).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn forward_transitions_only() {
        assert!(WorkerState::Parsed.can_transition_to(WorkerState::Installing));
        assert!(WorkerState::Installed.can_transition_to(WorkerState::Activating));
        assert!(!WorkerState::Activated.can_transition_to(WorkerState::Installing));
        assert!(!WorkerState::Parsed.can_transition_to(WorkerState::Activated));
    }

    #[test]
    fn anything_can_become_redundant_once() {
        assert!(WorkerState::Installing.can_transition_to(WorkerState::Redundant));
        assert!(WorkerState::Activated.can_transition_to(WorkerState::Redundant));
        assert!(!WorkerState::Redundant.can_transition_to(WorkerState::Redundant));
    }

    #[test]
    fn skip_waiting_message_parses() {
        assert_eq!(
            ClientMessage::parse(r#"{"type":"SKIP_WAITING"}"#),
            Some(ClientMessage::SkipWaiting)
        );
    }

    #[test]
    fn unknown_messages_are_ignored() {
        assert_eq!(ClientMessage::parse(r#"{"type":"REFRESH"}"#), None);
        assert_eq!(ClientMessage::parse("SKIP_WAITING"), None);
        assert_eq!(ClientMessage::parse("{}"), None);
    }

    #[tokio::test]
    async fn registration_round_trips_through_disk() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join(REGISTRATION_FILE);

        assert!(Registration::load(&path).await.unwrap().is_none());

        let mut registration = Registration::new("/");
        registration.active = Some("v1".to_string());
        registration.waiting = Some("v2".to_string());
        registration.save(&path).await.unwrap();

        let loaded = Registration::load(&path).await.unwrap().unwrap();
        assert_eq!(loaded, registration);
        assert!(loaded.updated_at.is_some());
    }

    #[tokio::test]
    async fn corrupt_registration_is_an_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(REGISTRATION_FILE);
        std::fs::write(&path, "not json").unwrap();

        assert!(Registration::load(&path).await.is_err());
    }
}
