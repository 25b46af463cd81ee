//! Seams to the host application: user notifications and actor creation.

use crate::actor::{random_id, ActorData, ID_LENGTH};
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;

// ============================================================================
// Notifications
// ============================================================================

/// Severity of a user-facing notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Warn,
    Error,
}

/// A message shown to the game master.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Info,
            message: message.into(),
        }
    }

    pub fn warn(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Warn,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.level {
            NotificationLevel::Info => "info",
            NotificationLevel::Warn => "warning",
            NotificationLevel::Error => "error",
        };
        write!(f, "[{tag}] {}", self.message)
    }
}

/// Where user-facing notifications go.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Sends notifications to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        match notification.level {
            NotificationLevel::Info => tracing::info!("{}", notification.message),
            NotificationLevel::Warn => tracing::warn!("{}", notification.message),
            NotificationLevel::Error => tracing::error!("{}", notification.message),
        }
    }
}

// ============================================================================
// Actor creation
// ============================================================================

/// Errors from the host's entity-creation facility.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("actor rejected: {0}")]
    Rejected(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// An actor the host accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedActor {
    pub id: String,
    pub name: String,
    /// Where the host keeps it, when it lives on disk.
    pub path: Option<PathBuf>,
}

/// The host's entity-creation facility.
#[async_trait]
pub trait ActorStore: Send + Sync {
    async fn create_actor(&self, actor: &ActorData) -> Result<CreatedActor, StoreError>;
}

/// Checks every store applies before accepting a document.
pub fn check_actor(actor: &ActorData) -> Result<(), StoreError> {
    if actor.name.trim().is_empty() {
        return Err(StoreError::Rejected("actor name is empty".to_string()));
    }
    if let Some(index) = actor.items.iter().position(|item| !item.is_object()) {
        return Err(StoreError::Rejected(format!(
            "item {index} is not an object"
        )));
    }
    Ok(())
}

/// Stores actors as JSON documents in a directory.
#[derive(Debug, Clone)]
pub struct DirectoryActorStore {
    dir: PathBuf,
}

impl DirectoryActorStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File an actor with this name and id is written to.
    pub fn path_for(&self, name: &str, id: &str) -> PathBuf {
        let sanitized = name
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { '_' })
            .collect::<String>();
        self.dir.join(format!("{sanitized}_{id}.json"))
    }
}

#[async_trait]
impl ActorStore for DirectoryActorStore {
    async fn create_actor(&self, actor: &ActorData) -> Result<CreatedActor, StoreError> {
        check_actor(actor)?;

        let id = random_id(ID_LENGTH);
        let mut document = actor.to_value();
        if let Value::Object(fields) = &mut document {
            fields.insert("_id".to_string(), Value::String(id.clone()));
        }

        fs::create_dir_all(&self.dir).await?;
        let path = self.path_for(&actor.name, &id);
        fs::write(&path, serde_json::to_string_pretty(&document)?).await?;
        tracing::debug!(path = %path.display(), "actor written");

        Ok(CreatedActor {
            id,
            name: actor.name.clone(),
            path: Some(path),
        })
    }
}
