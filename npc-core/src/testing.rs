//! Test doubles for the generation pipeline.
//!
//! This module provides tools for testing without a network or a host:
//! - `ScriptedBackend` returns canned Gemini responses and records requests
//! - `RecordingNotifier` captures notifications
//! - `MemoryActorStore` keeps created actors in memory
//! - `StaticForm` supplies fixed form values and remembers being closed

use crate::actor::{random_id, ActorData, ID_LENGTH};
use crate::form::{GenerationForm, MonsterRequest};
use crate::handler::ContentBackend;
use crate::host::{check_actor, ActorStore, CreatedActor, Notification, Notifier, StoreError};
use async_trait::async_trait;
use std::sync::Mutex;

/// A request the scripted backend received.
#[derive(Debug, Clone)]
pub struct SentRequest {
    pub api_key: String,
    pub request: gemini::Request,
}

/// A backend that replays scripted outcomes in order.
///
/// Once the script runs out, the last outcome repeats.
pub struct ScriptedBackend {
    outcomes: Vec<Result<gemini::Response, gemini::Error>>,
    sent: Mutex<Vec<SentRequest>>,
}

impl ScriptedBackend {
    pub fn new(outcomes: Vec<Result<gemini::Response, gemini::Error>>) -> Self {
        Self {
            outcomes,
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Always answer with this model text.
    pub fn text(text: impl Into<String>) -> Self {
        Self::response(gemini::Response::from_text(text))
    }

    /// Always answer with this raw response.
    pub fn response(response: gemini::Response) -> Self {
        Self::new(vec![Ok(response)])
    }

    /// Always fail with this error.
    pub fn failing(error: gemini::Error) -> Self {
        Self::new(vec![Err(error)])
    }

    /// Number of requests received.
    pub fn calls(&self) -> usize {
        self.sent.lock().map(|sent| sent.len()).unwrap_or_default()
    }

    pub fn last_request(&self) -> Option<SentRequest> {
        self.sent.lock().ok()?.last().cloned()
    }
}

#[async_trait]
impl ContentBackend for ScriptedBackend {
    async fn generate_content(
        &self,
        api_key: &str,
        request: gemini::Request,
    ) -> Result<gemini::Response, gemini::Error> {
        let index = {
            let mut sent = self
                .sent
                .lock()
                .map_err(|_| gemini::Error::Config("scripted backend poisoned".to_string()))?;
            sent.push(SentRequest {
                api_key: api_key.to_string(),
                request,
            });
            sent.len() - 1
        };

        match self.outcomes.get(index).or_else(|| self.outcomes.last()) {
            Some(outcome) => outcome.clone(),
            None => Err(gemini::Error::Network("no scripted response".to_string())),
        }
    }
}

/// Captures notifications for later assertions.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notifications: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications
            .lock()
            .map(|n| n.clone())
            .unwrap_or_default()
    }

    /// Just the message texts, in order.
    pub fn messages(&self) -> Vec<String> {
        self.notifications()
            .into_iter()
            .map(|n| n.message)
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        if let Ok(mut notifications) = self.notifications.lock() {
            notifications.push(notification);
        }
    }
}

/// Keeps created actors in memory, or rejects everything when told to.
#[derive(Debug, Default)]
pub struct MemoryActorStore {
    actors: Mutex<Vec<ActorData>>,
    reject_with: Option<String>,
}

impl MemoryActorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that refuses every actor with this reason.
    pub fn rejecting(reason: impl Into<String>) -> Self {
        Self {
            actors: Mutex::new(Vec::new()),
            reject_with: Some(reason.into()),
        }
    }

    pub fn actors(&self) -> Vec<ActorData> {
        self.actors.lock().map(|a| a.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ActorStore for MemoryActorStore {
    async fn create_actor(&self, actor: &ActorData) -> Result<CreatedActor, StoreError> {
        if let Some(reason) = &self.reject_with {
            return Err(StoreError::Rejected(reason.clone()));
        }
        check_actor(actor)?;

        let mut actors = self
            .actors
            .lock()
            .map_err(|_| StoreError::Rejected("store poisoned".to_string()))?;
        actors.push(actor.clone());

        Ok(CreatedActor {
            id: random_id(ID_LENGTH),
            name: actor.name.clone(),
            path: None,
        })
    }
}

/// A form with fixed values.
#[derive(Debug, Clone, Default)]
pub struct StaticForm {
    pub request: MonsterRequest,
    pub closed: bool,
}

impl StaticForm {
    pub fn new(request: MonsterRequest) -> Self {
        Self {
            request,
            closed: false,
        }
    }
}

impl GenerationForm for StaticForm {
    fn values(&self) -> MonsterRequest {
        self.request.clone()
    }

    fn close(&mut self) {
        self.closed = true;
    }
}
