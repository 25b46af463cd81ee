//! Prompt/response handling for the AI providers.
//!
//! The `generate_*` methods return typed errors; the `process_*` methods are
//! the boundary the UI calls, turning every failure into `None` plus a
//! notification.

use crate::extract::{parse_actor_json, ExtractError};
use crate::form::Provider;
use crate::host::{Notification, Notifier};
use crate::prompt::{build_generation_prompt, GENERATION_TEMPERATURE};
use crate::settings::Settings;
use async_trait::async_trait;
use gemini::Gemini;
use serde_json::Value;
use thiserror::Error;

/// Everything that can end a generation attempt.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("{0} API Key not set in module settings.")]
    MissingApiKey(Provider),

    #[error("{0} API error: {1}")]
    Provider(Provider, #[source] gemini::Error),

    #[error("Unexpected response structure from {0}")]
    UnexpectedResponse(Provider),

    #[error("Failed to parse JSON from {0}: {1}")]
    Parse(Provider, #[source] ExtractError),

    #[error("{0} processing is not yet implemented")]
    NotImplemented(Provider),
}

impl GenerationError {
    /// The notification the game master sees for this failure.
    pub fn notification(&self) -> Notification {
        match self {
            GenerationError::MissingApiKey(provider) => {
                Notification::error(format!("{provider} API Key not set in module settings."))
            }
            GenerationError::Provider(provider, err @ gemini::Error::Api { .. }) => {
                Notification::error(format!(
                    "{provider} API Error: {}. Check console (F12).",
                    err.provider_message()
                ))
            }
            GenerationError::Provider(provider, _) => Notification::error(format!(
                "Error communicating with {provider} API. Check console (F12)."
            )),
            GenerationError::UnexpectedResponse(provider) => Notification::error(format!(
                "Unexpected response from {provider}. Check console (F12)."
            )),
            GenerationError::Parse(provider, _) => Notification::error(format!(
                "Failed to parse JSON from {provider}. Check console (F12) for raw response and error."
            )),
            GenerationError::NotImplemented(provider) => Notification::warn(format!(
                "{provider} processing is not yet implemented in this module."
            )),
        }
    }
}

/// The network seam: something that can run a Gemini request.
#[async_trait]
pub trait ContentBackend: Send + Sync {
    async fn generate_content(
        &self,
        api_key: &str,
        request: gemini::Request,
    ) -> Result<gemini::Response, gemini::Error>;
}

/// Runs requests against the real Gemini API.
///
/// One client is built up front; each request borrows its connection pool
/// with the caller's key.
#[derive(Debug, Clone)]
pub struct GeminiBackend {
    client: Gemini,
}

impl Default for GeminiBackend {
    fn default() -> Self {
        Self {
            client: Gemini::new(""),
        }
    }
}

impl GeminiBackend {
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.client = self.client.with_model(model);
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.client = self.client.with_base_url(base_url);
        self
    }

    pub fn model(&self) -> &str {
        self.client.model()
    }

    pub fn base_url(&self) -> &str {
        self.client.base_url()
    }
}

#[async_trait]
impl ContentBackend for GeminiBackend {
    async fn generate_content(
        &self,
        api_key: &str,
        request: gemini::Request,
    ) -> Result<gemini::Response, gemini::Error> {
        self.client
            .clone()
            .with_api_key(api_key)
            .generate_content(request)
            .await
    }
}

/// Sends prompts to the selected provider and parses the actor JSON back.
pub struct AiHandler<B> {
    backend: B,
}

impl<B: ContentBackend> AiHandler<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Generate an actor document with Gemini.
    pub async fn generate_with_gemini(
        &self,
        settings: &Settings,
        user_prompt: &str,
    ) -> Result<Value, GenerationError> {
        let provider = Provider::Gemini;
        let api_key = settings
            .api_key(provider)
            .ok_or(GenerationError::MissingApiKey(provider))?;

        let request = gemini::Request::text(build_generation_prompt(user_prompt))
            .with_temperature(GENERATION_TEMPERATURE);

        let response = self
            .backend
            .generate_content(api_key, request)
            .await
            .map_err(|e| GenerationError::Provider(provider, e))?;

        let Some(text) = response.text().filter(|text| !text.trim().is_empty()) else {
            tracing::error!(?response, "unexpected Gemini response structure");
            return Err(GenerationError::UnexpectedResponse(provider));
        };

        let actor = parse_actor_json(text).map_err(|e| GenerationError::Parse(provider, e))?;
        tracing::debug!(%actor, "parsed actor JSON");
        Ok(actor)
    }

    /// OpenAI generation is not wired up; this only checks the key.
    pub async fn generate_with_openai(
        &self,
        settings: &Settings,
        _user_prompt: &str,
    ) -> Result<Value, GenerationError> {
        let provider = Provider::OpenAi;
        settings
            .api_key(provider)
            .ok_or(GenerationError::MissingApiKey(provider))?;
        Err(GenerationError::NotImplemented(provider))
    }

    /// Generate with whichever provider was selected.
    pub async fn generate(
        &self,
        provider: Provider,
        settings: &Settings,
        user_prompt: &str,
    ) -> Result<Value, GenerationError> {
        match provider {
            Provider::Gemini => self.generate_with_gemini(settings, user_prompt).await,
            Provider::OpenAi => self.generate_with_openai(settings, user_prompt).await,
        }
    }

    pub async fn process_with_gemini(
        &self,
        settings: &Settings,
        user_prompt: &str,
        notifier: &dyn Notifier,
    ) -> Option<Value> {
        report(self.generate_with_gemini(settings, user_prompt).await, notifier)
    }

    pub async fn process_with_openai(
        &self,
        settings: &Settings,
        user_prompt: &str,
        notifier: &dyn Notifier,
    ) -> Option<Value> {
        report(self.generate_with_openai(settings, user_prompt).await, notifier)
    }

    /// Boundary entry point: never fails, reports problems instead.
    pub async fn process(
        &self,
        provider: Provider,
        settings: &Settings,
        user_prompt: &str,
        notifier: &dyn Notifier,
    ) -> Option<Value> {
        report(self.generate(provider, settings, user_prompt).await, notifier)
    }
}

fn report(result: Result<Value, GenerationError>, notifier: &dyn Notifier) -> Option<Value> {
    match result {
        Ok(actor) => Some(actor),
        Err(err) => {
            match &err {
                GenerationError::Parse(_, extract) => {
                    tracing::error!(error = %err, raw = %extract.raw(), "could not parse model output");
                }
                GenerationError::NotImplemented(_) => tracing::warn!("{err}"),
                _ => tracing::error!(error = %err, "generation failed"),
            }
            notifier.notify(err.notification());
            None
        }
    }
}
