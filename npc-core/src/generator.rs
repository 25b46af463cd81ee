//! The "Generate" action: form values in, created actor out.

use crate::actor::ActorData;
use crate::form::{FormError, GenerationForm};
use crate::handler::{AiHandler, ContentBackend};
use crate::host::{ActorStore, CreatedActor, Notification, Notifier, StoreError};
use crate::settings::Settings;

/// How a generation attempt ended.
#[derive(Debug)]
pub enum GenerateOutcome {
    /// The form was incomplete; nothing was sent.
    Invalid(FormError),
    /// The provider step failed and was already reported.
    Failed,
    /// The host refused the generated actor.
    CreationFailed(StoreError),
    /// The actor exists in the host.
    Created(CreatedActor),
}

impl GenerateOutcome {
    pub fn is_created(&self) -> bool {
        matches!(self, GenerateOutcome::Created(_))
    }
}

/// Wires the handler, the host's actor store and the notifier together.
pub struct NpcGenerator<B, S, N> {
    handler: AiHandler<B>,
    store: S,
    notifier: N,
}

impl<B, S, N> NpcGenerator<B, S, N>
where
    B: ContentBackend,
    S: ActorStore,
    N: Notifier,
{
    pub fn new(backend: B, store: S, notifier: N) -> Self {
        Self {
            handler: AiHandler::new(backend),
            store,
            notifier,
        }
    }

    pub fn handler(&self) -> &AiHandler<B> {
        &self.handler
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Run one generation from the form's current values.
    ///
    /// The form is closed only when the actor was created.
    pub async fn on_generate(
        &self,
        settings: &Settings,
        form: &mut dyn GenerationForm,
    ) -> GenerateOutcome {
        let request = form.values();
        if let Err(err) = request.validate() {
            self.notifier.notify(Notification::warn(err.to_string()));
            return GenerateOutcome::Invalid(err);
        }

        let provider = request.provider;
        self.notifier.notify(Notification::info(format!(
            "Sending prompt to {provider}..."
        )));

        let user_prompt = request.structured_prompt();
        let Some(generated) = self
            .handler
            .process(provider, settings, &user_prompt, &self.notifier)
            .await
        else {
            return GenerateOutcome::Failed;
        };

        let actor = ActorData::from_generated(generated, &request.name);
        tracing::debug!(actor = %actor.to_value(), "data for actor creation");

        match self.store.create_actor(&actor).await {
            Ok(created) => {
                tracing::info!(id = %created.id, name = %created.name, "actor created");
                self.notifier.notify(Notification::info(format!(
                    "Actor \"{}\" created! Check Actors Directory.",
                    created.name
                )));
                form.close();
                GenerateOutcome::Created(created)
            }
            Err(err) => {
                tracing::error!(error = %err, "error creating actor from JSON");
                self.notifier.notify(Notification::error(
                    "Error creating actor from JSON. Check console (F12) for details.",
                ));
                GenerateOutcome::CreationFailed(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::{MonsterRequest, Provider};
    use crate::host::NotificationLevel;
    use crate::testing::{MemoryActorStore, RecordingNotifier, ScriptedBackend, StaticForm};

    fn settings() -> Settings {
        Settings::new("gem-key", "")
    }

    #[tokio::test]
    async fn test_invalid_form_sends_nothing() {
        let generator = NpcGenerator::new(
            ScriptedBackend::text("{}"),
            MemoryActorStore::new(),
            RecordingNotifier::new(),
        );
        let mut form = StaticForm::new(MonsterRequest {
            description: String::new(),
            ..Default::default()
        });

        let outcome = generator.on_generate(&settings(), &mut form).await;
        assert!(matches!(outcome, GenerateOutcome::Invalid(FormError::MissingRequired)));
        assert_eq!(generator.handler().backend().calls(), 0);
        assert_eq!(
            generator.notifier().messages(),
            vec!["Name and Description are required.".to_string()]
        );
        assert!(!form.closed);
    }

    #[tokio::test]
    async fn test_failed_generation_keeps_form_open() {
        let generator = NpcGenerator::new(
            ScriptedBackend::text("not json"),
            MemoryActorStore::new(),
            RecordingNotifier::new(),
        );
        let mut form = StaticForm::default();

        let outcome = generator.on_generate(&settings(), &mut form).await;
        assert!(matches!(outcome, GenerateOutcome::Failed));
        assert!(generator.store().actors().is_empty());
        assert!(!form.closed);
    }

    #[tokio::test]
    async fn test_creation_failure_is_reported_separately() {
        let generator = NpcGenerator::new(
            ScriptedBackend::text(r#"{"name":"Imp"}"#),
            MemoryActorStore::rejecting("validation failed"),
            RecordingNotifier::new(),
        );
        let mut form = StaticForm::default();

        let outcome = generator.on_generate(&settings(), &mut form).await;
        assert!(matches!(outcome, GenerateOutcome::CreationFailed(_)));
        assert!(!form.closed);

        let last = generator.notifier().notifications().pop().unwrap();
        assert_eq!(last.level, NotificationLevel::Error);
        assert_eq!(
            last.message,
            "Error creating actor from JSON. Check console (F12) for details."
        );
    }

    #[tokio::test]
    async fn test_openai_selection_warns_without_network() {
        let generator = NpcGenerator::new(
            ScriptedBackend::text("{}"),
            MemoryActorStore::new(),
            RecordingNotifier::new(),
        );
        let mut form = StaticForm::new(MonsterRequest {
            provider: Provider::OpenAi,
            ..Default::default()
        });

        let outcome = generator
            .on_generate(&Settings::new("", "oai-key"), &mut form)
            .await;
        assert!(matches!(outcome, GenerateOutcome::Failed));
        assert_eq!(generator.handler().backend().calls(), 0);
        assert_eq!(
            generator.notifier().messages(),
            vec![
                "Sending prompt to OpenAI...".to_string(),
                "OpenAI processing is not yet implemented in this module.".to_string(),
            ]
        );
    }
}
