//! Subcommand implementations.

use crate::terminal::{CliForm, TerminalNotifier};
use anyhow::{bail, Context};
use clap::Args;
use npc_core::settings::redact;
use npc_core::{
    DirectoryActorStore, GeminiBackend, GenerateOutcome, MonsterRequest, NpcGenerator, Provider,
    Settings, SettingsUpdate,
};
use std::path::Path;

#[derive(Debug, Clone, Default, Args)]
pub struct GenerateArgs {
    /// Monster name.
    #[arg(long)]
    pub name: Option<String>,

    /// Challenge rating, e.g. 3 or 0.25.
    #[arg(long)]
    pub cr: Option<f64>,

    /// Creature type, e.g. undead.
    #[arg(long = "type")]
    pub creature_type: Option<String>,

    /// Creature subtype, e.g. clown.
    #[arg(long)]
    pub subtype: Option<String>,

    #[arg(long)]
    pub alignment: Option<String>,

    /// Free-text description and key features.
    #[arg(long)]
    pub description: Option<String>,

    /// AI provider: gemini or openai.
    #[arg(long)]
    pub provider: Option<Provider>,

    /// Directory to write the actor to (defaults to <world>/actors).
    #[arg(long)]
    pub out: Option<std::path::PathBuf>,

    /// Gemini model id.
    #[arg(long)]
    pub model: Option<String>,

    /// Alternative API root, e.g. a local proxy.
    #[arg(long)]
    pub base_url: Option<String>,

    /// Print the created actor document to stdout.
    #[arg(long)]
    pub print: bool,
}

impl GenerateArgs {
    /// Form values, falling back to the form's defaults for anything unset.
    pub fn to_request(&self) -> MonsterRequest {
        let defaults = MonsterRequest::default();
        MonsterRequest {
            name: self.name.clone().unwrap_or(defaults.name),
            cr: self.cr.unwrap_or(defaults.cr),
            creature_type: self.creature_type.clone().unwrap_or(defaults.creature_type),
            subtype: self.subtype.clone().unwrap_or(defaults.subtype),
            alignment: self.alignment.clone().unwrap_or(defaults.alignment),
            description: self.description.clone().unwrap_or(defaults.description),
            provider: self.provider.unwrap_or(defaults.provider),
        }
    }
}

#[derive(Debug, Clone, Default, Args)]
pub struct ConfigureArgs {
    /// Gemini API key (empty string clears it).
    #[arg(long)]
    pub gemini_key: Option<String>,

    /// OpenAI API key (empty string clears it).
    #[arg(long)]
    pub openai_key: Option<String>,
}

/// Run the Generate action. Returns whether an actor was created.
pub async fn generate(world: &Path, args: GenerateArgs) -> anyhow::Result<bool> {
    let settings = Settings::load(Settings::path_in(world))
        .await
        .context("failed to load settings")?
        .with_env_overrides();

    let mut backend = GeminiBackend::default();
    if let Some(model) = &args.model {
        backend = backend.with_model(model);
    }
    if let Some(base_url) = &args.base_url {
        backend = backend.with_base_url(base_url);
    }

    let out_dir = args.out.clone().unwrap_or_else(|| world.join("actors"));
    let generator = NpcGenerator::new(backend, DirectoryActorStore::new(out_dir), TerminalNotifier);

    let mut form = CliForm::new(args.to_request());
    let outcome = generator.on_generate(&settings, &mut form).await;

    match outcome {
        GenerateOutcome::Created(created) => {
            if let Some(path) = &created.path {
                println!("Saved to {}", path.display());
                if args.print {
                    let document = tokio::fs::read_to_string(path)
                        .await
                        .with_context(|| format!("failed to read {}", path.display()))?;
                    println!("{document}");
                }
            }
            Ok(form.is_closed())
        }
        GenerateOutcome::CreationFailed(err) => {
            tracing::debug!(error = ?err, "actor creation failed");
            Ok(false)
        }
        GenerateOutcome::Invalid(_) | GenerateOutcome::Failed => Ok(false),
    }
}

/// The settings menu: write whichever keys were given.
pub async fn configure(world: &Path, args: ConfigureArgs) -> anyhow::Result<()> {
    if args.gemini_key.is_none() && args.openai_key.is_none() {
        bail!("nothing to configure: pass --gemini-key and/or --openai-key");
    }

    let path = Settings::path_in(world);
    let mut settings = Settings::load(&path)
        .await
        .context("failed to load settings")?;

    let changed = settings.update(SettingsUpdate {
        gemini_api_key: args.gemini_key,
        open_ai_api_key: args.openai_key,
    });
    if changed {
        settings
            .save(&path)
            .await
            .with_context(|| format!("failed to write {}", path.display()))?;
    }

    print_settings(&settings);
    Ok(())
}

pub async fn show_settings(world: &Path) -> anyhow::Result<()> {
    let settings = Settings::load(Settings::path_in(world))
        .await
        .context("failed to load settings")?;
    print_settings(&settings);
    Ok(())
}

fn print_settings(settings: &Settings) {
    println!("Gemini API key: {}", redact(&settings.gemini_api_key));
    println!("OpenAI API key: {}", redact(&settings.open_ai_api_key));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_args_use_form_defaults() {
        let request = GenerateArgs::default().to_request();
        assert_eq!(request, MonsterRequest::default());
    }

    #[test]
    fn test_args_override_defaults() {
        let args = GenerateArgs {
            name: Some("Bog Hag".to_string()),
            cr: Some(5.0),
            subtype: Some(String::new()),
            provider: Some(Provider::OpenAi),
            ..Default::default()
        };
        let request = args.to_request();
        assert_eq!(request.name, "Bog Hag");
        assert_eq!(request.cr, 5.0);
        assert_eq!(request.subtype, "");
        assert_eq!(request.creature_type, "undead");
        assert_eq!(request.provider, Provider::OpenAi);
    }

    #[tokio::test]
    async fn test_configure_writes_only_given_keys() {
        let dir = tempfile::tempdir().unwrap();
        Settings::new("old-gem", "old-oai")
            .save(Settings::path_in(dir.path()))
            .await
            .unwrap();

        configure(
            dir.path(),
            ConfigureArgs {
                gemini_key: Some("new-gem".to_string()),
                openai_key: None,
            },
        )
        .await
        .unwrap();

        let saved = Settings::load(Settings::path_in(dir.path())).await.unwrap();
        assert_eq!(saved, Settings::new("new-gem", "old-oai"));
    }

    #[tokio::test]
    async fn test_configure_without_keys_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(configure(dir.path(), ConfigureArgs::default()).await.is_err());
    }
}
