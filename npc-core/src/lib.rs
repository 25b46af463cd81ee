//! D&D 5e NPC stat-block generation from prose.
//!
//! This crate provides:
//! - A form model and the structured prompt built from it
//! - Gemini prompt/response handling with fence stripping and JSON parsing
//! - Actor materialization: defaults, token vision, identifier repair
//! - Host seams for notifications and actor creation
//!
//! # Quick Start
//!
//! ```ignore
//! use npc_core::{DirectoryActorStore, GeminiBackend, NpcGenerator, Settings, TracingNotifier};
//! use npc_core::testing::StaticForm;
//!
//! #[tokio::main]
//! async fn main() {
//!     let settings = Settings::default().with_env_overrides();
//!     let generator = NpcGenerator::new(
//!         GeminiBackend::default(),
//!         DirectoryActorStore::new("actors"),
//!         TracingNotifier,
//!     );
//!
//!     let mut form = StaticForm::default();
//!     let outcome = generator.on_generate(&settings, &mut form).await;
//!     println!("{outcome:?}");
//! }
//! ```

pub mod actor;
pub mod extract;
pub mod form;
pub mod generator;
pub mod handler;
pub mod host;
pub mod prompt;
pub mod settings;
pub mod testing;

// Primary public API
pub use actor::{repair_item_ids, ActorData};
pub use extract::{parse_actor_json, strip_code_fence, ExtractError};
pub use form::{FormError, GenerationForm, MonsterRequest, Provider};
pub use generator::{GenerateOutcome, NpcGenerator};
pub use handler::{AiHandler, ContentBackend, GeminiBackend, GenerationError};
pub use host::{
    ActorStore, CreatedActor, DirectoryActorStore, Notification, NotificationLevel, Notifier,
    StoreError, TracingNotifier,
};
pub use prompt::build_generation_prompt;
pub use settings::{Settings, SettingsError, SettingsUpdate};
