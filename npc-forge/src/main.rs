//! NPC Forge: generate D&D 5e NPC actors from a prose description.
//!
//! ```bash
//! npc-forge configure --gemini-key "$KEY"
//! npc-forge generate --name "Undead Clown" --cr 3 --type undead --subtype clown \
//!     --description "A horrifying clown risen from the grave."
//! ```
//!
//! Settings live in `<world>/settings.json`; actors are written to
//! `<world>/actors/` unless `--out` says otherwise.

mod commands;
mod terminal;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "npc-forge", version, about = "Generate D&D 5e NPC actors with an AI provider")]
struct Cli {
    /// World directory holding settings and generated actors.
    #[arg(long, global = true, default_value = "world")]
    world: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate an actor from the form fields.
    Generate(commands::GenerateArgs),
    /// Set provider API keys for this world.
    Configure(commands::ConfigureArgs),
    /// Show which API keys are configured.
    Settings,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "npc_forge=info,npc_core=info,gemini=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Generate(args) => {
            let created = commands::generate(&cli.world, args).await?;
            if !created {
                std::process::exit(1);
            }
        }
        Command::Configure(args) => commands::configure(&cli.world, args).await?,
        Command::Settings => commands::show_settings(&cli.world).await?,
    }

    Ok(())
}
