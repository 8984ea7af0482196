use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod app;
mod commands;
mod logging;

#[derive(Parser)]
#[command(name = "leadflow")]
#[command(about = "Leadflow - conversational lead qualification", long_about = None)]
struct Cli {
    /// Path to config.toml (defaults to <data-dir>/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Data directory (overrides LEADFLOW_HOME and the config file)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the qualification bot in the terminal
    Chat {
        /// Resume an existing session instead of starting a new one
        #[arg(long)]
        session: Option<String>,
    },
    /// List stored sessions, most recent first
    Sessions,
    /// Print the transcript of a session
    Transcript {
        /// Session id
        session_id: String,
    },
    /// Print a health summary as JSON
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let app = app::App::bootstrap(cli.config.as_deref(), cli.data_dir.as_deref()).await?;
    let _log_guard = logging::init(&app.paths.logs_dir())?;
    tracing::info!(data_dir = %app.paths.root().display(), "[leadflow] Starting");

    match cli.command {
        Commands::Chat { session } => commands::chat::run(&app, session).await?,
        Commands::Sessions => commands::review::sessions(&app).await?,
        Commands::Transcript { session_id } => {
            commands::review::transcript(&app, &session_id).await?
        }
        Commands::Health => commands::review::health(&app).await?,
    }

    Ok(())
}
