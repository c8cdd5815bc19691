use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use vanille_application::ChatApp;
use vanille_infrastructure::{ConfigService, VanillePaths};

mod commands;
mod logging;

#[derive(Parser)]
#[command(name = "vanille")]
#[command(about = "Vanille - chat sessions against OpenAI-compatible APIs", long_about = None)]
struct Cli {
    /// Directory for sessions, messages and logs (overrides config.toml)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the interactive chat (default)
    Chat {
        /// Session id, id prefix or list number to open
        #[arg(long)]
        session: Option<String>,
    },
    /// Manage sessions and their settings
    Session {
        #[command(subcommand)]
        action: commands::session::SessionAction,
    },
    /// Manage global API keys and hosts
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// List supported models and system-message weight presets
    Models,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut paths = VanillePaths::platform().context("Failed to resolve application directories")?;
    let config = ConfigService::new(paths.config_file()).get_config();
    if let Some(data_dir) = cli.data_dir.clone().or_else(|| config.data_dir.clone()) {
        paths = paths.with_data_dir(data_dir);
    }

    let _log_guard = logging::init_logging(&paths.logs_dir(), &config.log_filter)
        .context("Failed to initialize logging")?;

    let app = ChatApp::new(paths, config);

    match cli.command.unwrap_or(Commands::Chat { session: None }) {
        Commands::Chat { session } => commands::chat::run(&app, session.as_deref()).await?,
        Commands::Session { action } => commands::session::run(&app, action).await?,
        Commands::Config { action } => commands::config::run(&app, action).await?,
        Commands::Models => commands::models::run(),
    }

    Ok(())
}
