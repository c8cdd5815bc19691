use anyhow::{Result, bail};
use clap::Subcommand;
use colored::Colorize;
use vanille_application::ChatApp;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show file locations and global credentials
    Show,
    /// Register an API key
    AddKey { key: String },
    /// Remove an API key by its list number
    RemoveKey { number: usize },
    /// Register an API host (e.g. api.openai.com or https://proxy.example)
    AddHost { host: String },
    /// Remove an API host by its list number
    RemoveHost { number: usize },
}

pub async fn run(app: &ChatApp, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => show(app).await?,
        ConfigAction::AddKey { key } => {
            if app.global.add_api_key(&key).await? {
                println!("{}", "API key added".green());
            } else {
                println!("{}", "API key is blank or already registered".yellow());
            }
        }
        ConfigAction::RemoveKey { number } => {
            match app.global.remove_api_key(index_of(number)?).await? {
                Some(key) => println!("{} {}", "Removed key".green(), mask_key(&key)),
                None => bail!("No API key #{number}"),
            }
        }
        ConfigAction::AddHost { host } => {
            if app.global.add_api_host(&host).await? {
                println!("{}", "API host added".green());
            } else {
                println!("{}", "API host is blank or already registered".yellow());
            }
        }
        ConfigAction::RemoveHost { number } => {
            match app.global.remove_api_host(index_of(number)?).await? {
                Some(host) => println!("{} {}", "Removed host".green(), host),
                None => bail!("No API host #{number}"),
            }
        }
    }
    Ok(())
}

async fn show(app: &ChatApp) -> Result<()> {
    let global = app.global.get().await?;

    println!("{}", "Files".bright_magenta().bold());
    println!("  config:   {}", app.paths.config_file().display());
    println!("  settings: {}", app.paths.settings_file().display());
    println!("  messages: {}", app.paths.messages_dir().display());
    println!("  logs:     {}", app.paths.logs_dir().display());

    println!("{}", "API keys".bright_magenta().bold());
    if global.api_keys.is_empty() {
        println!("  {}", "(none)".bright_black());
    }
    for (i, key) in global.api_keys.iter().enumerate() {
        println!("  {}. {}", i + 1, mask_key(key));
    }

    println!("{}", "API hosts".bright_magenta().bold());
    if global.api_hosts.is_empty() {
        println!(
            "  {} {}",
            "(none, using".bright_black(),
            format!("{})", app.config.default_api_host).bright_black()
        );
    }
    for (i, host) in global.api_hosts.iter().enumerate() {
        println!("  {}. {}", i + 1, host);
    }
    Ok(())
}

fn index_of(number: usize) -> Result<usize> {
    match number.checked_sub(1) {
        Some(index) => Ok(index),
        None => bail!("List numbers start at 1"),
    }
}

/// Shows only the ends of a key.
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..3].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}
