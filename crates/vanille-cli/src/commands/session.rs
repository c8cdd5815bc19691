use super::{resolve_session, short_id};
use anyhow::{Result, bail};
use clap::{Args, Subcommand};
use colored::Colorize;
use vanille_application::ChatApp;
use vanille_core::ChatMessage;
use vanille_core::session::SessionConfig;
use vanille_interaction::supported_models::{SYSTEM_MESSAGE_PROBABILITIES, is_supported_model};

#[derive(Subcommand)]
pub enum SessionAction {
    /// List sessions (the active one is marked)
    List,
    /// Create a session and make it active
    New { name: Option<String> },
    /// Rename a session
    Rename { session: String, name: String },
    /// Delete a session and its messages
    Delete { session: String },
    /// Show the settings of a session
    Show { session: String },
    /// Change settings of a session
    Set(SetArgs),
    /// Manage the weighted system messages of a session
    SystemMessage {
        #[command(subcommand)]
        action: SystemMessageAction,
    },
}

#[derive(Args)]
pub struct SetArgs {
    session: String,
    #[arg(long)]
    model: Option<String>,
    #[arg(long)]
    temperature: Option<f64>,
    /// Number of recent messages sent as context
    #[arg(long)]
    memory_count: Option<usize>,
    #[arg(long)]
    memory_enable: Option<bool>,
    /// Maximum number of stored summaries
    #[arg(long)]
    compress_count: Option<usize>,
    #[arg(long)]
    compress_enable: Option<bool>,
    /// Instruction used when summarizing old messages
    #[arg(long)]
    compress_method: Option<String>,
    #[arg(long)]
    api_key: Option<String>,
    #[arg(long)]
    api_host: Option<String>,
}

#[derive(Subcommand)]
pub enum SystemMessageAction {
    /// Add a system message with an inclusion probability
    Add {
        session: String,
        content: String,
        #[arg(long, default_value_t = 1.0)]
        probability: f64,
    },
    /// Remove a system message by its list number
    Remove { session: String, number: usize },
}

pub async fn run(app: &ChatApp, action: SessionAction) -> Result<()> {
    match action {
        SessionAction::List => list(app).await?,
        SessionAction::New { name } => {
            let config = app.sessions.create_session(name.as_deref()).await?;
            println!(
                "{} {} ({})",
                "Created".green(),
                config.session_name,
                short_id(&config.session_id)
            );
        }
        SessionAction::Rename { session, name } => {
            let config = resolve_session(app, &session).await?;
            let renamed = app.sessions.rename_session(&config.session_id, &name).await?;
            println!("{} {}", "Renamed to".green(), renamed.session_name);
        }
        SessionAction::Delete { session } => {
            let config = resolve_session(app, &session).await?;
            let active = app.sessions.delete_session(&config.session_id).await?;
            println!(
                "{} {} (active: {})",
                "Deleted".green(),
                config.session_name,
                short_id(&active)
            );
        }
        SessionAction::Show { session } => {
            let config = resolve_session(app, &session).await?;
            print_config(&config);
        }
        SessionAction::Set(args) => set(app, args).await?,
        SessionAction::SystemMessage { action } => system_message(app, action).await?,
    }
    Ok(())
}

async fn list(app: &ChatApp) -> Result<()> {
    let sessions = app.sessions.list_sessions().await?;
    let active = app.sessions.active_session_id().await?;

    if sessions.is_empty() {
        println!("{}", "No sessions yet".bright_black());
    }
    for (i, config) in sessions.iter().enumerate() {
        let marker = if active.as_deref() == Some(config.session_id.as_str()) {
            "*".bright_green().to_string()
        } else {
            " ".to_string()
        };
        println!(
            "{} {:>2}. {} {} {}",
            marker,
            i + 1,
            short_id(&config.session_id).bright_black(),
            config.session_name,
            format!("[{}]", config.model).bright_black()
        );
    }
    Ok(())
}

pub fn print_config(config: &SessionConfig) {
    println!("{}", config.session_name.bright_magenta().bold());
    println!("  id:               {}", config.session_id);
    println!("  model:            {}", config.model);
    println!("  temperature:      {}", config.temperature);
    println!(
        "  memory:           {} ({})",
        config.memory_count,
        on_off(config.memory_enable)
    );
    println!(
        "  compression:      up to {} summaries ({})",
        config.compress_memory_count,
        on_off(config.compress_memory_enable)
    );
    println!("  compress method:  {}", config.compress_memory_method);
    println!("  api host:         {}", or_none(&config.api_host));
    println!(
        "  api key:          {}",
        if config.api_key.is_empty() {
            "(none)".to_string()
        } else {
            super::config::mask_key(&config.api_key)
        }
    );
    println!("  created:          {}", config.created_at);

    println!("  system messages:");
    if config.system_messages.is_empty() {
        println!("    {}", "(none)".bright_black());
    }
    for (i, message) in config.system_messages.iter().enumerate() {
        println!(
            "    {}. [p={}] {}",
            i + 1,
            message.probability_to_use,
            message.content
        );
    }

    println!("  compressed memory:");
    if config.compressed_memory_list.is_empty() {
        println!("    {}", "(none)".bright_black());
    }
    for summary in &config.compressed_memory_list {
        println!("    - {}", summary.content);
    }
}

async fn set(app: &ChatApp, args: SetArgs) -> Result<()> {
    let config = resolve_session(app, &args.session).await?;

    if let Some(model) = &args.model {
        if !is_supported_model(model) {
            println!(
                "{}",
                format!("'{model}' is not in the supported list; using it anyway").yellow()
            );
        }
    }
    if let Some(temperature) = args.temperature {
        if !(0.0..=2.0).contains(&temperature) {
            bail!("Temperature must be between 0 and 2");
        }
    }

    let updated = app
        .sessions
        .update_session(&config.session_id, |c| {
            apply_settings(c, args);
            Ok(())
        })
        .await?;
    print_config(&updated);
    Ok(())
}

fn apply_settings(config: &mut SessionConfig, args: SetArgs) {
    if let Some(model) = args.model {
        config.model = model;
    }
    if let Some(temperature) = args.temperature {
        config.temperature = temperature;
    }
    if let Some(count) = args.memory_count {
        config.memory_count = count;
    }
    if let Some(enable) = args.memory_enable {
        config.memory_enable = enable;
    }
    if let Some(count) = args.compress_count {
        config.set_compress_memory_count(count);
    }
    if let Some(enable) = args.compress_enable {
        config.compress_memory_enable = enable;
    }
    if let Some(method) = args.compress_method {
        config.compress_memory_method = method;
    }
    if let Some(key) = args.api_key {
        config.api_key = key;
    }
    if let Some(host) = args.api_host {
        config.api_host = host;
    }
}

async fn system_message(app: &ChatApp, action: SystemMessageAction) -> Result<()> {
    match action {
        SystemMessageAction::Add {
            session,
            content,
            probability,
        } => {
            if content.trim().is_empty() {
                bail!("System message must not be empty");
            }
            if !(0.0..=1.0).contains(&probability) {
                bail!("Probability must be between 0 and 1");
            }
            if !SYSTEM_MESSAGE_PROBABILITIES.contains(&probability) {
                tracing::debug!("Non-preset probability {}", probability);
            }

            let config = resolve_session(app, &session).await?;
            let message = ChatMessage::system(content).with_probability(probability);
            let updated = app
                .sessions
                .update_session(&config.session_id, |c| {
                    c.system_messages.push(message);
                    Ok(())
                })
                .await?;
            println!(
                "{} ({} system messages)",
                "Added".green(),
                updated.system_messages.len()
            );
        }
        SystemMessageAction::Remove { session, number } => {
            let config = resolve_session(app, &session).await?;
            let Some(index) = number.checked_sub(1).filter(|i| *i < config.system_messages.len())
            else {
                bail!("No system message #{number}");
            };
            app.sessions
                .update_session(&config.session_id, |c| {
                    c.system_messages.remove(index);
                    Ok(())
                })
                .await?;
            println!("{}", "Removed".green());
        }
    }
    Ok(())
}

fn on_off(enabled: bool) -> &'static str {
    if enabled { "on" } else { "off" }
}

fn or_none(value: &str) -> &str {
    if value.is_empty() { "(none)" } else { value }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vanille_core::MessageRole;

    fn args(session: &str) -> SetArgs {
        SetArgs {
            session: session.into(),
            model: None,
            temperature: None,
            memory_count: None,
            memory_enable: None,
            compress_count: None,
            compress_enable: None,
            compress_method: None,
            api_key: None,
            api_host: None,
        }
    }

    #[test]
    fn lowering_compress_count_trims_oldest() {
        let mut config = SessionConfig::new("s");
        for i in 1..=4 {
            config.push_compressed_memory(ChatMessage::with_created(
                MessageRole::Assistant,
                format!("s{i}"),
                i,
            ));
        }
        apply_settings(
            &mut config,
            SetArgs {
                compress_count: Some(2),
                ..args("1")
            },
        );
        let contents: Vec<&str> = config
            .compressed_memory_list
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(contents, vec!["s3", "s4"]);
    }

    #[test]
    fn unset_fields_are_left_alone() {
        let mut config = SessionConfig::new("s");
        let before = config.clone();
        apply_settings(
            &mut config,
            SetArgs {
                temperature: Some(1.1),
                memory_enable: Some(false),
                ..args("1")
            },
        );
        assert_eq!(config.temperature, 1.1);
        assert!(!config.memory_enable);
        assert_eq!(config.model, before.model);
        assert_eq!(config.memory_count, before.memory_count);
    }
}
