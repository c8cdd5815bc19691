//! Interactive chat REPL.

use std::borrow::Cow::{self, Borrowed, Owned};
use std::io::Write;

use anyhow::Result;
use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};
use rustyline::history::DefaultHistory;
use tokio::sync::mpsc;

use super::{resolve_session, short_id};
use vanille_application::{ChatApp, SendState, SessionEvent, SessionLifecycle};
use vanille_core::{ChatMessage, MessageRole};

const COMMANDS: &[&str] = &[
    "/delete", "/resend", "/clear", "/history", "/sessions", "/new", "/switch", "/summary",
    "/quit",
];

/// A slash command typed at the prompt.
#[derive(Debug, PartialEq)]
enum ReplCommand {
    Delete(usize),
    Resend(usize),
    Clear,
    History,
    Sessions,
    New(Option<String>),
    Switch(String),
    Summary,
    Quit,
}

/// Parses a `/command`; list numbers are 1-based as shown by `/history`.
fn parse_command(line: &str) -> Result<ReplCommand, String> {
    let mut parts = line.trim().splitn(2, char::is_whitespace);
    let name = parts.next().unwrap_or_default();
    let arg = parts.next().map(str::trim).filter(|a| !a.is_empty());

    let number = |arg: Option<&str>| -> Result<usize, String> {
        arg.and_then(|a| a.parse::<usize>().ok())
            .and_then(|n| n.checked_sub(1))
            .ok_or_else(|| format!("{name} needs a message number (see /history)"))
    };

    match name {
        "/delete" => number(arg).map(ReplCommand::Delete),
        "/resend" => number(arg).map(ReplCommand::Resend),
        "/clear" => Ok(ReplCommand::Clear),
        "/history" => Ok(ReplCommand::History),
        "/sessions" => Ok(ReplCommand::Sessions),
        "/new" => Ok(ReplCommand::New(arg.map(str::to_string))),
        "/switch" => arg
            .map(|a| ReplCommand::Switch(a.to_string()))
            .ok_or_else(|| "/switch needs a session number or id".to_string()),
        "/summary" => Ok(ReplCommand::Summary),
        "/quit" | "/exit" => Ok(ReplCommand::Quit),
        other => Err(format!("Unknown command {other}")),
    }
}

/// rustyline helper providing slash-command completion, highlighting and hints.
#[derive(Clone)]
struct CliHelper;

impl Helper for CliHelper {}

impl Completer for CliHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];
        if !line.starts_with('/') || line.contains(' ') {
            return Ok((0, vec![]));
        }
        let candidates = COMMANDS
            .iter()
            .filter(|cmd| cmd.starts_with(line))
            .map(|cmd| Pair {
                display: cmd.to_string(),
                replacement: cmd.to_string(),
            })
            .collect();
        Ok((0, candidates))
    }
}

impl Highlighter for CliHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.starts_with('/') {
            Owned(line.bright_cyan().to_string())
        } else {
            Borrowed(line)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for CliHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let line = &line[..pos];
        if line.starts_with('/') && !line.contains(' ') {
            COMMANDS
                .iter()
                .find(|cmd| cmd.starts_with(line) && cmd.len() > line.len())
                .map(|cmd| cmd[line.len()..].to_string())
        } else {
            None
        }
    }
}

impl Validator for CliHelper {}

/// Renders session events as they arrive.
struct Renderer {
    streaming: bool,
}

impl Renderer {
    fn render(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::StateChanged(SendState::AwaitingFirstDelta) => {
                print!("{}", "… ".bright_black());
            }
            SessionEvent::StateChanged(SendState::Finished | SendState::Failed) => {
                if self.streaming {
                    println!();
                }
                self.streaming = false;
            }
            SessionEvent::MessageAppended(message) if message.role != MessageRole::User => {
                if self.streaming {
                    println!();
                }
                self.streaming = true;
                print!("{}", message.content.bright_blue());
            }
            SessionEvent::MessageExtended { delta, .. } => {
                print!("{}", delta.bright_blue());
            }
            SessionEvent::MemoryCompressed(_) => {
                println!("{}", "(older messages summarized)".bright_black());
            }
            _ => {}
        }
        let _ = std::io::stdout().flush();
    }
}

/// Sends while rendering streamed events.
async fn send_streaming(
    lifecycle: &mut SessionLifecycle,
    events: &mut mpsc::UnboundedReceiver<SessionEvent>,
    content: Option<&str>,
    resend_index: Option<usize>,
) -> vanille_core::Result<Option<ChatMessage>> {
    let mut renderer = Renderer { streaming: false };
    let result = {
        let send = async {
            match resend_index {
                Some(index) => lifecycle.resend_message(index).await,
                None => lifecycle.send_message(content.unwrap_or_default()).await,
            }
        };
        tokio::pin!(send);
        loop {
            tokio::select! {
                result = &mut send => break result,
                Some(event) = events.recv() => renderer.render(event),
            }
        }
    };
    while let Ok(event) = events.try_recv() {
        renderer.render(event);
    }
    result
}

async fn open(
    app: &ChatApp,
    session: Option<&str>,
) -> Result<(SessionLifecycle, mpsc::UnboundedReceiver<SessionEvent>)> {
    let mut lifecycle = match session {
        Some(key) => {
            let config = resolve_session(app, key).await?;
            app.sessions.switch_session(&config.session_id).await?
        }
        None => app.sessions.restore_or_create().await?,
    };
    let (tx, rx) = mpsc::unbounded_channel();
    lifecycle.set_event_sender(Some(tx));
    Ok((lifecycle, rx))
}

fn print_banner(lifecycle: &SessionLifecycle) {
    let config = lifecycle.config();
    println!(
        "{} {} {}",
        "===".bright_magenta(),
        config.session_name.bright_magenta().bold(),
        format!("[{} · {}]", config.model, short_id(&config.session_id)).bright_black()
    );
    if config.api_key.is_empty() {
        println!(
            "{}",
            "No API key configured. Add one with `vanille config add-key <KEY>`.".yellow()
        );
    }
}

fn print_history(messages: &[ChatMessage]) {
    if messages.is_empty() {
        println!("{}", "(no messages)".bright_black());
    }
    for (i, message) in messages.iter().enumerate() {
        let label = format!("{:>3}. {}", i + 1, message.role);
        match message.role {
            MessageRole::User => println!("{} {}", label.green(), message.content),
            _ => println!("{} {}", label.bright_blue(), message.content),
        }
    }
}

pub async fn run(app: &ChatApp, session: Option<&str>) -> Result<()> {
    let (mut lifecycle, mut events) = open(app, session).await?;

    let mut rl: Editor<CliHelper, DefaultHistory> = Editor::new()?;
    rl.set_helper(Some(CliHelper));

    print_banner(&lifecycle);
    println!(
        "{}",
        "Type a message, /history, /sessions, /switch N, /new, /summary, or /quit.".bright_black()
    );
    println!();

    loop {
        let line = match rl.readline(">> ") {
            Ok(line) => line,
            Err(rustyline::error::ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type /quit to exit.".yellow());
                continue;
            }
            Err(rustyline::error::ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("{}", format!("Error: {:?}", err).red());
                break;
            }
        };

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let _ = rl.add_history_entry(trimmed);

        if !trimmed.starts_with('/') {
            if let Err(e) = send_streaming(&mut lifecycle, &mut events, Some(trimmed), None).await
            {
                eprintln!("{}", format!("Send failed: {e}").red());
            }
            continue;
        }

        let command = match parse_command(trimmed) {
            Ok(command) => command,
            Err(message) => {
                println!("{}", message.yellow());
                continue;
            }
        };

        match command {
            ReplCommand::Quit => break,
            ReplCommand::History => print_history(lifecycle.messages()),
            ReplCommand::Summary => {
                match lifecycle.config().compressed_memory_summary() {
                    Some(summary) => println!("{}", summary.bright_black()),
                    None => println!("{}", "(no compressed memory)".bright_black()),
                }
            }
            ReplCommand::Clear => {
                lifecycle.clear_messages().await;
                while events.try_recv().is_ok() {}
                println!("{}", "Messages cleared".green());
            }
            ReplCommand::Delete(index) => match lifecycle.delete_message(index).await {
                Ok(removed) => {
                    while events.try_recv().is_ok() {}
                    println!("{} {}", "Deleted:".green(), removed.content.bright_black());
                }
                Err(e) => println!("{}", e.to_string().yellow()),
            },
            ReplCommand::Resend(index) => {
                if let Err(e) = send_streaming(&mut lifecycle, &mut events, None, Some(index)).await
                {
                    eprintln!("{}", format!("Resend failed: {e}").red());
                }
            }
            ReplCommand::Sessions => {
                super::session::run(app, super::session::SessionAction::List).await?;
            }
            ReplCommand::New(name) => {
                let config = app.sessions.create_session(name.as_deref()).await?;
                (lifecycle, events) = open(app, Some(&config.session_id)).await?;
                print_banner(&lifecycle);
            }
            ReplCommand::Switch(key) => match open(app, Some(&key)).await {
                Ok(opened) => {
                    (lifecycle, events) = opened;
                    print_banner(&lifecycle);
                }
                Err(e) => println!("{}", e.to_string().yellow()),
            },
        }
    }

    println!("{}", "Goodbye!".bright_green());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_numbered_commands_as_zero_based() {
        assert_eq!(parse_command("/delete 3"), Ok(ReplCommand::Delete(2)));
        assert_eq!(parse_command("/resend  1 "), Ok(ReplCommand::Resend(0)));
        assert!(parse_command("/delete").is_err());
        assert!(parse_command("/delete 0").is_err());
        assert!(parse_command("/resend x").is_err());
    }

    #[test]
    fn parses_optional_and_required_arguments() {
        assert_eq!(parse_command("/new"), Ok(ReplCommand::New(None)));
        assert_eq!(
            parse_command("/new Trip plans"),
            Ok(ReplCommand::New(Some("Trip plans".into())))
        );
        assert_eq!(
            parse_command("/switch 2"),
            Ok(ReplCommand::Switch("2".into()))
        );
        assert!(parse_command("/switch").is_err());
    }

    #[test]
    fn unknown_commands_are_rejected() {
        assert_eq!(parse_command("/quit"), Ok(ReplCommand::Quit));
        assert!(parse_command("/bogus").unwrap_err().contains("/bogus"));
    }

    #[test]
    fn every_listed_command_parses() {
        for command in COMMANDS {
            let line = match *command {
                "/delete" | "/resend" | "/switch" => format!("{command} 1"),
                _ => command.to_string(),
            };
            assert!(parse_command(&line).is_ok(), "{line}");
        }
    }
}
