use clap::Parser;
use config::{ProviderConfig, Settings, load_env_file};
use folio_core::reveal::{self, RevealConfig, RevealController, RevealEvent, RevealTarget};
use folio_core::{ChatSession, ContentStore, ReplyStream, SUGGESTED_PROMPTS};
use futures::StreamExt;

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

mod logging;

#[derive(clap_derive::Parser, Debug)]
#[command(author, version, about = "Chat with a portfolio assistant", long_about = None)]
struct Args {
    /// Gemini model name (overrides settings.toml)
    #[arg(long, env = "GOOGLE_MODEL_NAME")]
    model: Option<String>,

    /// Portfolio content file (TOML); the bundled portfolio is used otherwise
    #[arg(long, env = "FOLIO_CONTENT")]
    content: Option<PathBuf>,

    /// Seconds to wait for a complete reply
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    timeout: Option<u64>,

    #[arg(long, short)]
    tracing: bool,

    /// Print replies as they arrive instead of pacing them
    #[arg(long)]
    no_reveal: bool,
}

// Application state
struct AppState {
    session: ChatSession,
    reveal: Option<RevealConfig>,
}

fn load_content(args: &Args, settings: &Settings) -> anyhow::Result<ContentStore> {
    match args.content.as_ref().or(settings.content_path.as_ref()) {
        Some(path) => ContentStore::load(path),
        None => ContentStore::bundled(),
    }
}

fn print_status_bar(session: &ChatSession) {
    let terminal_width: usize = 80;
    let model = session.model_name().unwrap_or("not configured");
    let status = format!(" {} • {} ", session.content().full_name(), model);
    let padding = terminal_width.saturating_sub(status.chars().count() + 2);
    let left_pad = padding / 2;
    let right_pad = padding - left_pad;

    println!("┌{}┐", "─".repeat(terminal_width - 2));
    println!("│{}{}{}│", " ".repeat(left_pad), status, " ".repeat(right_pad));
    println!("└{}┘", "─".repeat(terminal_width - 2));
}

fn print_welcome(session: &ChatSession) {
    for message in session.display_messages() {
        println!("{}", message.text());
    }
    println!();
    println!("{}", folio_core::GREETING);
    print_prompts();
    println!("{}", folio_core::PLACEHOLDER_INPUT);
    println!();
}

fn print_prompts() {
    for (i, suggestion) in SUGGESTED_PROMPTS.iter().enumerate() {
        println!("  /ask {}  {:<12} {}", i + 1, suggestion.label, suggestion.prompt);
    }
}

fn render(event: RevealEvent) {
    match event {
        RevealEvent::Append(text) => print!("{}", text),
        // Replies only shrink when the provider restarts; show the new text on a fresh line.
        RevealEvent::Replace(text) => print!("\n{}", text),
    }
    let _ = io::stdout().flush();
}

/// Stream one reply to stdout. Ctrl+C abandons it and keeps what arrived.
async fn stream_reply(state: &mut AppState, mut reply: ReplyStream) -> anyhow::Result<()> {
    let message_id = reply.message_id().clone();
    let cancel = CancellationToken::new();
    let (targets, rx) = watch::channel(RevealTarget::new("", true));

    let renderer = state.reveal.map(|config| {
        let token = cancel.clone();
        tokio::spawn(async move {
            reveal::drive(RevealController::new(config), rx, token, render).await
        })
    });

    let mut printed = 0;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                cancel.cancel();
                state.session.cancel(&message_id);
                break;
            }
            item = reply.next() => match item {
                Some(Ok(chunk)) => {
                    state.session.apply(&chunk);
                    if renderer.is_some() {
                        let target = RevealTarget::new(chunk.text.clone(), !chunk.terminal);
                        targets.send_replace(target);
                    } else {
                        print!("{}", &chunk.text[printed..]);
                        io::stdout().flush()?;
                        printed = chunk.text.len();
                    }
                    if chunk.terminal {
                        break;
                    }
                }
                // Shown inline before the next prompt until dismissed
                Some(Err(e)) => {
                    state.session.fail(&message_id, e);
                    break;
                }
                None => break,
            }
        }
    }

    // The last target sent is final once the sender is gone.
    drop(targets);
    if let Some(handle) = renderer {
        handle.await?;
    }
    println!();
    Ok(())
}

async fn send(state: &mut AppState, text: &str) -> anyhow::Result<()> {
    match state.session.send(text) {
        Ok(Some(reply)) => stream_reply(state, reply).await,
        Ok(None) => Ok(()),
        Err(e) => {
            eprintln!("Error: {}", e);
            Ok(())
        }
    }
}

// Slash command parsing and handling
mod commands {
    use super::*;
    use folio_core::{ContactSubmission, LogContactSink, submit_contact};

    pub enum Command {
        Quit,
        Help,
        Clear,
        Prompts,
        Ask(usize),
        System,
        Contact,
        Dismiss,
    }

    pub enum CommandResult {
        Continue,
        Exit,
        Send(String),
        Contact,
    }

    impl Command {
        pub fn parse(input: &str) -> Result<Self, String> {
            let Some(body) = input.strip_prefix('/') else {
                return Err("Not a command".to_string());
            };

            let parts: Vec<&str> = body.split_whitespace().collect();
            if parts.is_empty() {
                return Err("Empty command".to_string());
            }

            match parts[0] {
                "quit" | "exit" => Ok(Command::Quit),
                "help" => Ok(Command::Help),
                "clear" => Ok(Command::Clear),
                "prompts" => Ok(Command::Prompts),
                "system" => Ok(Command::System),
                "contact" => Ok(Command::Contact),
                "dismiss" => Ok(Command::Dismiss),
                "ask" => {
                    let usage = format!("Usage: /ask <1-{}>", SUGGESTED_PROMPTS.len());
                    let n = parts
                        .get(1)
                        .and_then(|n| n.parse::<usize>().ok())
                        .ok_or(usage.clone())?;
                    if n == 0 || n > SUGGESTED_PROMPTS.len() {
                        return Err(usage);
                    }
                    Ok(Command::Ask(n - 1))
                }
                _ => Err(format!(
                    "Unknown command: /{}. Type /help for available commands.",
                    parts[0]
                )),
            }
        }

        pub fn execute(self, state: &mut AppState) -> CommandResult {
            match self {
                Command::Quit => {
                    println!("Goodbye!");
                    CommandResult::Exit
                }
                Command::Help => {
                    print_help();
                    println!();
                    CommandResult::Continue
                }
                Command::Clear => {
                    state.session.clear();
                    println!("Conversation history cleared.");
                    println!();
                    print_welcome(&state.session);
                    CommandResult::Continue
                }
                Command::Prompts => {
                    print_prompts();
                    println!();
                    CommandResult::Continue
                }
                Command::Ask(index) => {
                    CommandResult::Send(SUGGESTED_PROMPTS[index].prompt.to_string())
                }
                Command::System => {
                    println!("{}", state.session.system_prompt());
                    println!();
                    CommandResult::Continue
                }
                Command::Contact => CommandResult::Contact,
                Command::Dismiss => {
                    state.session.dismiss_error();
                    CommandResult::Continue
                }
            }
        }
    }

    /// Ask for each field on its own line, then submit.
    pub async fn contact_form(
        lines: &mut impl Iterator<Item = io::Result<String>>,
    ) -> anyhow::Result<()> {
        let mut field = |label: &str| -> anyhow::Result<String> {
            print!("{}: ", label);
            io::stdout().flush()?;
            Ok(lines.next().transpose()?.unwrap_or_default().trim().to_string())
        };

        let submission = ContactSubmission {
            name: field("Name")?,
            email: field("Email")?,
            subject: Some(field("Subject (optional)")?).filter(|s| !s.is_empty()),
            message: field("Message")?,
        };

        match submit_contact(&submission, &LogContactSink).await {
            Ok(_) => println!("Thanks! Your message has been sent."),
            Err(e) => println!("{}", e),
        }
        println!();
        Ok(())
    }

    fn print_help() {
        println!("Available commands:");
        println!("  /quit, /exit           - Exit the chat");
        println!("  /clear                 - Start a new conversation");
        println!("  /prompts               - List suggested questions");
        println!("  /ask <n>               - Send suggested question n");
        println!("  /system                - Show the system prompt");
        println!("  /contact               - Send a message through the contact form");
        println!("  /dismiss               - Dismiss the last error");
        println!("  /help                  - Show this help message");
        println!("  Ctrl+C                 - Stop the current reply");
        println!("  Ctrl+D                 - Exit the chat");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_env_file();
    let args = Args::parse();

    if let Err(e) = config::PathManager::ensure_dirs_exist() {
        eprintln!("[folio] Failed to create data directories: {}", e);
    }
    let _log_guard = logging::init_logging(args.tracing);

    let mut settings = Settings::load();
    if let Some(timeout) = args.timeout {
        settings.chat.timeout_secs = timeout;
    }

    let mut provider = ProviderConfig::resolve(&settings);
    if let (Some(provider), Some(model)) = (provider.as_mut(), args.model.as_ref()) {
        provider.model = model.clone();
    }
    tracing::debug!("Provider: {:?}", provider);

    let content = Arc::new(load_content(&args, &settings)?);
    let session = ChatSession::with_provider(provider, &settings, content)?;
    if !session.is_configured() {
        eprintln!("Chat is disabled: set GOOGLE_GENERATIVE_AI_API_KEY or GEMINI_API_KEY.");
    }

    let mut state = AppState {
        session,
        reveal: (!args.no_reveal).then(|| RevealConfig::from(&settings.reveal)),
    };

    print_status_bar(&state.session);
    println!();
    print_welcome(&state.session);
    println!("Type /help for commands, Ctrl+D or /quit to exit.");
    println!();

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        if let Some(e) = state.session.last_error() {
            println!("[error] {} (/dismiss to hide, resubmit to retry)", e);
        }
        print!("> ");
        io::stdout().flush()?;

        let line = match lines.next() {
            Some(Ok(line)) => line,
            Some(Err(e)) => {
                eprintln!("Error reading input: {}", e);
                break;
            }
            None => {
                println!();
                println!("Goodbye!");
                break;
            }
        };

        let input = line.trim();

        if input.is_empty() {
            continue;
        }

        // Try to parse as command
        let text = if input.starts_with('/') {
            match commands::Command::parse(input) {
                Ok(cmd) => match cmd.execute(&mut state) {
                    commands::CommandResult::Exit => break,
                    commands::CommandResult::Continue => continue,
                    commands::CommandResult::Contact => {
                        commands::contact_form(&mut lines).await?;
                        continue;
                    }
                    commands::CommandResult::Send(prompt) => {
                        println!("> {}", prompt);
                        prompt
                    }
                },
                Err(err) => {
                    println!("{}", err);
                    println!();
                    continue;
                }
            }
        } else {
            input.to_string()
        };

        send(&mut state, &text).await?;
        println!();
    }

    tracing::info!(
        messages = state.session.conversation().len(),
        "session ended"
    );
    Ok(())
}
