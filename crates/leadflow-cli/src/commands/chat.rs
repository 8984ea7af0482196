use std::borrow::Cow::{self, Borrowed, Owned};
use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};
use tokio::sync::mpsc;

use leadflow_application::RealtimeChannel;
use leadflow_core::realtime::{ClientEvent, ServerEvent};
use leadflow_core::session::{Message, MessageKind, Sender};

use crate::app::App;

const COMMANDS: &[&str] = &["/file", "/typing", "/help", "/quit"];

/// Options of the choice the bot is currently waiting on.
type PendingOptions = Arc<Mutex<Vec<String>>>;

/// Completes slash commands and the currently offered options.
struct ChatHelper {
    pending: PendingOptions,
}

impl ChatHelper {
    fn new(pending: PendingOptions) -> Self {
        Self { pending }
    }

    fn candidates(&self) -> Vec<String> {
        let mut candidates: Vec<String> = COMMANDS.iter().map(|c| c.to_string()).collect();
        if let Ok(pending) = self.pending.lock() {
            candidates.extend(pending.iter().cloned());
        }
        candidates
    }
}

impl Helper for ChatHelper {}

impl Completer for ChatHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];
        if line.is_empty() {
            return Ok((0, vec![]));
        }

        let candidates = self
            .candidates()
            .into_iter()
            .filter(|c| c.starts_with(line))
            .map(|c| Pair {
                display: c.clone(),
                replacement: c,
            })
            .collect();
        Ok((0, candidates))
    }
}

impl Highlighter for ChatHelper {
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

impl Hinter for ChatHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let line = &line[..pos];
        if line.is_empty() || line.contains(' ') {
            return None;
        }
        self.candidates()
            .into_iter()
            .find(|c| c.starts_with(line) && c.len() > line.len())
            .map(|c| c[line.len()..].to_string())
    }
}

impl Validator for ChatHelper {}

/// What one REPL line asks for.
#[derive(Debug, PartialEq, Eq)]
enum LineAction {
    Send(ClientEvent),
    ToggleTyping,
    Help,
    Quit,
    Invalid(&'static str),
}

/// Maps a trimmed REPL line to an action.
///
/// A bare number or an exact option value picks from the pending choice;
/// anything else is submitted as free text.
fn parse_line(session_id: &str, line: &str, pending: &[String]) -> LineAction {
    let session_id = session_id.to_string();

    if let Some(rest) = line.strip_prefix('/') {
        let (command, arg) = rest
            .split_once(char::is_whitespace)
            .map(|(c, a)| (c, a.trim()))
            .unwrap_or((rest, ""));
        return match command {
            "quit" | "exit" => LineAction::Quit,
            "help" => LineAction::Help,
            "typing" => LineAction::ToggleTyping,
            "file" if arg.is_empty() => LineAction::Invalid("Usage: /file <path>"),
            "file" => {
                let file_name = Path::new(arg)
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| arg.to_string());
                LineAction::Send(ClientEvent::UploadFile {
                    session_id,
                    file_name,
                    reference: arg.to_string(),
                })
            }
            _ => LineAction::Invalid("Unknown command. Type /help for the list."),
        };
    }

    let picked = line
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| pending.get(i))
        .or_else(|| pending.iter().find(|option| option.as_str() == line));

    match picked {
        Some(value) => LineAction::Send(ClientEvent::SelectOption {
            session_id,
            value: value.clone(),
        }),
        None => LineAction::Send(ClientEvent::SubmitInput {
            session_id,
            text: line.to_string(),
        }),
    }
}

fn print_message(message: &Message) {
    match (message.sender, message.kind) {
        (Sender::User, _) => {}
        (Sender::Bot, MessageKind::Options) => print_options(&message.options),
        (Sender::Bot, MessageKind::Summary) => {
            for line in message.text.lines() {
                println!("{}", line.bright_yellow());
            }
        }
        (Sender::Bot, MessageKind::Text) => {
            for line in message.text.lines() {
                println!("{}", line.bright_blue());
            }
        }
    }
}

fn print_options(options: &[String]) {
    for (i, option) in options.iter().enumerate() {
        println!("  {} {}", format!("[{}]", i + 1).bright_black(), option.cyan());
    }
}

fn track_pending(pending: &PendingOptions, options: Vec<String>) {
    if let Ok(mut guard) = pending.lock() {
        *guard = options;
    }
}

/// Renders server events for this terminal connection.
async fn render_events(mut events: mpsc::UnboundedReceiver<ServerEvent>, pending: PendingOptions) {
    while let Some(event) = events.recv().await {
        match event {
            ServerEvent::Replay(replay) => {
                for message in &replay.transcript {
                    match message.sender {
                        Sender::User => println!("{}", format!("> {}", message.text).green()),
                        Sender::Bot if message.kind == MessageKind::Options => {}
                        Sender::Bot => print_message(message),
                    }
                }
                if !replay.options.is_empty() {
                    print_options(&replay.options);
                }
                track_pending(&pending, replay.options);
            }
            ServerEvent::Message { message } | ServerEvent::Options { message } => {
                print_message(&message);
                let options = if message.kind == MessageKind::Options {
                    message.options
                } else {
                    Vec::new()
                };
                track_pending(&pending, options);
            }
            ServerEvent::Processing { checkpoint, active } => {
                if active {
                    tracing::debug!(%checkpoint, "[chat] Checkpoint notification in flight");
                    println!("{}", "(passing your details to our team...)".bright_black());
                }
            }
            ServerEvent::Typing { active, .. } => {
                if active {
                    println!("{}", "(someone else is typing...)".bright_black());
                }
            }
            ServerEvent::Error { reason } => println!("{}", reason.red()),
            ServerEvent::SessionState(state) => {
                tracing::debug!(step = state.step, "[chat] Session state updated");
            }
        }
    }
}

fn print_help() {
    println!("{}", "Commands:".bright_magenta());
    println!("  {}  pick option n of the current choice", "<n>".cyan());
    println!("  {}  upload a file", "/file <path>".cyan());
    println!("  {}  toggle your typing indicator", "/typing".cyan());
    println!("  {}  leave the chat (the session is kept)", "/quit".cyan());
}

/// Runs an interactive chat that acts as one realtime connection.
pub async fn run(app: &App, session: Option<String>) -> Result<()> {
    let session_id = session.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let connection_id = RealtimeChannel::connection_id();
    let coordinator = app.coordinator.clone();
    let pending: PendingOptions = Arc::new(Mutex::new(Vec::new()));

    let (event_tx, event_rx) = mpsc::unbounded_channel::<ServerEvent>();
    let printer = tokio::spawn(render_events(event_rx, pending.clone()));

    println!("{}", "=== Leadflow Chat ===".bright_magenta().bold());
    println!("{}", format!("Session: {}", session_id).bright_black());
    println!("{}", "Type /help for commands, /quit to leave.".bright_black());
    println!();

    coordinator
        .handle_event(
            &connection_id,
            &event_tx,
            ClientEvent::Join {
                session_id: session_id.clone(),
            },
        )
        .await?;

    let mut rl = Editor::new()?;
    rl.set_helper(Some(ChatHelper::new(pending.clone())));
    let mut typing = false;

    loop {
        match rl.readline(">> ") {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(trimmed);

                let options = pending.lock().map(|p| p.clone()).unwrap_or_default();
                let event = match parse_line(&session_id, trimmed, &options) {
                    LineAction::Quit => break,
                    LineAction::Help => {
                        print_help();
                        continue;
                    }
                    LineAction::Invalid(reason) => {
                        println!("{}", reason.yellow());
                        continue;
                    }
                    LineAction::ToggleTyping => {
                        typing = !typing;
                        let session_id = session_id.clone();
                        if typing {
                            ClientEvent::TypingStart { session_id }
                        } else {
                            ClientEvent::TypingStop { session_id }
                        }
                    }
                    LineAction::Send(event) => {
                        typing = false;
                        event
                    }
                };

                // Failures are already reported to the room as an error event.
                if let Err(e) = coordinator.handle_event(&connection_id, &event_tx, event).await {
                    tracing::warn!(session_id = %session_id, "[chat] Event failed: {}", e);
                }
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type /quit to leave.".yellow());
            }
            Err(rustyline::error::ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("{}", format!("Error: {:?}", err).red());
                break;
            }
        }
    }

    coordinator
        .handle_event(
            &connection_id,
            &event_tx,
            ClientEvent::Leave {
                session_id: session_id.clone(),
            },
        )
        .await?;
    drop(event_tx);
    let _ = printer.await;

    println!(
        "{}",
        format!("Goodbye! Resume with: leadflow chat --session {}", session_id).bright_green()
    );
    Ok(())
}
