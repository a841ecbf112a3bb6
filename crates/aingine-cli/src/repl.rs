//! Interactive session.
//!
//! The poller runs in the background for the lifetime of the REPL. Swaps and
//! prompts run on their own tasks so the prompt stays responsive; their
//! results reach the terminal through the session's update channel.

use std::borrow::Cow::{self, Borrowed, Owned};
use std::sync::Arc;

use aingine_application::{ChatOutcome, ChatRejection, SessionState, SwapOutcome, SwapRejection};
use aingine_core::model::ModelCatalog;
use anyhow::Result;
use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};

use crate::context::AppContext;
use crate::render;

const COMMANDS: &[&str] = &["/models", "/swap", "/status", "/key", "/help", "/quit"];

/// Completion and hints for slash commands and model ids.
#[derive(Clone)]
struct CliHelper {
    commands: Vec<String>,
    model_ids: Vec<String>,
}

impl CliHelper {
    fn new(catalog: &ModelCatalog) -> Self {
        Self {
            commands: COMMANDS.iter().map(|c| c.to_string()).collect(),
            model_ids: catalog.models().iter().map(|m| m.id.clone()).collect(),
        }
    }

    fn candidates(&self, line: &str) -> (usize, Vec<&String>) {
        if let Some(partial) = line.strip_prefix("/swap ") {
            let start = line.len() - partial.len();
            let ids = self
                .model_ids
                .iter()
                .filter(|id| id.starts_with(partial))
                .collect();
            return (start, ids);
        }
        if line.starts_with('/') && !line.contains(' ') {
            let commands = self
                .commands
                .iter()
                .filter(|cmd| cmd.starts_with(line))
                .collect();
            return (0, commands);
        }
        (0, Vec::new())
    }
}

impl Helper for CliHelper {}

impl Completer for CliHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let (start, candidates) = self.candidates(&line[..pos]);
        let pairs = candidates
            .into_iter()
            .map(|c| Pair {
                display: c.clone(),
                replacement: c.clone(),
            })
            .collect();
        Ok((start, pairs))
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
        let (start, candidates) = self.candidates(line);
        let typed = line.len() - start;
        candidates
            .into_iter()
            .find(|c| c.len() > typed)
            .map(|c| c[typed..].to_string())
    }
}

impl Validator for CliHelper {}

/// A parsed REPL line.
#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Models,
    Swap(&'a str),
    Status,
    Key(Option<&'a str>),
    Help,
    Quit,
    Unknown(&'a str),
    Prompt(&'a str),
}

fn parse_input(line: &str) -> Input<'_> {
    let trimmed = line.trim();
    if !trimmed.starts_with('/') {
        return Input::Prompt(line);
    }

    let (command, arg) = match trimmed.split_once(char::is_whitespace) {
        Some((command, arg)) => (command, arg.trim()),
        None => (trimmed, ""),
    };
    match command {
        "/models" => Input::Models,
        "/swap" => Input::Swap(arg),
        "/status" => Input::Status,
        "/key" if arg.is_empty() => Input::Key(None),
        "/key" => Input::Key(Some(arg)),
        "/help" => Input::Help,
        "/quit" | "/exit" => Input::Quit,
        other => Input::Unknown(other),
    }
}

fn print_help() {
    println!("{}", "Commands:".bright_black());
    println!("{}", "  /models        list models".bright_black());
    println!("{}", "  /swap <id>     load a model".bright_black());
    println!("{}", "  /status        gateway status".bright_black());
    println!("{}", "  /key [value]   show or set the API key".bright_black());
    println!("{}", "  /quit          exit".bright_black());
    println!("{}", "Anything else is sent to the active model.".bright_black());
}

/// Prints log entries and status changes as the session publishes them.
///
/// User entries are skipped since the terminal already shows what was typed.
async fn follow(state: Arc<SessionState>, catalog: ModelCatalog) {
    let mut updates = state.subscribe();
    let mut seen = updates.borrow_and_update().message_count;
    let mut last_status = None;

    while updates.changed().await.is_ok() {
        let snapshot = updates.borrow_and_update().clone();

        let fresh = state.messages_since(seen);
        seen += fresh.len();
        for message in fresh.iter().filter(|m| !m.is_user()) {
            render::print_message(message);
        }

        let status = (
            snapshot.system_status,
            snapshot.current_model_id.clone(),
            snapshot.gpu_locked,
        );
        if last_status.as_ref() != Some(&status) {
            render::print_status(&snapshot, &catalog);
            last_status = Some(status);
        }
    }
}

fn explain_swap_rejection(reason: &SwapRejection) -> String {
    match reason {
        SwapRejection::AlreadySwapping => "A model is already loading.".to_string(),
        SwapRejection::Generating => "Wait for the current reply first.".to_string(),
        SwapRejection::GpuLocked => "The GPU is busy; try again shortly.".to_string(),
        SwapRejection::AlreadyActive => "That model is already active.".to_string(),
        SwapRejection::UnknownModel(id) => format!("Unknown model '{}'. See /models.", id),
    }
}

fn explain_chat_rejection(reason: &ChatRejection) -> Option<&'static str> {
    match reason {
        ChatRejection::EmptyPrompt => None,
        ChatRejection::NoModelLoaded => Some("No model is loaded. Use /swap <id> first."),
        ChatRejection::Swapping => Some("A model is loading; wait for it to finish."),
        ChatRejection::Generating => Some("Still waiting for the previous reply."),
    }
}

pub async fn run(ctx: &AppContext) -> Result<()> {
    let session = ctx.session();
    let poller = session.start_polling();
    let printer = tokio::spawn(follow(session.state().clone(), ctx.catalog().clone()));

    let mut rl = Editor::new()?;
    rl.set_helper(Some(CliHelper::new(ctx.catalog())));

    println!("{}", "=== AIngine ===".bright_magenta().bold());
    println!(
        "{}",
        format!("Gateway: {}. Type /help for commands.", ctx.config().base_url()).bright_black()
    );
    println!();

    loop {
        let line = match rl.readline(">> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type /quit to exit.".yellow());
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("{}", format!("Error: {:?}", err).red());
                break;
            }
        };

        if line.trim().is_empty() {
            continue;
        }
        let _ = rl.add_history_entry(line.as_str());

        match parse_input(&line) {
            Input::Quit => break,
            Input::Help => print_help(),
            Input::Status => render::print_status(&session.snapshot(), ctx.catalog()),
            Input::Models => {
                render::print_catalog(
                    ctx.catalog(),
                    session.snapshot().current_model_id.as_deref(),
                );
            }
            Input::Key(None) => {
                let key = ctx.credentials().resolve().await;
                println!("API key: {}", render::mask_key(&key));
            }
            Input::Key(Some(value)) => match ctx.credentials().set_override(value).await {
                Ok(()) => println!("{}", "API key saved.".bright_green()),
                Err(e) => eprintln!("{}", format!("Failed to save API key: {}", e).red()),
            },
            Input::Swap("") => println!("{}", "Usage: /swap <model-id>".yellow()),
            Input::Swap(model_id) => {
                let swap = session.swap_controller();
                let model_id = model_id.to_string();
                tokio::spawn(async move {
                    if let SwapOutcome::Rejected(reason) = swap.select_by_id(&model_id).await {
                        println!("{}", explain_swap_rejection(&reason).yellow());
                    }
                });
            }
            Input::Unknown(command) => {
                println!("{}", format!("Unknown command {}. Try /help.", command).yellow());
            }
            Input::Prompt(text) => {
                let chat = session.chat_controller();
                let text = text.to_string();
                tokio::spawn(async move {
                    if let ChatOutcome::Rejected(reason) = chat.submit(&text).await {
                        if let Some(explanation) = explain_chat_rejection(&reason) {
                            println!("{}", explanation.yellow());
                        }
                    }
                });
            }
        }
    }

    println!("{}", "Goodbye!".bright_green());
    poller.stop().await;
    printer.abort();
    Ok(())
}
