use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

mod commands;
mod context;
mod render;
mod repl;

use context::AppContext;

const LOG_ENV: &str = "AINGINE_LOG";
const DEFAULT_LOG_LEVEL: &str = "warn";

#[derive(Parser)]
#[command(name = "aingine")]
#[command(about = "AIngine - chat with and swap models on a shared GPU gateway", long_about = None)]
struct Cli {
    /// Gateway base URL (overrides config and AINGINE_API_URL)
    #[arg(long, global = true)]
    gateway_url: Option<String>,

    /// Directory holding config.toml and credential.json
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Probe the gateway once and print its status
    Status,
    /// List the model catalog
    Models,
    /// Ask the gateway to load a model
    Swap {
        /// Catalog id of the model (see `aingine models`)
        model_id: String,
    },
    /// Send one prompt to the active model
    Chat {
        #[arg(required = true, trailing_var_arg = true)]
        prompt: Vec<String>,
    },
    /// Manage the stored API key override
    Key {
        #[command(subcommand)]
        action: KeyAction,
    },
    /// Interactive session (default)
    Repl,
}

#[derive(Subcommand)]
enum KeyAction {
    /// Store an API key that takes priority over the default
    Set { value: String },
    /// Remove the stored API key
    Clear,
    /// Show which key will be sent
    Show,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let ctx = AppContext::load(cli.config_dir, cli.gateway_url)?;

    let command = cli.command.unwrap_or(Commands::Repl);
    let _guard = init_tracing(&ctx, matches!(command, Commands::Repl));

    match command {
        Commands::Status => commands::status::run(&ctx).await,
        Commands::Models => commands::status::models(&ctx).await,
        Commands::Swap { model_id } => commands::swap::run(&ctx, &model_id).await,
        Commands::Chat { prompt } => commands::chat::run(&ctx, &prompt.join(" ")).await,
        Commands::Key { action } => match action {
            KeyAction::Set { value } => commands::key::set(&ctx, &value).await,
            KeyAction::Clear => commands::key::clear(&ctx).await,
            KeyAction::Show => commands::key::show(&ctx).await,
        },
        Commands::Repl => repl::run(&ctx).await,
    }
}

/// Installs the global subscriber.
///
/// The REPL logs to a daily file so log lines do not interleave with the
/// prompt; one-shot commands log to stderr.
fn init_tracing(ctx: &AppContext, to_file: bool) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL));

    if to_file {
        if let Some(logs_dir) = ctx.logs_dir() {
            let appender = tracing_appender::rolling::daily(logs_dir, "aingine.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .try_init();
            return Some(guard);
        }
    }

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
    None
}
