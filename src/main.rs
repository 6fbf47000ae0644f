mod cli;
mod headless;
mod output;

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use cli::{Cli, Commands};
use parley_client::ConnectOptions;
use parley_config::Config;
use parley_tui::{App, AppOptions};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_file = match (&cli.log_file, cli.is_tui()) {
        (Some(path), _) => Some(path.clone()),
        (None, true) => default_log_path(),
        (None, false) => None,
    };
    init_logging(cli.verbose, log_file.as_deref())?;

    // Handle subcommands that need no server first
    match &cli.command {
        Some(Commands::Completions { shell }) => {
            cli::print_completions(*shell);
            return Ok(());
        }
        Some(Commands::ShowConfig) => {
            let config = load_config(&cli)?;
            println!("{}", serde_yaml::to_string(&config).context("serializing config")?);
            return Ok(());
        }
        _ => {}
    }

    let config = load_config(&cli)?;
    let connect = ConnectOptions::from_config(&config).context("invalid server URL")?;

    match cli.command {
        None => run_tui(Arc::new(config), connect).await,
        Some(Commands::List { limit, json }) => headless::run_list(&config, connect, limit, json).await,
        Some(Commands::History { id, format }) => headless::run_history(&config, connect, &id, format).await,
        Some(Commands::Send { text, conversation, format }) => {
            headless::run_send(&config, connect, &text, conversation.as_deref(), format).await
        }
        Some(Commands::Settings { id, json }) => headless::run_settings(&config, connect, &id, json).await,
        Some(Commands::ShowConfig | Commands::Completions { .. }) => Ok(()),
    }
}

/// Layered config files with the command-line overrides on top.
fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = parley_config::load(cli.config.as_deref())?;
    if let Some(url) = &cli.url {
        config.server.url = url.clone();
    }
    if let Some(token) = &cli.token {
        config.server.token = Some(token.clone());
    }
    Ok(config)
}

async fn run_tui(config: Arc<Config>, connect: ConnectOptions) -> anyhow::Result<()> {
    use ratatui::crossterm::{
        execute,
        event::{
            EnableMouseCapture, DisableMouseCapture,
            KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
        },
    };

    let opts = AppOptions { connect, prefs_path: config.storage.resolve_prefs_path() };

    let terminal = ratatui::init();
    let _ = execute!(std::io::stderr(), EnableMouseCapture);
    let _ = execute!(
        std::io::stderr(),
        PushKeyboardEnhancementFlags(
            KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                | KeyboardEnhancementFlags::REPORT_EVENT_TYPES
                | KeyboardEnhancementFlags::REPORT_ALTERNATE_KEYS
        )
    );

    let app = App::new(config, opts);
    let result = app.run(terminal).await;

    let _ = execute!(std::io::stderr(), PopKeyboardEnhancementFlags);
    let _ = execute!(std::io::stderr(), DisableMouseCapture);
    ratatui::restore();

    result
}

fn default_log_path() -> Option<PathBuf> {
    dirs::state_dir()
        .or_else(dirs::cache_dir)
        .map(|d| d.join("parley").join("parley.log"))
}

/// Log to `file` when given (the TUI owns the terminal), otherwise to stderr.
fn init_logging(verbosity: u8, file: Option<&Path>) -> anyhow::Result<()> {
    let level = match verbosity {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));

    match file {
        Some(path) => {
            if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
                std::fs::create_dir_all(dir)
                    .with_context(|| format!("creating log directory {}", dir.display()))?;
            }
            let f = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("opening log file {}", path.display()))?;
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(false).with_ansi(false).with_writer(Mutex::new(f)))
                .with(filter)
                .init();
        }
        None => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
                .with(filter)
                .init();
        }
    }
    Ok(())
}
