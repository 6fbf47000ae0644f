// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use std::path::PathBuf;

/// How headless commands print messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormatArg {
    /// Plain text: a role line followed by the message body.
    #[default]
    Text,
    /// `## User` / `## Assistant` / `## Tool` sections, pipeable as markdown.
    Markdown,
    /// The messages exactly as received, pretty-printed.
    Json,
    /// A standalone HTML document.
    Html,
}

#[derive(Parser, Debug)]
#[command(
    name = "parley",
    about = "A terminal chat client for WebSocket chat backends",
    version,
    long_about = None,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Server URL; http(s):// origins are turned into ws(s)://…/ws
    #[arg(long, short = 'u', env = "PARLEY_URL", global = true)]
    pub url: Option<String>,

    /// Path to config file (overrides auto-discovery)
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    /// Bearer token sent during the WebSocket upgrade
    #[arg(long, env = "PARLEY_TOKEN", hide_env_values = true, global = true)]
    pub token: Option<String>,

    /// Write logs to this file.  The TUI logs to
    /// `<state dir>/parley/parley.log` when omitted; other commands log to stderr.
    #[arg(long, value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Increase verbosity (-v = debug, -vv = trace)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List conversations on the server
    List {
        /// Maximum number of conversations to show
        #[arg(long, short = 'n', default_value = "20")]
        limit: usize,
        /// Output as JSON instead of a formatted table
        #[arg(long)]
        json: bool,
    },
    /// Print the message history of a conversation
    History {
        /// Conversation ID
        id: String,
        #[arg(long, short = 'f', value_enum, default_value = "text")]
        format: OutputFormatArg,
    },
    /// Send a message and print the assistant's reply
    Send {
        /// Message text
        text: String,
        /// Conversation to send to; a new one is created when omitted
        #[arg(long, value_name = "ID")]
        conversation: Option<String>,
        #[arg(long, short = 'f', value_enum, default_value = "text")]
        format: OutputFormatArg,
    },
    /// Print the settings of a conversation
    Settings {
        /// Conversation ID
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the effective configuration and exit
    ShowConfig,
    /// Generate shell completion script
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

impl Cli {
    /// The TUI runs when no subcommand is given.
    pub fn is_tui(&self) -> bool {
        self.command.is_none()
    }
}

pub fn print_completions(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "parley", &mut std::io::stdout());
}
