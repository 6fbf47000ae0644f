// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Serde default helper returning `true`.
///
/// `#[serde(default)]` on a `bool` falls back to `false`, so fields that are
/// on unless switched off need a named function.
fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub reconnect: ReconnectConfig,
    #[serde(default)]
    pub defaults: DefaultsConfig,
    #[serde(default)]
    pub tui: TuiConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub headless: HeadlessConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Backend address.  `http(s)://` URLs are turned into `ws(s)://…/ws`.
    pub url: String,
    /// Explicit bearer token; prefer `token_env` in version-controlled files
    pub token: Option<String>,
    /// Environment variable that holds the bearer token (read at runtime)
    pub token_env: Option<String>,
    /// Upper bound for a single connect attempt
    pub connect_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: "ws://127.0.0.1:8080/ws".into(),
            token: None,
            token_env: Some("PARLEY_TOKEN".into()),
            connect_timeout_secs: 10,
        }
    }
}

impl ServerConfig {
    /// Token from the config file, or from the configured environment variable.
    pub fn resolve_token(&self) -> Option<String> {
        if let Some(t) = self.token.as_ref().filter(|t| !t.is_empty()) {
            return Some(t.clone());
        }
        self.token_env
            .as_deref()
            .and_then(|var| std::env::var(var).ok())
            .filter(|t| !t.is_empty())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs.max(1))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconnectConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// First retry delay; doubles on every failed attempt
    pub base_delay_ms: u64,
    /// Ceiling for the retry delay
    pub max_delay_ms: u64,
    /// Give up after this many consecutive failed attempts
    pub max_attempts: u32,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_delay_ms: 1000,
            max_delay_ms: 30_000,
            max_attempts: 5,
        }
    }
}

/// Settings applied to conversations the server has no settings for yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    pub model: String,
    pub provider: String,
    /// Sampling temperature (0.0–1.0)
    pub temperature: f64,
    pub max_tokens: u32,
    /// Sent with `new_conversation` when non-empty
    pub system_prompt: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            model: "claude-3-7-sonnet-20250219".into(),
            provider: "anthropic".into(),
            temperature: 0.7,
            max_tokens: 4096,
            system_prompt: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TuiConfig {
    /// Colour theme: "dark" | "light".  A choice made in the UI (Ctrl+T) is
    /// remembered in the prefs file and wins over this value.
    pub theme: String,
    /// Width used for markdown wrapping (0 = auto)
    pub wrap_width: u16,
    /// Use plain ASCII borders/indicators instead of Unicode box-drawing.
    /// Can also be forced with the PARLEY_ASCII_BORDERS=1 environment variable.
    pub ascii_borders: bool,
    /// Width of the conversation sidebar in columns
    #[serde(default = "default_sidebar_width")]
    pub sidebar_width: u16,
    /// Show tool calls as a single summary line instead of the full input
    pub collapse_tools: bool,
}

fn default_sidebar_width() -> u16 {
    32
}

impl Default for TuiConfig {
    fn default() -> Self {
        Self {
            theme: "dark".into(),
            wrap_width: 0,
            ascii_borders: false,
            sidebar_width: default_sidebar_width(),
            collapse_tools: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Preferences file; defaults to `<data_dir>/parley/prefs.json`
    pub prefs_path: Option<PathBuf>,
}

impl StorageConfig {
    pub fn resolve_prefs_path(&self) -> Option<PathBuf> {
        self.prefs_path
            .clone()
            .or_else(|| dirs::data_dir().map(|d| d.join("parley").join("prefs.json")))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HeadlessConfig {
    /// How long `parley send` waits for the assistant reply
    pub response_timeout_secs: u64,
}

impl Default for HeadlessConfig {
    fn default() -> Self {
        Self { response_timeout_secs: 120 }
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
