// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Small persistent key/value store for UI preferences.

use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::warn;

/// Every key is stored under this prefix so `clear` leaves foreign keys alone.
pub const KEY_PREFIX: &str = "chat_interface_";

#[derive(Debug, Error)]
pub enum PrefsError {
    #[error("writing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("encoding preference: {0}")]
    Json(#[from] serde_json::Error),
}

/// JSON object file of preferences.  Without a path the values live in memory.
#[derive(Debug, Default)]
pub struct Prefs {
    path: Option<PathBuf>,
    values: Map<String, Value>,
}

impl Prefs {
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Open (or start) the prefs file at `path`.  An unreadable or corrupt
    /// file is logged and treated as empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = match std::fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str::<Map<String, Value>>(&text) {
                Ok(map) => map,
                Err(e) => {
                    warn!(path = %path.display(), "ignoring corrupt prefs file: {e}");
                    Map::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Map::new(),
            Err(e) => {
                warn!(path = %path.display(), "cannot read prefs file: {e}");
                Map::new()
            }
        };
        Self { path: Some(path), values }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn full_key(key: &str) -> String {
        format!("{KEY_PREFIX}{key}")
    }

    pub fn save<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> Result<(), PrefsError> {
        self.values.insert(Self::full_key(key), serde_json::to_value(value)?);
        self.flush()
    }

    /// Stored value for `key`, or `default` when missing or of the wrong shape.
    pub fn load<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        match self.values.get(&Self::full_key(key)) {
            Some(v) => serde_json::from_value(v.clone()).unwrap_or_else(|e| {
                warn!(key, "ignoring unreadable preference: {e}");
                default
            }),
            None => default,
        }
    }

    pub fn remove(&mut self, key: &str) -> Result<(), PrefsError> {
        if self.values.remove(&Self::full_key(key)).is_some() {
            self.flush()?;
        }
        Ok(())
    }

    /// Remove every prefixed key.
    pub fn clear(&mut self) -> Result<(), PrefsError> {
        self.values.retain(|k, _| !k.starts_with(KEY_PREFIX));
        self.flush()
    }

    fn flush(&self) -> Result<(), PrefsError> {
        let Some(path) = &self.path else { return Ok(()) };
        let io_err = |source: std::io::Error| PrefsError::Io { path: path.clone(), source };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let text = serde_json::to_string_pretty(&self.values)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, text).map_err(io_err)?;
        std::fs::rename(&tmp, path).map_err(io_err)
    }
}
