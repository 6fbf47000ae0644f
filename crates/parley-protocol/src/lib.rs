// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Wire protocol spoken between parley and a chat backend.
//!
//! The client sends [`ClientAction`]s tagged by `action`; the server answers
//! with [`ServerMessage`]s tagged by `type` (older servers use
//! `message_type` and put the payload under `content`).  Both directions are
//! JSON text frames on a single WebSocket.

mod action;
mod error;
mod server;
mod types;
mod url;

pub use action::ClientAction;
pub use error::ProtocolError;
pub use server::{MessageKind, ServerMessage};
pub use types::{
    ContentBlock, Conversation, Message, ModelConfig, ModelConfigPatch, Role, Settings,
    SettingsPatch, DEFAULT_MAX_TOKENS, DEFAULT_MODEL, DEFAULT_PROVIDER, DEFAULT_TEMPERATURE,
    DEFAULT_TITLE,
};
pub use url::resolve_ws_url;
