// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! State and reconciliation logic shared by the TUI and the headless CLI.
//!
//! Server pushes go through a [`MessageRouter`] into the [`ChatController`],
//! which updates the observable stores in [`ClientState`].  Every store
//! mutation is announced on the [`EventBus`] as a [`StoreEvent`].

pub mod bus;
pub mod controller;
pub mod format;
pub mod router;
pub mod store;
pub mod thread;

pub use bus::{EventBus, Notice, NoticeLevel, StoreEvent};
pub use controller::{ActionSink, ChatController, ChatError, Clock, Session, SystemClock};
pub use router::{HandlerId, MessageRouter, Route};
pub use store::{
    default_settings, ClientState, ConversationStore, MessageStore, Prefs, PrefsError, SettingsStore, UiStore,
};
pub use thread::{build_thread, ThreadBlock, ThreadEntry};
