// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Observable client-side stores.

mod conversations;
mod messages;
pub(crate) mod prefs;
mod settings;
mod ui;

pub use conversations::ConversationStore;
pub use messages::MessageStore;
pub use prefs::{Prefs, PrefsError, KEY_PREFIX};
pub use settings::SettingsStore;
pub use ui::UiStore;

use parley_config::{Config, DefaultsConfig};
use parley_protocol::{Message, ModelConfig, Settings};
use tokio::sync::broadcast;

use crate::bus::{EventBus, StoreEvent};

/// Settings a conversation has before the server reports its own.
pub fn default_settings(defaults: &DefaultsConfig) -> Settings {
    Settings {
        model_config: ModelConfig {
            model: defaults.model.clone(),
            provider: defaults.provider.clone(),
        },
        temperature: defaults.temperature,
        max_tokens: defaults.max_tokens,
        system_prompt: defaults.system_prompt.clone(),
        ..Settings::default()
    }
}

/// All stores sharing one [`EventBus`], with the cross-store wiring applied
/// by the mutators defined here.
#[derive(Debug)]
pub struct ClientState {
    pub bus: EventBus,
    pub conversations: ConversationStore,
    pub messages: MessageStore,
    pub settings: SettingsStore,
    pub ui: UiStore,
}

impl ClientState {
    pub fn new(defaults: Settings, prefs: Prefs, default_dark: bool) -> Self {
        let bus = EventBus::default();
        Self {
            conversations: ConversationStore::new(bus.clone()),
            messages: MessageStore::new(bus.clone()),
            settings: SettingsStore::new(bus.clone(), defaults),
            ui: UiStore::new(bus.clone(), prefs, default_dark),
            bus,
        }
    }

    /// Defaults and theme come from `config`; a stored theme overrides it.
    pub fn from_config(config: &Config, prefs: Prefs) -> Self {
        let dark = !config.tui.theme.eq_ignore_ascii_case("light");
        Self::new(default_settings(&config.defaults), prefs, dark)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.bus.subscribe()
    }

    pub fn active_id(&self) -> Option<&str> {
        self.conversations.active_id()
    }

    /// Change the active conversation.  On change the thread view is cleared
    /// and the UI store follows.
    pub fn set_active(&mut self, id: Option<String>) -> bool {
        if !self.conversations.set_active(id.clone()) {
            return false;
        }
        self.messages.clear_view();
        self.ui.set_active_conversation(id);
        true
    }

    /// Append a message; assistant messages also refresh the sidebar entry.
    pub fn add_message(&mut self, conversation_id: &str, message: Message, now_ms: i64) {
        if message.is_assistant() {
            self.conversations.update_preview(conversation_id, Some(&message), now_ms);
        }
        self.messages.add(conversation_id, message);
    }

    pub fn add_messages(&mut self, conversation_id: &str, messages: Vec<Message>, now_ms: i64) {
        for m in messages.iter().filter(|m| m.is_assistant()) {
            self.conversations.update_preview(conversation_id, Some(m), now_ms);
        }
        self.messages.add_many(conversation_id, messages);
    }

    /// Messages of the active conversation.
    pub fn active_messages(&self) -> &[Message] {
        match self.active_id() {
            Some(id) => self.messages.get(id),
            None => &[],
        }
    }

    pub fn reset_all(&mut self) {
        self.conversations.reset();
        self.messages.reset();
        self.settings.reset();
        self.ui.reset();
    }
}
