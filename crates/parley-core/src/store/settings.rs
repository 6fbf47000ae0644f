use std::collections::HashMap;

use parley_protocol::{Settings, SettingsPatch};

use crate::bus::{EventBus, StoreEvent};

/// Settings per conversation, falling back to configured defaults.
#[derive(Debug)]
pub struct SettingsStore {
    bus: EventBus,
    defaults: Settings,
    by_conversation: HashMap<String, Settings>,
}

impl SettingsStore {
    pub fn new(bus: EventBus, defaults: Settings) -> Self {
        Self { bus, defaults, by_conversation: HashMap::new() }
    }

    pub fn defaults(&self) -> &Settings {
        &self.defaults
    }

    pub fn get(&self, conversation_id: &str) -> Settings {
        self.by_conversation
            .get(conversation_id)
            .cloned()
            .unwrap_or_else(|| self.defaults.clone())
    }

    pub fn has(&self, conversation_id: &str) -> bool {
        self.by_conversation.contains_key(conversation_id)
    }

    pub fn set(&mut self, conversation_id: &str, settings: Settings) {
        self.by_conversation.insert(conversation_id.to_string(), settings);
        self.bus.emit(StoreEvent::SettingsUpdated { conversation_id: conversation_id.to_string() });
    }

    /// Merge `patch` into the current settings (nested maps merged).
    pub fn update(&mut self, conversation_id: &str, patch: SettingsPatch) -> Settings {
        let merged = self.get(conversation_id).apply(patch);
        self.set(conversation_id, merged.clone());
        merged
    }

    pub fn reset(&mut self) {
        self.by_conversation.clear();
    }
}
