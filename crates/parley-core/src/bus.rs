//! Broadcast channel the stores announce their changes on.

use parley_protocol::Role;
use tokio::sync::broadcast;

const DEFAULT_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// A transient banner shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
    /// Unix milliseconds.
    pub created_at: i64,
}

impl Notice {
    /// How long the notice stays visible.
    pub fn ttl_ms(&self) -> i64 {
        match self.level {
            NoticeLevel::Error => 5_000,
            NoticeLevel::Info => 3_000,
        }
    }

    pub fn is_expired(&self, now_ms: i64) -> bool {
        now_ms - self.created_at >= self.ttl_ms()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    ConversationsUpdated,
    ActiveConversationChanged(Option<String>),
    MessageAdded { conversation_id: String, role: Role },
    MessagesUpdated { conversation_id: String },
    /// The thread view should be emptied; stored messages are kept.
    MessagesCleared,
    SettingsUpdated { conversation_id: String },
    WaitingChanged(bool),
    SidebarToggled(bool),
    ThemeChanged { dark: bool },
    SettingsPanelToggled(bool),
    Notice(Notice),
}

/// Cloneable sender side; every store holds one.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<StoreEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.tx.subscribe()
    }

    /// Publish an event.  Having no subscribers is not an error.
    pub fn emit(&self, event: StoreEvent) {
        let _ = self.tx.send(event);
    }
}
