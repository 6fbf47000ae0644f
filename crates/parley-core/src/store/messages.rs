use std::collections::HashMap;

use parley_protocol::Message;

use crate::bus::{EventBus, StoreEvent};

/// Messages per conversation id.
#[derive(Debug)]
pub struct MessageStore {
    bus: EventBus,
    by_conversation: HashMap<String, Vec<Message>>,
}

impl MessageStore {
    pub fn new(bus: EventBus) -> Self {
        Self { bus, by_conversation: HashMap::new() }
    }

    pub fn add(&mut self, conversation_id: &str, message: Message) {
        let role = message.role;
        self.by_conversation.entry(conversation_id.to_string()).or_default().push(message);
        self.bus.emit(StoreEvent::MessageAdded { conversation_id: conversation_id.to_string(), role });
        self.updated(conversation_id);
    }

    /// Append several messages; one `MessageAdded` per message, one
    /// `MessagesUpdated` at the end.
    pub fn add_many(&mut self, conversation_id: &str, messages: Vec<Message>) {
        if messages.is_empty() {
            return;
        }
        let roles: Vec<_> = messages.iter().map(|m| m.role).collect();
        self.by_conversation.entry(conversation_id.to_string()).or_default().extend(messages);
        for role in roles {
            self.bus.emit(StoreEvent::MessageAdded { conversation_id: conversation_id.to_string(), role });
        }
        self.updated(conversation_id);
    }

    pub fn set(&mut self, conversation_id: &str, messages: Vec<Message>) {
        self.by_conversation.insert(conversation_id.to_string(), messages);
        self.updated(conversation_id);
    }

    pub fn get(&self, conversation_id: &str) -> &[Message] {
        self.by_conversation.get(conversation_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Ask the view to clear itself.  Stored messages are kept.
    pub fn clear_view(&self) {
        self.bus.emit(StoreEvent::MessagesCleared);
    }

    pub fn reset(&mut self) {
        self.by_conversation.clear();
        self.bus.emit(StoreEvent::MessagesCleared);
    }

    fn updated(&self, conversation_id: &str) {
        self.bus.emit(StoreEvent::MessagesUpdated { conversation_id: conversation_id.to_string() });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_protocol::Role;

    fn drain(rx: &mut tokio::sync::broadcast::Receiver<StoreEvent>) -> Vec<StoreEvent> {
        std::iter::from_fn(|| rx.try_recv().ok()).collect()
    }

    #[test]
    fn add_emits_added_then_updated() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();
        let mut s = MessageStore::new(bus);
        s.add("c", Message::user_text("hi"));
        assert_eq!(
            drain(&mut rx),
            vec![
                StoreEvent::MessageAdded { conversation_id: "c".into(), role: Role::User },
                StoreEvent::MessagesUpdated { conversation_id: "c".into() },
            ]
        );
        assert_eq!(s.get("c").len(), 1);
    }

    #[test]
    fn add_many_emits_one_update() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();
        let mut s = MessageStore::new(bus);
        s.add_many("c", vec![Message::assistant_text("a"), Message::assistant_text("b")]);
        let events = drain(&mut rx);
        assert_eq!(events.len(), 3);
        assert_eq!(events[2], StoreEvent::MessagesUpdated { conversation_id: "c".into() });
    }

    #[test]
    fn clear_view_keeps_data() {
        let mut s = MessageStore::new(EventBus::default());
        s.set("c", vec![Message::user_text("x")]);
        s.clear_view();
        assert_eq!(s.get("c").len(), 1);
        s.reset();
        assert!(s.get("c").is_empty());
    }

    #[test]
    fn unknown_conversation_is_empty() {
        let s = MessageStore::new(EventBus::default());
        assert!(s.get("missing").is_empty());
    }
}
