use parley_protocol::{Conversation, Message};

use crate::bus::{EventBus, StoreEvent};
use crate::format::{extract_text, preview};

/// Conversation list, newest activity first, plus the active selection.
#[derive(Debug)]
pub struct ConversationStore {
    bus: EventBus,
    items: Vec<Conversation>,
    active: Option<String>,
}

impl ConversationStore {
    pub fn new(bus: EventBus) -> Self {
        Self { bus, items: Vec::new(), active: None }
    }

    fn sort(&mut self) {
        // Stable: equal timestamps keep insertion order.
        self.items.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    }

    fn changed(&self) {
        self.bus.emit(StoreEvent::ConversationsUpdated);
    }

    /// Returns `true` (and emits) only when the selection actually changed.
    pub fn set_active(&mut self, id: Option<String>) -> bool {
        if self.active == id {
            return false;
        }
        self.active = id.clone();
        self.bus.emit(StoreEvent::ActiveConversationChanged(id));
        true
    }

    pub fn active_id(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn active(&self) -> Option<&Conversation> {
        self.active.as_deref().and_then(|id| self.get(id))
    }

    /// Insert or replace by id.
    pub fn add(&mut self, conversation: Conversation) {
        match self.items.iter_mut().find(|c| c.id == conversation.id) {
            Some(existing) => *existing = conversation,
            None => self.items.push(conversation),
        }
        self.sort();
        self.changed();
    }

    pub fn set_all(&mut self, conversations: Vec<Conversation>) {
        self.items = conversations;
        self.sort();
        self.changed();
    }

    /// Record activity on a conversation: bump the timestamp and message
    /// count and, when `message` has text, refresh the preview.
    pub fn update_preview(&mut self, id: &str, message: Option<&Message>, now_ms: i64) -> bool {
        let Some(conv) = self.items.iter_mut().find(|c| c.id == id) else {
            return false;
        };
        if let Some(text) = message.map(extract_text).filter(|t| !t.is_empty()) {
            conv.last_message_preview = Some(preview(&text));
        }
        conv.updated_at = now_ms;
        conv.message_count += 1;
        self.sort();
        self.changed();
        true
    }

    pub fn update_title(&mut self, id: &str, title: &str) -> bool {
        let Some(conv) = self.items.iter_mut().find(|c| c.id == id) else {
            return false;
        };
        conv.title = title.to_string();
        self.changed();
        true
    }

    pub fn get(&self, id: &str) -> Option<&Conversation> {
        self.items.iter().find(|c| c.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn list(&self) -> &[Conversation] {
        &self.items
    }

    pub fn most_recent(&self) -> Option<&Conversation> {
        self.items.first()
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.items.iter().position(|c| c.id == id)
    }

    pub fn reset(&mut self) {
        self.items.clear();
        self.set_active(None);
        self.changed();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conv(id: &str, updated_at: i64) -> Conversation {
        Conversation { updated_at, ..Conversation::new(id, format!("T {id}"), 0) }
    }

    fn ids(store: &ConversationStore) -> Vec<&str> {
        store.list().iter().map(|c| c.id.as_str()).collect()
    }

    #[test]
    fn list_is_sorted_newest_first() {
        let mut s = ConversationStore::new(EventBus::default());
        s.set_all(vec![conv("a", 1), conv("b", 3), conv("c", 2)]);
        assert_eq!(ids(&s), ["b", "c", "a"]);
        assert_eq!(s.most_recent().map(|c| c.id.as_str()), Some("b"));
    }

    #[test]
    fn ties_keep_insertion_order() {
        let mut s = ConversationStore::new(EventBus::default());
        s.set_all(vec![conv("x", 0), conv("y", 0), conv("z", 0)]);
        assert_eq!(ids(&s), ["x", "y", "z"]);
    }

    #[test]
    fn add_is_an_upsert() {
        let mut s = ConversationStore::new(EventBus::default());
        s.add(conv("a", 1));
        s.add(conv("b", 2));
        s.add(Conversation { title: "renamed".into(), ..conv("a", 5) });
        assert_eq!(ids(&s), ["a", "b"]);
        assert_eq!(s.get("a").map(|c| c.title.as_str()), Some("renamed"));
    }

    #[test]
    fn set_active_emits_only_on_change() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();
        let mut s = ConversationStore::new(bus);
        assert!(s.set_active(Some("a".into())));
        assert!(!s.set_active(Some("a".into())));
        assert_eq!(rx.try_recv().unwrap(), StoreEvent::ActiveConversationChanged(Some("a".into())));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn update_preview_truncates_and_moves_to_top() {
        let mut s = ConversationStore::new(EventBus::default());
        s.set_all(vec![conv("new", 10), conv("old", 1)]);
        let msg = Message::assistant_text("y".repeat(60));
        assert!(s.update_preview("old", Some(&msg), 100));

        let old = s.get("old").unwrap();
        assert_eq!(old.last_message_preview.as_deref(), Some(format!("{}...", "y".repeat(50)).as_str()));
        assert_eq!(old.updated_at, 100);
        assert_eq!(old.message_count, 1);
        assert_eq!(ids(&s), ["old", "new"]);
    }

    #[test]
    fn update_preview_without_message_only_bumps() {
        let mut s = ConversationStore::new(EventBus::default());
        s.add(Conversation { last_message_preview: Some("keep".into()), ..conv("a", 1) });
        s.update_preview("a", None, 7);
        let a = s.get("a").unwrap();
        assert_eq!(a.last_message_preview.as_deref(), Some("keep"));
        assert_eq!(a.message_count, 1);
    }

    #[test]
    fn unknown_ids_are_ignored() {
        let mut s = ConversationStore::new(EventBus::default());
        assert!(!s.update_preview("nope", None, 1));
        assert!(!s.update_title("nope", "x"));
    }

    #[test]
    fn reset_clears_list_and_selection() {
        let mut s = ConversationStore::new(EventBus::default());
        s.add(conv("a", 1));
        s.set_active(Some("a".into()));
        s.reset();
        assert!(s.list().is_empty());
        assert!(s.active_id().is_none());
    }
}
