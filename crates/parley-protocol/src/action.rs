use serde::{Deserialize, Serialize};

use crate::types::{Message, Settings};

/// Requests sent from the client, tagged by `action`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ClientAction {
    NewConversation {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        system: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        settings: Option<Settings>,
    },
    SendMessage {
        conversation_id: String,
        message: Message,
    },
    ListConversations,
    GetHistory {
        conversation_id: String,
    },
    GetSettings {
        conversation_id: String,
    },
    UpdateSettings {
        conversation_id: String,
        settings: Settings,
    },
}

impl ClientAction {
    pub fn name(&self) -> &'static str {
        match self {
            ClientAction::NewConversation { .. } => "new_conversation",
            ClientAction::SendMessage { .. } => "send_message",
            ClientAction::ListConversations => "list_conversations",
            ClientAction::GetHistory { .. } => "get_history",
            ClientAction::GetSettings { .. } => "get_settings",
            ClientAction::UpdateSettings { .. } => "update_settings",
        }
    }

    pub fn conversation_id(&self) -> Option<&str> {
        match self {
            ClientAction::SendMessage { conversation_id, .. }
            | ClientAction::GetHistory { conversation_id }
            | ClientAction::GetSettings { conversation_id }
            | ClientAction::UpdateSettings { conversation_id, .. } => Some(conversation_id),
            ClientAction::NewConversation { .. } | ClientAction::ListConversations => None,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn wire(a: &ClientAction) -> Value {
        serde_json::from_str(&a.to_json().unwrap()).unwrap()
    }

    #[test]
    fn list_conversations_is_bare_action() {
        assert_eq!(wire(&ClientAction::ListConversations), json!({ "action": "list_conversations" }));
    }

    #[test]
    fn new_conversation_omits_absent_fields() {
        let a = ClientAction::NewConversation { system: None, settings: None };
        assert_eq!(wire(&a), json!({ "action": "new_conversation" }));
    }

    #[test]
    fn send_message_carries_role_and_text_block() {
        let a = ClientAction::SendMessage {
            conversation_id: "c1".into(),
            message: Message::user_text("hello"),
        };
        assert_eq!(
            wire(&a),
            json!({
                "action": "send_message",
                "conversation_id": "c1",
                "message": { "role": "user", "content": [{ "type": "text", "text": "hello" }] }
            })
        );
    }

    #[test]
    fn name_matches_wire_tag() {
        let actions = [
            ClientAction::NewConversation { system: Some("be brief".into()), settings: None },
            ClientAction::ListConversations,
            ClientAction::GetHistory { conversation_id: "c".into() },
            ClientAction::GetSettings { conversation_id: "c".into() },
            ClientAction::UpdateSettings { conversation_id: "c".into(), settings: Settings::default() },
        ];
        for a in &actions {
            assert_eq!(wire(a)["action"], a.name());
        }
    }

    #[test]
    fn conversation_id_accessor() {
        assert_eq!(ClientAction::GetHistory { conversation_id: "x".into() }.conversation_id(), Some("x"));
        assert_eq!(ClientAction::ListConversations.conversation_id(), None);
    }
}
