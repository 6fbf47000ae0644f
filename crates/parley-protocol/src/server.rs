// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::ProtocolError;
use crate::types::{Conversation, Message, Settings};

/// Routing key for a [`ServerMessage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MessageKind {
    Welcome,
    ConversationCreated,
    ConversationList,
    Message,
    Messages,
    Conversation,
    Settings,
    SettingsUpdated,
    ConversationRenamed,
    Error,
    Success,
    Unknown,
}

impl MessageKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MessageKind::Welcome => "welcome",
            MessageKind::ConversationCreated => "conversation_created",
            MessageKind::ConversationList => "conversation_list",
            MessageKind::Message => "message",
            MessageKind::Messages => "messages",
            MessageKind::Conversation => "conversation",
            MessageKind::Settings => "settings",
            MessageKind::SettingsUpdated => "settings_updated",
            MessageKind::ConversationRenamed => "conversation_renamed",
            MessageKind::Error => "error",
            MessageKind::Success => "success",
            MessageKind::Unknown => "unknown",
        }
    }

    /// Map a wire tag to a kind.  `history` is the older name of
    /// `conversation`.  Returns `None` for tags this client does not know.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Some(match tag {
            "welcome" => MessageKind::Welcome,
            "conversation_created" => MessageKind::ConversationCreated,
            "conversation_list" => MessageKind::ConversationList,
            "message" => MessageKind::Message,
            "messages" => MessageKind::Messages,
            "conversation" | "history" => MessageKind::Conversation,
            "settings" => MessageKind::Settings,
            "settings_updated" => MessageKind::SettingsUpdated,
            "conversation_renamed" => MessageKind::ConversationRenamed,
            "error" => MessageKind::Error,
            "success" => MessageKind::Success,
            _ => return None,
        })
    }

    /// Field that older servers deliver under `content` instead.
    fn payload_field(self) -> Option<&'static str> {
        match self {
            MessageKind::ConversationCreated | MessageKind::Message | MessageKind::Error => {
                Some("message")
            }
            MessageKind::ConversationList => Some("conversations"),
            MessageKind::Messages | MessageKind::Conversation => Some("messages"),
            MessageKind::Settings => Some("settings"),
            _ => None,
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Messages pushed by the server, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Welcome {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        conversation_id: Option<String>,
    },
    ConversationCreated {
        conversation_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    ConversationList {
        #[serde(default, deserialize_with = "conversation_map_or_list")]
        conversations: Vec<Conversation>,
    },
    Message {
        conversation_id: String,
        message: Message,
    },
    Messages {
        conversation_id: String,
        #[serde(default)]
        messages: Vec<Message>,
    },
    Conversation {
        conversation_id: String,
        #[serde(default)]
        messages: Vec<Message>,
    },
    Settings {
        conversation_id: String,
        settings: Settings,
    },
    SettingsUpdated {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        conversation_id: Option<String>,
    },
    ConversationRenamed {
        conversation_id: String,
        title: String,
    },
    Error {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        conversation_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error_code: Option<String>,
        #[serde(default)]
        message: String,
    },
    Success,
    /// A tag this client does not understand.  Never produced by serde.
    #[serde(skip)]
    Unknown { kind: String },
}

impl ServerMessage {
    /// Decode one text frame.
    ///
    /// Frames tagged with `message_type` and carrying their payload under
    /// `content` are normalised first.  Unknown tags become
    /// [`ServerMessage::Unknown`] instead of an error.
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(value)
    }

    pub fn from_value(mut value: Value) -> Result<Self, ProtocolError> {
        let obj = value.as_object_mut().ok_or(ProtocolError::NotAnObject)?;

        let tag = obj
            .get("type")
            .or_else(|| obj.get("message_type"))
            .and_then(Value::as_str)
            .map(str::to_owned)
            .ok_or(ProtocolError::MissingTag)?;

        let Some(kind) = MessageKind::from_tag(&tag) else {
            return Ok(ServerMessage::Unknown { kind: tag });
        };

        obj.remove("message_type");
        obj.insert("type".into(), Value::String(kind.as_str().into()));

        if let Some(field) = kind.payload_field() {
            if !obj.contains_key(field) {
                if let Some(content) = obj.remove("content") {
                    obj.insert(field.into(), content);
                }
            }
        }
        if kind == MessageKind::Error && !obj.contains_key("error_code") {
            if let Some(code @ Value::String(_)) = obj.remove("error") {
                obj.insert("error_code".into(), code);
            }
        }

        serde_json::from_value(value).map_err(|source| ProtocolError::Payload { kind: tag, source })
    }

    pub fn kind(&self) -> MessageKind {
        match self {
            ServerMessage::Welcome { .. } => MessageKind::Welcome,
            ServerMessage::ConversationCreated { .. } => MessageKind::ConversationCreated,
            ServerMessage::ConversationList { .. } => MessageKind::ConversationList,
            ServerMessage::Message { .. } => MessageKind::Message,
            ServerMessage::Messages { .. } => MessageKind::Messages,
            ServerMessage::Conversation { .. } => MessageKind::Conversation,
            ServerMessage::Settings { .. } => MessageKind::Settings,
            ServerMessage::SettingsUpdated { .. } => MessageKind::SettingsUpdated,
            ServerMessage::ConversationRenamed { .. } => MessageKind::ConversationRenamed,
            ServerMessage::Error { .. } => MessageKind::Error,
            ServerMessage::Success => MessageKind::Success,
            ServerMessage::Unknown { .. } => MessageKind::Unknown,
        }
    }

    /// Conversation the message refers to, when it names one.
    pub fn conversation_id(&self) -> Option<&str> {
        match self {
            ServerMessage::ConversationCreated { conversation_id, .. }
            | ServerMessage::Message { conversation_id, .. }
            | ServerMessage::Messages { conversation_id, .. }
            | ServerMessage::Conversation { conversation_id, .. }
            | ServerMessage::Settings { conversation_id, .. }
            | ServerMessage::ConversationRenamed { conversation_id, .. } => Some(conversation_id),
            ServerMessage::Welcome { conversation_id, .. }
            | ServerMessage::SettingsUpdated { conversation_id }
            | ServerMessage::Error { conversation_id, .. } => {
                conversation_id.as_deref().filter(|id| !id.is_empty())
            }
            ServerMessage::ConversationList { .. }
            | ServerMessage::Success
            | ServerMessage::Unknown { .. } => None,
        }
    }
}

/// The server keys conversations by id; older servers send a plain array.
fn conversation_map_or_list<'de, D>(deserializer: D) -> Result<Vec<Conversation>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Map(BTreeMap<String, Conversation>),
        List(Vec<Conversation>),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(Raw::List(list)) => list,
        Some(Raw::Map(map)) => map
            .into_iter()
            .map(|(key, mut conv)| {
                if conv.id.is_empty() {
                    conv.id = key;
                }
                conv
            })
            .collect(),
    })
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
