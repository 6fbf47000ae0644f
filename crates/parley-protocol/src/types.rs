// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

pub const DEFAULT_MODEL: &str = "claude-3-7-sonnet-20250219";
pub const DEFAULT_PROVIDER: &str = "anthropic";
pub const DEFAULT_TEMPERATURE: f64 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 4096;
pub const DEFAULT_TITLE: &str = "New Conversation";

// ── Conversation ──────────────────────────────────────────────────────────────

/// Conversation metadata as listed by the server.  Timestamps are Unix
/// milliseconds; fields the server leaves out read as zero / empty.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Conversation {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
    #[serde(default)]
    pub message_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_message_preview: Option<String>,
}

impl Conversation {
    pub fn new(id: impl Into<String>, title: impl Into<String>, now_ms: i64) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            created_at: now_ms,
            updated_at: now_ms,
            message_count: 0,
            last_message_preview: None,
        }
    }
}

// ── Messages ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }
}

/// One block of message content.
///
/// Block types this client does not know decode to [`ContentBlock::Unknown`]
/// so that a single unfamiliar block does not discard the whole message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        #[serde(default)]
        input: Value,
    },
    ToolResult {
        tool_use_id: String,
        #[serde(default)]
        content: Value,
        #[serde(default)]
        is_error: bool,
    },
    #[serde(other)]
    Unknown,
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        ContentBlock::Text { text: text.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub role: Role,
    #[serde(default, deserialize_with = "content_blocks")]
    pub content: Vec<ContentBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
}

impl Message {
    pub fn new(role: Role, content: Vec<ContentBlock>) -> Self {
        Self { id: None, role, content, created_at: None }
    }

    /// A user message holding a single text block.
    pub fn user_text(text: impl Into<String>) -> Self {
        Self::new(Role::User, vec![ContentBlock::text(text)])
    }

    pub fn assistant_text(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, vec![ContentBlock::text(text)])
    }

    pub fn is_assistant(&self) -> bool {
        self.role == Role::Assistant
    }
}

/// Accepts either a block array or the legacy bare-string form.
fn content_blocks<'de, D>(deserializer: D) -> Result<Vec<ContentBlock>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Blocks(Vec<ContentBlock>),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(Raw::Text(t)) if t.is_empty() => Vec::new(),
        Some(Raw::Text(t)) => vec![ContentBlock::Text { text: t }],
        Some(Raw::Blocks(blocks)) => blocks,
    })
}

// ── Settings ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub model: String,
    pub provider: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self { model: DEFAULT_MODEL.into(), provider: DEFAULT_PROVIDER.into() }
    }
}

/// Per-conversation settings.
///
/// Deserialisation goes through [`SettingsPatch`] so that any field the
/// server omits (or sends as `null`) takes its default value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "SettingsPatch")]
pub struct Settings {
    pub model_config: ModelConfig,
    pub temperature: f64,
    pub max_tokens: u32,
    pub system_prompt: String,
    pub title: String,
    pub additional_params: Map<String, Value>,
    pub mcp_servers: Vec<Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            model_config: ModelConfig::default(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            system_prompt: String::new(),
            title: DEFAULT_TITLE.into(),
            additional_params: Map::new(),
            mcp_servers: Vec::new(),
        }
    }
}

impl Settings {
    /// Overlay `patch` on top of `self`.
    ///
    /// Scalars present in the patch replace the current value; `model_config`
    /// is merged field by field and `additional_params` key by key.
    pub fn apply(mut self, patch: SettingsPatch) -> Self {
        if let Some(mc) = patch.model_config {
            if let Some(m) = mc.model {
                self.model_config.model = m;
            }
            if let Some(p) = mc.provider {
                self.model_config.provider = p;
            }
        }
        // Older servers keep the model name at the top level.
        if let Some(m) = patch.model {
            self.model_config.model = m;
        }
        if let Some(t) = patch.temperature {
            self.temperature = t;
        }
        if let Some(n) = patch.max_tokens {
            self.max_tokens = n;
        }
        if let Some(s) = patch.system_prompt {
            self.system_prompt = s;
        }
        if let Some(t) = patch.title {
            self.title = t;
        }
        if let Some(params) = patch.additional_params {
            self.additional_params.extend(params);
        }
        if let Some(servers) = patch.mcp_servers {
            self.mcp_servers = servers;
        }
        self
    }
}

impl From<SettingsPatch> for Settings {
    fn from(patch: SettingsPatch) -> Self {
        Settings::default().apply(patch)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelConfigPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

/// Partial settings; every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SettingsPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_config: Option<ModelConfigPatch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_params: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mcp_servers: Option<Vec<Value>>,
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn message_accepts_block_array() {
        let m: Message = serde_json::from_value(json!({
            "role": "assistant",
            "content": [
                { "type": "text", "text": "hi" },
                { "type": "tool_use", "id": "t1", "name": "search", "input": { "q": "rust" } }
            ]
        }))
        .unwrap();
        assert_eq!(m.role, Role::Assistant);
        assert_eq!(m.content.len(), 2);
        assert!(matches!(&m.content[1], ContentBlock::ToolUse { name, .. } if name == "search"));
    }

    #[test]
    fn message_accepts_bare_string_content() {
        let m: Message =
            serde_json::from_value(json!({ "role": "user", "content": "plain" })).unwrap();
        assert_eq!(m.content, vec![ContentBlock::text("plain")]);
    }

    #[test]
    fn null_or_missing_content_is_empty() {
        let a: Message = serde_json::from_value(json!({ "role": "user" })).unwrap();
        let b: Message =
            serde_json::from_value(json!({ "role": "user", "content": null })).unwrap();
        assert!(a.content.is_empty());
        assert!(b.content.is_empty());
    }

    #[test]
    fn unknown_block_type_is_kept_as_unknown() {
        let m: Message = serde_json::from_value(json!({
            "role": "assistant",
            "content": [{ "type": "image", "source": {} }, { "type": "text", "text": "ok" }]
        }))
        .unwrap();
        assert_eq!(m.content[0], ContentBlock::Unknown);
        assert_eq!(m.content[1], ContentBlock::text("ok"));
    }

    #[test]
    fn tool_result_is_error_defaults_to_false() {
        let b: ContentBlock = serde_json::from_value(json!({
            "type": "tool_result", "tool_use_id": "t1", "content": "42"
        }))
        .unwrap();
        assert_eq!(
            b,
            ContentBlock::ToolResult { tool_use_id: "t1".into(), content: json!("42"), is_error: false }
        );
    }

    #[test]
    fn user_text_serialises_as_block_array() {
        let v = serde_json::to_value(Message::user_text("hello")).unwrap();
        assert_eq!(v, json!({ "role": "user", "content": [{ "type": "text", "text": "hello" }] }));
    }

    #[test]
    fn conversation_missing_fields_default() {
        let c: Conversation = serde_json::from_value(json!({ "id": "abc", "title": "T" })).unwrap();
        assert_eq!(c.updated_at, 0);
        assert_eq!(c.message_count, 0);
        assert!(c.last_message_preview.is_none());
    }

    // ── Settings ─────────────────────────────────────────────────────────────

    #[test]
    fn empty_settings_object_takes_all_defaults() {
        let s: Settings = serde_json::from_value(json!({})).unwrap();
        assert_eq!(s, Settings::default());
        assert_eq!(s.model_config.model, DEFAULT_MODEL);
        assert_eq!(s.title, DEFAULT_TITLE);
    }

    #[test]
    fn partial_settings_merge_with_defaults() {
        let s: Settings = serde_json::from_value(json!({
            "model_config": { "model": "claude-3-5-haiku" },
            "temperature": 0.2,
            "max_tokens": null
        }))
        .unwrap();
        assert_eq!(s.model_config.model, "claude-3-5-haiku");
        assert_eq!(s.model_config.provider, DEFAULT_PROVIDER);
        assert!((s.temperature - 0.2).abs() < f64::EPSILON);
        assert_eq!(s.max_tokens, DEFAULT_MAX_TOKENS);
    }

    #[test]
    fn legacy_top_level_model_is_understood() {
        let s: Settings = serde_json::from_value(json!({ "model": "m-legacy" })).unwrap();
        assert_eq!(s.model_config.model, "m-legacy");
    }

    #[test]
    fn apply_merges_nested_maps() {
        let mut base = Settings::default();
        base.additional_params.insert("top_p".into(), json!(0.9));
        let patch = SettingsPatch {
            model_config: Some(ModelConfigPatch { provider: Some("openai".into()), model: None }),
            additional_params: Some(Map::from_iter([("top_k".to_string(), json!(40))])),
            ..SettingsPatch::default()
        };
        let s = base.apply(patch);
        assert_eq!(s.model_config.model, DEFAULT_MODEL);
        assert_eq!(s.model_config.provider, "openai");
        assert_eq!(s.additional_params.get("top_p"), Some(&json!(0.9)));
        assert_eq!(s.additional_params.get("top_k"), Some(&json!(40)));
    }

    #[test]
    fn settings_serialise_with_full_field_set() {
        let v = serde_json::to_value(Settings::default()).unwrap();
        for key in ["model_config", "temperature", "max_tokens", "system_prompt", "title", "additional_params", "mcp_servers"] {
            assert!(v.get(key).is_some(), "missing {key}");
        }
    }
}
