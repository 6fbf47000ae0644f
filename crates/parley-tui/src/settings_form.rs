//! Editable copy of a conversation's settings, shown in the settings panel.

use parley_protocol::Settings;

/// Models offered when cycling the model field with Left/Right.
pub const KNOWN_MODELS: &[&str] = &[
    "claude-3-7-sonnet-20250219",
    "claude-3-5-sonnet-20241022",
    "claude-3-5-haiku-20241022",
    "claude-3-opus-20240229",
];

const TEMPERATURE_STEP: f64 = 0.1;
const MAX_TOKENS_STEP: u32 = 256;
const MAX_TOKENS_LIMIT: u32 = 200_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Title,
    Model,
    Provider,
    Temperature,
    MaxTokens,
    SystemPrompt,
}

impl Field {
    pub const ALL: [Field; 6] = [
        Field::Title,
        Field::Model,
        Field::Provider,
        Field::Temperature,
        Field::MaxTokens,
        Field::SystemPrompt,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Field::Title => "Title",
            Field::Model => "Model",
            Field::Provider => "Provider",
            Field::Temperature => "Temperature",
            Field::MaxTokens => "Max tokens",
            Field::SystemPrompt => "System prompt",
        }
    }

    fn index(self) -> usize {
        Self::ALL.iter().position(|f| *f == self).unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SettingsForm {
    pub conversation_id: String,
    pub focus: Field,
    title: String,
    model: String,
    provider: String,
    temperature: f64,
    max_tokens: u32,
    system_prompt: String,
    /// Fields the form does not edit are carried through unchanged.
    base: Settings,
}

impl SettingsForm {
    /// `title` is the sidebar title, which wins over the stored one.
    pub fn new(conversation_id: impl Into<String>, title: &str, settings: &Settings) -> Self {
        let mut form = Self {
            conversation_id: conversation_id.into(),
            focus: Field::Title,
            title: String::new(),
            model: String::new(),
            provider: String::new(),
            temperature: 0.0,
            max_tokens: 0,
            system_prompt: String::new(),
            base: settings.clone(),
        };
        form.sync(title, settings);
        form
    }

    /// Reload all values, keeping the focused field.
    pub fn sync(&mut self, title: &str, settings: &Settings) {
        self.title = title.to_string();
        self.model = settings.model_config.model.clone();
        self.provider = settings.model_config.provider.clone();
        self.temperature = clamp_temperature(settings.temperature);
        self.max_tokens = settings.max_tokens;
        self.system_prompt = settings.system_prompt.clone();
        self.base = settings.clone();
    }

    pub fn next_field(&mut self) {
        let i = (self.focus.index() + 1) % Field::ALL.len();
        self.focus = Field::ALL[i];
    }

    pub fn prev_field(&mut self) {
        let n = Field::ALL.len();
        let i = (self.focus.index() + n - 1) % n;
        self.focus = Field::ALL[i];
    }

    pub fn increase(&mut self) {
        self.step(1);
    }

    pub fn decrease(&mut self) {
        self.step(-1);
    }

    fn step(&mut self, dir: i32) {
        match self.focus {
            Field::Temperature => {
                self.temperature = clamp_temperature(self.temperature + TEMPERATURE_STEP * f64::from(dir));
            }
            Field::MaxTokens => {
                self.max_tokens = if dir > 0 {
                    self.max_tokens.saturating_add(MAX_TOKENS_STEP).min(MAX_TOKENS_LIMIT)
                } else {
                    self.max_tokens.saturating_sub(MAX_TOKENS_STEP).max(1)
                };
            }
            Field::Model => {
                let n = KNOWN_MODELS.len() as i32;
                let i = match KNOWN_MODELS.iter().position(|m| *m == self.model) {
                    Some(i) => (i as i32 + dir).rem_euclid(n),
                    None => 0,
                };
                self.model = KNOWN_MODELS[i as usize].to_string();
            }
            _ => {}
        }
    }

    pub fn push_char(&mut self, c: char) {
        match self.focus {
            Field::Title => self.title.push(c),
            Field::Model => self.model.push(c),
            Field::Provider => self.provider.push(c),
            Field::SystemPrompt => self.system_prompt.push(c),
            Field::MaxTokens => {
                if let Some(d) = c.to_digit(10) {
                    self.max_tokens = self.max_tokens.saturating_mul(10).saturating_add(d).min(MAX_TOKENS_LIMIT);
                }
            }
            Field::Temperature => {}
        }
    }

    pub fn backspace(&mut self) {
        match self.focus {
            Field::Title => { self.title.pop(); }
            Field::Model => { self.model.pop(); }
            Field::Provider => { self.provider.pop(); }
            Field::SystemPrompt => { self.system_prompt.pop(); }
            Field::MaxTokens => self.max_tokens /= 10,
            Field::Temperature => {}
        }
    }

    pub fn value(&self, field: Field) -> String {
        match field {
            Field::Title => self.title.clone(),
            Field::Model => self.model.clone(),
            Field::Provider => self.provider.clone(),
            Field::Temperature => format!("{:.1}", self.temperature),
            Field::MaxTokens => self.max_tokens.to_string(),
            Field::SystemPrompt => self.system_prompt.clone(),
        }
    }

    pub fn to_settings(&self) -> Settings {
        let mut s = self.base.clone();
        s.title = self.title.trim().to_string();
        s.model_config.model = self.model.trim().to_string();
        s.model_config.provider = self.provider.trim().to_string();
        s.temperature = self.temperature;
        s.max_tokens = self.max_tokens.max(1);
        s.system_prompt = self.system_prompt.clone();
        s
    }
}

/// Clamp to 0.0..=1.0 and round to one decimal.
fn clamp_temperature(t: f64) -> f64 {
    ((t.clamp(0.0, 1.0)) * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn form() -> SettingsForm {
        SettingsForm::new("c1", "My chat", &Settings::default())
    }

    #[test]
    fn starts_from_settings_and_sidebar_title() {
        let f = form();
        assert_eq!(f.value(Field::Title), "My chat");
        assert_eq!(f.value(Field::Temperature), "0.7");
        assert_eq!(f.value(Field::MaxTokens), "4096");
    }

    #[test]
    fn field_focus_wraps_both_ways() {
        let mut f = form();
        f.prev_field();
        assert_eq!(f.focus, Field::SystemPrompt);
        f.next_field();
        assert_eq!(f.focus, Field::Title);
    }

    #[test]
    fn temperature_steps_and_clamps() {
        let mut f = form();
        f.focus = Field::Temperature;
        for _ in 0..5 {
            f.increase();
        }
        assert_eq!(f.value(Field::Temperature), "1.0");
        for _ in 0..15 {
            f.decrease();
        }
        assert_eq!(f.to_settings().temperature, 0.0);
    }

    #[test]
    fn max_tokens_accepts_digits_only() {
        let mut f = form();
        f.focus = Field::MaxTokens;
        for _ in 0..4 {
            f.backspace();
        }
        assert_eq!(f.value(Field::MaxTokens), "0");
        for c in "2x048".chars() {
            f.push_char(c);
        }
        assert_eq!(f.to_settings().max_tokens, 2048);
        f.increase();
        assert_eq!(f.to_settings().max_tokens, 2304);
    }

    #[test]
    fn model_cycles_known_list() {
        let mut f = form();
        f.focus = Field::Model;
        f.decrease();
        assert_eq!(f.value(Field::Model), "claude-3-opus-20240229");
        f.increase();
        assert_eq!(f.value(Field::Model), "claude-3-7-sonnet-20250219");
    }

    #[test]
    fn untouched_fields_survive_round_trip() {
        let mut base = Settings::default();
        base.additional_params.insert("top_p".into(), json!(0.9));
        let mut f = SettingsForm::new("c", "T", &base);
        f.push_char('!');
        let out = f.to_settings();
        assert_eq!(out.title, "T!");
        assert_eq!(out.additional_params.get("top_p"), Some(&json!(0.9)));
    }

    #[test]
    fn sync_keeps_focus() {
        let mut f = form();
        f.focus = Field::Provider;
        let s = Settings { max_tokens: 100, ..Settings::default() };
        f.sync("New", &s);
        assert_eq!(f.focus, Field::Provider);
        assert_eq!(f.value(Field::MaxTokens), "100");
        assert_eq!(f.value(Field::Title), "New");
    }
}
