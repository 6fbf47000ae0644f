//! Rendering of conversations, threads and settings for headless commands.

use std::fmt::Write as _;

use parley_core::format::{display_value, escape_html, format_number, format_relative_time, pretty_json, to_html, truncate_text};
use parley_core::thread::ToolOutcome;
use parley_core::{build_thread, ThreadBlock, ThreadEntry};
use parley_protocol::{Conversation, Message, Role, Settings};

use crate::cli::OutputFormatArg;

const TITLE_WIDTH: usize = 50;

pub fn render_messages(messages: &[Message], format: OutputFormatArg) -> anyhow::Result<String> {
    Ok(match format {
        OutputFormatArg::Json => serde_json::to_string_pretty(messages)?,
        OutputFormatArg::Text => text(&build_thread(messages)),
        OutputFormatArg::Markdown => markdown(&build_thread(messages)),
        OutputFormatArg::Html => html(&build_thread(messages)),
    })
}

fn role_label(role: Role) -> &'static str {
    match role {
        Role::User => "User",
        Role::Assistant => "Assistant",
        Role::System => "System",
    }
}

// ── Text ──────────────────────────────────────────────────────────────────────

fn text(entries: &[ThreadEntry]) -> String {
    let mut out = String::new();
    for entry in entries {
        let _ = writeln!(out, "{}:", role_label(entry.role));
        for block in &entry.blocks {
            match block {
                ThreadBlock::Text(t) => {
                    let _ = writeln!(out, "{}", t.trim_end());
                }
                ThreadBlock::ToolCall { id, name, input, result } => {
                    let _ = writeln!(out, "[tool {name} ({id})]");
                    let _ = writeln!(out, "{}", pretty_json(input));
                    if let Some(ToolOutcome { content, is_error }) = result {
                        let label = if *is_error { "error" } else { "result" };
                        let _ = writeln!(out, "[{label}]\n{}", display_value(content).trim_end());
                    }
                }
                ThreadBlock::ToolResult { tool_use_id, content, is_error } => {
                    let label = if *is_error { "error" } else { "result" };
                    let _ = writeln!(out, "[{label} for {tool_use_id}]\n{}", display_value(content).trim_end());
                }
                ThreadBlock::Unknown => out.push_str("[unsupported content]\n"),
            }
        }
        out.push('\n');
    }
    out.trim_end().to_string()
}

// ── Markdown ──────────────────────────────────────────────────────────────────

fn markdown(entries: &[ThreadEntry]) -> String {
    let mut out = String::new();
    for entry in entries {
        let mut texts: Vec<&str> = Vec::new();
        for block in &entry.blocks {
            match block {
                ThreadBlock::Text(t) => texts.push(t.as_str()),
                ThreadBlock::ToolCall { id, name, input, result } => {
                    flush_section(&mut out, entry.role, &mut texts);
                    let _ = write!(out, "## Tool\n\n`{name}` ({id})\n\n```json\n{}\n```\n\n", pretty_json(input));
                    if let Some(outcome) = result {
                        tool_result_section(&mut out, &outcome.content, outcome.is_error);
                    }
                }
                ThreadBlock::ToolResult { content, is_error, .. } => {
                    flush_section(&mut out, entry.role, &mut texts);
                    tool_result_section(&mut out, content, *is_error);
                }
                ThreadBlock::Unknown => {}
            }
        }
        flush_section(&mut out, entry.role, &mut texts);
    }
    out.trim_end().to_string()
}

/// Write the pending text blocks as one role section.
fn flush_section(out: &mut String, role: Role, texts: &mut Vec<&str>) {
    if texts.is_empty() {
        return;
    }
    let _ = write!(out, "## {}\n\n{}\n\n", role_label(role), texts.join("\n\n").trim_end());
    texts.clear();
}

fn tool_result_section(out: &mut String, content: &serde_json::Value, is_error: bool) {
    let heading = if is_error { "Tool Error" } else { "Tool Result" };
    let _ = write!(out, "## {heading}\n\n```\n{}\n```\n\n", display_value(content).trim_end());
}

// ── HTML ──────────────────────────────────────────────────────────────────────

fn html(entries: &[ThreadEntry]) -> String {
    let mut out = String::from(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>Conversation</title>\n</head>\n<body>\n",
    );
    for entry in entries {
        let role = entry.role.as_str();
        let _ = writeln!(out, "<div class=\"message {role}\">");
        let _ = writeln!(out, "<div class=\"role\">{}</div>", role_label(entry.role));
        for block in &entry.blocks {
            match block {
                ThreadBlock::Text(t) => {
                    let _ = writeln!(out, "<div class=\"content\">{}</div>", to_html(t));
                }
                ThreadBlock::ToolCall { id, name, input, result } => {
                    let _ = writeln!(out, "<div class=\"tool-use\">");
                    let _ = writeln!(
                        out,
                        "<div class=\"tool-name\">Tool: {}</div>\n<div class=\"tool-id\">ID: {}</div>",
                        escape_html(name),
                        escape_html(id)
                    );
                    let _ = writeln!(out, "<pre><code class=\"language-json\">{}</code></pre>", escape_html(&pretty_json(input)));
                    if let Some(outcome) = result {
                        html_tool_result(&mut out, &outcome.content, outcome.is_error);
                    }
                    out.push_str("</div>\n");
                }
                ThreadBlock::ToolResult { content, is_error, .. } => html_tool_result(&mut out, content, *is_error),
                ThreadBlock::Unknown => {}
            }
        }
        out.push_str("</div>\n");
    }
    out.push_str("</body>\n</html>");
    out
}

fn html_tool_result(out: &mut String, content: &serde_json::Value, is_error: bool) {
    let class = if is_error { "tool-result error" } else { "tool-result" };
    let _ = writeln!(out, "<pre class=\"{class}\">{}</pre>", escape_html(&display_value(content)));
}

// ── Conversations and settings ────────────────────────────────────────────────

pub fn render_conversation_table(conversations: &[Conversation], now_ms: i64) -> String {
    if conversations.is_empty() {
        return "No conversations yet.".to_string();
    }
    let id_w = conversations.iter().map(|c| c.id.chars().count()).max().unwrap_or(2).max(2);
    let mut out = String::new();
    let _ = writeln!(out, "{:<id_w$}  {:<16}  {:>8}  TITLE", "ID", "UPDATED", "MESSAGES");
    let _ = writeln!(out, "{}", "-".repeat(id_w + 32 + TITLE_WIDTH));
    for c in conversations {
        let _ = writeln!(
            out,
            "{:<id_w$}  {:<16}  {:>8}  {}",
            c.id,
            format_relative_time(c.updated_at, now_ms),
            format_number(c.message_count),
            truncate_text(&c.title, TITLE_WIDTH),
        );
    }
    let _ = write!(out, "\nTotal: {} conversation(s)", conversations.len());
    out
}

pub fn render_settings(settings: &Settings) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "title:         {}", settings.title);
    let _ = writeln!(out, "model:         {}", settings.model_config.model);
    let _ = writeln!(out, "provider:      {}", settings.model_config.provider);
    let _ = writeln!(out, "temperature:   {:.1}", settings.temperature);
    let _ = writeln!(out, "max_tokens:    {}", format_number(u64::from(settings.max_tokens)));
    if settings.system_prompt.is_empty() {
        out.push_str("system_prompt: (none)");
    } else {
        let _ = write!(out, "system_prompt: {}", settings.system_prompt);
    }
    if !settings.mcp_servers.is_empty() {
        let _ = write!(out, "\nmcp_servers:   {}", settings.mcp_servers.len());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_protocol::ContentBlock;
    use serde_json::json;

    fn tool_exchange() -> Vec<Message> {
        vec![
            Message::user_text("what is 2+2?"),
            Message::new(
                Role::Assistant,
                vec![
                    ContentBlock::text("Let me check."),
                    ContentBlock::ToolUse { id: "t1".into(), name: "calc".into(), input: json!({ "expr": "2+2" }) },
                ],
            ),
            Message::new(
                Role::User,
                vec![ContentBlock::ToolResult { tool_use_id: "t1".into(), content: json!("4"), is_error: false }],
            ),
            Message::assistant_text("It is `4`."),
        ]
    }

    #[test]
    fn text_pairs_tool_results_with_calls() {
        let out = render_messages(&tool_exchange(), OutputFormatArg::Text).unwrap();
        assert_eq!(
            out,
            "User:\nwhat is 2+2?\n\nAssistant:\nLet me check.\n[tool calc (t1)]\n{\n  \"expr\": \"2+2\"\n}\n[result]\n4\n\nAssistant:\nIt is `4`."
        );
    }

    #[test]
    fn markdown_uses_role_sections() {
        let out = render_messages(&tool_exchange(), OutputFormatArg::Markdown).unwrap();
        assert!(out.starts_with("## User\n\nwhat is 2+2?\n\n## Assistant\n\nLet me check.\n\n## Tool\n\n`calc` (t1)"));
        assert!(out.contains("## Tool Result\n\n```\n4\n```"));
        assert!(out.ends_with("## Assistant\n\nIt is `4`."));
    }

    #[test]
    fn html_escapes_and_formats_code() {
        let messages = vec![Message::user_text("<b>hi</b> `x`")];
        let out = render_messages(&messages, OutputFormatArg::Html).unwrap();
        assert!(out.contains("<div class=\"message user\">"));
        assert!(out.contains("&lt;b&gt;hi&lt;/b&gt; <code>x</code>"));
        assert!(!out.contains("<b>hi"));
    }

    #[test]
    fn json_keeps_raw_messages() {
        let out = render_messages(&tool_exchange(), OutputFormatArg::Json).unwrap();
        let back: Vec<Message> = serde_json::from_str(&out).unwrap();
        assert_eq!(back.len(), 4);
        assert_eq!(back[2].role, Role::User);
    }

    #[test]
    fn conversation_table_lists_each_row() {
        let now = 10 * 60 * 1000;
        let mut c = Conversation::new("abc", "Hello", now - 5 * 60 * 1000);
        c.message_count = 1200;
        let out = render_conversation_table(&[c], now);
        let lines: Vec<&str> = out.lines().collect();
        assert!(lines[0].starts_with("ID "));
        assert!(lines[2].starts_with("abc "));
        assert!(lines[2].contains("5 minutes ago"));
        assert!(lines[2].contains("1,200"));
        assert!(lines[2].ends_with("Hello"));
        assert_eq!(lines.last(), Some(&"Total: 1 conversation(s)"));
    }

    #[test]
    fn empty_conversation_table() {
        assert_eq!(render_conversation_table(&[], 0), "No conversations yet.");
    }

    #[test]
    fn settings_summary() {
        let out = render_settings(&Settings::default());
        assert!(out.contains("model:         claude-3-7-sonnet-20250219"));
        assert!(out.contains("temperature:   0.7"));
        assert!(out.contains("max_tokens:    4,096"));
        assert!(out.ends_with("system_prompt: (none)"));
    }
}
