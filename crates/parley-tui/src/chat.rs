// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Turns a conversation thread into styled lines for the chat pane.

use parley_core::format::{display_value, pretty_json};
use parley_core::{ThreadBlock, ThreadEntry};
use parley_protocol::Role;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use serde_json::Value;

use crate::markdown::{render_markdown, StyledLines};
use crate::theme::Theme;

const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];
const BRAILLE_SPINNER: [&str; 8] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧"];
const BAR_COLS: u16 = 2;

pub struct ChatStyle<'a> {
    pub theme: &'a Theme,
    pub ascii: bool,
    /// Only show the name and id of tool calls.
    pub collapse_tools: bool,
    /// Total width available for the thread, bar included.
    pub width: u16,
}

pub fn spinner_frame(tick: usize, ascii: bool) -> &'static str {
    if ascii {
        SPINNER[tick % SPINNER.len()]
    } else {
        BRAILLE_SPINNER[tick % BRAILLE_SPINNER.len()]
    }
}

/// Render `entries`; while `waiting` is set a loading line is appended.
pub fn render_thread(entries: &[ThreadEntry], waiting: Option<usize>, style: &ChatStyle<'_>) -> StyledLines {
    let theme = style.theme;
    let body_width = style.width.saturating_sub(BAR_COLS).max(10);
    let mut out: StyledLines = Vec::new();

    for entry in entries {
        let (label, colour) = match entry.role {
            Role::User => ("You", theme.user),
            Role::Assistant => ("Assistant", theme.assistant),
            Role::System => ("System", theme.muted),
        };
        let bar = Style::default().fg(colour);
        out.push(Line::from(Span::styled(
            label.to_string(),
            Style::default().fg(colour).add_modifier(Modifier::BOLD),
        )));

        let mut body: StyledLines = Vec::new();
        for block in &entry.blocks {
            match block {
                ThreadBlock::Text(text) => {
                    body.extend(render_markdown(text, body_width, theme, style.ascii));
                }
                ThreadBlock::ToolCall { id, name, input, result } => {
                    body.extend(tool_header(name, id, theme));
                    if !style.collapse_tools {
                        body.extend(json_lines(&pretty_json(input), Style::default().fg(theme.code)));
                    }
                    if let Some(outcome) = result {
                        body.extend(tool_outcome(&outcome.content, outcome.is_error, style));
                    }
                }
                ThreadBlock::ToolResult { tool_use_id, content, is_error } => {
                    body.push(Line::from(Span::styled(
                        format!("Tool result for {tool_use_id}"),
                        Style::default().fg(theme.tool),
                    )));
                    body.extend(tool_outcome(content, *is_error, style));
                }
                ThreadBlock::Unknown => {
                    body.push(Line::from(Span::styled("[unsupported content]", theme.dim())));
                }
            }
        }
        out.extend(with_bar(body, bar, style.ascii));
        out.push(Line::default());
    }

    if let Some(tick) = waiting {
        out.push(Line::from(vec![
            Span::styled(format!("{} ", spinner_frame(tick, style.ascii)), Style::default().fg(theme.assistant)),
            Span::styled("Assistant is thinking...", theme.dim()),
        ]));
    }
    out
}

/// Placeholder shown when no conversation is active.
pub fn empty_thread(theme: &Theme) -> StyledLines {
    vec![
        Line::default(),
        Line::from(Span::styled("No conversation selected.", theme.title())),
        Line::from(Span::styled(
            "Pick one from the sidebar or press Ctrl+N to start a new one.",
            theme.dim(),
        )),
    ]
}

fn tool_header(name: &str, id: &str, theme: &Theme) -> StyledLines {
    vec![
        Line::from(Span::styled(
            format!("Tool: {name}"),
            Style::default().fg(theme.tool).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(format!("ID: {id}"), theme.dim())),
    ]
}

fn tool_outcome(content: &Value, is_error: bool, style: &ChatStyle<'_>) -> StyledLines {
    let theme = style.theme;
    let (label, colour) = if is_error { ("Error", theme.error) } else { ("Result", theme.success) };
    let mut lines = vec![Line::from(Span::styled(
        format!("{label}:"),
        Style::default().fg(colour).add_modifier(Modifier::BOLD),
    ))];
    let text = display_value(content);
    if style.collapse_tools {
        let n = text.lines().count();
        lines.push(Line::from(Span::styled(format!("  ({n} lines hidden)"), theme.dim())));
    } else {
        let body_style = if is_error { Style::default().fg(theme.error) } else { theme.text() };
        lines.extend(json_lines(&text, body_style));
    }
    lines
}

fn json_lines(text: &str, style: Style) -> StyledLines {
    text.lines()
        .map(|l| Line::from(Span::styled(format!("  {l}"), style)))
        .collect()
}

fn with_bar(lines: StyledLines, bar_style: Style, ascii: bool) -> StyledLines {
    let bar = if ascii { "| " } else { "▌ " };
    lines
        .into_iter()
        .map(|line| {
            let mut spans = Vec::with_capacity(line.spans.len() + 1);
            spans.push(Span::styled(bar, bar_style));
            spans.extend(line.spans);
            Line::from(spans)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_core::thread::ToolOutcome;
    use serde_json::json;

    fn text_of(lines: &StyledLines) -> Vec<String> {
        lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    fn style(theme: &Theme, collapse_tools: bool) -> ChatStyle<'_> {
        ChatStyle { theme, ascii: true, collapse_tools, width: 60 }
    }

    #[test]
    fn entries_get_role_header_and_bar() {
        let theme = Theme::dark();
        let entries = vec![
            ThreadEntry { role: Role::User, blocks: vec![ThreadBlock::Text("hi".into())] },
            ThreadEntry { role: Role::Assistant, blocks: vec![ThreadBlock::Text("hello".into())] },
        ];
        let out = text_of(&render_thread(&entries, None, &style(&theme, false)));
        assert_eq!(out, ["You", "| hi", "", "Assistant", "| hello", ""]);
    }

    #[test]
    fn tool_call_shows_name_id_input_and_result() {
        let theme = Theme::dark();
        let entries = vec![ThreadEntry {
            role: Role::Assistant,
            blocks: vec![ThreadBlock::ToolCall {
                id: "t1".into(),
                name: "lookup".into(),
                input: json!({ "q": "x" }),
                result: Some(ToolOutcome { content: json!("boom"), is_error: true }),
            }],
        }];
        let lines = render_thread(&entries, None, &style(&theme, false));
        let out = text_of(&lines);
        assert_eq!(
            out[1..7],
            ["| Tool: lookup", "| ID: t1", "|   {", "|     \"q\": \"x\"", "|   }", "| Error:"]
        );
        assert_eq!(out[7], "|   boom");
        assert_eq!(lines[7].spans[1].style.fg, Some(theme.error));
    }

    #[test]
    fn collapsed_tools_hide_bodies() {
        let theme = Theme::dark();
        let entries = vec![ThreadEntry {
            role: Role::Assistant,
            blocks: vec![ThreadBlock::ToolCall {
                id: "t1".into(),
                name: "lookup".into(),
                input: json!({ "q": "x" }),
                result: Some(ToolOutcome { content: json!("a\nb"), is_error: false }),
            }],
        }];
        let out = text_of(&render_thread(&entries, None, &style(&theme, true)));
        assert_eq!(out[1..5], ["| Tool: lookup", "| ID: t1", "| Result:", "|   (2 lines hidden)"]);
    }

    #[test]
    fn waiting_appends_loading_line() {
        let theme = Theme::dark();
        let out = text_of(&render_thread(&[], Some(1), &style(&theme, false)));
        assert_eq!(out, ["/ Assistant is thinking..."]);
    }
}
