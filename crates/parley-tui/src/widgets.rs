// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use parley_client::ConnectionState;
use parley_core::format::format_relative_time;
use parley_core::{Notice, NoticeLevel};
use parley_protocol::Conversation;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use crate::chat::spinner_frame;
use crate::input::InputBuffer;
use crate::layout::centered;
use crate::markdown::StyledLines;
use crate::settings_form::{Field, SettingsForm};
use crate::theme::Theme;

// ── Character sets ────────────────────────────────────────────────────────────

fn sep(ascii: bool) -> &'static str {
    if ascii { "|" } else { "│" }
}
fn rule_char(ascii: bool) -> char {
    if ascii { '-' } else { '─' }
}
fn blockquote_prefix(ascii: bool) -> &'static str {
    if ascii { "> " } else { "▌ " }
}
fn bullet(ascii: bool) -> &'static str {
    if ascii { "- " } else { "• " }
}
fn border_type(ascii: bool) -> BorderType {
    if ascii { BorderType::Plain } else { BorderType::Rounded }
}

// ── Draw functions ────────────────────────────────────────────────────────────

/// Draw the status bar at the top.
#[allow(clippy::too_many_arguments)]
pub fn draw_status(
    frame: &mut Frame,
    area: Rect,
    state: ConnectionState,
    model_name: &str,
    waiting: bool,
    tick: usize,
    theme: &Theme,
    ascii: bool,
) {
    let state_style = match state {
        ConnectionState::Connected => Style::default().fg(theme.success),
        ConnectionState::Connecting | ConnectionState::Reconnecting { .. } => Style::default().fg(theme.tool),
        ConnectionState::Disconnected => Style::default().fg(theme.error),
    };
    let busy = if waiting { format!(" {} ", spinner_frame(tick, ascii)) } else { "   ".to_string() };
    let separator = sep(ascii);

    let line = Line::from(vec![
        Span::styled(busy, Style::default().fg(theme.assistant)),
        Span::styled(format!("{state} "), state_style.add_modifier(Modifier::BOLD)),
        Span::styled(separator, theme.dim()),
        Span::styled(format!(" {model_name} "), Style::default().fg(theme.accent)),
        Span::styled(separator, theme.dim()),
        Span::styled(
            "  F1:help  ^N:new  F2:settings  ^B:sidebar  ^T:theme  ^R:reconnect  ^C:quit",
            theme.dim(),
        ),
    ]);

    let para = Paragraph::new(line).style(Style::default().bg(theme.status_bg));
    frame.render_widget(para, area);
}

/// Draw the conversation list.
#[allow(clippy::too_many_arguments)]
pub fn draw_sidebar(
    frame: &mut Frame,
    area: Rect,
    conversations: &[Conversation],
    active: Option<&str>,
    selected: usize,
    focused: bool,
    now_ms: i64,
    theme: &Theme,
    ascii: bool,
) {
    if area.width == 0 {
        return;
    }
    let block = pane_block("Conversations", focused, theme, ascii);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if conversations.is_empty() {
        frame.render_widget(Paragraph::new(Span::styled("No conversations yet", theme.dim())), inner);
        return;
    }

    let items: Vec<ListItem> = conversations
        .iter()
        .map(|c| {
            let is_active = active == Some(c.id.as_str());
            let marker = if is_active { "* " } else { "  " };
            let title_style = if is_active { theme.title() } else { theme.text() };
            let mut lines = vec![
                Line::from(Span::styled(format!("{marker}{}", c.title), title_style)),
                Line::from(Span::styled(
                    format!("  {}", format_relative_time(c.updated_at, now_ms)),
                    theme.dim(),
                )),
            ];
            if let Some(preview) = c.last_message_preview.as_deref().filter(|p| !p.is_empty()) {
                lines.push(Line::from(Span::styled(format!("  {preview}"), theme.dim())));
            }
            ListItem::new(lines)
        })
        .collect();

    let mut state = ListState::default().with_selected(Some(selected.min(conversations.len() - 1)));
    let list = List::new(items).highlight_style(if focused { theme.selected() } else { Style::default() });
    frame.render_stateful_widget(list, inner, &mut state);
}

/// Draw the thread; `scroll` counts lines from the top.
#[allow(clippy::too_many_arguments)]
pub fn draw_chat(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    lines: &StyledLines,
    scroll: u16,
    focused: bool,
    theme: &Theme,
    ascii: bool,
) {
    let block = pane_block(title, focused, theme, ascii);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let para = Paragraph::new(lines.clone()).wrap(Wrap { trim: false }).scroll((scroll, 0));
    frame.render_widget(para, inner);
}

/// Draw the input box at the bottom.
pub fn draw_input(
    frame: &mut Frame,
    area: Rect,
    input: &InputBuffer,
    focused: bool,
    waiting: bool,
    theme: &Theme,
    ascii: bool,
) {
    let title = if waiting {
        "Input  [waiting for reply]"
    } else {
        "Input  [Enter:send  Shift+Enter:newline]"
    };
    let block = pane_block(title, focused, theme, ascii);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let (row, col) = input.cursor_position(inner.width);
    // Keep the cursor row in view.
    let scroll = row.saturating_sub(inner.height.saturating_sub(1));
    let para = Paragraph::new(input.text()).wrap(Wrap { trim: false }).scroll((scroll, 0));
    frame.render_widget(para, inner);

    if focused && inner.width > 0 && inner.height > 0 {
        frame.set_cursor_position((inner.x + col, inner.y + row - scroll));
    }
}

/// Draw the transient notice line at the bottom.
pub fn draw_notice(frame: &mut Frame, area: Rect, notice: Option<&Notice>, theme: &Theme) {
    let Some(notice) = notice else { return };
    let style = match notice.level {
        NoticeLevel::Error => Style::default().fg(theme.error).add_modifier(Modifier::BOLD),
        NoticeLevel::Info => Style::default().fg(theme.success),
    };
    frame.render_widget(Paragraph::new(Span::styled(format!(" {}", notice.text), style)), area);
}

/// Draw the settings panel overlay.
pub fn draw_settings(frame: &mut Frame, form: &SettingsForm, theme: &Theme, ascii: bool) {
    let overlay = centered(frame.area(), 70, 16);
    frame.render_widget(Clear, overlay);

    let block = Block::default()
        .title(Span::styled(" Conversation settings ", theme.title()))
        .borders(Borders::ALL)
        .border_type(border_type(ascii))
        .border_style(Style::default().fg(theme.accent));
    let inner = block.inner(overlay);
    frame.render_widget(block, overlay);

    let mut lines: Vec<Line> = Vec::new();
    for field in Field::ALL {
        let focused = form.focus == field;
        let marker = if focused { "> " } else { "  " };
        let value_style = if focused { theme.selected() } else { theme.text() };
        let mut value = form.value(field);
        if focused && !matches!(field, Field::Temperature | Field::MaxTokens) {
            value.push('_');
        }
        let hint = match field {
            Field::Temperature => "  (0.0-1.0, Left/Right)",
            Field::MaxTokens => "  (digits, Left/Right)",
            Field::Model => "  (type or Left/Right)",
            _ => "",
        };
        lines.push(Line::from(vec![
            Span::styled(format!("{marker}{:<14}", field.label()), theme.dim()),
            Span::styled(value, value_style),
            Span::styled(hint, theme.dim()),
        ]));
        lines.push(Line::default());
    }
    lines.push(Line::from(Span::styled(
        " Tab/Shift+Tab:field  Enter:save  Esc:cancel",
        theme.dim(),
    )));
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
}

/// Draw the help overlay.
pub fn draw_help(frame: &mut Frame, theme: &Theme, ascii: bool) {
    let help_text = vec![
        Line::from(Span::styled("  Parley Key Bindings", theme.title())),
        Line::default(),
        Line::from(" Enter      Send message (select in sidebar)"),
        Line::from(" S+Enter    Insert newline (^J if S+Enter not available)"),
        Line::from(" Tab        Cycle focus sidebar / chat / input"),
        Line::from(" j/k ↑/↓    Move selection or scroll chat"),
        Line::from(" ^u/^d      Page up/down in chat"),
        Line::from(" g / G      Jump to top/bottom"),
        Line::from(" ^N         New conversation"),
        Line::from(" F2         Conversation settings"),
        Line::from(" ^B         Toggle sidebar"),
        Line::from(" ^T         Toggle dark/light theme"),
        Line::from(" ^L         Refresh conversation list"),
        Line::from(" ^R         Reconnect to server"),
        Line::from(" ^C / ^Q    Quit"),
        Line::from(" F1         Toggle this help"),
        Line::default(),
        Line::from(Span::styled(" Press any key to close", theme.dim())),
    ];

    let overlay = centered(frame.area(), 60, help_text.len() as u16 + 2);
    frame.render_widget(Clear, overlay);
    let block = Block::default().borders(Borders::ALL).border_type(border_type(ascii));
    let inner = block.inner(overlay);
    frame.render_widget(block, overlay);
    frame.render_widget(Paragraph::new(help_text), inner);
}

// ── Internal helpers ──────────────────────────────────────────────────────────

pub(crate) fn pane_block(title: &str, focused: bool, theme: &Theme, ascii: bool) -> Block<'static> {
    let border_style = if focused { Style::default().fg(theme.accent) } else { theme.dim() };
    Block::default()
        .title(Span::styled(
            format!(" {title} "),
            if focused { theme.title() } else { theme.dim() },
        ))
        .borders(Borders::ALL)
        .border_type(border_type(ascii))
        .border_style(border_style)
}

pub(crate) fn md_rule_char(ascii: bool) -> char { rule_char(ascii) }
pub(crate) fn md_blockquote(ascii: bool) -> &'static str { blockquote_prefix(ascii) }
pub(crate) fn md_bullet(ascii: bool) -> &'static str { bullet(ascii) }
