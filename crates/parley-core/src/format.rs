// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Text helpers shared by the TUI and the headless output formats.

use chrono::{Local, TimeZone};
use parley_protocol::{ContentBlock, Message};
use serde_json::Value;

pub const PREVIEW_LEN: usize = 50;

const MINUTE_MS: i64 = 60 * 1000;
const HOUR_MS: i64 = 60 * MINUTE_MS;
const DAY_MS: i64 = 24 * HOUR_MS;
const WEEK_MS: i64 = 7 * DAY_MS;

/// All text blocks of a message joined by newlines.
pub fn extract_text(message: &Message) -> String {
    message
        .content
        .iter()
        .filter_map(|b| match b {
            ContentBlock::Text { text } => Some(text.as_str()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Cut `text` to `max` characters, appending `...` when anything was removed.
pub fn truncate_text(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

/// Sidebar preview of a message body.
pub fn preview(text: &str) -> String {
    truncate_text(text, PREVIEW_LEN)
}

/// Local date and time, e.g. `Mar 4, 2025 14:05`.  Empty for a zero timestamp.
pub fn format_date(timestamp_ms: i64) -> String {
    if timestamp_ms == 0 {
        return String::new();
    }
    match Local.timestamp_millis_opt(timestamp_ms).single() {
        Some(dt) => dt.format("%b %-d, %Y %H:%M").to_string(),
        None => String::new(),
    }
}

/// `just now`, `5 minutes ago`, `1 hour ago`, `3 days ago`, or the full date
/// once the timestamp is a week old.
pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    if timestamp_ms == 0 {
        return String::new();
    }
    let diff = now_ms.saturating_sub(timestamp_ms);

    fn ago(n: i64, unit: &str) -> String {
        let plural = if n == 1 { "" } else { "s" };
        format!("{n} {unit}{plural} ago")
    }

    if diff < MINUTE_MS {
        "just now".to_string()
    } else if diff < HOUR_MS {
        ago(diff / MINUTE_MS, "minute")
    } else if diff < DAY_MS {
        ago(diff / HOUR_MS, "hour")
    } else if diff < WEEK_MS {
        ago(diff / DAY_MS, "day")
    } else {
        format_date(timestamp_ms)
    }
}

/// Two-space indented JSON.
pub fn pretty_json(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// Strings are shown verbatim; anything else as pretty JSON.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => pretty_json(other),
    }
}

/// `1234567` → `1,234,567`.
pub fn format_number(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

// ── Markdown-lite ─────────────────────────────────────────────────────────────

/// Pieces of a message body as far as code formatting is concerned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    Text(String),
    InlineCode(String),
    CodeBlock { lang: String, code: String },
}

/// Split `text` into prose, inline code spans and fenced code blocks.
///
/// A fence is three backticks, an optional language word, a newline, the
/// code, and three closing backticks.  An unterminated fence is prose.
pub fn markdown_lite(text: &str) -> Vec<Fragment> {
    let mut out = Vec::new();
    let mut rest = text;

    while let Some(start) = rest.find("```") {
        let after = &rest[start + 3..];
        let Some(nl) = after.find('\n') else { break };
        let lang = &after[..nl];
        if !lang.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-' || c == '+') {
            // Not a fence opener; keep the backticks as prose.
            split_inline(&rest[..start + 3], &mut out);
            rest = after;
            continue;
        }
        let body = &after[nl + 1..];
        let Some(end) = body.find("```") else { break };

        split_inline(&rest[..start], &mut out);
        let lang = if lang.is_empty() { "plaintext" } else { lang };
        out.push(Fragment::CodeBlock {
            lang: lang.to_string(),
            code: body[..end].to_string(),
        });
        rest = &body[end + 3..];
    }
    split_inline(rest, &mut out);
    merge_text(out)
}

fn split_inline(text: &str, out: &mut Vec<Fragment>) {
    let mut rest = text;
    while let Some(open) = rest.find('`') {
        let after = &rest[open + 1..];
        match after.find('`') {
            Some(close) if close > 0 && !after[..close].contains('\n') => {
                if open > 0 {
                    out.push(Fragment::Text(rest[..open].to_string()));
                }
                out.push(Fragment::InlineCode(after[..close].to_string()));
                rest = &after[close + 1..];
            }
            _ => {
                out.push(Fragment::Text(rest[..=open].to_string()));
                rest = after;
            }
        }
    }
    if !rest.is_empty() {
        out.push(Fragment::Text(rest.to_string()));
    }
}

fn merge_text(fragments: Vec<Fragment>) -> Vec<Fragment> {
    let mut out: Vec<Fragment> = Vec::with_capacity(fragments.len());
    for f in fragments {
        match (out.last_mut(), f) {
            (Some(Fragment::Text(prev)), Fragment::Text(next)) => prev.push_str(&next),
            (_, f) => out.push(f),
        }
    }
    out
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Render markdown-lite as escaped HTML.
pub fn to_html(text: &str) -> String {
    let mut html = String::new();
    for fragment in markdown_lite(text) {
        match fragment {
            Fragment::Text(t) => html.push_str(&escape_html(&t).replace('\n', "<br>")),
            Fragment::InlineCode(c) => {
                html.push_str("<code>");
                html.push_str(&escape_html(&c));
                html.push_str("</code>");
            }
            Fragment::CodeBlock { lang, code } => {
                html.push_str(&format!("<pre><code class=\"language-{}\">", escape_html(&lang)));
                html.push_str(&escape_html(&code));
                html.push_str("</code></pre>");
            }
        }
    }
    html
}
