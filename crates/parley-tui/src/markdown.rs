use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Parser, Tag, TagEnd};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use unicode_width::UnicodeWidthStr;

use crate::theme::Theme;
use crate::widgets::{md_blockquote, md_bullet, md_rule_char};

/// Rendered message body.
pub type StyledLines = Vec<Line<'static>>;

/// Render assistant markdown into styled lines, wrapping prose at `wrap_width`.
///
/// Fenced code blocks get a header line carrying their language
/// (`plaintext` when none is given) and are never re-wrapped.
pub fn render_markdown(md: &str, wrap_width: u16, theme: &Theme, ascii: bool) -> StyledLines {
    let width = if wrap_width == 0 { 80 } else { wrap_width as usize };
    let mut lines: StyledLines = Vec::new();
    let mut current_spans: Vec<Span<'static>> = Vec::new();
    let mut style_stack: Vec<Style> = vec![theme.text()];
    let mut in_code_block = false;

    let push_line = |lines: &mut StyledLines, spans: &mut Vec<Span<'static>>| {
        if spans.is_empty() {
            lines.push(Line::default());
        } else {
            lines.push(Line::from(std::mem::take(spans)));
        }
    };

    for event in Parser::new(md) {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                push_line(&mut lines, &mut current_spans);
                style_stack.push(heading_style(level, theme));
            }
            Event::End(TagEnd::Heading(_)) => {
                style_stack.pop();
                push_line(&mut lines, &mut current_spans);
                lines.push(Line::default());
            }
            Event::Start(Tag::Strong) => {
                let base = *style_stack.last().unwrap_or(&Style::default());
                style_stack.push(base.add_modifier(Modifier::BOLD));
            }
            Event::End(TagEnd::Strong) => { style_stack.pop(); }
            Event::Start(Tag::Emphasis) => {
                let base = *style_stack.last().unwrap_or(&Style::default());
                style_stack.push(base.add_modifier(Modifier::ITALIC));
            }
            Event::End(TagEnd::Emphasis) => { style_stack.pop(); }
            Event::Start(Tag::CodeBlock(kind)) => {
                if !current_spans.is_empty() {
                    push_line(&mut lines, &mut current_spans);
                }
                let lang = match kind {
                    CodeBlockKind::Fenced(info) => {
                        info.split_whitespace().next().unwrap_or("").to_string()
                    }
                    CodeBlockKind::Indented => String::new(),
                };
                let lang = if lang.is_empty() { "plaintext".to_string() } else { lang };
                lines.push(Line::from(Span::styled(format!("[{lang}]"), theme.dim())));
                style_stack.push(Style::default().fg(theme.code));
                in_code_block = true;
            }
            Event::End(TagEnd::CodeBlock) => {
                if !current_spans.is_empty() {
                    push_line(&mut lines, &mut current_spans);
                }
                style_stack.pop();
                in_code_block = false;
                lines.push(Line::default());
            }
            Event::Start(Tag::List(_)) => {
                if !current_spans.is_empty() {
                    push_line(&mut lines, &mut current_spans);
                }
            }
            Event::End(TagEnd::List(_)) => {
                lines.push(Line::default());
            }
            Event::Start(Tag::Item) => {
                current_spans.push(Span::raw(format!("  {}", md_bullet(ascii))));
            }
            Event::End(TagEnd::Item) => {
                push_line(&mut lines, &mut current_spans);
            }
            Event::Start(Tag::BlockQuote(_)) => {
                let base = *style_stack.last().unwrap_or(&Style::default());
                style_stack.push(base.fg(theme.muted));
                current_spans.push(Span::raw(md_blockquote(ascii).to_string()));
            }
            Event::End(TagEnd::BlockQuote(_)) => {
                push_line(&mut lines, &mut current_spans);
                style_stack.pop();
                lines.push(Line::default());
            }
            Event::Start(Tag::Paragraph) => {}
            Event::End(TagEnd::Paragraph) => {
                push_line(&mut lines, &mut current_spans);
                lines.push(Line::default());
            }
            Event::Text(t) if in_code_block => {
                let style = *style_stack.last().unwrap_or(&Style::default());
                for code_line in t.lines() {
                    lines.push(Line::from(Span::styled(format!("  {code_line}"), style)));
                }
            }
            Event::Text(t) => {
                let style = *style_stack.last().unwrap_or(&Style::default());
                let mut col = current_col(&current_spans);
                let mut buf = String::new();
                for word in t.split_inclusive(' ') {
                    let w = word.width();
                    if col + w > width && !buf.is_empty() {
                        current_spans.push(Span::styled(std::mem::take(&mut buf), style));
                        push_line(&mut lines, &mut current_spans);
                        col = 0;
                    }
                    buf.push_str(word);
                    col += w;
                }
                if !buf.is_empty() {
                    current_spans.push(Span::styled(buf, style));
                }
            }
            Event::Code(t) => {
                current_spans.push(Span::styled(format!("`{t}`"), theme.inline_code()));
            }
            Event::SoftBreak => {
                current_spans.push(Span::raw(" "));
            }
            Event::HardBreak => {
                push_line(&mut lines, &mut current_spans);
            }
            Event::Rule => {
                push_line(&mut lines, &mut current_spans);
                lines.push(Line::from(Span::styled(
                    md_rule_char(ascii).to_string().repeat(width),
                    theme.dim(),
                )));
                lines.push(Line::default());
            }
            _ => {}
        }
    }

    if !current_spans.is_empty() {
        lines.push(Line::from(current_spans));
    }
    while lines.last().is_some_and(|l| l.spans.is_empty()) {
        lines.pop();
    }

    lines
}

fn heading_style(level: HeadingLevel, theme: &Theme) -> Style {
    match level {
        HeadingLevel::H1 | HeadingLevel::H2 => theme.title(),
        HeadingLevel::H3 => Style::default().fg(theme.code).add_modifier(Modifier::BOLD),
        _ => Style::default().add_modifier(Modifier::BOLD),
    }
}

fn current_col(spans: &[Span<'_>]) -> usize {
    spans.iter().map(|s| s.content.width()).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(lines: &StyledLines) -> Vec<String> {
        lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    #[test]
    fn paragraphs_are_separated_by_blank_lines() {
        let out = plain(&render_markdown("one\n\ntwo", 80, &Theme::dark(), false));
        assert_eq!(out, ["one", "", "two"]);
    }

    #[test]
    fn long_text_wraps_at_word_boundaries() {
        let out = plain(&render_markdown("aaa bbb ccc", 8, &Theme::dark(), false));
        assert_eq!(out, ["aaa bbb ", "ccc"]);
    }

    #[test]
    fn code_block_keeps_lines_and_labels_language() {
        let md = "```rust\nfn main() {\n    let x = 1;\n}\n```";
        let out = plain(&render_markdown(md, 10, &Theme::dark(), false));
        assert_eq!(out, ["[rust]", "  fn main() {", "      let x = 1;", "  }"]);
    }

    #[test]
    fn unlabelled_fence_is_plaintext() {
        let out = plain(&render_markdown("```\nx\n```", 80, &Theme::dark(), false));
        assert_eq!(out[0], "[plaintext]");
    }

    #[test]
    fn inline_code_keeps_backticks() {
        let out = plain(&render_markdown("run `cargo`", 80, &Theme::dark(), false));
        assert_eq!(out, ["run `cargo`"]);
    }

    #[test]
    fn bullets_follow_ascii_setting() {
        let out = plain(&render_markdown("- a\n- b", 80, &Theme::dark(), true));
        assert_eq!(out, ["  - a", "  - b"]);
    }
}
