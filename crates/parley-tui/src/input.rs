// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Multi-line text buffer behind the input pane.

use unicode_width::UnicodeWidthStr;

/// Text plus a cursor kept on a char boundary (byte offset).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputBuffer {
    text: String,
    cursor: usize,
}

impl InputBuffer {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    pub fn insert(&mut self, c: char) {
        self.text.insert(self.cursor, c);
        self.cursor += c.len_utf8();
    }

    pub fn backspace(&mut self) {
        if let Some(prev) = prev_char_boundary(&self.text, self.cursor) {
            self.text.replace_range(prev..self.cursor, "");
            self.cursor = prev;
        }
    }

    pub fn delete(&mut self) {
        if let Some(next) = next_char_boundary(&self.text, self.cursor) {
            self.text.replace_range(self.cursor..next, "");
        }
    }

    pub fn move_left(&mut self) {
        if let Some(prev) = prev_char_boundary(&self.text, self.cursor) {
            self.cursor = prev;
        }
    }

    pub fn move_right(&mut self) {
        if let Some(next) = next_char_boundary(&self.text, self.cursor) {
            self.cursor = next;
        }
    }

    /// Start of the current line.
    pub fn move_line_start(&mut self) {
        self.cursor = self.line_start();
    }

    pub fn move_line_end(&mut self) {
        self.cursor = self.text[self.cursor..]
            .find('\n')
            .map_or(self.text.len(), |i| self.cursor + i);
    }

    pub fn delete_to_line_start(&mut self) {
        let start = self.line_start();
        self.text.replace_range(start..self.cursor, "");
        self.cursor = start;
    }

    /// Empty the buffer, returning what it held.
    pub fn take(&mut self) -> String {
        self.cursor = 0;
        std::mem::take(&mut self.text)
    }

    /// Restore text after a failed send.
    pub fn set(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.cursor = self.text.len();
    }

    /// `(row, col)` of the cursor once the text is wrapped to `width` columns.
    pub fn cursor_position(&self, width: u16) -> (u16, u16) {
        let width = usize::from(width.max(1));
        let before = &self.text[..self.cursor];
        let mut row = 0usize;
        let mut col = 0usize;
        for (i, line) in before.split('\n').enumerate() {
            if i > 0 {
                row += 1;
            }
            let w = line.width();
            row += w / width;
            col = w % width;
        }
        (row as u16, col as u16)
    }

    fn line_start(&self) -> usize {
        self.text[..self.cursor].rfind('\n').map_or(0, |i| i + 1)
    }
}

fn prev_char_boundary(s: &str, idx: usize) -> Option<usize> {
    s[..idx].char_indices().next_back().map(|(i, _)| i)
}

fn next_char_boundary(s: &str, idx: usize) -> Option<usize> {
    s[idx..].chars().next().map(|c| idx + c.len_utf8())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typed(s: &str) -> InputBuffer {
        let mut b = InputBuffer::default();
        s.chars().for_each(|c| b.insert(c));
        b
    }

    #[test]
    fn edits_respect_multibyte_chars() {
        let mut b = typed("häj");
        b.move_left();
        b.move_left();
        b.backspace();
        assert_eq!(b.text(), "äj");
        b.delete();
        assert_eq!(b.text(), "j");
        assert_eq!(b.cursor(), 0);
    }

    #[test]
    fn line_navigation() {
        let mut b = typed("one\ntwo");
        b.move_line_start();
        assert_eq!(b.cursor(), 4);
        b.move_left();
        b.move_line_start();
        assert_eq!(b.cursor(), 0);
        b.move_line_end();
        assert_eq!(b.cursor(), 3);
    }

    #[test]
    fn delete_to_line_start_keeps_previous_lines() {
        let mut b = typed("keep\ndrop");
        b.delete_to_line_start();
        assert_eq!(b.text(), "keep\n");
    }

    #[test]
    fn take_empties() {
        let mut b = typed("hello");
        assert_eq!(b.take(), "hello");
        assert!(b.is_blank());
        assert_eq!(b.cursor(), 0);
    }

    #[test]
    fn cursor_position_wraps() {
        assert_eq!(typed("abcdef").cursor_position(4), (1, 2));
        assert_eq!(typed("ab\ncd").cursor_position(10), (1, 2));
        assert_eq!(typed("").cursor_position(10), (0, 0));
    }

    #[test]
    fn edges_are_noops() {
        let mut b = InputBuffer::default();
        b.backspace();
        b.delete();
        b.move_left();
        b.move_right();
        assert_eq!(b, InputBuffer::default());
    }
}
