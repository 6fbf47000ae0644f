use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    Frame,
};

const INPUT_HEIGHT: u16 = 5;
const MIN_CHAT_WIDTH: u16 = 30;

/// The regions that make up the TUI layout.
#[derive(Debug, Clone, Copy)]
pub struct AppLayout {
    pub status_bar: Rect,
    /// Zero-width when the sidebar is hidden.
    pub sidebar: Rect,
    pub chat_pane: Rect,
    pub input_pane: Rect,
    pub notice_line: Rect,
}

impl AppLayout {
    /// Calculate layout regions from a `Rect` (terminal area).
    pub fn compute(area: Rect, sidebar_visible: bool, sidebar_width: u16) -> Self {
        let vertical = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(3),
                Constraint::Length(1),
            ])
            .split(area);

        // The sidebar never squeezes the chat below a usable width.
        let sidebar_width = if sidebar_visible {
            sidebar_width.min(area.width.saturating_sub(MIN_CHAT_WIDTH))
        } else {
            0
        };
        let horizontal = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(sidebar_width), Constraint::Min(MIN_CHAT_WIDTH)])
            .split(vertical[1]);

        let right = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(3), Constraint::Length(INPUT_HEIGHT)])
            .split(horizontal[1]);

        AppLayout {
            status_bar: vertical[0],
            sidebar: horizontal[0],
            chat_pane: right[0],
            input_pane: right[1],
            notice_line: vertical[2],
        }
    }

    /// Derive the area from the current frame.
    pub fn new(frame: &Frame, sidebar_visible: bool, sidebar_width: u16) -> Self {
        Self::compute(frame.area(), sidebar_visible, sidebar_width)
    }

    /// The number of text rows visible inside the chat pane's border.
    pub fn chat_inner_height(&self) -> u16 {
        self.chat_pane.height.saturating_sub(2)
    }

    pub fn chat_inner_width(&self) -> u16 {
        self.chat_pane.width.saturating_sub(2)
    }
}

/// A rectangle of at most `width` x `height` centred in `area`.
pub fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + area.width.saturating_sub(width) / 2,
        area.y + area.height.saturating_sub(height) / 2,
        width,
        height,
    )
}
