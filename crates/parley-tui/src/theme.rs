//! Dark and light colour palettes.

use ratatui::style::{Color, Modifier, Style};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    pub dark: bool,
    pub fg: Color,
    pub bg: Color,
    pub muted: Color,
    pub accent: Color,
    pub user: Color,
    pub assistant: Color,
    pub tool: Color,
    pub error: Color,
    pub success: Color,
    pub code: Color,
    pub status_bg: Color,
    pub selection_bg: Color,
}

impl Theme {
    pub fn dark() -> Self {
        Self {
            dark: true,
            fg: Color::White,
            bg: Color::Reset,
            muted: Color::DarkGray,
            accent: Color::LightBlue,
            user: Color::LightGreen,
            assistant: Color::LightMagenta,
            tool: Color::Yellow,
            error: Color::Red,
            success: Color::Green,
            code: Color::Cyan,
            status_bg: Color::DarkGray,
            selection_bg: Color::Rgb(40, 50, 70),
        }
    }

    pub fn light() -> Self {
        Self {
            dark: false,
            fg: Color::Black,
            bg: Color::Reset,
            muted: Color::Gray,
            accent: Color::Blue,
            user: Color::Green,
            assistant: Color::Magenta,
            tool: Color::Rgb(160, 100, 0),
            error: Color::Red,
            success: Color::Green,
            code: Color::Rgb(0, 110, 140),
            status_bg: Color::Rgb(220, 220, 225),
            selection_bg: Color::Rgb(205, 225, 250),
        }
    }

    pub fn from_dark(dark: bool) -> Self {
        if dark { Self::dark() } else { Self::light() }
    }

    /// `"light"` selects the light palette; anything else is dark.
    pub fn from_name(name: &str) -> Self {
        Self::from_dark(!name.eq_ignore_ascii_case("light"))
    }

    pub fn text(&self) -> Style {
        Style::default().fg(self.fg)
    }

    pub fn dim(&self) -> Style {
        Style::default().fg(self.muted)
    }

    pub fn title(&self) -> Style {
        Style::default().fg(self.accent).add_modifier(Modifier::BOLD)
    }

    pub fn selected(&self) -> Style {
        Style::default().bg(self.selection_bg).add_modifier(Modifier::BOLD)
    }

    pub fn inline_code(&self) -> Style {
        Style::default().fg(self.tool)
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}
