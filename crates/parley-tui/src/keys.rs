use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::FocusPane;

/// All logical actions the TUI can perform, independent of key binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    // Focus
    FocusNext,
    FocusPrev,
    FocusInput,

    // Sidebar
    SelectUp,
    SelectDown,
    SelectConversation,

    // Scrolling (in chat pane)
    ScrollUp,
    ScrollDown,
    ScrollPageUp,
    ScrollPageDown,
    ScrollTop,
    ScrollBottom,

    // Input
    InputChar(char),
    InputNewline,
    InputBackspace,
    InputDelete,
    InputMoveCursorLeft,
    InputMoveCursorRight,
    InputMoveLineStart,
    InputMoveLineEnd,
    InputDeleteToStart,
    Submit,

    // Settings panel
    FormNextField,
    FormPrevField,
    FormIncrease,
    FormDecrease,
    FormChar(char),
    FormBackspace,
    FormSave,
    FormCancel,

    // Conversations and connection
    NewConversation,
    OpenSettings,
    RefreshList,
    Reconnect,

    // App
    ToggleSidebar,
    ToggleTheme,
    Help,
    Quit,
}

/// Map a raw key event to an [`Action`], depending on which pane has focus
/// and whether the settings panel is open.
pub fn map_key(event: KeyEvent, focus: FocusPane, settings_open: bool) -> Option<Action> {
    let ctrl  = event.modifiers.contains(KeyModifiers::CONTROL);
    let alt   = event.modifiers.contains(KeyModifiers::ALT);
    let shift = event.modifiers.contains(KeyModifiers::SHIFT);
    // "plain" = no modifier that would make a char a control sequence
    let plain = !ctrl && !alt;

    // ── Always available ──────────────────────────────────────────────────────
    match event.code {
        KeyCode::Char('q') | KeyCode::Char('c') if ctrl => return Some(Action::Quit),
        KeyCode::F(1) => return Some(Action::Help),
        _ => {}
    }

    if settings_open {
        return map_form_key(event, plain);
    }

    let in_input   = focus == FocusPane::Input;
    let in_sidebar = focus == FocusPane::Sidebar;
    let in_chat    = focus == FocusPane::Chat;

    match event.code {
        // ── Global bindings ───────────────────────────────────────────────────
        KeyCode::Char('n') if ctrl => Some(Action::NewConversation),
        KeyCode::Char('b') if ctrl => Some(Action::ToggleSidebar),
        KeyCode::Char('t') if ctrl => Some(Action::ToggleTheme),
        KeyCode::Char('r') if ctrl => Some(Action::Reconnect),
        KeyCode::Char('l') if ctrl => Some(Action::RefreshList),
        KeyCode::F(2) => Some(Action::OpenSettings),
        KeyCode::Tab     => Some(Action::FocusNext),
        KeyCode::BackTab => Some(Action::FocusPrev),

        // ── Input pane ────────────────────────────────────────────────────────
        KeyCode::Enter if in_input && (shift || alt) => Some(Action::InputNewline),
        KeyCode::Char('j') if in_input && ctrl       => Some(Action::InputNewline),
        KeyCode::Enter     if in_input               => Some(Action::Submit),
        KeyCode::Backspace if in_input               => Some(Action::InputBackspace),
        KeyCode::Delete    if in_input               => Some(Action::InputDelete),
        KeyCode::Left      if in_input               => Some(Action::InputMoveCursorLeft),
        KeyCode::Right     if in_input               => Some(Action::InputMoveCursorRight),
        KeyCode::Home      if in_input               => Some(Action::InputMoveLineStart),
        KeyCode::End       if in_input               => Some(Action::InputMoveLineEnd),
        KeyCode::Char('u') if in_input && ctrl       => Some(Action::InputDeleteToStart),
        // Printable characters, only without ctrl/alt
        KeyCode::Char(c)   if in_input && plain      => Some(Action::InputChar(c)),

        // ── Sidebar ───────────────────────────────────────────────────────────
        KeyCode::Up   | KeyCode::Char('k') if in_sidebar && plain => Some(Action::SelectUp),
        KeyCode::Down | KeyCode::Char('j') if in_sidebar && plain => Some(Action::SelectDown),
        KeyCode::Enter if in_sidebar => Some(Action::SelectConversation),

        // ── Chat pane ─────────────────────────────────────────────────────────
        KeyCode::Up   | KeyCode::Char('k') if in_chat && plain => Some(Action::ScrollUp),
        KeyCode::Down | KeyCode::Char('j') if in_chat && plain => Some(Action::ScrollDown),
        KeyCode::PageUp                    if in_chat => Some(Action::ScrollPageUp),
        KeyCode::PageDown                  if in_chat => Some(Action::ScrollPageDown),
        KeyCode::Char('u') if ctrl && in_chat         => Some(Action::ScrollPageUp),
        KeyCode::Char('d') if ctrl && in_chat         => Some(Action::ScrollPageDown),
        KeyCode::Char('g') if in_chat && plain        => Some(Action::ScrollTop),
        KeyCode::Char('G') if in_chat                 => Some(Action::ScrollBottom),

        KeyCode::Esc if !in_input => Some(Action::FocusInput),
        _ => None,
    }
}

fn map_form_key(event: KeyEvent, plain: bool) -> Option<Action> {
    match event.code {
        KeyCode::Esc       => Some(Action::FormCancel),
        KeyCode::Enter     => Some(Action::FormSave),
        KeyCode::Tab | KeyCode::Down => Some(Action::FormNextField),
        KeyCode::BackTab | KeyCode::Up => Some(Action::FormPrevField),
        KeyCode::Right     => Some(Action::FormIncrease),
        KeyCode::Left      => Some(Action::FormDecrease),
        KeyCode::Backspace => Some(Action::FormBackspace),
        KeyCode::Char(c) if plain => Some(Action::FormChar(c)),
        _ => None,
    }
}

// ─── Unit tests ───────────────────────────────────────────────────────────────
