// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Action dispatcher: maps every `Action` variant to `App` state mutations.

use parley_core::controller::SELECT_CONVERSATION_FIRST;
use parley_core::{ChatError, NoticeLevel};
use tracing::{debug, warn};

use crate::{
    app::{App, FocusPane},
    keys::Action,
};

impl App {
    // ── Action dispatcher ─────────────────────────────────────────────────────

    /// Returns `true` when the app should quit.
    pub(crate) fn dispatch(&mut self, action: Action) -> bool {
        let sidebar_visible = self.controller.state().ui.sidebar_visible();
        let page = i32::from(self.chat_height / 2).max(1);

        match action {
            Action::Quit => return true,
            Action::Help => self.show_help = !self.show_help,

            // ── Focus ─────────────────────────────────────────────────────────
            Action::FocusNext => self.focus = self.focus.next(sidebar_visible),
            Action::FocusPrev => self.focus = self.focus.prev(sidebar_visible),
            Action::FocusInput => self.focus = FocusPane::Input,

            // ── Sidebar ───────────────────────────────────────────────────────
            Action::SelectUp => {
                self.sidebar_selected = self.sidebar_selected.saturating_sub(1);
            }
            Action::SelectDown => {
                let len = self.controller.state().conversations.list().len();
                self.sidebar_selected = (self.sidebar_selected + 1).min(len.saturating_sub(1));
            }
            Action::SelectConversation => {
                let id = self
                    .controller
                    .state()
                    .conversations
                    .list()
                    .get(self.sidebar_selected)
                    .map(|c| c.id.clone());
                if let Some(id) = id {
                    self.controller.select_conversation(&id);
                    self.focus = FocusPane::Input;
                }
            }

            // ── Chat scrolling ────────────────────────────────────────────────
            Action::ScrollUp => self.scroll_by(-1),
            Action::ScrollDown => self.scroll_by(1),
            Action::ScrollPageUp => self.scroll_by(-page),
            Action::ScrollPageDown => self.scroll_by(page),
            Action::ScrollTop => {
                self.scroll_offset = 0;
                self.auto_scroll = self.max_scroll() == 0;
            }
            Action::ScrollBottom => self.scroll_to_bottom(),

            // ── Input ─────────────────────────────────────────────────────────
            Action::InputChar(c) => self.input.insert(c),
            Action::InputNewline => self.input.insert('\n'),
            Action::InputBackspace => self.input.backspace(),
            Action::InputDelete => self.input.delete(),
            Action::InputMoveCursorLeft => self.input.move_left(),
            Action::InputMoveCursorRight => self.input.move_right(),
            Action::InputMoveLineStart => self.input.move_line_start(),
            Action::InputMoveLineEnd => self.input.move_line_end(),
            Action::InputDeleteToStart => self.input.delete_to_line_start(),
            Action::Submit => self.submit(),

            // ── Settings panel ────────────────────────────────────────────────
            Action::FormNextField => self.with_form(|f| f.next_field()),
            Action::FormPrevField => self.with_form(|f| f.prev_field()),
            Action::FormIncrease => self.with_form(|f| f.increase()),
            Action::FormDecrease => self.with_form(|f| f.decrease()),
            Action::FormChar(c) => self.with_form(|f| f.push_char(c)),
            Action::FormBackspace => self.with_form(|f| f.backspace()),
            Action::FormSave => self.save_settings(),
            Action::FormCancel => {
                self.controller.close_settings();
                self.settings_form = None;
            }

            // ── Conversations and connection ──────────────────────────────────
            Action::NewConversation => {
                if let Err(e) = self.controller.new_conversation() {
                    debug!("new conversation not requested: {e}");
                }
                self.focus = FocusPane::Input;
            }
            Action::OpenSettings => {
                if self.controller.open_settings() && self.settings_form.is_none() {
                    self.settings_form = self.new_settings_form();
                }
            }
            Action::RefreshList => {
                if let Err(e) = self.controller.refresh() {
                    debug!("refresh not requested: {e}");
                }
            }
            Action::Reconnect => {
                if let Err(e) = self.controller.session().sink.reconnect() {
                    warn!("reconnect failed: {e}");
                    self.controller.session_mut().notify(NoticeLevel::Error, e.to_string());
                }
            }

            // ── View ──────────────────────────────────────────────────────────
            Action::ToggleSidebar => {
                self.controller.state_mut().ui.toggle_sidebar(None);
            }
            Action::ToggleTheme => {
                self.controller.state_mut().ui.toggle_dark_mode(None);
            }
        }
        false
    }

    fn with_form(&mut self, f: impl FnOnce(&mut crate::settings_form::SettingsForm)) {
        if let Some(form) = self.settings_form.as_mut() {
            f(form);
        }
    }

    /// Send the input buffer; the text is put back when the send is refused.
    fn submit(&mut self) {
        if self.input.is_blank() {
            return;
        }
        let text = self.input.take();
        match self.controller.send_user_message(&text) {
            Ok(()) => self.scroll_to_bottom(),
            Err(ChatError::EmptyMessage) => {}
            Err(ChatError::NoActiveConversation) => {
                self.input.set(text);
                self.controller.session_mut().notify(NoticeLevel::Error, SELECT_CONVERSATION_FIRST);
            }
            Err(e @ ChatError::AwaitingResponse) => {
                self.input.set(text);
                debug!("send refused: {e}");
            }
            // The sink already raised a notice.
            Err(ChatError::Transport(_)) => self.input.set(text),
        }
    }

    fn save_settings(&mut self) {
        let Some(form) = self.settings_form.as_ref() else { return };
        let settings = form.to_settings();
        match self.controller.save_settings(settings) {
            Ok(()) => self.settings_form = None,
            Err(e) => debug!("settings not saved: {e}"),
        }
    }
}
