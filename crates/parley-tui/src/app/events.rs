// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Terminal, transport and store event handlers.

use crossterm::event::{Event, KeyEventKind, MouseEventKind};
use parley_client::TransportEvent;
use parley_core::{ClientState, NoticeLevel, StoreEvent};
use parley_protocol::Settings;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use crate::{
    app::{App, FocusPane},
    keys::map_key,
    settings_form::SettingsForm,
    theme::Theme,
};

impl App {
    // ── Terminal event handler ────────────────────────────────────────────────

    /// Returns `true` when the app should quit.
    pub(crate) fn handle_term_event(&mut self, event: Event) -> bool {
        match event {
            Event::Key(k) if k.kind == KeyEventKind::Press => {
                if self.show_help {
                    self.show_help = false;
                    return false;
                }
                match map_key(k, self.focus, self.settings_form.is_some()) {
                    Some(action) => self.dispatch(action),
                    None => false,
                }
            }
            Event::Mouse(mouse) => {
                match mouse.kind {
                    MouseEventKind::ScrollUp => self.scroll_by(-3),
                    MouseEventKind::ScrollDown => self.scroll_by(3),
                    _ => {}
                }
                false
            }
            Event::Paste(text) => {
                if self.focus == FocusPane::Input && self.settings_form.is_none() {
                    text.chars().filter(|c| *c != '\r').for_each(|c| self.input.insert(c));
                }
                false
            }
            Event::Resize(..) => {
                self.chat_dirty = true;
                false
            }
            _ => false,
        }
    }

    // ── Transport events ──────────────────────────────────────────────────────

    pub(crate) fn handle_transport_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Connected => {
                info!("connected to server");
                self.controller.on_connected();
            }
            TransportEvent::Message(msg) => {
                self.controller.handle(&msg);
            }
            TransportEvent::Disconnected { clean, code, reason } => {
                if clean {
                    info!(?code, "connection closed");
                } else {
                    warn!(?code, reason = %reason, "connection lost");
                }
                self.controller.on_disconnected();
            }
            TransportEvent::Reconnecting { attempt, delay } => {
                debug!(attempt, ?delay, "reconnect scheduled");
            }
            TransportEvent::GaveUp { attempts } => {
                warn!(attempts, "giving up on reconnecting");
                self.controller
                    .session_mut()
                    .notify(NoticeLevel::Error, "Disconnected from server. Press Ctrl+R to reconnect.");
            }
        }
    }

    // ── Store events ──────────────────────────────────────────────────────────

    pub(crate) fn handle_store_recv(&mut self, received: Result<StoreEvent, RecvError>) {
        match received {
            Ok(event) => self.handle_store_event(event),
            Err(RecvError::Lagged(skipped)) => {
                debug!(skipped, "store events lagged, redrawing everything");
                self.chat_dirty = true;
                self.follow_active_in_sidebar();
                self.resync_settings_form();
            }
            Err(RecvError::Closed) => {}
        }
    }

    pub(crate) fn handle_store_event(&mut self, event: StoreEvent) {
        let active = self.controller.state().active_id().map(str::to_owned);
        match event {
            StoreEvent::ConversationsUpdated => {
                self.follow_active_in_sidebar();
            }
            StoreEvent::ActiveConversationChanged(_) => {
                self.auto_scroll = true;
                self.chat_dirty = true;
                self.follow_active_in_sidebar();
            }
            StoreEvent::MessageAdded { conversation_id, .. }
            | StoreEvent::MessagesUpdated { conversation_id } => {
                if active.as_deref() == Some(conversation_id.as_str()) {
                    self.chat_dirty = true;
                }
            }
            StoreEvent::MessagesCleared | StoreEvent::WaitingChanged(_) => {
                self.chat_dirty = true;
            }
            StoreEvent::SettingsUpdated { conversation_id } => {
                if self.settings_form.as_ref().is_some_and(|f| f.conversation_id == conversation_id) {
                    self.resync_settings_form();
                }
            }
            StoreEvent::SidebarToggled(visible) => {
                if !visible && self.focus == FocusPane::Sidebar {
                    self.focus = FocusPane::Chat;
                }
            }
            StoreEvent::ThemeChanged { dark } => {
                self.theme = Theme::from_dark(dark);
                self.chat_dirty = true;
            }
            StoreEvent::SettingsPanelToggled(open) => {
                if !open {
                    self.settings_form = None;
                } else if self.settings_form.is_none() {
                    self.settings_form = self.new_settings_form();
                }
            }
            StoreEvent::Notice(_) => {}
        }
    }

    /// Move the sidebar highlight to the active conversation unless the user
    /// is navigating the sidebar.
    fn follow_active_in_sidebar(&mut self) {
        let state = self.controller.state();
        let len = state.conversations.list().len();
        if self.focus != FocusPane::Sidebar {
            if let Some(pos) = state.active_id().and_then(|id| state.conversations.position(id)) {
                self.sidebar_selected = pos;
                return;
            }
        }
        self.sidebar_selected = self.sidebar_selected.min(len.saturating_sub(1));
    }

    pub(crate) fn new_settings_form(&self) -> Option<SettingsForm> {
        let state = self.controller.state();
        let id = state.active_id()?;
        let (title, settings) = form_source(state, id);
        Some(SettingsForm::new(id, &title, &settings))
    }

    fn resync_settings_form(&mut self) {
        let state = self.controller.state();
        if let Some(form) = self.settings_form.as_mut() {
            let (title, settings) = form_source(state, &form.conversation_id);
            form.sync(&title, &settings);
        }
    }
}

/// Sidebar title (falling back to the stored one) and current settings.
fn form_source(state: &ClientState, id: &str) -> (String, Settings) {
    let settings = state.settings.get(id);
    let title = state
        .conversations
        .get(id)
        .map_or_else(|| settings.title.clone(), |c| c.title.clone());
    (title, settings)
}
