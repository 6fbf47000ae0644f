// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Top-level TUI application state and event loop.

pub(crate) mod dispatch;
pub(crate) mod events;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::EventStream;
use futures::StreamExt;
use parley_client::{ClientHandle, ConnectOptions, Connection, TransportEvent};
use parley_config::Config;
use parley_core::{ChatController, ClientState, Prefs, Session, StoreEvent};
use ratatui::DefaultTerminal;
use tokio::sync::{broadcast, mpsc};
use tracing::debug;

use crate::{
    chat::{empty_thread, render_thread, ChatStyle},
    layout::AppLayout,
    markdown::StyledLines,
    settings_form::SettingsForm,
    theme::Theme,
    input::InputBuffer,
    widgets::{draw_chat, draw_help, draw_input, draw_notice, draw_settings, draw_sidebar, draw_status},
};

const TICK: Duration = Duration::from_millis(250);

// ── Public types ──────────────────────────────────────────────────────────────

/// Options passed when constructing the TUI app.
pub struct AppOptions {
    pub connect: ConnectOptions,
    /// Where the theme choice is persisted; `None` keeps it in memory.
    pub prefs_path: Option<PathBuf>,
}

/// Which pane currently holds keyboard focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPane {
    Sidebar,
    Chat,
    Input,
}

impl FocusPane {
    /// Tab order; the sidebar is skipped while hidden.
    pub fn next(self, sidebar_visible: bool) -> Self {
        match self {
            FocusPane::Sidebar => FocusPane::Chat,
            FocusPane::Chat => FocusPane::Input,
            FocusPane::Input if sidebar_visible => FocusPane::Sidebar,
            FocusPane::Input => FocusPane::Chat,
        }
    }

    pub fn prev(self, sidebar_visible: bool) -> Self {
        match self {
            FocusPane::Sidebar => FocusPane::Input,
            FocusPane::Chat if sidebar_visible => FocusPane::Sidebar,
            FocusPane::Chat => FocusPane::Input,
            FocusPane::Input => FocusPane::Chat,
        }
    }
}

// ── App ───────────────────────────────────────────────────────────────────────

/// The top-level TUI application state.
pub struct App {
    pub(crate) config: Arc<Config>,
    pub(crate) controller: ChatController<ClientHandle>,
    pub(crate) transport_rx: mpsc::UnboundedReceiver<TransportEvent>,
    pub(crate) store_rx: broadcast::Receiver<StoreEvent>,
    pub(crate) focus: FocusPane,
    pub(crate) input: InputBuffer,
    pub(crate) theme: Theme,
    /// Highlighted row in the sidebar (not necessarily the active one).
    pub(crate) sidebar_selected: usize,
    pub(crate) scroll_offset: u16,
    /// Follow new content unless the user scrolled up.
    pub(crate) auto_scroll: bool,
    pub(crate) chat_lines: StyledLines,
    /// Set by store events; the thread is re-rendered before the next draw.
    pub(crate) chat_dirty: bool,
    pub(crate) chat_height: u16,
    pub(crate) chat_width: u16,
    pub(crate) settings_form: Option<SettingsForm>,
    pub(crate) show_help: bool,
    pub(crate) tick: usize,
    ascii: bool,
}

impl App {
    /// Spawns the connection task; must be called inside a Tokio runtime.
    pub fn new(config: Arc<Config>, opts: AppOptions) -> Self {
        let prefs = match opts.prefs_path {
            Some(path) => Prefs::open(path),
            None => Prefs::in_memory(),
        };
        let state = ClientState::from_config(&config, prefs);
        let store_rx = state.subscribe();
        let theme = Theme::from_dark(state.ui.is_dark_mode());
        let ascii = config.tui.ascii_borders || std::env::var("PARLEY_ASCII_BORDERS").as_deref() == Ok("1");

        let (handle, transport_rx) = Connection::spawn(opts.connect);
        let session = Session::new(state, handle).with_system_prompt(config.defaults.system_prompt.clone());

        Self {
            config,
            controller: ChatController::new(session),
            transport_rx,
            store_rx,
            focus: FocusPane::Input,
            input: InputBuffer::default(),
            theme,
            sidebar_selected: 0,
            scroll_offset: 0,
            auto_scroll: true,
            chat_lines: Vec::new(),
            chat_dirty: true,
            chat_height: 20,
            chat_width: 78,
            settings_form: None,
            show_help: false,
            tick: 0,
            ascii,
        }
    }

    pub(crate) fn ascii(&self) -> bool {
        self.ascii
    }

    /// Run the TUI event loop.
    pub async fn run(mut self, mut terminal: DefaultTerminal) -> anyhow::Result<()> {
        let mut crossterm_events = EventStream::new();
        let mut ticker = tokio::time::interval(TICK);

        loop {
            if let Ok(size) = terminal.size() {
                let layout = AppLayout::compute(
                    ratatui::layout::Rect::new(0, 0, size.width, size.height),
                    self.controller.state().ui.sidebar_visible(),
                    self.config.tui.sidebar_width,
                );
                let width = layout.chat_inner_width().max(20);
                if width != self.chat_width {
                    self.chat_width = width;
                    self.chat_dirty = true;
                }
                self.chat_height = layout.chat_inner_height().max(1);
            }
            if self.chat_dirty {
                self.rebuild_chat();
            }
            self.clamp_scroll();

            terminal.draw(|frame| self.draw(frame))?;

            tokio::select! {
                Some(ev) = self.transport_rx.recv() => {
                    self.handle_transport_event(ev);
                }
                store_ev = self.store_rx.recv() => {
                    self.handle_store_recv(store_ev);
                }
                Some(Ok(term_event)) = crossterm_events.next() => {
                    if self.handle_term_event(term_event) { break; }
                }
                _ = ticker.tick() => {
                    self.on_tick();
                }
            }
        }

        if let Err(e) = self.controller.session().sink.disconnect() {
            debug!("disconnect on exit: {e}");
        }
        Ok(())
    }

    fn draw(&self, frame: &mut ratatui::Frame) {
        let state = self.controller.state();
        let ascii = self.ascii();
        let theme = &self.theme;
        let layout = AppLayout::new(frame, state.ui.sidebar_visible(), self.config.tui.sidebar_width);
        let now = self.controller.session().now_ms();

        let model = state
            .active_id()
            .map(|id| state.settings.get(id).model_config.model)
            .unwrap_or_else(|| state.settings.defaults().model_config.model.clone());
        draw_status(
            frame, layout.status_bar, self.controller.session().sink.state(), &model,
            state.ui.is_waiting(), self.tick, theme, ascii,
        );
        draw_sidebar(
            frame, layout.sidebar, state.conversations.list(), state.active_id(),
            self.sidebar_selected, self.focus == FocusPane::Sidebar, now, theme, ascii,
        );
        let title = state.conversations.active().map_or("Chat", |c| c.title.as_str());
        draw_chat(
            frame, layout.chat_pane, title, &self.chat_lines, self.scroll_offset,
            self.focus == FocusPane::Chat, theme, ascii,
        );
        draw_input(
            frame, layout.input_pane, &self.input,
            self.focus == FocusPane::Input && self.settings_form.is_none() && !self.show_help,
            state.ui.is_waiting(), theme, ascii,
        );
        draw_notice(frame, layout.notice_line, state.ui.current_notice(), theme);

        if let Some(form) = &self.settings_form {
            draw_settings(frame, form, theme, ascii);
        }
        if self.show_help {
            draw_help(frame, theme, ascii);
        }
    }

    // ── Chat display ──────────────────────────────────────────────────────────

    /// Rebuild `chat_lines` from the active thread.
    pub(crate) fn rebuild_chat(&mut self) {
        self.chat_dirty = false;
        let state = self.controller.state();
        if state.active_id().is_none() {
            self.chat_lines = empty_thread(&self.theme);
            self.scroll_offset = 0;
            return;
        }
        let style = ChatStyle {
            theme: &self.theme,
            ascii: self.ascii,
            collapse_tools: self.config.tui.collapse_tools,
            width: match self.config.tui.wrap_width {
                0 => self.chat_width,
                w => w.min(self.chat_width),
            },
        };
        let waiting = state.ui.is_waiting().then_some(self.tick);
        self.chat_lines = render_thread(&self.controller.thread(), waiting, &style);
        if self.auto_scroll {
            self.scroll_to_bottom();
        }
    }

    pub(crate) fn max_scroll(&self) -> u16 {
        let total = u16::try_from(self.chat_lines.len()).unwrap_or(u16::MAX);
        total.saturating_sub(self.chat_height)
    }

    pub(crate) fn scroll_to_bottom(&mut self) {
        self.scroll_offset = self.max_scroll();
        self.auto_scroll = true;
    }

    fn clamp_scroll(&mut self) {
        self.scroll_offset = self.scroll_offset.min(self.max_scroll());
    }

    pub(crate) fn scroll_by(&mut self, delta: i32) {
        let max = i32::from(self.max_scroll());
        let next = (i32::from(self.scroll_offset) + delta).clamp(0, max);
        self.scroll_offset = next as u16;
        self.auto_scroll = next == max;
    }

    fn on_tick(&mut self) {
        self.tick = self.tick.wrapping_add(1);
        let now = self.controller.session().now_ms();
        self.controller.state_mut().ui.expire_notices(now);
        // Only the spinner line changes between ticks.
        if self.controller.state().ui.is_waiting() {
            self.chat_dirty = true;
        }
    }
}

// ── Test helpers ──────────────────────────────────────────────────────────────

#[cfg(test)]
impl App {
    /// An app whose connection can never be established.
    pub(crate) fn for_testing() -> Self {
        let mut connect = ConnectOptions::new("ws://127.0.0.1:9/ws");
        connect.reconnect.enabled = false;
        connect.reconnect.max_attempts = 0;
        App::new(Arc::new(Config::default()), AppOptions { connect, prefs_path: None })
    }
}
