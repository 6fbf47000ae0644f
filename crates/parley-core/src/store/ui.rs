use tracing::warn;

use crate::bus::{EventBus, Notice, NoticeLevel, StoreEvent};
use crate::store::prefs::Prefs;

const THEME_KEY: &str = "theme";

/// View state that is not tied to server data.
#[derive(Debug)]
pub struct UiStore {
    bus: EventBus,
    prefs: Prefs,
    active_conversation: Option<String>,
    waiting_for_response: bool,
    sidebar_visible: bool,
    dark_mode: bool,
    settings_panel_open: bool,
    notices: Vec<Notice>,
}

impl UiStore {
    /// The theme stored in `prefs` wins over `default_dark`.
    pub fn new(bus: EventBus, prefs: Prefs, default_dark: bool) -> Self {
        let fallback = if default_dark { "dark" } else { "light" };
        let dark_mode = prefs.load(THEME_KEY, fallback.to_string()) == "dark";
        Self {
            bus,
            prefs,
            active_conversation: None,
            waiting_for_response: false,
            sidebar_visible: true,
            dark_mode,
            settings_panel_open: false,
            notices: Vec::new(),
        }
    }

    pub fn active_conversation(&self) -> Option<&str> {
        self.active_conversation.as_deref()
    }

    pub fn set_active_conversation(&mut self, id: Option<String>) {
        self.active_conversation = id;
    }

    pub fn is_waiting(&self) -> bool {
        self.waiting_for_response
    }

    /// Emits only on change.
    pub fn set_waiting(&mut self, waiting: bool) {
        if self.waiting_for_response != waiting {
            self.waiting_for_response = waiting;
            self.bus.emit(StoreEvent::WaitingChanged(waiting));
        }
    }

    pub fn sidebar_visible(&self) -> bool {
        self.sidebar_visible
    }

    pub fn toggle_sidebar(&mut self, force: Option<bool>) -> bool {
        self.sidebar_visible = force.unwrap_or(!self.sidebar_visible);
        self.bus.emit(StoreEvent::SidebarToggled(self.sidebar_visible));
        self.sidebar_visible
    }

    pub fn is_dark_mode(&self) -> bool {
        self.dark_mode
    }

    /// Switch theme and remember the choice.  A failed write is logged; the
    /// theme still changes for this session.
    pub fn toggle_dark_mode(&mut self, force: Option<bool>) -> bool {
        self.dark_mode = force.unwrap_or(!self.dark_mode);
        let theme = if self.dark_mode { "dark" } else { "light" };
        if let Err(e) = self.prefs.save(THEME_KEY, theme) {
            warn!("could not persist theme: {e}");
        }
        self.bus.emit(StoreEvent::ThemeChanged { dark: self.dark_mode });
        self.dark_mode
    }

    pub fn settings_panel_open(&self) -> bool {
        self.settings_panel_open
    }

    pub fn toggle_settings_panel(&mut self, force: Option<bool>) -> bool {
        self.settings_panel_open = force.unwrap_or(!self.settings_panel_open);
        self.bus.emit(StoreEvent::SettingsPanelToggled(self.settings_panel_open));
        self.settings_panel_open
    }

    pub fn push_notice(&mut self, level: NoticeLevel, text: impl Into<String>, now_ms: i64) {
        let notice = Notice { level, text: text.into(), created_at: now_ms };
        self.notices.push(notice.clone());
        self.bus.emit(StoreEvent::Notice(notice));
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    /// Most recent notice still visible.
    pub fn current_notice(&self) -> Option<&Notice> {
        self.notices.last()
    }

    /// Drop expired notices; returns whether anything was removed.
    pub fn expire_notices(&mut self, now_ms: i64) -> bool {
        let before = self.notices.len();
        self.notices.retain(|n| !n.is_expired(now_ms));
        self.notices.len() != before
    }

    /// Clear per-session state.  Theme and sidebar visibility are kept.
    pub fn reset(&mut self) {
        self.active_conversation = None;
        self.set_waiting(false);
        if self.settings_panel_open {
            self.toggle_settings_panel(Some(false));
        }
        self.notices.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> UiStore {
        UiStore::new(EventBus::default(), Prefs::in_memory(), true)
    }

    #[test]
    fn waiting_emits_only_on_change() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();
        let mut ui = UiStore::new(bus, Prefs::in_memory(), true);
        ui.set_waiting(true);
        ui.set_waiting(true);
        ui.set_waiting(false);
        assert_eq!(rx.try_recv().unwrap(), StoreEvent::WaitingChanged(true));
        assert_eq!(rx.try_recv().unwrap(), StoreEvent::WaitingChanged(false));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn toggles_flip_or_force() {
        let mut ui = store();
        assert!(!ui.toggle_sidebar(None));
        assert!(ui.toggle_sidebar(None));
        assert!(ui.toggle_sidebar(Some(true)));
        assert!(ui.toggle_settings_panel(None));
        assert!(!ui.toggle_settings_panel(Some(false)));
    }

    #[test]
    fn theme_choice_is_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");

        let mut ui = UiStore::new(EventBus::default(), Prefs::open(&path), true);
        assert!(ui.is_dark_mode());
        ui.toggle_dark_mode(None);

        let again = UiStore::new(EventBus::default(), Prefs::open(&path), true);
        assert!(!again.is_dark_mode());
    }

    #[test]
    fn config_default_used_without_stored_theme() {
        let ui = UiStore::new(EventBus::default(), Prefs::in_memory(), false);
        assert!(!ui.is_dark_mode());
    }

    #[test]
    fn notices_expire() {
        let mut ui = store();
        ui.push_notice(NoticeLevel::Error, "boom", 1_000);
        ui.push_notice(NoticeLevel::Info, "saved", 2_000);
        assert!(ui.expire_notices(5_500));
        assert_eq!(ui.notices().len(), 1);
        assert_eq!(ui.current_notice().map(|n| n.text.as_str()), Some("boom"));
        assert!(ui.expire_notices(6_000));
        assert!(ui.current_notice().is_none());
    }

    #[test]
    fn reset_keeps_theme_and_sidebar() {
        let mut ui = store();
        ui.toggle_sidebar(Some(false));
        ui.toggle_dark_mode(Some(false));
        ui.set_waiting(true);
        ui.toggle_settings_panel(Some(true));
        ui.set_active_conversation(Some("c".into()));

        ui.reset();
        assert!(!ui.sidebar_visible());
        assert!(!ui.is_dark_mode());
        assert!(!ui.is_waiting());
        assert!(!ui.settings_panel_open());
        assert!(ui.active_conversation().is_none());
    }
}
