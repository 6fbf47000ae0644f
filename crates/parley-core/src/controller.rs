// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Reconciliation of server pushes and user operations against the stores.

use parley_client::{ClientError, ClientHandle};
use parley_protocol::{ClientAction, Conversation, Message, MessageKind, Role, ServerMessage, Settings};
use thiserror::Error;
use tracing::{debug, info, trace, warn};

use crate::bus::NoticeLevel;
use crate::router::{MessageRouter, Route};
use crate::store::ClientState;
use crate::thread::{build_thread, ThreadEntry};

pub const SELECT_CONVERSATION_FIRST: &str = "Please select or create a conversation first";
pub const SETTINGS_SAVED: &str = "Settings updated successfully";

/// Where outgoing actions go.
pub trait ActionSink {
    fn send(&self, action: ClientAction) -> Result<(), ClientError>;
}

impl ActionSink for ClientHandle {
    fn send(&self, action: ClientAction) -> Result<(), ClientError> {
        ClientHandle::send(self, action)
    }
}

/// Source of Unix-millisecond timestamps.
pub trait Clock: Send {
    fn now_ms(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

impl<F: Fn() -> i64 + Send> Clock for F {
    fn now_ms(&self) -> i64 {
        self()
    }
}

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("message is empty")]
    EmptyMessage,
    #[error("no active conversation")]
    NoActiveConversation,
    #[error("still waiting for the previous response")]
    AwaitingResponse,
    #[error(transparent)]
    Transport(#[from] ClientError),
}

/// Title given to a conversation the server just created.
pub fn placeholder_title(conversation_id: &str) -> String {
    let short: String = conversation_id.chars().take(8).collect();
    format!("Conversation {short}")
}

// ── Session ───────────────────────────────────────────────────────────────────

/// Stores plus the outgoing sink; the context every handler runs against.
pub struct Session<S> {
    pub state: ClientState,
    pub sink: S,
    clock: Box<dyn Clock>,
    system_prompt: String,
}

impl<S: ActionSink> Session<S> {
    pub fn new(state: ClientState, sink: S) -> Self {
        Self { state, sink, clock: Box::new(SystemClock), system_prompt: String::new() }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Sent with every `new_conversation` request when non-empty.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn now_ms(&self) -> i64 {
        self.clock.now_ms()
    }

    pub fn notify(&mut self, level: NoticeLevel, text: impl Into<String>) {
        let now = self.now_ms();
        self.state.ui.push_notice(level, text, now);
    }

    /// Send an action; a failure is logged and shown as an error notice.
    pub fn request(&mut self, action: ClientAction) -> Result<(), ClientError> {
        let name = action.name();
        match self.sink.send(action) {
            Ok(()) => {
                debug!(action = name, "request sent");
                Ok(())
            }
            Err(e) => {
                warn!(action = name, error = %e, "request not sent");
                self.notify(NoticeLevel::Error, e.to_string());
                Err(e)
            }
        }
    }
}

// ── Server message handlers ───────────────────────────────────────────────────

fn on_welcome<S: ActionSink>(_s: &mut Session<S>, msg: &ServerMessage) {
    if let ServerMessage::Welcome { message, .. } = msg {
        info!(greeting = message.as_deref().unwrap_or(""), "server welcome");
    }
}

fn on_conversation_created<S: ActionSink>(s: &mut Session<S>, msg: &ServerMessage) {
    let ServerMessage::ConversationCreated { conversation_id: id, .. } = msg else { return };
    info!(conversation = %id, "conversation created");

    if !s.state.conversations.contains(id) {
        let now = s.now_ms();
        s.state.conversations.add(Conversation::new(id.clone(), placeholder_title(id), now));
    }
    s.state.set_active(Some(id.clone()));
    let _ = s.request(ClientAction::GetSettings { conversation_id: id.clone() });
}

fn on_conversation_list<S: ActionSink>(s: &mut Session<S>, msg: &ServerMessage) {
    let ServerMessage::ConversationList { conversations } = msg else { return };
    debug!(count = conversations.len(), "conversation list");
    s.state.conversations.set_all(conversations.clone());

    if s.state.active_id().is_some() {
        return;
    }
    let Some(id) = s.state.conversations.most_recent().map(|c| c.id.clone()) else { return };
    s.state.set_active(Some(id.clone()));
    let _ = s.request(ClientAction::GetHistory { conversation_id: id.clone() });
    let _ = s.request(ClientAction::GetSettings { conversation_id: id });
}

fn on_message<S: ActionSink>(s: &mut Session<S>, msg: &ServerMessage) {
    let ServerMessage::Message { conversation_id: id, message } = msg else { return };

    // The local echo already shows this user message.
    let echoed = s
        .state
        .messages
        .get(id)
        .last()
        .is_some_and(|last| last.role == message.role && last.content == message.content);
    if message.role == Role::User && echoed {
        return;
    }
    let now = s.now_ms();
    s.state.add_message(id, message.clone(), now);
    if message.is_assistant() {
        s.state.ui.set_waiting(false);
    }
}

fn on_messages<S: ActionSink>(s: &mut Session<S>, msg: &ServerMessage) {
    let ServerMessage::Messages { conversation_id: id, messages } = msg else { return };
    s.state.ui.set_waiting(false);

    let incoming: Vec<&Message> = messages.iter().filter(|m| m.is_assistant()).collect();
    let known: Vec<&Message> = s.state.messages.get(id).iter().filter(|m| m.is_assistant()).collect();

    // A full history repeats the assistant turns we already hold.
    let skip = if incoming.len() >= known.len() && known.iter().zip(&incoming).all(|(a, b)| a == b) {
        known.len()
    } else {
        0
    };

    let fresh: Vec<Message> = incoming[skip..].iter().map(|m| (*m).clone()).collect();
    if fresh.is_empty() {
        return;
    }
    let now = s.now_ms();
    s.state.add_messages(id, fresh, now);
}

fn on_conversation<S: ActionSink>(s: &mut Session<S>, msg: &ServerMessage) {
    let ServerMessage::Conversation { conversation_id: id, messages } = msg else { return };
    debug!(conversation = %id, count = messages.len(), "history");
    s.state.messages.set(id, messages.clone());
}

fn on_settings<S: ActionSink>(s: &mut Session<S>, msg: &ServerMessage) {
    let ServerMessage::Settings { conversation_id: id, settings } = msg else { return };
    s.state.settings.set(id, settings.clone());
}

fn on_settings_updated<S: ActionSink>(_s: &mut Session<S>, msg: &ServerMessage) {
    debug!(conversation = ?msg.conversation_id(), "server confirmed settings update");
}

fn on_conversation_renamed<S: ActionSink>(s: &mut Session<S>, msg: &ServerMessage) {
    let ServerMessage::ConversationRenamed { conversation_id: id, title } = msg else { return };
    s.state.conversations.update_title(id, title);
}

fn on_error<S: ActionSink>(s: &mut Session<S>, msg: &ServerMessage) {
    let ServerMessage::Error { error_code, message, conversation_id } = msg else { return };
    warn!(code = ?error_code, conversation = ?conversation_id, "server error: {message}");
    s.state.ui.set_waiting(false);

    s.notify(NoticeLevel::Error, server_error_text(error_code.as_deref(), message));
}

/// `code: message`, or the message alone when the server sent no code.
pub fn server_error_text(code: Option<&str>, message: &str) -> String {
    let message = if message.is_empty() { "An error occurred" } else { message };
    match code.filter(|c| !c.is_empty()) {
        Some(code) => format!("{code}: {message}"),
        None => message.to_string(),
    }
}

fn on_unknown<S: ActionSink>(_s: &mut Session<S>, msg: &ServerMessage) {
    if let ServerMessage::Unknown { kind } = msg {
        warn!(kind = %kind, "unhandled server message type");
    }
}

fn trace_all<S: ActionSink>(_s: &mut Session<S>, msg: &ServerMessage) {
    trace!(kind = %msg.kind(), conversation = ?msg.conversation_id(), "dispatched");
}

// ── Controller ────────────────────────────────────────────────────────────────

/// Routes server messages into the session and exposes the user operations.
pub struct ChatController<S> {
    router: MessageRouter<Session<S>>,
    session: Session<S>,
}

impl<S: ActionSink + 'static> ChatController<S> {
    pub fn new(session: Session<S>) -> Self {
        let mut router = MessageRouter::new();
        router.register(MessageKind::Welcome, on_welcome::<S>);
        router.register(MessageKind::ConversationCreated, on_conversation_created::<S>);
        router.register(MessageKind::ConversationList, on_conversation_list::<S>);
        router.register(MessageKind::Message, on_message::<S>);
        router.register(MessageKind::Messages, on_messages::<S>);
        router.register(MessageKind::Conversation, on_conversation::<S>);
        router.register(MessageKind::Settings, on_settings::<S>);
        router.register(MessageKind::SettingsUpdated, on_settings_updated::<S>);
        router.register(MessageKind::ConversationRenamed, on_conversation_renamed::<S>);
        router.register(MessageKind::Error, on_error::<S>);
        router.register(MessageKind::Unknown, on_unknown::<S>);
        router.register(Route::All, trace_all::<S>);
        Self { router, session }
    }

    /// Dispatch a server message; returns the number of handlers run.
    pub fn handle(&mut self, msg: &ServerMessage) -> usize {
        self.router.dispatch(&mut self.session, msg)
    }

    pub fn router_mut(&mut self) -> &mut MessageRouter<Session<S>> {
        &mut self.router
    }

    pub fn session(&self) -> &Session<S> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session<S> {
        &mut self.session
    }

    pub fn state(&self) -> &ClientState {
        &self.session.state
    }

    pub fn state_mut(&mut self) -> &mut ClientState {
        &mut self.session.state
    }

    /// Display thread of the active conversation.
    pub fn thread(&self) -> Vec<ThreadEntry> {
        build_thread(self.session.state.active_messages())
    }

    // ── Connection lifecycle ──────────────────────────────────────────────────

    pub fn on_connected(&mut self) {
        let _ = self.session.request(ClientAction::ListConversations);
        if let Some(id) = self.session.state.active_id().map(str::to_owned) {
            let _ = self.session.request(ClientAction::GetHistory { conversation_id: id });
        }
    }

    pub fn on_disconnected(&mut self) {
        self.session.state.ui.set_waiting(false);
    }

    // ── User operations ───────────────────────────────────────────────────────

    /// Make `id` active; on change its history and settings are requested.
    pub fn select_conversation(&mut self, id: &str) -> bool {
        if !self.session.state.set_active(Some(id.to_string())) {
            return false;
        }
        let _ = self.session.request(ClientAction::GetHistory { conversation_id: id.to_string() });
        let _ = self.session.request(ClientAction::GetSettings { conversation_id: id.to_string() });
        true
    }

    pub fn new_conversation(&mut self) -> Result<(), ChatError> {
        self.session.state.messages.clear_view();
        let system = Some(self.session.system_prompt.clone()).filter(|p| !p.trim().is_empty());
        self.session.request(ClientAction::NewConversation { system, settings: None })?;
        Ok(())
    }

    /// Echo `text` locally as a user message and send it.
    ///
    /// Rejected when blank, with no active conversation, or while a reply is
    /// pending.  A failed send clears the pending flag again.
    pub fn send_user_message(&mut self, text: &str) -> Result<(), ChatError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        let Some(id) = self.session.state.active_id().map(str::to_owned) else {
            return Err(ChatError::NoActiveConversation);
        };
        if self.session.state.ui.is_waiting() {
            return Err(ChatError::AwaitingResponse);
        }

        let message = Message::user_text(text);
        let now = self.session.now_ms();
        self.session.state.add_message(&id, message.clone(), now);
        self.session.state.ui.set_waiting(true);

        if let Err(e) = self.session.request(ClientAction::SendMessage { conversation_id: id, message }) {
            self.session.state.ui.set_waiting(false);
            return Err(e.into());
        }
        Ok(())
    }

    /// Open the settings panel for the active conversation and fetch its
    /// current settings.
    pub fn open_settings(&mut self) -> bool {
        let Some(id) = self.session.state.active_id().map(str::to_owned) else {
            self.session.notify(NoticeLevel::Error, SELECT_CONVERSATION_FIRST);
            return false;
        };
        self.session.state.ui.toggle_settings_panel(Some(true));
        let _ = self.session.request(ClientAction::GetSettings { conversation_id: id });
        true
    }

    pub fn close_settings(&mut self) {
        if self.session.state.ui.settings_panel_open() {
            self.session.state.ui.toggle_settings_panel(Some(false));
        }
    }

    pub fn save_settings(&mut self, settings: Settings) -> Result<(), ChatError> {
        let Some(id) = self.session.state.active_id().map(str::to_owned) else {
            self.session.notify(NoticeLevel::Error, SELECT_CONVERSATION_FIRST);
            return Err(ChatError::NoActiveConversation);
        };

        self.session.request(ClientAction::UpdateSettings {
            conversation_id: id.clone(),
            settings: settings.clone(),
        })?;

        let title = settings.title.trim().to_string();
        if !title.is_empty() {
            self.session.state.conversations.update_title(&id, &title);
        }
        self.session.state.settings.set(&id, settings);
        self.close_settings();
        self.session.notify(NoticeLevel::Info, SETTINGS_SAVED);
        Ok(())
    }

    pub fn refresh(&mut self) -> Result<(), ChatError> {
        self.session.request(ClientAction::ListConversations)?;
        Ok(())
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Prefs;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Recorder {
        sent: Arc<Mutex<Vec<ClientAction>>>,
        offline: Arc<Mutex<bool>>,
    }

    impl Recorder {
        fn take(&self) -> Vec<ClientAction> {
            std::mem::take(&mut *self.sent.lock().unwrap())
        }
    }

    impl ActionSink for Recorder {
        fn send(&self, action: ClientAction) -> Result<(), ClientError> {
            if *self.offline.lock().unwrap() {
                return Err(ClientError::NotConnected);
            }
            self.sent.lock().unwrap().push(action);
            Ok(())
        }
    }

    fn controller() -> (ChatController<Recorder>, Recorder) {
        let rec = Recorder::default();
        let state = ClientState::new(Settings::default(), Prefs::in_memory(), true);
        let session = Session::new(state, rec.clone()).with_clock(|| 1_000_000_i64);
        (ChatController::new(session), rec)
    }

    fn conv(id: &str, updated_at: i64) -> Conversation {
        Conversation { updated_at, ..Conversation::new(id, id.to_uppercase(), 0) }
    }

    #[test]
    fn placeholder_title_uses_first_eight_chars() {
        assert_eq!(placeholder_title("0123456789abcdef"), "Conversation 01234567");
        assert_eq!(placeholder_title("abc"), "Conversation abc");
    }

    #[test]
    fn conversation_created_becomes_active_and_fetches_settings() {
        let (mut c, rec) = controller();
        c.handle(&ServerMessage::ConversationCreated {
            conversation_id: "abcdefghijk".into(),
            message: None,
        });
        assert_eq!(c.state().active_id(), Some("abcdefghijk"));
        assert_eq!(c.state().conversations.get("abcdefghijk").unwrap().title, "Conversation abcdefgh");
        assert_eq!(rec.take(), vec![ClientAction::GetSettings { conversation_id: "abcdefghijk".into() }]);
    }

    #[test]
    fn first_list_selects_most_recent() {
        let (mut c, rec) = controller();
        c.handle(&ServerMessage::ConversationList { conversations: vec![conv("old", 1), conv("new", 9)] });
        assert_eq!(c.state().active_id(), Some("new"));
        assert_eq!(
            rec.take(),
            vec![
                ClientAction::GetHistory { conversation_id: "new".into() },
                ClientAction::GetSettings { conversation_id: "new".into() },
            ]
        );

        // A later list keeps the selection.
        c.handle(&ServerMessage::ConversationList { conversations: vec![conv("newer", 20), conv("new", 9)] });
        assert_eq!(c.state().active_id(), Some("new"));
        assert!(rec.take().is_empty());
    }

    #[test]
    fn empty_list_selects_nothing() {
        let (mut c, rec) = controller();
        c.handle(&ServerMessage::ConversationList { conversations: vec![] });
        assert!(c.state().active_id().is_none());
        assert!(rec.take().is_empty());
    }

    #[test]
    fn send_requires_text_conversation_and_idle() {
        let (mut c, rec) = controller();
        assert!(matches!(c.send_user_message("   "), Err(ChatError::EmptyMessage)));
        assert!(matches!(c.send_user_message("hi"), Err(ChatError::NoActiveConversation)));

        c.select_conversation("c1");
        rec.take();
        c.send_user_message("  hi  ").unwrap();
        assert!(c.state().ui.is_waiting());
        assert!(matches!(c.send_user_message("again"), Err(ChatError::AwaitingResponse)));

        assert_eq!(
            rec.take(),
            vec![ClientAction::SendMessage { conversation_id: "c1".into(), message: Message::user_text("hi") }]
        );
        assert_eq!(c.state().messages.get("c1"), &[Message::user_text("hi")]);
    }

    #[test]
    fn failed_send_clears_waiting() {
        let (mut c, rec) = controller();
        c.select_conversation("c1");
        *rec.offline.lock().unwrap() = true;
        assert!(matches!(c.send_user_message("hi"), Err(ChatError::Transport(ClientError::NotConnected))));
        assert!(!c.state().ui.is_waiting());
        assert_eq!(c.state().ui.current_notice().map(|n| n.level), Some(NoticeLevel::Error));
    }

    #[test]
    fn messages_reply_appends_only_new_assistant_turns() {
        let (mut c, _rec) = controller();
        c.state_mut().conversations.add(conv("c", 1));
        c.select_conversation("c");
        c.send_user_message("q1").unwrap();

        c.handle(&ServerMessage::Messages {
            conversation_id: "c".into(),
            messages: vec![Message::user_text("q1"), Message::assistant_text("a1")],
        });
        assert!(!c.state().ui.is_waiting());
        assert_eq!(c.state().messages.get("c").len(), 2);

        c.send_user_message("q2").unwrap();
        c.handle(&ServerMessage::Messages {
            conversation_id: "c".into(),
            messages: vec![
                Message::user_text("q1"),
                Message::assistant_text("a1"),
                Message::user_text("q2"),
                Message::assistant_text("a2"),
            ],
        });
        let texts: Vec<String> = c.state().messages.get("c").iter().map(crate::format::extract_text).collect();
        assert_eq!(texts, ["q1", "a1", "q2", "a2"]);

        let sidebar = c.state().conversations.get("c").unwrap();
        assert_eq!(sidebar.last_message_preview.as_deref(), Some("a2"));
        assert_eq!(sidebar.message_count, 2);
    }

    #[test]
    fn single_assistant_message_clears_waiting() {
        let (mut c, _rec) = controller();
        c.select_conversation("c");
        c.send_user_message("hi").unwrap();
        c.handle(&ServerMessage::Message { conversation_id: "c".into(), message: Message::assistant_text("yo") });
        assert!(!c.state().ui.is_waiting());
        assert_eq!(c.state().messages.get("c").len(), 2);
    }

    #[test]
    fn echoed_user_message_is_not_duplicated() {
        let (mut c, _rec) = controller();
        c.select_conversation("c");
        c.send_user_message("hi").unwrap();
        c.handle(&ServerMessage::Message { conversation_id: "c".into(), message: Message::user_text("hi") });
        assert_eq!(c.state().messages.get("c").len(), 1);
    }

    #[test]
    fn echo_with_server_id_and_timestamp_is_not_duplicated() {
        let (mut c, _rec) = controller();
        c.select_conversation("c");
        c.send_user_message("hi").unwrap();
        let mut echo = Message::user_text("hi");
        echo.id = Some("m-1".into());
        echo.created_at = Some(42);
        c.handle(&ServerMessage::Message { conversation_id: "c".into(), message: echo });
        assert_eq!(c.state().messages.get("c").len(), 1);
    }

    #[test]
    fn history_replaces_thread() {
        let (mut c, _rec) = controller();
        c.select_conversation("c");
        c.send_user_message("local").unwrap();
        c.handle(&ServerMessage::Conversation {
            conversation_id: "c".into(),
            messages: vec![Message::user_text("server"), Message::assistant_text("side")],
        });
        assert_eq!(c.thread().len(), 2);
        assert_eq!(crate::format::extract_text(&c.state().messages.get("c")[0]), "server");
    }

    #[test]
    fn error_clears_waiting_and_shows_code() {
        let (mut c, _rec) = controller();
        c.select_conversation("c");
        c.send_user_message("hi").unwrap();
        c.handle(&ServerMessage::Error {
            conversation_id: Some("c".into()),
            error_code: Some("CHAT_STATE_ERROR".into()),
            message: "model unavailable".into(),
        });
        assert!(!c.state().ui.is_waiting());
        let notice = c.state().ui.current_notice().unwrap();
        assert_eq!(notice.text, "CHAT_STATE_ERROR: model unavailable");
        assert_eq!(notice.created_at, 1_000_000);
    }

    #[test]
    fn settings_panel_needs_active_conversation() {
        let (mut c, rec) = controller();
        assert!(!c.open_settings());
        assert_eq!(c.state().ui.current_notice().map(|n| n.text.as_str()), Some(SELECT_CONVERSATION_FIRST));
        assert!(!c.state().ui.settings_panel_open());

        c.select_conversation("c");
        rec.take();
        assert!(c.open_settings());
        assert!(c.state().ui.settings_panel_open());
        assert_eq!(rec.take(), vec![ClientAction::GetSettings { conversation_id: "c".into() }]);
    }

    #[test]
    fn save_settings_sends_updates_title_and_closes_panel() {
        let (mut c, rec) = controller();
        c.state_mut().conversations.add(conv("c", 1));
        c.select_conversation("c");
        c.open_settings();
        rec.take();

        let settings = Settings { title: "Renamed".into(), temperature: 0.3, ..Settings::default() };
        c.save_settings(settings.clone()).unwrap();

        assert_eq!(
            rec.take(),
            vec![ClientAction::UpdateSettings { conversation_id: "c".into(), settings: settings.clone() }]
        );
        assert_eq!(c.state().conversations.get("c").unwrap().title, "Renamed");
        assert_eq!(c.state().settings.get("c"), settings);
        assert!(!c.state().ui.settings_panel_open());
        assert_eq!(c.state().ui.current_notice().map(|n| n.text.as_str()), Some(SETTINGS_SAVED));
    }

    #[test]
    fn new_conversation_sends_system_prompt_when_configured() {
        let rec = Recorder::default();
        let state = ClientState::new(Settings::default(), Prefs::in_memory(), true);
        let session = Session::new(state, rec.clone()).with_system_prompt("Be terse.");
        let mut c = ChatController::new(session);
        c.new_conversation().unwrap();
        assert_eq!(
            rec.take(),
            vec![ClientAction::NewConversation { system: Some("Be terse.".into()), settings: None }]
        );
    }

    #[test]
    fn reconnect_refetches_active_history() {
        let (mut c, rec) = controller();
        c.on_connected();
        assert_eq!(rec.take(), vec![ClientAction::ListConversations]);

        c.select_conversation("c");
        rec.take();
        c.on_connected();
        assert_eq!(
            rec.take(),
            vec![ClientAction::ListConversations, ClientAction::GetHistory { conversation_id: "c".into() }]
        );
    }

    #[test]
    fn renamed_updates_title() {
        let (mut c, _rec) = controller();
        c.state_mut().conversations.add(conv("c", 1));
        c.handle(&ServerMessage::ConversationRenamed { conversation_id: "c".into(), title: "Better".into() });
        assert_eq!(c.state().conversations.get("c").unwrap().title, "Better");
    }

    #[test]
    fn extra_handlers_can_be_attached_and_removed() {
        let (mut c, _rec) = controller();
        let seen = Arc::new(Mutex::new(0));
        let counter = seen.clone();
        let id = c.router_mut().register(Route::All, move |_s: &mut Session<Recorder>, _m: &ServerMessage| {
            *counter.lock().unwrap() += 1;
        });
        c.handle(&ServerMessage::Success);
        assert!(c.router_mut().remove_handler(id));
        c.handle(&ServerMessage::Success);
        assert_eq!(*seen.lock().unwrap(), 1);
    }

    #[test]
    fn server_error_text_prefixes_the_code() {
        assert_eq!(server_error_text(Some("E1"), "bad"), "E1: bad");
        assert_eq!(server_error_text(Some(""), "bad"), "bad");
        assert_eq!(server_error_text(None, ""), "An error occurred");
    }
}
