// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! One-shot commands (`list`, `history`, `send`, `settings`) run without the TUI.
//!
//! [`HeadlessClient`] wraps the same [`ChatController`] the TUI uses and
//! waits on transport events until the reply it needs arrives.

use std::time::Duration;

use anyhow::{anyhow, bail, Context};
use parley_client::{ClientHandle, ConnectOptions, Connection, TransportEvent};
use parley_config::Config;
use parley_core::controller::server_error_text;
use parley_core::{ChatController, ClientState, Clock, Prefs, Session, SystemClock};
use parley_protocol::{ClientAction, Conversation, Message, ServerMessage, Settings};
use tokio::sync::mpsc;
use tracing::debug;

use crate::cli::OutputFormatArg;
use crate::output::{render_conversation_table, render_messages, render_settings};

pub struct HeadlessClient {
    controller: ChatController<ClientHandle>,
    events: mpsc::UnboundedReceiver<TransportEvent>,
    timeout: Duration,
}

impl HeadlessClient {
    /// Connect and wait for the initial conversation list.
    ///
    /// Headless runs never reconnect: a dropped socket fails the command.
    pub async fn connect(config: &Config, mut opts: ConnectOptions) -> anyhow::Result<Self> {
        opts.reconnect.enabled = false;
        let connect_timeout = opts.connect_timeout;
        let state = ClientState::from_config(config, Prefs::in_memory());
        let (handle, events) = Connection::spawn(opts);
        let session = Session::new(state, handle).with_system_prompt(config.defaults.system_prompt.clone());

        let mut client = Self {
            controller: ChatController::new(session),
            events,
            timeout: Duration::from_secs(config.headless.response_timeout_secs.max(1)),
        };
        client.wait_connected(connect_timeout).await?;
        client.wait_for(|m| matches!(m, ServerMessage::ConversationList { .. }).then_some(())).await?;
        Ok(client)
    }

    async fn wait_connected(&mut self, limit: Duration) -> anyhow::Result<()> {
        // The transport enforces its own per-attempt timeout; this is a backstop.
        let deadline = tokio::time::Instant::now() + limit + Duration::from_secs(1);
        loop {
            let event = tokio::time::timeout_at(deadline, self.events.recv())
                .await
                .map_err(|_| anyhow!("timed out connecting to the server"))?;
            match event {
                Some(TransportEvent::Connected) => {
                    debug!("connected");
                    self.controller.on_connected();
                    return Ok(());
                }
                Some(TransportEvent::Message(msg)) => {
                    self.controller.handle(&msg);
                }
                Some(TransportEvent::Disconnected { reason, .. }) => {
                    bail!("could not connect to the server: {reason}");
                }
                Some(TransportEvent::GaveUp { attempts }) => {
                    bail!("could not connect to the server after {attempts} attempt(s)");
                }
                Some(TransportEvent::Reconnecting { .. }) => {}
                None => bail!("connection task stopped"),
            }
        }
    }

    /// Feed server messages through the controller until `accept` picks one.
    ///
    /// A server `error` that `accept` does not pick fails the wait.
    async fn wait_for<T>(&mut self, mut accept: impl FnMut(&ServerMessage) -> Option<T>) -> anyhow::Result<T> {
        let deadline = tokio::time::Instant::now() + self.timeout;
        loop {
            let event = tokio::time::timeout_at(deadline, self.events.recv())
                .await
                .map_err(|_| anyhow!("no reply from the server within {}s", self.timeout.as_secs()))?;
            match event {
                Some(TransportEvent::Message(msg)) => {
                    self.controller.handle(&msg);
                    if let Some(picked) = accept(&msg) {
                        return Ok(picked);
                    }
                    if let ServerMessage::Error { error_code, message, .. } = &msg {
                        bail!("{}", server_error_text(error_code.as_deref(), message));
                    }
                }
                Some(TransportEvent::Disconnected { clean, reason, .. }) => {
                    if clean {
                        bail!("server closed the connection");
                    }
                    bail!("connection lost: {reason}");
                }
                Some(_) => {}
                None => bail!("connection task stopped"),
            }
        }
    }

    // ── Commands ──────────────────────────────────────────────────────────────

    pub fn conversations(&self, limit: usize) -> Vec<Conversation> {
        self.controller.state().conversations.list().iter().take(limit).cloned().collect()
    }

    pub async fn history(&mut self, id: &str) -> anyhow::Result<Vec<Message>> {
        self.controller
            .session_mut()
            .request(ClientAction::GetHistory { conversation_id: id.to_string() })?;
        self.wait_for(|m| match m {
            ServerMessage::Conversation { conversation_id, messages } if conversation_id == id => Some(messages.clone()),
            _ => None,
        })
        .await
    }

    pub async fn settings(&mut self, id: &str) -> anyhow::Result<Settings> {
        self.controller
            .session_mut()
            .request(ClientAction::GetSettings { conversation_id: id.to_string() })?;
        self.wait_for(|m| match m {
            ServerMessage::Settings { conversation_id, settings } if conversation_id == id => Some(settings.clone()),
            _ => None,
        })
        .await
    }

    /// Send `text` and return the conversation id with the assistant reply.
    ///
    /// Without `conversation` a new one is created first.
    pub async fn send(&mut self, text: &str, conversation: Option<&str>) -> anyhow::Result<(String, Message)> {
        let id = match conversation {
            Some(id) => {
                self.controller.select_conversation(id);
                id.to_string()
            }
            None => {
                self.controller.new_conversation()?;
                self.wait_for(|m| match m {
                    ServerMessage::ConversationCreated { conversation_id, .. } => Some(conversation_id.clone()),
                    _ => None,
                })
                .await?
            }
        };

        self.controller.send_user_message(text)?;
        // The backend answers with the full updated history; a lone
        // assistant `message` push is accepted too.
        let reply = self
            .wait_for(|m| match m {
                ServerMessage::Messages { conversation_id, messages } if conversation_id == &id => {
                    messages.iter().rev().find(|m| m.is_assistant()).cloned()
                }
                ServerMessage::Message { conversation_id, message }
                    if conversation_id == &id && message.is_assistant() =>
                {
                    Some(message.clone())
                }
                _ => None,
            })
            .await?;
        Ok((id, reply))
    }

    pub fn close(self) {
        if let Err(e) = self.controller.session().sink.disconnect() {
            debug!("disconnect: {e}");
        }
    }
}

// ── Entry points used by main ─────────────────────────────────────────────────

pub async fn run_list(config: &Config, opts: ConnectOptions, limit: usize, json: bool) -> anyhow::Result<()> {
    let client = HeadlessClient::connect(config, opts).await?;
    let conversations = client.conversations(limit);
    client.close();
    if json {
        println!("{}", serde_json::to_string_pretty(&conversations)?);
    } else {
        println!("{}", render_conversation_table(&conversations, SystemClock.now_ms()));
    }
    Ok(())
}

pub async fn run_history(config: &Config, opts: ConnectOptions, id: &str, format: OutputFormatArg) -> anyhow::Result<()> {
    let mut client = HeadlessClient::connect(config, opts).await?;
    let messages = client.history(id).await.with_context(|| format!("fetching history of {id}"))?;
    client.close();
    println!("{}", render_messages(&messages, format)?);
    Ok(())
}

pub async fn run_send(
    config: &Config,
    opts: ConnectOptions,
    text: &str,
    conversation: Option<&str>,
    format: OutputFormatArg,
) -> anyhow::Result<()> {
    let mut client = HeadlessClient::connect(config, opts).await?;
    let (id, reply) = client.send(text, conversation).await?;
    client.close();
    if conversation.is_none() {
        eprintln!("conversation: {id}");
    }
    println!("{}", render_messages(std::slice::from_ref(&reply), format)?);
    Ok(())
}

pub async fn run_settings(config: &Config, opts: ConnectOptions, id: &str, json: bool) -> anyhow::Result<()> {
    let mut client = HeadlessClient::connect(config, opts).await?;
    let settings = client.settings(id).await.with_context(|| format!("fetching settings of {id}"))?;
    client.close();
    if json {
        println!("{}", serde_json::to_string_pretty(&settings)?);
    } else {
        println!("{}", render_settings(&settings));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::{SinkExt, StreamExt};
    use serde_json::{json, Value};
    use tokio::net::TcpListener;
    use tokio_tungstenite::{accept_async, tungstenite::Message as WsMessage};

    /// Accept one client and answer each action with `reply(action)`.
    async fn serve(reply: fn(ClientAction) -> Vec<Value>) -> ConnectOptions {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.unwrap();
            let mut ws = accept_async(tcp).await.unwrap();
            while let Some(Ok(frame)) = ws.next().await {
                let WsMessage::Text(text) = frame else { continue };
                let action: ClientAction = serde_json::from_str(&text).unwrap();
                for v in reply(action) {
                    if ws.send(WsMessage::Text(v.to_string())).await.is_err() {
                        return;
                    }
                }
            }
        });
        ConnectOptions::new(format!("ws://{addr}/ws"))
    }

    fn config() -> Config {
        let mut config = Config::default();
        config.headless.response_timeout_secs = 5;
        config
    }

    fn chat_backend(action: ClientAction) -> Vec<Value> {
        match action {
            ClientAction::ListConversations => vec![json!({
                "type": "conversation_list",
                "conversations": { "c1": { "title": "Older", "updated_at": 5, "message_count": 2 } }
            })],
            ClientAction::NewConversation { .. } => {
                vec![json!({ "type": "conversation_created", "conversation_id": "c9" })]
            }
            ClientAction::GetHistory { conversation_id } => vec![json!({
                "type": "conversation",
                "conversation_id": conversation_id,
                "messages": [
                    { "role": "user", "content": "hi" },
                    { "role": "assistant", "content": [{ "type": "text", "text": "hello" }] }
                ]
            })],
            ClientAction::GetSettings { conversation_id } => vec![json!({
                "type": "settings",
                "conversation_id": conversation_id,
                "settings": { "max_tokens": 1024 }
            })],
            ClientAction::SendMessage { conversation_id, message } => vec![json!({
                "type": "messages",
                "conversation_id": conversation_id,
                "messages": [message, { "role": "assistant", "content": "pong" }]
            })],
            ClientAction::UpdateSettings { .. } => vec![json!({ "type": "settings_updated" })],
        }
    }

    #[tokio::test]
    async fn connect_loads_the_conversation_list() {
        let opts = serve(chat_backend).await;
        let client = HeadlessClient::connect(&config(), opts).await.unwrap();
        let conversations = client.conversations(10);
        assert_eq!(conversations.len(), 1);
        assert_eq!(conversations[0].title, "Older");
        assert!(client.conversations(0).is_empty());
        client.close();
    }

    #[tokio::test]
    async fn send_creates_a_conversation_and_returns_the_reply() {
        let opts = serve(chat_backend).await;
        let mut client = HeadlessClient::connect(&config(), opts).await.unwrap();
        let (id, reply) = client.send("ping", None).await.unwrap();
        assert_eq!(id, "c9");
        assert!(reply.is_assistant());
        assert_eq!(parley_core::format::extract_text(&reply), "pong");
        client.close();
    }

    #[tokio::test]
    async fn history_and_settings_of_a_conversation() {
        let opts = serve(chat_backend).await;
        let mut client = HeadlessClient::connect(&config(), opts).await.unwrap();
        let messages = client.history("c1").await.unwrap();
        assert_eq!(messages.len(), 2);
        let settings = client.settings("c1").await.unwrap();
        assert_eq!(settings.max_tokens, 1024);
        assert_eq!(settings.model_config, parley_protocol::ModelConfig::default());
        client.close();
    }

    #[tokio::test]
    async fn send_to_an_existing_conversation_returns_the_latest_reply() {
        let opts = serve(chat_backend).await;
        let mut client = HeadlessClient::connect(&config(), opts).await.unwrap();
        let (id, reply) = client.send("ping", Some("c1")).await.unwrap();
        assert_eq!(id, "c1");
        assert_eq!(parley_core::format::extract_text(&reply), "pong");
        client.close();
    }

    #[tokio::test]
    async fn single_message_reply_is_accepted() {
        fn pushes_one_message(action: ClientAction) -> Vec<Value> {
            match action {
                ClientAction::SendMessage { conversation_id, .. } => vec![json!({
                    "type": "message",
                    "conversation_id": conversation_id,
                    "message": { "role": "assistant", "content": "pong" }
                })],
                other => chat_backend(other),
            }
        }
        let opts = serve(pushes_one_message).await;
        let mut client = HeadlessClient::connect(&config(), opts).await.unwrap();
        let (_, reply) = client.send("ping", Some("c1")).await.unwrap();
        assert_eq!(parley_core::format::extract_text(&reply), "pong");
        client.close();
    }

    #[tokio::test]
    async fn server_error_fails_the_command() {
        fn failing(action: ClientAction) -> Vec<Value> {
            match action {
                ClientAction::ListConversations => vec![json!({ "type": "conversation_list", "conversations": [] })],
                _ => vec![json!({ "type": "error", "error_code": "E404", "message": "not found" })],
            }
        }
        let opts = serve(failing).await;
        let mut client = HeadlessClient::connect(&config(), opts).await.unwrap();
        let err = client.history("missing").await.unwrap_err();
        assert_eq!(err.to_string(), "E404: not found");
    }

    #[tokio::test]
    async fn unreachable_server_fails_fast() {
        let mut opts = ConnectOptions::new("ws://127.0.0.1:9/ws");
        opts.connect_timeout = Duration::from_secs(2);
        let err = HeadlessClient::connect(&Config::default(), opts).await.err().unwrap();
        assert!(err.to_string().contains("could not connect"), "{err}");
    }
}
