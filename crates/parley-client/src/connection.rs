// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Background connection task and the handle used to drive it.

use std::sync::Once;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use parley_config::Config;
use parley_protocol::{resolve_ws_url, ClientAction, ProtocolError, ServerMessage};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::{
    connect_async_tls_with_config,
    tungstenite::{
        client::IntoClientRequest,
        protocol::{frame::coding::CloseCode, CloseFrame, Message as WsMessage},
    },
    MaybeTlsStream, WebSocketStream,
};
use tracing::{debug, info, warn};

use crate::{ClientError, ConnectionState, ReconnectPolicy, TransportEvent};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

static CRYPTO_PROVIDER: Once = Once::new();

/// Everything needed to open (and reopen) the socket.
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    /// `ws://` or `wss://` URL of the chat endpoint.
    pub url: String,
    /// Sent as `Authorization: Bearer <token>` during the upgrade.
    pub token: Option<String>,
    pub connect_timeout: Duration,
    pub reconnect: ReconnectPolicy,
}

impl ConnectOptions {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            token: None,
            connect_timeout: Duration::from_secs(10),
            reconnect: ReconnectPolicy::default(),
        }
    }

    /// Build options from the loaded configuration; `server.url` may be an
    /// `http(s)://` origin.
    pub fn from_config(config: &Config) -> Result<Self, ProtocolError> {
        Ok(Self {
            url: resolve_ws_url(&config.server.url)?,
            token: config.server.resolve_token(),
            connect_timeout: config.server.connect_timeout(),
            reconnect: ReconnectPolicy::from(&config.reconnect),
        })
    }
}

enum Command {
    Send(ClientAction),
    Disconnect,
    Reconnect,
}

/// Cheap, cloneable handle to the connection task.
#[derive(Debug, Clone)]
pub struct ClientHandle {
    cmd_tx: mpsc::UnboundedSender<Command>,
    state_rx: watch::Receiver<ConnectionState>,
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::Send(a) => write!(f, "Send({})", a.name()),
            Command::Disconnect => f.write_str("Disconnect"),
            Command::Reconnect => f.write_str("Reconnect"),
        }
    }
}

impl ClientHandle {
    /// Queue an action for the socket.
    ///
    /// Fails with [`ClientError::NotConnected`] when the socket is not open;
    /// the action is not kept for later.
    pub fn send(&self, action: ClientAction) -> Result<(), ClientError> {
        if !self.is_connected() {
            return Err(ClientError::NotConnected);
        }
        self.cmd_tx.send(Command::Send(action)).map_err(|_| ClientError::Closed)
    }

    pub fn state(&self) -> ConnectionState {
        *self.state_rx.borrow()
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }

    /// Close the socket cleanly and cancel any pending reconnect.
    pub fn disconnect(&self) -> Result<(), ClientError> {
        self.cmd_tx.send(Command::Disconnect).map_err(|_| ClientError::Closed)
    }

    /// Reconnect now with a fresh attempt counter.
    pub fn reconnect(&self) -> Result<(), ClientError> {
        self.cmd_tx.send(Command::Reconnect).map_err(|_| ClientError::Closed)
    }
}

pub struct Connection;

impl Connection {
    /// Start the connection task on the current tokio runtime.
    ///
    /// The task lives until every [`ClientHandle`] clone is dropped.
    pub fn spawn(opts: ConnectOptions) -> (ClientHandle, mpsc::UnboundedReceiver<TransportEvent>) {
        if opts.url.starts_with("wss://") {
            CRYPTO_PROVIDER.call_once(|| {
                let _ = rustls::crypto::ring::default_provider().install_default();
            });
        }

        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ConnectionState::Connecting);

        let worker = Worker { opts, cmd_rx, event_tx, state_tx, attempts: 0 };
        tokio::spawn(worker.run());

        (ClientHandle { cmd_tx, state_rx }, event_rx)
    }
}

// ── Worker ────────────────────────────────────────────────────────────────────

enum Step {
    Connect,
    Backoff,
    Idle,
    Exit,
}

enum SessionEnd {
    Closed { clean: bool, code: Option<u16>, reason: String },
    UserDisconnect,
    Restart,
    HandleDropped,
}

struct Worker {
    opts: ConnectOptions,
    cmd_rx: mpsc::UnboundedReceiver<Command>,
    event_tx: mpsc::UnboundedSender<TransportEvent>,
    state_tx: watch::Sender<ConnectionState>,
    attempts: u32,
}

impl Worker {
    async fn run(mut self) {
        let mut step = Step::Connect;
        loop {
            step = match step {
                Step::Connect => self.connect().await,
                Step::Backoff => self.backoff().await,
                Step::Idle => self.idle().await,
                Step::Exit => break,
            };
        }
        self.set_state(ConnectionState::Disconnected);
        debug!(url = %self.opts.url, "connection task finished");
    }

    fn emit(&self, event: TransportEvent) {
        // Nobody listening is fine; the handle may outlive the receiver.
        let _ = self.event_tx.send(event);
    }

    fn set_state(&self, state: ConnectionState) {
        self.state_tx.send_replace(state);
    }

    async fn connect(&mut self) -> Step {
        if self.attempts == 0 {
            self.set_state(ConnectionState::Connecting);
        }

        let ws = match tokio::time::timeout(self.opts.connect_timeout, open(&self.opts)).await {
            Ok(Ok(ws)) => ws,
            Ok(Err(e)) => return self.connect_failed(e),
            Err(_) => return self.connect_failed(ClientError::Timeout(self.opts.connect_timeout)),
        };

        info!(url = %self.opts.url, "connected");
        self.attempts = 0;
        self.set_state(ConnectionState::Connected);
        self.emit(TransportEvent::Connected);

        let end = self.session(ws).await;
        self.set_state(ConnectionState::Disconnected);

        match end {
            SessionEnd::Closed { clean, code, reason } => {
                if clean {
                    info!(?code, %reason, "server closed the connection");
                } else {
                    warn!(%reason, "connection lost");
                }
                self.emit(TransportEvent::Disconnected { clean, code, reason });
                if clean { Step::Idle } else { Step::Backoff }
            }
            SessionEnd::UserDisconnect => {
                self.emit(TransportEvent::Disconnected {
                    clean: true,
                    code: Some(u16::from(CloseCode::Normal)),
                    reason: "client disconnect".into(),
                });
                Step::Idle
            }
            SessionEnd::Restart => {
                self.emit(TransportEvent::Disconnected {
                    clean: true,
                    code: Some(u16::from(CloseCode::Normal)),
                    reason: "client reconnect".into(),
                });
                Step::Connect
            }
            SessionEnd::HandleDropped => Step::Exit,
        }
    }

    fn connect_failed(&mut self, err: ClientError) -> Step {
        warn!(url = %self.opts.url, error = %err, "connect failed");
        self.set_state(ConnectionState::Disconnected);
        self.emit(TransportEvent::Disconnected { clean: false, code: None, reason: err.to_string() });
        Step::Backoff
    }

    /// Pump frames both ways until the socket closes or the handle asks to stop.
    async fn session(&mut self, ws: WsStream) -> SessionEnd {
        let (mut sink, mut stream) = ws.split();

        loop {
            tokio::select! {
                frame = stream.next() => match frame {
                    Some(Ok(WsMessage::Text(text))) => match ServerMessage::parse(&text) {
                        Ok(msg) => {
                            debug!(kind = %msg.kind(), "server message");
                            self.emit(TransportEvent::Message(msg));
                        }
                        Err(e) => warn!(frame = %text, "unparseable frame from server: {e}"),
                    },
                    Some(Ok(WsMessage::Close(frame))) => {
                        let _ = sink.close().await;
                        let (code, reason) = match frame {
                            Some(f) => (Some(u16::from(f.code)), f.reason.into_owned()),
                            None => (None, String::new()),
                        };
                        return SessionEnd::Closed { clean: true, code, reason };
                    }
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        return SessionEnd::Closed { clean: false, code: None, reason: e.to_string() };
                    }
                    None => {
                        return SessionEnd::Closed {
                            clean: false,
                            code: None,
                            reason: "stream ended without close frame".into(),
                        };
                    }
                },
                cmd = self.cmd_rx.recv() => match cmd {
                    Some(Command::Send(action)) => {
                        let json = match action.to_json() {
                            Ok(j) => j,
                            Err(e) => {
                                warn!(action = action.name(), "failed to encode action: {e}");
                                continue;
                            }
                        };
                        debug!(action = action.name(), "sending");
                        if let Err(e) = sink.send(WsMessage::Text(json)).await {
                            return SessionEnd::Closed { clean: false, code: None, reason: e.to_string() };
                        }
                    }
                    Some(Command::Disconnect) => {
                        close_normally(&mut sink, "client disconnect").await;
                        return SessionEnd::UserDisconnect;
                    }
                    Some(Command::Reconnect) => {
                        close_normally(&mut sink, "client reconnect").await;
                        return SessionEnd::Restart;
                    }
                    None => {
                        close_normally(&mut sink, "client shutdown").await;
                        return SessionEnd::HandleDropped;
                    }
                },
            }
        }
    }

    /// Wait out the backoff delay, then retry.  A disconnect request during
    /// the wait cancels the retry.
    async fn backoff(&mut self) -> Step {
        let policy = self.opts.reconnect;
        if !policy.should_retry(self.attempts) {
            warn!(attempts = self.attempts, "giving up on reconnecting");
            self.emit(TransportEvent::GaveUp { attempts: self.attempts });
            return Step::Idle;
        }

        let delay = policy.delay_for(self.attempts);
        self.attempts += 1;
        let attempt = self.attempts;
        info!(attempt, max = policy.max_attempts, ?delay, "scheduling reconnect");
        self.set_state(ConnectionState::Reconnecting { attempt });
        self.emit(TransportEvent::Reconnecting { attempt, delay });

        let sleep = tokio::time::sleep(delay);
        tokio::pin!(sleep);
        loop {
            tokio::select! {
                _ = &mut sleep => return Step::Connect,
                cmd = self.cmd_rx.recv() => match cmd {
                    None => return Step::Exit,
                    Some(Command::Disconnect) => {
                        debug!("reconnect cancelled");
                        self.set_state(ConnectionState::Disconnected);
                        return Step::Idle;
                    }
                    Some(Command::Reconnect) => {
                        self.attempts = 0;
                        return Step::Connect;
                    }
                    Some(Command::Send(action)) => {
                        debug!(action = action.name(), "dropping action while disconnected");
                    }
                },
            }
        }
    }

    /// Disconnected for good until the handle asks for a reconnect.
    async fn idle(&mut self) -> Step {
        self.set_state(ConnectionState::Disconnected);
        loop {
            match self.cmd_rx.recv().await {
                None => return Step::Exit,
                Some(Command::Reconnect) => {
                    self.attempts = 0;
                    return Step::Connect;
                }
                Some(Command::Disconnect) => {}
                Some(Command::Send(action)) => {
                    debug!(action = action.name(), "dropping action while disconnected");
                }
            }
        }
    }
}

/// Open an (optionally authenticated) WebSocket connection.
async fn open(opts: &ConnectOptions) -> Result<WsStream, ClientError> {
    let mut request = opts.url.as_str().into_client_request()?;

    if let Some(token) = &opts.token {
        request.headers_mut().insert(
            "Authorization",
            format!("Bearer {token}").parse().map_err(|_| ClientError::InvalidToken)?,
        );
    }

    let (stream, response) = connect_async_tls_with_config(request, None, false, None).await?;
    debug!(status = %response.status(), "WebSocket upgrade complete");
    Ok(stream)
}

async fn close_normally<S>(sink: &mut S, reason: &'static str)
where
    S: SinkExt<WsMessage> + Unpin,
{
    let frame = CloseFrame { code: CloseCode::Normal, reason: reason.into() };
    let _ = sink.send(WsMessage::Close(Some(frame))).await;
    let _ = sink.close().await;
}
