use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("not connected to the chat server")]
    NotConnected,

    #[error("connection task has stopped")]
    Closed,

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("bearer token is not a valid header value")]
    InvalidToken,

    #[error("connect timed out after {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Protocol(#[from] parley_protocol::ProtocolError),
}
