use std::fmt;
use std::time::Duration;

use parley_protocol::ServerMessage;

/// Lifecycle of the socket as seen through [`crate::ClientHandle::state`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Connected,
    Reconnecting { attempt: u32 },
    Disconnected,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Connecting => f.write_str("connecting"),
            ConnectionState::Connected => f.write_str("connected"),
            ConnectionState::Reconnecting { attempt } => write!(f, "reconnecting (#{attempt})"),
            ConnectionState::Disconnected => f.write_str("disconnected"),
        }
    }
}

/// Everything the connection task reports to its owner.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// The socket is open; the attempt counter has been reset.
    Connected,
    /// A decoded server frame.
    Message(ServerMessage),
    /// The socket closed or a connect attempt failed.
    Disconnected {
        clean: bool,
        code: Option<u16>,
        reason: String,
    },
    /// A reconnect is scheduled after `delay`.
    Reconnecting { attempt: u32, delay: Duration },
    /// Retries are exhausted; call [`crate::ClientHandle::reconnect`] to try again.
    GaveUp { attempts: u32 },
}
