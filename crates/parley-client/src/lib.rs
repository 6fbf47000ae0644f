// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! WebSocket transport for the parley chat protocol.
//!
//! [`Connection::spawn`] starts a background task that owns the socket.  The
//! task decodes server frames into [`TransportEvent`]s, writes
//! [`ClientAction`](parley_protocol::ClientAction)s queued through the
//! [`ClientHandle`], and reconnects with exponential backoff after an
//! unexpected close.  A clean close (server close frame or
//! [`ClientHandle::disconnect`]) never triggers a reconnect.

mod connection;
mod error;
mod events;
mod policy;

pub use connection::{ClientHandle, ConnectOptions, Connection};
pub use error::ClientError;
pub use events::{ConnectionState, TransportEvent};
pub use policy::ReconnectPolicy;
