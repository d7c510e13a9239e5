//! Relay transport for Space Cats.
//!
//! The relay is a plain WebSocket fan-out: everything one socket sends on a
//! path is delivered to every other socket on the same path. We use two paths
//! at once:
//!
//! - the **lobby** (`<relay>/<game>/lobby`) for discovery, and
//! - a **game room** (`<relay>/<game>/<room id>`) for one gameplay session.
//!
//! [`RelayTransport`] owns both sockets. Each socket gets a pair of background
//! pump tasks (reader and writer) that do nothing but move frames; every
//! frame, close and error is funnelled into a single event stream that the
//! caller drains with [`RelayTransport::next_event`]. Handler logic never runs
//! on the pump tasks, so nothing upstream needs a lock.
//!
//! # Feature Flags
//!
//! - `tls`: enables `wss://` relay URLs via rustls with bundled web roots.

mod config;
mod error;
mod relay;

pub use config::{TransportConfig, DEFAULT_GAME, DEFAULT_RELAY_URL};
pub use error::TransportError;
pub use relay::RelayTransport;

use std::fmt;

use spacecats_protocol::{ChannelKind, Message};

/// Opaque identifier for one socket.
///
/// Every connect attempt gets a fresh id, so events from a socket that has
/// since been replaced can be told apart from the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Something that happened on one of the two channels.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportEvent {
    /// The socket it happened on.
    pub connection: ConnectionId,
    /// Which channel that socket was serving.
    pub channel: ChannelKind,
    pub kind: TransportEventKind,
}

/// What happened.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEventKind {
    /// The socket finished its handshake.
    Opened,
    /// A line arrived and decoded to a message.
    Message(Message),
    /// The socket is gone (remote close, error, or end of stream).
    Closed,
    /// The socket reported an error. A `Closed` follows.
    Error(String),
}
