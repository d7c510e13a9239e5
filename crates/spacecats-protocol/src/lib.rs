//! Wire protocol for Space Cats.
//!
//! This crate defines the "language" spoken over the relay:
//!
//! - **Types** ([`Message`], [`PlayerState`], [`Snapshot`], [`GameListing`], etc.) —
//!   the typed values that travel between peers.
//! - **Codec** ([`WireCodec`]) — how those values are turned into text lines and
//!   how the relay's loosely framed lines are turned back into values.
//! - **Errors** ([`ProtocolError`]) — why a line could not be decoded.
//!
//! # Architecture
//!
//! The protocol layer sits between the transport (raw text frames) and the room
//! handlers (player directory, lobby list). It knows nothing about sockets or
//! roles; it only knows how to read and write lines.
//!
//! ```text
//! Transport (text) → Protocol (Message) → Room handlers (directory, lobby)
//! ```

mod codec;
mod error;
mod types;

pub use codec::WireCodec;
pub use error::ProtocolError;
pub use types::{
    ActionKind, ChannelKind, GameListing, Message, PlayerAction, PlayerId,
    PlayerState, RoomId, Snapshot, WorldDescriptor, WorldState, placeholder_name,
    DEFAULT_CLASS, DEFAULT_MAX_PLAYERS, DEFAULT_PLAYER_SIZE,
};
