//! Room-level protocol handling for Space Cats.
//!
//! Three pieces, all plain synchronous state machines with no I/O:
//!
//! - [`PlayerDirectory`] — who else is in the game room and where they are
//! - [`LobbyHandler`] — the public games list and this host's advertisement
//! - [`HostRoom`] / [`ClientRoom`] — what each role does with a game-room
//!   message or a tick
//!
//! Handlers never send anything themselves. Like a pure game-logic function,
//! each call returns the lines it wants sent as [`Outbound`] pairs, and the
//! caller hands them to the transport. That keeps every rule here testable
//! without a socket.

mod config;
mod directory;
mod error;
mod lobby;
mod room;

pub use config::RoomConfig;
pub use directory::PlayerDirectory;
pub use error::RoomError;
pub use lobby::LobbyHandler;
pub use room::{ClientOutcome, ClientRoom, HostOutcome, HostRoom, MotionTracker};

use spacecats_protocol::{ChannelKind, Message};

/// A message to send, paired with the channel it goes out on.
pub type Outbound = (ChannelKind, Message);
