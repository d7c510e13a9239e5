//! Error types for the room layer.

use spacecats_protocol::PlayerId;

/// Errors from directory updates.
///
/// Handlers never fail on a bad message; they log and skip it. These errors
/// are for callers using the directory directly.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RoomError {
    /// The local player is never stored in its own directory.
    #[error("player {0} is the local player")]
    LocalPlayer(PlayerId),

    /// No entry for this player.
    #[error("player {0} is not in the directory")]
    UnknownPlayer(PlayerId),
}
