use spacecats_protocol::{ChannelKind, PlayerAction};

/// What gameplay and UI code hears from the sync layer.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    /// A non-movement action from another player (`shoot` and friends).
    Action(PlayerAction),
    /// A host snapshot replaced the world state and the directory.
    SnapshotApplied,
    /// The directory changed without a snapshot (join, leave, move, report).
    DirectoryChanged,
    /// The public games list changed.
    GamesUpdated,
    /// A channel is gone. Losing the game room ends the session.
    Closed(ChannelKind),
    /// The relay reported an error, or a socket did. Nothing is retried.
    RelayWarning(String),
}
