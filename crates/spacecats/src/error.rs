//! Unified error type for Space Cats sync.

use spacecats_protocol::ProtocolError;
use spacecats_room::RoomError;
use spacecats_session::SessionError;
use spacecats_transport::TransportError;

/// Top-level error wrapping every crate's error.
///
/// `#[from]` on each variant lets `?` convert sub-crate errors, so callers
/// of [`RelayClient`](crate::RelayClient) only ever match on this one type.
///
/// `RelayClient` itself never returns [`Protocol`](Self::Protocol) or
/// [`Room`](Self::Room). Those two exist for code that drives
/// [`WireCodec`](spacecats_protocol::WireCodec) or
/// [`PlayerDirectory`](spacecats_room::PlayerDirectory) directly, e.g.
/// alongside a [`SyncPolicy`](crate::SyncPolicy), and wants one error type.
#[derive(Debug, thiserror::Error)]
pub enum SpaceCatsError {
    /// Connecting to the relay failed or timed out.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A message couldn't be encoded. Only from direct `WireCodec` use.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Identity storage failed, or the operation isn't legal for the
    /// current role.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A directory operation was rejected. Only from direct
    /// `PlayerDirectory` use.
    #[error(transparent)]
    Room(#[from] RoomError),

    /// An environment variable held a value that couldn't be parsed.
    #[error("invalid value {value:?} for {key}")]
    InvalidConfig { key: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use spacecats_protocol::{ChannelKind, PlayerId};
    use spacecats_session::ConnectionRole;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::Timeout {
            url: "ws://relay/space-cats/lobby".into(),
            after: std::time::Duration::from_secs(10),
        };
        let err: SpaceCatsError = err.into();
        assert!(matches!(err, SpaceCatsError::Transport(_)));
        assert!(err.to_string().contains("lobby"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::WrongChannel {
            message: "StateRequest",
            channel: ChannelKind::Lobby,
        };
        let err: SpaceCatsError = err.into();
        assert!(matches!(err, SpaceCatsError::Protocol(_)));
    }

    #[test]
    fn test_from_session_error() {
        let err: SpaceCatsError = SessionError::AlreadyActive(ConnectionRole::Host).into();
        assert!(matches!(err, SpaceCatsError::Session(_)));
        assert!(err.to_string().contains("host"));
    }

    #[test]
    fn test_from_room_error() {
        let err: SpaceCatsError = RoomError::UnknownPlayer(PlayerId::from("p1")).into();
        assert!(matches!(err, SpaceCatsError::Room(_)));
    }

    #[test]
    fn test_direct_directory_use_lifts_into_room() {
        use spacecats_room::PlayerDirectory;

        fn nudge(dir: &mut PlayerDirectory, id: &PlayerId) -> Result<(), SpaceCatsError> {
            dir.move_to(id, 1.0, 1.0)?;
            Ok(())
        }

        let mut dir = PlayerDirectory::new(PlayerId::from("me"));
        let err = nudge(&mut dir, &PlayerId::from("ghost")).unwrap_err();
        assert!(matches!(
            err,
            SpaceCatsError::Room(RoomError::UnknownPlayer(ref id)) if id.as_str() == "ghost"
        ));
    }

    #[test]
    fn test_invalid_config_names_the_key() {
        let err = SpaceCatsError::InvalidConfig {
            key: "SPACECATS_CONNECT_TIMEOUT_MS",
            value: "soon".into(),
        };
        assert_eq!(
            err.to_string(),
            "invalid value \"soon\" for SPACECATS_CONNECT_TIMEOUT_MS"
        );
    }
}
