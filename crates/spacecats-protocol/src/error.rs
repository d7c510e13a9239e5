//! Error types for the protocol layer.
//!
//! Decoding never surfaces these to callers of [`WireCodec::decode`](crate::WireCodec::decode):
//! a failed line is logged and dropped. The enum exists so every matcher in the
//! decode chain can say *why* it gave up, which is what ends up in the log.

use crate::ChannelKind;

/// Errors that can occur while encoding or decoding relay lines.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serializing an embedded JSON payload failed.
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// An embedded JSON payload was malformed or had the wrong shape.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// A required positional field or JSON key was absent.
    #[error("missing field: {0}")]
    MissingField(&'static str),

    /// The relay sent an `@<type>` envelope we don't understand.
    #[error("unknown relay envelope: @{0}")]
    UnknownEnvelope(String),

    /// The message decoded fine but belongs to the other channel.
    #[error("{message} is not valid on the {channel} channel")]
    WrongChannel {
        message: &'static str,
        channel: ChannelKind,
    },

    /// No matcher in the decode chain recognised the line.
    #[error("unrecognised line")]
    Unrecognised,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrong_channel_message_names_both_sides() {
        let err = ProtocolError::WrongChannel {
            message: "ListRequest",
            channel: ChannelKind::GameRoom,
        };
        assert_eq!(
            err.to_string(),
            "ListRequest is not valid on the game-room channel"
        );
    }

    #[test]
    fn test_decode_error_wraps_serde_message() {
        let inner = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = ProtocolError::Decode(inner);
        assert!(err.to_string().starts_with("decode failed:"));
    }
}
