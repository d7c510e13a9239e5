use std::fmt;

/// What this instance is doing in the current game room.
///
/// ```text
///               host()
///   Unconnected ───────→ Host
///        │
///        └──── join() ─→ Client
/// ```
///
/// There is exactly one role per session and it never changes mid-session:
/// if the host leaves, nobody takes over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionRole {
    /// Owns the world and the authoritative player list.
    Host,
    /// Mirrors whatever the host broadcasts.
    Client,
    /// Not in a game room.
    #[default]
    Unconnected,
}

impl ConnectionRole {
    pub fn is_host(self) -> bool {
        self == Self::Host
    }

    pub fn is_client(self) -> bool {
        self == Self::Client
    }
}

impl fmt::Display for ConnectionRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Host => f.write_str("host"),
            Self::Client => f.write_str("client"),
            Self::Unconnected => f.write_str("unconnected"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_unconnected() {
        assert_eq!(ConnectionRole::default(), ConnectionRole::Unconnected);
    }

    #[test]
    fn test_predicates() {
        assert!(ConnectionRole::Host.is_host());
        assert!(!ConnectionRole::Host.is_client());
        assert!(ConnectionRole::Client.is_client());
        assert!(!ConnectionRole::Unconnected.is_host());
    }

    #[test]
    fn test_display_reads_naturally_in_errors() {
        let err = crate::SessionError::IllegalForRole {
            operation: "broadcast",
            role: ConnectionRole::Client,
        };
        assert_eq!(err.to_string(), "broadcast is not allowed as client");
    }
}
