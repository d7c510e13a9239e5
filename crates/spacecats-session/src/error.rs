//! Error types for the session layer.

use crate::ConnectionRole;

/// Errors from identity storage and role transitions.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Reading or writing the backing store failed.
    #[error("storage failed: {0}")]
    Storage(#[from] std::io::Error),

    /// The backing file exists but isn't a JSON object of strings.
    #[error("storage is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    /// Hosting or joining while a session is already running.
    /// Roles are fixed for the lifetime of a session.
    #[error("already in a session as {0}")]
    AlreadyActive(ConnectionRole),

    /// An operation that needs a session was called without one.
    #[error("no active session")]
    NotActive,

    /// The operation exists, but not for this role (e.g. a client
    /// broadcasting authoritative state).
    #[error("{operation} is not allowed as {role}")]
    IllegalForRole {
        operation: &'static str,
        role: ConnectionRole,
    },
}
