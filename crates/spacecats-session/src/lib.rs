//! Session-level state for Space Cats.
//!
//! Everything about *who* is playing and *what* they're playing in, as
//! opposed to what's on the wire:
//!
//! 1. **Identity** — a stable [`PlayerId`](spacecats_protocol::PlayerId),
//!    generated once and persisted through a [`KeyValueStore`]
//! 2. **Roles** — whether this instance is hosting, a client, or neither
//!    ([`ConnectionRole`])
//! 3. **Worlds** — the [`WorldDescriptor`](spacecats_protocol::WorldDescriptor)
//!    a host creates before advertising ([`WorldConfig`], [`new_world_descriptor`])
//!
//! # How it fits in the stack
//!
//! ```text
//! Sync policy (above)  ← asks for an identity, a role, a world to host
//!     ↕
//! Session Layer (this crate)  ← identity, storage seam, roles, worlds
//!     ↕
//! Protocol Layer (below)  ← provides PlayerId, WorldDescriptor
//! ```

mod error;
mod identity;
mod role;
mod store;
mod world;

pub use error::SessionError;
pub use identity::{generate_player_id, load_or_create_player_id, PLAYER_ID_KEY};
pub use role::ConnectionRole;
pub use store::{FileStore, KeyValueStore, MemoryStore};
pub use world::{new_world_descriptor, WorldConfig};

/// Milliseconds since the Unix epoch, or 0 if the clock is before it.
pub(crate) fn unix_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Nine random base-36 characters, the suffix every generated id carries.
pub(crate) fn random_suffix() -> String {
    use rand::Rng;
    const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut rng = rand::rng();
    (0..9)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect()
}
