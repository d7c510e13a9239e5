//! Stable player identity.

use spacecats_protocol::PlayerId;

use crate::{random_suffix, unix_millis, KeyValueStore, SessionError};

/// Store key the identity lives under.
pub const PLAYER_ID_KEY: &str = "playerId";

/// A fresh id: `player_<unix millis>_<9 base-36 chars>`.
pub fn generate_player_id() -> PlayerId {
    PlayerId::new(format!("player_{}_{}", unix_millis(), random_suffix()))
}

/// Returns the stored identity, generating and storing one on first use.
///
/// An empty stored value counts as missing.
///
/// # Errors
/// Whatever the store returns; nothing is generated if the read fails, so a
/// broken store never silently hands out a new identity each run.
pub fn load_or_create_player_id(store: &mut impl KeyValueStore) -> Result<PlayerId, SessionError> {
    if let Some(existing) = store.get(PLAYER_ID_KEY)?.filter(|id| !id.is_empty()) {
        tracing::debug!(player_id = %existing, "loaded stored identity");
        return Ok(PlayerId::new(existing));
    }

    let id = generate_player_id();
    store.set(PLAYER_ID_KEY, id.as_str())?;
    tracing::info!(player_id = %id, "generated new identity");
    Ok(id)
}
