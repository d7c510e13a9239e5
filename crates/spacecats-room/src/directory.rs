//! The reconciled view of everyone else in the game room.

use std::collections::BTreeMap;

use spacecats_protocol::{
    placeholder_name, PlayerId, PlayerState, DEFAULT_CLASS, DEFAULT_PLAYER_SIZE,
};

use crate::RoomError;

/// `PlayerId -> PlayerState` for every *other* participant.
///
/// Three invariants hold after every call:
///
/// 1. The local player's own id is never a key.
/// 2. Every stored position is finite and non-negative, every size is
///    positive, every name and class non-empty.
/// 3. On a host, `broadcast_players(local)` is exactly what gets sent:
///    the local entry first, then everyone here.
///
/// Entries are kept in id order, so snapshots list players stably.
#[derive(Debug, Clone)]
pub struct PlayerDirectory {
    local_id: PlayerId,
    players: BTreeMap<PlayerId, PlayerState>,
}

impl PlayerDirectory {
    pub fn new(local_id: PlayerId) -> Self {
        Self {
            local_id,
            players: BTreeMap::new(),
        }
    }

    pub fn local_id(&self) -> &PlayerId {
        &self.local_id
    }

    /// Inserts or replaces an entry with a full state.
    ///
    /// Returns `true` if the player wasn't known before.
    ///
    /// # Errors
    /// [`RoomError::LocalPlayer`] if `state` describes the local player.
    pub fn upsert(&mut self, state: PlayerState) -> Result<bool, RoomError> {
        if state.id == self.local_id {
            return Err(RoomError::LocalPlayer(state.id));
        }
        let state = sanitize(state);
        let is_new = self.players.insert(state.id.clone(), state).is_none();
        Ok(is_new)
    }

    /// Adds a placeholder for a player known only by id.
    ///
    /// Returns `false` (and leaves the entry alone) if the player is already
    /// known or is the local player.
    pub fn insert_placeholder(&mut self, id: &PlayerId, at: (f64, f64)) -> bool {
        if *id == self.local_id || self.players.contains_key(id) {
            return false;
        }
        let placeholder = sanitize(PlayerState::placeholder(id.clone(), at.0, at.1));
        self.players.insert(id.clone(), placeholder);
        true
    }

    /// Moves a known player.
    ///
    /// # Errors
    /// [`RoomError::UnknownPlayer`] if there is no entry for `id`.
    pub fn move_to(&mut self, id: &PlayerId, x: f64, y: f64) -> Result<(), RoomError> {
        let entry = self
            .players
            .get_mut(id)
            .ok_or_else(|| RoomError::UnknownPlayer(id.clone()))?;
        entry.x = coordinate(x);
        entry.y = coordinate(y);
        Ok(())
    }

    pub fn remove(&mut self, id: &PlayerId) -> Option<PlayerState> {
        self.players.remove(id)
    }

    /// Replaces every entry with `players`, skipping the local player.
    ///
    /// Applying the same list twice leaves the same directory.
    pub fn replace_all(&mut self, players: impl IntoIterator<Item = PlayerState>) {
        self.players = players
            .into_iter()
            .filter(|p| p.id != self.local_id)
            .map(|p| (p.id.clone(), sanitize(p)))
            .collect();
    }

    /// The `players` array a host broadcasts: `local` first, then everyone
    /// in the directory.
    pub fn broadcast_players(&self, local: &PlayerState) -> Vec<PlayerState> {
        std::iter::once(sanitize(local.clone()))
            .chain(self.players.values().cloned())
            .collect()
    }

    pub fn get(&self, id: &PlayerId) -> Option<&PlayerState> {
        self.players.get(id)
    }

    pub fn contains(&self, id: &PlayerId) -> bool {
        self.players.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlayerState> {
        self.players.values()
    }

    pub fn clear(&mut self) {
        self.players.clear();
    }
}

// ---------------------------------------------------------------------------
// Sanitizing
// ---------------------------------------------------------------------------

fn sanitize(mut state: PlayerState) -> PlayerState {
    state.x = coordinate(state.x);
    state.y = coordinate(state.y);
    state.width = size(state.width);
    state.height = size(state.height);
    if state.name.trim().is_empty() {
        state.name = placeholder_name(&state.id);
    }
    if state.class_name.trim().is_empty() {
        state.class_name = DEFAULT_CLASS.to_string();
    }
    state
}

fn coordinate(v: f64) -> f64 {
    if v.is_finite() && v > 0.0 { v } else { 0.0 }
}

fn size(v: f64) -> f64 {
    if v.is_finite() && v > 0.0 { v } else { DEFAULT_PLAYER_SIZE }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn me() -> PlayerId {
        PlayerId::from("me")
    }

    fn state(id: &str, x: f64, y: f64) -> PlayerState {
        PlayerState::new(PlayerId::from(id), id.to_uppercase(), x, y)
    }

    // =====================================================================
    // Local id exclusion
    // =====================================================================

    #[test]
    fn test_upsert_rejects_local_player() {
        let mut dir = PlayerDirectory::new(me());
        let err = dir.upsert(state("me", 1.0, 1.0)).unwrap_err();
        assert_eq!(err, RoomError::LocalPlayer(me()));
        assert!(dir.is_empty());
    }

    #[test]
    fn test_placeholder_for_local_player_is_refused() {
        let mut dir = PlayerDirectory::new(me());
        assert!(!dir.insert_placeholder(&me(), (0.0, 0.0)));
        assert!(!dir.contains(&me()));
    }

    #[test]
    fn test_replace_all_drops_local_player() {
        let mut dir = PlayerDirectory::new(me());
        dir.replace_all(vec![state("host", 1.0, 2.0), state("me", 3.0, 4.0)]);
        assert_eq!(dir.len(), 1);
        assert!(dir.contains(&PlayerId::from("host")));
        assert!(!dir.contains(&me()));
    }

    // =====================================================================
    // Upsert / placeholder
    // =====================================================================

    #[test]
    fn test_upsert_reports_new_then_existing() {
        let mut dir = PlayerDirectory::new(me());
        assert!(dir.upsert(state("p1", 1.0, 1.0)).unwrap());
        assert!(!dir.upsert(state("p1", 2.0, 2.0)).unwrap());
        assert_eq!(dir.get(&PlayerId::from("p1")).unwrap().x, 2.0);
    }

    #[test]
    fn test_full_report_replaces_placeholder() {
        let mut dir = PlayerDirectory::new(me());
        let p7 = PlayerId::from("p7");
        assert!(dir.insert_placeholder(&p7, (400.0, 300.0)));
        assert_eq!(dir.get(&p7).unwrap().name, "Player_p7");

        let mut report = state("p7", 10.0, 20.0);
        report.name = "Nyx".into();
        report.class_name = "mage".into();
        dir.upsert(report).unwrap();

        let entry = dir.get(&p7).unwrap();
        assert_eq!(entry.name, "Nyx");
        assert_eq!(entry.class_name, "mage");
        assert_eq!(entry.position(), (10.0, 20.0));
    }

    #[test]
    fn test_placeholder_does_not_overwrite_known_player() {
        let mut dir = PlayerDirectory::new(me());
        dir.upsert(state("p1", 5.0, 5.0)).unwrap();
        assert!(!dir.insert_placeholder(&PlayerId::from("p1"), (400.0, 300.0)));
        assert_eq!(dir.get(&PlayerId::from("p1")).unwrap().position(), (5.0, 5.0));
    }

    // =====================================================================
    // Sanitizing
    // =====================================================================

    #[test]
    fn test_bad_numbers_are_sanitized() {
        let mut dir = PlayerDirectory::new(me());
        let mut bad = state("p1", f64::NAN, -5.0);
        bad.width = 0.0;
        bad.height = f64::INFINITY;
        bad.name = "  ".into();
        bad.class_name = String::new();
        dir.upsert(bad).unwrap();

        let entry = dir.get(&PlayerId::from("p1")).unwrap();
        assert_eq!(entry.position(), (0.0, 0.0));
        assert_eq!(entry.width, DEFAULT_PLAYER_SIZE);
        assert_eq!(entry.height, DEFAULT_PLAYER_SIZE);
        assert_eq!(entry.name, "Player_p1");
        assert_eq!(entry.class_name, DEFAULT_CLASS);
    }

    #[test]
    fn test_move_to_sanitizes_and_requires_entry() {
        let mut dir = PlayerDirectory::new(me());
        let p1 = PlayerId::from("p1");
        assert_eq!(
            dir.move_to(&p1, 1.0, 1.0),
            Err(RoomError::UnknownPlayer(p1.clone()))
        );

        dir.upsert(state("p1", 1.0, 1.0)).unwrap();
        dir.move_to(&p1, f64::NEG_INFINITY, 42.0).unwrap();
        assert_eq!(dir.get(&p1).unwrap().position(), (0.0, 42.0));
    }

    // =====================================================================
    // Snapshot application and broadcast shape
    // =====================================================================

    #[test]
    fn test_replace_all_is_idempotent() {
        let players = vec![state("a", 1.0, 1.0), state("b", 2.0, 2.0)];
        let mut once = PlayerDirectory::new(me());
        once.replace_all(players.clone());
        let mut twice = PlayerDirectory::new(me());
        twice.replace_all(players.clone());
        twice.replace_all(players);

        let a: Vec<_> = once.iter().cloned().collect();
        let b: Vec<_> = twice.iter().cloned().collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_replace_all_forgets_absent_players() {
        let mut dir = PlayerDirectory::new(me());
        dir.upsert(state("gone", 1.0, 1.0)).unwrap();
        dir.replace_all(vec![state("host", 0.0, 0.0)]);
        assert!(!dir.contains(&PlayerId::from("gone")));
    }

    #[test]
    fn test_broadcast_players_puts_local_first() {
        let mut dir = PlayerDirectory::new(me());
        dir.upsert(state("b", 2.0, 2.0)).unwrap();
        dir.upsert(state("a", 1.0, 1.0)).unwrap();

        let players = dir.broadcast_players(&state("me", 9.0, 9.0));
        let ids: Vec<&str> = players.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["me", "a", "b"]);
    }
}
