//! Game discovery on the lobby channel.

use spacecats_protocol::{GameListing, Message, RoomId, WorldDescriptor};

/// The public games list, as last heard from the lobby.
///
/// The relay gives no end marker for a `list` reply: hosts answer with one
/// `game` line each, whenever they get to it. So discovery is "clear, ask,
/// and keep merging whatever turns up", and callers are free to ask again.
#[derive(Debug, Clone, Default)]
pub struct LobbyHandler {
    games: Vec<GameListing>,
}

impl LobbyHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears the list and returns the `list` request to send.
    pub fn begin_discovery(&mut self) -> Message {
        self.games.clear();
        Message::ListRequest
    }

    /// Folds a lobby message into the list.
    ///
    /// Returns `true` if the list changed. Non-lobby messages are ignored.
    pub fn apply(&mut self, msg: &Message) -> bool {
        match msg {
            Message::GameAdvertised(listing) => {
                match self.games.iter_mut().find(|g| g.id == listing.id) {
                    Some(existing) if existing == listing => false,
                    Some(existing) => {
                        *existing = listing.clone();
                        true
                    }
                    None => {
                        tracing::debug!(game = %listing.id, name = %listing.name, "game discovered");
                        self.games.push(listing.clone());
                        true
                    }
                }
            }
            Message::GameRemoved(id) => {
                let before = self.games.len();
                self.games.retain(|g| g.id != *id);
                before != self.games.len()
            }
            Message::GamesList(entries) => {
                self.games = entries.clone();
                true
            }
            _ => false,
        }
    }

    /// Known public games, in first-seen order.
    pub fn games(&self) -> &[GameListing] {
        &self.games
    }

    pub fn find(&self, id: &RoomId) -> Option<&GameListing> {
        self.games.iter().find(|g| g.id == *id)
    }

    /// The `game` line for a hosted world with `players` people in it.
    pub fn advertisement(world: &WorldDescriptor, players: u32) -> Message {
        Message::GameAdvertised(world.listing(players))
    }

    /// The `remove` line retracting a hosted world.
    pub fn retraction(world: &WorldDescriptor) -> Message {
        Message::GameRemoved(world.id.clone())
    }
}
