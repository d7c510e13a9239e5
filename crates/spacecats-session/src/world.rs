//! Creating a world to host.

use rand::Rng;
use spacecats_protocol::{PlayerId, RoomId, WorldDescriptor, DEFAULT_MAX_PLAYERS};

use crate::{random_suffix, unix_millis};

/// What a host chooses before creating a world.
#[derive(Debug, Clone)]
pub struct WorldConfig {
    pub name: String,
    /// World generation seed; `None` picks one at random.
    pub seed: Option<u64>,
    pub max_players: u32,
    /// Public worlds are advertised in the lobby; private ones are only
    /// reachable by room id.
    pub is_public: bool,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            name: "My World".to_string(),
            seed: None,
            max_players: DEFAULT_MAX_PLAYERS,
            is_public: true,
        }
    }
}

impl WorldConfig {
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_max_players(mut self, max_players: u32) -> Self {
        self.max_players = max_players;
        self
    }

    pub fn private(mut self) -> Self {
        self.is_public = false;
        self
    }
}

/// Creates the descriptor for a new world owned by `created_by`.
///
/// The id (`world_<unix millis>_<9 base-36 chars>`) is also the game-room
/// path on the relay. A blank name becomes `My World`; a max below 1 is
/// raised to 1 so the host always fits.
pub fn new_world_descriptor(config: &WorldConfig, created_by: &PlayerId) -> WorldDescriptor {
    let name = match config.name.trim() {
        "" => "My World".to_string(),
        name => name.to_string(),
    };
    let seed = config
        .seed
        .unwrap_or_else(|| rand::rng().random_range(0..1_000_000));
    let descriptor = WorldDescriptor {
        id: RoomId::new(format!("world_{}_{}", unix_millis(), random_suffix())),
        name,
        max_players: config.max_players.max(1),
        is_public: config.is_public,
        created_by: created_by.clone(),
        seed,
        timestamp: unix_millis(),
    };
    tracing::info!(world = %descriptor.id, name = %descriptor.name, seed, "created world");
    descriptor
}
