//! Core protocol types for the relay wire format.
//!
//! Everything here either travels inside a relay line (as a positional field
//! or an embedded JSON payload) or names something that does. Browser peers
//! produce the JSON, so the serde attributes follow their camelCase keys and
//! tolerate the gaps those peers leave (`null` coordinates, missing sizes).

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Width and height used when a peer omits them.
pub const DEFAULT_PLAYER_SIZE: f64 = 20.0;

/// Character class used when a peer omits it.
pub const DEFAULT_CLASS: &str = "warrior";

/// Max player count assumed when a listing omits or garbles it.
pub const DEFAULT_MAX_PLAYERS: u32 = 4;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A stable identifier for a participant.
///
/// Generated once per installation and persisted, so it survives reconnects
/// within one relay session. The relay treats it as an opaque token, which is
/// why this is a `String` newtype rather than a number.
///
/// `#[serde(transparent)]` keeps it a plain JSON string on the wire.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PlayerId(pub String);

impl PlayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Identifier of a hosted world, doubling as the game-room path segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub String);

impl RoomId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoomId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

// ---------------------------------------------------------------------------
// ChannelKind — which socket a line travelled on
// ---------------------------------------------------------------------------

/// The two logical channels multiplexed over the relay.
///
/// The same text can mean different things depending on where it arrived
/// (a JSON array is a games list on the lobby and garbage in a game room),
/// so decoding always takes the channel into account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelKind {
    /// Game discovery: listings, advertisements, retractions.
    Lobby,
    /// One gameplay session: joins, actions, snapshots.
    GameRoom,
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lobby => f.write_str("lobby"),
            Self::GameRoom => f.write_str("game-room"),
        }
    }
}

// ---------------------------------------------------------------------------
// Player and world state
// ---------------------------------------------------------------------------

/// Last known state of one participant.
///
/// Reports from peers carry the id under `playerId` while snapshots use `id`;
/// the alias accepts either (the codec drops `playerId` when both are
/// present). `class` is a Rust keyword, hence `class_name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    #[serde(alias = "playerId")]
    pub id: PlayerId,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub name: String,
    #[serde(default, deserialize_with = "number_or_zero")]
    pub x: f64,
    #[serde(default, deserialize_with = "number_or_zero")]
    pub y: f64,
    #[serde(default = "default_size", deserialize_with = "size_or_default")]
    pub width: f64,
    #[serde(default = "default_size", deserialize_with = "size_or_default")]
    pub height: f64,
    #[serde(
        rename = "class",
        default = "default_class",
        deserialize_with = "class_or_default"
    )]
    pub class_name: String,
}

impl PlayerState {
    /// A fully specified state with default size and class.
    pub fn new(id: PlayerId, name: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            id,
            name: name.into(),
            x,
            y,
            width: DEFAULT_PLAYER_SIZE,
            height: DEFAULT_PLAYER_SIZE,
            class_name: DEFAULT_CLASS.to_string(),
        }
    }

    /// A stand-in for a peer we only know by id.
    ///
    /// Named `Player_<first 8 chars of id>` and placed wherever the caller
    /// says (normally the arena centre).
    pub fn placeholder(id: PlayerId, x: f64, y: f64) -> Self {
        let name = placeholder_name(&id);
        Self::new(id, name, x, y)
    }

    pub fn position(&self) -> (f64, f64) {
        (self.x, self.y)
    }
}

/// Display name given to a player whose name we haven't learned yet.
pub fn placeholder_name(id: &PlayerId) -> String {
    let prefix: String = id.as_str().chars().take(8).collect();
    format!("Player_{prefix}")
}

/// Simulation objects owned by gameplay.
///
/// The sync layer never looks inside these arrays; clients replace them
/// wholesale whenever a snapshot arrives.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldState {
    #[serde(default)]
    pub enemies: Vec<Value>,
    #[serde(default)]
    pub metal: Vec<Value>,
    #[serde(default)]
    pub stars: Vec<Value>,
}

/// A full `{worldState, players}` replacement broadcast by the host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub world_state: WorldState,
    #[serde(default)]
    pub players: Vec<PlayerState>,
}

// ---------------------------------------------------------------------------
// Lobby types
// ---------------------------------------------------------------------------

/// One row of the public games list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameListing {
    pub id: RoomId,
    #[serde(default)]
    pub name: String,
    /// Current player count, host included.
    #[serde(default)]
    pub players: u32,
    #[serde(default = "default_max_players")]
    pub max_players: u32,
}

/// Everything the host decided when it created a world.
///
/// Immutable once created; the player count shown in the lobby is an
/// annotation computed at advertisement time, not stored here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorldDescriptor {
    pub id: RoomId,
    pub name: String,
    pub max_players: u32,
    pub is_public: bool,
    pub created_by: PlayerId,
    pub seed: u64,
    /// Unix milliseconds at creation.
    pub timestamp: u64,
}

impl WorldDescriptor {
    /// The lobby row for this world with the given head count.
    pub fn listing(&self, players: u32) -> GameListing {
        GameListing {
            id: self.id.clone(),
            name: self.name.clone(),
            players,
            max_players: self.max_players,
        }
    }
}

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

/// The kind of a player action.
///
/// Only `Move` is interpreted by the sync layer; everything else is handed to
/// gameplay untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Move,
    Shoot,
    Other(String),
}

impl ActionKind {
    pub fn parse(token: &str) -> Self {
        match token {
            "move" => Self::Move,
            "shoot" => Self::Shoot,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Move => "move",
            Self::Shoot => "shoot",
            Self::Other(s) => s,
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A per-tick action from one player.
///
/// The JSON payload is the source of truth: it always carries `playerId`, and
/// actions built here also carry `type`. Keeping it as a [`Value`] lets
/// gameplay-specific fields (aim angle, weapon) ride along without the sync
/// layer knowing about them.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerAction {
    player_id: PlayerId,
    kind: ActionKind,
    payload: Value,
}

impl PlayerAction {
    /// Builds an action, stamping `type` and `playerId` into the payload.
    ///
    /// A non-object payload is nested under `data`.
    pub fn new(player_id: PlayerId, kind: ActionKind, payload: Value) -> Self {
        let mut object = match payload {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                let mut map = Map::new();
                map.insert("data".into(), other);
                map
            }
        };
        object.insert("type".into(), Value::String(kind.as_str().to_string()));
        object.insert(
            "playerId".into(),
            Value::String(player_id.as_str().to_string()),
        );
        Self {
            player_id,
            kind,
            payload: Value::Object(object),
        }
    }

    /// A `move` action describing the full local state, the shape peers
    /// expect so an unknown mover can be registered from it.
    pub fn movement(state: &PlayerState) -> Self {
        let payload = serde_json::json!({
            "name": state.name,
            "x": state.x,
            "y": state.y,
            "width": state.width,
            "height": state.height,
            "class": state.class_name,
        });
        Self::new(state.id.clone(), ActionKind::Move, payload)
    }

    /// Used by the decoder, which keeps the payload exactly as received.
    pub(crate) fn from_parts(
        player_id: PlayerId,
        kind: ActionKind,
        payload: Value,
    ) -> Self {
        Self {
            player_id,
            kind,
            payload,
        }
    }

    pub fn player_id(&self) -> &PlayerId {
        &self.player_id
    }

    pub fn kind(&self) -> &ActionKind {
        &self.kind
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }

    /// `(x, y)` if the payload carries numeric coordinates.
    pub fn position(&self) -> Option<(f64, f64)> {
        let x = self.payload.get("x")?.as_f64()?;
        let y = self.payload.get("y")?.as_f64()?;
        Some((x, y))
    }

    /// Reads the payload as a player state, for registering an unknown mover.
    ///
    /// Returns `None` when the payload has no usable position.
    pub fn as_player_state(&self) -> Option<PlayerState> {
        let (x, y) = self.position()?;
        let text = |key: &str| {
            self.payload
                .get(key)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        let size = |key: &str| {
            self.payload
                .get(key)
                .and_then(Value::as_f64)
                .unwrap_or(DEFAULT_PLAYER_SIZE)
        };
        Some(PlayerState {
            id: self.player_id.clone(),
            name: text("name").unwrap_or_else(|| "Unknown Player".to_string()),
            x,
            y,
            width: size("width"),
            height: size("height"),
            class_name: text("class").unwrap_or_else(|| DEFAULT_CLASS.to_string()),
        })
    }
}

// ---------------------------------------------------------------------------
// Message — the tagged union of everything on the wire
// ---------------------------------------------------------------------------

/// Every line the codec understands, as a typed value.
///
/// Lobby and game-room messages share one enum because the relay itself
/// doesn't separate them: the same `@envelope` framing wraps both, and the
/// codec uses [`Message::channel`] to reject lines that arrived on the wrong
/// socket.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    // -- Lobby --
    /// Relay-provided list of public games (`@games`).
    GamesList(Vec<GameListing>),
    /// A host advertising or updating its game (`game ...`).
    GameAdvertised(GameListing),
    /// A host retracting its game (`remove <id>`).
    GameRemoved(RoomId),
    /// Someone asking hosts to advertise (`list`).
    ListRequest,

    // -- Game room --
    /// A peer announcing presence (`join <id>` / `@joined <id>`).
    PlayerJoined(PlayerId),
    /// A peer leaving (`leave <id>` / `@left <id>`).
    PlayerLeft(PlayerId),
    /// Host's full world + player replacement (`state <json>`).
    StateSnapshot(Snapshot),
    /// A per-tick action (`action <type> <json>`).
    PlayerAction(PlayerAction),
    /// A peer's full local state (`playerState <json>`).
    PlayerStateReport(PlayerState),
    /// A client asking the host for a snapshot (`requestState`).
    StateRequest,

    // -- Relay status, valid anywhere --
    /// Connection acknowledgement (`+...`, `@created`).
    RelayAck,
    /// Relay-reported error (`-...`, `@error ...`).
    RelayError(String),
}

impl Message {
    /// The channel this message belongs to, or `None` for relay status lines.
    pub fn channel(&self) -> Option<ChannelKind> {
        match self {
            Self::GamesList(_)
            | Self::GameAdvertised(_)
            | Self::GameRemoved(_)
            | Self::ListRequest => Some(ChannelKind::Lobby),
            Self::PlayerJoined(_)
            | Self::PlayerLeft(_)
            | Self::StateSnapshot(_)
            | Self::PlayerAction(_)
            | Self::PlayerStateReport(_)
            | Self::StateRequest => Some(ChannelKind::GameRoom),
            Self::RelayAck | Self::RelayError(_) => None,
        }
    }

    /// Variant name, for logs and errors.
    pub fn name(&self) -> &'static str {
        match self {
            Self::GamesList(_) => "GamesList",
            Self::GameAdvertised(_) => "GameAdvertised",
            Self::GameRemoved(_) => "GameRemoved",
            Self::ListRequest => "ListRequest",
            Self::PlayerJoined(_) => "PlayerJoined",
            Self::PlayerLeft(_) => "PlayerLeft",
            Self::StateSnapshot(_) => "StateSnapshot",
            Self::PlayerAction(_) => "PlayerAction",
            Self::PlayerStateReport(_) => "PlayerStateReport",
            Self::StateRequest => "StateRequest",
            Self::RelayAck => "RelayAck",
            Self::RelayError(_) => "RelayError",
        }
    }
}

// ---------------------------------------------------------------------------
// Lenient field readers
// ---------------------------------------------------------------------------

// Browser peers send `null` where a number went NaN or a field was unset.
// These turn those into the same defaults a missing key gets.

fn default_size() -> f64 {
    DEFAULT_PLAYER_SIZE
}

fn default_class() -> String {
    DEFAULT_CLASS.to_string()
}

fn default_max_players() -> u32 {
    DEFAULT_MAX_PLAYERS
}

fn number_or_zero<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(d)?.unwrap_or(0.0))
}

fn size_or_default<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(d)?.unwrap_or(DEFAULT_PLAYER_SIZE))
}

fn string_or_empty<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(d)?.unwrap_or_default())
}

fn class_or_default<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(d)?.unwrap_or_else(default_class))
}

// =========================================================================
// Tests
// =========================================================================
