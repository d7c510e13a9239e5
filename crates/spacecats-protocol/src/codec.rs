//! The line codec: typed [`Message`]s to relay text and back.
//!
//! The relay gives us no framing of its own, and peers have grown three ways
//! of writing a line:
//!
//! ```text
//! +ok                              relay status (ack / -error)
//! @action move {"playerId":...}    relay envelope: @<type> <payload>
//! game g1 Alpha 1 4                direct command: <command> <fields>
//! {"worldState":...,"players":[]}  bare JSON
//! ```
//!
//! Decoding runs an ordered chain of matchers. Each matcher either claims the
//! line (returning `Some(result)`) or passes (`None`); the first claim wins.
//! Whatever the outcome, decode never panics and never returns an error to
//! the caller: a line that can't be read is logged and dropped, and the
//! periodic snapshot/request fallbacks upstream make up for the loss.

use serde::Serialize;
use serde_json::Value;

use crate::{
    placeholder_name, ActionKind, ChannelKind, GameListing, Message, PlayerAction, PlayerId,
    PlayerState, ProtocolError, RoomId, Snapshot, DEFAULT_MAX_PLAYERS,
};

/// One step of the decode chain.
type Matcher = fn(&str, ChannelKind) -> Option<Result<Message, ProtocolError>>;

/// Matchers in priority order. Raw JSON goes last and always claims the
/// line, so the chain is total.
const MATCHERS: [Matcher; 4] = [
    match_relay_status,
    match_envelope,
    match_direct_command,
    match_raw_json,
];

/// Encodes and decodes relay lines.
///
/// Stateless, so it's `Copy` and can be held by value wherever a line is
/// produced or consumed.
///
/// ## Example
///
/// ```rust
/// use spacecats_protocol::{ChannelKind, Message, PlayerId, WireCodec};
///
/// let codec = WireCodec;
/// let line = codec.encode(&Message::PlayerJoined(PlayerId::from("p7"))).unwrap();
/// assert_eq!(line, "join p7");
///
/// let decoded = codec.decode(&line, ChannelKind::GameRoom);
/// assert_eq!(decoded, Some(Message::PlayerJoined(PlayerId::from("p7"))));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct WireCodec;

impl WireCodec {
    /// Decodes one line received on `channel`.
    ///
    /// Returns `None` for blank lines and for anything the chain can't make
    /// sense of (logged at debug level with the reason).
    pub fn decode(&self, line: &str, channel: ChannelKind) -> Option<Message> {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() {
            return None;
        }

        let result = MATCHERS
            .iter()
            .find_map(|matcher| matcher(line, channel))
            .unwrap_or(Err(ProtocolError::Unrecognised))
            .and_then(|msg| check_channel(msg, channel));

        match result {
            Ok(msg) => {
                tracing::trace!(%channel, kind = msg.name(), "decoded line");
                Some(msg)
            }
            Err(e) => {
                tracing::debug!(%channel, error = %e, line, "dropping undecodable line");
                None
            }
        }
    }

    /// Encodes a message as the line this system sends for it.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Encode`] if an embedded JSON payload can't be
    /// serialized. With the types in this crate that doesn't happen in
    /// practice, but serde's signature says it can.
    pub fn encode(&self, msg: &Message) -> Result<String, ProtocolError> {
        let line = match msg {
            Message::GamesList(entries) => format!("@games {}", to_json(entries)?),
            Message::GameAdvertised(listing) => format!(
                "game {} {} {} {}",
                listing.id, listing.name, listing.players, listing.max_players
            ),
            Message::GameRemoved(id) => format!("remove {id}"),
            Message::ListRequest => "list".to_string(),
            Message::PlayerJoined(id) => format!("join {id}"),
            Message::PlayerLeft(id) => format!("leave {id}"),
            Message::StateSnapshot(snapshot) => format!("state {}", to_json(snapshot)?),
            Message::PlayerAction(action) => format!(
                "action {} {}",
                action.kind(),
                to_json(action.payload())?
            ),
            Message::PlayerStateReport(state) => {
                format!("playerState {}", to_json(&StateReport::from(state))?)
            }
            Message::StateRequest => "requestState".to_string(),
            Message::RelayAck => "+".to_string(),
            Message::RelayError(detail) => format!("-{detail}"),
        };
        Ok(line)
    }
}

// ---------------------------------------------------------------------------
// Matchers
// ---------------------------------------------------------------------------

/// `+...` and `-...`: relay-level status with no payload contract.
fn match_relay_status(
    line: &str,
    _channel: ChannelKind,
) -> Option<Result<Message, ProtocolError>> {
    if line.starts_with('+') {
        return Some(Ok(Message::RelayAck));
    }
    line.strip_prefix('-')
        .map(|detail| Ok(Message::RelayError(detail.to_string())))
}

/// `@<type> <payload>`: the relay's own envelope.
///
/// Besides its own types (`games`, `created`, `error`, `joined`, `left`),
/// the relay may wrap any direct command, so unknown types fall back to the
/// command table before being rejected.
fn match_envelope(
    line: &str,
    _channel: ChannelKind,
) -> Option<Result<Message, ProtocolError>> {
    let body = line.strip_prefix('@')?;
    let (kind, payload) = split_word(body);

    let result = match kind {
        "games" => parse_games_list(payload),
        "created" => Ok(Message::RelayAck),
        "error" => Ok(Message::RelayError(payload.to_string())),
        "joined" => parse_player_id(payload).map(Message::PlayerJoined),
        "left" => parse_player_id(payload).map(Message::PlayerLeft),
        _ => decode_command(kind, payload)
            .unwrap_or_else(|| Err(ProtocolError::UnknownEnvelope(kind.to_string()))),
    };
    Some(result)
}

/// `<command> <rest>` for the commands peers send each other directly.
fn match_direct_command(
    line: &str,
    _channel: ChannelKind,
) -> Option<Result<Message, ProtocolError>> {
    let (command, rest) = split_word(line);
    decode_command(command, rest)
}

/// Last resort: the whole line as JSON, classified by shape.
fn match_raw_json(
    line: &str,
    channel: ChannelKind,
) -> Option<Result<Message, ProtocolError>> {
    let value: Value = match serde_json::from_str(line) {
        Ok(value) => value,
        Err(_) => return Some(Err(ProtocolError::Unrecognised)),
    };

    let has = |key: &str| value.get(key).is_some();
    let result = if value.is_array() && channel == ChannelKind::Lobby {
        serde_json::from_value(value)
            .map(Message::GamesList)
            .map_err(ProtocolError::Decode)
    } else if !value.is_object() {
        Err(ProtocolError::Unrecognised)
    } else if has("worldState") || has("players") {
        snapshot_from_value(value)
    } else if has("playerId") && has("type") {
        action_from_value(None, value)
    } else if (has("playerId") || has("id")) && has("x") {
        report_from_value(value)
    } else {
        Err(ProtocolError::Unrecognised)
    };
    Some(result)
}

// ---------------------------------------------------------------------------
// Command table (shared by envelopes and direct commands)
// ---------------------------------------------------------------------------

/// Decodes a known command word; `None` if the word isn't a command.
fn decode_command(
    command: &str,
    rest: &str,
) -> Option<Result<Message, ProtocolError>> {
    let result = match command {
        "list" => Ok(Message::ListRequest),
        "game" => parse_game_fields(rest).map(Message::GameAdvertised),
        "remove" => parse_room_id(rest).map(Message::GameRemoved),
        "join" => parse_player_id(rest).map(Message::PlayerJoined),
        "leave" => parse_player_id(rest).map(Message::PlayerLeft),
        "action" => parse_action(rest),
        "playerState" => parse_report(rest),
        "requestState" => Ok(Message::StateRequest),
        "state" => serde_json::from_str::<Value>(rest)
            .map_err(ProtocolError::Decode)
            .and_then(snapshot_from_value),
        _ => return None,
    };
    Some(result)
}

/// `<id> <name...> <count> <max>`.
///
/// The name is everything between the id and the two trailing numbers,
/// rejoined with single spaces, so names containing spaces survive. Stray
/// and trailing whitespace is not a field. Counts
/// that don't parse fall back to 0 players / 4 max, which is what browser
/// peers do.
fn parse_game_fields(rest: &str) -> Result<GameListing, ProtocolError> {
    let parts: Vec<&str> = rest.split_whitespace().collect();
    if parts.len() < 4 {
        return Err(ProtocolError::MissingField("maxPlayers"));
    }
    let id = parts[0];
    if id.is_empty() {
        return Err(ProtocolError::MissingField("id"));
    }
    let n = parts.len();
    Ok(GameListing {
        id: RoomId::from(id),
        name: parts[1..n - 2].join(" "),
        players: parts[n - 2].trim().parse().unwrap_or(0),
        max_players: parts[n - 1].trim().parse().unwrap_or(DEFAULT_MAX_PLAYERS),
    })
}

/// `@games` payload: a JSON array, or one `id name count max` row per line.
fn parse_games_list(payload: &str) -> Result<Message, ProtocolError> {
    if let Ok(entries) = serde_json::from_str::<Vec<GameListing>>(payload) {
        return Ok(Message::GamesList(entries));
    }

    let entries = payload
        .lines()
        .filter_map(|row| {
            let parts: Vec<&str> = row.split_whitespace().collect();
            if parts.len() < 3 {
                return None;
            }
            Some(GameListing {
                id: RoomId::from(parts[0]),
                name: parts[1].to_string(),
                players: parts[2].parse().unwrap_or(0),
                max_players: parts
                    .get(3)
                    .and_then(|max| max.parse().ok())
                    .unwrap_or(DEFAULT_MAX_PLAYERS),
            })
        })
        .collect();
    Ok(Message::GamesList(entries))
}

fn parse_player_id(rest: &str) -> Result<PlayerId, ProtocolError> {
    let id = rest.trim();
    if id.is_empty() {
        return Err(ProtocolError::MissingField("playerId"));
    }
    Ok(PlayerId::from(id))
}

fn parse_room_id(rest: &str) -> Result<RoomId, ProtocolError> {
    let id = rest.trim();
    if id.is_empty() {
        return Err(ProtocolError::MissingField("id"));
    }
    Ok(RoomId::from(id))
}

/// `[<type> ]<json>`. The type word is optional; without it the JSON's own
/// `type` key decides.
fn parse_action(rest: &str) -> Result<Message, ProtocolError> {
    let rest = rest.trim_start();
    let (token, json) = if rest.starts_with('{') {
        (None, rest)
    } else {
        match rest.split_once(' ') {
            Some((token, json)) => (Some(token), json),
            None => return Err(ProtocolError::MissingField("payload")),
        }
    };
    let value: Value = serde_json::from_str(json).map_err(ProtocolError::Decode)?;
    action_from_value(token, value)
}

fn action_from_value(token: Option<&str>, payload: Value) -> Result<Message, ProtocolError> {
    let player_id = payload
        .get("playerId")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .map(PlayerId::from)
        .ok_or(ProtocolError::MissingField("playerId"))?;
    let kind = token
        .filter(|t| !t.is_empty())
        .or_else(|| payload.get("type").and_then(Value::as_str))
        .map(ActionKind::parse)
        .ok_or(ProtocolError::MissingField("type"))?;
    Ok(Message::PlayerAction(PlayerAction::from_parts(
        player_id, kind, payload,
    )))
}

/// `playerState <json>`; some relays repeat the word inside the envelope.
fn parse_report(rest: &str) -> Result<Message, ProtocolError> {
    let json = rest.strip_prefix("playerState ").unwrap_or(rest);
    let value: Value = serde_json::from_str(json).map_err(ProtocolError::Decode)?;
    report_from_value(value)
}

fn report_from_value(mut value: Value) -> Result<Message, ProtocolError> {
    prefer_id_key(&mut value);
    let mut state: PlayerState =
        serde_json::from_value(value).map_err(ProtocolError::Decode)?;
    if state.id.as_str().is_empty() {
        return Err(ProtocolError::MissingField("playerId"));
    }
    if state.name.is_empty() {
        state.name = placeholder_name(&state.id);
    }
    Ok(Message::PlayerStateReport(state))
}

fn snapshot_from_value(mut value: Value) -> Result<Message, ProtocolError> {
    if let Some(Value::Array(players)) = value.get_mut("players") {
        players.iter_mut().for_each(prefer_id_key);
    }
    serde_json::from_value::<Snapshot>(value)
        .map(Message::StateSnapshot)
        .map_err(ProtocolError::Decode)
}

/// Browser peers spread a report into a directory entry, so one object can
/// carry both `id` and `playerId`. `id` wins.
fn prefer_id_key(value: &mut Value) {
    if let Value::Object(map) = value {
        if map.contains_key("id") {
            map.remove("playerId");
        }
    }
}

fn check_channel(msg: Message, channel: ChannelKind) -> Result<Message, ProtocolError> {
    match msg.channel() {
        Some(expected) if expected != channel => Err(ProtocolError::WrongChannel {
            message: msg.name(),
            channel,
        }),
        _ => Ok(msg),
    }
}

// ---------------------------------------------------------------------------
// Encoding helpers
// ---------------------------------------------------------------------------

/// The JSON shape peers expect for `playerState`: `playerId`, not `id`.
#[derive(Serialize)]
struct StateReport<'a> {
    #[serde(rename = "playerId")]
    player_id: &'a PlayerId,
    name: &'a str,
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    class: &'a str,
}

impl<'a> From<&'a PlayerState> for StateReport<'a> {
    fn from(state: &'a PlayerState) -> Self {
        Self {
            player_id: &state.id,
            name: &state.name,
            x: state.x,
            y: state.y,
            width: state.width,
            height: state.height,
            class: &state.class_name,
        }
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, ProtocolError> {
    serde_json::to_string(value).map_err(ProtocolError::Encode)
}

/// Splits off the first space-separated word.
fn split_word(s: &str) -> (&str, &str) {
    s.split_once(' ').unwrap_or((s, ""))
}

// =========================================================================
// Tests
// =========================================================================
