//! The synchronization policy: one role per session, and what that role
//! sends for each incoming message and each tick.
//!
//! ```text
//!                    host(world)
//!   Unconnected ─────────────────────► Host ──┐
//!        │   ▲                                 │ disconnect() or
//!        │   └─────────────────────────────────┤ game room closed
//!        │          join(room)                 │
//!        └─────────────────────────► Client ───┘
//! ```
//!
//! The policy owns the directory, the public games list and the local
//! player's state, and does no I/O. [`RelayClient`](crate::RelayClient)
//! feeds it decoded messages and ticks and hands whatever it returns to the
//! transport.

use spacecats_protocol::{
    placeholder_name, ChannelKind, GameListing, Message, PlayerId, PlayerState, RoomId,
    WorldDescriptor, WorldState, DEFAULT_CLASS,
};
use spacecats_room::{ClientRoom, HostRoom, LobbyHandler, Outbound, PlayerDirectory, RoomConfig};
use spacecats_session::{ConnectionRole, SessionError};

use crate::ClientEvent;

/// What handling one message produced.
#[derive(Debug, Default, PartialEq)]
pub struct Effects {
    /// Lines to send, in order.
    pub sends: Vec<Outbound>,
    /// Events for gameplay and UI.
    pub events: Vec<ClientEvent>,
}

#[derive(Debug)]
enum ActiveSession {
    Hosting(HostRoom),
    Joined(ClientRoom),
}

/// Role state machine plus the state it reconciles.
#[derive(Debug)]
pub struct SyncPolicy {
    local: PlayerState,
    directory: PlayerDirectory,
    lobby: LobbyHandler,
    config: RoomConfig,
    session: Option<ActiveSession>,
}

impl SyncPolicy {
    /// A blank name or class in `local` is replaced, as in
    /// [`set_profile`](Self::set_profile).
    pub fn new(mut local: PlayerState, config: RoomConfig) -> Self {
        fill_blank_profile(&mut local);
        let directory = PlayerDirectory::new(local.id.clone());
        Self {
            local,
            directory,
            lobby: LobbyHandler::new(),
            config,
            session: None,
        }
    }

    // -- read-only views --

    pub fn role(&self) -> ConnectionRole {
        match self.session {
            Some(ActiveSession::Hosting(_)) => ConnectionRole::Host,
            Some(ActiveSession::Joined(_)) => ConnectionRole::Client,
            None => ConnectionRole::Unconnected,
        }
    }

    pub fn local(&self) -> &PlayerState {
        &self.local
    }

    pub fn local_id(&self) -> &PlayerId {
        &self.local.id
    }

    /// Everyone else in the game room.
    pub fn directory(&self) -> &PlayerDirectory {
        &self.directory
    }

    pub fn public_games(&self) -> &[GameListing] {
        self.lobby.games()
    }

    pub fn room_id(&self) -> Option<&RoomId> {
        match &self.session {
            Some(ActiveSession::Hosting(room)) => Some(room.room_id()),
            Some(ActiveSession::Joined(room)) => Some(room.room_id()),
            None => None,
        }
    }

    /// The world being hosted, if hosting.
    pub fn hosted_world(&self) -> Option<&WorldDescriptor> {
        match &self.session {
            Some(ActiveSession::Hosting(room)) => Some(room.world()),
            _ => None,
        }
    }

    pub fn world_state(&self) -> Option<&WorldState> {
        match &self.session {
            Some(ActiveSession::Hosting(room)) => Some(room.world_state()),
            Some(ActiveSession::Joined(room)) => Some(room.world_state()),
            None => None,
        }
    }

    /// Mutable world state. Only the host may write it.
    pub fn world_state_mut(&mut self) -> Result<&mut WorldState, SessionError> {
        match &mut self.session {
            Some(ActiveSession::Hosting(room)) => Ok(room.world_state_mut()),
            Some(ActiveSession::Joined(_)) => Err(SessionError::IllegalForRole {
                operation: "writing world state",
                role: ConnectionRole::Client,
            }),
            None => Err(SessionError::NotActive),
        }
    }

    // -- local player --

    /// Moves the local player. Clients send it on the next tick; a host's
    /// own entry follows in the next snapshot.
    pub fn set_position(&mut self, x: f64, y: f64) {
        self.local.x = x;
        self.local.y = y;
    }

    /// Sets the character profile used in reports and snapshots.
    ///
    /// A blank name becomes `Player_<id prefix>` and a blank class the
    /// default class, which is what peers would substitute on receipt.
    pub fn set_profile(&mut self, name: impl Into<String>, class_name: impl Into<String>) {
        self.local.name = name.into();
        self.local.class_name = class_name.into();
        fill_blank_profile(&mut self.local);
    }

    // -- transitions --

    /// Clears the public games list and returns the `list` request.
    pub fn begin_discovery(&mut self) -> Outbound {
        (ChannelKind::Lobby, self.lobby.begin_discovery())
    }

    /// `Unconnected -> Host`. Returns the initial advertisement, if the
    /// world is public.
    ///
    /// # Errors
    /// [`SessionError::AlreadyActive`] if a session is running.
    pub fn host(&mut self, world: WorldDescriptor) -> Result<Vec<Outbound>, SessionError> {
        self.ensure_idle()?;
        tracing::info!(room = %world.id, name = %world.name, public = world.is_public, "hosting");
        self.directory.clear();
        let mut room = HostRoom::new(world, self.config.clone());
        let sends = room.open(&self.directory);
        self.session = Some(ActiveSession::Hosting(room));
        Ok(sends)
    }

    /// `Unconnected -> Client`. Returns the join sequence.
    ///
    /// # Errors
    /// [`SessionError::AlreadyActive`] if a session is running.
    pub fn join(&mut self, room_id: RoomId) -> Result<Vec<Outbound>, SessionError> {
        self.ensure_idle()?;
        tracing::info!(room = %room_id, "joining");
        self.directory.clear();
        let mut room = ClientRoom::new(room_id, self.config.clone());
        let sends = room.open(&self.local);
        self.session = Some(ActiveSession::Joined(room));
        Ok(sends)
    }

    /// Ends the session. Returns the retraction (host) or `leave` (client)
    /// to send before the channels close.
    ///
    /// # Errors
    /// [`SessionError::NotActive`] if there is no session.
    pub fn disconnect(&mut self) -> Result<Vec<Outbound>, SessionError> {
        let session = self.session.take().ok_or(SessionError::NotActive)?;
        let sends = match session {
            ActiveSession::Hosting(room) => {
                tracing::info!(room = %room.room_id(), "stopped hosting");
                room.retraction().into_iter().collect()
            }
            ActiveSession::Joined(room) => {
                tracing::info!(room = %room.room_id(), "left game");
                vec![room.farewell(&self.local)]
            }
        };
        self.directory.clear();
        Ok(sends)
    }

    fn ensure_idle(&self) -> Result<(), SessionError> {
        match self.role() {
            ConnectionRole::Unconnected => Ok(()),
            role => Err(SessionError::AlreadyActive(role)),
        }
    }

    // -- traffic --

    /// Handles one decoded message from `channel`.
    pub fn handle(&mut self, channel: ChannelKind, msg: Message) -> Effects {
        match msg {
            Message::RelayAck => {
                tracing::trace!(%channel, "relay ack");
                Effects::default()
            }
            Message::RelayError(detail) => {
                tracing::warn!(%channel, %detail, "relay error");
                Effects {
                    sends: Vec::new(),
                    events: vec![ClientEvent::RelayWarning(detail)],
                }
            }
            msg => match channel {
                ChannelKind::Lobby => self.handle_lobby(msg),
                ChannelKind::GameRoom => self.handle_room(msg),
            },
        }
    }

    fn handle_lobby(&mut self, msg: Message) -> Effects {
        let mut effects = Effects::default();
        if msg == Message::ListRequest {
            if let Some(ActiveSession::Hosting(room)) = &mut self.session {
                effects.sends = room.handle(&mut self.directory, &self.local, msg).sends;
                return effects;
            }
        }
        if self.lobby.apply(&msg) {
            effects.events.push(ClientEvent::GamesUpdated);
        }
        effects
    }

    fn handle_room(&mut self, msg: Message) -> Effects {
        let mut effects = Effects::default();
        match &mut self.session {
            Some(ActiveSession::Hosting(room)) => {
                let outcome = room.handle(&mut self.directory, &self.local, msg);
                effects.sends = outcome.sends;
                if outcome.directory_changed {
                    effects.events.push(ClientEvent::DirectoryChanged);
                }
                effects
                    .events
                    .extend(outcome.actions.into_iter().map(ClientEvent::Action));
            }
            Some(ActiveSession::Joined(room)) => {
                let outcome = room.handle(&mut self.directory, msg);
                if outcome.snapshot_applied {
                    effects.events.push(ClientEvent::SnapshotApplied);
                } else if outcome.directory_changed {
                    effects.events.push(ClientEvent::DirectoryChanged);
                }
                effects
                    .events
                    .extend(outcome.actions.into_iter().map(ClientEvent::Action));
            }
            None => tracing::debug!(kind = msg.name(), "game-room message without a session dropped"),
        }
        effects
    }

    /// Per-tick sends for the current role.
    pub fn tick(&mut self) -> Vec<Outbound> {
        match &mut self.session {
            Some(ActiveSession::Hosting(room)) => room.tick(&self.directory, &self.local),
            Some(ActiveSession::Joined(room)) => room.tick(&self.directory, &self.local),
            None => Vec::new(),
        }
    }

    /// An immediate snapshot, outside the periodic cadence.
    ///
    /// # Errors
    /// [`SessionError::IllegalForRole`] for a client, [`SessionError::NotActive`]
    /// without a session.
    pub fn broadcast(&self) -> Result<Outbound, SessionError> {
        match &self.session {
            Some(ActiveSession::Hosting(room)) => Ok(room.snapshot(&self.directory, &self.local)),
            Some(ActiveSession::Joined(_)) => Err(SessionError::IllegalForRole {
                operation: "broadcasting state",
                role: ConnectionRole::Client,
            }),
            None => Err(SessionError::NotActive),
        }
    }

    /// A channel closed underneath us. Losing the game room ends the session;
    /// the transport has already sent any retraction.
    pub fn channel_closed(&mut self, channel: ChannelKind) -> Effects {
        if channel == ChannelKind::GameRoom && self.session.take().is_some() {
            tracing::info!("game room lost, session ended");
            self.directory.clear();
        }
        Effects {
            sends: Vec::new(),
            events: vec![ClientEvent::Closed(channel)],
        }
    }
}

fn fill_blank_profile(state: &mut PlayerState) {
    if state.name.trim().is_empty() {
        state.name = placeholder_name(&state.id);
    }
    if state.class_name.trim().is_empty() {
        state.class_name = DEFAULT_CLASS.to_string();
    }
}

#[cfg(test)]
mod tests {
    use spacecats_protocol::{ActionKind, PlayerAction};
    use serde_json::json;

    use super::*;

    fn player(id: &str, x: f64, y: f64) -> PlayerState {
        PlayerState::new(PlayerId::from(id), id.to_uppercase(), x, y)
    }

    fn world() -> WorldDescriptor {
        WorldDescriptor {
            id: RoomId::from("g1"),
            name: "Alpha".into(),
            max_players: 4,
            is_public: true,
            created_by: PlayerId::from("host"),
            seed: 1,
            timestamp: 0,
        }
    }

    fn hosting() -> SyncPolicy {
        let mut policy = SyncPolicy::new(player("host", 10.0, 10.0), RoomConfig::default());
        policy.host(world()).unwrap();
        policy
    }

    fn joined(id: &str) -> SyncPolicy {
        let mut policy = SyncPolicy::new(player(id, 50.0, 50.0), RoomConfig::default());
        policy.join(RoomId::from("g1")).unwrap();
        policy
    }

    /// Delivers every game-room line in `sends` to `to`, returning its effects.
    fn deliver(sends: Vec<Outbound>, to: &mut SyncPolicy) -> Vec<Effects> {
        sends
            .into_iter()
            .filter(|(c, _)| *c == ChannelKind::GameRoom)
            .map(|(c, m)| to.handle(c, m))
            .collect()
    }

    // =====================================================================
    // Role transitions
    // =====================================================================

    #[test]
    fn test_starts_unconnected() {
        let policy = SyncPolicy::new(player("me", 0.0, 0.0), RoomConfig::default());
        assert_eq!(policy.role(), ConnectionRole::Unconnected);
        assert!(policy.room_id().is_none());
        assert!(policy.world_state().is_none());
    }

    #[test]
    fn test_host_advertises() {
        let mut policy = SyncPolicy::new(player("host", 0.0, 0.0), RoomConfig::default());
        let sends = policy.host(world()).unwrap();
        assert_eq!(policy.role(), ConnectionRole::Host);
        assert_eq!(
            sends,
            [(ChannelKind::Lobby, Message::GameAdvertised(world().listing(1)))]
        );
    }

    #[test]
    fn test_hosting_twice_is_rejected() {
        let mut policy = hosting();
        let err = policy.host(world()).unwrap_err();
        assert!(matches!(err, SessionError::AlreadyActive(ConnectionRole::Host)));
        let err = policy.join(RoomId::from("g2")).unwrap_err();
        assert!(matches!(err, SessionError::AlreadyActive(ConnectionRole::Host)));
    }

    #[test]
    fn test_join_sends_join_request_and_report() {
        let mut policy = SyncPolicy::new(player("p7", 0.0, 0.0), RoomConfig::default());
        let sends = policy.join(RoomId::from("g1")).unwrap();
        assert_eq!(policy.role(), ConnectionRole::Client);
        let names: Vec<&str> = sends.iter().map(|(_, m)| m.name()).collect();
        assert_eq!(names, ["PlayerJoined", "StateRequest", "PlayerStateReport"]);
        assert!(sends.iter().all(|(c, _)| *c == ChannelKind::GameRoom));
    }

    #[test]
    fn test_client_cannot_broadcast_or_write_world() {
        let mut policy = joined("p7");
        assert!(matches!(
            policy.broadcast(),
            Err(SessionError::IllegalForRole { role: ConnectionRole::Client, .. })
        ));
        assert!(policy.world_state_mut().is_err());
    }

    #[test]
    fn test_broadcast_without_session() {
        let policy = SyncPolicy::new(player("me", 0.0, 0.0), RoomConfig::default());
        assert!(matches!(policy.broadcast(), Err(SessionError::NotActive)));
    }

    #[test]
    fn test_disconnect_as_host_retracts() {
        let mut policy = hosting();
        policy.handle(ChannelKind::GameRoom, Message::PlayerJoined(PlayerId::from("p7")));
        let sends = policy.disconnect().unwrap();
        assert_eq!(
            sends,
            [(ChannelKind::Lobby, Message::GameRemoved(RoomId::from("g1")))]
        );
        assert_eq!(policy.role(), ConnectionRole::Unconnected);
        assert!(policy.directory().is_empty());
    }

    #[test]
    fn test_disconnect_as_client_says_leave() {
        let mut policy = joined("p7");
        let sends = policy.disconnect().unwrap();
        assert_eq!(
            sends,
            [(ChannelKind::GameRoom, Message::PlayerLeft(PlayerId::from("p7")))]
        );
        assert!(matches!(policy.disconnect(), Err(SessionError::NotActive)));
    }

    #[test]
    fn test_game_room_close_ends_session() {
        let mut policy = joined("p7");
        let effects = policy.channel_closed(ChannelKind::GameRoom);
        assert_eq!(effects.events, [ClientEvent::Closed(ChannelKind::GameRoom)]);
        assert_eq!(policy.role(), ConnectionRole::Unconnected);

        // Can join again afterwards.
        assert!(policy.join(RoomId::from("g2")).is_ok());
    }

    #[test]
    fn test_lobby_close_keeps_session() {
        let mut policy = hosting();
        policy.channel_closed(ChannelKind::Lobby);
        assert_eq!(policy.role(), ConnectionRole::Host);
    }

    // =====================================================================
    // Lobby
    // =====================================================================

    #[test]
    fn test_discovery_and_listing() {
        let mut policy = SyncPolicy::new(player("me", 0.0, 0.0), RoomConfig::default());
        assert_eq!(policy.begin_discovery(), (ChannelKind::Lobby, Message::ListRequest));

        let effects = policy.handle(
            ChannelKind::Lobby,
            Message::GameAdvertised(world().listing(1)),
        );
        assert_eq!(effects.events, [ClientEvent::GamesUpdated]);
        assert_eq!(policy.public_games().len(), 1);

        // Unlisted id: nothing changes, nothing is reported.
        let effects = policy.handle(ChannelKind::Lobby, Message::GameRemoved(RoomId::from("zz")));
        assert!(effects.events.is_empty());
        assert_eq!(policy.public_games().len(), 1);
    }

    #[test]
    fn test_host_answers_list() {
        let mut policy = hosting();
        let effects = policy.handle(ChannelKind::Lobby, Message::ListRequest);
        assert_eq!(
            effects.sends,
            [(ChannelKind::Lobby, Message::GameAdvertised(world().listing(1)))]
        );
    }

    #[test]
    fn test_relay_error_becomes_warning() {
        let mut policy = joined("p7");
        let effects = policy.handle(ChannelKind::GameRoom, Message::RelayError("full".into()));
        assert_eq!(effects.events, [ClientEvent::RelayWarning("full".into())]);
        assert!(policy.handle(ChannelKind::GameRoom, Message::RelayAck).events.is_empty());
    }

    // =====================================================================
    // Host and client together
    // =====================================================================

    #[test]
    fn test_join_round_trip() {
        let mut host = hosting();
        let mut client = SyncPolicy::new(player("p7", 50.0, 60.0), RoomConfig::default());
        let join = client.join(RoomId::from("g1")).unwrap();

        let replies: Vec<Outbound> = deliver(join, &mut host)
            .into_iter()
            .flat_map(|e| e.sends)
            .collect();
        assert_eq!(host.directory().get(&PlayerId::from("p7")).unwrap().name, "P7");

        let effects = deliver(replies, &mut client);
        assert!(effects
            .iter()
            .any(|e| e.events.contains(&ClientEvent::SnapshotApplied)));
        let ids: Vec<&str> = client.directory().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["host"]);
    }

    #[test]
    fn test_host_position_follows_local_player() {
        let mut host = hosting();
        host.set_position(321.0, 123.0);
        let (_, snapshot) = host.broadcast().unwrap();
        match snapshot {
            Message::StateSnapshot(s) => assert_eq!(s.players[0].position(), (321.0, 123.0)),
            other => panic!("unexpected {}", other.name()),
        }
    }

    #[test]
    fn test_world_state_reaches_client_verbatim() {
        let mut host = hosting();
        host.world_state_mut()
            .unwrap()
            .stars
            .push(json!({"x": 1, "y": 2}));
        let mut client = joined("p7");

        let snapshot = host.broadcast().unwrap();
        deliver(vec![snapshot], &mut client);
        assert_eq!(client.world_state(), host.world_state());
    }

    #[test]
    fn test_client_moves_once_per_change() {
        let mut client = joined("p7");
        assert!(client.tick().iter().all(|(_, m)| !matches!(m, Message::PlayerAction(_))));

        client.set_position(70.0, 50.0);
        let moves = |sends: Vec<Outbound>| {
            sends
                .iter()
                .filter(|(_, m)| matches!(m, Message::PlayerAction(_)))
                .count()
        };
        assert_eq!(moves(client.tick()), 1);
        assert_eq!(moves(client.tick()), 0);
    }

    #[test]
    fn test_actions_reach_gameplay_on_both_roles() {
        let shoot = PlayerAction::new(PlayerId::from("p9"), ActionKind::parse("shoot"), json!({}));
        for mut policy in [hosting(), joined("p7")] {
            let effects = policy.handle(ChannelKind::GameRoom, Message::PlayerAction(shoot.clone()));
            assert_eq!(effects.events, [ClientEvent::Action(shoot.clone())]);
        }
    }

    #[test]
    fn test_blank_profile_report_round_trips() {
        use spacecats_protocol::WireCodec;

        let mut client = SyncPolicy::new(player("p1", 1.0, 2.0), RoomConfig::default());
        client.set_profile("", "  ");
        assert_eq!(client.local().name, "Player_p1");
        assert_eq!(client.local().class_name, DEFAULT_CLASS);

        let sends = client.join(RoomId::from("g1")).unwrap();
        let (channel, report) = sends
            .into_iter()
            .find(|(_, m)| matches!(m, Message::PlayerStateReport(_)))
            .unwrap();
        let line = WireCodec.encode(&report).unwrap();
        assert_eq!(WireCodec.decode(&line, channel), Some(report));
    }

    #[test]
    fn test_blank_name_at_construction_is_filled() {
        let policy = SyncPolicy::new(
            PlayerState::new(PlayerId::from("p1"), "", 0.0, 0.0),
            RoomConfig::default(),
        );
        assert_eq!(policy.local().name, "Player_p1");
    }

    #[test]
    fn test_room_traffic_without_session_is_dropped() {
        let mut policy = SyncPolicy::new(player("me", 0.0, 0.0), RoomConfig::default());
        let effects = policy.handle(ChannelKind::GameRoom, Message::PlayerJoined(PlayerId::from("x")));
        assert_eq!(effects, Effects::default());
        assert!(policy.directory().is_empty());
    }
}
