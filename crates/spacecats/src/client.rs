//! `RelayClient`: the sync policy wired to the relay transport.

use std::collections::VecDeque;

use spacecats_protocol::{
    ChannelKind, GameListing, PlayerId, PlayerState, RoomId, WorldDescriptor, WorldState,
    DEFAULT_CLASS,
};
use spacecats_room::{Outbound, PlayerDirectory};
use spacecats_session::{
    generate_player_id, load_or_create_player_id, new_world_descriptor, ConnectionRole,
    KeyValueStore, SessionError, WorldConfig,
};
use spacecats_transport::{RelayTransport, TransportEventKind};

use crate::sync::{Effects, SyncPolicy};
use crate::{ClientConfig, ClientEvent, SpaceCatsError};

/// Builder for a [`RelayClient`].
///
/// # Example
///
/// ```rust,no_run
/// use spacecats::prelude::*;
///
/// # async fn run() -> Result<(), SpaceCatsError> {
/// let mut store = FileStore::open("spacecats.json")?;
/// let mut client = RelayClient::builder()
///     .config(ClientConfig::from_env()?)
///     .name("Nyx")
///     .class_name("mage")
///     .identity_from(&mut store)?
///     .build();
/// client.refresh_games().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct RelayClientBuilder {
    config: ClientConfig,
    player_id: Option<PlayerId>,
    name: Option<String>,
    class_name: Option<String>,
    position: (f64, f64),
}

impl RelayClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Uses a fixed identity. Without one, a fresh id is generated.
    pub fn player_id(mut self, id: PlayerId) -> Self {
        self.player_id = Some(id);
        self
    }

    /// Loads (or creates and saves) the persistent identity from `store`.
    pub fn identity_from(
        mut self,
        store: &mut impl KeyValueStore,
    ) -> Result<Self, SpaceCatsError> {
        self.player_id = Some(load_or_create_player_id(store)?);
        Ok(self)
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn class_name(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = Some(class_name.into());
        self
    }

    /// Starting position of the local player.
    pub fn position(mut self, x: f64, y: f64) -> Self {
        self.position = (x, y);
        self
    }

    /// Builds the client. Nothing is connected until the first
    /// [`refresh_games`](RelayClient::refresh_games), [`host`](RelayClient::host)
    /// or [`join`](RelayClient::join).
    pub fn build(self) -> RelayClient {
        let id = self.player_id.unwrap_or_else(generate_player_id);
        let mut local = PlayerState::placeholder(id, self.position.0, self.position.1);
        if let Some(name) = self.name.filter(|n| !n.trim().is_empty()) {
            local.name = name;
        }
        local.class_name = self
            .class_name
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CLASS.to_string());

        RelayClient {
            transport: RelayTransport::new(self.config.transport),
            policy: SyncPolicy::new(local, self.config.room),
            pending: VecDeque::new(),
        }
    }
}

/// One player's connection to the relay.
///
/// Drive it from a single task: await [`next_event`](Self::next_event) and a
/// [`TickScheduler`](spacecats_tick::TickScheduler) in one `tokio::select!`,
/// and call [`tick`](Self::tick) on every simulation tick.
///
/// ```rust,ignore
/// loop {
///     tokio::select! {
///         Some(event) = client.next_event() => handle(event),
///         _ = clock.wait_for_tick() => {
///             client.set_position(x, y);
///             client.tick();
///         }
///     }
/// }
/// ```
pub struct RelayClient {
    transport: RelayTransport,
    policy: SyncPolicy,
    /// Events produced by one transport event but not yet handed out.
    pending: VecDeque<ClientEvent>,
}

impl RelayClient {
    pub fn builder() -> RelayClientBuilder {
        RelayClientBuilder::new()
    }

    // -- views --

    pub fn role(&self) -> ConnectionRole {
        self.policy.role()
    }

    pub fn local(&self) -> &PlayerState {
        self.policy.local()
    }

    pub fn player_id(&self) -> &PlayerId {
        self.policy.local_id()
    }

    /// Everyone else in the game room.
    pub fn directory(&self) -> &PlayerDirectory {
        self.policy.directory()
    }

    pub fn public_games(&self) -> &[GameListing] {
        self.policy.public_games()
    }

    pub fn room_id(&self) -> Option<&RoomId> {
        self.policy.room_id()
    }

    pub fn world_state(&self) -> Option<&WorldState> {
        self.policy.world_state()
    }

    /// Host only.
    pub fn world_state_mut(&mut self) -> Result<&mut WorldState, SpaceCatsError> {
        Ok(self.policy.world_state_mut()?)
    }

    pub fn is_open(&self, channel: ChannelKind) -> bool {
        self.transport.is_open(channel)
    }

    // -- local player --

    pub fn set_position(&mut self, x: f64, y: f64) {
        self.policy.set_position(x, y);
    }

    pub fn set_profile(&mut self, name: impl Into<String>, class_name: impl Into<String>) {
        self.policy.set_profile(name, class_name);
    }

    // -- lobby --

    /// Connects the lobby if needed, clears the public games list and asks
    /// hosts to advertise. Replies arrive as [`ClientEvent::GamesUpdated`].
    pub async fn refresh_games(&mut self) -> Result<(), SpaceCatsError> {
        self.transport.connect_lobby().await?;
        let request = self.policy.begin_discovery();
        self.dispatch(vec![request]);
        Ok(())
    }

    // -- sessions --

    /// Creates a world and starts hosting it.
    ///
    /// A public world is advertised on the lobby, and retracted again
    /// whenever the game room closes.
    pub async fn host(&mut self, config: &WorldConfig) -> Result<WorldDescriptor, SpaceCatsError> {
        self.ensure_idle()?;
        let world = new_world_descriptor(config, self.policy.local_id());

        if world.is_public {
            self.transport.connect_lobby().await?;
        }
        self.transport.connect_game_room(&world.id).await?;

        let sends = self.policy.host(world.clone())?;
        if world.is_public {
            self.transport.set_retraction(Some(world.id.clone()));
        }
        self.dispatch(sends);
        Ok(world)
    }

    /// Joins the game room `room` as a client.
    pub async fn join(&mut self, room: &RoomId) -> Result<(), SpaceCatsError> {
        self.ensure_idle()?;
        self.transport.connect_game_room(room).await?;
        let sends = self.policy.join(room.clone())?;
        self.dispatch(sends);
        Ok(())
    }

    /// Retracts (host) or says `leave` (client), then closes both channels.
    pub fn disconnect(&mut self) -> Result<(), SpaceCatsError> {
        let sends = self.policy.disconnect()?;
        self.dispatch(sends);
        // The retraction just went out; don't send it twice.
        self.transport.set_retraction(None);
        self.transport.close_all();
        Ok(())
    }

    fn ensure_idle(&self) -> Result<(), SessionError> {
        match self.role() {
            ConnectionRole::Unconnected => Ok(()),
            role => Err(SessionError::AlreadyActive(role)),
        }
    }

    // -- driving --

    /// Waits for the next event.
    ///
    /// Incoming messages are handled here, and any replies they call for
    /// (snapshots, advertisements) are sent before this returns. Cancel-safe,
    /// so it can sit in a `tokio::select!` next to the clock.
    pub async fn next_event(&mut self) -> Option<ClientEvent> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Some(event);
            }
            let event = self.transport.next_event().await?;
            let effects = match event.kind {
                TransportEventKind::Opened => {
                    tracing::debug!(channel = %event.channel, id = %event.connection, "channel ready");
                    continue;
                }
                TransportEventKind::Message(msg) => self.policy.handle(event.channel, msg),
                TransportEventKind::Closed => self.policy.channel_closed(event.channel),
                TransportEventKind::Error(detail) => Effects {
                    sends: Vec::new(),
                    events: vec![ClientEvent::RelayWarning(detail)],
                },
            };
            self.dispatch(effects.sends);
            self.pending.extend(effects.events);
        }
    }

    /// Per-tick sends: movement for a client, periodic snapshots for a host.
    pub fn tick(&mut self) {
        let sends = self.policy.tick();
        self.dispatch(sends);
    }

    /// Sends a snapshot now. Host only.
    pub fn broadcast(&mut self) -> Result<(), SpaceCatsError> {
        let snapshot = self.policy.broadcast()?;
        self.dispatch(vec![snapshot]);
        Ok(())
    }

    fn dispatch(&self, sends: Vec<Outbound>) {
        for (channel, msg) in sends {
            self.transport.send(channel, &msg);
        }
    }
}

#[cfg(test)]
mod tests {
    use spacecats_session::MemoryStore;

    use super::*;

    #[test]
    fn test_builder_defaults() {
        let client = RelayClient::builder().build();
        assert_eq!(client.role(), ConnectionRole::Unconnected);
        assert!(client.player_id().as_str().starts_with("player_"));
        assert_eq!(client.local().class_name, DEFAULT_CLASS);
        assert!(client.local().name.starts_with("Player_"));
        assert!(!client.is_open(ChannelKind::Lobby));
    }

    #[test]
    fn test_builder_profile() {
        let client = RelayClient::builder()
            .player_id(PlayerId::from("p1"))
            .name("Nyx")
            .class_name("mage")
            .position(5.0, 6.0)
            .build();
        assert_eq!(client.local().name, "Nyx");
        assert_eq!(client.local().class_name, "mage");
        assert_eq!(client.local().position(), (5.0, 6.0));
    }

    #[test]
    fn test_identity_is_stable_across_builds() {
        let mut store = MemoryStore::default();
        let first = RelayClient::builder()
            .identity_from(&mut store)
            .unwrap()
            .build();
        let second = RelayClient::builder()
            .identity_from(&mut store)
            .unwrap()
            .build();
        assert_eq!(first.player_id(), second.player_id());
    }

    #[test]
    fn test_disconnect_without_session_fails() {
        let mut client = RelayClient::builder().build();
        let err = client.disconnect().unwrap_err();
        assert!(matches!(err, SpaceCatsError::Session(SessionError::NotActive)));
    }

    #[test]
    fn test_broadcast_without_session_fails() {
        let mut client = RelayClient::builder().build();
        assert!(client.broadcast().is_err());
        // Ticking idle is harmless.
        client.tick();
    }
}
