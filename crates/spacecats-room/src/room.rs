//! Game-room rules for each role.
//!
//! A host owns the world and the authoritative player list; it turns every
//! join, report and move into a fresh snapshot and also broadcasts on a
//! fixed cadence, so a client that missed a line catches up within half a
//! second. A client announces itself, mirrors whatever the host broadcasts,
//! and only sends movement when it actually moved.
//!
//! ```text
//!   client                         relay                          host
//!   join me ──────────────────────────────────────────────────────► placeholder
//!   requestState ─────────────────────────────────────────────────► snapshot
//!   playerState {me} ─────────────────────────────────────────────► full entry
//!          ◄───────────────────────────────────────────── state {world, players}
//!   action move {me} (only on change) ────────────────────────────► move_to
//!          ◄──────────────────────────── state ... (per change and every 30 ticks)
//! ```

use spacecats_protocol::{
    ActionKind, ChannelKind, Message, PlayerAction, PlayerId, PlayerState, RoomId,
    Snapshot, WorldDescriptor, WorldState,
};
use spacecats_tick::Cadence;

use crate::{LobbyHandler, Outbound, PlayerDirectory, RoomConfig};

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// What a host should do after handling one message.
#[derive(Debug, Default, PartialEq)]
pub struct HostOutcome {
    /// Lines to send, in order.
    pub sends: Vec<Outbound>,
    /// Actions for gameplay (everything except movement).
    pub actions: Vec<PlayerAction>,
    /// Whether the directory was modified.
    pub directory_changed: bool,
}

/// What a client should do after handling one message.
#[derive(Debug, Default, PartialEq)]
pub struct ClientOutcome {
    /// Actions for gameplay (everything except movement).
    pub actions: Vec<PlayerAction>,
    /// Whether the directory was modified.
    pub directory_changed: bool,
    /// Set when a snapshot replaced the world.
    pub snapshot_applied: bool,
}

// ---------------------------------------------------------------------------
// Host
// ---------------------------------------------------------------------------

/// The host side of a game room.
#[derive(Debug)]
pub struct HostRoom {
    world: WorldDescriptor,
    state: WorldState,
    config: RoomConfig,
    broadcast: Cadence,
    /// Head count in the last advertisement, so it is only re-sent on change.
    advertised: Option<u32>,
}

impl HostRoom {
    pub fn new(world: WorldDescriptor, config: RoomConfig) -> Self {
        let broadcast = Cadence::every(config.broadcast_every_ticks);
        Self {
            world,
            state: WorldState::default(),
            config,
            broadcast,
            advertised: None,
        }
    }

    pub fn world(&self) -> &WorldDescriptor {
        &self.world
    }

    pub fn room_id(&self) -> &RoomId {
        &self.world.id
    }

    /// The authoritative world state.
    pub fn world_state(&self) -> &WorldState {
        &self.state
    }

    /// Gameplay writes the simulation objects here; they go out with the
    /// next snapshot.
    pub fn world_state_mut(&mut self) -> &mut WorldState {
        &mut self.state
    }

    /// Players in the room, host included.
    pub fn head_count(dir: &PlayerDirectory) -> u32 {
        u32::try_from(dir.len()).unwrap_or(u32::MAX).saturating_add(1)
    }

    /// The current advertisement, if this world is public.
    pub fn advertisement(&self, dir: &PlayerDirectory) -> Option<Outbound> {
        self.world.is_public.then(|| {
            (
                ChannelKind::Lobby,
                LobbyHandler::advertisement(&self.world, Self::head_count(dir)),
            )
        })
    }

    /// The retraction for this world, if it was ever advertised.
    pub fn retraction(&self) -> Option<Outbound> {
        self.world
            .is_public
            .then(|| (ChannelKind::Lobby, LobbyHandler::retraction(&self.world)))
    }

    /// Lines to send when hosting starts: the first advertisement.
    pub fn open(&mut self, dir: &PlayerDirectory) -> Vec<Outbound> {
        self.readvertise(dir).into_iter().collect()
    }

    /// The advertisement, but only if the head count moved since the last one.
    fn readvertise(&mut self, dir: &PlayerDirectory) -> Option<Outbound> {
        let count = Self::head_count(dir);
        if self.advertised == Some(count) {
            return None;
        }
        let line = self.advertisement(dir)?;
        self.advertised = Some(count);
        Some(line)
    }

    /// The full `{worldState, players}` broadcast.
    pub fn snapshot(&self, dir: &PlayerDirectory, local: &PlayerState) -> Outbound {
        (
            ChannelKind::GameRoom,
            Message::StateSnapshot(Snapshot {
                world_state: self.state.clone(),
                players: dir.broadcast_players(local),
            }),
        )
    }

    /// Handles one incoming message.
    ///
    /// Messages from the local id are ignored; the relay shouldn't echo, but
    /// a second tab with the same identity would.
    pub fn handle(
        &mut self,
        dir: &mut PlayerDirectory,
        local: &PlayerState,
        msg: Message,
    ) -> HostOutcome {
        let mut out = HostOutcome::default();

        match msg {
            Message::PlayerJoined(id) => {
                if id == local.id {
                    return out;
                }
                out.directory_changed = dir.insert_placeholder(&id, self.config.arena_centre());
                tracing::info!(player = %id, new = out.directory_changed, "player joined");
                out.sends.extend(self.readvertise(dir));
                out.sends.push(self.snapshot(dir, local));
            }
            Message::PlayerStateReport(state) => {
                if state.id == local.id {
                    return out;
                }
                let id = state.id.clone();
                match dir.upsert(state) {
                    Ok(is_new) => {
                        tracing::debug!(player = %id, new = is_new, "state report");
                        out.directory_changed = true;
                        out.sends.extend(self.readvertise(dir));
                        out.sends.push(self.snapshot(dir, local));
                    }
                    Err(e) => tracing::debug!(error = %e, "report ignored"),
                }
            }
            Message::PlayerAction(action) => {
                if *action.player_id() == local.id {
                    return out;
                }
                if *action.kind() != ActionKind::Move {
                    out.actions.push(action);
                    return out;
                }
                if apply_move(dir, &action) {
                    out.directory_changed = true;
                    out.sends.extend(self.readvertise(dir));
                    out.sends.push(self.snapshot(dir, local));
                }
            }
            Message::PlayerLeft(id) => {
                if dir.remove(&id).is_some() {
                    tracing::info!(player = %id, "player left");
                    out.directory_changed = true;
                    out.sends.extend(self.readvertise(dir));
                    out.sends.push(self.snapshot(dir, local));
                }
            }
            Message::StateRequest => out.sends.push(self.snapshot(dir, local)),
            Message::ListRequest => {
                // Always answer, even if the count hasn't changed.
                out.sends.extend(self.advertisement(dir));
            }
            Message::StateSnapshot(_) => {
                tracing::debug!("host ignores snapshots");
            }
            other => tracing::trace!(kind = other.name(), "not a host room message"),
        }
        out
    }

    /// Per-tick work: the periodic snapshot when it's due.
    pub fn tick(&mut self, dir: &PlayerDirectory, local: &PlayerState) -> Vec<Outbound> {
        if self.broadcast.due() {
            vec![self.snapshot(dir, local)]
        } else {
            Vec::new()
        }
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// The client side of a game room.
#[derive(Debug)]
pub struct ClientRoom {
    room: RoomId,
    state: WorldState,
    config: RoomConfig,
    motion: MotionTracker,
    state_request: Cadence,
}

impl ClientRoom {
    pub fn new(room: RoomId, config: RoomConfig) -> Self {
        let state_request = Cadence::every(config.state_request_every_ticks);
        Self {
            room,
            state: WorldState::default(),
            config,
            motion: MotionTracker::default(),
            state_request,
        }
    }

    pub fn room_id(&self) -> &RoomId {
        &self.room
    }

    /// World state from the latest snapshot.
    pub fn world_state(&self) -> &WorldState {
        &self.state
    }

    /// The join sequence: announce, ask for state, then send our full state
    /// so the host can replace its placeholder.
    pub fn open(&mut self, local: &PlayerState) -> Vec<Outbound> {
        self.motion.mark_sent(local.position());
        vec![
            (ChannelKind::GameRoom, Message::PlayerJoined(local.id.clone())),
            (ChannelKind::GameRoom, Message::StateRequest),
            (ChannelKind::GameRoom, Message::PlayerStateReport(local.clone())),
        ]
    }

    /// The line announcing departure.
    pub fn farewell(&self, local: &PlayerState) -> Outbound {
        (ChannelKind::GameRoom, Message::PlayerLeft(local.id.clone()))
    }

    pub fn handle(&mut self, dir: &mut PlayerDirectory, msg: Message) -> ClientOutcome {
        let mut out = ClientOutcome::default();
        let local_id = dir.local_id().clone();

        match msg {
            Message::StateSnapshot(snapshot) => {
                self.state = snapshot.world_state;
                dir.replace_all(snapshot.players);
                out.snapshot_applied = true;
                out.directory_changed = true;
            }
            Message::PlayerAction(action) => {
                if *action.player_id() == local_id {
                    return out;
                }
                if *action.kind() == ActionKind::Move {
                    out.directory_changed = apply_move(dir, &action);
                } else {
                    out.actions.push(action);
                }
            }
            Message::PlayerJoined(id) if id != local_id => {
                out.directory_changed = dir.insert_placeholder(&id, self.config.arena_centre());
            }
            Message::PlayerLeft(id) => {
                out.directory_changed = dir.remove(&id).is_some();
            }
            other => tracing::trace!(kind = other.name(), "not a client room message"),
        }
        out
    }

    /// Per-tick work: movement if we moved, and a state request while we
    /// still know nobody.
    pub fn tick(&mut self, dir: &PlayerDirectory, local: &PlayerState) -> Vec<Outbound> {
        let mut sends = Vec::new();
        if self.motion.should_send(local.position()) {
            sends.push((
                ChannelKind::GameRoom,
                Message::PlayerAction(PlayerAction::movement(local)),
            ));
        }
        if dir.is_empty() {
            if self.state_request.due() {
                tracing::debug!(room = %self.room, "no state yet, asking again");
                sends.push((ChannelKind::GameRoom, Message::StateRequest));
            }
        } else {
            self.state_request.reset();
        }
        sends
    }
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Applies a move: known players are moved, unknown ones registered from the
/// payload. Returns `true` if the directory changed.
fn apply_move(dir: &mut PlayerDirectory, action: &PlayerAction) -> bool {
    let id: &PlayerId = action.player_id();
    if dir.contains(id) {
        let Some((x, y)) = action.position() else {
            tracing::debug!(player = %id, "move without coordinates ignored");
            return false;
        };
        return dir.move_to(id, x, y).is_ok();
    }

    match action.as_player_state() {
        Some(state) => {
            tracing::info!(player = %id, "registering unknown mover");
            dir.upsert(state).is_ok()
        }
        None => {
            tracing::debug!(player = %id, "unknown mover without coordinates ignored");
            false
        }
    }
}

/// Remembers the last position sent so unchanged positions aren't resent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MotionTracker {
    last_sent: Option<(f64, f64)>,
}

impl MotionTracker {
    /// Returns `true` (and records `position`) if it differs from the last
    /// one sent. Non-finite positions are never sent.
    pub fn should_send(&mut self, position: (f64, f64)) -> bool {
        if !position.0.is_finite() || !position.1.is_finite() {
            return false;
        }
        if self.last_sent == Some(position) {
            return false;
        }
        self.last_sent = Some(position);
        true
    }

    /// Records a position sent by other means (e.g. a full state report).
    pub fn mark_sent(&mut self, position: (f64, f64)) {
        self.last_sent = Some(position);
    }
}
