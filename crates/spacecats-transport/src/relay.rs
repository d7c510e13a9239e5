//! The two-channel relay transport and its socket pumps.

use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::{SinkExt, StreamExt};
use spacecats_protocol::{ChannelKind, Message, RoomId, WireCodec};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message as Frame;

use crate::{
    ConnectionId, TransportConfig, TransportError, TransportEvent, TransportEventKind,
};

/// Counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// What a pump task reports. Lines are decoded on the caller's side so the
/// pumps stay dumb.
#[derive(Debug)]
enum PumpEvent {
    Line(String),
    Error(String),
    Closed,
}

#[derive(Debug)]
struct RawEvent {
    connection: ConnectionId,
    channel: ChannelKind,
    event: PumpEvent,
}

/// One open socket.
struct Channel {
    id: ConnectionId,
    url: String,
    /// Lines waiting for the writer. Dropping this lets the writer flush what
    /// is queued and send a close frame.
    outbound: mpsc::UnboundedSender<String>,
    reader: JoinHandle<()>,
}

impl Channel {
    /// Stops reading immediately; queued lines are still flushed by the writer.
    fn shut(self) {
        self.reader.abort();
        tracing::debug!(id = %self.id, url = %self.url, "channel closed");
    }
}

/// Owns the lobby and game-room sockets.
///
/// ```text
///             send(channel, msg)                       next_event()
///   caller ──► encode ──► outbound queue ──► writer ──► relay
///   caller ◄── decode ◄── event queue ◄──── reader ◄─── relay
/// ```
///
/// Both channels are optional and independent: a host keeps the lobby open
/// while playing, a client may close it once joined.
pub struct RelayTransport {
    config: TransportConfig,
    codec: WireCodec,
    lobby: Option<Channel>,
    game_room: Option<Channel>,
    /// Room to retract from the lobby when the game room goes away.
    retraction: Option<RoomId>,
    events_tx: mpsc::UnboundedSender<RawEvent>,
    events_rx: mpsc::UnboundedReceiver<RawEvent>,
    /// `Opened` events not yet handed out, in connect order.
    opened: Vec<(ConnectionId, ChannelKind)>,
}

impl RelayTransport {
    pub fn new(config: TransportConfig) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            config,
            codec: WireCodec,
            lobby: None,
            game_room: None,
            retraction: None,
            events_tx,
            events_rx,
            opened: Vec::new(),
        }
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    pub fn is_open(&self, channel: ChannelKind) -> bool {
        self.slot(channel).is_some()
    }

    /// Id of the socket currently serving `channel`, if any.
    pub fn connection_id(&self, channel: ChannelKind) -> Option<ConnectionId> {
        self.slot(channel).as_ref().map(|c| c.id)
    }

    /// Opens the lobby channel. Does nothing if it's already open.
    pub async fn connect_lobby(&mut self) -> Result<(), TransportError> {
        if self.lobby.is_some() {
            return Ok(());
        }
        let channel = self.open(ChannelKind::Lobby, "lobby").await?;
        self.lobby = Some(channel);
        Ok(())
    }

    /// Opens the game-room channel for `room`, closing any previous one first.
    pub async fn connect_game_room(&mut self, room: &RoomId) -> Result<(), TransportError> {
        self.close_game_room();
        let channel = self.open(ChannelKind::GameRoom, room.as_str()).await?;
        self.game_room = Some(channel);
        Ok(())
    }

    /// Queues `msg` on `channel`.
    ///
    /// Fire-and-forget: if the channel isn't open (or its writer has died)
    /// the message is logged and dropped.
    pub fn send(&self, channel: ChannelKind, msg: &Message) {
        let line = match self.codec.encode(msg) {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!(%channel, kind = msg.name(), error = %e, "failed to encode message");
                return;
            }
        };
        self.send_line(channel, line);
    }

    fn send_line(&self, channel: ChannelKind, line: String) {
        match self.slot(channel) {
            Some(open) => {
                tracing::trace!(%channel, id = %open.id, line = %line, "send");
                if open.outbound.send(line).is_err() {
                    tracing::warn!(%channel, id = %open.id, "send on dead channel dropped");
                }
            }
            None => tracing::warn!(%channel, "send on closed channel dropped"),
        }
    }

    /// Registers (or clears) the room to retract when the game room closes.
    pub fn set_retraction(&mut self, room: Option<RoomId>) {
        self.retraction = room;
    }

    pub fn retraction(&self) -> Option<&RoomId> {
        self.retraction.as_ref()
    }

    /// Closes the game-room channel, if open.
    ///
    /// A registered retraction is sent on the lobby first.
    pub fn close_game_room(&mut self) {
        if let Some(channel) = self.game_room.take() {
            self.retract();
            channel.shut();
        }
    }

    /// Closes the lobby channel, if open. Queued lines are still flushed.
    pub fn close_lobby(&mut self) {
        if let Some(channel) = self.lobby.take() {
            channel.shut();
        }
    }

    /// Closes both channels.
    pub fn close_all(&mut self) {
        self.close_game_room();
        self.close_lobby();
    }

    /// Waits for the next event from either channel.
    ///
    /// Events from sockets that have since been closed or replaced are
    /// skipped, as are lines that don't decode. Returns `None` only if the
    /// transport itself is being torn down, so this is safe to use as a
    /// `tokio::select!` branch.
    pub async fn next_event(&mut self) -> Option<TransportEvent> {
        while !self.opened.is_empty() {
            let (connection, channel) = self.opened.remove(0);
            if self.connection_id(channel) == Some(connection) {
                return Some(TransportEvent {
                    connection,
                    channel,
                    kind: TransportEventKind::Opened,
                });
            }
        }

        loop {
            let raw = self.events_rx.recv().await?;
            if self.connection_id(raw.channel) != Some(raw.connection) {
                tracing::trace!(id = %raw.connection, channel = %raw.channel, "stale event ignored");
                continue;
            }
            let kind = match raw.event {
                PumpEvent::Line(line) => match self.codec.decode(&line, raw.channel) {
                    Some(msg) => TransportEventKind::Message(msg),
                    None => continue,
                },
                PumpEvent::Error(detail) => {
                    tracing::warn!(id = %raw.connection, channel = %raw.channel, error = %detail, "socket error");
                    TransportEventKind::Error(detail)
                }
                PumpEvent::Closed => {
                    tracing::info!(id = %raw.connection, channel = %raw.channel, "channel closed by relay");
                    match raw.channel {
                        ChannelKind::Lobby => self.close_lobby(),
                        ChannelKind::GameRoom => self.close_game_room(),
                    }
                    TransportEventKind::Closed
                }
            };
            return Some(TransportEvent {
                connection: raw.connection,
                channel: raw.channel,
                kind,
            });
        }
    }

    // -- internals --

    fn slot(&self, channel: ChannelKind) -> &Option<Channel> {
        match channel {
            ChannelKind::Lobby => &self.lobby,
            ChannelKind::GameRoom => &self.game_room,
        }
    }

    fn retract(&mut self) {
        if let Some(room) = self.retraction.take() {
            tracing::info!(%room, "retracting game from lobby");
            self.send(ChannelKind::Lobby, &Message::GameRemoved(room));
        }
    }

    async fn open(&mut self, kind: ChannelKind, path: &str) -> Result<Channel, TransportError> {
        let url = self.config.channel_url(path);
        let after = self.config.connect_timeout;

        let connect = tokio_tungstenite::connect_async(url.as_str());
        let (ws, _response) = match tokio::time::timeout(after, connect).await {
            Ok(Ok(pair)) => pair,
            Ok(Err(source)) => return Err(TransportError::Connect { url, source }),
            Err(_) => return Err(TransportError::Timeout { url, after }),
        };

        let id = ConnectionId::new(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed));
        tracing::info!(%id, channel = %kind, %url, "channel open");

        let (mut sink, mut stream) = ws.split();
        let (outbound, mut queue) = mpsc::unbounded_channel::<String>();

        // Writer: drains the queue, then says goodbye once every sender is gone.
        tokio::spawn(async move {
            while let Some(line) = queue.recv().await {
                if let Err(e) = sink.send(Frame::Text(line.into())).await {
                    tracing::debug!(%id, error = %e, "writer stopped");
                    return;
                }
            }
            let _ = sink.close().await;
        });

        // Reader: frames in, raw events out. No decoding here.
        let events = self.events_tx.clone();
        let reader = tokio::spawn(async move {
            let report = |event| {
                let _ = events.send(RawEvent {
                    connection: id,
                    channel: kind,
                    event,
                });
            };
            while let Some(frame) = stream.next().await {
                match frame {
                    Ok(Frame::Text(text)) => report(PumpEvent::Line(text.as_str().to_owned())),
                    Ok(Frame::Binary(bytes)) => match std::str::from_utf8(&bytes) {
                        Ok(text) => report(PumpEvent::Line(text.to_owned())),
                        Err(_) => tracing::debug!(%id, "non-utf8 binary frame ignored"),
                    },
                    Ok(Frame::Close(_)) => break,
                    Ok(_) => continue, // ping/pong/raw frame
                    Err(e) => {
                        report(PumpEvent::Error(e.to_string()));
                        break;
                    }
                }
            }
            report(PumpEvent::Closed);
        });

        self.opened.push((id, kind));
        Ok(Channel {
            id,
            url,
            outbound,
            reader,
        })
    }
}

impl Drop for RelayTransport {
    fn drop(&mut self) {
        self.close_all();
    }
}
