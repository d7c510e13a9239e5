//! # Space Cats
//!
//! Relay-mediated multiplayer sync for Space Cats.
//!
//! There is no game server. Every player connects to a public WebSocket
//! relay that fans lines out to everyone on the same path; one player hosts
//! and is the authority, the others join as clients. This crate ties the
//! layers together:
//!
//! ```text
//!   tick ──► SyncPolicy ──► Outbound ──► RelayTransport ──► relay
//!                ▲                                            │
//!   ClientEvent ◄┴── SyncPolicy::handle ◄── WireCodec::decode ◄┘
//! ```
//!
//! - [`SyncPolicy`] decides what each role sends, with no I/O.
//! - [`RelayClient`] drives it against the relay.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use spacecats::prelude::*;
//!
//! # async fn run() -> Result<(), SpaceCatsError> {
//! let mut client = RelayClient::builder()
//!     .config(ClientConfig::from_env()?)
//!     .name("Nyx")
//!     .build();
//! let world = client.host(&WorldConfig::default().with_name("Alpha")).await?;
//! println!("hosting {}", world.id);
//!
//! let mut clock = TickScheduler::with_rate(60);
//! loop {
//!     tokio::select! {
//!         Some(event) = client.next_event() => println!("{event:?}"),
//!         _ = clock.wait_for_tick() => client.tick(),
//!     }
//! }
//! # }
//! ```

mod client;
mod config;
mod error;
mod event;
mod sync;

pub use client::{RelayClient, RelayClientBuilder};
pub use config::{ClientConfig, ENV_CONNECT_TIMEOUT_MS, ENV_GAME, ENV_RELAY_URL};
pub use error::SpaceCatsError;
pub use event::ClientEvent;
pub use sync::{Effects, SyncPolicy};

pub mod prelude {
    //! Convenience re-exports for building a game on the relay.

    pub use crate::{ClientConfig, ClientEvent, RelayClient, SpaceCatsError, SyncPolicy};

    pub use spacecats_protocol::{
        ActionKind, ChannelKind, GameListing, Message, PlayerAction, PlayerId, PlayerState,
        RoomId, WorldDescriptor, WorldState,
    };
    pub use spacecats_room::{PlayerDirectory, RoomConfig};
    pub use spacecats_session::{ConnectionRole, FileStore, KeyValueStore, MemoryStore, WorldConfig};
    pub use spacecats_tick::{Cadence, TickConfig, TickPolicy, TickScheduler};
}
