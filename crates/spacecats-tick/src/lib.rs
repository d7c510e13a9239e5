//! Simulation clock for Space Cats.
//!
//! The game runs a fixed-rate simulation (60 Hz by default) and the sync
//! layer piggybacks on it: a host broadcasts a snapshot every 30 ticks, a
//! client that still knows nobody re-asks for state every 60 ticks, and
//! both sides consider a movement send once per tick.
//!
//! - [`TickScheduler`] produces the ticks.
//! - [`Cadence`] turns "every N ticks" into a yes/no per tick.
//!
//! # Integration
//!
//! The scheduler is meant to sit next to the relay client in one
//! `tokio::select!` loop, so the directory is only ever touched from one task:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(event) = client.next_event() => { /* react */ }
//!         tick = clock.wait_for_tick() => {
//!             client.tick(local_position);
//!         }
//!     }
//! }
//! ```

mod cadence;
mod config;
mod scheduler;

pub use cadence::Cadence;
pub use config::{TickConfig, TickPolicy};
pub use scheduler::{Tick, TickScheduler};
