use std::time::Duration;

use rand::Rng;
use tokio::time::{self, Instant};
use tracing::{debug, trace, warn};

use crate::{TickConfig, TickPolicy};

/// One tick of the simulation clock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tick {
    /// Tick number, starting at 1.
    pub number: u64,
    /// Fixed step for this tick. Movement code should integrate with this
    /// rather than wall-clock time.
    pub dt: Duration,
    /// Ticks that were due but never fired because the loop was late
    /// (only under [`TickPolicy::Skip`]).
    pub skipped: u64,
}

/// Fixed-rate simulation clock.
///
/// Runs on Tokio time, so tests can drive it with a paused clock.
pub struct TickScheduler {
    policy: TickPolicy,
    rate_hz: u32,
    tick_duration: Option<Duration>,
    next_tick: Option<Instant>,
    count: u64,
    paused: bool,
}

impl TickScheduler {
    pub fn new(config: TickConfig) -> Self {
        let config = config.validated();
        let tick_duration = config.tick_duration();

        let next_tick = tick_duration.map(|step| {
            let jitter = match config.initial_jitter_us {
                0 => Duration::ZERO,
                max => Duration::from_micros(rand::rng().random_range(0..max)),
            };
            Instant::now() + step + jitter
        });

        debug!(rate_hz = config.tick_rate_hz, policy = ?config.policy, "simulation clock created");

        Self {
            policy: config.policy,
            rate_hz: config.tick_rate_hz,
            tick_duration,
            next_tick,
            count: 0,
            paused: false,
        }
    }

    pub fn with_rate(tick_rate_hz: u32) -> Self {
        Self::new(TickConfig::with_rate(tick_rate_hz))
    }

    /// Waits for the next tick.
    ///
    /// Pends forever while paused or when the rate is 0, which lets it sit
    /// in a `tokio::select!` without special-casing. Cancel-safe: dropping
    /// the future before it resolves loses nothing.
    pub async fn wait_for_tick(&mut self) -> Tick {
        let (due, step) = match (self.next_tick, self.tick_duration) {
            (Some(due), Some(step)) if !self.paused => (due, step),
            _ => std::future::pending().await,
        };

        time::sleep_until(due).await;

        let now = Instant::now();
        let late_by = now.saturating_duration_since(due);
        let behind = (late_by.as_nanos() / step.as_nanos()) as u64;
        self.count += 1;

        let (next, skipped) = match self.policy {
            TickPolicy::Skip => (now + step, behind),
            TickPolicy::Drop => (due + step, 0),
        };
        if behind > 0 {
            warn!(tick = self.count, behind, policy = ?self.policy, "simulation clock running late");
        }
        self.next_tick = Some(next);

        trace!(tick = self.count, "tick");
        Tick {
            number: self.count,
            dt: step,
            skipped,
        }
    }

    /// Stops ticking until [`resume`](Self::resume). Idempotent.
    pub fn pause(&mut self) {
        if !self.paused {
            self.paused = true;
            debug!(tick = self.count, "simulation clock paused");
        }
    }

    /// Starts ticking again, one full step from now. Idempotent.
    pub fn resume(&mut self) {
        if self.paused {
            self.paused = false;
            self.next_tick = self.tick_duration.map(|step| Instant::now() + step);
            debug!(tick = self.count, "simulation clock resumed");
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_stopped(&self) -> bool {
        self.tick_duration.is_none()
    }

    pub fn tick_count(&self) -> u64 {
        self.count
    }

    pub fn tick_rate_hz(&self) -> u32 {
        self.rate_hz
    }

    pub fn tick_duration(&self) -> Option<Duration> {
        self.tick_duration
    }
}
