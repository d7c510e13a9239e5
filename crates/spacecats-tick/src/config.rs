use std::time::Duration;

use tracing::warn;

/// What to do when the loop wakes up late for a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TickPolicy {
    /// Forget the missed ticks and schedule the next one from now.
    #[default]
    Skip,
    /// Keep the original schedule; late ticks fire back to back until the
    /// clock has caught up.
    Drop,
}

/// Configuration for a [`TickScheduler`](crate::TickScheduler).
#[derive(Debug, Clone)]
pub struct TickConfig {
    /// Ticks per second. 0 means the clock never ticks.
    pub tick_rate_hz: u32,
    pub policy: TickPolicy,
    /// Upper bound (µs) of random delay before the first tick, so several
    /// bots started together don't all send on the same instant.
    pub initial_jitter_us: u64,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: 60,
            policy: TickPolicy::default(),
            initial_jitter_us: 2_000,
        }
    }
}

impl TickConfig {
    /// Highest rate the clock accepts.
    pub const MAX_TICK_RATE_HZ: u32 = 240;

    pub fn with_rate(tick_rate_hz: u32) -> Self {
        Self {
            tick_rate_hz,
            ..Self::default()
        }
    }

    pub fn with_policy(mut self, policy: TickPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn without_jitter(mut self) -> Self {
        self.initial_jitter_us = 0;
        self
    }

    /// Caps the rate at [`Self::MAX_TICK_RATE_HZ`].
    pub fn validated(mut self) -> Self {
        if self.tick_rate_hz > Self::MAX_TICK_RATE_HZ {
            warn!(
                rate = self.tick_rate_hz,
                max = Self::MAX_TICK_RATE_HZ,
                "tick rate too high, clamping"
            );
            self.tick_rate_hz = Self::MAX_TICK_RATE_HZ;
        }
        self
    }

    /// Length of one tick, or `None` for a stopped clock.
    pub fn tick_duration(&self) -> Option<Duration> {
        (self.tick_rate_hz > 0).then(|| Duration::from_secs_f64(1.0 / f64::from(self.tick_rate_hz)))
    }
}
