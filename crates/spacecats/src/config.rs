//! Client configuration.

use std::time::Duration;

use spacecats_room::RoomConfig;
use spacecats_transport::TransportConfig;

use crate::SpaceCatsError;

/// Overrides [`TransportConfig::relay_url`].
pub const ENV_RELAY_URL: &str = "SPACECATS_RELAY_URL";
/// Overrides [`TransportConfig::game`].
pub const ENV_GAME: &str = "SPACECATS_GAME";
/// Overrides [`TransportConfig::connect_timeout`], in milliseconds.
pub const ENV_CONNECT_TIMEOUT_MS: &str = "SPACECATS_CONNECT_TIMEOUT_MS";

/// Everything a [`RelayClient`](crate::RelayClient) needs to know up front.
///
/// ```rust
/// use spacecats::ClientConfig;
///
/// let config = ClientConfig::default()
///     .with_relay_url("ws://127.0.0.1:9000")
///     .with_game("space-cats-dev");
/// assert_eq!(config.transport.channel_url("lobby"), "ws://127.0.0.1:9000/space-cats-dev/lobby");
/// ```
#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    pub transport: TransportConfig,
    pub room: RoomConfig,
}

impl ClientConfig {
    /// Defaults, overridden by any `SPACECATS_*` variables that are set.
    ///
    /// # Errors
    /// [`SpaceCatsError::InvalidConfig`] if the timeout isn't a whole number
    /// of milliseconds.
    pub fn from_env() -> Result<Self, SpaceCatsError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SpaceCatsError> {
        let mut config = Self::default();
        if let Some(url) = lookup(ENV_RELAY_URL).filter(|v| !v.is_empty()) {
            config.transport.relay_url = url;
        }
        if let Some(game) = lookup(ENV_GAME).filter(|v| !v.is_empty()) {
            config.transport.game = game;
        }
        if let Some(raw) = lookup(ENV_CONNECT_TIMEOUT_MS) {
            let ms = raw
                .trim()
                .parse::<u64>()
                .map_err(|_| SpaceCatsError::InvalidConfig {
                    key: ENV_CONNECT_TIMEOUT_MS,
                    value: raw.clone(),
                })?;
            config.transport.connect_timeout = Duration::from_millis(ms);
        }
        tracing::debug!(relay = %config.transport.relay_url, game = %config.transport.game, "client config loaded");
        Ok(config)
    }

    pub fn with_relay_url(mut self, url: impl Into<String>) -> Self {
        self.transport = self.transport.with_relay_url(url);
        self
    }

    pub fn with_game(mut self, game: impl Into<String>) -> Self {
        self.transport = self.transport.with_game(game);
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.transport = self.transport.with_connect_timeout(timeout);
        self
    }

    pub fn with_room(mut self, room: RoomConfig) -> Self {
        self.room = room;
        self
    }
}
