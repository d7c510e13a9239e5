//! Where the relay lives and how long we wait for it.

use std::time::Duration;

/// Public relay used by the browser build of the game.
pub const DEFAULT_RELAY_URL: &str = "wss://relay.js13kgames.com";

/// Path segment that namespaces this game on the relay.
pub const DEFAULT_GAME: &str = "space-cats";

/// Configuration for a [`RelayTransport`](crate::RelayTransport).
///
/// ## Example
///
/// ```rust
/// use std::time::Duration;
/// use spacecats_transport::TransportConfig;
///
/// let config = TransportConfig::default()
///     .with_relay_url("ws://127.0.0.1:9000")
///     .with_connect_timeout(Duration::from_secs(2));
/// assert_eq!(config.channel_url("lobby"), "ws://127.0.0.1:9000/space-cats/lobby");
/// ```
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Base relay URL, without a trailing path.
    pub relay_url: String,
    /// Game namespace, the first path segment.
    pub game: String,
    /// How long a connect attempt may take, handshake included.
    pub connect_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            relay_url: DEFAULT_RELAY_URL.to_string(),
            game: DEFAULT_GAME.to_string(),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl TransportConfig {
    pub fn with_relay_url(mut self, url: impl Into<String>) -> Self {
        self.relay_url = url.into();
        self
    }

    pub fn with_game(mut self, game: impl Into<String>) -> Self {
        self.game = game.into();
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Full URL for one channel path (`lobby` or a room id).
    pub fn channel_url(&self, path: &str) -> String {
        format!(
            "{}/{}/{}",
            self.relay_url.trim_end_matches('/'),
            self.game,
            path
        )
    }
}
