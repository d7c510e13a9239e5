//! A headless Space Cats player that wanders around the arena.
//!
//! ```text
//! wanderer list                 # show public games
//! wanderer host [world name]    # host a public world
//! wanderer join <room id>       # join a world
//! ```
//!
//! Set `SPACECATS_RELAY_URL` to point at a local relay, `RUST_LOG=debug` to
//! see the traffic, and `WANDERER_STORE` to choose where the identity file
//! lives. Ctrl-C leaves cleanly.

use std::time::Duration;

use rand::Rng;
use spacecats::prelude::*;

// ---------------------------------------------------------------------------
// Movement
// ---------------------------------------------------------------------------

/// Pixels per second.
const SPEED: f64 = 60.0;

/// A random walk that bounces off the arena edges.
struct Wanderer {
    x: f64,
    y: f64,
    heading: f64,
    width: f64,
    height: f64,
}

impl Wanderer {
    fn new(config: &RoomConfig) -> Self {
        let mut rng = rand::rng();
        Self {
            x: spawn_coord(&mut rng, config.arena_width),
            y: spawn_coord(&mut rng, config.arena_height),
            heading: rng.random_range(0.0..std::f64::consts::TAU),
            width: config.arena_width,
            height: config.arena_height,
        }
    }

    /// Advances by `dt` and returns the new position.
    fn step(&mut self, dt: Duration) -> (f64, f64) {
        let mut rng = rand::rng();
        if rng.random_bool(0.02) {
            self.heading += rng.random_range(-1.0..1.0);
        }
        let distance = SPEED * dt.as_secs_f64();
        self.x += self.heading.cos() * distance;
        self.y += self.heading.sin() * distance;

        if self.x < 0.0 || self.x > self.width {
            self.heading = std::f64::consts::PI - self.heading;
            self.x = self.x.clamp(0.0, self.width);
        }
        if self.y < 0.0 || self.y > self.height {
            self.heading = -self.heading;
            self.y = self.y.clamp(0.0, self.height);
        }
        (self.x, self.y)
    }
}

/// A point in `[0, max)`, or 0 when the arena has no extent on this axis.
fn spawn_coord(rng: &mut impl Rng, max: f64) -> f64 {
    if max > 0.0 {
        rng.random_range(0.0..max)
    } else {
        0.0
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

enum Command {
    List,
    Host(String),
    Join(RoomId),
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Option<Command> {
    match args.next()?.as_str() {
        "list" => Some(Command::List),
        "host" => {
            let name: Vec<String> = args.collect();
            Some(Command::Host(name.join(" ")))
        }
        "join" => args.next().map(|id| Command::Join(RoomId::new(id))),
        _ => None,
    }
}

async fn list_games(client: &mut RelayClient) -> Result<(), SpaceCatsError> {
    client.refresh_games().await?;
    let deadline = tokio::time::sleep(Duration::from_secs(3));
    tokio::pin!(deadline);
    loop {
        tokio::select! {
            _ = &mut deadline => break,
            event = client.next_event() => {
                if event.is_none() {
                    break;
                }
            }
        }
    }
    if client.public_games().is_empty() {
        println!("no public games");
    }
    for game in client.public_games() {
        println!("{}  {}  ({}/{})", game.id, game.name, game.players, game.max_players);
    }
    Ok(())
}

async fn play(client: &mut RelayClient, room: &RoomConfig) -> Result<(), SpaceCatsError> {
    let mut wanderer = Wanderer::new(room);
    let mut clock = TickScheduler::new(TickConfig::default());
    let mut report = Cadence::every(300);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("leaving");
                client.disconnect()?;
                return Ok(());
            }
            event = client.next_event() => match event {
                Some(ClientEvent::Closed(ChannelKind::GameRoom)) | None => {
                    tracing::warn!("game room closed");
                    return Ok(());
                }
                Some(ClientEvent::Action(action)) => {
                    tracing::info!(player = %action.player_id(), kind = %action.kind(), "action");
                }
                Some(ClientEvent::RelayWarning(detail)) => tracing::warn!(%detail, "relay warning"),
                Some(other) => tracing::debug!(?other, "event"),
            },
            tick = clock.wait_for_tick() => {
                if tick.skipped > 0 {
                    tracing::debug!(skipped = tick.skipped, "fell behind");
                }
                let (x, y) = wanderer.step(tick.dt);
                client.set_position(x, y);
                client.tick();
                if report.due() {
                    let others: Vec<&str> = client.directory().iter().map(|p| p.name.as_str()).collect();
                    tracing::info!(x = x.round(), y = y.round(), ?others, "wandering");
                }
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let Some(command) = parse_args(std::env::args().skip(1)) else {
        eprintln!("usage: wanderer list | host [name] | join <room id>");
        std::process::exit(2);
    };

    let config = ClientConfig::from_env()?;
    let room = config.room.clone();
    let store_path = std::env::var("WANDERER_STORE").unwrap_or_else(|_| "wanderer.json".into());
    let mut store = FileStore::open(store_path)?;
    let mut client = RelayClient::builder()
        .config(config)
        .identity_from(&mut store)?
        .name("Wanderer")
        .class_name("scout")
        .build();
    tracing::info!(id = %client.player_id(), "identity loaded");

    match command {
        Command::List => list_games(&mut client).await?,
        Command::Host(name) => {
            let mut world = WorldConfig::default();
            if !name.is_empty() {
                world = world.with_name(name);
            }
            let world = client.host(&world).await?;
            println!("hosting {} as {}", world.name, world.id);
            play(&mut client, &room).await?;
        }
        Command::Join(id) => {
            client.join(&id).await?;
            println!("joined {id}");
            play(&mut client, &room).await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> impl Iterator<Item = String> {
        list.iter().map(|s| s.to_string()).collect::<Vec<_>>().into_iter()
    }

    #[test]
    fn test_parse_args() {
        assert!(matches!(parse_args(args(&["list"])), Some(Command::List)));
        assert!(matches!(
            parse_args(args(&["host", "Alpha", "Base"])),
            Some(Command::Host(name)) if name == "Alpha Base"
        ));
        assert!(matches!(
            parse_args(args(&["join", "world_1"])),
            Some(Command::Join(id)) if id.as_str() == "world_1"
        ));
        assert!(parse_args(args(&["join"])).is_none());
        assert!(parse_args(args(&[])).is_none());
    }

    #[test]
    fn test_wanderer_stays_in_arena() {
        let config = RoomConfig::default().with_arena(100.0, 50.0);
        let mut wanderer = Wanderer::new(&config);
        for _ in 0..10_000 {
            let (x, y) = wanderer.step(Duration::from_millis(16));
            assert!((0.0..=100.0).contains(&x), "x = {x}");
            assert!((0.0..=50.0).contains(&y), "y = {y}");
        }
    }

    #[test]
    fn test_wanderer_in_empty_arena() {
        let config = RoomConfig::default().with_arena(0.0, 0.0);
        let mut wanderer = Wanderer::new(&config);
        assert_eq!((wanderer.x, wanderer.y), (0.0, 0.0));
        let (x, y) = wanderer.step(Duration::from_millis(16));
        assert_eq!((x, y), (0.0, 0.0));
    }
}
