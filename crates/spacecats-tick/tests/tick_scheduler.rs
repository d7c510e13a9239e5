//! Integration tests for the simulation clock.
//!
//! Every async test runs with Tokio time paused, so `sleep_until` resolves as
//! soon as nothing else is runnable and the tests are instant and exact.

use std::time::Duration;

use spacecats_tick::{Cadence, TickConfig, TickPolicy, TickScheduler};

fn clock_20hz() -> TickScheduler {
    TickScheduler::new(TickConfig::with_rate(20).without_jitter())
}

// =========================================================================
// Construction
// =========================================================================

#[test]
fn test_initial_state() {
    let clock = clock_20hz();
    assert_eq!(clock.tick_count(), 0);
    assert_eq!(clock.tick_rate_hz(), 20);
    assert_eq!(clock.tick_duration(), Some(Duration::from_millis(50)));
    assert!(!clock.is_paused());
    assert!(!clock.is_stopped());
}

#[test]
fn test_sixty_hz_step() {
    let clock = TickScheduler::with_rate(60);
    assert_eq!(
        clock.tick_duration(),
        Some(Duration::from_secs_f64(1.0 / 60.0))
    );
}

// =========================================================================
// Ticking
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_ticks_are_numbered_from_one() {
    let mut clock = clock_20hz();
    for expected in 1..=5 {
        let tick = clock.wait_for_tick().await;
        assert_eq!(tick.number, expected);
        assert_eq!(tick.dt, Duration::from_millis(50));
        assert_eq!(tick.skipped, 0);
    }
    assert_eq!(clock.tick_count(), 5);
}

#[tokio::test(start_paused = true)]
async fn test_stopped_clock_never_ticks() {
    let mut clock = TickScheduler::new(TickConfig::with_rate(0));
    assert!(clock.is_stopped());
    let result = tokio::time::timeout(Duration::from_secs(5), clock.wait_for_tick()).await;
    assert!(result.is_err(), "a zero-rate clock should pend forever");
}

#[tokio::test(start_paused = true)]
async fn test_skip_policy_reports_missed_ticks() {
    let mut clock = clock_20hz();
    clock.wait_for_tick().await;

    // Stall for four ticks' worth of time without polling.
    tokio::time::advance(Duration::from_millis(220)).await;
    let tick = clock.wait_for_tick().await;
    assert_eq!(tick.number, 2);
    assert!(tick.skipped >= 3, "skipped {}", tick.skipped);
}

#[tokio::test(start_paused = true)]
async fn test_drop_policy_keeps_schedule() {
    let mut clock = TickScheduler::new(
        TickConfig::with_rate(20)
            .without_jitter()
            .with_policy(TickPolicy::Drop),
    );
    clock.wait_for_tick().await;
    tokio::time::advance(Duration::from_millis(220)).await;

    // The overdue ticks fire without waiting.
    let start = tokio::time::Instant::now();
    for _ in 0..3 {
        let tick = clock.wait_for_tick().await;
        assert_eq!(tick.skipped, 0);
    }
    assert_eq!(tokio::time::Instant::now(), start);
}

// =========================================================================
// Pause / Resume
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_pause_stops_ticks() {
    let mut clock = clock_20hz();
    clock.wait_for_tick().await;
    clock.pause();
    assert!(clock.is_paused());

    let result = tokio::time::timeout(Duration::from_secs(1), clock.wait_for_tick()).await;
    assert!(result.is_err(), "paused clock should pend");
}

#[tokio::test(start_paused = true)]
async fn test_resume_continues_numbering() {
    let mut clock = clock_20hz();
    clock.wait_for_tick().await;
    clock.pause();
    clock.pause();
    clock.resume();
    clock.resume();
    assert!(!clock.is_paused());

    let tick = clock.wait_for_tick().await;
    assert_eq!(tick.number, 2);
    assert_eq!(tick.skipped, 0);
}

// =========================================================================
// select! loop with cadences (the way the relay client drives it)
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_select_loop_with_broadcast_cadence() {
    let mut clock = clock_20hz();
    let mut broadcast = Cadence::every(5);
    let (tx, mut rx) = tokio::sync::mpsc::channel::<&str>(1);

    tokio::spawn(async move {
        // Just over a second at 20 Hz: 20 ticks, four broadcasts.
        tokio::time::sleep(Duration::from_millis(1_005)).await;
        tx.send("stop").await.ok();
    });

    let mut broadcasts = 0;
    loop {
        tokio::select! {
            Some(_) = rx.recv() => break,
            _ = clock.wait_for_tick() => {
                if broadcast.due() {
                    broadcasts += 1;
                }
            }
        }
    }

    assert_eq!(broadcasts, 4);
}
