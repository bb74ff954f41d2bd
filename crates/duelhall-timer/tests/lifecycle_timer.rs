//! Integration tests for the lifecycle timer.
//!
//! Uses paused Tokio time so windows of minutes resolve instantly and
//! deterministically.

use std::time::Duration;

use duelhall_timer::{LifecycleTimer, TimerConfig, Window};

// =========================================================================
// Helpers
// =========================================================================

fn short_windows() -> TimerConfig {
    TimerConfig {
        join_window: Duration::from_secs(10),
        move_window: Duration::from_secs(60),
    }
}

// =========================================================================
// TimerConfig
// =========================================================================

#[test]
fn test_default_config_is_thirty_minutes_each() {
    let cfg = TimerConfig::default();
    assert_eq!(cfg.join_window, Duration::from_secs(1800));
    assert_eq!(cfg.move_window, Duration::from_secs(1800));
}

#[test]
fn test_deserialize_missing_window_uses_default() {
    let cfg: TimerConfig =
        serde_json::from_str(r#"{"join_window":{"secs":5,"nanos":0}}"#).unwrap();
    assert_eq!(cfg.join_window, Duration::from_secs(5));
    assert_eq!(cfg.move_window, TimerConfig::DEFAULT_WINDOW);
}

#[test]
fn test_validated_clamps_zero_windows() {
    let cfg = TimerConfig::uniform(Duration::ZERO).validated();
    assert_eq!(cfg.join_window, TimerConfig::MIN_WINDOW);
    assert_eq!(cfg.move_window, TimerConfig::MIN_WINDOW);
}

#[test]
fn test_window_selects_length() {
    let cfg = short_windows();
    assert_eq!(cfg.window(Window::Join), Duration::from_secs(10));
    assert_eq!(cfg.window(Window::Move), Duration::from_secs(60));
}

// =========================================================================
// Arming and firing
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_new_timer_is_disarmed_and_never_fires() {
    let timer = LifecycleTimer::new(short_windows());
    assert!(!timer.is_armed());
    assert_eq!(timer.remaining(), None);

    let result = tokio::time::timeout(Duration::from_secs(3600), timer.expired()).await;
    assert!(result.is_err(), "disarmed timer should pend forever");
}

#[tokio::test(start_paused = true)]
async fn test_reset_join_fires_after_join_window() {
    let mut timer = LifecycleTimer::new(short_windows());
    timer.reset(Window::Join);
    assert_eq!(timer.remaining(), Some(Duration::from_secs(10)));

    let early = tokio::time::timeout(Duration::from_secs(9), timer.expired()).await;
    assert!(early.is_err(), "should not fire before the window");

    tokio::time::timeout(Duration::from_secs(2), timer.expired())
        .await
        .expect("should fire once the window has passed");
}

#[tokio::test(start_paused = true)]
async fn test_reset_move_uses_move_window() {
    let mut timer = LifecycleTimer::new(short_windows());
    timer.reset(Window::Move);

    let early = tokio::time::timeout(Duration::from_secs(30), timer.expired()).await;
    assert!(early.is_err());
    assert_eq!(timer.remaining(), Some(Duration::from_secs(30)));
}

// =========================================================================
// Superseded deadlines
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_reset_supersedes_previous_deadline() {
    let mut timer = LifecycleTimer::new(short_windows());
    timer.reset(Window::Join);

    tokio::time::advance(Duration::from_secs(8)).await;
    timer.reset(Window::Join);

    // The first deadline (t=10) has been replaced by t=18.
    let result = tokio::time::timeout(Duration::from_secs(5), timer.expired()).await;
    assert!(result.is_err(), "old deadline must not fire");
    assert_eq!(timer.remaining(), Some(Duration::from_secs(5)));
}

#[tokio::test(start_paused = true)]
async fn test_cancel_disarms() {
    let mut timer = LifecycleTimer::new(short_windows());
    timer.reset(Window::Join);
    timer.cancel();

    assert!(!timer.is_armed());
    let result = tokio::time::timeout(Duration::from_secs(60), timer.expired()).await;
    assert!(result.is_err(), "cancelled timer should never fire");
}

#[tokio::test(start_paused = true)]
async fn test_expired_future_does_not_borrow_timer() {
    let mut timer = LifecycleTimer::new(short_windows());
    timer.reset(Window::Join);

    let fut = timer.expired();
    // Resetting while a future is outstanding is allowed; the old future
    // keeps its own deadline.
    timer.reset(Window::Move);
    fut.await;

    assert!(timer.remaining().is_some_and(|r| r > Duration::ZERO));
}

// =========================================================================
// select! integration
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_select_prefers_expired_deadline_when_biased() {
    let mut timer = LifecycleTimer::new(short_windows());
    timer.reset(Window::Join);
    tokio::time::advance(Duration::from_secs(11)).await;

    let (tx, mut rx) = tokio::sync::mpsc::channel::<u8>(1);
    tx.send(1).await.unwrap();

    let fired = tokio::select! {
        biased;
        () = timer.expired() => true,
        _ = rx.recv() => false,
    };
    assert!(fired, "a passed deadline wins over a queued command");
}
