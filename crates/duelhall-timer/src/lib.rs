//! Lifecycle timer for Duelhall sessions.
//!
//! A session has exactly one outstanding deadline. Every qualifying
//! action (a role assignment, an accepted move, session creation) resets
//! it; if it ever fires, the session is abandoned.
//!
//! Two windows apply:
//!
//! - **join window**: before the game starts, how long the session may
//!   wait for its next participant.
//! - **move window**: after the start, how long a turn may take.
//!
//! # Integration
//!
//! The timer sits inside the session actor's `tokio::select!` loop, next
//! to the command channel:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         biased;
//!         () = timer.expired() => { session.terminate(TerminationReason::NotGiven); }
//!         cmd = cmd_rx.recv() => { /* handle commands, may call timer.reset(..) */ }
//!     }
//! }
//! ```
//!
//! [`LifecycleTimer::expired`] copies the deadline into the returned
//! future, so the timer can be reset from the other branch. A reset
//! rebuilds the future on the next loop iteration, which is what makes a
//! superseded deadline unable to fire.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::{self, Instant};
use tracing::{debug, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Which window a reset should arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Window {
    /// Waiting for players.
    Join,
    /// Waiting for the next move.
    Move,
}

/// Window lengths for the lifecycle timer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimerConfig {
    /// Idle time allowed before the game starts. Default: 30 minutes.
    pub join_window: Duration,
    /// Idle time allowed between moves once started. Default: 30 minutes.
    pub move_window: Duration,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            join_window: Self::DEFAULT_WINDOW,
            move_window: Self::DEFAULT_WINDOW,
        }
    }
}

impl TimerConfig {
    pub const DEFAULT_WINDOW: Duration = Duration::from_secs(30 * 60);

    /// Smallest window accepted. A zero window would terminate a session
    /// in the same loop iteration that created it.
    pub const MIN_WINDOW: Duration = Duration::from_secs(1);

    /// Both windows set to `window`.
    pub fn uniform(window: Duration) -> Self {
        Self {
            join_window: window,
            move_window: window,
        }
    }

    /// Clamp out-of-range values so the config is safe to use.
    ///
    /// Called automatically by [`LifecycleTimer::new`]. Windows below
    /// [`Self::MIN_WINDOW`] are raised to it.
    pub fn validated(mut self) -> Self {
        if self.join_window < Self::MIN_WINDOW {
            warn!(window = ?self.join_window, "join_window below minimum, clamping");
            self.join_window = Self::MIN_WINDOW;
        }
        if self.move_window < Self::MIN_WINDOW {
            warn!(window = ?self.move_window, "move_window below minimum, clamping");
            self.move_window = Self::MIN_WINDOW;
        }
        self
    }

    /// Length of `window`.
    pub fn window(&self, window: Window) -> Duration {
        match window {
            Window::Join => self.join_window,
            Window::Move => self.move_window,
        }
    }
}

// ---------------------------------------------------------------------------
// Timer
// ---------------------------------------------------------------------------

/// A single cancellable deadline.
///
/// Starts disarmed; [`reset`](Self::reset) arms it. One `LifecycleTimer`
/// per session actor.
#[derive(Debug)]
pub struct LifecycleTimer {
    config: TimerConfig,
    deadline: Option<Instant>,
    /// Bumped on every reset; only used for tracing.
    resets: u64,
}

impl LifecycleTimer {
    pub fn new(config: TimerConfig) -> Self {
        Self {
            config: config.validated(),
            deadline: None,
            resets: 0,
        }
    }

    /// Cancel any outstanding deadline and arm a new one `window` from now.
    pub fn reset(&mut self, window: Window) {
        let length = self.config.window(window);
        self.deadline = Some(Instant::now() + length);
        self.resets += 1;
        debug!(?window, ?length, resets = self.resets, "lifecycle timer reset");
    }

    /// Disarm the timer. [`expired`](Self::expired) pends forever until
    /// the next reset.
    pub fn cancel(&mut self) {
        if self.deadline.take().is_some() {
            debug!(resets = self.resets, "lifecycle timer cancelled");
        }
    }

    /// A future that completes when the current deadline passes.
    ///
    /// Pends forever while disarmed, so it can sit in a `select!` without
    /// ever firing. The future does not borrow the timer.
    pub fn expired(&self) -> impl Future<Output = ()> + Send + use<> {
        let deadline = self.deadline;
        async move {
            match deadline {
                Some(deadline) => time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        }
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Time left until the deadline, or `None` when disarmed.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }
}
