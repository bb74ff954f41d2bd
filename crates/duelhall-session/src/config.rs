//! Session configuration.

use duelhall_timer::TimerConfig;
use serde::{Deserialize, Serialize};

/// Configuration for a session instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Fixed display name. When unset, the name follows the players.
    pub name: Option<String>,

    /// Join and move windows for the lifecycle timer.
    pub timer: TimerConfig,

    /// Capacity of the actor's command channel. Senders wait when it
    /// is full.
    pub channel_size: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            name: None,
            timer: TimerConfig::default(),
            channel_size: 64,
        }
    }
}

impl SessionConfig {
    /// Same config under a fixed display name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Clamp out-of-range values. A zero-capacity channel cannot be
    /// created, so `channel_size` is raised to 1.
    pub fn validated(mut self) -> Self {
        if self.channel_size == 0 {
            tracing::warn!("channel_size of 0 is not allowed, using 1");
            self.channel_size = 1;
        }
        self.timer = self.timer.validated();
        self
    }
}
