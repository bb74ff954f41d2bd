//! Lobby-facing descriptions of a session: its display name and status.
//!
//! Pure functions so the exact strings are easy to pin down in tests.

use duelhall_protocol::{Color, LifecycleState};

/// Shown for a session nobody has joined yet.
pub const UNNAMED_SESSION: &str = "A newly created game";

/// The human-readable status of a session.
///
/// | situation                         | status                      |
/// |-----------------------------------|-----------------------------|
/// | terminated with a winner          | `done, <winner> won`        |
/// | terminated without a winner       | `abandoned`                 |
/// | in progress                       | `in progress`               |
/// | waiting, no primary attached      | `awaiting two more players` |
/// | waiting, one primary attached     | `awaiting one more player`  |
pub fn status_line(state: LifecycleState, winner: Option<Color>, primaries: usize) -> String {
    match (state, winner) {
        (LifecycleState::Terminated, Some(winner)) => format!("done, {winner} won"),
        (LifecycleState::Terminated, None) => "abandoned".to_string(),
        (LifecycleState::InProgress, _) => "in progress".to_string(),
        (LifecycleState::Waiting, _) => match primaries {
            0 => "awaiting two more players".to_string(),
            1 => "awaiting one more player".to_string(),
            _ => "in progress".to_string(),
        },
    }
}

/// The display name of a session.
///
/// A locked name always wins. Otherwise the name is built from whoever
/// holds White and Black right now, White first.
pub fn display_name(locked: Option<&str>, white: Option<&str>, black: Option<&str>) -> String {
    if let Some(name) = locked {
        return name.to_string();
    }
    match (white, black) {
        (Some(white), Some(black)) => format!("{white} vs. {black}"),
        (Some(only), None) | (None, Some(only)) => format!("{only} vs. ..."),
        (None, None) => UNNAMED_SESSION.to_string(),
    }
}
