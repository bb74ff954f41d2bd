//! The role assignment policy.
//!
//! Kept free of any session state so every branch can be tested with
//! plain values. The caller describes what it sees ([`Occupancy`]) and
//! gets back the role to hand out; appending the participant and
//! announcing it is the caller's job.

use duelhall_protocol::Role;

use crate::JoinCodes;

/// What the session looks like at the moment someone joins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Occupancy {
    /// An attached participant currently holds White.
    pub white: bool,
    /// An attached participant currently holds Black.
    pub black: bool,
    /// The rules engine has been started.
    pub started: bool,
}

impl Occupancy {
    /// Returns `true` if nobody attached holds `role`.
    ///
    /// Spectator seats are unlimited, so they are always free.
    pub fn is_free(&self, role: Role) -> bool {
        match role {
            Role::White => !self.white,
            Role::Black => !self.black,
            Role::Spectator => true,
        }
    }

    /// Number of primary seats held (0..=2).
    pub fn primaries(&self) -> usize {
        usize::from(self.white) + usize::from(self.black)
    }
}

/// Decides which role a newcomer receives.
///
/// Rules, in order:
///
/// 1. If the session was created with rematch join codes, the presented
///    token picks the seat: the White code gets White and the Black code
///    gets Black, each only while that seat is free. Any other token (or
///    none) gets Spectator.
/// 2. Otherwise, once the game has started everyone is a Spectator.
/// 3. Otherwise the first free seat of White, then Black, is taken.
/// 4. Otherwise Spectator.
///
/// A primary role is never returned while its seat is occupied.
pub fn assign_role(
    occupancy: Occupancy,
    codes: Option<&JoinCodes>,
    token: Option<&str>,
) -> Role {
    if let Some(codes) = codes {
        let wanted = token.and_then(|token| codes.role_for(token));
        return match wanted {
            Some(role) if occupancy.is_free(role) => role,
            _ => Role::Spectator,
        };
    }

    if occupancy.started {
        return Role::Spectator;
    }

    [Role::White, Role::Black]
        .into_iter()
        .find(|role| occupancy.is_free(*role))
        .unwrap_or(Role::Spectator)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codes() -> JoinCodes {
        JoinCodes {
            white: "white-code".into(),
            black: "black-code".into(),
        }
    }

    fn seats(white: bool, black: bool, started: bool) -> Occupancy {
        Occupancy {
            white,
            black,
            started,
        }
    }

    // =====================================================================
    // Open sessions (no join codes)
    // =====================================================================

    #[test]
    fn test_assign_role_first_joiner_gets_white() {
        let role = assign_role(seats(false, false, false), None, None);
        assert_eq!(role, Role::White);
    }

    #[test]
    fn test_assign_role_second_joiner_gets_black() {
        let role = assign_role(seats(true, false, false), None, None);
        assert_eq!(role, Role::Black);
    }

    #[test]
    fn test_assign_role_third_joiner_gets_spectator() {
        let role = assign_role(seats(true, true, false), None, None);
        assert_eq!(role, Role::Spectator);
    }

    #[test]
    fn test_assign_role_vacated_white_is_refilled_first() {
        // White left before the game started; Black is still seated.
        let role = assign_role(seats(false, true, false), None, None);
        assert_eq!(role, Role::White);
    }

    #[test]
    fn test_assign_role_started_game_only_admits_spectators() {
        // Even with a vacated seat, a started game takes no new players.
        let role = assign_role(seats(false, true, true), None, None);
        assert_eq!(role, Role::Spectator);
    }

    #[test]
    fn test_assign_role_ignores_token_without_codes() {
        let role = assign_role(seats(false, false, false), None, Some("white-code"));
        assert_eq!(role, Role::White);
    }

    // =====================================================================
    // Rematch sessions (join codes configured)
    // =====================================================================

    #[test]
    fn test_assign_role_black_code_gets_black_even_when_first() {
        let codes = codes();
        let role = assign_role(seats(false, false, false), Some(&codes), Some("black-code"));
        assert_eq!(role, Role::Black);
    }

    #[test]
    fn test_assign_role_white_code_gets_white() {
        let codes = codes();
        let role = assign_role(seats(false, true, false), Some(&codes), Some("white-code"));
        assert_eq!(role, Role::White);
    }

    #[test]
    fn test_assign_role_code_for_occupied_seat_gets_spectator() {
        let codes = codes();
        let role = assign_role(seats(true, false, false), Some(&codes), Some("white-code"));
        assert_eq!(role, Role::Spectator);
    }

    #[test]
    fn test_assign_role_wrong_or_missing_code_gets_spectator() {
        let codes = codes();
        let empty = seats(false, false, false);
        assert_eq!(
            assign_role(empty, Some(&codes), Some("guess")),
            Role::Spectator
        );
        assert_eq!(assign_role(empty, Some(&codes), None), Role::Spectator);
    }

    // =====================================================================
    // Occupancy
    // =====================================================================

    #[test]
    fn test_occupancy_spectator_seat_always_free() {
        let full = seats(true, true, true);
        assert!(full.is_free(Role::Spectator));
        assert!(!full.is_free(Role::White));
        assert_eq!(full.primaries(), 2);
        assert_eq!(Occupancy::default().primaries(), 0);
    }
}
