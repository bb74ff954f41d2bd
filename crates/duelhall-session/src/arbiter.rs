//! The move arbiter.
//!
//! Three steps, in order, stopping at the first failure:
//!
//! 1. **Ownership**: the piece on the origin cell must belong to the
//!    proposer's role. The rules engine is not consulted if this fails.
//! 2. **Legality**: the rules engine validates the move.
//! 3. **Execution**: the rules engine applies it.
//!
//! The proposer's color always comes from their role, never from the
//! move payload. Announcing the move is left to the session.

use duelhall_protocol::{Move, Role};

use crate::{GameRules, SessionError};

/// Runs a move through ownership, legality and execution.
///
/// # Errors
/// Returns [`SessionError::InvalidMove`] if either check fails. The
/// engine's state is untouched in that case.
pub(crate) fn arbitrate<R: GameRules>(
    rules: &mut R,
    role: Role,
    mv: &Move,
) -> Result<(), SessionError> {
    check_ownership(rules, role, mv)?;

    rules
        .validate_move(mv.initial_position, mv.target_position, &mv.card)
        .map_err(SessionError::InvalidMove)?;

    rules.execute_move(mv.initial_position, mv.target_position, &mv.card);
    Ok(())
}

fn check_ownership<R: GameRules>(rules: &R, role: Role, mv: &Move) -> Result<(), SessionError> {
    let owner = rules
        .cell_contents(mv.initial_position)
        .map(|piece| piece.color);
    match (owner, role.color()) {
        (Some(owner), Some(mover)) if owner == mover => Ok(()),
        _ => Err(SessionError::InvalidMove(format!(
            "Piece at {} does not belong to {role}",
            mv.initial_position
        ))),
    }
}
