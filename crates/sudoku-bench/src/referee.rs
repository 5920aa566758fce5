//! Host-side rules: validates proposals, detects forbidden moves with the
//! solver, and applies the outcome to the authoritative game state.

use serde::Serialize;
use sudoku_core::game::solver::is_solvable;
use sudoku_core::game::state::GameState;
use sudoku_core::model::moves::Move;
use sudoku_core::model::score::region_points;
use thiserror::Error;

/// Proposal that breaks the basic rules; the proposing side forfeits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IllegalMove {
    #[error("cell is outside the board")]
    OutOfBoard,
    #[error("value is outside 1..=N")]
    ValueOutOfRange,
    #[error("cell is already filled")]
    Occupied,
    #[error("value already present in the cell's row, column or block")]
    RegionConflict,
    #[error("move was already declared forbidden")]
    Repeated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ruling {
    /// Move stands and earns `points`.
    Accepted { points: u32 },
    /// Move leaves the puzzle unsolvable: it is rejected and the turn passes.
    Forbidden,
    Illegal(IllegalMove),
}

pub fn judge(state: &GameState, mv: Move, points_table: &[u32; 4]) -> Ruling {
    let board = state.board();
    let size = board.size();
    if mv.row >= size || mv.col >= size {
        return Ruling::Illegal(IllegalMove::OutOfBoard);
    }
    if mv.value == 0 || mv.value as usize > size {
        return Ruling::Illegal(IllegalMove::ValueOutOfRange);
    }
    if !board.is_empty_cell(mv.row, mv.col) {
        return Ruling::Illegal(IllegalMove::Occupied);
    }
    if !board.candidate_values(mv.row, mv.col).contains(mv.value) {
        return Ruling::Illegal(IllegalMove::RegionConflict);
    }
    if state.forbidden().declared().any(|declared| declared == mv) {
        return Ruling::Illegal(IllegalMove::Repeated);
    }
    if !is_solvable(&board.with_move(mv)) {
        return Ruling::Forbidden;
    }
    let completed = board.regions_completed_by(mv.row, mv.col);
    Ruling::Accepted {
        points: region_points(completed, points_table),
    }
}

/// Judges `mv` and records the result in `state`. Illegal moves leave the
/// state untouched.
pub fn apply(state: &mut GameState, mv: Move, points_table: &[u32; 4]) -> Ruling {
    let ruling = judge(state, mv, points_table);
    match ruling {
        Ruling::Accepted { points } => state.play(mv, points),
        Ruling::Forbidden => state.declare_forbidden(mv),
        Ruling::Illegal(_) => {}
    }
    ruling
}

#[cfg(test)]
mod tests {
    use super::*;
    use sudoku_core::model::board::Board;
    use sudoku_core::model::player::Player;
    use sudoku_core::model::score::DEFAULT_REGION_POINTS;

    fn state_from(text: &str) -> GameState {
        GameState::new(text.parse::<Board>().expect("board text"))
    }

    #[test]
    fn completing_three_regions_scores_seven() {
        let mut state = state_from("2 2\n. 2 3 4\n3 4 1 2\n2 1 4 3\n4 3 2 1\n");
        let ruling = apply(&mut state, Move::new(0, 0, 1), &DEFAULT_REGION_POINTS);
        assert_eq!(ruling, Ruling::Accepted { points: 7 });
        assert_eq!(state.scores().score(Player::First), 7);
        assert!(state.board().is_full());
    }

    #[test]
    fn unsolvable_result_is_forbidden_and_passes_the_turn() {
        let mut state = state_from("2 2\n1 2 3 .\n. . . .\n. . . .\n. . . .\n");
        let mv = Move::new(1, 3, 4);
        assert_eq!(apply(&mut state, mv, &DEFAULT_REGION_POINTS), Ruling::Forbidden);
        assert!(state.is_forbidden(mv));
        assert!(state.board().is_empty_cell(1, 3));
        assert_eq!(state.to_move(), Player::Second);
        assert_eq!(
            judge(&state, mv, &DEFAULT_REGION_POINTS),
            Ruling::Illegal(IllegalMove::Repeated)
        );
    }

    #[test]
    fn rule_breaking_moves_are_illegal() {
        let state = state_from("2 2\n1 . . .\n. . . .\n. . . .\n. . . .\n");
        let table = DEFAULT_REGION_POINTS;
        assert_eq!(
            judge(&state, Move::new(4, 0, 1), &table),
            Ruling::Illegal(IllegalMove::OutOfBoard)
        );
        assert_eq!(
            judge(&state, Move::new(0, 1, 5), &table),
            Ruling::Illegal(IllegalMove::ValueOutOfRange)
        );
        assert_eq!(
            judge(&state, Move::new(0, 0, 2), &table),
            Ruling::Illegal(IllegalMove::Occupied)
        );
        assert_eq!(
            judge(&state, Move::new(1, 1, 1), &table),
            Ruling::Illegal(IllegalMove::RegionConflict)
        );
        assert_eq!(
            judge(&state, Move::new(1, 1, 2), &table),
            Ruling::Accepted { points: 0 }
        );
    }
}
