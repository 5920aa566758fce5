use sudoku_core::game::state::GameState;
use sudoku_core::model::board::Board;
use sudoku_core::model::moves::Move;

use super::legality::{cell_candidates, is_candidate};

/// Few enough empty cells, at least three and an even count: losing a turn
/// to a forbidden move hands the last fill, and its region bonus, to us.
pub fn in_parity_window(board: &Board) -> bool {
    let empty = board.empty_cell_count();
    let size = board.size() as f64;
    let limit = 2.0 * size + 1.0 - size.sqrt();
    empty >= 3 && empty % 2 == 0 && empty as f64 <= limit
}

/// A move the referee is bound to reject.
///
/// Scans cells row-major for one whose value is forced, then looks for
/// another empty cell in the same row, column or block (in that order)
/// where the forced value is still a candidate. Placing it there makes the
/// forced cell unfillable.
pub fn find_forbidden_move(state: &GameState) -> Option<Move> {
    let board = state.board();
    for (row, col) in board.empty_cells() {
        let Some(value) = cell_candidates(state, row, col).single() else {
            continue;
        };
        for region in board.regions_of(row, col) {
            let hit = board
                .empty_cells_in_region(region)
                .filter(|&cell| cell != (row, col))
                .map(|(r, c)| Move::new(r, c, value))
                .find(|&mv| is_candidate(state, mv));
            if hit.is_some() {
                return hit;
            }
        }
    }
    None
}

/// [`find_forbidden_move`] gated by [`in_parity_window`].
pub fn forbidden_opportunity(state: &GameState) -> Option<Move> {
    if in_parity_window(state.board()) {
        find_forbidden_move(state)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_from(text: &str) -> GameState {
        GameState::new(text.parse::<Board>().expect("board text"))
    }

    #[test]
    fn forced_value_is_replayed_in_a_shared_column() {
        // (0,3) must be 4; (1,3) is the first rival below it.
        let state = state_from("2 2\n1 2 3 .\n. . . .\n. . . .\n. . . .\n");
        assert_eq!(find_forbidden_move(&state), Some(Move::new(1, 3, 4)));
    }

    #[test]
    fn open_board_has_no_forced_cell() {
        let state = GameState::new(Board::empty(3, 3).unwrap());
        assert_eq!(find_forbidden_move(&state), None);
    }

    #[test]
    fn declared_rejections_are_not_offered_again() {
        let mut state = state_from("2 2\n1 2 3 .\n. . . .\n. . . .\n. . . .\n");
        state.declare_forbidden(Move::new(1, 3, 4));
        // Column 3 continues with (2,3), still open for 4.
        assert_eq!(find_forbidden_move(&state), Some(Move::new(2, 3, 4)));
    }

    #[test]
    fn parity_window_on_4x4() {
        // limit is 2*4 + 1 - 2 = 7
        let six = "2 2\n1 2 3 .\n3 . 1 .\n. 1 . 3\n4 3 2 .\n".parse::<Board>().unwrap();
        assert_eq!(six.empty_cell_count(), 6);
        assert!(in_parity_window(&six));

        let five = six.with_value(0, 3, 4);
        assert!(!in_parity_window(&five));

        let eight = "2 2\n1 . 3 .\n3 . 1 .\n. 1 . 3\n4 3 . .\n".parse::<Board>().unwrap();
        assert_eq!(eight.empty_cell_count(), 8);
        assert!(!in_parity_window(&eight));

        assert!(!in_parity_window(&Board::empty(2, 2).unwrap()));
    }

    #[test]
    fn opportunity_requires_the_window() {
        let open = state_from("2 2\n1 2 3 .\n. . . .\n. . . .\n. . . .\n");
        assert_eq!(forbidden_opportunity(&open), None);

        let late = state_from("2 2\n1 2 3 .\n3 . 1 .\n. 1 . 3\n4 3 2 .\n");
        assert_eq!(forbidden_opportunity(&late), Some(Move::new(1, 3, 4)));
    }
}
