use sudoku_bot::candidate_moves;
use sudoku_core::game::state::GameState;
use sudoku_core::model::board::Board;
use sudoku_core::model::moves::Move;

#[test]
fn empty_9x9_offers_every_cell_value_pair() {
    let state = GameState::new(Board::empty(3, 3).unwrap());
    let moves = candidate_moves(&state);
    assert_eq!(moves.len(), 9 * 9 * 9);
    assert_eq!(moves.first(), Some(&Move::new(0, 0, 1)));
    assert_eq!(moves.last(), Some(&Move::new(8, 8, 9)));
}

#[test]
fn placing_a_value_shrinks_its_row_column_and_block() {
    let mut board = Board::empty(3, 3).unwrap();
    board.put(0, 0, 5);
    let state = GameState::new(board);
    let moves = candidate_moves(&state);

    // the cell itself (9), the rest of row 0 and column 0 (8 + 8),
    // and the four block cells outside both lines
    assert_eq!(moves.len(), 729 - 9 - 8 - 8 - 4);
    assert!(moves.iter().all(|mv| mv.cell() != (0, 0)));
    assert!(
        moves
            .iter()
            .filter(|mv| mv.value == 5)
            .all(|mv| mv.row != 0 && mv.col != 0 && (mv.row >= 3 || mv.col >= 3))
    );
    assert!(moves.contains(&Move::new(4, 4, 5)));
    assert!(moves.contains(&Move::new(0, 1, 4)));
}

#[test]
fn rectangular_blocks_follow_their_geometry() {
    // 2x3 blocks: six values, blocks two rows tall and three columns wide
    let mut board = Board::empty(2, 3).unwrap();
    board.put(0, 0, 1);
    let state = GameState::new(board);
    let moves = candidate_moves(&state);
    assert!(!moves.contains(&Move::new(1, 2, 1)));
    assert!(moves.contains(&Move::new(1, 3, 1)));
    assert!(moves.contains(&Move::new(2, 1, 1)));
    assert_eq!(moves.len(), 216 - 6 - 5 - 5 - 2);
}
