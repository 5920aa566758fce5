use rand::Rng;
use rand::seq::SliceRandom;

use super::solver::fill_board;
use crate::model::board::{Board, BoardError, EMPTY};
use crate::model::values::ValueSet;

/// A complete, valid grid drawn from `rng`.
pub fn random_solution<R: Rng + ?Sized>(
    block_rows: usize,
    block_cols: usize,
    rng: &mut R,
) -> Result<Board, BoardError> {
    let mut board = Board::empty(block_rows, block_cols)?;
    let mut shuffled = |values: ValueSet| {
        let mut order: Vec<u8> = values.iter().collect();
        order.shuffle(&mut *rng);
        order
    };
    if fill_board(&mut board, &mut shuffled) {
        Ok(board)
    } else {
        Err(BoardError::Unsolvable)
    }
}

/// Random solvable start position keeping `clues` filled cells.
pub fn random_puzzle<R: Rng + ?Sized>(
    block_rows: usize,
    block_cols: usize,
    clues: usize,
    rng: &mut R,
) -> Result<Board, BoardError> {
    let mut board = random_solution(block_rows, block_cols, &mut *rng)?;
    let size = board.size();
    let mut cells: Vec<usize> = (0..board.cell_count()).collect();
    cells.shuffle(rng);
    for &idx in cells.iter().skip(clues) {
        board.put(idx / size, idx % size, EMPTY);
    }
    Ok(board)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::solver::{is_consistent, is_solvable};
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn random_solution_is_complete_and_consistent() {
        let mut rng = SmallRng::seed_from_u64(11);
        let board = random_solution(2, 3, &mut rng).unwrap();
        assert!(board.is_full());
        assert!(is_consistent(&board));
    }

    #[test]
    fn puzzle_keeps_requested_clues_and_stays_solvable() {
        let mut rng = SmallRng::seed_from_u64(3);
        let board = random_puzzle(3, 3, 20, &mut rng).unwrap();
        assert_eq!(board.cell_count() - board.empty_cell_count(), 20);
        assert!(is_solvable(&board));
    }

    #[test]
    fn same_seed_same_puzzle() {
        let a = random_puzzle(2, 2, 6, &mut SmallRng::seed_from_u64(5)).unwrap();
        let b = random_puzzle(2, 2, 6, &mut SmallRng::seed_from_u64(5)).unwrap();
        assert_eq!(a, b);
    }
}
