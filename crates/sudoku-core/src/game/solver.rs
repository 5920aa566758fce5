//! Backtracking solver used to decide whether a position can still be completed.

use crate::model::board::{Board, EMPTY};
use crate::model::region::Region;
use crate::model::values::ValueSet;

/// True when no region holds the same value twice.
pub fn is_consistent(board: &Board) -> bool {
    (0..board.size())
        .flat_map(|i| [Region::Row(i), Region::Column(i), Region::Block(i)])
        .all(|region| {
            let filled = board
                .region_cells(region)
                .filter(|&(row, col)| !board.is_empty_cell(row, col))
                .count();
            filled == board.values_in_region(region).len()
        })
}

pub fn solve(board: &Board) -> Option<Board> {
    if !is_consistent(board) {
        return None;
    }
    let mut work = board.clone();
    let mut ascending = |values: ValueSet| values.iter().collect::<Vec<_>>();
    fill_board(&mut work, &mut ascending).then_some(work)
}

pub fn is_solvable(board: &Board) -> bool {
    solve(board).is_some()
}

/// Fills every empty cell, most-constrained cell first, trying values in the
/// order returned by `order`. Leaves the board untouched on failure.
pub(crate) fn fill_board<F>(board: &mut Board, order: &mut F) -> bool
where
    F: FnMut(ValueSet) -> Vec<u8>,
{
    let mut target: Option<((usize, usize), ValueSet)> = None;
    for (row, col) in board.empty_cells() {
        let values = board.candidate_values(row, col);
        if values.is_empty() {
            return false;
        }
        if target.is_none_or(|(_, best)| values.len() < best.len()) {
            target = Some(((row, col), values));
            if values.len() == 1 {
                break;
            }
        }
    }

    let Some(((row, col), values)) = target else {
        return true;
    };

    for value in order(values) {
        board.put(row, col, value);
        if fill_board(board, order) {
            return true;
        }
    }
    board.put(row, col, EMPTY);
    false
}
