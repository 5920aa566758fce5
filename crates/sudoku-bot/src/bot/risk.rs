use sudoku_core::model::board::Board;
use sudoku_core::model::moves::Move;
use sudoku_core::model::region::Region;

use super::EvalError;

/// Estimated probability that the referee rules `mv` forbidden.
///
/// Works region by region (row, column, block). Every other empty cell of a
/// region is a potential home for the value unless its own row/column/block
/// already excludes it. If such a cell is left with the move's value as its
/// only option, the move is certainly forbidden (1.0). A region where the
/// move's cell is the only potential home makes the move certainly safe
/// (0.0). Otherwise the safest region decides: `1 - max(1 / potential)`.
/// This is a heuristic and proves nothing either way.
pub fn forbidden_probability(board: &Board, mv: Move) -> Result<f64, EvalError> {
    validate_target(board, mv)?;

    let size = board.size();
    let mut safest = 0.0_f64;
    for region in board.regions_of(mv.row, mv.col) {
        let mut potential = 1usize;
        for (row, col) in board.empty_cells_in_region(region) {
            if (row, col) == mv.cell() {
                continue;
            }
            let [first, second] = crossing_regions(board, region, row, col);
            let first_values = board.values_in_region(first);
            let second_values = board.values_in_region(second);
            if first_values.union(second_values).contains(mv.value) {
                continue;
            }
            if first_values.len() == size - 1 || second_values.len() == size - 1 {
                return Ok(1.0);
            }
            potential += 1;
        }
        if potential == 1 {
            return Ok(0.0);
        }
        safest = safest.max(1.0 / potential as f64);
    }
    Ok(1.0 - safest)
}

/// The two regions through (`row`, `col`) other than `region`.
fn crossing_regions(board: &Board, region: Region, row: usize, col: usize) -> [Region; 2] {
    let block = Region::Block(board.block_of(row, col));
    match region {
        Region::Row(_) => [Region::Column(col), block],
        Region::Column(_) => [Region::Row(row), block],
        Region::Block(_) => [Region::Row(row), Region::Column(col)],
    }
}

pub(crate) fn validate_target(board: &Board, mv: Move) -> Result<(), EvalError> {
    let size = board.size();
    if mv.row >= size || mv.col >= size {
        return Err(EvalError::OutOfBoard { mv, size });
    }
    if mv.value == 0 || mv.value as usize > size {
        return Err(EvalError::ValueOutOfRange { mv, size });
    }
    if !board.is_empty_cell(mv.row, mv.col) {
        return Err(EvalError::OccupiedCell { mv });
    }
    for region in board.regions_of(mv.row, mv.col) {
        let filled = size - board.empty_count_in_region(region);
        let distinct = board.values_in_region(region).len();
        if filled != distinct {
            return Err(EvalError::RegionAccounting {
                region,
                filled,
                distinct,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(text: &str) -> Board {
        text.parse().expect("board text")
    }

    #[test]
    fn only_home_in_a_region_is_safe() {
        // Row 0 has one gap, so (0,3)=4 has no competitor in the row.
        let board = board("2 2\n1 2 3 .\n. . . .\n. . . .\n. . . .\n");
        assert_eq!(forbidden_probability(&board, Move::new(0, 3, 4)), Ok(0.0));
    }

    #[test]
    fn cell_forced_to_the_same_value_makes_move_certain_failure() {
        // (0,3) must be 4; playing 4 at (1,3) shares column 3 with it.
        let board = board("2 2\n1 2 3 .\n. . . .\n. . . .\n. . . .\n");
        assert_eq!(forbidden_probability(&board, Move::new(1, 3, 4)), Ok(1.0));
    }

    #[test]
    fn open_board_risk_comes_from_safest_region() {
        // Empty 4x4: every region has four homes for any value.
        let board = Board::empty(2, 2).unwrap();
        let risk = forbidden_probability(&board, Move::new(0, 0, 1)).unwrap();
        assert!((risk - 0.75).abs() < 1e-12);
    }

    #[test]
    fn excluded_neighbours_lower_the_risk() {
        // Row 0: (0,2) and (0,3) cannot hold 1 (column 2 and block 1 already
        // contain it), leaving (0,1) as the only rival in the row.
        let board = board("2 2\n. . . .\n. . 1 .\n. . . .\n. . . .\n");
        let risk = forbidden_probability(&board, Move::new(0, 0, 1)).unwrap();
        assert!((risk - 0.5).abs() < 1e-12);
    }

    #[test]
    fn occupied_target_is_rejected() {
        let board = board("2 2\n1 . . .\n. . . .\n. . . .\n. . . .\n");
        assert_eq!(
            forbidden_probability(&board, Move::new(0, 0, 2)),
            Err(EvalError::OccupiedCell {
                mv: Move::new(0, 0, 2)
            })
        );
    }

    #[test]
    fn duplicate_values_abort_the_estimate() {
        let board = board("2 2\n1 . 1 .\n. . . .\n. . . .\n. . . .\n");
        assert!(matches!(
            forbidden_probability(&board, Move::new(0, 1, 2)),
            Err(EvalError::RegionAccounting { .. })
        ));
    }
}
