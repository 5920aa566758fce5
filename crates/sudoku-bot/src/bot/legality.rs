use rand::Rng;
use rand::seq::SliceRandom;
use sudoku_core::game::state::GameState;
use sudoku_core::model::moves::Move;
use sudoku_core::model::values::ValueSet;

/// Values the referee has not ruled out and no region already holds.
pub fn cell_candidates(state: &GameState, row: usize, col: usize) -> ValueSet {
    let mut values = state.board().candidate_values(row, col);
    for value in values.iter() {
        if state.is_forbidden(Move::new(row, col, value)) {
            values.remove(value);
        }
    }
    values
}

pub fn is_candidate(state: &GameState, mv: Move) -> bool {
    let board = state.board();
    let size = board.size();
    mv.row < size
        && mv.col < size
        && board.is_empty_cell(mv.row, mv.col)
        && cell_candidates(state, mv.row, mv.col).contains(mv.value)
}

/// Every candidate move, row-major by cell and ascending by value.
pub fn candidate_moves(state: &GameState) -> Vec<Move> {
    let board = state.board();
    let mut moves = Vec::new();
    for (row, col) in board.empty_cells() {
        moves.extend(
            cell_candidates(state, row, col)
                .iter()
                .map(|value| Move::new(row, col, value)),
        );
    }
    moves
}

pub fn random_candidate<R: Rng + ?Sized>(state: &GameState, rng: &mut R) -> Option<Move> {
    candidate_moves(state).choose(rng).copied()
}

/// Candidates grouped by how many values their cell still admits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateTiers {
    pub forced: Vec<Move>,
    pub paired: Vec<Move>,
    pub open: Vec<Move>,
}

impl CandidateTiers {
    pub fn classify(state: &GameState) -> Self {
        let mut tiers = CandidateTiers::default();
        for (row, col) in state.board().empty_cells() {
            let values = cell_candidates(state, row, col);
            let bucket = match values.len() {
                0 => continue,
                1 => &mut tiers.forced,
                2 => &mut tiers.paired,
                _ => &mut tiers.open,
            };
            bucket.extend(values.iter().map(|value| Move::new(row, col, value)));
        }
        tiers
    }

    pub fn len(&self) -> usize {
        self.forced.len() + self.paired.len() + self.open.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forced moves when there are several, else forced plus paired when
    /// paired has several, else everything.
    pub fn selection(self) -> Vec<Move> {
        let CandidateTiers {
            mut forced,
            paired,
            open,
        } = self;
        if forced.len() > 1 {
            return forced;
        }
        forced.extend(paired.iter().copied());
        if paired.len() > 1 {
            return forced;
        }
        forced.extend(open);
        forced
    }
}
