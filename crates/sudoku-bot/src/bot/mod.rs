mod arena;
mod endgame;
mod legality;
mod minimax;
mod params;
mod risk;
mod scoring;
mod uct;

pub use arena::{Arena, NodeId};
pub use endgame::{find_forbidden_move, forbidden_opportunity, in_parity_window};
pub use legality::{
    CandidateTiers, candidate_moves, cell_candidates, is_candidate, random_candidate,
};
pub use minimax::{DeepenReport, MinimaxTree, NodeStatus};
pub use params::BotParams;
pub use risk::forbidden_probability;
pub use scoring::{MoveScore, region_fill_value, score_move};
pub use uct::{Outcome, OutcomeTally, UctTree};

use sudoku_core::model::moves::Move;
use sudoku_core::model::region::Region;
use thiserror::Error;

/// A candidate could not be evaluated; the board violates a precondition.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("move {mv} targets an occupied cell")]
    OccupiedCell { mv: Move },
    #[error("move {mv} lies outside a {size}x{size} board")]
    OutOfBoard { mv: Move, size: usize },
    #[error("move {mv} has a value outside 1..={size}")]
    ValueOutOfRange { mv: Move, size: usize },
    #[error("{region} holds {distinct} distinct values in {filled} filled cells")]
    RegionAccounting {
        region: Region,
        filled: usize,
        distinct: usize,
    },
}

/// Aborts one search increment; the tree and earlier proposals stay valid.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SearchError {
    #[error("non-finite score {score} propagated at depth {depth}")]
    NonFiniteScore { depth: usize, score: f64 },
}
