mod controller;

pub use controller::{
    AnytimeController, ControllerConfig, DecisionSummary, StepOutcome, compute_best_move,
};

use core::fmt;
use core::str::FromStr;

use sudoku_core::game::state::GameState;
use sudoku_core::model::moves::Move;
use thiserror::Error;
use tracing::{Level, event};

use crate::bot::{BotParams, MinimaxTree, SearchError, UctTree, score_move};

/// Which search engine drives the decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    #[default]
    Minimax,
    Uct,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown strategy '{0}' (expected minimax or uct)")]
pub struct UnknownStrategy(pub String);

impl Strategy {
    pub const fn as_str(self) -> &'static str {
        match self {
            Strategy::Minimax => "minimax",
            Strategy::Uct => "uct",
        }
    }

    /// `SUDOKU_STRATEGY`, defaulting to minimax.
    pub fn from_env() -> Self {
        Self::from_reader(|key| std::env::var(key).ok())
    }

    pub fn from_reader<F>(mut read: F) -> Self
    where
        F: FnMut(&str) -> Option<String>,
    {
        read("SUDOKU_STRATEGY")
            .and_then(|raw| raw.parse().ok())
            .unwrap_or_default()
    }
}

impl FromStr for Strategy {
    type Err = UnknownStrategy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "minimax" | "deterministic" => Ok(Strategy::Minimax),
            "uct" | "mcts" | "statistical" => Ok(Strategy::Uct),
            other => Err(UnknownStrategy(other.to_string())),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An engine's current recommendation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Proposal {
    pub mv: Move,
    /// Engine-specific value: minimax score or UCB value.
    pub value: f64,
    /// Expected change of the mover's score differential.
    pub gain: f64,
}

/// Work done by one [`MoveProposer::advance`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepReport {
    /// Nodes created (minimax) or rollouts played (UCT).
    pub work: usize,
    pub depth: usize,
}

/// Incremental search over one root position.
pub trait MoveProposer {
    /// One unit of work: a minimax layer or a batch of rollouts.
    fn advance(&mut self) -> Result<StepReport, SearchError>;

    fn best_proposal(&self) -> Option<Proposal>;

    fn is_exhausted(&self) -> bool;
}

impl MoveProposer for MinimaxTree {
    fn advance(&mut self) -> Result<StepReport, SearchError> {
        let report = self.deepen()?;
        Ok(StepReport {
            work: report.created,
            depth: report.depth,
        })
    }

    fn best_proposal(&self) -> Option<Proposal> {
        let (mv, value) = self.best_move()?;
        Some(Proposal {
            mv,
            value,
            gain: value - self.root_differential(),
        })
    }

    fn is_exhausted(&self) -> bool {
        MinimaxTree::is_exhausted(self)
    }
}

impl MoveProposer for UctTree {
    fn advance(&mut self) -> Result<StepReport, SearchError> {
        let work = UctTree::advance(self);
        Ok(StepReport {
            work,
            depth: 1,
        })
    }

    /// UCB values are not in score units, so the gain comes from the scoring heuristic.
    fn best_proposal(&self) -> Option<Proposal> {
        let (mv, value) = self.best_move()?;
        let state = self.root_state();
        let diff = state.scores().differential(self.engine()) as f64;
        let gain = match score_move(state, mv, self.engine(), false, self.params()) {
            Ok(scored) => scored.score - diff,
            Err(err) => {
                event!(
                    target: "sudoku_bot::uct",
                    Level::WARN,
                    mv = %mv,
                    error = %err,
                    "could not score proposal"
                );
                0.0
            }
        };
        Some(Proposal { mv, value, gain })
    }

    fn is_exhausted(&self) -> bool {
        UctTree::is_exhausted(self)
    }
}

/// The engine behind a decision, chosen by [`Strategy`].
pub enum SearchEngine {
    Minimax(MinimaxTree),
    Uct(UctTree),
}

impl SearchEngine {
    pub fn new(state: GameState, strategy: Strategy, params: BotParams, seed: u64) -> Self {
        match strategy {
            Strategy::Minimax => SearchEngine::Minimax(MinimaxTree::new(state, params)),
            Strategy::Uct => SearchEngine::Uct(UctTree::new(state, params, seed)),
        }
    }

    pub fn strategy(&self) -> Strategy {
        match self {
            SearchEngine::Minimax(_) => Strategy::Minimax,
            SearchEngine::Uct(_) => Strategy::Uct,
        }
    }

    fn proposer(&self) -> &dyn MoveProposer {
        match self {
            SearchEngine::Minimax(tree) => tree,
            SearchEngine::Uct(tree) => tree,
        }
    }

    fn proposer_mut(&mut self) -> &mut dyn MoveProposer {
        match self {
            SearchEngine::Minimax(tree) => tree,
            SearchEngine::Uct(tree) => tree,
        }
    }
}

impl MoveProposer for SearchEngine {
    fn advance(&mut self) -> Result<StepReport, SearchError> {
        self.proposer_mut().advance()
    }

    fn best_proposal(&self) -> Option<Proposal> {
        self.proposer().best_proposal()
    }

    fn is_exhausted(&self) -> bool {
        self.proposer().is_exhausted()
    }
}

/// Receives every new best move as soon as it is known.
pub trait ProposalSink {
    fn propose_move(&mut self, mv: Move);

    /// Polled between increments; `true` ends the search loop.
    fn should_stop(&self) -> bool {
        false
    }
}

impl<F> ProposalSink for F
where
    F: FnMut(Move),
{
    fn propose_move(&mut self, mv: Move) {
        self(mv)
    }
}

/// Keeps the latest proposal; optionally asks to stop after `limit` proposals.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LatestProposal {
    pub last: Option<Move>,
    pub count: usize,
    limit: Option<usize>,
}

impl LatestProposal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            ..Self::default()
        }
    }
}

impl ProposalSink for LatestProposal {
    fn propose_move(&mut self, mv: Move) {
        self.last = Some(mv);
        self.count += 1;
    }

    fn should_stop(&self) -> bool {
        self.limit.is_some_and(|limit| self.count >= limit)
    }
}
