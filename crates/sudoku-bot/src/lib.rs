pub mod bot;
pub mod policy;

pub use bot::{
    BotParams, CandidateTiers, EvalError, MinimaxTree, MoveScore, SearchError, UctTree,
    candidate_moves, find_forbidden_move, forbidden_probability, score_move,
};
pub use policy::{
    AnytimeController, ControllerConfig, DecisionSummary, LatestProposal, MoveProposer, Proposal,
    ProposalSink, SearchEngine, StepOutcome, StepReport, Strategy, compute_best_move,
};
