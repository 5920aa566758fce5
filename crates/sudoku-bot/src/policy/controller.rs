use rand::SeedableRng;
use rand::rngs::SmallRng;
use sudoku_core::game::state::GameState;
use sudoku_core::model::moves::Move;
use tracing::{Level, event};

use super::{MoveProposer, ProposalSink, SearchEngine, Strategy};
use crate::bot::{BotParams, forbidden_opportunity, random_candidate};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControllerConfig {
    pub strategy: Strategy,
    pub params: BotParams,
    /// Seeds the fallback pick and UCT rollouts.
    pub seed: u64,
    /// Upper bound on increments in [`compute_best_move`]; `None` runs until
    /// the sink stops or the search is exhausted.
    pub max_steps: Option<usize>,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::default(),
            params: BotParams::default(),
            seed: 0,
            max_steps: None,
        }
    }
}

impl ControllerConfig {
    pub fn from_env() -> Self {
        Self::from_reader(|key| std::env::var(key).ok())
    }

    pub fn from_reader<F>(mut read: F) -> Self
    where
        F: FnMut(&str) -> Option<String>,
    {
        let strategy = Strategy::from_reader(&mut read);
        let params = BotParams::from_reader(&mut read);
        let seed = read("SUDOKU_SEED")
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .unwrap_or(0);
        let max_steps = read("SUDOKU_MAX_STEPS").and_then(|raw| raw.trim().parse::<usize>().ok());
        Self {
            strategy,
            params,
            seed,
            max_steps,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// A new best move went to the sink.
    Published(Move),
    /// Work was done but the current proposal stands.
    Held,
    /// Nothing left to search.
    Exhausted,
    /// The increment aborted; earlier proposals remain valid.
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecisionSummary {
    pub steps: usize,
    pub proposals: usize,
    pub last: Option<Move>,
    pub endgame: bool,
    pub exhausted: bool,
}

/// Publishes a move immediately and improves on it one increment at a time.
pub struct AnytimeController {
    engine: SearchEngine,
    state: GameState,
    params: BotParams,
    rng: SmallRng,
    min_gain: f64,
    last: Option<Move>,
    proposals: usize,
    steps: usize,
    endgame: bool,
}

impl AnytimeController {
    pub fn new(state: GameState, config: &ControllerConfig) -> Self {
        let engine = SearchEngine::new(state.clone(), config.strategy, config.params, config.seed);
        Self {
            engine,
            state,
            params: config.params,
            rng: SmallRng::seed_from_u64(config.seed),
            min_gain: f64::NEG_INFINITY,
            last: None,
            proposals: 0,
            steps: 0,
            endgame: false,
        }
    }

    pub fn engine(&self) -> &SearchEngine {
        &self.engine
    }

    pub fn last_proposal(&self) -> Option<Move> {
        self.last
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn proposals(&self) -> usize {
        self.proposals
    }

    /// Gain a search proposal must exceed to replace the current one.
    pub fn min_gain(&self) -> f64 {
        self.min_gain
    }

    fn publish<S: ProposalSink + ?Sized>(&mut self, sink: &mut S, mv: Move) {
        sink.propose_move(mv);
        self.last = Some(mv);
        self.proposals += 1;
    }

    /// Random legal fallback, then the endgame forbidden move when the
    /// parity window is open. Returns the move left standing.
    pub fn begin<S: ProposalSink + ?Sized>(&mut self, sink: &mut S) -> Option<Move> {
        if let Some(mv) = random_candidate(&self.state, &mut self.rng) {
            self.publish(sink, mv);
        }

        if let Some(mv) = forbidden_opportunity(&self.state) {
            self.publish(sink, mv);
            self.min_gain = self.params.endgame_min_gain;
            self.endgame = true;
            event!(
                target: "sudoku_bot::controller",
                Level::INFO,
                mv = %mv,
                empty = self.state.board().empty_cell_count(),
                min_gain = self.min_gain,
                "endgame forbidden move proposed"
            );
        }

        self.last
    }

    /// One increment of search; publishes the engine's best move when its
    /// gain clears the active threshold.
    pub fn step<S: ProposalSink + ?Sized>(&mut self, sink: &mut S) -> StepOutcome {
        if self.engine.is_exhausted() {
            return StepOutcome::Exhausted;
        }

        let report = match self.engine.advance() {
            Ok(report) => report,
            Err(err) => {
                event!(
                    target: "sudoku_bot::controller",
                    Level::WARN,
                    step = self.steps,
                    error = %err,
                    "search increment failed; keeping previous proposal"
                );
                return StepOutcome::Failed;
            }
        };
        self.steps += 1;

        let outcome = match self.engine.best_proposal() {
            Some(proposal) if proposal.gain > self.min_gain && self.last != Some(proposal.mv) => {
                self.publish(sink, proposal.mv);
                StepOutcome::Published(proposal.mv)
            }
            Some(_) => StepOutcome::Held,
            None if self.engine.is_exhausted() => StepOutcome::Exhausted,
            None => StepOutcome::Held,
        };

        if tracing::enabled!(target: "sudoku_bot::controller", Level::DEBUG) {
            let best = self
                .engine
                .best_proposal()
                .map(|p| format!("{} value={:.3} gain={:.3}", p.mv, p.value, p.gain))
                .unwrap_or_else(|| "none".to_string());
            event!(
                target: "sudoku_bot::controller",
                Level::DEBUG,
                step = self.steps,
                strategy = %self.engine.strategy(),
                work = report.work,
                depth = report.depth,
                outcome = ?outcome,
                best = %best,
            );
        }

        outcome
    }

    pub fn summary(&self) -> DecisionSummary {
        DecisionSummary {
            steps: self.steps,
            proposals: self.proposals,
            last: self.last,
            endgame: self.endgame,
            exhausted: self.engine.is_exhausted(),
        }
    }
}

/// Runs a full decision: fallback and endgame check, then increments until
/// the sink asks to stop, the step budget is spent, or the search runs dry.
pub fn compute_best_move<S: ProposalSink + ?Sized>(
    state: &GameState,
    config: &ControllerConfig,
    sink: &mut S,
) -> DecisionSummary {
    let mut controller = AnytimeController::new(state.clone(), config);
    controller.begin(sink);

    while !sink.should_stop() {
        if config
            .max_steps
            .is_some_and(|limit| controller.steps() >= limit)
        {
            break;
        }
        match controller.step(sink) {
            StepOutcome::Exhausted | StepOutcome::Failed => break,
            StepOutcome::Published(_) | StepOutcome::Held => {}
        }
    }

    let summary = controller.summary();
    event!(
        target: "sudoku_bot::controller",
        Level::DEBUG,
        steps = summary.steps,
        proposals = summary.proposals,
        endgame = summary.endgame,
        exhausted = summary.exhausted,
        last = ?summary.last,
        "decision finished"
    );
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bot::is_candidate;
    use crate::policy::LatestProposal;
    use sudoku_core::model::board::Board;

    const LATE_4X4: &str = "2 2\n1 2 3 .\n3 . 1 .\n. 1 . 3\n4 3 2 .\n";

    fn state_from(text: &str) -> GameState {
        GameState::new(text.parse::<Board>().expect("board text"))
    }

    #[test]
    fn begin_publishes_a_legal_fallback() {
        let state = GameState::new(Board::empty(3, 3).unwrap());
        let mut controller = AnytimeController::new(state.clone(), &ControllerConfig::default());
        let mut sink = LatestProposal::new();
        let mv = controller.begin(&mut sink).expect("fallback");
        assert_eq!(sink.count, 1);
        assert_eq!(sink.last, Some(mv));
        assert!(is_candidate(&state, mv));
        assert_eq!(controller.min_gain(), f64::NEG_INFINITY);
    }

    #[test]
    fn endgame_window_publishes_the_forbidden_move_second() {
        let state = state_from(LATE_4X4);
        let mut controller = AnytimeController::new(state, &ControllerConfig::default());
        let mut sink = LatestProposal::new();
        let standing = controller.begin(&mut sink);
        assert_eq!(standing, Some(Move::new(1, 3, 4)));
        assert_eq!(sink.count, 2);
        assert_eq!(controller.min_gain(), 3.0);
        assert!(controller.summary().endgame);
    }

    #[test]
    fn finished_board_exhausts_without_proposals() {
        let state = state_from("2 2\n1 2 3 4\n3 4 1 2\n2 1 4 3\n4 3 2 1\n");
        let mut sink = LatestProposal::new();
        let summary = compute_best_move(&state, &ControllerConfig::default(), &mut sink);
        assert_eq!(summary.proposals, 0);
        assert_eq!(summary.last, None);
        assert!(summary.exhausted);
        assert_eq!(sink.count, 0);
    }

    #[test]
    fn step_budget_bounds_the_loop() {
        let state = GameState::new(Board::empty(2, 2).unwrap());
        let config = ControllerConfig {
            max_steps: Some(2),
            ..ControllerConfig::default()
        };
        let mut sink = LatestProposal::new();
        let summary = compute_best_move(&state, &config, &mut sink);
        assert_eq!(summary.steps, 2);
        let last = sink.last.expect("a move is always available");
        assert!(is_candidate(&state, last));
    }

    #[test]
    fn config_reader_picks_up_seed_and_strategy() {
        let config = ControllerConfig::from_reader(|key| match key {
            "SUDOKU_STRATEGY" => Some("uct".to_string()),
            "SUDOKU_SEED" => Some("42".to_string()),
            "SUDOKU_MAX_STEPS" => Some("3".to_string()),
            _ => None,
        });
        assert_eq!(config.strategy, Strategy::Uct);
        assert_eq!(config.seed, 42);
        assert_eq!(config.max_steps, Some(3));
        assert_eq!(config.params, BotParams::default());
    }
}
