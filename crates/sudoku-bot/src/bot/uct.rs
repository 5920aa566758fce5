use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use sudoku_core::game::state::GameState;
use sudoku_core::model::board::Board;
use sudoku_core::model::moves::Move;
use sudoku_core::model::player::Player;
use sudoku_core::model::score::{ScoreBoard, region_points};
use sudoku_core::model::values::ValueSet;
use tracing::{Level, event};

use super::BotParams;
use super::arena::{Arena, NodeId};
use super::legality::{candidate_moves, cell_candidates};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Win,
    Draw,
    Loss,
}

impl Outcome {
    fn for_player(scores: &ScoreBoard, player: Player) -> Self {
        match scores.differential(player) {
            d if d > 0 => Outcome::Win,
            0 => Outcome::Draw,
            _ => Outcome::Loss,
        }
    }
}

/// Rollout results seen from the engine's side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutcomeTally {
    pub wins: u32,
    pub draws: u32,
    pub losses: u32,
}

impl OutcomeTally {
    pub fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Win => self.wins += 1,
            Outcome::Draw => self.draws += 1,
            Outcome::Loss => self.losses += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.wins + self.draws + self.losses
    }

    pub fn balance(&self) -> i64 {
        self.wins as i64 - self.losses as i64
    }
}

#[derive(Debug, Clone)]
struct UctNode {
    state: GameState,
    mv: Option<Move>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    untried: Vec<Move>,
    visits: u32,
    tally: OutcomeTally,
}

impl UctNode {
    fn new(state: GameState, mv: Option<Move>, parent: Option<NodeId>) -> Self {
        let untried = candidate_moves(&state);
        Self {
            state,
            mv,
            parent,
            children: Vec::new(),
            untried,
            visits: 0,
            tally: OutcomeTally::default(),
        }
    }
}

/// Monte Carlo tree search with UCB1 selection and uniform random playouts.
pub struct UctTree {
    arena: Arena<UctNode>,
    engine: Player,
    params: BotParams,
    rng: SmallRng,
    iterations: u64,
}

impl UctTree {
    pub fn new(state: GameState, params: BotParams, seed: u64) -> Self {
        let engine = state.to_move();
        Self {
            arena: Arena::with_root(UctNode::new(state, None, None)),
            engine,
            params,
            rng: SmallRng::seed_from_u64(seed),
            iterations: 0,
        }
    }

    pub fn engine(&self) -> Player {
        self.engine
    }

    pub fn params(&self) -> &BotParams {
        &self.params
    }

    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    pub fn node_count(&self) -> usize {
        self.arena.len()
    }

    pub fn root_state(&self) -> &GameState {
        &self.arena[NodeId::ROOT].state
    }

    pub fn root_tally(&self) -> OutcomeTally {
        self.arena[NodeId::ROOT].tally
    }

    /// True when the root position has no candidate move at all.
    pub fn is_exhausted(&self) -> bool {
        let root = &self.arena[NodeId::ROOT];
        root.untried.is_empty() && root.children.is_empty()
    }

    /// Runs `params.rollouts_per_step` select/expand/rollout/backpropagate cycles.
    pub fn advance(&mut self) -> usize {
        if self.is_exhausted() {
            return 0;
        }
        let rounds = self.params.rollouts_per_step;
        for _ in 0..rounds {
            self.iterate();
        }

        if tracing::enabled!(target: "sudoku_bot::uct", Level::DEBUG) {
            let tally = self.root_tally();
            let best = self
                .best_move()
                .map(|(mv, value)| format!("{mv} {value:.3}"))
                .unwrap_or_else(|| "none".to_string());
            event!(
                target: "sudoku_bot::uct",
                Level::DEBUG,
                iterations = self.iterations,
                nodes = self.arena.len(),
                wins = tally.wins,
                draws = tally.draws,
                losses = tally.losses,
                best = %best,
            );
        }
        rounds
    }

    fn iterate(&mut self) {
        let leaf = self.select();
        let node = self.expand(leaf).unwrap_or(leaf);
        let outcome = self.rollout(node);
        self.backpropagate(node, outcome);
        self.iterations += 1;
    }

    fn select(&self) -> NodeId {
        let c = self.params.selection_exploration;
        let mut current = NodeId::ROOT;
        loop {
            let node = &self.arena[current];
            if !node.untried.is_empty() || node.children.is_empty() {
                return current;
            }
            match self.best_child(current, c) {
                Some((child, _)) => current = child,
                None => return current,
            }
        }
    }

    fn ucb(&self, parent: NodeId, child: NodeId, c: f64) -> f64 {
        let parent_node = &self.arena[parent];
        let node = &self.arena[child];
        if node.visits == 0 {
            return f64::INFINITY;
        }
        let n = node.visits as f64;
        let exploit = node.tally.balance() as f64 / n;
        let exploit = if parent_node.state.to_move() == self.engine {
            exploit
        } else {
            -exploit
        };
        let total = parent_node.visits.max(1) as f64;
        exploit + c * (2.0 * total.ln() / n).sqrt()
    }

    fn best_child(&self, parent: NodeId, c: f64) -> Option<(NodeId, f64)> {
        let mut best: Option<(NodeId, f64)> = None;
        for &child in &self.arena[parent].children {
            let value = self.ucb(parent, child, c);
            if best.is_none_or(|(_, b)| value > b) {
                best = Some((child, value));
            }
        }
        best
    }

    /// Pops one untried move; other values for the same cell are dropped here.
    fn expand(&mut self, id: NodeId) -> Option<NodeId> {
        let mv = self.arena[id].untried.pop()?;
        self.arena[id].untried.retain(|other| !other.same_cell(mv));

        let state = {
            let parent = &self.arena[id].state;
            let board = parent.board();
            let points = region_points(
                board.regions_completed_by(mv.row, mv.col),
                &self.params.region_points,
            );
            let scores = parent.scores().with_points(parent.to_move(), points);
            parent.with_played(mv, scores)
        };
        let child = self.arena.allocate(UctNode::new(state, Some(mv), Some(id)));
        self.arena[id].children.push(child);
        Some(child)
    }

    fn rollout(&mut self, id: NodeId) -> Outcome {
        let state = &self.arena[id].state;
        let mut playout = Playout::new(state);
        playout.run(&mut self.rng, &self.params.region_points);
        Outcome::for_player(&playout.scores, self.engine)
    }

    fn backpropagate(&mut self, from: NodeId, outcome: Outcome) {
        let mut current = Some(from);
        while let Some(id) = current {
            let node = &mut self.arena[id];
            node.visits += 1;
            node.tally.record(outcome);
            current = node.parent;
        }
    }

    /// Root child with the best UCB value under the reporting exploration constant.
    pub fn best_move(&self) -> Option<(Move, f64)> {
        let (child, value) = self.best_child(NodeId::ROOT, self.params.reporting_exploration)?;
        self.arena[child].mv.map(|mv| (mv, value))
    }
}

/// Random game to the end from a fixed position.
struct Playout {
    board: Board,
    options: Vec<ValueSet>,
    scores: ScoreBoard,
    mover: Player,
}

impl Playout {
    fn new(state: &GameState) -> Self {
        let board = state.board().clone();
        let size = board.size();
        let mut options = vec![ValueSet::new(); size * size];
        for (row, col) in board.empty_cells() {
            options[row * size + col] = cell_candidates(state, row, col);
        }
        Self {
            board,
            options,
            scores: *state.scores(),
            mover: state.to_move(),
        }
    }

    fn run<R: Rng + ?Sized>(&mut self, rng: &mut R, points_table: &[u32; 4]) {
        let size = self.board.size();
        let mut moves = Vec::new();
        loop {
            moves.clear();
            for (idx, values) in self.options.iter().enumerate() {
                moves.extend(
                    values
                        .iter()
                        .map(|value| Move::new(idx / size, idx % size, value)),
                );
            }
            if moves.is_empty() {
                return;
            }
            let mv = moves[rng.gen_range(0..moves.len())];
            self.apply(mv, points_table);
        }
    }

    fn apply(&mut self, mv: Move, points_table: &[u32; 4]) {
        let size = self.board.size();
        let completed = self.board.regions_completed_by(mv.row, mv.col);
        self.scores
            .add_points(self.mover, region_points(completed, points_table));
        self.board.put(mv.row, mv.col, mv.value);
        self.options[mv.row * size + mv.col] = ValueSet::new();
        for region in self.board.regions_of(mv.row, mv.col) {
            for (row, col) in self.board.region_cells(region) {
                self.options[row * size + col].remove(mv.value);
            }
        }
        self.mover = self.mover.other();
    }
}
