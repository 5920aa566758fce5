//! Layer-by-layer minimax with alpha-beta cuts and per-pass transposition dedup.
//!
//! The tree lives in an [`Arena`]; nodes are never removed during a decision.
//! Each [`MinimaxTree::deepen`] call prunes the current tree, adds one ply
//! under every expandable leaf, and propagates scores back to the root.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use sudoku_core::game::state::GameState;
use sudoku_core::model::board::Board;
use sudoku_core::model::moves::Move;
use sudoku_core::model::player::Player;
use tracing::{Level, event};

use super::arena::{Arena, NodeId};
use super::legality::{CandidateTiers, candidate_moves};
use super::scoring::score_move;
use super::{BotParams, SearchError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeStatus {
    Active,
    /// Cut by alpha-beta; ignored from then on.
    Pruned,
    /// Same position already reached with an equal or better score this pass.
    Duplicate,
    /// No candidate moves.
    Terminal,
}

impl NodeStatus {
    /// Active nodes and finished lines compete for their parent's score.
    /// Duplicates are never searched, so their leaf score is stale.
    pub const fn is_scorable(self) -> bool {
        matches!(self, NodeStatus::Active | NodeStatus::Terminal)
    }

    pub const fn is_expandable(self) -> bool {
        matches!(self, NodeStatus::Active)
    }
}

#[derive(Debug, Clone)]
struct MinimaxNode {
    state: GameState,
    mv: Option<Move>,
    score: f64,
    maximize: bool,
    status: NodeStatus,
    children: Vec<NodeId>,
    depth: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeepenReport {
    pub depth: usize,
    pub created: usize,
    pub pruned: usize,
    pub duplicates: usize,
    pub terminal: usize,
    pub skipped: usize,
}

struct TranspositionTable {
    best: HashMap<(Vec<u8>, bool), f64>,
    tolerance: f64,
}

impl TranspositionTable {
    fn new(tolerance: f64) -> Self {
        Self {
            best: HashMap::new(),
            tolerance,
        }
    }

    /// Records `score` for the position; false when it was already reached
    /// with a score at least `tolerance` better.
    fn admit(&mut self, board: &Board, maximize: bool, score: f64) -> bool {
        match self.best.entry((board.occupancy().to_vec(), maximize)) {
            Entry::Occupied(mut slot) => {
                if *slot.get() >= score + self.tolerance {
                    return false;
                }
                if score > *slot.get() {
                    slot.insert(score);
                }
                true
            }
            Entry::Vacant(slot) => {
                slot.insert(score);
                true
            }
        }
    }
}

pub struct MinimaxTree {
    arena: Arena<MinimaxNode>,
    perspective: Player,
    params: BotParams,
    depth: usize,
    exhausted: bool,
}

impl MinimaxTree {
    /// Root maximizes for the player to move in `state`.
    pub fn new(state: GameState, params: BotParams) -> Self {
        let perspective = state.to_move();
        let score = state.scores().differential(perspective) as f64;
        let root = MinimaxNode {
            state,
            mv: None,
            score,
            maximize: true,
            status: NodeStatus::Active,
            children: Vec::new(),
            depth: 0,
        };
        Self {
            arena: Arena::with_root(root),
            perspective,
            params,
            depth: 0,
            exhausted: false,
        }
    }

    pub fn perspective(&self) -> Player {
        self.perspective
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn node_count(&self) -> usize {
        self.arena.len()
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Score differential of the root position.
    pub fn root_differential(&self) -> f64 {
        self.arena[NodeId::ROOT]
            .state
            .scores()
            .differential(self.perspective) as f64
    }

    pub fn count_status(&self, status: NodeStatus) -> usize {
        self.arena.iter().filter(|node| node.status == status).count()
    }

    /// Prune, add one ply, propagate. Never discards earlier work.
    pub fn deepen(&mut self) -> Result<DeepenReport, SearchError> {
        let mut report = DeepenReport::default();
        if self.exhausted {
            report.depth = self.depth;
            return Ok(report);
        }

        report.pruned = self.prune();
        let frontier = self.expand_frontier();
        report.created = frontier.created;
        report.duplicates = frontier.duplicates;
        report.terminal = frontier.terminal;
        report.skipped = frontier.skipped;

        if report.created == 0 {
            self.exhausted = true;
        } else {
            self.depth += 1;
        }
        report.depth = self.depth;

        self.update_score()?;

        if tracing::enabled!(target: "sudoku_bot::minimax", Level::DEBUG) {
            let best = self
                .best_move()
                .map(|(mv, score)| format!("{mv} {score:.3}"))
                .unwrap_or_else(|| "none".to_string());
            event!(
                target: "sudoku_bot::minimax",
                Level::DEBUG,
                depth = report.depth,
                created = report.created,
                pruned = report.pruned,
                duplicates = report.duplicates,
                terminal = report.terminal,
                skipped = report.skipped,
                nodes = self.arena.len(),
                best = %best,
            );
        }

        Ok(report)
    }

    /// Adds one child per candidate under every active childless node.
    /// Positions reached twice in this pass keep only the better score active.
    pub fn expand_frontier(&mut self) -> DeepenReport {
        let mut report = DeepenReport {
            depth: self.depth,
            ..DeepenReport::default()
        };
        let mut table = TranspositionTable::new(self.params.transposition_tolerance);
        let mut stack = vec![NodeId::ROOT];
        while let Some(id) = stack.pop() {
            let node = &self.arena[id];
            if !node.status.is_expandable() {
                continue;
            }
            if id != NodeId::ROOT && !table.admit(node.state.board(), node.maximize, node.score) {
                self.arena[id].status = NodeStatus::Duplicate;
                report.duplicates += 1;
                continue;
            }

            if self.arena[id].children.is_empty() {
                self.expand(id, &mut table, &mut report);
            } else {
                stack.extend(self.arena[id].children.iter().rev().copied());
            }
        }
        report
    }

    fn candidates(&self, state: &GameState) -> Vec<Move> {
        if self.params.tiered_candidates {
            CandidateTiers::classify(state).selection()
        } else {
            candidate_moves(state)
        }
    }

    fn expand(&mut self, id: NodeId, table: &mut TranspositionTable, report: &mut DeepenReport) {
        let candidates = self.candidates(&self.arena[id].state);
        let maximize = self.arena[id].maximize;
        let depth = self.arena[id].depth + 1;

        for mv in candidates {
            let (state, score) = {
                let parent = &self.arena[id].state;
                let scored = match score_move(parent, mv, self.perspective, !maximize, &self.params)
                {
                    Ok(scored) => scored,
                    Err(err) => {
                        event!(
                            target: "sudoku_bot::minimax",
                            Level::WARN,
                            mv = %mv,
                            error = %err,
                            "skipping candidate"
                        );
                        report.skipped += 1;
                        continue;
                    }
                };
                let state = if scored.forbidden_guess {
                    parent.with_assumed_forbidden(mv)
                } else {
                    parent.with_played(mv, scored.scores)
                };
                (state, scored.score)
            };

            let status = if table.admit(state.board(), !maximize, score) {
                NodeStatus::Active
            } else {
                report.duplicates += 1;
                NodeStatus::Duplicate
            };
            let child = self.arena.allocate(MinimaxNode {
                state,
                mv: Some(mv),
                score,
                maximize: !maximize,
                status,
                children: Vec::new(),
                depth,
            });
            self.arena[id].children.push(child);
            report.created += 1;
        }

        if self.arena[id].children.is_empty() {
            self.arena[id].status = NodeStatus::Terminal;
            report.terminal += 1;
        }
    }

    /// Alpha-beta pass over the current tree; returns how many nodes were cut.
    pub fn prune(&mut self) -> usize {
        let mut cut = 0;
        self.alpha_beta(NodeId::ROOT, f64::NEG_INFINITY, f64::INFINITY, &mut cut);
        cut
    }

    fn alpha_beta(&mut self, id: NodeId, mut alpha: f64, mut beta: f64, cut: &mut usize) -> f64 {
        let maximize = self.arena[id].maximize;
        let count = self.arena[id].children.len();
        let mut value: Option<f64> = None;

        for k in 0..count {
            let child = self.arena[id].children[k];
            if !self.arena[child].status.is_scorable() {
                continue;
            }
            let child_value = self.alpha_beta(child, alpha, beta, cut);
            let current = match value {
                None => child_value,
                Some(v) if maximize => v.max(child_value),
                Some(v) => v.min(child_value),
            };
            value = Some(current);
            if maximize {
                alpha = alpha.max(current);
            } else {
                beta = beta.min(current);
            }

            if alpha >= beta + self.params.prune_margin {
                for rest in (k + 1)..count {
                    let sibling = self.arena[id].children[rest];
                    if self.arena[sibling].status.is_scorable() {
                        self.arena[sibling].status = NodeStatus::Pruned;
                        *cut += 1;
                    }
                }
                break;
            }
        }

        value.unwrap_or(self.arena[id].score)
    }

    /// Recomputes every score bottom-up and returns the root value.
    pub fn update_score(&mut self) -> Result<f64, SearchError> {
        self.propagate(NodeId::ROOT)
    }

    fn propagate(&mut self, id: NodeId) -> Result<f64, SearchError> {
        let maximize = self.arena[id].maximize;
        let count = self.arena[id].children.len();
        let mut best: Option<f64> = None;

        for k in 0..count {
            let child = self.arena[id].children[k];
            if !self.arena[child].status.is_scorable() {
                continue;
            }
            let value = self.propagate(child)?;
            best = Some(match best {
                None => value,
                Some(b) if maximize => b.max(value),
                Some(b) => b.min(value),
            });
        }

        if let Some(score) = best {
            if !score.is_finite() {
                return Err(SearchError::NonFiniteScore {
                    depth: self.arena[id].depth,
                    score,
                });
            }
            self.arena[id].score = score;
        }
        Ok(self.arena[id].score)
    }

    /// Children eligible for move selection under `id`. Duplicates stand in
    /// only when no scorable child is left.
    fn selectable(&self, id: NodeId) -> Vec<NodeId> {
        let children = &self.arena[id].children;
        let scorable: Vec<NodeId> = children
            .iter()
            .copied()
            .filter(|&c| self.arena[c].status.is_scorable())
            .collect();
        if !scorable.is_empty() {
            return scorable;
        }
        children
            .iter()
            .copied()
            .filter(|&c| self.arena[c].status == NodeStatus::Duplicate)
            .collect()
    }

    /// Highest-scoring root child; the first one wins ties.
    pub fn best_move(&self) -> Option<(Move, f64)> {
        let mut best: Option<(Move, f64)> = None;
        for child in self.selectable(NodeId::ROOT) {
            let node = &self.arena[child];
            let Some(mv) = node.mv else { continue };
            if best.is_none_or(|(_, score)| node.score > score) {
                best = Some((mv, node.score));
            }
        }
        best
    }

    /// Expected line of play from the root under the current scores.
    pub fn principal_variation(&self) -> Vec<Move> {
        let mut line = Vec::new();
        let mut current = NodeId::ROOT;
        loop {
            let node = &self.arena[current];
            let next = self
                .selectable(current)
                .into_iter()
                .fold(None::<NodeId>, |best, c| match best {
                    None => Some(c),
                    Some(b) => {
                        let (bs, cs) = (self.arena[b].score, self.arena[c].score);
                        let better = if node.maximize { cs > bs } else { cs < bs };
                        Some(if better { c } else { b })
                    }
                });
            let Some(next) = next else { break };
            if let Some(mv) = self.arena[next].mv {
                line.push(mv);
            }
            current = next;
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root_state() -> GameState {
        GameState::new(Board::empty(2, 2).unwrap())
    }

    fn attach(tree: &mut MinimaxTree, parent: NodeId, mv: Move, score: f64) -> NodeId {
        let maximize = !tree.arena[parent].maximize;
        let depth = tree.arena[parent].depth + 1;
        let state = tree.arena[parent].state.clone();
        let child = tree.arena.allocate(MinimaxNode {
            state,
            mv: Some(mv),
            score,
            maximize,
            status: NodeStatus::Active,
            children: Vec::new(),
            depth,
        });
        tree.arena[parent].children.push(child);
        child
    }

    /// Plain minimax over every node regardless of status.
    fn exhaustive(tree: &MinimaxTree, id: NodeId) -> f64 {
        let node = &tree.arena[id];
        let values = node.children.iter().map(|&c| exhaustive(tree, c));
        if node.children.is_empty() {
            node.score
        } else if node.maximize {
            values.fold(f64::NEG_INFINITY, f64::max)
        } else {
            values.fold(f64::INFINITY, f64::min)
        }
    }

    fn textbook_tree(margin: f64) -> (MinimaxTree, [Move; 3]) {
        let params = BotParams {
            prune_margin: margin,
            ..BotParams::default()
        };
        let mut tree = MinimaxTree::new(root_state(), params);
        let moves = [Move::new(0, 0, 1), Move::new(0, 1, 1), Move::new(0, 2, 1)];
        let leaves: [[f64; 3]; 3] = [[3.0, 12.0, 8.0], [2.0, 4.0, 6.0], [14.0, 5.0, 2.0]];
        for (mv, values) in moves.iter().zip(leaves) {
            let node = attach(&mut tree, NodeId::ROOT, *mv, 0.0);
            for (i, value) in values.into_iter().enumerate() {
                attach(&mut tree, node, Move::new(1, i, 2), value);
            }
        }
        (tree, moves)
    }

    #[test]
    fn pruning_preserves_exhaustive_minimax_result() {
        for margin in [0.0, 0.5, 1.0] {
            let (mut tree, moves) = textbook_tree(margin);
            let expected = exhaustive(&tree, NodeId::ROOT);

            let cut = tree.prune();
            tree.update_score().unwrap();

            assert_eq!(expected, 3.0);
            assert_eq!(cut, 2, "margin {margin}");
            assert_eq!(tree.best_move(), Some((moves[0], expected)));
        }
    }

    #[test]
    fn large_margin_keeps_near_ties() {
        let (mut tree, moves) = textbook_tree(5.0);
        assert_eq!(tree.prune(), 0);
        tree.update_score().unwrap();
        assert_eq!(tree.best_move(), Some((moves[0], 3.0)));
    }

    #[test]
    fn pruned_children_stay_in_the_arena() {
        let (mut tree, _) = textbook_tree(0.0);
        let before = tree.node_count();
        tree.prune();
        assert_eq!(tree.node_count(), before);
        assert_eq!(tree.count_status(NodeStatus::Pruned), 2);
    }

    #[test]
    fn transposition_keeps_first_of_equal_scores() {
        let mut table = TranspositionTable::new(0.0);
        let board = Board::empty(2, 2).unwrap();
        assert!(table.admit(&board, true, 1.0));
        assert!(!table.admit(&board, true, 1.0));
        assert!(table.admit(&board, false, 1.0));
        assert!(table.admit(&board, true, 2.0));
        assert!(!table.admit(&board, true, 1.5));
    }

    #[test]
    fn root_without_moves_reports_no_move() {
        let solved: Board = "2 2\n1 2 3 4\n3 4 1 2\n2 1 4 3\n4 3 2 1\n".parse().unwrap();
        let mut tree = MinimaxTree::new(GameState::new(solved), BotParams::default());
        let report = tree.deepen().unwrap();
        assert_eq!(report.created, 0);
        assert!(tree.is_exhausted());
        assert_eq!(tree.best_move(), None);
    }

    #[test]
    fn duplicate_children_do_not_compete_with_searched_ones() {
        let mut tree = MinimaxTree::new(root_state(), BotParams::default());
        let searched = attach(&mut tree, NodeId::ROOT, Move::new(0, 0, 1), 1.0);
        let stale = attach(&mut tree, NodeId::ROOT, Move::new(0, 0, 2), 5.0);
        tree.arena[stale].status = NodeStatus::Duplicate;
        attach(&mut tree, searched, Move::new(1, 1, 1), -2.0);

        assert_eq!(tree.update_score().unwrap(), -2.0);
        assert_eq!(tree.best_move(), Some((Move::new(0, 0, 1), -2.0)));
        assert_eq!(tree.principal_variation().first(), Some(&Move::new(0, 0, 1)));
    }

    #[test]
    fn duplicates_stand_in_when_nothing_else_is_left() {
        let mut tree = MinimaxTree::new(root_state(), BotParams::default());
        let only = attach(&mut tree, NodeId::ROOT, Move::new(2, 2, 3), 4.0);
        tree.arena[only].status = NodeStatus::Duplicate;
        assert_eq!(tree.update_score().unwrap(), 0.0);
        assert_eq!(tree.best_move(), Some((Move::new(2, 2, 3), 4.0)));
    }

    #[test]
    fn best_move_is_always_a_searched_child() {
        use rand::SeedableRng;
        use rand::rngs::SmallRng;
        use sudoku_core::game::setup::random_puzzle;

        for seed in 0..6u64 {
            let board = random_puzzle(3, 3, 55, &mut SmallRng::seed_from_u64(seed)).unwrap();
            let mut tree = MinimaxTree::new(GameState::new(board), BotParams::default());
            tree.deepen().unwrap();
            tree.deepen().unwrap();

            let (mv, _) = tree.best_move().expect("moves remain");
            let chosen = tree.arena[NodeId::ROOT]
                .children
                .iter()
                .map(|&c| &tree.arena[c])
                .find(|node| node.mv == Some(mv))
                .unwrap();
            assert!(
                chosen.status.is_scorable(),
                "seed {seed}: {mv} has status {:?}",
                chosen.status
            );
        }
    }

    #[test]
    fn first_layer_covers_every_candidate() {
        let mut tree = MinimaxTree::new(root_state(), BotParams::default());
        let report = tree.deepen().unwrap();
        assert_eq!(report.created, 64);
        assert_eq!(report.depth, 1);
        assert!(tree.best_move().is_some());
    }
}
