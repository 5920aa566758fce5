use std::collections::BTreeSet;
use std::sync::Arc;

use crate::model::board::Board;
use crate::model::moves::{Move, MoveRecord};
use crate::model::player::Player;
use crate::model::score::ScoreBoard;

/// Moves that must not be proposed again.
///
/// `declared` holds referee rulings and is shared by every state derived from
/// the same host position. `assumed` holds moves a search line treated as
/// forbidden; each derived state carries its own copy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForbiddenMoves {
    declared: Arc<BTreeSet<Move>>,
    assumed: Vec<Move>,
}

impl ForbiddenMoves {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_declared(moves: impl IntoIterator<Item = Move>) -> Self {
        Self {
            declared: Arc::new(moves.into_iter().collect()),
            assumed: Vec::new(),
        }
    }

    pub fn contains(&self, mv: Move) -> bool {
        self.declared.contains(&mv) || self.assumed.contains(&mv)
    }

    pub fn declared(&self) -> impl Iterator<Item = Move> + '_ {
        self.declared.iter().copied()
    }

    pub fn assumed(&self) -> &[Move] {
        &self.assumed
    }

    pub fn len(&self) -> usize {
        self.declared.len() + self.assumed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy-on-write when search states still share the set.
    pub fn declare(&mut self, mv: Move) -> bool {
        Arc::make_mut(&mut self.declared).insert(mv)
    }

    pub fn assume(&mut self, mv: Move) {
        self.assumed.push(mv);
    }

    pub fn shares_declared_with(&self, other: &ForbiddenMoves) -> bool {
        Arc::ptr_eq(&self.declared, &other.declared)
    }
}

/// Host-recorded turns followed by the turns appended along one search line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MoveHistory {
    recorded: Arc<Vec<MoveRecord>>,
    line: Vec<MoveRecord>,
}

impl MoveHistory {
    pub fn from_records(records: Vec<MoveRecord>) -> Self {
        Self {
            recorded: Arc::new(records),
            line: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.recorded.len() + self.line.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = MoveRecord> + '_ {
        self.recorded.iter().chain(self.line.iter()).copied()
    }

    pub fn last(&self) -> Option<MoveRecord> {
        self.line.last().or_else(|| self.recorded.last()).copied()
    }

    fn extend_line(&mut self, record: MoveRecord) {
        self.line.push(record);
    }

    fn record(&mut self, record: MoveRecord) {
        let recorded = Arc::make_mut(&mut self.recorded);
        recorded.extend(self.line.drain(..));
        recorded.push(record);
    }
}

/// Board, forbidden moves, history and scores of one position.
#[derive(Debug, Clone, PartialEq)]
pub struct GameState {
    board: Board,
    forbidden: ForbiddenMoves,
    history: MoveHistory,
    scores: ScoreBoard,
}

impl GameState {
    pub fn new(board: Board) -> Self {
        Self {
            board,
            forbidden: ForbiddenMoves::new(),
            history: MoveHistory::default(),
            scores: ScoreBoard::new(),
        }
    }

    pub fn from_parts(
        board: Board,
        forbidden: ForbiddenMoves,
        history: Vec<MoveRecord>,
        scores: ScoreBoard,
    ) -> Self {
        Self {
            board,
            forbidden,
            history: MoveHistory::from_records(history),
            scores,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn forbidden(&self) -> &ForbiddenMoves {
        &self.forbidden
    }

    pub fn history(&self) -> &MoveHistory {
        &self.history
    }

    pub fn scores(&self) -> &ScoreBoard {
        &self.scores
    }

    pub fn to_move(&self) -> Player {
        Player::to_move(self.history.len())
    }

    pub fn is_forbidden(&self, mv: Move) -> bool {
        self.forbidden.contains(mv)
    }

    /// Child position after `mv` was played and scored as `scores`.
    pub fn with_played(&self, mv: Move, scores: ScoreBoard) -> GameState {
        let mut next = self.clone();
        next.board.put(mv.row, mv.col, mv.value);
        next.history.extend_line(MoveRecord::Played(mv));
        next.scores = scores;
        next
    }

    /// Child position in which `mv` was rejected: the turn passes, the board stays.
    pub fn with_assumed_forbidden(&self, mv: Move) -> GameState {
        let mut next = self.clone();
        next.forbidden.assume(mv);
        next.history.extend_line(MoveRecord::Forbidden(mv));
        next
    }

    /// Host-side: apply an accepted move for the player to move.
    pub fn play(&mut self, mv: Move, points: u32) {
        let mover = self.to_move();
        self.board.put(mv.row, mv.col, mv.value);
        self.scores.add_points(mover, points);
        self.history.record(MoveRecord::Played(mv));
    }

    /// Host-side: record a referee rejection; the mover loses the turn.
    pub fn declare_forbidden(&mut self, mv: Move) {
        self.forbidden.declare(mv);
        self.history.record(MoveRecord::Forbidden(mv));
    }
}
