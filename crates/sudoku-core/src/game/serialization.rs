use super::state::{ForbiddenMoves, GameState};
use crate::model::board::{Board, BoardError};
use crate::model::moves::{Move, MoveRecord};
use crate::model::score::ScoreBoard;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameSnapshot {
    pub board: String,
    pub forbidden: Vec<Move>,
    #[serde(default)]
    pub history: Vec<MoveRecord>,
    pub scores: [u32; 2],
}

impl GameSnapshot {
    /// Assumed-forbidden moves of a search line are folded into `forbidden`.
    pub fn capture(state: &GameState) -> Self {
        let mut forbidden: Vec<Move> = state.forbidden().declared().collect();
        forbidden.extend(state.forbidden().assumed().iter().copied());
        forbidden.sort();
        forbidden.dedup();
        GameSnapshot {
            board: state.board().to_string(),
            forbidden,
            history: state.history().iter().collect(),
            scores: *state.scores().standings(),
        }
    }

    pub fn restore(self) -> Result<GameState, BoardError> {
        let board: Board = self.board.parse()?;
        Ok(GameState::from_parts(
            board,
            ForbiddenMoves::from_declared(self.forbidden),
            self.history,
            ScoreBoard::from_totals(self.scores),
        ))
    }

    pub fn to_json(state: &GameState) -> serde_json::Result<String> {
        let snapshot = Self::capture(state);
        serde_json::to_string_pretty(&snapshot)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::GameSnapshot;
    use crate::game::state::GameState;
    use crate::model::board::Board;
    use crate::model::moves::Move;
    use crate::model::player::Player;

    #[test]
    fn snapshot_restores_position_and_parity() {
        let mut state = GameState::new(Board::empty(2, 2).unwrap());
        state.play(Move::new(0, 0, 1), 0);
        state.declare_forbidden(Move::new(1, 1, 1));
        state.play(Move::new(3, 3, 4), 1);

        let json = GameSnapshot::to_json(&state).unwrap();
        let restored = GameSnapshot::from_json(&json).unwrap().restore().unwrap();

        assert_eq!(restored.board(), state.board());
        assert_eq!(restored.to_move(), Player::Second);
        assert_eq!(restored.scores().score(Player::First), 1);
        assert!(restored.is_forbidden(Move::new(1, 1, 1)));
    }

    #[test]
    fn history_is_optional_in_json() {
        let json = r#"{
            "board": "2 2\n. . . .\n. . . .\n. . . .\n. . . .\n",
            "forbidden": [],
            "scores": [4, 1]
        }"#;
        let state = GameSnapshot::from_json(json).unwrap().restore().unwrap();
        assert_eq!(state.history().len(), 0);
        assert_eq!(state.board().empty_cell_count(), 16);
    }

    #[test]
    fn malformed_board_text_fails_restore() {
        let snapshot = GameSnapshot {
            board: "2 2\n9 . .".to_string(),
            forbidden: Vec::new(),
            history: Vec::new(),
            scores: [0, 0],
        };
        assert!(snapshot.restore().is_err());
    }
}
