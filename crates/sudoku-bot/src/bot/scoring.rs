use sudoku_core::game::state::GameState;
use sudoku_core::model::moves::Move;
use sudoku_core::model::player::Player;
use sudoku_core::model::score::{ScoreBoard, region_points};

use super::risk::forbidden_probability;
use super::{BotParams, EvalError};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveScore {
    /// Higher is better for `perspective`; includes the differential before the move.
    pub score: f64,
    /// Scores after the move.
    pub scores: ScoreBoard,
    /// The move looked too risky and was scored as a pass.
    pub forbidden_guess: bool,
    /// Region-completion points the move earns.
    pub points: u32,
}

/// Even remaining counts reward the mover, odd ones penalize.
pub fn region_fill_value(remaining: usize) -> f64 {
    if remaining % 2 == 0 {
        1.0 / (remaining as f64 + 1.0)
    } else {
        -1.0 / remaining as f64
    }
}

/// Scores `mv` for `perspective`. With `is_opponent` the other player is the
/// one making the move: it collects the points and the position term flips sign.
pub fn score_move(
    state: &GameState,
    mv: Move,
    perspective: Player,
    is_opponent: bool,
    params: &BotParams,
) -> Result<MoveScore, EvalError> {
    let board = state.board();
    let diff = state.scores().differential(perspective) as f64;

    if forbidden_probability(board, mv)? > params.forbidden_cutoff {
        return Ok(MoveScore {
            score: diff,
            scores: *state.scores(),
            forbidden_guess: true,
            points: 0,
        });
    }

    let mut conquered = 0usize;
    let mut fill_total = 0.0;
    for region in board.regions_of(mv.row, mv.col) {
        // the target cell is still empty on `board`
        let remaining = board.empty_count_in_region(region) - 1;
        if remaining == 0 {
            conquered += 1;
        }
        fill_total += region_fill_value(remaining);
    }

    let points = region_points(conquered, &params.region_points);
    let raw = 2.0 * (fill_total / 3.0) + points as f64;
    let mover = if is_opponent {
        perspective.other()
    } else {
        perspective
    };
    let score = if is_opponent { -raw + diff } else { raw + diff };

    Ok(MoveScore {
        score,
        scores: state.scores().with_points(mover, points),
        forbidden_guess: false,
        points,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sudoku_core::model::board::Board;
    use sudoku_core::model::moves::MoveRecord;

    fn state(text: &str, scores: [u32; 2]) -> GameState {
        GameState::from_parts(
            text.parse::<Board>().expect("board text"),
            Default::default(),
            Vec::<MoveRecord>::new(),
            ScoreBoard::from_totals(scores),
        )
    }

    const NEARLY_SOLVED: &str = "2 2\n. 2 3 4\n3 4 1 2\n2 1 4 3\n4 3 2 1\n";

    #[test]
    fn fill_values_follow_parity_rule() {
        assert_eq!(region_fill_value(0), 1.0);
        assert_eq!(region_fill_value(1), -1.0);
        assert_eq!(region_fill_value(2), 1.0 / 3.0);
        assert_eq!(region_fill_value(3), -1.0 / 3.0);
    }

    #[test]
    fn completing_three_regions_scores_seven_points() {
        let state = state(NEARLY_SOLVED, [0, 0]);
        let scored = score_move(
            &state,
            Move::new(0, 0, 1),
            Player::First,
            false,
            &BotParams::default(),
        )
        .unwrap();
        assert!(!scored.forbidden_guess);
        assert_eq!(scored.points, 7);
        assert!((scored.score - 9.0).abs() < 1e-12);
        assert_eq!(scored.scores.score(Player::First), 7);
    }

    #[test]
    fn opponent_flag_flips_non_differential_component() {
        // Two gaps in row 0 and in block 0; column 0 has one.
        let fixture = "2 2\n. . 3 4\n3 4 1 2\n2 1 4 3\n4 3 2 1\n";
        let state = state(fixture, [5, 2]);
        let params = BotParams::default();
        let mv = Move::new(0, 0, 1);
        let own = score_move(&state, mv, Player::First, false, &params).unwrap();
        let theirs = score_move(&state, mv, Player::First, true, &params).unwrap();

        let diff = 3.0;
        assert!(((own.score - diff) + (theirs.score - diff)).abs() < 1e-12);
        assert!((own.score - diff - (2.0 * (-1.0 + 1.0 - 1.0) / 3.0 + 1.0)).abs() < 1e-12);
        assert_eq!(own.scores.standings(), &[6, 2]);
        assert_eq!(theirs.scores.standings(), &[5, 3]);
    }

    #[test]
    fn risky_move_is_a_no_op_for_ranking() {
        // (0,3) is forced to 4, so 4 at (1,3) is certainly forbidden.
        let state = state("2 2\n1 2 3 .\n. . . .\n. . . .\n. . . .\n", [1, 4]);
        let scored = score_move(
            &state,
            Move::new(1, 3, 4),
            Player::First,
            false,
            &BotParams::default(),
        )
        .unwrap();
        assert!(scored.forbidden_guess);
        assert_eq!(scored.score, -3.0);
        assert_eq!(scored.scores, *state.scores());
    }

    #[test]
    fn cutoff_is_configurable() {
        // Empty 4x4 risk is 0.75: below the default cutoff, above a strict one.
        let state = GameState::new(Board::empty(2, 2).unwrap());
        let strict = BotParams {
            forbidden_cutoff: 0.5,
            ..BotParams::default()
        };
        let mv = Move::new(0, 0, 1);
        assert!(!score_move(&state, mv, Player::First, false, &BotParams::default())
            .unwrap()
            .forbidden_guess);
        assert!(score_move(&state, mv, Player::First, false, &strict)
            .unwrap()
            .forbidden_guess);
    }
}
