mod agent;

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use rand::{RngCore, SeedableRng, rngs::StdRng};
use serde::Serialize;
use sudoku_bot::candidate_moves;
use sudoku_core::game::setup::random_puzzle;
use sudoku_core::game::state::GameState;
use sudoku_core::model::board::{Board, BoardError};
use sudoku_core::model::player::Player;
use thiserror::Error;
use tracing::{Level, event};

use crate::analytics::{AnalyticsCollector, AnalyticsError};
use crate::config::{MatchConfig, ResolvedOutputs, SetupConfig};
use crate::referee::{self, IllegalMove, Ruling};
use agent::AgentBlueprint;

/// Plays the configured games and writes per-game rows plus a summary.
pub struct MatchRunner {
    config: MatchConfig,
    outputs: ResolvedOutputs,
    agents: [AgentBlueprint; 2],
    start: StartPosition,
    logging_enabled: bool,
}

/// Summary details returned after a run.
#[derive(Debug)]
pub struct RunSummary {
    pub games_played: usize,
    pub rows_written: usize,
    pub jsonl_path: PathBuf,
    pub summary_path: PathBuf,
    pub telemetry_path: Option<PathBuf>,
}

enum StartPosition {
    Fixed(Board),
    Random(SetupConfig),
}

impl StartPosition {
    fn board_for(&self, game_seed: u64) -> Result<Board, ArenaError> {
        match self {
            StartPosition::Fixed(board) => Ok(board.clone()),
            StartPosition::Random(setup) => {
                let mut rng = StdRng::seed_from_u64(game_seed);
                Ok(random_puzzle(
                    setup.block_rows,
                    setup.block_cols,
                    setup.clues,
                    &mut rng,
                )?)
            }
        }
    }
}

impl MatchRunner {
    /// Build a runner from a validated configuration; loads the board file if any.
    pub fn new(config: MatchConfig, outputs: ResolvedOutputs) -> Result<Self, ArenaError> {
        let [first, second] = config.agents.as_slice() else {
            return Err(ArenaError::AgentCount {
                found: config.agents.len(),
            });
        };
        let agents = [
            AgentBlueprint::from_config(first)?,
            AgentBlueprint::from_config(second)?,
        ];

        let start = match (&config.games.board, config.games.setup) {
            (Some(path), _) => StartPosition::Fixed(load_board(path)?),
            (None, Some(setup)) => StartPosition::Random(setup),
            (None, None) => return Err(ArenaError::NoStartPosition),
        };

        Ok(Self {
            logging_enabled: config.logging.enable_structured,
            config,
            outputs,
            agents,
            start,
        })
    }

    /// Execute the match, streaming JSONL rows to disk.
    pub fn run(&self) -> Result<RunSummary, ArenaError> {
        ensure_parent(self.outputs.jsonl.parent())?;
        ensure_parent(self.outputs.summary_md.parent())?;

        let mut writer = BufWriter::new(File::create(&self.outputs.jsonl)?);
        let mut rng = StdRng::seed_from_u64(self.config.games.seed.unwrap_or(0));
        let mut analytics = AnalyticsCollector::new(&self.config);
        let mut rows_written = 0usize;

        for game_index in 0..self.config.games.count {
            let game_seed = rng.next_u64();
            let first = if self.config.games.swap_sides && game_index % 2 == 1 {
                1
            } else {
                0
            };
            let outcome = self.play_game(game_index, game_seed, first)?;
            analytics.record_game(&outcome)?;
            write_game_row(&mut writer, &self.config.run_id, &outcome)?;
            rows_written += 1;
        }

        writer.flush()?;

        let summary = analytics.finalize();
        summary.write_markdown(&self.outputs.summary_md)?;

        let telemetry_path = self
            .logging_enabled
            .then(|| crate::logging::telemetry_path_for(&self.outputs));

        Ok(RunSummary {
            games_played: self.config.games.count,
            rows_written,
            jsonl_path: self.outputs.jsonl.clone(),
            summary_path: self.outputs.summary_md.clone(),
            telemetry_path,
        })
    }

    /// One game; `first` indexes the agent moving first.
    fn play_game(
        &self,
        game_index: usize,
        game_seed: u64,
        first: usize,
    ) -> Result<GameOutcome, ArenaError> {
        let board = self.start.board_for(game_seed)?;
        let empty_at_start = board.empty_cell_count();
        let geometry = format!("{}x{}", board.block_rows(), board.block_cols());
        let mut state = GameState::new(board);
        let seating = [first, 1 - first];
        let mut seats = seating.map(|agent_index| SeatTally::new(&self.agents[agent_index]));
        let mut turn_rng = StdRng::seed_from_u64(game_seed);
        let mut forfeit = None;
        let mut turns = 0usize;

        while !candidate_moves(&state).is_empty() {
            let mover = state.to_move();
            let agent = &self.agents[seating[mover.index()]];
            let decision = agent.decide(&state, &self.config.turn, turn_rng.next_u64());
            let overrun = self.config.turn.is_overrun(decision.elapsed);
            let seat = &mut seats[mover.index()];
            seat.record(decision.elapsed, decision.steps, decision.endgame, overrun);
            turns += 1;

            if overrun && self.config.turn.forfeit_on_overrun {
                forfeit = Some(Forfeit {
                    player: mover,
                    reason: ForfeitReason::Overrun,
                });
                break;
            }

            let Some(mv) = decision.mv else {
                forfeit = Some(Forfeit {
                    player: mover,
                    reason: ForfeitReason::NoMove,
                });
                break;
            };

            let ruling = referee::apply(&mut state, mv, &self.config.rules.region_points);
            match ruling {
                Ruling::Accepted { .. } => {}
                Ruling::Forbidden => seat.forbidden += 1,
                Ruling::Illegal(reason) => {
                    forfeit = Some(Forfeit {
                        player: mover,
                        reason: ForfeitReason::Illegal(reason),
                    });
                }
            }

            if self.logging_enabled && tracing::enabled!(target: "sudoku_bench::turn", Level::INFO) {
                event!(
                    target: "sudoku_bench::turn",
                    Level::INFO,
                    run_id = %self.config.run_id,
                    game_index = game_index as u32,
                    turn = turns as u32,
                    player = mover.number() as u32,
                    agent = %agent.name,
                    mv = %mv,
                    ruling = ?ruling,
                    steps = decision.steps as u32,
                    proposals = decision.proposals as u32,
                    elapsed_ms = decision.elapsed.as_secs_f64() * 1000.0,
                );
            }

            if forfeit.is_some() {
                break;
            }
        }

        let scores = *state.scores().standings();
        let winner = match forfeit {
            Some(Forfeit { player, .. }) => Some(player.other()),
            None => state.scores().leader(),
        };

        let [first_seat, second_seat] = seats.map(SeatTally::finish);
        let outcome = GameOutcome {
            game_index,
            game_seed,
            geometry,
            empty_at_start,
            seats: [
                SeatResult::new(Player::First, scores, first_seat),
                SeatResult::new(Player::Second, scores, second_seat),
            ],
            winner,
            forfeit,
            turns,
            moves_played: state.history().iter().filter(|r| !r.is_forbidden()).count(),
            forbidden_moves: state.forbidden().declared().count(),
        };

        event!(
            target: "sudoku_bench::game",
            Level::DEBUG,
            game_index = game_index as u32,
            first = %outcome.seats[0].agent,
            second = %outcome.seats[1].agent,
            score_first = scores[0],
            score_second = scores[1],
            winner = ?outcome.winner_name(),
        );

        Ok(outcome)
    }
}

fn load_board(path: &Path) -> Result<Board, ArenaError> {
    let text = fs::read_to_string(path).map_err(|source| ArenaError::BoardFile {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(text.parse::<Board>()?)
}

fn ensure_parent(path: Option<&Path>) -> Result<(), ArenaError> {
    if let Some(dir) = path.filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    Ok(())
}

fn write_game_row(
    writer: &mut BufWriter<File>,
    run_id: &str,
    outcome: &GameOutcome,
) -> Result<(), ArenaError> {
    let row = GameLogRow {
        run_id,
        game_id: format!("G{:05}", outcome.game_index),
        game_index: outcome.game_index,
        game_seed: outcome.game_seed,
        board: &outcome.geometry,
        empty_at_start: outcome.empty_at_start,
        seats: &outcome.seats,
        winner: outcome.winner_name(),
        forfeit: outcome.forfeit,
        turns: outcome.turns,
        moves_played: outcome.moves_played,
        forbidden_moves: outcome.forbidden_moves,
    };
    serde_json::to_writer(&mut *writer, &row)?;
    writer.write_all(b"\n")?;
    Ok(())
}

/// Per-seat bookkeeping while a game is running.
struct SeatTally {
    agent: String,
    total: Duration,
    turns: u32,
    steps: usize,
    endgame_turns: u32,
    forbidden: u32,
    overruns: u32,
}

impl SeatTally {
    fn new(agent: &AgentBlueprint) -> Self {
        Self {
            agent: agent.name.clone(),
            total: Duration::ZERO,
            turns: 0,
            steps: 0,
            endgame_turns: 0,
            forbidden: 0,
            overruns: 0,
        }
    }

    fn record(&mut self, elapsed: Duration, steps: usize, endgame: bool, overrun: bool) {
        self.total += elapsed;
        self.turns += 1;
        self.steps += steps;
        if endgame {
            self.endgame_turns += 1;
        }
        if overrun {
            self.overruns += 1;
        }
    }

    fn finish(self) -> TurnMetrics {
        let total_ms = self.total.as_secs_f64() * 1000.0;
        TurnMetrics {
            agent: self.agent,
            turns: self.turns,
            steps: self.steps,
            endgame_turns: self.endgame_turns,
            forbidden: self.forbidden,
            overruns: self.overruns,
            total_ms,
            avg_ms_per_turn: if self.turns == 0 {
                0.0
            } else {
                total_ms / f64::from(self.turns)
            },
        }
    }
}

#[derive(Debug)]
pub struct TurnMetrics {
    pub agent: String,
    pub turns: u32,
    pub steps: usize,
    pub endgame_turns: u32,
    pub forbidden: u32,
    pub overruns: u32,
    pub total_ms: f64,
    pub avg_ms_per_turn: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SeatResult {
    pub player: u8,
    pub agent: String,
    pub score: u32,
    pub margin: i64,
    pub turns: u32,
    pub steps: usize,
    pub endgame_turns: u32,
    pub forbidden: u32,
    /// Turns that ran past the wall-clock budget.
    pub overruns: u32,
    pub speed_ms_turn: f64,
    #[serde(skip)]
    pub total_ms: f64,
}

impl SeatResult {
    fn new(player: Player, scores: [u32; 2], metrics: TurnMetrics) -> Self {
        let own = scores[player.index()];
        let other = scores[player.other().index()];
        Self {
            player: player.number() as u8,
            agent: metrics.agent,
            score: own,
            margin: i64::from(own) - i64::from(other),
            turns: metrics.turns,
            steps: metrics.steps,
            endgame_turns: metrics.endgame_turns,
            forbidden: metrics.forbidden,
            overruns: metrics.overruns,
            speed_ms_turn: metrics.avg_ms_per_turn,
            total_ms: metrics.total_ms,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ForfeitReason {
    NoMove,
    Illegal(IllegalMove),
    /// Turn exceeded `turn.time_ms` with `turn.forfeit_on_overrun` set.
    Overrun,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Forfeit {
    pub player: Player,
    pub reason: ForfeitReason,
}

/// Result of one game, seats ordered by player (first mover first).
#[derive(Debug, Clone)]
pub struct GameOutcome {
    pub game_index: usize,
    pub game_seed: u64,
    pub geometry: String,
    pub empty_at_start: usize,
    pub seats: [SeatResult; 2],
    pub winner: Option<Player>,
    pub forfeit: Option<Forfeit>,
    pub turns: usize,
    pub moves_played: usize,
    pub forbidden_moves: usize,
}

impl GameOutcome {
    pub fn winner_name(&self) -> Option<&str> {
        self.winner
            .map(|player| self.seats[player.index()].agent.as_str())
    }
}

#[derive(Serialize)]
struct GameLogRow<'a> {
    run_id: &'a str,
    game_id: String,
    game_index: usize,
    game_seed: u64,
    board: &'a str,
    empty_at_start: usize,
    seats: &'a [SeatResult; 2],
    winner: Option<&'a str>,
    forfeit: Option<Forfeit>,
    turns: usize,
    moves_played: usize,
    forbidden_moves: usize,
}

#[derive(Debug, Error)]
pub enum ArenaError {
    #[error("{0}")]
    Agent(#[from] AgentError),
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
    #[error("failed to serialize log row: {source}")]
    Serialize {
        #[from]
        source: serde_json::Error,
    },
    #[error("failed to read board file {path:?}: {source}")]
    BoardFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid start position: {0}")]
    Board(#[from] BoardError),
    #[error("a match requires exactly 2 agents but found {found}")]
    AgentCount { found: usize },
    #[error("configuration names neither a board file nor a random setup")]
    NoStartPosition,
    #[error("analytics error: {0}")]
    Analytics(#[from] AnalyticsError),
}

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("invalid parameter for agent '{name}': {message}")]
    InvalidParam { name: String, message: String },
}
