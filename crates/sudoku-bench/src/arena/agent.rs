use std::collections::HashMap;
use std::time::{Duration, Instant};

use rand::SeedableRng;
use rand::rngs::SmallRng;
use sudoku_bot::bot::random_candidate;
use sudoku_bot::{BotParams, ControllerConfig, ProposalSink, Strategy, compute_best_move};
use sudoku_core::game::state::GameState;
use sudoku_core::model::moves::Move;

use super::AgentError;
use crate::config::{AgentConfig, AgentStrategy, TurnConfig};

/// YAML parameter keys and the environment keys [`BotParams::from_reader`] expects.
const PARAM_KEYS: [(&str, &str); 9] = [
    ("forbidden_cutoff", "SUDOKU_FORBIDDEN_CUTOFF"),
    ("region_points", "SUDOKU_REGION_POINTS"),
    ("prune_margin", "SUDOKU_PRUNE_MARGIN"),
    ("transposition_tolerance", "SUDOKU_TRANSPOSITION_TOLERANCE"),
    ("selection_exploration", "SUDOKU_SELECTION_EXPLORATION"),
    ("reporting_exploration", "SUDOKU_REPORTING_EXPLORATION"),
    ("rollouts_per_step", "SUDOKU_ROLLOUTS_PER_STEP"),
    ("endgame_min_gain", "SUDOKU_ENDGAME_MIN_GAIN"),
    ("tiered_candidates", "SUDOKU_TIERED_CANDIDATES"),
];

/// A configured participant; turns are played through [`AgentBlueprint::decide`].
#[derive(Debug, Clone)]
pub(crate) struct AgentBlueprint {
    pub(crate) name: String,
    pub(crate) strategy: AgentStrategy,
    pub(crate) params: BotParams,
}

impl AgentBlueprint {
    pub(crate) fn from_config(config: &AgentConfig) -> Result<Self, AgentError> {
        Ok(Self {
            name: config.name.clone(),
            strategy: config.strategy,
            params: params_from_yaml(&config.name, &config.params)?,
        })
    }

    /// Runs one turn under `budget` and returns the last proposed move.
    pub(crate) fn decide(&self, state: &GameState, budget: &TurnConfig, seed: u64) -> TurnDecision {
        let start = Instant::now();
        let mut sink = TurnSink::new(start + budget.budget());

        let (steps, endgame) = match self.strategy {
            AgentStrategy::Random => {
                let mut rng = SmallRng::seed_from_u64(seed);
                if let Some(mv) = random_candidate(state, &mut rng) {
                    sink.propose_move(mv);
                }
                (0, false)
            }
            AgentStrategy::Minimax | AgentStrategy::Uct => {
                let strategy = if self.strategy == AgentStrategy::Uct {
                    Strategy::Uct
                } else {
                    Strategy::Minimax
                };
                let config = ControllerConfig {
                    strategy,
                    params: self.params,
                    seed,
                    max_steps: budget.max_steps,
                };
                let summary = compute_best_move(state, &config, &mut sink);
                (summary.steps, summary.endgame)
            }
        };

        TurnDecision {
            mv: sink.last,
            proposals: sink.proposals,
            steps,
            endgame,
            elapsed: start.elapsed(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct TurnDecision {
    pub(crate) mv: Option<Move>,
    pub(crate) proposals: usize,
    pub(crate) steps: usize,
    pub(crate) endgame: bool,
    pub(crate) elapsed: Duration,
}

/// Host end of the proposal channel: remembers the latest move, stops at the deadline.
struct TurnSink {
    deadline: Instant,
    last: Option<Move>,
    proposals: usize,
}

impl TurnSink {
    fn new(deadline: Instant) -> Self {
        Self {
            deadline,
            last: None,
            proposals: 0,
        }
    }
}

impl ProposalSink for TurnSink {
    fn propose_move(&mut self, mv: Move) {
        self.last = Some(mv);
        self.proposals += 1;
    }

    fn should_stop(&self) -> bool {
        Instant::now() >= self.deadline
    }
}

fn params_from_yaml(name: &str, params: &serde_yaml::Value) -> Result<BotParams, AgentError> {
    if params.is_null() {
        return Ok(BotParams::default());
    }

    let mapping = params
        .as_mapping()
        .ok_or_else(|| AgentError::InvalidParam {
            name: name.to_string(),
            message: "expected mapping for agent params".to_string(),
        })?;

    let mut overrides = HashMap::new();
    for (key, value) in mapping {
        let key = key.as_str().ok_or_else(|| AgentError::InvalidParam {
            name: name.to_string(),
            message: "parameter names must be strings".to_string(),
        })?;
        let env_key = PARAM_KEYS
            .iter()
            .find_map(|(yaml, env)| (*yaml == key).then_some(*env))
            .ok_or_else(|| AgentError::InvalidParam {
                name: name.to_string(),
                message: format!("unknown parameter '{key}'"),
            })?;
        overrides.insert(env_key, scalar_text(name, key, value)?);
    }

    let params = BotParams::from_reader(|key| overrides.get(key).cloned());
    Ok(params)
}

fn scalar_text(name: &str, key: &str, value: &serde_yaml::Value) -> Result<String, AgentError> {
    use serde_yaml::Value;
    match value {
        Value::Bool(flag) => Ok(flag.to_string()),
        Value::Number(number) => Ok(number.to_string()),
        Value::String(text) => Ok(text.clone()),
        Value::Sequence(items) => items
            .iter()
            .map(|item| scalar_text(name, key, item))
            .collect::<Result<Vec<_>, _>>()
            .map(|parts| parts.join(",")),
        _ => Err(AgentError::InvalidParam {
            name: name.to_string(),
            message: format!("parameter '{key}' must be a scalar or a list"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sudoku_bot::bot::is_candidate;
    use sudoku_core::model::board::Board;

    fn yaml(text: &str) -> serde_yaml::Value {
        serde_yaml::from_str(text).expect("yaml")
    }

    #[test]
    fn empty_params_keep_defaults() {
        let params = params_from_yaml("bot", &serde_yaml::Value::Mapping(Default::default()));
        assert_eq!(params.unwrap(), BotParams::default());
    }

    #[test]
    fn yaml_params_override_bot_defaults() {
        let params = params_from_yaml(
            "bot",
            &yaml("prune_margin: 0.5\nregion_points: [0, 2, 5, 9]\ntiered_candidates: true\nrollouts_per_step: 8\n"),
        )
        .unwrap();
        assert_eq!(params.prune_margin, 0.5);
        assert_eq!(params.region_points, [0, 2, 5, 9]);
        assert!(params.tiered_candidates);
        assert_eq!(params.rollouts_per_step, 8);
    }

    #[test]
    fn unknown_params_are_rejected() {
        let err = params_from_yaml("bot", &yaml("depth: 4\n")).unwrap_err();
        assert!(matches!(err, AgentError::InvalidParam { message, .. } if message.contains("depth")));
    }

    #[test]
    fn random_agent_proposes_a_candidate() {
        let agent = AgentBlueprint {
            name: "floor".to_string(),
            strategy: AgentStrategy::Random,
            params: BotParams::default(),
        };
        let state = GameState::new(Board::empty(2, 2).unwrap());
        let budget = TurnConfig {
            time_ms: 50,
            max_steps: Some(1),
            ..TurnConfig::default()
        };
        let decision = agent.decide(&state, &budget, 3);
        let mv = decision.mv.expect("random move");
        assert!(is_candidate(&state, mv));
        assert_eq!(decision.steps, 0);
    }

    #[test]
    fn search_agent_respects_step_budget() {
        let agent = AgentBlueprint {
            name: "deep".to_string(),
            strategy: AgentStrategy::Minimax,
            params: BotParams::default(),
        };
        let state = GameState::new(Board::empty(2, 2).unwrap());
        let budget = TurnConfig {
            time_ms: 60_000,
            max_steps: Some(2),
            ..TurnConfig::default()
        };
        let decision = agent.decide(&state, &budget, 3);
        assert_eq!(decision.steps, 2);
        assert!(decision.proposals >= 1);
        assert!(is_candidate(&state, decision.mv.unwrap()));
    }
}
