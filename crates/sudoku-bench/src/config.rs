use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;
use sudoku_core::model::board::{Board, MAX_SIZE};
use sudoku_core::model::score::DEFAULT_REGION_POINTS;
use thiserror::Error;
use tracing::Level;

const DEFAULT_TURN_TIME_MS: u64 = 500;
const RUN_ID_ALLOWED: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789._-";

/// Root match configuration loaded from YAML.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct MatchConfig {
    pub run_id: String,
    pub games: GamesConfig,
    #[serde(default)]
    pub turn: TurnConfig,
    #[serde(default)]
    pub rules: RulesConfig,
    pub agents: Vec<AgentConfig>,
    pub outputs: OutputsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl MatchConfig {
    /// Load configuration from a YAML file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let path_buf = path.to_path_buf();
        let file = File::open(path).map_err(|source| ConfigError::Read {
            source,
            path: path_buf.clone(),
        })?;
        let reader = BufReader::new(file);
        let mut cfg: MatchConfig =
            serde_yaml::from_reader(reader).map_err(|source| ConfigError::Parse {
                source,
                path: path_buf.clone(),
            })?;
        cfg.validate().map_err(|source| ConfigError::Invalid {
            path: path_buf,
            source,
        })?;
        Ok(cfg)
    }

    /// Validate the configuration without performing I/O.
    pub fn validate(&mut self) -> Result<(), ValidationError> {
        validate_run_id(&self.run_id)?;
        self.games.validate()?;
        self.turn.validate()?;
        self.rules.validate()?;
        self.outputs.validate(&self.run_id)?;
        self.logging.normalize();
        validate_agents(&mut self.agents)?;
        Ok(())
    }

    /// Resolve `{run_id}` placeholders into concrete paths.
    pub fn resolved_outputs(&self) -> ResolvedOutputs {
        ResolvedOutputs {
            jsonl: resolve_template(&self.run_id, &self.outputs.jsonl),
            summary_md: resolve_template(&self.run_id, &self.outputs.summary_md),
        }
    }
}

/// Which positions are played and how often.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct GamesConfig {
    /// Board file in the `m n` + cells text format.
    #[serde(default)]
    pub board: Option<PathBuf>,
    /// Random start positions, one per game.
    #[serde(default)]
    pub setup: Option<SetupConfig>,
    pub count: usize,
    pub seed: Option<u64>,
    /// Alternate which agent moves first between games.
    #[serde(default = "default_swap_sides")]
    pub swap_sides: bool,
}

impl GamesConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.count == 0 {
            return Err(ValidationError::InvalidField {
                field: "games.count".to_string(),
                message: "number of games must be greater than zero".to_string(),
            });
        }

        match (&self.board, &self.setup) {
            (Some(_), Some(_)) => Err(ValidationError::InvalidField {
                field: "games".to_string(),
                message: "specify either board or setup, not both".to_string(),
            }),
            (None, None) => Err(ValidationError::InvalidField {
                field: "games".to_string(),
                message: "one of board or setup is required".to_string(),
            }),
            (Some(board), None) if board.as_os_str().is_empty() => {
                Err(ValidationError::InvalidField {
                    field: "games.board".to_string(),
                    message: "path must not be empty".to_string(),
                })
            }
            (Some(_), None) => Ok(()),
            (None, Some(setup)) => setup.validate(),
        }
    }
}

fn default_swap_sides() -> bool {
    true
}

/// Random puzzle geometry: `block_rows`×`block_cols` blocks, `clues` filled cells.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
pub struct SetupConfig {
    pub block_rows: usize,
    pub block_cols: usize,
    #[serde(default)]
    pub clues: usize,
}

impl SetupConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        let board = Board::empty(self.block_rows, self.block_cols).map_err(|err| {
            ValidationError::InvalidField {
                field: "games.setup".to_string(),
                message: format!("{err} (side length limit {MAX_SIZE})"),
            }
        })?;
        if self.clues > board.cell_count() {
            return Err(ValidationError::InvalidField {
                field: "games.setup.clues".to_string(),
                message: format!(
                    "{} clues do not fit a board of {} cells",
                    self.clues,
                    board.cell_count()
                ),
            });
        }
        Ok(())
    }
}

/// Per-turn search budget: wall-clock and/or controller increments.
///
/// The deadline is only checked between increments, so a turn can run past
/// `time_ms`. Such turns are counted as overruns and forfeit the game when
/// `forfeit_on_overrun` is set.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TurnConfig {
    #[serde(default = "default_turn_time_ms")]
    pub time_ms: u64,
    #[serde(default)]
    pub max_steps: Option<usize>,
    #[serde(default)]
    pub forfeit_on_overrun: bool,
}

impl Default for TurnConfig {
    fn default() -> Self {
        Self {
            time_ms: DEFAULT_TURN_TIME_MS,
            max_steps: None,
            forfeit_on_overrun: false,
        }
    }
}

impl TurnConfig {
    pub fn budget(&self) -> Duration {
        Duration::from_millis(self.time_ms)
    }

    pub fn is_overrun(&self, elapsed: Duration) -> bool {
        elapsed > self.budget()
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.time_ms == 0 {
            return Err(ValidationError::InvalidField {
                field: "turn.time_ms".to_string(),
                message: "turn time must be greater than zero".to_string(),
            });
        }
        if self.max_steps == Some(0) {
            return Err(ValidationError::InvalidField {
                field: "turn.max_steps".to_string(),
                message: "max_steps must be at least 1 when set".to_string(),
            });
        }
        Ok(())
    }
}

fn default_turn_time_ms() -> u64 {
    DEFAULT_TURN_TIME_MS
}

/// Scoring rules the referee applies to both seats.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
pub struct RulesConfig {
    /// Points for completing 0, 1, 2 or 3 regions with one move.
    #[serde(default = "default_region_points")]
    pub region_points: [u32; 4],
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            region_points: DEFAULT_REGION_POINTS,
        }
    }
}

impl RulesConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.region_points.windows(2).any(|pair| pair[0] > pair[1]) {
            return Err(ValidationError::InvalidField {
                field: "rules.region_points".to_string(),
                message: "points must not decrease with more completed regions".to_string(),
            });
        }
        Ok(())
    }
}

fn default_region_points() -> [u32; 4] {
    DEFAULT_REGION_POINTS
}

/// One side of the match.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AgentConfig {
    pub name: String,
    pub strategy: AgentStrategy,
    /// Overrides for bot parameters, keyed by field name (e.g. `prune_margin`).
    #[serde(default)]
    pub params: serde_yaml::Value,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AgentStrategy {
    Minimax,
    Uct,
    /// Uniformly random candidate; a floor for the search agents.
    Random,
}

impl AgentStrategy {
    pub const fn as_str(self) -> &'static str {
        match self {
            AgentStrategy::Minimax => "minimax",
            AgentStrategy::Uct => "uct",
            AgentStrategy::Random => "random",
        }
    }
}

/// Output artifact configuration.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct OutputsConfig {
    pub jsonl: String,
    pub summary_md: String,
}

impl OutputsConfig {
    fn validate(&self, run_id: &str) -> Result<(), ValidationError> {
        for (label, value) in [
            ("outputs.jsonl", &self.jsonl),
            ("outputs.summary_md", &self.summary_md),
        ] {
            if value.trim().is_empty() {
                return Err(ValidationError::InvalidField {
                    field: label.to_string(),
                    message: "path must not be empty".to_string(),
                });
            }

            let resolved = resolve_template(run_id, value);
            if resolved.components().count() == 0 {
                return Err(ValidationError::InvalidField {
                    field: label.to_string(),
                    message: "resolved path is invalid".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Structured logs are off unless enabled.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default)]
    pub enable_structured: bool,
    #[serde(default = "default_tracing_level")]
    pub tracing_level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enable_structured: false,
            tracing_level: default_tracing_level(),
        }
    }
}

impl LoggingConfig {
    fn normalize(&mut self) {
        if self.tracing_level.trim().is_empty() {
            self.tracing_level = default_tracing_level();
        }
    }

    pub fn level(&self) -> Option<Level> {
        match self.tracing_level.to_ascii_lowercase().as_str() {
            "trace" => Some(Level::TRACE),
            "debug" => Some(Level::DEBUG),
            "info" => Some(Level::INFO),
            "warn" | "warning" => Some(Level::WARN),
            "error" => Some(Level::ERROR),
            _ => None,
        }
    }
}

fn default_tracing_level() -> String {
    "info".to_string()
}

fn validate_run_id(run_id: &str) -> Result<(), ValidationError> {
    if run_id.trim().is_empty() {
        return Err(ValidationError::InvalidField {
            field: "run_id".to_string(),
            message: "run_id must not be empty".to_string(),
        });
    }

    if !run_id.chars().all(|c| RUN_ID_ALLOWED.contains(c)) {
        return Err(ValidationError::InvalidField {
            field: "run_id".to_string(),
            message: "run_id may only contain alphanumeric characters, '.', '_' or '-'".to_string(),
        });
    }

    Ok(())
}

fn validate_agents(agents: &mut [AgentConfig]) -> Result<(), ValidationError> {
    if agents.len() != 2 {
        return Err(ValidationError::InvalidField {
            field: "agents".to_string(),
            message: format!("a match needs exactly two agents, found {}", agents.len()),
        });
    }

    let mut seen = HashSet::new();
    for agent in agents.iter_mut() {
        if agent.name.trim().is_empty() {
            return Err(ValidationError::InvalidField {
                field: "agents.name".to_string(),
                message: "agent name must not be empty".to_string(),
            });
        }

        if !agent.name.chars().all(|c| RUN_ID_ALLOWED.contains(c)) {
            return Err(ValidationError::InvalidField {
                field: format!("agents[{}].name", agent.name),
                message: "agent name contains invalid characters".to_string(),
            });
        }

        if !seen.insert(agent.name.clone()) {
            return Err(ValidationError::InvalidField {
                field: "agents".to_string(),
                message: format!("agent name '{}' defined more than once", agent.name),
            });
        }

        if agent.params.is_null() {
            agent.params = serde_yaml::Value::Mapping(Default::default());
        }
    }

    Ok(())
}

fn resolve_template(run_id: &str, template: &str) -> PathBuf {
    PathBuf::from(template.replace("{run_id}", run_id))
}

/// Fully resolved output paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOutputs {
    pub jsonl: PathBuf,
    pub summary_md: PathBuf,
}

/// Errors surfaced when loading configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        #[source]
        source: serde_yaml::Error,
        path: PathBuf,
    },
    #[error("invalid configuration in {path:?}: {source}")]
    Invalid {
        path: PathBuf,
        source: ValidationError,
    },
}

impl ConfigError {
    pub fn path(&self) -> &Path {
        match self {
            ConfigError::Read { path, .. }
            | ConfigError::Parse { path, .. }
            | ConfigError::Invalid { path, .. } => path.as_path(),
        }
    }
}

/// Validation failures captured with contextual metadata.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field}: {message}")]
    InvalidField { field: String, message: String },
}
