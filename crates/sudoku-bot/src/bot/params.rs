use sudoku_core::model::score::DEFAULT_REGION_POINTS;

/// Tunable search and evaluation parameters.
///
/// Every field can be overridden through a `SUDOKU_*` environment variable;
/// unparsable or out-of-range values keep the default.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BotParams {
    /// Risk above which a move is treated as a forbidden guess (default: 0.8)
    pub forbidden_cutoff: f64,

    /// Points for completing 0, 1, 2 or 3 regions at once (default: 0, 1, 3, 7)
    pub region_points: [u32; 4],

    /// Extra slack an alpha-beta cut must clear (default: 1.0)
    pub prune_margin: f64,

    /// A transposition is dropped when the stored score beats it by at least this much (default: 0.0)
    pub transposition_tolerance: f64,

    /// UCT exploration constant while descending (default: sqrt 2)
    pub selection_exploration: f64,

    /// UCT exploration constant when reporting the best move (default: 0.1)
    pub reporting_exploration: f64,

    /// Rollouts per controller increment (default: 50)
    pub rollouts_per_step: usize,

    /// Gain a search move needs before it replaces an endgame forbidden move (default: 3.0)
    pub endgame_min_gain: f64,

    /// Restrict minimax expansion to forced/paired cells when available (default: false)
    pub tiered_candidates: bool,
}

impl Default for BotParams {
    fn default() -> Self {
        Self {
            forbidden_cutoff: 0.8,
            region_points: DEFAULT_REGION_POINTS,
            prune_margin: 1.0,
            transposition_tolerance: 0.0,
            selection_exploration: std::f64::consts::SQRT_2,
            reporting_exploration: 0.1,
            rollouts_per_step: 50,
            endgame_min_gain: 3.0,
            tiered_candidates: false,
        }
    }
}

impl BotParams {
    pub fn from_env() -> Self {
        Self::from_reader(|key| std::env::var(key).ok())
    }

    pub fn from_reader<F>(mut read: F) -> Self
    where
        F: FnMut(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let forbidden_cutoff = read_f64(&mut read, "SUDOKU_FORBIDDEN_CUTOFF")
            .filter(|value| (0.0..=1.0).contains(value))
            .unwrap_or(defaults.forbidden_cutoff);

        let region_points = read("SUDOKU_REGION_POINTS")
            .and_then(|raw| parse_points(&raw))
            .unwrap_or(defaults.region_points);

        let prune_margin = read_f64(&mut read, "SUDOKU_PRUNE_MARGIN")
            .filter(|value| *value >= 0.0)
            .unwrap_or(defaults.prune_margin);

        let transposition_tolerance = read_f64(&mut read, "SUDOKU_TRANSPOSITION_TOLERANCE")
            .filter(|value| *value >= 0.0)
            .unwrap_or(defaults.transposition_tolerance);

        let selection_exploration = read_f64(&mut read, "SUDOKU_SELECTION_EXPLORATION")
            .filter(|value| *value >= 0.0)
            .unwrap_or(defaults.selection_exploration);

        let reporting_exploration = read_f64(&mut read, "SUDOKU_REPORTING_EXPLORATION")
            .filter(|value| *value >= 0.0)
            .unwrap_or(defaults.reporting_exploration);

        let rollouts_per_step = read("SUDOKU_ROLLOUTS_PER_STEP")
            .and_then(|raw| raw.trim().parse::<usize>().ok())
            .filter(|value| *value > 0)
            .unwrap_or(defaults.rollouts_per_step);

        let endgame_min_gain = read_f64(&mut read, "SUDOKU_ENDGAME_MIN_GAIN")
            .unwrap_or(defaults.endgame_min_gain);

        let tiered_candidates = read("SUDOKU_TIERED_CANDIDATES")
            .map(|raw| matches!(raw.trim(), "1" | "true" | "TRUE" | "on" | "ON"))
            .unwrap_or(defaults.tiered_candidates);

        Self {
            forbidden_cutoff,
            region_points,
            prune_margin,
            transposition_tolerance,
            selection_exploration,
            reporting_exploration,
            rollouts_per_step,
            endgame_min_gain,
            tiered_candidates,
        }
    }
}

fn read_f64<F>(read: &mut F, key: &str) -> Option<f64>
where
    F: FnMut(&str) -> Option<String>,
{
    read(key)
        .and_then(|raw| raw.trim().parse::<f64>().ok())
        .filter(|value| value.is_finite())
}

fn parse_points(raw: &str) -> Option<[u32; 4]> {
    let values: Vec<u32> = raw
        .split(',')
        .map(|part| part.trim().parse::<u32>())
        .collect::<Result<_, _>>()
        .ok()?;
    values.try_into().ok()
}
