use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Serialize;
use statrs::distribution::{ContinuousCDF, Normal};
use thiserror::Error;

use crate::arena::{GameOutcome, SeatResult};
use crate::config::{AgentStrategy, MatchConfig};

const CONFIDENCE_Z: f64 = 1.96; // 95% CI

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("agent '{0}' appears in results but not in configuration")]
    UnknownAgent(String),
    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
}

pub struct AnalyticsCollector {
    run_id: String,
    agents: HashMap<String, AgentAccumulator>,
    agent_order: Vec<String>,
    /// Margins of the first configured agent, one per game.
    head_to_head: ComparisonAccumulator,
    first_mover_wins: usize,
    games: usize,
}

impl AnalyticsCollector {
    pub fn new(config: &MatchConfig) -> Self {
        let mut agents = HashMap::new();
        let mut order = Vec::new();
        for agent in &config.agents {
            agents.insert(
                agent.name.clone(),
                AgentAccumulator::new(agent.name.clone(), agent.strategy),
            );
            order.push(agent.name.clone());
        }

        Self {
            run_id: config.run_id.clone(),
            agents,
            agent_order: order,
            head_to_head: ComparisonAccumulator::new(),
            first_mover_wins: 0,
            games: 0,
        }
    }

    pub fn record_game(&mut self, outcome: &GameOutcome) -> Result<(), AnalyticsError> {
        let winner = outcome.winner.map(|player| player.number() as u8);
        let forfeiter = outcome.forfeit.map(|f| f.player.number() as u8);

        for seat in &outcome.seats {
            let acc = self
                .agents
                .get_mut(&seat.agent)
                .ok_or_else(|| AnalyticsError::UnknownAgent(seat.agent.clone()))?;
            let result = match winner {
                Some(player) if player == seat.player => GameResult::Win,
                Some(_) => GameResult::Loss,
                None => GameResult::Draw,
            };
            acc.record_game(seat, result, forfeiter == Some(seat.player));
        }

        let reference = self
            .agent_order
            .first()
            .and_then(|name| outcome.seats.iter().find(|s| &s.agent == name));
        if let Some(seat) = reference {
            self.head_to_head.record(seat.margin as f64);
        }
        if winner == Some(1) {
            self.first_mover_wins += 1;
        }
        self.games += 1;
        Ok(())
    }

    pub fn finalize(mut self) -> AnalyticsSummary {
        let mut reports = Vec::new();
        for name in &self.agent_order {
            if let Some(acc) = self.agents.remove(name) {
                reports.push(acc.into_report());
            }
        }

        let (p_value, sample_size) = self.head_to_head.wilcoxon_signed_rank();
        AnalyticsSummary {
            run_id: self.run_id,
            games: self.games,
            first_mover_wins: self.first_mover_wins,
            agents: reports,
            comparison: ComparisonReport {
                reference: self.agent_order.first().cloned().unwrap_or_default(),
                p_value,
                sample_size,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GameResult {
    Win,
    Draw,
    Loss,
}

struct AgentAccumulator {
    name: String,
    strategy: AgentStrategy,
    games: u32,
    wins: u32,
    draws: u32,
    losses: u32,
    forfeits: u32,
    forbidden: u32,
    overruns: u32,
    endgame_turns: u32,
    turns: u32,
    per_game_margin: Vec<f64>,
    total_ms: f64,
}

impl AgentAccumulator {
    fn new(name: String, strategy: AgentStrategy) -> Self {
        Self {
            name,
            strategy,
            games: 0,
            wins: 0,
            draws: 0,
            losses: 0,
            forfeits: 0,
            forbidden: 0,
            overruns: 0,
            endgame_turns: 0,
            turns: 0,
            per_game_margin: Vec::new(),
            total_ms: 0.0,
        }
    }

    fn record_game(&mut self, seat: &SeatResult, result: GameResult, forfeited: bool) {
        self.games += 1;
        match result {
            GameResult::Win => self.wins += 1,
            GameResult::Draw => self.draws += 1,
            GameResult::Loss => self.losses += 1,
        }
        if forfeited {
            self.forfeits += 1;
        }
        self.forbidden += seat.forbidden;
        self.overruns += seat.overruns;
        self.endgame_turns += seat.endgame_turns;
        self.turns += seat.turns;
        self.per_game_margin.push(seat.margin as f64);
        self.total_ms += seat.total_ms;
    }

    fn into_report(self) -> AgentReport {
        let games = f64::from(self.games);
        let win_rate = if self.games == 0 {
            0.0
        } else {
            f64::from(self.wins) / games
        };
        let avg_margin = if self.games == 0 {
            0.0
        } else {
            self.per_game_margin.iter().sum::<f64>() / games
        };
        let avg_ms_per_turn = if self.turns == 0 {
            0.0
        } else {
            self.total_ms / f64::from(self.turns)
        };

        AgentReport {
            name: self.name,
            strategy: self.strategy,
            games: self.games as usize,
            wins: self.wins as usize,
            draws: self.draws as usize,
            losses: self.losses as usize,
            forfeits: self.forfeits as usize,
            win_rate,
            win_rate_ci95: proportion_interval(self.wins as usize, self.games as usize),
            avg_margin,
            margin_ci95: confidence_interval(&self.per_game_margin),
            forbidden_declared: self.forbidden as usize,
            overruns: self.overruns as usize,
            endgame_turns: self.endgame_turns as usize,
            avg_ms_per_turn,
        }
    }
}

#[derive(Clone)]
struct ComparisonAccumulator {
    diffs: Vec<f64>,
}

impl ComparisonAccumulator {
    fn new() -> Self {
        Self { diffs: Vec::new() }
    }

    fn record(&mut self, diff: f64) {
        self.diffs.push(diff);
    }

    /// Two-sided p-value of the signed-rank test (normal approximation with
    /// tie and continuity corrections) and the number of non-zero samples.
    fn wilcoxon_signed_rank(self) -> (f64, usize) {
        let diffs: Vec<f64> = self
            .diffs
            .into_iter()
            .filter(|d| d.abs() > f64::EPSILON)
            .collect();
        let n = diffs.len();
        if n == 0 {
            return (1.0, 0);
        }

        let mut paired: Vec<(f64, f64)> =
            diffs.into_iter().map(|d| (d.abs(), d.signum())).collect();
        paired.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut w_plus = 0.0;
        let mut w_minus = 0.0;
        let mut tie_adjustment = 0.0;
        let mut i = 0;
        while i < paired.len() {
            let mut j = i;
            while j + 1 < paired.len() && (paired[j + 1].0 - paired[i].0).abs() < 1e-12 {
                j += 1;
            }
            let rank = (i + j + 2) as f64 / 2.0;
            for &(_, sign) in &paired[i..=j] {
                if sign > 0.0 {
                    w_plus += rank;
                } else {
                    w_minus += rank;
                }
            }
            let ties = (j - i + 1) as f64;
            if ties > 1.0 {
                tie_adjustment += (ties.powi(3) - ties) / 48.0;
            }
            i = j + 1;
        }

        let w = f64::min(w_plus, w_minus);
        let n_f = n as f64;
        let mean_w = n_f * (n_f + 1.0) / 4.0;
        let variance_w = n_f * (n_f + 1.0) * (2.0 * n_f + 1.0) / 24.0 - tie_adjustment;
        if variance_w <= 0.0 {
            return (1.0, n);
        }

        let z = (((w - mean_w).abs() - 0.5) / variance_w.sqrt()).max(0.0);
        let p = Normal::new(0.0, 1.0)
            .ok()
            .map(|normal| 2.0 * (1.0 - normal.cdf(z)))
            .unwrap_or(1.0);
        (p.clamp(0.0, 1.0), n)
    }
}

#[derive(Debug, Serialize)]
pub struct AnalyticsSummary {
    pub run_id: String,
    pub games: usize,
    pub first_mover_wins: usize,
    pub agents: Vec<AgentReport>,
    pub comparison: ComparisonReport,
}

impl AnalyticsSummary {
    pub fn write_markdown(&self, path: impl AsRef<Path>) -> Result<(), AnalyticsError> {
        let mut rows = String::new();
        rows.push_str(&format!("# Match Summary: {}\n\n", self.run_id));
        rows.push_str(&format!(
            "Games: {} (first mover won {})\n\n",
            self.games, self.first_mover_wins
        ));
        rows.push_str("| Agent | Strategy | Games | W | D | L | Win % | 95% CI | Avg margin | Margin 95% CI | Forfeits | Forbidden | Overruns | Endgame turns | Avg ms/turn |\n");
        rows.push_str("|-------|----------|-------|---|---|---|-------|--------|------------|---------------|----------|-----------|----------|---------------|-------------|\n");

        for agent in &self.agents {
            rows.push_str(&format!(
                "| {name} | {strategy} | {games} | {wins} | {draws} | {losses} | {win:.1}% | [{lo:.1}%, {hi:.1}%] | {margin:+.2} | [{m_lo:+.2}, {m_hi:+.2}] | {forfeits} | {forbidden} | {overruns} | {endgame} | {latency:.2} |\n",
                name = agent.name,
                strategy = agent.strategy.as_str(),
                games = agent.games,
                wins = agent.wins,
                draws = agent.draws,
                losses = agent.losses,
                win = agent.win_rate * 100.0,
                lo = agent.win_rate_ci95.0 * 100.0,
                hi = agent.win_rate_ci95.1 * 100.0,
                margin = agent.avg_margin,
                m_lo = agent.margin_ci95.0,
                m_hi = agent.margin_ci95.1,
                forfeits = agent.forfeits,
                forbidden = agent.forbidden_declared,
                overruns = agent.overruns,
                endgame = agent.endgame_turns,
                latency = agent.avg_ms_per_turn,
            ));
        }

        rows.push_str(&format!(
            "\nWilcoxon signed-rank on margins of '{}': p = {:.3} (n = {})\n",
            self.comparison.reference, self.comparison.p_value, self.comparison.sample_size
        ));

        fs::write(path.as_ref(), rows).map_err(|e| AnalyticsError::Io {
            context: "writing summary markdown",
            source: e,
        })?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentReport {
    pub name: String,
    pub strategy: AgentStrategy,
    pub games: usize,
    pub wins: usize,
    pub draws: usize,
    pub losses: usize,
    pub forfeits: usize,
    pub win_rate: f64,
    pub win_rate_ci95: (f64, f64),
    pub avg_margin: f64,
    pub margin_ci95: (f64, f64),
    pub forbidden_declared: usize,
    /// Turns past the wall-clock budget, summed over games.
    pub overruns: usize,
    pub endgame_turns: usize,
    #[serde(skip)]
    pub avg_ms_per_turn: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComparisonReport {
    pub reference: String,
    pub p_value: f64,
    pub sample_size: usize,
}

/// Normal-approximation interval for a win proportion, clamped to [0, 1].
fn proportion_interval(successes: usize, trials: usize) -> (f64, f64) {
    if trials == 0 {
        return (0.0, 0.0);
    }
    let n = trials as f64;
    let p = successes as f64 / n;
    let margin = CONFIDENCE_Z * (p * (1.0 - p) / n).sqrt();
    ((p - margin).max(0.0), (p + margin).min(1.0))
}

fn confidence_interval(points: &[f64]) -> (f64, f64) {
    if points.is_empty() {
        return (0.0, 0.0);
    }
    let mean = points.iter().sum::<f64>() / points.len() as f64;
    if points.len() == 1 {
        return (mean, mean);
    }
    let variance = points
        .iter()
        .map(|value| (value - mean).powi(2))
        .sum::<f64>()
        / (points.len() as f64 - 1.0);
    let std_error = (variance / points.len() as f64).sqrt();
    let margin = CONFIDENCE_Z * std_error;
    (mean - margin, mean + margin)
}
