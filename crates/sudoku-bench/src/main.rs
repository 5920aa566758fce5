use std::path::PathBuf;

use clap::Parser;

use sudoku_bench::arena::MatchRunner;
use sudoku_bench::config::{MatchConfig, ResolvedOutputs};
use sudoku_bench::logging::init_logging;

/// Self-play arena for competitive Sudoku bots.
#[derive(Debug, Parser)]
#[command(
    name = "sudoku-bench",
    author,
    version,
    about = "Deterministic two-player Sudoku match harness"
)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "bench/bench.yaml")]
    config: PathBuf,

    /// Override the run identifier (substitutes {run_id} templates).
    #[arg(long, value_name = "RUN_ID")]
    run_id: Option<String>,

    /// Override the number of games to play.
    #[arg(long, value_name = "GAMES")]
    games: Option<usize>,

    /// Override the RNG seed for start positions and agent seeds.
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,

    /// Override the wall-clock budget per turn.
    #[arg(long, value_name = "MS")]
    time_ms: Option<u64>,

    /// Cap the number of search increments per turn.
    #[arg(long, value_name = "STEPS")]
    max_steps: Option<usize>,

    /// Exit after validating the configuration (no games are played).
    #[arg(long)]
    validate_only: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = MatchConfig::from_path(&cli.config)?;

    if let Some(run_id) = cli.run_id {
        config.run_id = run_id;
    }

    if let Some(games) = cli.games {
        config.games.count = games;
    }

    if let Some(seed) = cli.seed {
        config.games.seed = Some(seed);
    }

    if let Some(time_ms) = cli.time_ms {
        config.turn.time_ms = time_ms;
    }

    if let Some(max_steps) = cli.max_steps {
        config.turn.max_steps = Some(max_steps);
    }

    config.validate()?;

    let outputs: ResolvedOutputs = config.resolved_outputs();
    let run_id = config.run_id.clone();
    let games = config.games.count;
    let names: Vec<String> = config
        .agents
        .iter()
        .map(|agent| format!("{} ({})", agent.name, agent.strategy.as_str()))
        .collect();

    println!(
        "Loaded configuration '{run_id}': {} over {games} game{}",
        names.join(" vs "),
        if games == 1 { "" } else { "s" }
    );

    let runner = MatchRunner::new(config.clone(), outputs.clone())?;

    if cli.validate_only {
        println!("Validation-only mode: match execution skipped.");
        return Ok(());
    }

    let _logging_guard = init_logging(&config.logging, &outputs)?;

    let summary = runner.run()?;
    println!(
        "Match complete for '{run_id}': {} games → {} rows at {}",
        summary.games_played,
        summary.rows_written,
        summary.jsonl_path.display()
    );
    println!("Summary table: {}", summary.summary_path.display());
    if let Some(telemetry_path) = summary.telemetry_path.as_ref() {
        println!("Telemetry log: {}", telemetry_path.display());
    }

    Ok(())
}
