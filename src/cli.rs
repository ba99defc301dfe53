use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;

use crate::combat::{
    entropy_seed, render_text, simulate_battle, write_events_csv, Army, Rng, SimulationResult,
    TraceMode,
};
use crate::data::{
    load_scenario, sample_scenario, validate_scenario_file, ScenarioFile, ValidationSeverity,
};
use crate::error::ScenarioError;
use crate::forecast::{run_forecast, ForecastSummary};
use crate::parallel::{run_forecast_batches, WorkerPool};

#[derive(Parser, Debug)]
#[command(name = "battlecast", version)]
#[command(about = "Turn-based two-army battle resolution and outcome forecasting")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Resolve one battle and print its report
    Simulate(SimulateArgs),
    /// Run many seeded battles and print win rates
    Forecast(ForecastArgs),
    /// Check a scenario file and list every problem found
    Validate {
        /// Scenario file (.yaml, .yml or .json)
        path: PathBuf,
    },
    /// Print the built-in sample scenario as YAML
    Sample,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct ScenarioArgs {
    /// Scenario file; the built-in Dave vs Brabo sample when omitted
    #[arg(long)]
    pub scenario: Option<PathBuf>,

    /// Seed for deterministic runs; overrides the scenario seed
    #[arg(long)]
    pub seed: Option<u64>,

    /// Turn cap; overrides the scenario value
    #[arg(long)]
    pub max_turns: Option<u32>,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct SimulateArgs {
    #[command(flatten)]
    pub scenario: ScenarioArgs,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Print the turn-by-turn battle log before the report (text format only)
    #[arg(long)]
    pub log: bool,

    /// Also write the event log as CSV to this path
    #[arg(long)]
    pub events_csv: Option<PathBuf>,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct ForecastArgs {
    #[command(flatten)]
    pub scenario: ScenarioArgs,

    #[arg(long, default_value_t = 1000)]
    pub iterations: usize,

    /// Worker threads; 0 uses every core
    #[arg(long, default_value_t = 0)]
    pub workers: usize,

    /// Run iterations on the calling thread only
    #[arg(long)]
    pub sequential: bool,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Serialize)]
struct SimulateOutput<'a> {
    seed: u64,
    #[serde(flatten)]
    result: &'a SimulationResult,
}

pub fn run_with_args(args: &[String]) -> i32 {
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return err.exit_code();
        }
    };
    match cli.command {
        Command::Simulate(args) => handle_simulate(&args),
        Command::Forecast(args) => handle_forecast(&args),
        Command::Validate { path } => handle_validate(&path),
        Command::Sample => handle_sample(),
    }
}

/// A scenario with CLI overrides applied, its seed and its built armies.
#[derive(Debug)]
struct Prepared {
    scenario: ScenarioFile,
    seed: u64,
    attacker: Army,
    defender: Army,
}

fn prepare(args: &ScenarioArgs) -> Result<Prepared, ScenarioError> {
    let mut scenario = match &args.scenario {
        Some(path) => load_scenario(path)?,
        None => sample_scenario(),
    };
    if let Some(max_turns) = args.max_turns {
        scenario.max_turns = max_turns;
    }
    let seed = args.seed.or(scenario.seed).unwrap_or_else(entropy_seed);
    let (attacker, defender) = scenario.build_armies()?;
    Ok(Prepared {
        scenario,
        seed,
        attacker,
        defender,
    })
}

fn report_prepare_error(err: &ScenarioError) -> i32 {
    match err {
        ScenarioError::Config(_) => eprintln!("invalid scenario: {err}"),
        _ => eprintln!("failed to load scenario: {err}"),
    }
    1
}

fn handle_simulate(args: &SimulateArgs) -> i32 {
    let Prepared {
        scenario,
        seed,
        attacker,
        defender,
    } = match prepare(&args.scenario) {
        Ok(prepared) => prepared,
        Err(err) => return report_prepare_error(&err),
    };

    let config = scenario.simulation_config(TraceMode::Events);
    let result = match simulate_battle(attacker, defender, config, Rng::new(seed)) {
        Ok(result) => result,
        Err(err) => {
            eprintln!("simulation failed: {err}");
            return 1;
        }
    };
    tracing::info!(seed, turns = result.turns, outcome = %result.outcome, "battle resolved");

    if let Some(path) = &args.events_csv {
        if let Err(err) = write_csv(path, &result) {
            eprintln!("failed to write '{}': {err}", path.display());
            return 1;
        }
    }

    match args.format {
        OutputFormat::Json => {
            let output = SimulateOutput {
                seed,
                result: &result,
            };
            match serde_json::to_string_pretty(&output) {
                Ok(payload) => println!("{payload}"),
                Err(err) => {
                    eprintln!("failed to serialize simulation result: {err}");
                    return 1;
                }
            }
        }
        OutputFormat::Text => {
            println!("Seed: {seed}");
            if args.log {
                for event in &result.events {
                    println!("{event}");
                }
            }
            print!("{}", render_text(&result.report));
        }
    }
    0
}

fn write_csv(path: &Path, result: &SimulationResult) -> Result<(), Box<dyn std::error::Error>> {
    let file = File::create(path)?;
    write_events_csv(&result.events, BufWriter::new(file))?;
    Ok(())
}

fn handle_forecast(args: &ForecastArgs) -> i32 {
    let Prepared {
        scenario,
        seed,
        attacker,
        defender,
    } = match prepare(&args.scenario) {
        Ok(prepared) => prepared,
        Err(err) => return report_prepare_error(&err),
    };

    let config = scenario.simulation_config(TraceMode::Off);
    let summary = if args.sequential {
        run_forecast(&attacker, &defender, config, args.iterations, seed)
    } else {
        let pool = WorkerPool::with_workers(args.workers);
        run_forecast_batches(&attacker, &defender, config, args.iterations, seed, &pool)
    };
    let summary = match summary {
        Ok(summary) => summary,
        Err(err) => {
            eprintln!("forecast failed: {err}");
            return 1;
        }
    };

    match args.format {
        OutputFormat::Json => match serde_json::to_string_pretty(&summary) {
            Ok(payload) => println!("{payload}"),
            Err(err) => {
                eprintln!("failed to serialize forecast: {err}");
                return 1;
            }
        },
        OutputFormat::Text => print!("{}", render_forecast(&summary)),
    }
    0
}

fn render_forecast(summary: &ForecastSummary) -> String {
    let percent = |rate: f64| rate * 100.0;
    let mut out = format!(
        "--- Forecast: {} vs {} ---\nIterations: {} (base seed {})\n",
        summary.attacker_name, summary.defender_name, summary.iterations, summary.base_seed
    );
    for (name, side) in [
        (&summary.attacker_name, &summary.attacker),
        (&summary.defender_name, &summary.defender),
    ] {
        out.push_str(&format!(
            "{name}: wins {:.1}%, avg survivors {}, avg kills {}\n",
            percent(side.win_rate),
            side.avg_survivors.floor(),
            side.avg_kills.floor()
        ));
    }
    out.push_str(&format!(
        "Draws: {:.1}%\nDecided by turn limit: {}\nAverage turns: {:.2}\n",
        percent(summary.draw_rate),
        summary.turn_limit_reached,
        summary.avg_turns
    ));
    out
}

fn handle_validate(path: &Path) -> i32 {
    let report = match validate_scenario_file(path) {
        Ok(report) => report,
        Err(err) => {
            eprintln!("validation failed: {err}");
            return 1;
        }
    };
    for diag in &report.diagnostics {
        eprintln!("- {diag}");
    }
    if report.has_errors() {
        eprintln!(
            "validation failed: {} error(s), {} warning(s)",
            report.count(ValidationSeverity::Error),
            report.count(ValidationSeverity::Warning)
        );
        1
    } else {
        println!(
            "validation passed: {} ({} warning(s))",
            path.display(),
            report.count(ValidationSeverity::Warning)
        );
        0
    }
}

fn handle_sample() -> i32 {
    match sample_scenario().to_yaml() {
        Ok(yaml) => {
            print!("{yaml}");
            0
        }
        Err(err) => {
            eprintln!("failed to render sample scenario: {err}");
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_simulate_overrides() {
        let cli = Cli::try_parse_from(args(&[
            "battlecast",
            "simulate",
            "--seed",
            "7",
            "--max-turns",
            "12",
            "--format",
            "json",
        ]))
        .expect("valid arguments");
        let Command::Simulate(simulate) = cli.command else {
            panic!("expected simulate");
        };
        assert_eq!(simulate.scenario.seed, Some(7));
        assert_eq!(simulate.scenario.max_turns, Some(12));
        assert_eq!(simulate.format, OutputFormat::Json);
        assert!(simulate.scenario.scenario.is_none());
    }

    #[test]
    fn cli_seed_overrides_scenario_seed() {
        let prepared = prepare(&ScenarioArgs {
            scenario: None,
            seed: Some(99),
            max_turns: Some(3),
        })
        .expect("sample scenario resolves");
        assert_eq!(prepared.seed, 99);
        assert_eq!(prepared.scenario.max_turns, 3);
        assert_eq!(prepared.attacker.name, "Dave");
    }

    #[test]
    fn config_errors_surface_as_scenario_errors() {
        let path = std::env::temp_dir().join(format!(
            "battlecast-cli-bad-target-{}.yaml",
            std::process::id()
        ));
        let mut scenario = sample_scenario();
        scenario.defender.hero_skills[0].target = "Cavalry".to_string();
        let yaml = scenario.to_yaml().expect("sample serializes");
        std::fs::write(&path, yaml).expect("temp file should be writable");
        let err = prepare(&ScenarioArgs {
            scenario: Some(path.clone()),
            seed: Some(1),
            max_turns: None,
        })
        .expect_err("unknown skill target");
        let _ = std::fs::remove_file(&path);
        assert!(matches!(
            err,
            ScenarioError::Config(ConfigError::InvalidSkillTarget { .. })
        ));
        assert_eq!(report_prepare_error(&err), 1);
    }

    #[test]
    fn unknown_subcommand_is_a_usage_error() {
        assert_eq!(run_with_args(&args(&["battlecast", "serve"])), 2);
    }
}
