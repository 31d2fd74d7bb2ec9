use crate::infra::parse_date;
use crate::server;
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use fieldscore::error::AppError;
use fieldscore::workflows::scorecard::config::ScorecardConfig;
use fieldscore::workflows::scorecard::metrics::{sample_snapshot, MetricsSnapshot};
use fieldscore::workflows::scorecard::{AgentScorecard, ScorecardEngine};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Field Agent Scorecard Service",
    about = "Score field agents against their business objectives and serve the results over HTTP",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Score one agent from a snapshot file and print the scorecard
    Score(ScoreArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// Agent identifier to tag the scorecard with
    #[arg(long, default_value = "FA-1001")]
    agent: String,
    /// Scoring date as YYYY-MM-DD (defaults to today)
    #[arg(long, value_parser = parse_date)]
    date: Option<NaiveDate>,
    /// JSON metrics snapshot file; omit to score the bundled sample
    #[arg(long)]
    metrics: Option<PathBuf>,
    /// Scorecard rules file; omit for the built-in defaults
    #[arg(long)]
    config: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Score(args) => run_score(args),
    }
}

fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let config = match &args.config {
        Some(path) => ScorecardConfig::from_path(path)?,
        None => ScorecardConfig::default(),
    };

    let snapshot: MetricsSnapshot = match &args.metrics {
        Some(path) => {
            let raw = std::fs::read_to_string(path)?;
            serde_json::from_str(&raw).map_err(AppError::Snapshot)?
        }
        None => sample_snapshot(),
    };

    let date = args.date.unwrap_or_else(|| Local::now().date_naive());
    let engine = ScorecardEngine::new(config);
    let scorecard = AgentScorecard {
        agent_id: args.agent,
        date,
        outcome: engine.evaluate(&snapshot),
    };

    let rendered = serde_json::to_string_pretty(&scorecard.view()).map_err(AppError::Snapshot)?;
    println!("{rendered}");
    Ok(())
}
