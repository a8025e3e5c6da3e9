use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use eval::{EvalConfig, RunStatus, harness};

#[derive(Parser)]
#[command(
    name = "eval_harness",
    about = "Evaluate a document review endpoint",
    args_conflicts_with_subcommands = true
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    run: RunArgs,
}

#[derive(Subcommand)]
enum Command {
    /// Submit documents and append results to the log (default)
    Run(RunArgs),
    /// Score an existing results log against a gold set
    Score {
        #[arg(long)]
        gold: PathBuf,
        /// Results log to read (defaults to EVAL_OUT)
        #[arg(long)]
        log: Option<PathBuf>,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Documents to evaluate; EVAL_GLOB is expanded when none are given
    files: Vec<PathBuf>,

    /// Score this run against a JSON Lines gold set
    #[arg(long)]
    gold: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = EvalConfig::from_env()?;

    let args = match cli.command {
        Some(Command::Run(args)) => args,
        Some(Command::Score { gold, log }) => {
            let log = log.unwrap_or_else(|| config.out_path.clone());
            harness::score(&gold, &log).await?;
            return Ok(ExitCode::SUCCESS);
        }
        None => cli.run,
    };

    match harness::run(&config, args.files, args.gold.as_deref()).await? {
        RunStatus::NoInputs { .. } => Ok(ExitCode::FAILURE),
        RunStatus::Completed { .. } => Ok(ExitCode::SUCCESS),
    }
}
