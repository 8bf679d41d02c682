// Modbot CLI
// LLM-powered comment moderation over CSV/JSON comment files

use anyhow::Context;
use clap::Parser;
use modbot::services::config_store::RunConfig;
use modbot::services::moderation::pipeline::run_moderation;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;

#[derive(Parser, Debug)]
#[command(name = "modbot", version, about = "LLM-powered comment moderation")]
struct Cli {
    /// Input file path (.csv or .json)
    input_path: PathBuf,

    /// Output directory path
    #[arg(long = "output_dir", default_value = ".")]
    output_dir: PathBuf,

    /// Model identifier override
    #[arg(long)]
    model: Option<String>,

    /// Comments per API call
    #[arg(long = "batch_size")]
    batch_size: Option<usize>,

    /// Seconds to pause between batches
    #[arg(long = "batch_pause")]
    batch_pause: Option<u64>,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Pull in a local .env before anything reads the environment.
    let _ = dotenvy::dotenv();
    modbot::init_logging();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = RunConfig::resolve(cli.model, cli.batch_size, cli.batch_pause)?;

    let summary = run_moderation(&config, &cli.input_path, &cli.output_dir)
        .await
        .with_context(|| format!("moderation run failed for {}", cli.input_path.display()))?;

    println!(
        "Moderated {} comments: {} offensive, {} unresolved",
        summary.total, summary.offensive, summary.unresolved
    );
    println!("Moderated CSV: {}", summary.outputs.csv.display());
    println!("Report: {}", summary.outputs.report.display());
    match &summary.outputs.chart {
        Some(path) => println!("Pie chart: {}", path.display()),
        None => println!("Pie chart: skipped"),
    }
    Ok(())
}
