//! RAG evaluation CLI

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Local;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use rag_eval::{
    analysis::{Judge, ScorerRegistry, Summary},
    config::{Config, FailurePolicy, ScoringMode},
    data::load_examples_from_csv,
    providers::create_client,
    reporting::{print_console_report, write_markdown_summary, write_results_csv, JsonSummary},
    runner::{BatchRunner, ConsoleProgress},
};

#[derive(Parser)]
#[command(name = "rag-eval")]
#[command(about = "Evaluate RAG outputs on weighted quality dimensions")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Score every row of an evaluation CSV.
    ///
    /// An input without rows writes no detailed CSV, only a zero summary.
    Run {
        /// Path to the input RAG evaluation CSV
        #[arg(long = "csv")]
        csv_path: PathBuf,

        /// Scoring mode: "heuristic" for rule-based, "external" (or "llm") for model-based
        #[arg(short, long)]
        mode: Option<String>,

        /// Seed recorded with the run for reproducibility
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Reports directory (default from config: reports/)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Record failed rows and keep going instead of aborting
        #[arg(long)]
        best_effort: bool,
    },

    /// Generate sample configuration
    InitConfig {
        /// Output path for configuration file
        #[arg(short, long, default_value = "config/rag-eval.toml")]
        output: PathBuf,
    },

    /// List the scoring dimensions
    ListScorers,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("rag_eval=debug,info")
    } else {
        EnvFilter::new("rag_eval=info,warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .init();

    // API keys may live in a local .env file
    let _ = dotenvy::dotenv();

    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::load_or_default(),
    };

    match cli.command {
        Commands::Run {
            csv_path,
            mode,
            seed,
            output,
            best_effort,
        } => {
            run_evaluation(&config, csv_path, mode, seed, output, best_effort).await?;
        }

        Commands::InitConfig { output } => {
            init_config(output)?;
        }

        Commands::ListScorers => {
            list_scorers()?;
        }
    }

    Ok(())
}

async fn run_evaluation(
    config: &Config,
    csv_path: PathBuf,
    mode_arg: Option<String>,
    seed: u64,
    output_dir: Option<PathBuf>,
    best_effort: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let timestamp = Local::now().format("%Y-%m-%d_%H-%M-%S").to_string();

    let mode: ScoringMode = mode_arg
        .as_deref()
        .unwrap_or(config.judge.mode.as_str())
        .parse()?;
    let policy = if best_effort {
        FailurePolicy::BestEffort
    } else {
        config.failure_policy()?
    };

    println!("=== RAG Evaluation ===");
    println!("Run:    {}", timestamp);
    println!("Mode:   {}", mode);
    println!("Policy: {}", policy);
    println!("Seed:   {}", seed);
    println!();

    let registry = ScorerRegistry::standard()?;
    let client = create_client(mode, &config.client)?;
    let judge = Judge::new(&registry, mode, client)?;

    let examples = load_examples_from_csv(&csv_path)?;
    if examples.is_empty() {
        tracing::warn!("No examples in {}", csv_path.display());
    }
    println!("Examples: {}", examples.len());

    let runner = BatchRunner::new(judge, policy).with_progress(Arc::new(ConsoleProgress));
    let outcomes = runner.run(&examples).await?;
    let summary = Summary::from_outcomes(&registry, &outcomes);

    print_console_report(&summary);

    let reports_dir = output_dir.unwrap_or_else(|| PathBuf::from(&config.output.reports_dir));
    std::fs::create_dir_all(&reports_dir)?;

    let csv_name = format!("{}_evaluated.csv", timestamp);
    let csv_out = reports_dir.join(&csv_name);
    if outcomes.is_empty() {
        println!("\nNo results to save to {}.", csv_out.display());
    } else {
        write_results_csv(&csv_out, &registry, &outcomes)?;
        println!("\nDetailed results written to: {}", csv_out.display());
    }

    let md_out = reports_dir.join(format!("{}_summary.md", timestamp));
    write_markdown_summary(&md_out, &summary, &timestamp)?;
    println!("Summary report written to: {}", md_out.display());

    if config.output.write_json {
        let json_out = reports_dir.join(format!("{}_summary.json", timestamp));
        JsonSummary::from_summary(&timestamp, mode.as_str(), seed, &summary, csv_name)
            .write_to_file(&json_out)?;
        println!("JSON summary written to: {}", json_out.display());
    }

    if summary.failed > 0 {
        tracing::warn!("{} of {} examples could not be scored", summary.failed, summary.total);
    }

    Ok(())
}

fn init_config(output: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::default();

    // Ensure parent directory exists
    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)?;
    }

    config.save_toml(&output)?;
    println!("Configuration written to: {}", output.display());
    Ok(())
}

fn list_scorers() -> Result<(), Box<dyn std::error::Error>> {
    let registry = ScorerRegistry::standard()?;

    println!("Scoring Dimensions ({}):", registry.len());
    println!("{:-<50}", "");

    for def in registry.iter() {
        println!("  {:<22} | max {} | weight {:.2}", def.name, def.max_raw, def.weight);
    }

    println!("{:-<50}", "");
    println!("  {:<22} |       | weight {:.2}", "Total", registry.weight_sum());
    Ok(())
}
