use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use gateway_compat::constants::FAILURE_TYPE_NONE;
use gateway_compat::{
    api_keys, logging, metrics, report, Combination, CompatibilityMatrix, MetricsSnapshot,
    ReportConfig, ResultsCollector, StatusFile,
};

#[derive(Parser)]
#[command(name = "compat-report")]
#[command(about = "Kafka client/server compatibility report tool", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (-v for debug, -vv for trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Build reports from a results directory
    Report {
        /// Directory holding *_metrics.txt and *_status.txt files
        results_dir: Option<PathBuf>,

        /// Where to write the reports (defaults to the results directory)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Scrape gateway metrics once and store them for a combination
    Scrape {
        #[arg(long)]
        client_version: String,

        #[arg(long)]
        server_version: String,

        #[arg(long)]
        results_dir: Option<PathBuf>,

        /// Overrides METRICS_URL
        #[arg(long)]
        metrics_url: Option<String>,
    },

    /// Record the setup outcome for a combination
    Status {
        #[arg(long)]
        client_version: String,

        #[arg(long)]
        server_version: String,

        /// NONE for a clean setup, otherwise a short failure category
        #[arg(long, default_value = FAILURE_TYPE_NONE)]
        failure_type: String,

        #[arg(long, default_value = "")]
        message: String,

        #[arg(long)]
        results_dir: Option<PathBuf>,
    },

    /// Print the API key reference table
    ApiKeys,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let mut config = ReportConfig::load();

    match cli.command {
        Commands::Report {
            results_dir,
            output_dir,
        } => {
            if let Some(dir) = results_dir {
                config.results_dir = dir;
            }
            config.output_dir = output_dir;
            run_report(&config)?;
        }
        Commands::Scrape {
            client_version,
            server_version,
            results_dir,
            metrics_url,
        } => {
            if let Some(dir) = results_dir {
                config.results_dir = dir;
            }
            if let Some(url) = metrics_url {
                config.metrics_url = url;
            }
            let combination = Combination::new(client_version, server_version);
            run_scrape(&config, &combination).await?;
        }
        Commands::Status {
            client_version,
            server_version,
            failure_type,
            message,
            results_dir,
        } => {
            if let Some(dir) = results_dir {
                config.results_dir = dir;
            }
            let combination = Combination::new(client_version, server_version);
            let status = if failure_type == FAILURE_TYPE_NONE {
                StatusFile::success(message)
            } else {
                StatusFile::failed(failure_type, message)
            };
            let path = config.results_dir.join(combination.status_file_name());
            status
                .write_to(&path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!(path = %path.display(), "Status recorded");
        }
        Commands::ApiKeys => {
            println!("{:<30} | {:<8}", "API_NAME", "API_INT");
            println!("{}", "-".repeat(41));
            for (name, key) in api_keys::all() {
                println!("{:<30} | {:<8}", name, key);
            }
        }
    }

    Ok(())
}

fn run_report(config: &ReportConfig) -> Result<()> {
    let mut collector = ResultsCollector::new();
    collector
        .process_dir(&config.results_dir)
        .with_context(|| format!("Failed to process {}", config.results_dir.display()))?;

    if collector.records().is_empty() {
        warn!(dir = %config.results_dir.display(), "No results to process");
        return Ok(());
    }

    let paths = report::write_all(collector.records(), config.output_dir())
        .context("Failed to write reports")?;

    report::print_summary(&CompatibilityMatrix::build(collector.records()));

    println!("\nReports generated:");
    println!("  Summary:       {}", paths.summary.display());
    println!("  Detailed CSV:  {}", paths.detailed_csv.display());
    println!("  API Reference: {}", paths.api_reference.display());
    println!("  JSON Report:   {}", paths.json.display());
    Ok(())
}

async fn run_scrape(config: &ReportConfig, combination: &Combination) -> Result<()> {
    info!(url = %config.metrics_url, %combination, "Scraping gateway metrics");
    let text = metrics::scrape(&config.metrics_url, config.scrape_timeout)
        .await
        .with_context(|| format!("Failed to scrape {}", config.metrics_url))?;

    std::fs::create_dir_all(&config.results_dir)
        .with_context(|| format!("Failed to create {}", config.results_dir.display()))?;
    let path = config.results_dir.join(combination.metrics_file_name());
    std::fs::write(&path, &text).with_context(|| format!("Failed to write {}", path.display()))?;

    let snapshot = MetricsSnapshot::parse(&text);
    let usage = snapshot.api_usage();

    println!("\nAPI usage for {}:", combination);
    println!("{:<30} | {:<8} | {:<8} | REQUESTS", "API_NAME", "API_INT", "VERSION");
    println!("{}", "-".repeat(64));
    for api in &usage {
        println!(
            "{:<30} | {:<8} | {:<8} | {}",
            api.api_key,
            api_keys::api_key_display(&api.api_key),
            api.api_version,
            api.request_count
        );
    }
    println!(
        "\nClient errors: {}  Upstream errors: {}",
        snapshot.client_errors(),
        snapshot.upstream_errors()
    );

    info!(path = %path.display(), apis = usage.len(), "Metrics saved");
    Ok(())
}
