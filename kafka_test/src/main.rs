//! Compatibility suite runner
//!
//! Verifies the endpoint is reachable, runs the selected scenarios and
//! reports the outcome.
//!
//! ## Exit Codes
//!
//! - 0: All scenarios passed (or were skipped)
//! - 1: One or more scenarios failed
//! - 2: The endpoint could not be reached

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use gateway_compat::results::StatusFile;
use kafka_test::suite::{self, TestType};
use kafka_test::{verify_server_ready, SuiteConfig};
use tracing::{error, info, warn};

const FAILURE_BROKER_UNREACHABLE: &str = "BROKER_UNREACHABLE";
const FAILURE_TEST_FAILURES: &str = "TEST_FAILURES";

#[derive(Parser)]
#[command(name = "kafka_test")]
#[command(about = "Run Kafka version-compatibility scenarios against a live endpoint")]
struct Cli {
    /// Bootstrap servers (overrides BOOTSTRAP_SERVERS)
    bootstrap: Option<String>,

    /// Scenario or scenario group to run
    #[arg(value_enum, default_value_t = TestType::All)]
    test_type: TestType,

    /// Print the results as JSON instead of the summary
    #[arg(long)]
    json: bool,

    /// Write a setup-status file for the report collector
    #[arg(long, value_name = "PATH")]
    status_file: Option<PathBuf>,

    /// Verbose output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn write_status(path: Option<&Path>, status: StatusFile) {
    let Some(path) = path else {
        return;
    };
    match status.write_to(path) {
        Ok(()) => info!(path = %path.display(), failure_type = %status.failure_type, "Status file written"),
        Err(e) => warn!(path = %path.display(), error = %e, "Failed to write status file"),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    gateway_compat::logging::init(cli.verbose);

    let config = SuiteConfig::new(cli.bootstrap);
    info!(
        bootstrap = %config.bootstrap_servers,
        security = %config.security.protocol(),
        scenario = %cli.test_type,
        "Starting compatibility suite"
    );

    if let Err(e) = verify_server_ready(&config).await {
        error!(error = %e, "Endpoint is not reachable");
        write_status(
            cli.status_file.as_deref(),
            StatusFile::failed(
                FAILURE_BROKER_UNREACHABLE,
                format!("{} unreachable: {}", config.bootstrap_servers, e),
            ),
        );
        return ExitCode::from(2);
    }

    let results = suite::run(&config, cli.test_type).await;

    if cli.json {
        match results.to_json() {
            Ok(json) => println!("{}", json),
            Err(e) => error!(error = %e, "Failed to serialize results"),
        }
    } else {
        results.print_summary();
    }

    let status = if results.all_passed() {
        StatusFile::success(format!(
            "{} scenarios passed, {} skipped",
            results.passed, results.skipped
        ))
    } else {
        StatusFile::failed(
            FAILURE_TEST_FAILURES,
            format!("{} of {} scenarios failed", results.failed, results.total()),
        )
    };
    write_status(cli.status_file.as_deref(), status);

    if results.all_passed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}
