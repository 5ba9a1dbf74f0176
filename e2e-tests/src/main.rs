use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

mod reference;
mod test_suite;
mod tests;

use tests::run_tests;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// MySQL connection string, falls back to DATABASE_URL
    #[arg(long)]
    database_url: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Specific tests to run (comma-separated). If not provided, runs all tests.
    #[arg(long)]
    tests: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::from_filename(".env");

    let args = Args::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    fmt().with_env_filter(filter).with_target(true).init();

    let database_url = args.database_url.unwrap_or_else(bulk_update::connection_string);

    info!("Starting bulk update E2E Test Suite");

    let test_names = args.tests.map(|t| t.split(',').map(|s| s.trim().to_string()).collect());

    match run_tests(database_url, test_names).await {
        Ok(_) => {
            info!("Test suite completed successfully");
        }
        Err(e) => {
            error!("Test suite failed: {}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}
