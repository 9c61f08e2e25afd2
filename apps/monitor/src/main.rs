//! upcheck - a CLI tool to test whether websites and services are
//! reachable, on demand or on a fixed cadence.

mod config;
mod error;
mod history;
mod monitoring;
mod report;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::config::{DEFAULT_INTERVAL_SECONDS, DEFAULT_TIMEOUT_SECONDS, Endpoint, Registry};
use crate::error::AppError;
use crate::history::{CsvHistory, HistoryRow, HistoryStore};
use crate::monitoring::checker::HttpChecker;
use crate::monitoring::{CadenceDriver, ProbeExecutor, ProbeOutcome, ProbeScheduler};

#[derive(Parser)]
#[command(name = "upcheck")]
#[command(about = "Monitor website and service availability")]
#[command(version)]
struct Cli {
    /// Path to the endpoint registry file
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Path to the probe history log
    #[arg(long, global = true, value_name = "PATH")]
    history_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a new endpoint
    AddEndpoint {
        /// Name of the endpoint
        name: String,
        /// URL of the endpoint
        url: String,
        /// Request timeout in seconds
        #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECONDS)]
        timeout: u64,
    },
    /// Probe all or selected endpoints once
    Fetch {
        /// Probe only the named endpoints
        #[arg(long, num_args = 1..)]
        endpoints: Option<Vec<String>>,
        /// Render the probe results as a table
        #[arg(long)]
        output: bool,
    },
    /// Probe endpoints continuously until interrupted
    Live {
        /// Seconds to wait between probe cycles
        #[arg(long, default_value_t = DEFAULT_INTERVAL_SECONDS)]
        interval: u64,
        /// Probe only the named endpoints
        #[arg(long, num_args = 1..)]
        endpoints: Option<Vec<String>>,
        /// Render each cycle's results as a table
        #[arg(long)]
        output: bool,
    },
    /// Show previously recorded probe results
    History {
        /// Show history for the named endpoints only
        #[arg(long, num_args = 1..)]
        endpoints: Option<Vec<String>>,
    },
}

#[tokio::main]
async fn main() {
    logger::init();

    if let Err(err) = run(Cli::parse()).await {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let config_path = match cli.config {
        Some(path) => path,
        None => config::default_config_path()?,
    };
    let history_path = match cli.history_file {
        Some(path) => path,
        None => config::default_history_path()?,
    };

    match cli.command {
        Commands::AddEndpoint { name, url, timeout } => {
            add_endpoint(&config_path, name, url, timeout)
        }
        Commands::Fetch { endpoints, output } => {
            fetch(&config_path, &history_path, endpoints.as_deref(), output).await
        }
        Commands::Live { interval, endpoints, output } => {
            live(&config_path, &history_path, interval, endpoints.as_deref(), output).await
        }
        Commands::History { endpoints } => show_history(&history_path, endpoints.as_deref()).await,
    }
}

fn add_endpoint(
    config_path: &Path,
    name: String,
    url: String,
    timeout: u64,
) -> Result<(), AppError> {
    validate_endpoint_url(&url)?;
    if timeout == 0 {
        return Err(AppError::InvalidTimeout);
    }

    let mut registry = Registry::load(config_path)?;
    if !registry.add(name.clone(), url.clone(), timeout) {
        return Err(AppError::DuplicateEndpoint { name });
    }
    registry.save(config_path)?;

    println!("Added endpoint: {name} ({url}) with timeout {timeout}s");
    Ok(())
}

async fn fetch(
    config_path: &Path,
    history_path: &Path,
    filter: Option<&[String]>,
    output: bool,
) -> Result<(), AppError> {
    let registry = Registry::load(config_path)?;
    let Some(selection) = select_or_report(&registry, filter) else {
        return Ok(());
    };

    let scheduler = build_scheduler(history_path)?;
    let outcomes = scheduler.run_cycle(selection).await;

    if output {
        print_outcomes(&outcomes);
    }

    Ok(())
}

async fn live(
    config_path: &Path,
    history_path: &Path,
    interval: u64,
    filter: Option<&[String]>,
    output: bool,
) -> Result<(), AppError> {
    let registry = Registry::load(config_path)?;
    if select_or_report(&registry, filter).is_none() {
        return Ok(());
    }

    let scheduler = build_scheduler(history_path)?;

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            interrupt.cancel();
        }
    });

    let (cycle_tx, mut cycle_rx) = mpsc::channel::<Vec<ProbeOutcome>>(1);
    let printer = tokio::spawn(async move {
        while let Some(outcomes) = cycle_rx.recv().await {
            if output {
                print_outcomes(&outcomes);
            }
        }
    });

    println!("Starting live monitoring with interval {interval}s. Press Ctrl+C to stop.");

    let driver = CadenceDriver::new(scheduler, Duration::from_secs(interval), cycle_tx);
    driver.run(&registry, filter, cancel).await;

    drop(driver);
    printer.await.ok();

    println!("\nLive monitoring stopped");
    Ok(())
}

async fn show_history(history_path: &Path, filter: Option<&[String]>) -> Result<(), AppError> {
    if !history_path.exists() {
        println!("No history available yet");
        return Ok(());
    }

    let store = CsvHistory::new(history_path.to_path_buf());
    let rows = store.read_all(filter).await?;
    println!("{}", report::render(&rows));

    Ok(())
}

/// Snapshot the endpoints a command should probe, reporting why when
/// there is nothing to do.
fn select_or_report(
    registry: &Registry,
    filter: Option<&[String]>,
) -> Option<BTreeMap<String, Endpoint>> {
    if registry.is_empty() {
        println!("No endpoints configured. Use 'add-endpoint' to add some.");
        return None;
    }

    let selection = registry.select(filter);
    if selection.is_empty() {
        println!("No matching endpoints found");
        return None;
    }

    Some(selection)
}

fn build_scheduler(history_path: &Path) -> Result<Arc<ProbeScheduler>, AppError> {
    let checker =
        Arc::new(HttpChecker::new().map_err(|source| AppError::Client { source })?);
    let executor = Arc::new(ProbeExecutor::new(checker));
    let sink: Arc<dyn HistoryStore> = Arc::new(CsvHistory::new(history_path.to_path_buf()));

    Ok(Arc::new(ProbeScheduler::new(executor, sink)))
}

fn print_outcomes(outcomes: &[ProbeOutcome]) {
    let rows: Vec<HistoryRow> = outcomes.iter().map(HistoryRow::from).collect();
    println!("{}", report::render(&rows));
}

/// Endpoints must be http(s) URLs with a host.
fn validate_endpoint_url(raw: &str) -> Result<(), AppError> {
    let url = Url::parse(raw)
        .map_err(|err| AppError::InvalidUrl { url: raw.to_owned(), reason: err.to_string() })?;

    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(AppError::InvalidUrl {
                url: raw.to_owned(),
                reason: format!("unsupported scheme '{other}'"),
            });
        }
    }

    if url.host_str().is_none() {
        return Err(AppError::InvalidUrl { url: raw.to_owned(), reason: "missing host".into() });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_and_https_urls_are_accepted() {
        assert!(validate_endpoint_url("http://example.com").is_ok());
        assert!(validate_endpoint_url("https://example.com:8443/health").is_ok());
    }

    #[test]
    fn other_schemes_are_rejected() {
        assert!(matches!(
            validate_endpoint_url("ftp://example.com"),
            Err(AppError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn unparseable_urls_are_rejected() {
        assert!(matches!(
            validate_endpoint_url("not a url"),
            Err(AppError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn duplicate_endpoint_is_reported_without_mutation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        add_endpoint(&path, "svc".into(), "http://x.example.com".into(), 5).unwrap();
        let err =
            add_endpoint(&path, "svc".into(), "http://y.example.com".into(), 9).unwrap_err();
        assert!(matches!(err, AppError::DuplicateEndpoint { .. }));

        let registry = Registry::load(&path).unwrap();
        assert_eq!(
            registry.get("svc"),
            Some(&Endpoint { url: "http://x.example.com".into(), timeout: 5 })
        );
    }
}
