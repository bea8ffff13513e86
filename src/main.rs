//! CPI Search - look up monthly Consumer Price Index values
//!
//! Resolves CPI values for a month across one or more BLS series, serving
//! from the local cache and backfilling it from the BLS API on a miss.

use std::process::ExitCode;

use clap::Parser;
use thiserror::Error;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use cpi_search::cache::{CacheManager, MemoryCache, RecordCache};
use cpi_search::cli::{fetch_series, lookup_request, year_range, AppConfig, CacheLocation, Cli, CliError, Command, MONTHS};
use cpi_search::data::{BlsClient, CpiRecord, SeriesRequest, UpstreamClient};
use cpi_search::{CpiRetriever, RetrievalError, UpstreamError};

/// Everything that can end a run unsuccessfully
#[derive(Debug, Error)]
enum RunError {
    #[error(transparent)]
    Cli(#[from] CliError),

    #[error(transparent)]
    Retrieval(#[from] RetrievalError),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error("Failed to write output: {0}")]
    Output(#[from] serde_json::Error),
}

impl RunError {
    /// Exit code 2 means the data does not exist; 1 covers everything else,
    /// usage errors included
    fn exit_code(&self) -> ExitCode {
        match self {
            RunError::Retrieval(RetrievalError::IncompleteData { .. }) => ExitCode::from(2),
            _ => ExitCode::FAILURE,
        }
    }
}

/// Installs the stderr log subscriber; `RUST_LOG` overrides the default filter
fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "cpi_search=debug" } else { "cpi_search=info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Resolves the request and prints the records as JSON
async fn lookup<C: RecordCache<CpiRecord>>(
    cache: C,
    upstream: BlsClient,
    config: &AppConfig,
    request: &SeriesRequest,
) -> Result<(), RunError> {
    let retriever = CpiRetriever::new(cache, upstream).with_fetch_timeout(config.request_timeout);
    let records = retriever.retrieve_request(request).await?;
    println!("{}", serde_json::to_string_pretty(&records)?);
    Ok(())
}

async fn run(cli: Cli) -> Result<(), RunError> {
    let config = AppConfig::from_cli(&cli);
    debug!(?config, "Starting cpi-search");

    let upstream = BlsClient::new()
        .with_base_url(config.api_url.clone())
        .with_timeout(config.request_timeout);

    match &cli.command {
        Command::Lookup {
            year,
            month,
            series,
        } => {
            let request = lookup_request(year, month, series)?;
            match &config.cache {
                CacheLocation::Disk(dir) => {
                    lookup(CacheManager::with_dir(dir.clone()), upstream, &config, &request).await
                }
                CacheLocation::Memory => {
                    lookup(MemoryCache::<CpiRecord>::new(), upstream, &config, &request).await
                }
            }
        }
        Command::Fetch {
            start_year,
            end_year,
            series,
        } => {
            let (start, end) = year_range(start_year, end_year.as_deref())?;
            let series = fetch_series(series)?;
            let body = upstream.fetch_year(&series, &start, &end).await?;
            println!("{}", body);
            Ok(())
        }
        Command::Months => {
            for month in MONTHS {
                println!("{}", month);
            }
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // clap exits with 2 on usage errors, which is reserved for missing data
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return if err.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {}", err);
            err.exit_code()
        }
    }
}
