//! Command-line interface parsing for CPI Search
//!
//! This module handles parsing of CLI arguments using clap, validation of the
//! year and month arguments, and derivation of the runtime configuration.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use thiserror::Error;

use crate::cache::CacheManager;
use crate::data::bls::{BLS_API_URL, DEFAULT_REQUEST_TIMEOUT};
use crate::data::SeriesRequest;

/// Month names as the BLS API reports them in `periodName`
pub const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Error types for CLI argument validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CliError {
    /// The month argument is not a recognizable month
    #[error("Invalid month: '{0}'. Use a month name (March), abbreviation (Mar) or number (3)")]
    InvalidMonth(String),

    /// The year argument is not a four-digit year
    #[error("Invalid year: '{0}'. Expected a four-digit year such as 2023")]
    InvalidYear(String),

    /// The end year precedes the start year
    #[error("Invalid year range: end year {end} is before start year {start}")]
    InvalidYearRange { start: String, end: String },

    /// Every series argument was blank
    #[error("No series IDs given")]
    NoSeries,
}

/// CPI Search - look up monthly Consumer Price Index values
#[derive(Parser, Debug)]
#[command(name = "cpi-search")]
#[command(about = "Look up monthly CPI values from the BLS API with a local cache")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Directory for cached CPI records (defaults to the user cache directory)
    #[arg(long, global = true, env = "CPI_SEARCH_CACHE_DIR", value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Keep cached records in memory only, for this run
    #[arg(long, global = true)]
    pub no_disk_cache: bool,

    /// BLS timeseries endpoint
    #[arg(long, global = true, env = "BLS_API_URL", default_value = BLS_API_URL, value_name = "URL")]
    pub api_url: String,

    /// Upper bound on each BLS API call, in seconds
    #[arg(long, global = true, default_value_t = DEFAULT_REQUEST_TIMEOUT.as_secs(), value_name = "SECS")]
    pub timeout_secs: u64,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Look up CPI values for one month, using the cache when possible
    ///
    /// Examples:
    ///   cpi-search lookup --year 2023 --month March --series CUUR0000SA0
    ///   cpi-search lookup --year 2023 --month 3 --series CUUR0000SA0,CUUR0000SA0L1E
    Lookup {
        /// Four-digit year
        #[arg(long)]
        year: String,

        /// Month name, three-letter abbreviation, or number 1-12
        #[arg(long)]
        month: String,

        /// Series IDs to look up
        #[arg(long = "series", value_name = "SERIES_ID", required = true, num_args = 1.., value_delimiter = ',')]
        series: Vec<String>,
    },

    /// Fetch the raw BLS API payload for a year range, bypassing the cache
    Fetch {
        /// First year of the range
        #[arg(long)]
        start_year: String,

        /// Last year of the range (defaults to the start year)
        #[arg(long)]
        end_year: Option<String>,

        /// Series IDs to fetch
        #[arg(long = "series", value_name = "SERIES_ID", required = true, num_args = 1.., value_delimiter = ',')]
        series: Vec<String>,
    },

    /// List accepted month names
    Months,
}

/// Where CPI records are cached for this run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLocation {
    /// JSON files under this directory
    Disk(PathBuf),
    /// Process memory only
    Memory,
}

/// Runtime configuration derived from CLI arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub cache: CacheLocation,
    pub api_url: String,
    pub request_timeout: Duration,
    pub verbose: bool,
}

impl AppConfig {
    /// Creates an AppConfig from parsed CLI arguments.
    ///
    /// Falls back to an in-memory cache when no cache directory was given and
    /// none can be determined for the current user.
    pub fn from_cli(cli: &Cli) -> Self {
        let cache = if cli.no_disk_cache {
            CacheLocation::Memory
        } else if let Some(dir) = &cli.cache_dir {
            CacheLocation::Disk(dir.clone())
        } else {
            match CacheManager::new() {
                Some(manager) => CacheLocation::Disk(manager.cache_dir().to_path_buf()),
                None => CacheLocation::Memory,
            }
        };

        Self {
            cache,
            api_url: cli.api_url.clone(),
            request_timeout: Duration::from_secs(cli.timeout_secs),
            verbose: cli.verbose,
        }
    }
}

/// Parses a month argument into the upstream month name.
///
/// Accepts full names and three-letter abbreviations in any case, and the
/// numbers 1-12 (with or without a leading zero).
pub fn parse_month_arg(s: &str) -> Result<&'static str, CliError> {
    let trimmed = s.trim();

    if let Ok(number) = trimmed.parse::<usize>() {
        return match number {
            1..=12 => Ok(MONTHS[number - 1]),
            _ => Err(CliError::InvalidMonth(s.to_string())),
        };
    }

    let lower = trimmed.to_lowercase();
    MONTHS
        .iter()
        .find(|name| {
            let name = name.to_lowercase();
            name == lower || (lower.len() == 3 && name.starts_with(&lower))
        })
        .copied()
        .ok_or_else(|| CliError::InvalidMonth(s.to_string()))
}

/// Validates a four-digit year argument.
pub fn parse_year_arg(s: &str) -> Result<String, CliError> {
    let trimmed = s.trim();
    if trimmed.len() == 4 && trimmed.chars().all(|c| c.is_ascii_digit()) {
        Ok(trimmed.to_string())
    } else {
        Err(CliError::InvalidYear(s.to_string()))
    }
}

/// Trims series arguments and drops blank ones, e.g. from `--series X,,Y`
fn clean_series(series: &[String]) -> impl Iterator<Item = &str> {
    series.iter().map(|id| id.trim()).filter(|id| !id.is_empty())
}

/// Validates a lookup's arguments and builds the request.
pub fn lookup_request(year: &str, month: &str, series: &[String]) -> Result<SeriesRequest, CliError> {
    let year = parse_year_arg(year)?;
    let month = parse_month_arg(month)?;
    Ok(SeriesRequest::new(year, month, clean_series(series)))
}

/// Cleans a fetch's series arguments, keeping their order and dropping repeats.
pub fn fetch_series(series: &[String]) -> Result<Vec<String>, CliError> {
    let mut ids: Vec<String> = Vec::new();
    for id in clean_series(series) {
        if !ids.iter().any(|seen| seen == id) {
            ids.push(id.to_string());
        }
    }
    if ids.is_empty() {
        return Err(CliError::NoSeries);
    }
    Ok(ids)
}

/// Validates a fetch's year range, defaulting the end year to the start year.
pub fn year_range(start_year: &str, end_year: Option<&str>) -> Result<(String, String), CliError> {
    let start = parse_year_arg(start_year)?;
    let end = match end_year {
        Some(end) => parse_year_arg(end)?,
        None => start.clone(),
    };
    // Four-digit years order the same lexically and numerically
    if end < start {
        return Err(CliError::InvalidYearRange { start, end });
    }
    Ok((start, end))
}
