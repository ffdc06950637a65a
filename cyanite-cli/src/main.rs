//! CLI for querying a Cyanite metrics store.
//!
//! Resolves metric patterns and fetches series through `cyanite-finder`,
//! the same way a Graphite front-end would.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use cyanite_finder::{CyaniteFinder, FinderConfig, Node, SeriesReader, TimeRange};
use tracing_subscriber::EnvFilter;

/// cyanite - query a Cyanite metrics store.
#[derive(Parser)]
#[command(name = "cyanite", version, about)]
struct Cli {
    /// Cyanite base URL. Repeat to rotate requests across several hosts.
    #[arg(long = "url", global = true)]
    urls: Vec<String>,

    /// JSON configuration file with a `cyanite` section.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Tenant sent with every request.
    #[arg(long, global = true, default_value = "")]
    tenant: String,

    /// Request timeout in seconds. No timeout when omitted.
    #[arg(long, global = true)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Resolve a metric pattern into leaf and branch nodes.
    Find {
        /// Glob-style metric pattern (e.g., "servers.*.cpu").
        pattern: String,

        /// Output format.
        #[arg(long, default_value = "text")]
        format: FindFormat,
    },

    /// Fetch one series.
    Fetch {
        /// Metric path to fetch.
        path: String,

        /// Time range ending now (e.g., "1h", "30m", "7d").
        #[arg(long, default_value = "1h")]
        range: String,

        /// Output format.
        #[arg(long, default_value = "csv")]
        format: FetchFormat,
    },

    /// Fetch several series in a single request.
    FetchMulti {
        /// Metric paths to fetch.
        #[arg(required = true)]
        paths: Vec<String>,

        /// Time range ending now (e.g., "1h", "30m", "7d").
        #[arg(long, default_value = "1h")]
        range: String,
    },
}

/// Output format for path searches.
#[derive(Clone, ValueEnum)]
enum FindFormat {
    /// One node per line, prefixed with L (leaf) or B (branch).
    Text,
    /// JSON array of objects.
    Json,
}

/// Output format for single-series fetches.
#[derive(Clone, ValueEnum)]
enum FetchFormat {
    /// Comma-separated timestamp,value rows.
    Csv,
    /// JSON object with the time range and samples.
    Json,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = resolve_config(&cli.urls, cli.config.as_deref(), cli.timeout)?;
    let finder = CyaniteFinder::new(&config)?;
    tracing::debug!(hosts = ?finder.client().rotator().hosts(), "cyanite finder ready");

    match cli.command {
        Commands::Find { pattern, format } => cmd_find(&finder, &pattern, &cli.tenant, &format),
        Commands::Fetch {
            path,
            range,
            format,
        } => cmd_fetch(&finder, &path, &cli.tenant, &range, &format),
        Commands::FetchMulti { paths, range } => {
            cmd_fetch_multi(&finder, &paths, &cli.tenant, &range)
        }
    }
}

/// Builds the finder configuration from `--url`, `--config` and `--timeout`.
///
/// URLs given on the command line take precedence over the config file.
fn resolve_config(
    urls: &[String],
    config_path: Option<&Path>,
    timeout_secs: Option<u64>,
) -> Result<FinderConfig, Box<dyn std::error::Error>> {
    let mut config = if !urls.is_empty() {
        FinderConfig::from_urls(urls.iter().cloned())
    } else if let Some(path) = config_path {
        let data = std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read '{}': {e}", path.display()))?;
        let document: serde_json::Value = serde_json::from_str(&data)?;
        FinderConfig::from_section(&document)?
    } else {
        return Err("no cyanite hosts: pass --url or --config".into());
    };

    if let Some(secs) = timeout_secs {
        config = config.with_timeout(Duration::from_secs(secs));
    }

    Ok(config)
}

/// Implements `cyanite find <pattern>`.
fn cmd_find(
    finder: &CyaniteFinder,
    pattern: &str,
    tenant: &str,
    format: &FindFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let nodes: Vec<Node> = finder.find_nodes(pattern, tenant)?.collect();

    match format {
        FindFormat::Text => {
            for node in &nodes {
                let kind = if node.is_leaf() { 'L' } else { 'B' };
                println!("{kind} {}", node.path());
            }
        }
        FindFormat::Json => {
            let output: Vec<serde_json::Value> = nodes
                .iter()
                .map(|node| {
                    serde_json::json!({
                        "path": node.path(),
                        "leaf": node.is_leaf(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

/// Implements `cyanite fetch <path>`.
fn cmd_fetch(
    finder: &CyaniteFinder,
    path: &str,
    tenant: &str,
    range: &str,
    format: &FetchFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let (start, end) = time_window(range)?;
    let reader = SeriesReader::new(path, tenant, Arc::clone(finder.client()));
    let (time_range, values) = reader.fetch(start, end)?;

    match format {
        FetchFormat::Csv => {
            println!(
                "# path={path}, from={}, to={}, step={}, points={}",
                time_range.start,
                time_range.end,
                time_range.step,
                values.len()
            );
            println!("timestamp,value");
            for (ts, value) in timestamps(&time_range).zip(&values) {
                match value {
                    Some(v) => println!("{ts},{v}"),
                    None => println!("{ts},"),
                }
            }
        }
        FetchFormat::Json => {
            let output = serde_json::json!({
                "path": path,
                "time_range": time_range,
                "values": values,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

/// Implements `cyanite fetch-multi <path>...`.
fn cmd_fetch_multi(
    finder: &CyaniteFinder,
    paths: &[String],
    tenant: &str,
    range: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let (start, end) = time_window(range)?;
    let (time_range, series) = finder.fetch_paths(paths, tenant, start, end)?;

    let output = serde_json::json!({
        "time_range": time_range,
        "series": series,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}

/// Returns `(now - range, now)` in epoch seconds.
fn time_window(range: &str) -> Result<(i64, i64), Box<dyn std::error::Error>> {
    let range_secs = i64::try_from(parse_duration(range)?)?;
    let now = i64::try_from(
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)?
            .as_secs(),
    )?;
    Ok((now.saturating_sub(range_secs), now))
}

/// Timestamps of consecutive samples in `time_range`.
fn timestamps(time_range: &TimeRange) -> impl Iterator<Item = i64> {
    let start = time_range.start;
    let step = time_range.step.max(1);
    (0..).map(move |i: i64| start + i * step)
}

/// Parses a human-readable duration string (e.g., "1h", "30m", "7d") to seconds.
fn parse_duration(s: &str) -> Result<u64, Box<dyn std::error::Error>> {
    let s = s.trim();
    let Some((split, unit)) = s.char_indices().next_back() else {
        return Err("Empty duration string".into());
    };
    let num: u64 = s[..split].parse()?;

    let multiplier = match unit {
        's' => 1,
        'm' => 60,
        'h' => 3600,
        'd' => 86400,
        _ => return Err(format!("Unknown duration unit: '{unit}'. Use s, m, h, or d.").into()),
    };
    let secs = num.checked_mul(multiplier).ok_or("duration too large")?;

    Ok(secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("30s").unwrap(), 30);
        assert_eq!(parse_duration("5m").unwrap(), 300);
        assert_eq!(parse_duration("1h").unwrap(), 3600);
        assert_eq!(parse_duration(" 7d ").unwrap(), 604_800);
        assert!(parse_duration("").is_err());
        assert!(parse_duration("3w").is_err());
        assert!(parse_duration("h").is_err());
        assert!(parse_duration("1µ").is_err());
        assert!(parse_duration("5124095576030432h").is_err());
        assert_eq!(parse_duration("18446744073709551615s").unwrap(), u64::MAX);
    }

    #[test]
    fn test_time_window_spans_range() {
        let (start, end) = time_window("2h").unwrap();
        assert_eq!(end - start, 7200);
    }

    #[test]
    fn test_timestamps_follow_step() {
        let range = TimeRange::new(100, 130, 10);
        let ts: Vec<i64> = timestamps(&range).take(4).collect();
        assert_eq!(ts, vec![100, 110, 120, 130]);
    }

    #[test]
    fn test_cli_urls_win_over_config_file() {
        let config = resolve_config(
            &["http://h1".to_string(), "http://h2".to_string()],
            Some(Path::new("/nonexistent/config.json")),
            Some(10),
        )
        .unwrap();
        assert_eq!(config.hosts(), vec!["http://h1", "http://h2"]);
        assert_eq!(config.timeout(), Some(Duration::from_secs(10)));
    }

    #[test]
    fn test_config_file_section() {
        let path = std::env::temp_dir().join(format!("cyanite-cli-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"cyanite": {"url": "http://cyanite:8080/"}}"#).unwrap();

        let config = resolve_config(&[], Some(&path), None).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.hosts(), vec!["http://cyanite:8080/"]);
    }

    #[test]
    fn test_no_hosts_is_error() {
        assert!(resolve_config(&[], None, None).is_err());
    }
}
