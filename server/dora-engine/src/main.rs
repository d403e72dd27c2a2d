//! Binary entrypoint: read one JSON snapshot, write one JSON report to stdout.
//!
//! The snapshot comes from `--input` or stdin. Diagnostics go to stderr.

use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, Level};

use dora_engine::timestamp::parse_reference;
use dora_engine::{report, Config, MatchStrategy, ReleaseSelection, RunOptions, Snapshot, SystemClock};

#[derive(Parser)]
#[command(name = "dora-engine")]
#[command(about = "Compute DORA metrics from a snapshot of releases, pulls, commits and issues")]
struct Cli {
  /// Snapshot file; stdin when omitted.
  #[arg(long)]
  input: Option<PathBuf>,

  /// Reference time (RFC 3339 or YYYY-MM-DD); wall clock when omitted.
  #[arg(long)]
  now: Option<String>,

  /// Lead time counts only pulls titled feat/fix.
  #[arg(long, action)]
  filtered: bool,

  /// Include each metric's event log in the report.
  #[arg(long, action)]
  logging: bool,

  /// Deploying release is the earliest one after the merge, not the first listed.
  #[arg(long, action)]
  earliest_release: bool,

  /// Match repositories by whole URL path segment instead of substring.
  #[arg(long, action)]
  exact_repo_match: bool,

  #[arg(short, long, action = clap::ArgAction::Count)]
  verbose: u8,

  #[arg(short, long, action)]
  quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
  let cli = Cli::parse();

  let log_level = if cli.quiet {
    Level::ERROR
  } else {
    match cli.verbose {
      0 => Level::WARN,
      1 => Level::INFO,
      2 => Level::DEBUG,
      _ => Level::TRACE,
    }
  };
  tracing_subscriber::fmt()
    .with_max_level(log_level)
    .with_writer(io::stderr)
    .init();

  let raw = match &cli.input {
    Some(path) => std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?,
    None => {
      let mut raw = String::new();
      io::stdin().lock().read_to_string(&mut raw).context("reading stdin")?;
      raw
    }
  };
  let snapshot: Snapshot = serde_json::from_str(&raw).context("parsing snapshot")?;
  debug!(
    releases = snapshot.releases.len(),
    pulls = snapshot.pulls.len(),
    issues = snapshot.issues.as_ref().map(|i| i.len()),
    "snapshot loaded"
  );

  let now = cli.now.as_deref().map(parse_reference).transpose()?;
  let config = Config {
    release_selection: if cli.earliest_release {
      ReleaseSelection::Earliest
    } else {
      ReleaseSelection::FirstMatch
    },
    repo_match: if cli.exact_repo_match {
      MatchStrategy::Segment
    } else {
      MatchStrategy::Substring
    },
    ..Config::default()
  };
  let options = RunOptions {
    now,
    filtered: cli.filtered,
    logging: cli.logging,
    config,
  };

  let commits = Arc::new(snapshot.commit_source());
  let report = report::run(&snapshot, commits, &options, Arc::new(SystemClock)).await?;

  let mut out = io::BufWriter::new(io::stdout().lock());
  serde_json::to_writer(&mut out, &report)?;
  writeln!(out)?;
  out.flush()?;
  Ok(())
}
