//! Runs all four calculators over one snapshot and assembles the report.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::change_failure_rate::ChangeFailureRateCalculator;
use crate::clock::Clock;
use crate::commits::{CommitSource, StaticCommitSource};
use crate::config::Config;
use crate::deploy_frequency::DeploymentFrequencyCalculator;
use crate::error::Result;
use crate::event_log::EventLog;
use crate::lead_time::LeadTimeCalculator;
use crate::mttr::MeanTimeToRestoreCalculator;
use crate::types::{Commit, Issue, PullRequest, Release};

pub const EMPTY_ISSUE_LIST: &str = "empty issue list";

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Everything fetched for one run. `issues` is `None` when the issue fetch failed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Snapshot {
  pub releases: Vec<Release>,
  #[serde(default)]
  pub pulls: Vec<PullRequest>,
  #[serde(default)]
  pub issues: Option<Vec<Issue>>,
  /// Commit lists keyed by the pulls' `commits_url`.
  #[serde(default)]
  pub commits: HashMap<String, Vec<Commit>>,
}

impl Snapshot {
  pub fn commit_source(&self) -> StaticCommitSource {
    StaticCommitSource::new(self.commits.clone())
  }
}

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
  /// Reference time; the clock's "now" when unset.
  pub now: Option<DateTime<Utc>>,
  /// Lead time counts only `feat`/`fix` pulls.
  pub filtered: bool,
  /// Attach each metric's audit log to the report.
  pub logging: bool,
  pub config: Config,
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Issue-based metric, or the reason it could not be computed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum IssueMetric {
  Percent(u32),
  Days(f64),
  Unavailable(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct DoraReport {
  pub deploy_rate: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub deploy_rate_log: Option<EventLog>,
  pub lead_time: f64,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub lead_time_log: Option<EventLog>,
  pub change_failure_rate: IssueMetric,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub change_failure_rate_log: Option<EventLog>,
  pub mttr: IssueMetric,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub mttr_log: Option<EventLog>,
}

/// Compute every metric. Fails when the release list is empty or a timestamp is malformed.
pub async fn run(
  snapshot: &Snapshot,
  commits: Arc<dyn CommitSource>,
  options: &RunOptions,
  clock: Arc<dyn Clock>,
) -> Result<DoraReport> {
  let config = &options.config;
  let keep = |log: &EventLog| options.logging.then(|| log.clone());

  let mut df = DeploymentFrequencyCalculator::with_config(&snapshot.releases, options.now, config, clock.as_ref())?;
  let deploy_rate = df.rate();
  info!(%deploy_rate, releases = snapshot.releases.len(), "deploy rate");

  let mut lt = LeadTimeCalculator::with_config(
    &snapshot.pulls,
    &snapshot.releases,
    commits,
    options.now,
    config,
    clock.as_ref(),
  )?;
  let lead_time = lt.lead_time(options.filtered).await?;

  let (change_failure_rate, change_failure_rate_log, mttr, mttr_log) = match &snapshot.issues {
    Some(issues) => {
      let mut cfr =
        ChangeFailureRateCalculator::with_config(issues, &snapshot.releases, options.now, config, clock.clone())?;
      let mut restore =
        MeanTimeToRestoreCalculator::with_config(issues, &snapshot.releases, options.now, config, clock.as_ref())?;
      (
        IssueMetric::Percent(cfr.cfr()),
        keep(cfr.log()),
        IssueMetric::Days(restore.mttr()),
        keep(restore.log()),
      )
    }
    None => (
      IssueMetric::Unavailable(EMPTY_ISSUE_LIST.into()),
      None,
      IssueMetric::Unavailable(EMPTY_ISSUE_LIST.into()),
      None,
    ),
  };

  Ok(DoraReport {
    deploy_rate,
    deploy_rate_log: keep(df.log()),
    lead_time,
    lead_time_log: keep(lt.log()),
    change_failure_rate,
    change_failure_rate_log,
    mttr,
    mttr_log,
  })
}
