//! Change failure rate: share of recent releases followed by a bug before the next release.
//!
//! Each repository referenced by a bug gets its own release sequence, closed by a
//! synthetic event stamped with the clock's "now". An interval between two consecutive
//! events fails when a bug of that repository was created strictly inside it. The
//! failed-interval count is divided by the global number of recent releases.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::error::Result;
use crate::event_log::EventLog;
use crate::repo::{MatchStrategy, RepoKey};
use crate::timestamp::{format_millis, window_start};
use crate::types::{BugEvent, Issue, Release, ReleaseEvent};

pub struct ChangeFailureRateCalculator {
  issues: Vec<Issue>,
  bugs: Vec<BugEvent>,
  /// Ascending by publish time, only the failure window.
  releases: Vec<ReleaseEvent>,
  bug_label: String,
  repo_match: MatchStrategy,
  clock: Arc<dyn Clock>,
  log: EventLog,
}

impl ChangeFailureRateCalculator {
  pub fn new(issues: &[Issue], releases: &[Release], now: Option<DateTime<Utc>>) -> Result<Self> {
    Self::with_config(issues, releases, now, &Config::default(), Arc::new(SystemClock))
  }

  pub fn with_config(
    issues: &[Issue],
    releases: &[Release],
    now: Option<DateTime<Utc>>,
    config: &Config,
    clock: Arc<dyn Clock>,
  ) -> Result<Self> {
    let now_ms = now.unwrap_or_else(|| clock.now()).timestamp_millis();
    let since = window_start(now_ms, config.failure_window_days);

    let releases: Vec<ReleaseEvent> = ReleaseEvent::sorted(releases)?
      .into_iter()
      .filter(|r| r.published_ms > since)
      .collect();

    let bugs = issues
      .iter()
      .filter(|i| i.has_label(&config.bug_label))
      .map(BugEvent::from_issue)
      .collect::<Result<Vec<_>>>()?;

    Ok(Self {
      issues: issues.to_vec(),
      bugs,
      releases,
      bug_label: config.bug_label.clone(),
      repo_match: config.repo_match,
      clock,
      log: EventLog::new(),
    })
  }

  /// Issues carrying the bug label.
  pub fn bugs(&self) -> Vec<&Issue> {
    self
      .issues
      .iter()
      .filter(|i| i.has_label(&self.bug_label))
      .collect()
  }

  /// Failed release intervals as a rounded percentage of recent releases.
  pub fn cfr(&mut self) -> u32 {
    if self.issues.is_empty() || self.releases.is_empty() {
      return 0;
    }

    let mut repos: Vec<RepoKey> = Vec::new();
    for bug in &self.bugs {
      if !repos.contains(&bug.repo) {
        repos.push(bug.repo.clone());
      }
    }

    // One closing event per repository, keyed by the bare repository name.
    let closing_ms = self.clock.now().timestamp_millis();
    let mut events: Vec<(i64, &str)> = self
      .releases
      .iter()
      .map(|r| (r.published_ms, r.source_url.as_str()))
      .collect();
    events.extend(repos.iter().map(|repo| (closing_ms, repo.as_str())));

    let mut failed = 0usize;
    for repo in &repos {
      let sequence: Vec<(i64, &str)> = events
        .iter()
        .copied()
        .filter(|(_, url)| self.repo_match.matches(url, repo))
        .collect();

      for pair in sequence.windows(2) {
        let (start, end) = (pair[0].0, pair[1].0);
        let hits = self
          .bugs
          .iter()
          .filter(|b| &b.repo == repo && b.created_ms > start && b.created_ms < end)
          .count();
        if hits > 0 {
          self.log.push(format!(
            "failed->   {} {} .. {} : {} bug(s)",
            repo,
            format_millis(start),
            format_millis(end),
            hits
          ));
          failed += 1;
        } else {
          debug!(%repo, start, end, "release interval without bugs");
        }
      }
    }

    let rate = (failed as f64 / self.releases.len() as f64 * 100.0).round() as u32;
    info!(failed, releases = self.releases.len(), rate, "change failure rate");
    rate
  }

  pub fn log(&self) -> &EventLog {
    &self.log
  }
}
