//! Change lead time: earliest commit of a merged pull request to the release that shipped it.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::commits::CommitSource;
use crate::config::{Config, ReleaseSelection};
use crate::error::Result;
use crate::event_log::EventLog;
use crate::repo::{MatchStrategy, RepoKey};
use crate::timestamp::{self, format_millis, ms_to_days, round2, window_start};
use crate::types::{CommitEvent, MergedPull, PullRequest, Release, ReleaseEvent};

pub struct LeadTimeCalculator {
  pulls: Vec<MergedPull>,
  /// Input order, not sorted.
  releases: Vec<ReleaseEvent>,
  commits: Arc<dyn CommitSource>,
  main_branch: String,
  filtered_prefixes: Vec<String>,
  release_selection: ReleaseSelection,
  repo_match: MatchStrategy,
  log: EventLog,
}

impl LeadTimeCalculator {
  pub fn new(
    pulls: &[PullRequest],
    releases: &[Release],
    commits: Arc<dyn CommitSource>,
    now: Option<DateTime<Utc>>,
  ) -> Result<Self> {
    Self::with_config(pulls, releases, commits, now, &Config::default(), &SystemClock)
  }

  /// Keeps pulls merged inside the lead time window; unmerged pulls are dropped here.
  pub fn with_config(
    pulls: &[PullRequest],
    releases: &[Release],
    commits: Arc<dyn CommitSource>,
    now: Option<DateTime<Utc>>,
    config: &Config,
    clock: &dyn Clock,
  ) -> Result<Self> {
    let now_ms = now.unwrap_or_else(|| clock.now()).timestamp_millis();
    let since = window_start(now_ms, config.lead_time_window_days);

    let mut merged = Vec::new();
    for pull in pulls {
      let merged_ms = match timestamp::parse_optional_millis("pull.merged_at", pull.merged_at.as_deref())? {
        Some(ms) if ms > since => ms,
        _ => continue,
      };
      merged.push(MergedPull {
        merged_ms,
        merged_at: pull.merged_at.clone().unwrap_or_default(),
        title: pull.title.clone(),
        base_ref: pull.base.ref_name.clone(),
        repo_name: pull.base.repo.name.clone(),
        commits_url: pull.commits_url.clone(),
      });
    }

    let releases = releases
      .iter()
      .map(ReleaseEvent::from_release)
      .collect::<Result<Vec<_>>>()?;

    Ok(Self {
      pulls: merged,
      releases,
      commits,
      main_branch: config.main_branch.clone(),
      filtered_prefixes: config.filtered_prefixes.clone(),
      release_selection: config.release_selection,
      repo_match: config.repo_match,
      log: EventLog::new(),
    })
  }

  /// Mean lead time in days, rounded to two decimals; `0.0` when nothing contributed.
  ///
  /// With `filtered`, only pulls whose title starts with one of the configured prefixes
  /// (`feat`, `fix`) count. Commits are fetched one pull at a time, in pull order.
  pub async fn lead_time(&mut self, filtered: bool) -> Result<f64> {
    if self.pulls.is_empty() || self.releases.is_empty() {
      return Ok(0.0);
    }
    if filtered {
      self.log.push("\nLog is filtered - only feat and fix.");
    }

    let mut lead_times: Vec<f64> = Vec::new();
    for pull in &self.pulls {
      let repo = match self.qualifying_repo(pull, filtered) {
        Some(repo) => repo,
        None => continue,
      };

      let deploy = match self.deploying_release(pull.merged_ms, &repo) {
        Some(release) => release.clone(),
        None => {
          debug!(title = %pull.title, %repo, "no release after merge");
          continue;
        }
      };

      let commits = match self.commits.commits(&pull.commits_url).await? {
        Some(commits) => commits,
        None => {
          warn!(location = %pull.commits_url, "commit source returned nothing");
          Vec::new()
        }
      };
      let first = match earliest_commit(
        &commits
          .iter()
          .map(CommitEvent::from_commit)
          .collect::<Result<Vec<_>>>()?,
      ) {
        Some(commit) => commit,
        None => {
          debug!(title = %pull.title, "pull has no commits");
          continue;
        }
      };

      let days = ms_to_days((deploy.published_ms - first.committed_ms) as f64);
      self.log.push(format!("pull->      {} : {}", pull.merged_at, pull.title));
      self
        .log
        .push(format!("  commit->  {} : {}", first.committed_at, first.message));
      self.log.push(format!(
        "  release-> {} : {}",
        format_millis(deploy.published_ms),
        deploy.name
      ));
      self.log.push(format!("  {:.2} days", days));
      lead_times.push(days);
    }

    if lead_times.is_empty() {
      return Ok(0.0);
    }
    let mean = round2(lead_times.iter().sum::<f64>() / lead_times.len() as f64);
    info!(pulls = lead_times.len(), lead_time = mean, "lead time");
    Ok(mean)
  }

  pub fn log(&self) -> &EventLog {
    &self.log
  }

  /// Repository the pull counts toward, when it merged into the main branch of a named
  /// repository (and passes the title filter).
  fn qualifying_repo(&self, pull: &MergedPull, filtered: bool) -> Option<RepoKey> {
    let name = pull.repo_name.as_deref().filter(|n| !n.is_empty())?;
    if pull.merged_at.is_empty() || pull.base_ref != self.main_branch {
      return None;
    }
    if filtered && !self.filtered_prefixes.iter().any(|p| pull.title.starts_with(p.as_str())) {
      debug!(title = %pull.title, "filtered out");
      return None;
    }
    Some(RepoKey::from(name))
  }

  fn deploying_release(&self, merged_ms: i64, repo: &RepoKey) -> Option<&ReleaseEvent> {
    let mut later = self
      .releases
      .iter()
      .filter(|r| r.published_ms > merged_ms && self.repo_match.matches(&r.source_url, repo));
    match self.release_selection {
      ReleaseSelection::FirstMatch => later.next(),
      ReleaseSelection::Earliest => later.min_by_key(|r| r.published_ms),
    }
  }
}

fn earliest_commit(commits: &[CommitEvent]) -> Option<CommitEvent> {
  commits.iter().min_by_key(|c| c.committed_ms).cloned()
}
