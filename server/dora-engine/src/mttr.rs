//! Mean time to restore, measured between the releases that bracket a bug.
//!
//! A bug counts only when it is closed and its repository has a release strictly before
//! its creation and another strictly after its closure. The restore time is the span
//! between those two releases, not the bug's own open/close duration.

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::error::{MetricsError, Result};
use crate::event_log::EventLog;
use crate::repo::{MatchStrategy, RepoKey};
use crate::timestamp::{format_millis, ms_to_days, round2, window_start};
use crate::types::{BugEvent, BugInterval, Issue, Release, ReleaseEvent};

pub struct MeanTimeToRestoreCalculator {
  since_ms: i64,
  /// Bug-labeled issues with parsed timestamps, in input order.
  bugs: Vec<(Issue, BugEvent)>,
  /// Ascending by publish time.
  releases: Vec<ReleaseEvent>,
  repo_match: MatchStrategy,
  log: EventLog,
}

impl MeanTimeToRestoreCalculator {
  /// Fails with `EmptyInput` when `releases` is empty.
  pub fn new(issues: &[Issue], releases: &[Release], now: Option<DateTime<Utc>>) -> Result<Self> {
    Self::with_config(issues, releases, now, &Config::default(), &SystemClock)
  }

  pub fn with_config(
    issues: &[Issue],
    releases: &[Release],
    now: Option<DateTime<Utc>>,
    config: &Config,
    clock: &dyn Clock,
  ) -> Result<Self> {
    if releases.is_empty() {
      return Err(MetricsError::empty("release list"));
    }
    let now_ms = now.unwrap_or_else(|| clock.now()).timestamp_millis();

    let bugs = issues
      .iter()
      .filter(|i| i.has_label(&config.bug_label))
      .map(|i| BugEvent::from_issue(i).map(|b| (i.clone(), b)))
      .collect::<Result<Vec<_>>>()?;

    Ok(Self {
      since_ms: window_start(now_ms, config.restore_window_days),
      bugs,
      releases: ReleaseEvent::sorted(releases)?,
      repo_match: config.repo_match,
      log: EventLog::new(),
    })
  }

  /// Bugs created inside the restore window.
  pub fn issues_tagged_as_bug(&self) -> Vec<&Issue> {
    self.recent_bugs().map(|(issue, _)| issue).collect()
  }

  /// Open/close intervals of recent bugs that releases bracket on both sides.
  pub fn bracketed_bugs(&self) -> Vec<BugInterval> {
    let mut intervals = Vec::new();
    for (_, bug) in self.recent_bugs() {
      let closed_ms = match bug.closed_ms {
        Some(ms) => ms,
        None => continue,
      };
      if self.has_later_release(closed_ms, &bug.repo) && self.has_previous_release(bug.created_ms, &bug.repo) {
        intervals.push(BugInterval {
          start_ms: bug.created_ms,
          end_ms: closed_ms,
          repo: bug.repo.clone(),
        });
      } else {
        debug!(repo = %bug.repo, created = bug.created_ms, "bug not bracketed by releases");
      }
    }
    intervals
  }

  pub fn has_previous_release(&self, at_ms: i64, repo: &RepoKey) -> bool {
    self.releases_of(repo).any(|r| r.published_ms < at_ms)
  }

  pub fn has_later_release(&self, at_ms: i64, repo: &RepoKey) -> bool {
    self.releases_of(repo).any(|r| r.published_ms > at_ms)
  }

  /// Latest release of `repo` strictly before `at_ms`.
  pub fn release_before(&self, at_ms: i64, repo: &RepoKey) -> Result<&ReleaseEvent> {
    self
      .releases_of(repo)
      .filter(|r| r.published_ms < at_ms)
      .last()
      .ok_or_else(|| MetricsError::NoPreviousRelease {
        repo: repo.to_string(),
        at: format_millis(at_ms),
      })
  }

  /// Earliest release of `repo` strictly after `at_ms`.
  pub fn release_after(&self, at_ms: i64, repo: &RepoKey) -> Result<&ReleaseEvent> {
    self
      .releases_of(repo)
      .find(|r| r.published_ms > at_ms)
      .ok_or_else(|| MetricsError::NoLaterRelease {
        repo: repo.to_string(),
        at: format_millis(at_ms),
      })
  }

  /// Milliseconds from the release preceding the bug to the release following its fix.
  pub fn restore_time(&self, bug: &BugInterval) -> Result<i64> {
    let before = self.release_before(bug.start_ms, &bug.repo)?;
    let after = self.release_after(bug.end_ms, &bug.repo)?;
    Ok(after.published_ms - before.published_ms)
  }

  /// Mean restore time in days, rounded to two decimals; `0.0` without bracketed bugs.
  pub fn mttr(&mut self) -> f64 {
    let mut spans: Vec<i64> = Vec::new();
    for bug in self.bracketed_bugs() {
      let (before, after) = match (
        self.release_before(bug.start_ms, &bug.repo),
        self.release_after(bug.end_ms, &bug.repo),
      ) {
        (Ok(b), Ok(a)) => (b.published_ms, a.published_ms),
        // Bracketing was checked when the interval was built.
        _ => continue,
      };
      let span = after - before;
      self.log.push(format!(
        "bug->      {} {} .. {}",
        bug.repo,
        format_millis(bug.start_ms),
        format_millis(bug.end_ms)
      ));
      self
        .log
        .push(format!("  restore-> {} .. {}", format_millis(before), format_millis(after)));
      self.log.push(format!("  {:.2} days", ms_to_days(span as f64)));
      spans.push(span);
    }

    if spans.is_empty() {
      return 0.0;
    }
    let mean_ms = spans.iter().sum::<i64>() as f64 / spans.len() as f64;
    let days = round2(ms_to_days(mean_ms));
    info!(bugs = spans.len(), mttr = days, "mean time to restore");
    days
  }

  pub fn log(&self) -> &EventLog {
    &self.log
  }

  fn recent_bugs(&self) -> impl Iterator<Item = &(Issue, BugEvent)> {
    let since = self.since_ms;
    self.bugs.iter().filter(move |(_, b)| b.created_ms > since)
  }

  fn releases_of(&self, repo: &RepoKey) -> impl Iterator<Item = &ReleaseEvent> {
    let strategy = self.repo_match;
    let repo = repo.clone();
    self
      .releases
      .iter()
      .filter(move |r| strategy.matches(&r.source_url, &repo))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::timestamp::{parse_millis, ONE_DAY_MS};
  use crate::types::Label;
  use chrono::TimeZone;

  fn bug(repo: &str, created_at: &str, closed_at: Option<&str>) -> Issue {
    Issue {
      created_at: created_at.into(),
      closed_at: closed_at.map(String::from),
      repository_url: format!("https://api.github.com/repos/stenjo/{}", repo),
      labels: vec![Label { name: "bug".into() }],
    }
  }

  fn release(repo: &str, published_at: &str) -> Release {
    Release {
      url: format!("https://api.github.com/repos/stenjo/{}/releases/1", repo),
      name: format!("{}-{}", repo, &published_at[..10]),
      published_at: published_at.into(),
    }
  }

  fn april_20() -> Option<DateTime<Utc>> {
    Some(Utc.with_ymd_and_hms(2023, 4, 20, 0, 0, 0).unwrap())
  }

  fn ms(s: &str) -> i64 {
    parse_millis("t", s).unwrap()
  }

  #[test]
  fn empty_release_list_is_rejected() {
    let err = MeanTimeToRestoreCalculator::new(&[], &[], None).err().unwrap();
    assert!(matches!(err, MetricsError::EmptyInput { .. }));
  }

  #[test]
  fn only_recent_bugs_are_tagged() {
    let issues = vec![
      bug("dora", "2023-04-11T00:00:00Z", None),
      bug("dora", "2023-03-01T00:00:00Z", None),
      Issue {
        labels: vec![Label { name: "feature".into() }],
        ..bug("dora", "2023-04-12T00:00:00Z", None)
      },
    ];
    let c = MeanTimeToRestoreCalculator::new(&issues, &[release("dora", "2023-04-10T00:00:00Z")], april_20()).unwrap();
    assert_eq!(c.issues_tagged_as_bug().len(), 1);
  }

  #[test]
  fn release_before_and_after() {
    let releases = vec![
      release("dora", "2023-04-13T00:00:00Z"),
      release("dora", "2023-04-05T00:00:00Z"),
      release("dora", "2023-04-10T00:00:00Z"),
      release("other", "2023-04-11T00:00:00Z"),
    ];
    let c = MeanTimeToRestoreCalculator::new(&[], &releases, april_20()).unwrap();
    let dora = RepoKey::from("dora");

    let at = ms("2023-04-11T12:00:00Z");
    assert_eq!(c.release_before(at, &dora).unwrap().published_ms, ms("2023-04-10T00:00:00Z"));
    assert_eq!(c.release_after(at, &dora).unwrap().published_ms, ms("2023-04-13T00:00:00Z"));

    let early = ms("2023-04-01T00:00:00Z");
    assert!(!c.has_previous_release(early, &dora));
    let err = c.release_before(early, &dora).unwrap_err();
    assert!(matches!(err, MetricsError::NoPreviousRelease { .. }));
    assert!(err.is_recoverable());

    let late = ms("2023-04-14T00:00:00Z");
    assert!(!c.has_later_release(late, &dora));
    assert!(matches!(
      c.release_after(late, &dora).unwrap_err(),
      MetricsError::NoLaterRelease { .. }
    ));
  }

  #[test]
  fn release_exactly_at_timestamp_does_not_bracket() {
    let c = MeanTimeToRestoreCalculator::new(&[], &[release("dora", "2023-04-10T00:00:00Z")], april_20()).unwrap();
    let at = ms("2023-04-10T00:00:00Z");
    let dora = RepoKey::from("dora");
    assert!(!c.has_previous_release(at, &dora));
    assert!(!c.has_later_release(at, &dora));
  }

  #[test]
  fn unbracketed_bugs_are_excluded() {
    let issues = vec![
      // Still open.
      bug("dora", "2023-04-11T00:00:00Z", None),
      // No release after the fix.
      bug("dora", "2023-04-11T00:00:00Z", Some("2023-04-14T00:00:00Z")),
      // No release before creation.
      bug("dora", "2023-04-09T00:00:00Z", Some("2023-04-12T00:00:00Z")),
    ];
    let releases = vec![
      release("dora", "2023-04-10T00:00:00Z"),
      release("dora", "2023-04-13T00:00:00Z"),
    ];
    let mut c = MeanTimeToRestoreCalculator::new(&issues, &releases, april_20()).unwrap();
    assert!(c.bracketed_bugs().is_empty());
    assert_eq!(c.mttr(), 0.0);
    assert!(c.log().is_empty());
  }

  #[test]
  fn restore_time_spans_bracketing_releases() {
    let issues = vec![bug("dora", "2023-04-11T00:00:00Z", Some("2023-04-12T00:00:00Z"))];
    let releases = vec![
      release("dora", "2023-04-10T00:00:00Z"),
      release("dora", "2023-04-13T00:00:00Z"),
    ];
    let c = MeanTimeToRestoreCalculator::new(&issues, &releases, april_20()).unwrap();
    let bugs = c.bracketed_bugs();
    assert_eq!(bugs.len(), 1);
    assert_eq!(c.restore_time(&bugs[0]).unwrap(), 3 * ONE_DAY_MS);
  }

  #[test]
  fn mean_over_two_repositories() {
    let issues = vec![
      bug("dora", "2023-04-11T00:00:00Z", Some("2023-04-12T00:00:00Z")),
      bug("metrics", "2023-04-06T00:00:00Z", Some("2023-04-08T00:00:00Z")),
    ];
    let releases = vec![
      release("dora", "2023-04-10T00:00:00Z"),
      release("dora", "2023-04-13T00:00:00Z"),
      release("metrics", "2023-04-05T00:00:00Z"),
      release("metrics", "2023-04-11T00:00:00Z"),
    ];
    let mut c = MeanTimeToRestoreCalculator::new(&issues, &releases, april_20()).unwrap();
    assert_eq!(c.mttr(), 4.5);
    assert_eq!(c.log().count_containing("bug->"), 2);
    assert_eq!(c.log().count_containing("restore->"), 2);
  }
}
