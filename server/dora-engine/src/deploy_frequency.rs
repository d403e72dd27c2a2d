//! Deployment frequency: releases inside rolling windows around "now".

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::error::{MetricsError, Result};
use crate::event_log::EventLog;
use crate::timestamp::{self, format_millis};
use crate::types::{Release, ReleaseEvent};

pub struct DeploymentFrequencyCalculator {
  now_ms: i64,
  releases: Vec<ReleaseEvent>,
  weekly_window_days: i64,
  monthly_window_days: i64,
  log: EventLog,
}

impl DeploymentFrequencyCalculator {
  /// Fails with `EmptyInput` when `releases` is empty.
  pub fn new(releases: &[Release], now: Option<DateTime<Utc>>) -> Result<Self> {
    Self::with_config(releases, now, &Config::default(), &SystemClock)
  }

  pub fn with_config(
    releases: &[Release],
    now: Option<DateTime<Utc>>,
    config: &Config,
    clock: &dyn Clock,
  ) -> Result<Self> {
    if releases.is_empty() {
      return Err(MetricsError::empty("release list"));
    }
    let releases = releases
      .iter()
      .map(ReleaseEvent::from_release)
      .collect::<Result<Vec<_>>>()?;

    Ok(Self {
      now_ms: now.unwrap_or_else(|| clock.now()).timestamp_millis(),
      releases,
      weekly_window_days: config.weekly_window_days,
      monthly_window_days: config.monthly_window_days,
      log: EventLog::new(),
    })
  }

  /// Releases within a week of "now" (either side).
  pub fn weekly(&mut self) -> usize {
    self.count_within(self.weekly_window_days)
  }

  /// Releases within a month of "now" (either side).
  pub fn monthly(&mut self) -> usize {
    self.count_within(self.monthly_window_days)
  }

  /// Monthly count normalized to a weekly rate (x 7/30), as text with two decimals.
  pub fn rate(&mut self) -> String {
    format_rate(self.monthly())
  }

  pub fn log(&self) -> &EventLog {
    &self.log
  }

  fn count_within(&mut self, days: i64) -> usize {
    let mut count = 0;
    for release in &self.releases {
      if timestamp::days_between(self.now_ms, release.published_ms) < days {
        self
          .log
          .push(format!("release->  {}:{}", release.name, format_millis(release.published_ms)));
        count += 1;
      }
    }
    debug!(window_days = days, count, "counted releases");
    count
  }
}

/// `round(monthly * 700) / 3000` formatted to two decimals.
pub fn format_rate(monthly: usize) -> String {
  let scaled = (monthly as f64 * 700.0).round() / 3000.0;
  format!("{:.2}", scaled)
}
