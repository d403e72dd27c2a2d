//! Engine configuration with sane defaults.

use crate::repo::MatchStrategy;

/// How the lead time picks the deploying release among those published after a merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReleaseSelection {
  /// First candidate in input order, whatever its publish time.
  #[default]
  FirstMatch,
  /// Candidate with the smallest publish time.
  Earliest,
}

/// Windows, labels and matching rules shared by the calculators.
#[derive(Debug, Clone)]
pub struct Config {
  /// Deploy frequency: a release counts for `weekly()` when its day-rounded
  /// distance from "now" is below this.
  pub weekly_window_days: i64,
  /// Same as above for `monthly()`.
  pub monthly_window_days: i64,
  /// Change failure rate only considers releases published within this many days.
  pub failure_window_days: i64,
  /// Lead time only considers pulls merged within this many days.
  pub lead_time_window_days: i64,
  /// MTTR only considers bugs created within this many days.
  pub restore_window_days: i64,
  /// Pulls must target this branch to count toward lead time.
  pub main_branch: String,
  /// Issue label marking a bug.
  pub bug_label: String,
  /// Title prefixes kept when lead time runs filtered.
  pub filtered_prefixes: Vec<String>,
  pub release_selection: ReleaseSelection,
  pub repo_match: MatchStrategy,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      weekly_window_days: 8,
      monthly_window_days: 31,
      failure_window_days: 31,
      lead_time_window_days: 31,
      restore_window_days: 30,
      main_branch: "main".into(),
      bug_label: "bug".into(),
      filtered_prefixes: vec!["feat".into(), "fix".into()],
      release_selection: ReleaseSelection::FirstMatch,
      repo_match: MatchStrategy::Substring,
    }
  }
}
