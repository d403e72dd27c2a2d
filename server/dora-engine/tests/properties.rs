use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use dora_engine::deploy_frequency::format_rate;
use dora_engine::timestamp::{format_millis, ONE_DAY_MS};
use dora_engine::types::{Label, PullBase, PullRepo};
use dora_engine::{
  ChangeFailureRateCalculator, Clock, Config, DeploymentFrequencyCalculator, FixedClock, Issue, LeadTimeCalculator,
  MeanTimeToRestoreCalculator, PullRequest, Release, StaticCommitSource,
};
use proptest::prelude::*;

fn reference() -> DateTime<Utc> {
  Utc.with_ymd_and_hms(2023, 4, 30, 17, 50, 53).unwrap()
}

fn clock() -> FixedClock {
  FixedClock(Utc.with_ymd_and_hms(2023, 5, 1, 17, 50, 53).unwrap())
}

fn at_offset(hours: i64) -> String {
  format_millis(reference().timestamp_millis() + hours * ONE_DAY_MS / 24)
}

/// Releases of `dora` published up to 40 days either side of the reference.
fn gen_releases() -> impl Strategy<Value = Vec<Release>> {
  prop::collection::vec(-960i64..960, 1..12).prop_map(|offsets| {
    offsets
      .into_iter()
      .enumerate()
      .map(|(i, h)| Release {
        url: format!("https://api.github.com/repos/stenjo/dora/releases/{}", i),
        name: format!("v0.0.{}", i),
        published_at: at_offset(h),
      })
      .collect()
  })
}

/// Bug issues on `dora` created in the 40 days before the reference, open or closed.
fn gen_bugs() -> impl Strategy<Value = Vec<Issue>> {
  prop::collection::vec((-960i64..0, prop::option::of(1i64..240)), 0..8).prop_map(|bugs| {
    bugs
      .into_iter()
      .map(|(created, open_for)| Issue {
        created_at: at_offset(created),
        closed_at: open_for.map(|h| at_offset(created + h)),
        repository_url: "https://api.github.com/repos/stenjo/dora".into(),
        labels: vec![Label { name: "bug".into() }],
      })
      .collect()
  })
}

proptest! {
  #[test]
  fn monthly_count_covers_weekly(releases in gen_releases()) {
    let mut df =
      DeploymentFrequencyCalculator::with_config(&releases, Some(reference()), &Config::default(), &clock()).unwrap();
    let weekly = df.weekly();
    let monthly = df.monthly();
    prop_assert!(weekly <= monthly);
    prop_assert!(monthly <= releases.len());
  }

  #[test]
  fn rate_is_monthly_count_with_two_decimals(releases in gen_releases()) {
    let mut df =
      DeploymentFrequencyCalculator::with_config(&releases, Some(reference()), &Config::default(), &clock()).unwrap();
    let monthly = df.monthly();
    let rate = df.rate();
    prop_assert_eq!(&rate, &format_rate(monthly));
    let (_, decimals) = rate.split_once('.').unwrap();
    prop_assert_eq!(decimals.len(), 2);
  }

  #[test]
  fn failure_rate_is_a_percentage(releases in gen_releases(), bugs in gen_bugs()) {
    let clock: Arc<dyn Clock> = Arc::new(clock());
    let mut cfr =
      ChangeFailureRateCalculator::with_config(&bugs, &releases, Some(reference()), &Config::default(), clock)
        .unwrap();
    prop_assert!(cfr.cfr() <= 100);
  }

  #[test]
  fn failure_rate_without_bug_labels_is_zero(releases in gen_releases(), bugs in gen_bugs()) {
    let issues: Vec<Issue> = bugs
      .into_iter()
      .map(|mut i| {
        i.labels = vec![Label { name: "enhancement".into() }];
        i
      })
      .collect();
    let clock: Arc<dyn Clock> = Arc::new(clock());
    let mut cfr =
      ChangeFailureRateCalculator::with_config(&issues, &releases, Some(reference()), &Config::default(), clock)
        .unwrap();
    prop_assert_eq!(cfr.cfr(), 0);
  }

  #[test]
  fn open_bugs_never_restore(releases in gen_releases(), bugs in gen_bugs()) {
    let open: Vec<Issue> = bugs
      .into_iter()
      .map(|mut i| {
        i.closed_at = None;
        i
      })
      .collect();
    let mut mttr =
      MeanTimeToRestoreCalculator::with_config(&open, &releases, Some(reference()), &Config::default(), &clock())
        .unwrap();
    prop_assert!(mttr.bracketed_bugs().is_empty());
    prop_assert_eq!(mttr.mttr(), 0.0);
  }

  #[test]
  fn restore_time_is_never_negative(releases in gen_releases(), bugs in gen_bugs()) {
    let mut mttr =
      MeanTimeToRestoreCalculator::with_config(&bugs, &releases, Some(reference()), &Config::default(), &clock())
        .unwrap();
    for bug in mttr.bracketed_bugs() {
      prop_assert!(mttr.restore_time(&bug).unwrap() > 0);
    }
    prop_assert!(mttr.mttr() >= 0.0);
  }

  #[test]
  fn pulls_off_main_have_no_lead_time(releases in gen_releases(), branch in "[a-z]{3,8}") {
    prop_assume!(branch != "main");
    let pulls = vec![PullRequest {
      merged_at: Some(at_offset(-48)),
      title: "feat: work".into(),
      commits_url: "pulls/1/commits".into(),
      base: PullBase {
        ref_name: branch,
        repo: PullRepo {
          name: Some("dora".into()),
        },
      },
    }];
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let (lead_time, logged) = runtime.block_on(async {
      let mut lt = LeadTimeCalculator::with_config(
        &pulls,
        &releases,
        Arc::new(StaticCommitSource::default()),
        Some(reference()),
        &Config::default(),
        &clock(),
      )
      .unwrap();
      let lead_time = lt.lead_time(false).await.unwrap();
      (lead_time, lt.log().len())
    });
    prop_assert_eq!(lead_time, 0.0);
    prop_assert_eq!(logged, 0);
  }
}
