//! DORA Metrics Engine: deployment frequency, change lead time, change failure rate and
//! mean time to restore, computed from releases, pull requests, commits and issues.
//!
//! Each calculator is built once from its input collections and a reference "now",
//! computes its metric on demand, and keeps an append-only audit log of the events
//! that contributed. Timestamps are parsed once at construction.
//!
//! No network, no DB; fetching the inputs belongs to the caller.

pub mod change_failure_rate;
pub mod clock;
pub mod commits;
pub mod config;
pub mod deploy_frequency;
pub mod error;
pub mod event_log;
pub mod lead_time;
pub mod mttr;
pub mod repo;
pub mod report;
pub mod timestamp;
pub mod types;

pub use change_failure_rate::ChangeFailureRateCalculator;
pub use clock::{Clock, FixedClock, SystemClock};
pub use commits::{CommitSource, StaticCommitSource};
pub use config::{Config, ReleaseSelection};
pub use deploy_frequency::DeploymentFrequencyCalculator;
pub use error::MetricsError;
pub use event_log::EventLog;
pub use lead_time::LeadTimeCalculator;
pub use mttr::MeanTimeToRestoreCalculator;
pub use repo::{MatchStrategy, RepoKey};
pub use report::{DoraReport, RunOptions, Snapshot};
pub use types::{Commit, Issue, PullRequest, Release};
