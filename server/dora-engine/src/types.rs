//! Core types for the metrics engine (JSON contracts + internal models).

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::repo::RepoKey;
use crate::timestamp;

// ---------------------------------------------------------------------------
// Inbound types (GitHub REST shapes). Unknown fields are silently ignored.
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Release {
  /// Release API URL; repository identity is derived from it.
  #[serde(default)]
  pub url: String,
  #[serde(default)]
  pub name: String,
  pub published_at: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Label {
  pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Issue {
  pub created_at: String,
  #[serde(default)]
  pub closed_at: Option<String>,
  #[serde(default)]
  pub repository_url: String,
  #[serde(default)]
  pub labels: Vec<Label>,
}

impl Issue {
  pub fn has_label(&self, name: &str) -> bool {
    self.labels.iter().any(|l| l.name == name)
  }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PullRepo {
  #[serde(default)]
  pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PullBase {
  #[serde(rename = "ref", default)]
  pub ref_name: String,
  #[serde(default)]
  pub repo: PullRepo,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PullRequest {
  /// Empty or null when the pull was closed without merging.
  #[serde(default)]
  pub merged_at: Option<String>,
  #[serde(default)]
  pub title: String,
  #[serde(default)]
  pub commits_url: String,
  #[serde(default)]
  pub base: PullBase,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommitPerson {
  #[serde(default)]
  pub name: String,
  #[serde(default)]
  pub email: String,
  pub date: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommitItem {
  #[serde(default)]
  pub message: String,
  pub committer: CommitPerson,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Commit {
  #[serde(default)]
  pub sha: String,
  pub commit: CommitItem,
}

// ---------------------------------------------------------------------------
// Internal normalized types
// ---------------------------------------------------------------------------

/// A release reduced to what the calculators compare: publish time and source URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseEvent {
  pub published_ms: i64,
  pub source_url: String,
  pub name: String,
}

impl ReleaseEvent {
  pub fn from_release(release: &Release) -> Result<Self> {
    Ok(Self {
      published_ms: timestamp::parse_millis("release.published_at", &release.published_at)?,
      source_url: release.url.clone(),
      name: release.name.clone(),
    })
  }

  /// Project and sort ascending by publish time.
  pub fn sorted(releases: &[Release]) -> Result<Vec<Self>> {
    let mut events = releases
      .iter()
      .map(Self::from_release)
      .collect::<Result<Vec<_>>>()?;
    events.sort_by_key(|e| e.published_ms);
    Ok(events)
  }
}

/// Open/close window of a bug, kept only when releases bracket it on both sides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BugInterval {
  pub start_ms: i64,
  pub end_ms: i64,
  pub repo: RepoKey,
}

/// A bug issue with its timestamps already parsed.
#[derive(Debug, Clone)]
pub struct BugEvent {
  pub created_ms: i64,
  pub closed_ms: Option<i64>,
  pub repo: RepoKey,
}

impl BugEvent {
  pub fn from_issue(issue: &Issue) -> Result<Self> {
    Ok(Self {
      created_ms: timestamp::parse_millis("issue.created_at", &issue.created_at)?,
      closed_ms: timestamp::parse_optional_millis("issue.closed_at", issue.closed_at.as_deref())?,
      repo: RepoKey::from_url(&issue.repository_url),
    })
  }
}

/// A merged pull request with its merge time parsed.
#[derive(Debug, Clone)]
pub struct MergedPull {
  pub merged_ms: i64,
  pub merged_at: String,
  pub title: String,
  pub base_ref: String,
  pub repo_name: Option<String>,
  pub commits_url: String,
}

/// A commit reduced to its committer time and message.
#[derive(Debug, Clone)]
pub struct CommitEvent {
  pub committed_ms: i64,
  pub committed_at: String,
  pub message: String,
}

impl CommitEvent {
  pub fn from_commit(commit: &Commit) -> Result<Self> {
    let date = &commit.commit.committer.date;
    Ok(Self {
      committed_ms: timestamp::parse_millis("commit.committer.date", date)?,
      committed_at: date.clone(),
      message: commit.commit.message.clone(),
    })
  }
}
