//! Commit retrieval collaborator used by the lead time calculator.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::Commit;

/// Resolves a pull request's commits-location reference to its commits.
///
/// `Ok(None)` means the source had nothing to say (e.g. the lookup failed softly);
/// callers treat it like an empty list. `Err` aborts the enclosing computation.
#[async_trait]
pub trait CommitSource: Send + Sync {
  async fn commits(&self, location: &str) -> Result<Option<Vec<Commit>>>;
}

/// In-memory commit lists keyed by commits location.
#[derive(Debug, Clone, Default)]
pub struct StaticCommitSource {
  by_location: HashMap<String, Vec<Commit>>,
}

impl StaticCommitSource {
  pub fn new(by_location: HashMap<String, Vec<Commit>>) -> Self {
    Self { by_location }
  }

  pub fn insert(&mut self, location: impl Into<String>, commits: Vec<Commit>) {
    self.by_location.insert(location.into(), commits);
  }
}

#[async_trait]
impl CommitSource for StaticCommitSource {
  async fn commits(&self, location: &str) -> Result<Option<Vec<Commit>>> {
    Ok(self.by_location.get(location).cloned())
  }
}
