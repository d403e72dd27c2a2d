//! Repository identity: short repository keys and how they are matched against URLs.

use std::fmt;

/// Short repository name, e.g. `dora` for `https://api.github.com/repos/stenjo/dora`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RepoKey(pub String);

impl RepoKey {
  /// Last path segment of a repository URL (trailing slashes ignored).
  pub fn from_url(url: &str) -> Self {
    let trimmed = url.trim_end_matches('/');
    let last = trimmed.rsplit('/').next().unwrap_or(trimmed);
    Self(last.to_string())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl From<&str> for RepoKey {
  fn from(s: &str) -> Self {
    Self(s.to_string())
  }
}

impl fmt::Display for RepoKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

/// Decides whether an entity URL belongs to a repository.
///
/// `Substring` is the historical behavior: `repo` matches any URL containing it, so it
/// also matches `other-repo`. `Segment` requires a whole path segment equal to the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchStrategy {
  #[default]
  Substring,
  Segment,
}

impl MatchStrategy {
  pub fn matches(self, url: &str, key: &RepoKey) -> bool {
    match self {
      Self::Substring => url.contains(key.as_str()),
      Self::Segment => url.split('/').any(|seg| seg == key.as_str()),
    }
  }
}
