//! Structured error types for the metrics engine.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetricsError {
  /// A mandatory input collection was empty. Fatal to construction.
  #[error("empty input: {what}")]
  EmptyInput { what: String },

  #[error("no release of {repo} before {at}")]
  NoPreviousRelease { repo: String, at: String },

  #[error("no release of {repo} after {at}")]
  NoLaterRelease { repo: String, at: String },

  #[error("timestamp: {field}: {reason} ({value:?})")]
  Timestamp {
    field: String,
    value: String,
    reason: String,
  },

  #[error("commit source: {0}")]
  CommitSource(String),

  #[error("json: {0}")]
  Json(#[from] serde_json::Error),
}

impl MetricsError {
  pub fn empty(what: &str) -> Self {
    Self::EmptyInput {
      what: what.to_string(),
    }
  }

  pub fn timestamp(field: &str, value: &str, reason: &str) -> Self {
    Self::Timestamp {
      field: field.to_string(),
      value: value.to_string(),
      reason: reason.to_string(),
    }
  }

  pub fn commit_source(msg: impl Into<String>) -> Self {
    Self::CommitSource(msg.into())
  }

  /// Missing bracketing releases are expected conditions, not failures of the input.
  pub fn is_recoverable(&self) -> bool {
    matches!(
      self,
      Self::NoPreviousRelease { .. } | Self::NoLaterRelease { .. }
    )
  }
}

pub type Result<T> = std::result::Result<T, MetricsError>;
