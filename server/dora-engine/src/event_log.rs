//! Append-only audit trail of the events that contributed to a metric.

use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct EventLog(Vec<String>);

impl EventLog {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn push(&mut self, line: impl Into<String>) {
    self.0.push(line.into());
  }

  pub fn entries(&self) -> &[String] {
    &self.0
  }

  pub fn iter(&self) -> std::slice::Iter<'_, String> {
    self.0.iter()
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  /// Count lines containing `needle`.
  pub fn count_containing(&self, needle: &str) -> usize {
    self.0.iter().filter(|l| l.contains(needle)).count()
  }

  pub fn into_inner(self) -> Vec<String> {
    self.0
  }
}

impl<'a> IntoIterator for &'a EventLog {
  type Item = &'a String;
  type IntoIter = std::slice::Iter<'a, String>;

  fn into_iter(self) -> Self::IntoIter {
    self.0.iter()
  }
}
