//! Named output parts and their aggregation.
//!
//! Each sub-builder returns a [`BuildResult`]: a map from part name
//! (`GUI_ASSETS_DATA`, `SCPI_COMMANDS`, ...) to a value. The results for one
//! configuration are merged into a single [`Parts`] map before templates are
//! rendered or files are written.

use std::borrow::Cow;
use std::collections::BTreeMap;

use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartValue {
  Bytes(Vec<u8>),
  Text(String),
  Flag(bool),
}

impl PartValue {
  /// Text form used when substituting into a template.
  pub fn as_text(&self) -> Cow<'_, str> {
    match self {
      PartValue::Bytes(bytes) => String::from_utf8_lossy(bytes),
      PartValue::Text(text) => Cow::Borrowed(text),
      PartValue::Flag(flag) => Cow::Borrowed(if *flag { "true" } else { "false" }),
    }
  }

  /// Byte form used when writing a part as a file body.
  pub fn as_bytes(&self) -> Cow<'_, [u8]> {
    match self {
      PartValue::Bytes(bytes) => Cow::Borrowed(bytes),
      PartValue::Text(text) => Cow::Borrowed(text.as_bytes()),
      PartValue::Flag(_) => Cow::Owned(self.as_text().as_bytes().to_vec()),
    }
  }

  pub fn len(&self) -> usize {
    self.as_bytes().len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  pub fn kind(&self) -> &'static str {
    match self {
      PartValue::Bytes(_) => "bytes",
      PartValue::Text(_) => "text",
      PartValue::Flag(_) => "flag",
    }
  }
}

impl From<String> for PartValue {
  fn from(value: String) -> Self {
    PartValue::Text(value)
  }
}

impl From<&str> for PartValue {
  fn from(value: &str) -> Self {
    PartValue::Text(value.to_string())
  }
}

impl From<Vec<u8>> for PartValue {
  fn from(value: Vec<u8>) -> Self {
    PartValue::Bytes(value)
  }
}

impl From<bool> for PartValue {
  fn from(value: bool) -> Self {
    PartValue::Flag(value)
  }
}

/// Output of one sub-builder for one configuration.
pub type BuildResult = BTreeMap<String, PartValue>;

/// Merged output of every sub-builder for one configuration.
pub type Parts = BTreeMap<String, PartValue>;

/// Parts keyed by configuration name.
pub type PartsByConfiguration = BTreeMap<String, Parts>;

/// Merge results left to right; a later result overwrites an earlier key.
pub fn merge(results: &[BuildResult]) -> Parts {
  let mut parts = Parts::new();
  for result in results {
    for (key, value) in result {
      if parts.insert(key.clone(), value.clone()).is_some() {
        warn!(part = %key, "part produced by more than one sub-builder, keeping the last value");
      }
    }
  }
  parts
}

#[cfg(test)]
mod tests {
  use super::*;
  use tracing_test::traced_test;

  fn result(entries: &[(&str, PartValue)]) -> BuildResult {
    entries.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
  }

  #[test]
  #[traced_test]
  fn later_results_win() {
    let merged = merge(&[
      result(&[("a", "1".into()), ("b", "2".into())]),
      result(&[("b", "3".into()), ("c", "4".into())]),
    ]);

    assert_eq!(merged.len(), 3);
    assert_eq!(merged["a"], PartValue::from("1"));
    assert_eq!(merged["b"], PartValue::from("3"));
    assert_eq!(merged["c"], PartValue::from("4"));
    assert!(logs_contain("part produced by more than one sub-builder"));
  }

  #[test]
  #[traced_test]
  fn disjoint_results_do_not_warn() {
    let merged = merge(&[result(&[("a", true.into())]), result(&[("b", vec![1u8, 2].into())])]);
    assert_eq!(merged.len(), 2);
    assert!(!logs_contain("more than one sub-builder"));
  }

  #[test]
  fn merge_of_nothing_is_empty() {
    assert!(merge(&[]).is_empty());
  }

  #[test]
  fn text_and_byte_views() {
    assert_eq!(PartValue::Bytes(b"abc".to_vec()).as_text(), "abc");
    assert_eq!(PartValue::Flag(true).as_text(), "true");
    assert_eq!(PartValue::Text("xy".into()).as_bytes().as_ref(), b"xy");
    assert_eq!(PartValue::Flag(false).len(), 5);
    assert!(PartValue::Text(String::new()).is_empty());
  }
}
