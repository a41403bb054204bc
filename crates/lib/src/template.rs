//! Section markers in build file templates.
//!
//! A template is ordinary source text (usually a C header or source file)
//! with section markers embedded in line comments:
//!
//! - `//${eez-studio PART_NAME}` - the part from the default configuration
//! - `//${eez-studio PART_NAME CONFIGURATION}` - the part from a named
//!   configuration, so one file can carry parts from several configurations
//!
//! Rendering is a single pass: substituted text is never scanned again, so a
//! part that happens to contain marker-like text is inserted verbatim.
//!
//! # Example
//!
//! ```
//! use studio_build_lib::template::{parse, Segment, SectionMarker};
//!
//! let segments = parse("x //${eez-studio FOO} y");
//! assert_eq!(segments, vec![
//!     Segment::Literal("x ".to_string()),
//!     Segment::Section(SectionMarker { part: "FOO".to_string(), configuration: None }),
//!     Segment::Literal(" y".to_string()),
//! ]);
//! ```

use std::collections::BTreeSet;

use thiserror::Error;

use crate::build::parts::PartsByConfiguration;

const MARKER_OPEN: &str = "//${eez-studio ";

/// A parsed section marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionMarker {
  pub part: String,
  /// Explicit configuration; `None` means the default one.
  pub configuration: Option<String>,
}

/// A segment of parsed template text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
  Literal(String),
  Section(SectionMarker),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
  #[error("unknown configuration '{0}' referenced by section marker")]
  MissingConfiguration(String),

  #[error("part '{part}' is not produced for configuration '{configuration}'")]
  MissingPart { part: String, configuration: String },
}

fn is_word(c: char) -> bool {
  c.is_ascii_alphanumeric() || c == '_'
}

/// Try to read one marker at the start of `input`.
///
/// Returns the marker and the number of bytes it spans.
fn match_marker(input: &str) -> Option<(SectionMarker, usize)> {
  let rest = input.strip_prefix(MARKER_OPEN)?;

  let part_len = rest.find(|c: char| !is_word(c)).unwrap_or(rest.len());
  let (part, rest) = rest.split_at(part_len);

  let space_len = rest.find(|c: char| !c.is_whitespace()).unwrap_or(rest.len());
  let rest = &rest[space_len..];

  let config_len = rest.find(|c: char| !is_word(c)).unwrap_or(rest.len());
  let (configuration, rest) = rest.split_at(config_len);

  rest.strip_prefix('}')?;

  let consumed = MARKER_OPEN.len() + part_len + space_len + config_len + 1;
  let marker = SectionMarker {
    part: part.to_string(),
    configuration: (!configuration.is_empty()).then(|| configuration.to_string()),
  };
  Some((marker, consumed))
}

/// Split a template into literal text and section markers.
///
/// Text that only resembles a marker (unterminated, or with characters other
/// than word characters and whitespace) is kept as literal text.
pub fn parse(template: &str) -> Vec<Segment> {
  let mut segments = Vec::new();
  let mut literal_start = 0;
  let mut pos = 0;

  while let Some(offset) = template[pos..].find(MARKER_OPEN) {
    let start = pos + offset;
    match match_marker(&template[start..]) {
      Some((marker, consumed)) => {
        if start > literal_start {
          segments.push(Segment::Literal(template[literal_start..start].to_string()));
        }
        segments.push(Segment::Section(marker));
        pos = start + consumed;
        literal_start = pos;
      }
      None => {
        pos = start + 1;
      }
    }
  }

  if literal_start < template.len() {
    segments.push(Segment::Literal(template[literal_start..].to_string()));
  }

  segments
}

/// Part names referenced by a template, sorted and de-duplicated.
///
/// Sub-builders use this to skip work for parts no build file asks for.
pub fn section_names(template: &str) -> BTreeSet<String> {
  parse(template)
    .into_iter()
    .filter_map(|segment| match segment {
      Segment::Section(marker) => Some(marker.part),
      Segment::Literal(_) => None,
    })
    .collect()
}

/// Render a template, substituting nothing for missing parts or configurations.
pub fn render(template: &str, parts: &PartsByConfiguration, default_configuration: &str) -> String {
  let mut out = String::with_capacity(template.len());
  for segment in parse(template) {
    match segment {
      Segment::Literal(text) => out.push_str(&text),
      Segment::Section(marker) => {
        let configuration = marker.configuration.as_deref().unwrap_or(default_configuration);
        if let Some(value) = parts.get(configuration).and_then(|p| p.get(&marker.part)) {
          out.push_str(&value.as_text());
        }
      }
    }
  }
  out
}

/// Render a template, failing on the first marker that cannot be resolved.
pub fn render_strict(
  template: &str,
  parts: &PartsByConfiguration,
  default_configuration: &str,
) -> Result<String, TemplateError> {
  let mut out = String::with_capacity(template.len());
  for segment in parse(template) {
    match segment {
      Segment::Literal(text) => out.push_str(&text),
      Segment::Section(marker) => {
        let configuration = marker.configuration.as_deref().unwrap_or(default_configuration);
        let configuration_parts = parts
          .get(configuration)
          .ok_or_else(|| TemplateError::MissingConfiguration(configuration.to_string()))?;
        let value = configuration_parts
          .get(&marker.part)
          .ok_or_else(|| TemplateError::MissingPart {
            part: marker.part.clone(),
            configuration: configuration.to_string(),
          })?;
        out.push_str(&value.as_text());
      }
    }
  }
  Ok(out)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::build::parts::{PartValue, Parts};

  fn parts_for(entries: &[(&str, &[(&str, &str)])]) -> PartsByConfiguration {
    entries
      .iter()
      .map(|(config, parts)| {
        let parts: Parts = parts
          .iter()
          .map(|(k, v)| (k.to_string(), PartValue::from(*v)))
          .collect();
        (config.to_string(), parts)
      })
      .collect()
  }

  // ==========================================================================
  // Parsing
  // ==========================================================================

  #[test]
  fn parse_marker_with_configuration() {
    assert_eq!(
      parse("//${eez-studio GUI_ASSETS_DATA Release}"),
      vec![Segment::Section(SectionMarker {
        part: "GUI_ASSETS_DATA".to_string(),
        configuration: Some("Release".to_string()),
      })]
    );
  }

  #[test]
  fn parse_keeps_near_misses_literal() {
    let text = "//${eez-studio FOO-BAR} //${eez-studio FOO //${eez FOO}";
    assert_eq!(parse(text), vec![Segment::Literal(text.to_string())]);
  }

  #[test]
  fn parse_adjacent_markers() {
    let segments = parse("//${eez-studio A}//${eez-studio B}\n");
    assert_eq!(segments.len(), 3);
    assert!(matches!(&segments[1], Segment::Section(m) if m.part == "B"));
    assert_eq!(segments[2], Segment::Literal("\n".to_string()));
  }

  #[test]
  fn parse_recovers_after_broken_marker() {
    let segments = parse("//${eez-studio BAD!} //${eez-studio GOOD}");
    assert_eq!(segments.len(), 2);
    assert_eq!(segments[0], Segment::Literal("//${eez-studio BAD!} ".to_string()));
  }

  #[test]
  fn parse_empty_template() {
    assert!(parse("").is_empty());
  }

  #[test]
  fn section_names_are_unique() {
    let names = section_names("//${eez-studio B}\n//${eez-studio A}\n//${eez-studio B Release}");
    assert_eq!(names.into_iter().collect::<Vec<_>>(), vec!["A", "B"]);
  }

  // ==========================================================================
  // Rendering
  // ==========================================================================

  #[test]
  fn render_substitutes_part() {
    let parts = parts_for(&[("default", &[("FOO", "BAR")])]);
    assert_eq!(render("x //${eez-studio FOO} y", &parts, "default"), "x BAR y");
  }

  #[test]
  fn render_missing_part_is_empty() {
    let parts = parts_for(&[("default", &[])]);
    assert_eq!(render("x //${eez-studio FOO} y", &parts, "default"), "x  y");
  }

  #[test]
  fn render_missing_configuration_is_empty() {
    let parts = parts_for(&[("default", &[("FOO", "BAR")])]);
    assert_eq!(render("[//${eez-studio FOO Nope}]", &parts, "default"), "[]");
  }

  #[test]
  fn render_mixes_configurations() {
    let parts = parts_for(&[("Debug", &[("DATA", "d")]), ("Release", &[("DATA", "r")])]);
    let text = "//${eez-studio DATA Debug}|//${eez-studio DATA Release}|//${eez-studio DATA}";
    assert_eq!(render(text, &parts, "Release"), "d|r|r");
  }

  #[test]
  fn render_is_single_pass() {
    let parts = parts_for(&[("default", &[("A", "//${eez-studio B}"), ("B", "nope")])]);
    assert_eq!(render("//${eez-studio A}", &parts, "default"), "//${eez-studio B}");
  }

  #[test]
  fn render_strict_reports_missing() {
    let parts = parts_for(&[("default", &[("FOO", "BAR")])]);
    assert_eq!(render_strict("//${eez-studio FOO}", &parts, "default").unwrap(), "BAR");
    assert_eq!(
      render_strict("//${eez-studio QUX}", &parts, "default"),
      Err(TemplateError::MissingPart {
        part: "QUX".to_string(),
        configuration: "default".to_string(),
      })
    );
    assert_eq!(
      render_strict("//${eez-studio FOO Release}", &parts, "default"),
      Err(TemplateError::MissingConfiguration("Release".to_string()))
    );
  }
}
