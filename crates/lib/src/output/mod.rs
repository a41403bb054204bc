//! Diagnostics store shared by the build and the check pass.
//!
//! [`OutputSections`] is a cheap cloneable handle over shared state holding
//! two named sections: `OUTPUT` (build progress and errors) and `CHECKS`
//! (validation messages). It is passed explicitly to every component rather
//! than living in a global, so independent builds never see each other's
//! messages.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::build::BuildError;
use crate::project::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Section {
  Output,
  Checks,
}

impl fmt::Display for Section {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Section::Output => write!(f, "OUTPUT"),
      Section::Checks => write!(f, "CHECKS"),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MessageKind {
  Info,
  Warning,
  Error,
  Group,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
  pub kind: MessageKind,
  pub text: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub node: Option<NodeId>,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub children: Vec<Message>,
}

impl Message {
  pub fn new(kind: MessageKind, text: impl Into<String>) -> Self {
    Self {
      kind,
      text: text.into(),
      node: None,
      children: Vec::new(),
    }
  }

  pub fn info(text: impl Into<String>) -> Self {
    Self::new(MessageKind::Info, text)
  }

  pub fn warning(text: impl Into<String>) -> Self {
    Self::new(MessageKind::Warning, text)
  }

  pub fn error(text: impl Into<String>) -> Self {
    Self::new(MessageKind::Error, text)
  }

  pub fn group(text: impl Into<String>, children: Vec<Message>) -> Self {
    Self {
      children,
      ..Self::new(MessageKind::Group, text)
    }
  }

  pub fn with_node(mut self, node: NodeId) -> Self {
    self.node = Some(node);
    self
  }

  fn count(&self, kind: MessageKind) -> usize {
    let own = usize::from(self.kind == kind);
    own + self.children.iter().map(|c| c.count(kind)).sum::<usize>()
  }
}

/// Count messages of `kind` in `messages`, recursing into groups.
pub fn count_kind(messages: &[Message], kind: MessageKind) -> usize {
  messages.iter().map(|m| m.count(kind)).sum()
}

#[derive(Debug, Default)]
struct SectionState {
  messages: Vec<Message>,
  open_groups: Vec<Message>,
  loading: bool,
}

impl SectionState {
  fn push(&mut self, message: Message) {
    match self.open_groups.last_mut() {
      Some(group) => group.children.push(message),
      None => self.messages.push(message),
    }
  }
}

#[derive(Debug, Default)]
struct Sections {
  output: SectionState,
  checks: SectionState,
}

impl Sections {
  fn get(&mut self, section: Section) -> &mut SectionState {
    match section {
      Section::Output => &mut self.output,
      Section::Checks => &mut self.checks,
    }
  }
}

#[derive(Debug, Clone, Default)]
pub struct OutputSections {
  inner: Arc<Mutex<Sections>>,
}

impl OutputSections {
  pub fn new() -> Self {
    Self::default()
  }

  fn lock(&self) -> MutexGuard<'_, Sections> {
    self.inner.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// Drop every message and any open group in `section`.
  pub fn clear(&self, section: Section) {
    let mut sections = self.lock();
    let state = sections.get(section);
    state.messages.clear();
    state.open_groups.clear();
  }

  /// Append a message, into the innermost open group if there is one.
  pub fn write(&self, section: Section, kind: MessageKind, text: impl Into<String>, node: Option<NodeId>) {
    let text = text.into();
    match kind {
      MessageKind::Info => info!(section = %section, node = ?node, "{text}"),
      MessageKind::Warning => warn!(section = %section, node = ?node, "{text}"),
      MessageKind::Error => error!(section = %section, node = ?node, "{text}"),
      MessageKind::Group => debug!(section = %section, node = ?node, "{text}"),
    }

    let message = Message {
      kind,
      text,
      node,
      children: Vec::new(),
    };
    self.lock().get(section).push(message);
  }

  pub fn open_group(&self, section: Section, text: impl Into<String>, node: Option<NodeId>) {
    let mut group = Message::group(text, Vec::new());
    group.node = node;
    self.lock().get(section).open_groups.push(group);
  }

  /// Close the innermost open group. Does nothing when no group is open.
  pub fn close_group(&self, section: Section) {
    let mut sections = self.lock();
    let state = sections.get(section);
    if let Some(group) = state.open_groups.pop() {
      state.push(group);
    }
  }

  /// Replace the contents of `section` wholesale.
  pub fn set_messages(&self, section: Section, messages: Vec<Message>) {
    let mut sections = self.lock();
    let state = sections.get(section);
    state.open_groups.clear();
    state.messages = messages;
  }

  pub fn messages(&self, section: Section) -> Vec<Message> {
    self.lock().get(section).messages.clone()
  }

  pub fn num_errors(&self, section: Section) -> usize {
    count_kind(&self.lock().get(section).messages, MessageKind::Error)
  }

  pub fn num_warnings(&self, section: Section) -> usize {
    count_kind(&self.lock().get(section).messages, MessageKind::Warning)
  }

  pub fn set_loading(&self, section: Section, loading: bool) {
    self.lock().get(section).loading = loading;
  }

  pub fn is_loading(&self, section: Section) -> bool {
    self.lock().get(section).loading
  }

  /// Raise the loading flag for the lifetime of the returned guard.
  ///
  /// Fails with [`BuildError::Busy`] when the flag is already raised, which
  /// keeps builds single-flight.
  pub fn begin_loading(&self, section: Section) -> Result<LoadingGuard, BuildError> {
    {
      let mut sections = self.lock();
      let state = sections.get(section);
      if state.loading {
        return Err(BuildError::Busy);
      }
      state.loading = true;
    }
    Ok(LoadingGuard {
      sections: self.clone(),
      section,
    })
  }

  /// Tally of everything reported so far, OUTPUT and CHECKS together,
  /// e.g. `1 error and 2 warnings detected`.
  pub fn check_result_summary(&self) -> (MessageKind, String) {
    let num_errors = self.num_errors(Section::Output) + self.num_errors(Section::Checks);
    let num_warnings = self.num_warnings(Section::Output) + self.num_warnings(Section::Checks);

    let errors = match num_errors {
      0 => "No error".to_string(),
      1 => "1 error".to_string(),
      n => format!("{n} errors"),
    };
    let warnings = match num_warnings {
      0 => "no warning".to_string(),
      1 => "1 warning".to_string(),
      n => format!("{n} warnings"),
    };

    let kind = if num_errors > 0 {
      MessageKind::Error
    } else if num_warnings > 0 {
      MessageKind::Warning
    } else {
      MessageKind::Info
    };

    (kind, format!("{errors} and {warnings} detected"))
  }

  /// Write the tally to OUTPUT at the matching severity.
  pub fn show_check_result(&self) {
    let (kind, text) = self.check_result_summary();
    self.write(Section::Output, kind, text, None);
  }
}

/// Clears a section's loading flag when dropped.
#[derive(Debug)]
pub struct LoadingGuard {
  sections: OutputSections,
  section: Section,
}

impl Drop for LoadingGuard {
  fn drop(&mut self) {
    self.sections.set_loading(self.section, false);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  // ==========================================================================
  // Messages and groups
  // ==========================================================================

  #[test]
  fn writes_go_to_their_section() {
    let out = OutputSections::new();
    out.write(Section::Output, MessageKind::Info, "building", None);
    out.write(Section::Checks, MessageKind::Error, "bad", Some(NodeId("n1".into())));

    assert_eq!(out.messages(Section::Output), vec![Message::info("building")]);
    let checks = out.messages(Section::Checks);
    assert_eq!(checks[0].node, Some(NodeId("n1".into())));
    assert_eq!(out.num_errors(Section::Output), 0);
    assert_eq!(out.num_errors(Section::Checks), 1);
  }

  #[test]
  fn groups_nest_and_count_recursively() {
    let out = OutputSections::new();
    out.open_group(Section::Output, "Building Debug configuration", None);
    out.write(Section::Output, MessageKind::Warning, "w", None);
    out.open_group(Section::Output, "inner", None);
    out.write(Section::Output, MessageKind::Error, "e", None);
    out.close_group(Section::Output);
    out.close_group(Section::Output);
    out.write(Section::Output, MessageKind::Info, "after", None);

    let messages = out.messages(Section::Output);
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].kind, MessageKind::Group);
    assert_eq!(messages[0].children.len(), 2);
    assert_eq!(messages[0].children[1].children[0].text, "e");
    assert_eq!(out.num_errors(Section::Output), 1);
    assert_eq!(out.num_warnings(Section::Output), 1);
  }

  #[test]
  fn close_group_without_open_group_is_noop() {
    let out = OutputSections::new();
    out.close_group(Section::Output);
    assert!(out.messages(Section::Output).is_empty());
  }

  #[test]
  fn clear_drops_messages_and_open_groups() {
    let out = OutputSections::new();
    out.write(Section::Output, MessageKind::Info, "a", None);
    out.open_group(Section::Output, "g", None);
    out.clear(Section::Output);
    out.close_group(Section::Output);
    assert!(out.messages(Section::Output).is_empty());
  }

  #[test]
  fn clones_share_state() {
    let out = OutputSections::new();
    let other = out.clone();
    other.write(Section::Checks, MessageKind::Warning, "w", None);
    assert_eq!(out.num_warnings(Section::Checks), 1);
  }

  // ==========================================================================
  // Loading flag
  // ==========================================================================

  #[test]
  fn loading_guard_is_single_flight() {
    let out = OutputSections::new();
    let guard = out.begin_loading(Section::Output).unwrap();
    assert!(out.is_loading(Section::Output));
    assert!(matches!(out.begin_loading(Section::Output), Err(BuildError::Busy)));
    drop(guard);
    assert!(!out.is_loading(Section::Output));
    assert!(out.begin_loading(Section::Output).is_ok());
  }

  #[test]
  fn loading_flags_are_per_section() {
    let out = OutputSections::new();
    let _guard = out.begin_loading(Section::Output).unwrap();
    assert!(!out.is_loading(Section::Checks));
    out.set_loading(Section::Checks, true);
    assert!(out.is_loading(Section::Checks));
  }

  // ==========================================================================
  // Summary
  // ==========================================================================

  #[test]
  fn summary_wording() {
    let out = OutputSections::new();
    assert_eq!(
      out.check_result_summary(),
      (MessageKind::Info, "No error and no warning detected".to_string())
    );

    out.set_messages(
      Section::Checks,
      vec![Message::group(
        "Page: Main",
        vec![Message::error("e"), Message::warning("w1"), Message::warning("w2")],
      )],
    );
    assert_eq!(
      out.check_result_summary(),
      (MessageKind::Error, "1 error and 2 warnings detected".to_string())
    );

    out.set_messages(Section::Checks, vec![Message::warning("w")]);
    assert_eq!(
      out.check_result_summary(),
      (MessageKind::Warning, "No error and 1 warning detected".to_string())
    );
  }

  #[test]
  fn show_check_result_writes_to_output() {
    let out = OutputSections::new();
    out.set_messages(Section::Checks, vec![Message::error("a"), Message::error("b")]);
    out.show_check_result();
    let messages = out.messages(Section::Output);
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].kind, MessageKind::Error);
    assert_eq!(messages[0].text, "2 errors and no warning detected");
  }

  #[test]
  fn summary_counts_output_errors() {
    let out = OutputSections::new();
    out.write(Section::Output, MessageKind::Error, "boom", None);
    out.write(Section::Output, MessageKind::Warning, "careful", None);
    out.set_messages(Section::Checks, vec![Message::error("a")]);
    assert_eq!(
      out.check_result_summary(),
      (MessageKind::Error, "2 errors and 1 warning detected".to_string())
    );
  }
}
