//! The check pass: recursive, memoized validation of the project tree.
//!
//! Every node is checked by the validator registered for its class and by the
//! validator registered for the property slot that holds it. A node whose own
//! or descendant checks produced messages contributes one `GROUP` message,
//! labeled with the node's label, holding those messages. Nodes with nothing
//! to report contribute nothing.
//!
//! Results are cached per `(node id, owning slot)` together with a content
//! stamp of the node's whole subtree. When the stamp is unchanged the cached
//! group is reused and no validator runs for that subtree.

mod background;
pub mod validators;

pub use background::BackgroundChecker;

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, trace};

use crate::output::Message;
use crate::project::{ChildValue, NodeId, ObjectNode};
use crate::util::hash::{Hashable, ObjectHash};

/// Parent class wildcard for property validators.
pub const ANY_CLASS: &str = "*";

pub type Validator = fn(&ObjectNode) -> Vec<Message>;

#[derive(Debug, Clone, Default)]
pub struct ValidatorRegistry {
  classes: HashMap<String, Validator>,
  properties: HashMap<(String, String), Validator>,
}

impl ValidatorRegistry {
  /// An empty registry.
  pub fn new() -> Self {
    Self::default()
  }

  /// A registry with the built-in validators.
  pub fn with_defaults() -> Self {
    let mut registry = Self::new();
    validators::register_defaults(&mut registry);
    registry
  }

  pub fn register_class(&mut self, class: &str, validator: Validator) {
    self.classes.insert(class.to_string(), validator);
  }

  /// Register a validator for objects held in `parent_class.property`.
  /// Use [`ANY_CLASS`] to match the property on every parent class.
  pub fn register_property(&mut self, parent_class: &str, property: &str, validator: Validator) {
    self
      .properties
      .insert((parent_class.to_string(), property.to_string()), validator);
  }

  fn class_validator(&self, class: &str) -> Option<Validator> {
    self.classes.get(class).copied()
  }

  fn property_validator(&self, parent_class: &str, property: &str) -> Option<Validator> {
    self
      .properties
      .get(&(parent_class.to_string(), property.to_string()))
      .or_else(|| self.properties.get(&(ANY_CLASS.to_string(), property.to_string())))
      .copied()
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
  node: NodeId,
  slot: Option<(String, String)>,
}

#[derive(Debug, Clone)]
struct CacheEntry {
  stamp: ObjectHash,
  group: Option<Message>,
}

/// Counters from the most recent run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CheckStats {
  /// Nodes whose validators ran.
  pub validated: usize,
  /// Subtrees answered from the cache.
  pub reused: usize,
}

#[derive(Debug, Default)]
struct CheckState {
  cache: HashMap<CacheKey, CacheEntry>,
  stats: CheckStats,
}

#[derive(Debug)]
pub struct CheckPass {
  registry: ValidatorRegistry,
  state: Mutex<CheckState>,
}

impl Default for CheckPass {
  fn default() -> Self {
    Self::new(ValidatorRegistry::with_defaults())
  }
}

impl CheckPass {
  pub fn new(registry: ValidatorRegistry) -> Self {
    Self {
      registry,
      state: Mutex::new(CheckState::default()),
    }
  }

  fn lock(&self) -> MutexGuard<'_, CheckState> {
    self.state.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// Check the whole tree rooted at `root`. Never modifies the tree.
  pub fn check(&self, root: &ObjectNode) -> Vec<Message> {
    let mut state = self.lock();
    state.stats = CheckStats::default();

    let mut visited = HashSet::new();
    let result = self.visit(&mut state, &mut visited, root, None);

    // Entries for nodes that no longer exist would never be hit again.
    state.cache.retain(|key, _| visited.contains(key));

    debug!(
      validated = state.stats.validated,
      reused = state.stats.reused,
      "check pass finished"
    );
    result.into_iter().collect()
  }

  pub fn last_stats(&self) -> CheckStats {
    self.lock().stats
  }

  /// Forget every cached result.
  pub fn invalidate(&self) {
    self.lock().cache.clear();
  }

  fn visit(
    &self,
    state: &mut CheckState,
    visited: &mut HashSet<CacheKey>,
    node: &ObjectNode,
    slot: Option<(&str, &str)>,
  ) -> Option<Message> {
    let key = CacheKey {
      node: node.id.clone(),
      slot: slot.map(|(parent, prop)| (parent.to_string(), prop.to_string())),
    };
    let stamp = node.compute_hash().ok();

    if let (Some(stamp), Some(entry)) = (&stamp, state.cache.get(&key)) {
      if entry.stamp == *stamp {
        trace!(node = %node.id, "check cache hit");
        state.stats.reused += 1;
        let group = entry.group.clone();
        mark_subtree(visited, node, key);
        return group;
      }
    }

    state.stats.validated += 1;
    let mut messages = Vec::new();
    if let Some(validator) = self.registry.class_validator(&node.class) {
      messages.extend(validator(node));
    }
    if let Some((parent_class, property)) = slot {
      if let Some(validator) = self.registry.property_validator(parent_class, property) {
        messages.extend(validator(node));
      }
    }

    for child in &node.children {
      let child_slot = Some((node.class.as_str(), child.name.as_str()));
      match &child.value {
        ChildValue::Object(obj) => messages.extend(self.visit(state, visited, obj, child_slot)),
        ChildValue::Array(nodes) => {
          for item in nodes {
            messages.extend(self.visit(state, visited, item, child_slot));
          }
        }
      }
    }

    let group = (!messages.is_empty()).then(|| Message::group(node.label(), messages).with_node(node.id.clone()));

    visited.insert(key.clone());
    if let Some(stamp) = stamp {
      state.cache.insert(
        key,
        CacheEntry {
          stamp,
          group: group.clone(),
        },
      );
    }
    group
  }
}

/// Keep cache entries below a reused subtree alive.
fn mark_subtree(visited: &mut HashSet<CacheKey>, node: &ObjectNode, key: CacheKey) {
  visited.insert(key);
  for child in &node.children {
    let slot = Some((node.class.clone(), child.name.clone()));
    let items: Vec<&ObjectNode> = match &child.value {
      ChildValue::Object(obj) => vec![obj.as_ref()],
      ChildValue::Array(nodes) => nodes.iter().collect(),
    };
    for item in items {
      let child_key = CacheKey {
        node: item.id.clone(),
        slot: slot.clone(),
      };
      mark_subtree(visited, item, child_key);
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::output::{MessageKind, count_kind};
  use serde_json::{Value, json};

  fn tree(value: Value) -> ObjectNode {
    ObjectNode::from_document(value.as_object().unwrap())
  }

  fn sample() -> Value {
    json!({
      "settings": {
        "build": {
          "files": [{ "fileName": "gui.h" }, { "fileName": "" }]
        }
      },
      "pages": [
        { "name": "Main", "components": [{ "type": "Label", "width": 10 }] },
        { "name": "", "components": [{ "width": -1 }] }
      ]
    })
  }

  /// Every group must hold at least one message.
  fn assert_no_empty_groups(messages: &[Message]) {
    for m in messages {
      if m.kind == MessageKind::Group {
        assert!(!m.children.is_empty(), "empty group {}", m.text);
        assert_no_empty_groups(&m.children);
      }
    }
  }

  // ==========================================================================
  // Grouping
  // ==========================================================================

  #[test]
  fn clean_tree_produces_nothing() {
    let pass = CheckPass::default();
    let root = tree(json!({ "pages": [{ "name": "Main" }] }));
    assert!(pass.check(&root).is_empty());
  }

  #[test]
  fn messages_are_grouped_per_node() {
    let pass = CheckPass::default();
    let messages = pass.check(&tree(sample()));

    // A single root group wraps everything.
    assert_eq!(messages.len(), 1);
    let root = &messages[0];
    assert_eq!(root.kind, MessageKind::Group);
    assert_eq!(root.text, "Project");
    assert_no_empty_groups(&messages);

    // settings/build/files[1], pages[1] name, pages[1]/components[0] type + width
    assert_eq!(count_kind(&messages, MessageKind::Error), 4);

    let labels: Vec<&str> = root.children.iter().map(|m| m.text.as_str()).collect();
    assert_eq!(labels, vec!["Page", "Settings"]);

    let page = &root.children[0];
    assert_eq!(page.node, Some(NodeId("/pages/1".to_string())));
    assert_eq!(page.children[0].text, "\"Name\": not set.");
    assert_eq!(page.children[1].kind, MessageKind::Group);
    assert_eq!(page.children[1].children.len(), 2);
  }

  #[test]
  fn check_is_idempotent() {
    let pass = CheckPass::default();
    let root = tree(sample());
    let first = pass.check(&root);
    let second = pass.check(&root);
    assert_eq!(first, second);

    let fresh = CheckPass::default().check(&root);
    assert_eq!(first, fresh);
  }

  // ==========================================================================
  // Memoization
  // ==========================================================================

  #[test]
  fn unchanged_tree_reuses_root() {
    let pass = CheckPass::default();
    let root = tree(sample());
    pass.check(&root);
    assert!(pass.last_stats().validated > 0);

    pass.check(&root);
    assert_eq!(pass.last_stats(), CheckStats { validated: 0, reused: 1 });
  }

  #[test]
  fn only_changed_path_is_revalidated() {
    let pass = CheckPass::default();
    let mut doc = sample();
    pass.check(&tree(doc.clone()));

    doc["pages"][0]["name"] = json!("");
    let messages = pass.check(&tree(doc));

    // Root and pages[0] are revalidated; the unchanged component, pages[1] and settings are reused.
    let stats = pass.last_stats();
    assert_eq!(stats.validated, 2);
    assert_eq!(stats.reused, 3);
    assert_eq!(count_kind(&messages, MessageKind::Error), 5);
  }

  #[test]
  fn invalidate_forces_full_run() {
    let pass = CheckPass::default();
    let root = tree(sample());
    pass.check(&root);
    pass.invalidate();
    pass.check(&root);
    assert_eq!(pass.last_stats().reused, 0);
  }

  // ==========================================================================
  // Registry
  // ==========================================================================

  fn always_warn(node: &ObjectNode) -> Vec<Message> {
    vec![Message::warning(format!("saw {}", node.class))]
  }

  #[test]
  fn property_validator_applies_to_slot_only() {
    let mut registry = ValidatorRegistry::new();
    registry.register_property("Project", "extra", always_warn);
    let pass = CheckPass::new(registry);

    let messages = pass.check(&tree(json!({ "extra": [{ "a": 1 }], "other": [{ "a": 1 }] })));
    assert_eq!(count_kind(&messages, MessageKind::Warning), 1);
    assert_eq!(messages[0].children[0].children[0].text, "saw Extra");
  }

  #[test]
  fn wildcard_property_validator() {
    let mut registry = ValidatorRegistry::new();
    registry.register_property(ANY_CLASS, "children", always_warn);
    let pass = CheckPass::new(registry);

    let messages = pass.check(&tree(json!({
      "pages": [{ "components": [{ "type": "Panel", "children": [{ "type": "Label" }] }] }]
    })));
    assert_eq!(count_kind(&messages, MessageKind::Warning), 1);
  }

  #[test]
  fn class_and_property_validators_both_run() {
    let mut registry = ValidatorRegistry::new();
    registry.register_class("Label", always_warn);
    registry.register_property("Page", "components", always_warn);
    let pass = CheckPass::new(registry);

    let messages = pass.check(&tree(json!({ "pages": [{ "components": [{ "type": "Label" }] }] })));
    assert_eq!(count_kind(&messages, MessageKind::Warning), 2);
  }
}
