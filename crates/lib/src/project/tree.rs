//! Generic object tree over a project document.
//!
//! The check pass and the sub-builders walk the project without knowing every
//! object type up front. Each JSON object becomes an [`ObjectNode`] whose
//! scalar fields are kept as properties, and whose object or array-of-object
//! fields become child slots.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::util::hash::Hashable;

/// Class of the document root.
pub const ROOT_CLASS: &str = "Project";

/// Stable identity of a node: its `objID` when present, else its JSON path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(pub String);

impl fmt::Display for NodeId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ChildValue {
  Object(Box<ObjectNode>),
  Array(Vec<ObjectNode>),
}

/// A property slot holding one object or an array of objects.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChildProperty {
  pub name: String,
  pub value: ChildValue,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectNode {
  pub id: NodeId,
  pub class: String,
  pub properties: BTreeMap<String, Value>,
  pub children: Vec<ChildProperty>,
}

impl Hashable for ObjectNode {}

/// Known `(parent class, property) -> class` pairs.
///
/// Looked up before a `type` field so that objects whose `type` is data (a
/// variable's value type, for instance) still get their structural class.
const CLASS_TABLE: &[((&str, &str), &str)] = &[
  (("Project", "settings"), "Settings"),
  (("Settings", "general"), "General"),
  (("Settings", "build"), "Build"),
  (("Build", "configurations"), "BuildConfiguration"),
  (("Build", "files"), "BuildFile"),
  (("Project", "pages"), "Page"),
  (("Project", "styles"), "Style"),
  (("Project", "fonts"), "Font"),
  (("Project", "bitmaps"), "Bitmap"),
  (("Project", "actions"), "Action"),
  (("Project", "variables"), "ProjectVariables"),
  (("ProjectVariables", "globalVariables"), "Variable"),
  (("Project", "scpi"), "Scpi"),
  (("Scpi", "subsystems"), "ScpiSubsystem"),
  (("ScpiSubsystem", "commands"), "ScpiCommand"),
  (("Project", "micropython"), "MicroPython"),
];

fn child_class(parent_class: &str, property: &str, value: &Map<String, Value>) -> String {
  if let Some((_, class)) = CLASS_TABLE
    .iter()
    .find(|((parent, prop), _)| *parent == parent_class && *prop == property)
  {
    return (*class).to_string();
  }

  if let Some(Value::String(type_name)) = value.get("type") {
    return type_name.clone();
  }

  pascal_case(property)
}

fn pascal_case(input: &str) -> String {
  let mut chars = input.chars();
  match chars.next() {
    Some(first) => first.to_uppercase().chain(chars).collect(),
    None => String::new(),
  }
}

impl ObjectNode {
  /// Build the tree rooted at a project document.
  pub fn from_document(document: &Map<String, Value>) -> Self {
    Self::build(ROOT_CLASS.to_string(), String::new(), document)
  }

  fn build(class: String, path: String, object: &Map<String, Value>) -> Self {
    let id = match object.get("objID") {
      Some(Value::String(obj_id)) if !obj_id.is_empty() => NodeId(obj_id.clone()),
      _ if path.is_empty() => NodeId("/".to_string()),
      _ => NodeId(path.clone()),
    };

    let mut properties = BTreeMap::new();
    let mut children = Vec::new();

    for (key, value) in object {
      match value {
        Value::Object(child) => {
          let child_path = format!("{path}/{key}");
          let node = Self::build(child_class(&class, key, child), child_path, child);
          children.push(ChildProperty {
            name: key.clone(),
            value: ChildValue::Object(Box::new(node)),
          });
        }
        Value::Array(items) if !items.is_empty() && items.iter().all(Value::is_object) => {
          let nodes = items
            .iter()
            .enumerate()
            .filter_map(|(index, item)| item.as_object().map(|obj| (index, obj)))
            .map(|(index, obj)| Self::build(child_class(&class, key, obj), format!("{path}/{key}/{index}"), obj))
            .collect();
          children.push(ChildProperty {
            name: key.clone(),
            value: ChildValue::Array(nodes),
          });
        }
        _ => {
          properties.insert(key.clone(), value.clone());
        }
      }
    }

    Self {
      id,
      class,
      properties,
      children,
    }
  }

  pub fn str_prop(&self, name: &str) -> Option<&str> {
    self.properties.get(name).and_then(Value::as_str)
  }

  pub fn int_prop(&self, name: &str) -> Option<i64> {
    self.properties.get(name).and_then(Value::as_i64)
  }

  pub fn bool_prop(&self, name: &str) -> Option<bool> {
    self.properties.get(name).and_then(Value::as_bool)
  }

  /// The single-object child in slot `name`.
  pub fn object(&self, name: &str) -> Option<&ObjectNode> {
    self.children.iter().find(|c| c.name == name).and_then(|c| match &c.value {
      ChildValue::Object(node) => Some(node.as_ref()),
      ChildValue::Array(_) => None,
    })
  }

  /// The array child in slot `name`; empty when absent.
  pub fn array(&self, name: &str) -> &[ObjectNode] {
    self
      .children
      .iter()
      .find(|c| c.name == name)
      .map(|c| match &c.value {
        ChildValue::Array(nodes) => nodes.as_slice(),
        ChildValue::Object(_) => &[][..],
      })
      .unwrap_or(&[])
  }

  /// Human-readable label used for diagnostics groups.
  pub fn label(&self) -> String {
    match self.str_prop("name").or_else(|| self.str_prop("fileName")) {
      Some(name) if !name.is_empty() => format!("{}: {}", self.class, name),
      _ => self.class.clone(),
    }
  }

  /// Depth-first iteration over this node and all its descendants.
  pub fn walk(&self) -> Vec<&ObjectNode> {
    let mut out = Vec::new();
    let mut stack = vec![self];
    while let Some(node) = stack.pop() {
      out.push(node);
      for child in node.children.iter().rev() {
        match &child.value {
          ChildValue::Object(obj) => stack.push(obj),
          ChildValue::Array(nodes) => stack.extend(nodes.iter().rev()),
        }
      }
    }
    out
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn tree(value: Value) -> ObjectNode {
    ObjectNode::from_document(value.as_object().unwrap())
  }

  #[test]
  fn classes_from_table_type_and_name() {
    let root = tree(json!({
      "pages": [{
        "name": "Main",
        "components": [{ "type": "LVGLLabelWidget", "text": "hi" }]
      }],
      "variables": { "globalVariables": [{ "name": "counter", "type": "integer" }] },
      "gui": { "x": 1 }
    }));

    let page = &root.array("pages")[0];
    assert_eq!(page.class, "Page");
    assert_eq!(page.array("components")[0].class, "LVGLLabelWidget");

    let vars = root.object("variables").unwrap();
    assert_eq!(vars.class, "ProjectVariables");
    assert_eq!(vars.array("globalVariables")[0].class, "Variable");

    assert_eq!(root.object("gui").unwrap().class, "Gui");
  }

  #[test]
  fn ids_prefer_obj_id() {
    let root = tree(json!({
      "pages": [{ "objID": "abc-1", "name": "Main" }, { "name": "Other" }]
    }));
    let pages = root.array("pages");
    assert_eq!(pages[0].id, NodeId("abc-1".to_string()));
    assert_eq!(pages[1].id, NodeId("/pages/1".to_string()));
    assert_eq!(root.id, NodeId("/".to_string()));
  }

  #[test]
  fn scalars_and_empty_arrays_are_properties() {
    let root = tree(json!({ "name": "p", "tags": [], "sizes": [1, 2] }));
    assert!(root.children.is_empty());
    assert_eq!(root.str_prop("name"), Some("p"));
    assert!(root.properties.contains_key("tags"));
    assert!(root.properties.contains_key("sizes"));
    assert!(root.array("tags").is_empty());
  }

  #[test]
  fn label_uses_name() {
    let root = tree(json!({ "pages": [{ "name": "Main" }, {}] }));
    assert_eq!(root.array("pages")[0].label(), "Page: Main");
    assert_eq!(root.array("pages")[1].label(), "Page");
  }

  #[test]
  fn walk_visits_in_document_order() {
    let root = tree(json!({
      "pages": [
        { "name": "A", "components": [{ "type": "W", "name": "a1" }] },
        { "name": "B" }
      ]
    }));
    let labels: Vec<String> = root.walk().iter().map(|n| n.label()).collect();
    assert_eq!(labels, vec!["Project", "Page: A", "W: a1", "Page: B"]);
  }
}
