//! Built-in validators for the project classes the build pipeline knows.

use crate::output::Message;
use crate::project::ObjectNode;

use super::ValidatorRegistry;

/// `fileName` -> `File name`.
pub fn humanize_property_name(name: &str) -> String {
  let mut out = String::with_capacity(name.len() + 4);
  for (index, c) in name.chars().enumerate() {
    if index == 0 {
      out.extend(c.to_uppercase());
    } else if c.is_ascii_uppercase() {
      out.push(' ');
      out.push(c.to_ascii_lowercase());
    } else {
      out.push(c);
    }
  }
  out
}

pub fn property_not_set(node: &ObjectNode, property: &str) -> Message {
  Message::error(format!("\"{}\": not set.", humanize_property_name(property))).with_node(node.id.clone())
}

pub fn property_invalid_value(node: &ObjectNode, property: &str) -> Message {
  Message::error(format!("\"{}\": invalid value.", humanize_property_name(property))).with_node(node.id.clone())
}

fn is_blank(node: &ObjectNode, property: &str) -> bool {
  match node.properties.get(property) {
    None | Some(serde_json::Value::Null) => true,
    Some(serde_json::Value::String(s)) => s.trim().is_empty(),
    Some(_) => false,
  }
}

fn require(node: &ObjectNode, properties: &[&str]) -> Vec<Message> {
  properties
    .iter()
    .filter(|p| is_blank(node, p))
    .map(|p| property_not_set(node, p))
    .collect()
}

fn check_named(node: &ObjectNode) -> Vec<Message> {
  require(node, &["name"])
}

fn check_build_configuration(node: &ObjectNode) -> Vec<Message> {
  let mut messages = require(node, &["name"]);
  if let Some(text) = node.str_prop("properties") {
    if !text.trim().is_empty() && serde_json::from_str::<serde_json::Value>(text).is_err() {
      messages.push(property_invalid_value(node, "properties"));
    }
  }
  messages
}

fn check_build_file(node: &ObjectNode) -> Vec<Message> {
  require(node, &["fileName"])
}

fn check_variable(node: &ObjectNode) -> Vec<Message> {
  require(node, &["name", "type"])
}

fn check_bitmap(node: &ObjectNode) -> Vec<Message> {
  require(node, &["name", "image"])
}

/// Validator for whatever object sits in a widget slot.
fn check_widget_slot(node: &ObjectNode) -> Vec<Message> {
  let mut messages = require(node, &["type"]);
  for dimension in ["width", "height"] {
    if node.int_prop(dimension).is_some_and(|v| v < 0) {
      messages.push(property_invalid_value(node, dimension));
    }
  }
  messages
}

pub(super) fn register_defaults(registry: &mut ValidatorRegistry) {
  registry.register_class("BuildConfiguration", check_build_configuration);
  registry.register_class("BuildFile", check_build_file);
  registry.register_class("Page", check_named);
  registry.register_class("Style", check_named);
  registry.register_class("Font", check_named);
  registry.register_class("Bitmap", check_bitmap);
  registry.register_class("Variable", check_variable);
  registry.register_class("ScpiSubsystem", check_named);
  registry.register_class("ScpiCommand", check_named);

  registry.register_property("Page", "components", check_widget_slot);
  registry.register_property(super::ANY_CLASS, "children", check_widget_slot);
}
