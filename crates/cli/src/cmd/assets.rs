//! Implementation of the `sbuild assets` command.
//!
//! Builds the parts of a single configuration without writing any file and
//! lists their names and sizes.

use std::path::Path;

use anyhow::Result;
use serde_json::json;

use studio_build_lib::build::{BuildMode, BuildOptions};
use studio_build_lib::output::Section;

use super::{fail_on_errors, run_build};
use crate::output::{OutputFormat, format_bytes, print_json, print_messages, print_stat};

pub fn cmd_assets(project: &Path, configuration: Option<String>, format: OutputFormat) -> Result<()> {
  let options = BuildOptions {
    selected_configuration: configuration,
    ..BuildOptions::new(BuildMode::BuildAssets)
  };
  let (parts, output) = run_build(project, &options)?;
  let parts = parts.unwrap_or_default();

  if format.is_json() {
    let items: Vec<_> = parts
      .iter()
      .map(|(name, value)| json!({ "name": name, "kind": value.kind(), "size": value.len() }))
      .collect();
    print_json(&json!({ "parts": items, "output": output.messages(Section::Output) }))?;
  } else {
    print_messages(&output.messages(Section::Output));
    if !parts.is_empty() {
      println!();
      println!("Parts:");
      for (name, value) in &parts {
        print_stat(name, &format!("{} ({})", format_bytes(value.len() as u64), value.kind()));
      }
    }
  }

  fail_on_errors(&output)
}
