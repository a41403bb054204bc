//! Implementation of the `sbuild check` command.
//!
//! Runs the check pass over the whole project, whether or not the project
//! has anything to build.

use std::path::Path;

use anyhow::{Context, Result};
use serde_json::json;

use studio_build_lib::check::CheckPass;
use studio_build_lib::output::{MessageKind, OutputSections, Section};
use studio_build_lib::project::Project;

use super::fail_on_errors;
use crate::output::{OutputFormat, print_error, print_info, print_json, print_messages, print_success, print_warning};

pub fn cmd_check(project: &Path, format: OutputFormat) -> Result<()> {
  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let loaded = rt
    .block_on(Project::load(project))
    .with_context(|| format!("Failed to load project: {}", project.display()))?;

  let output = OutputSections::new();
  output.set_messages(Section::Checks, CheckPass::default().check(&loaded.root));

  let checks = output.messages(Section::Checks);
  let (kind, summary) = output.check_result_summary();
  output.show_check_result();

  if format.is_json() {
    print_json(&json!({
      "summary": summary,
      "errors": output.num_errors(Section::Checks),
      "warnings": output.num_warnings(Section::Checks),
      "checks": checks,
    }))?;
  } else {
    print_messages(&checks);
    if !checks.is_empty() {
      println!();
    }
    match kind {
      MessageKind::Error => print_error(&summary),
      MessageKind::Warning => print_warning(&summary),
      _ if checks.is_empty() => print_success(&summary),
      _ => print_info(&summary),
    }
  }

  fail_on_errors(&output)
}
