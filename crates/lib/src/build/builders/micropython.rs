//! MicroPython program for LVGL projects.

use tracing::debug;

use super::{BuildCtx, SubBuilder};
use crate::build::BuildError;
use crate::build::parts::BuildResult;
use crate::consts::parts::MICROPYTHON_CODE;
use crate::lvgl::generate_micropython;
use crate::project::Project;

pub struct MicroPythonBuilder;

impl SubBuilder for MicroPythonBuilder {
  fn name(&self) -> &'static str {
    "micropython"
  }

  fn applies(&self, project: &Project) -> bool {
    project.is_lvgl()
  }

  fn build(&self, project: &Project, ctx: &BuildCtx<'_>) -> Result<BuildResult, BuildError> {
    let mut result = BuildResult::new();
    if ctx.wants(MICROPYTHON_CODE) {
      let code = generate_micropython(project);
      debug!(bytes = code.len(), configuration = ?ctx.configuration_name(), "generated MicroPython program");
      result.insert(MICROPYTHON_CODE.to_string(), code.into());
    }
    Ok(result)
  }
}

#[cfg(test)]
mod tests {
  use std::collections::BTreeSet;

  use super::*;
  use crate::output::OutputSections;
  use crate::util::testutil::project_at;
  use serde_json::json;

  fn lvgl() -> Project {
    project_at(
      "ui",
      json!({
        "settings": { "general": { "projectType": "LVGL" } },
        "pages": [{ "name": "Main" }]
      }),
    )
  }

  #[test]
  fn produces_program_when_wanted() {
    let output = OutputSections::new();
    let ctx = BuildCtx {
      section_names: None,
      configuration: None,
      output: &output,
    };
    let result = MicroPythonBuilder.build(&lvgl(), &ctx).unwrap();
    let code = result[MICROPYTHON_CODE].as_text();
    assert!(code.contains("def create_screen_main():"));
  }

  #[test]
  fn skipped_when_not_requested() {
    let output = OutputSections::new();
    let names: BTreeSet<String> = ["GUI_ASSETS_DATA".to_string()].into();
    let ctx = BuildCtx {
      section_names: Some(&names),
      configuration: None,
      output: &output,
    };
    assert!(MicroPythonBuilder.build(&lvgl(), &ctx).unwrap().is_empty());
  }

  #[test]
  fn only_lvgl_projects() {
    assert!(MicroPythonBuilder.applies(&lvgl()));
    assert!(!MicroPythonBuilder.applies(&project_at("p", json!({}))));
  }
}
