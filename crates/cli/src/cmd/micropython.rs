//! Implementation of the `sbuild micropython` command.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};

use studio_build_lib::lvgl::generate_micropython;
use studio_build_lib::project::Project;

use crate::output::print_success;

pub fn cmd_micropython(project: &Path, output: Option<&Path>) -> Result<()> {
  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let loaded = rt
    .block_on(Project::load(project))
    .with_context(|| format!("Failed to load project: {}", project.display()))?;

  if !loaded.is_lvgl() {
    bail!("{} is not an LVGL project", project.display());
  }

  let code = generate_micropython(&loaded);
  match output {
    Some(path) => {
      fs::write(path, &code).with_context(|| format!("Failed to write {}", path.display()))?;
      print_success(&format!("Wrote {}", path.display()));
    }
    None => print!("{}", code),
  }

  Ok(())
}
