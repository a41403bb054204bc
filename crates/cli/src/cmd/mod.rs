mod assets;
mod build;
mod check;
mod micropython;

pub use assets::cmd_assets;
pub use build::cmd_build;
pub use check::cmd_check;
pub use micropython::cmd_micropython;

use std::path::Path;

use anyhow::{Context, Result, bail};
use tokio::runtime::Runtime;

use studio_build_lib::build::{BuildOptions, ProjectBuilder};
use studio_build_lib::build::parts::Parts;
use studio_build_lib::config::StudioConfig;
use studio_build_lib::output::{OutputSections, Section};
use studio_build_lib::project::Project;

/// Load `path` and build it with `options` on a fresh runtime.
///
/// Returns the built parts, if any, and the diagnostics of the run.
fn run_build(path: &Path, options: &BuildOptions) -> Result<(Option<Parts>, OutputSections)> {
  let config = StudioConfig::from_env().context("Invalid environment configuration")?;
  let rt = Runtime::new().context("Failed to create async runtime")?;

  let project = rt
    .block_on(Project::load(path))
    .with_context(|| format!("Failed to load project: {}", path.display()))?;

  let output = OutputSections::new();
  let builder = ProjectBuilder::new(output.clone(), config);
  let parts = rt.block_on(builder.build(&project, options));
  Ok((parts, output))
}

fn fail_on_errors(output: &OutputSections) -> Result<()> {
  match output.num_errors(Section::Output) {
    0 => Ok(()),
    1 => bail!("build reported 1 error"),
    n => bail!("build reported {} errors", n),
  }
}
