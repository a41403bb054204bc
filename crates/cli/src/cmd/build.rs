//! Implementation of the `sbuild build` command.
//!
//! Builds every configuration of a project and writes its output files into
//! the destination folder.

use std::path::{Path, PathBuf};

use anyhow::Result;

use studio_build_lib::build::{BuildMode, BuildOptions};
use studio_build_lib::output::Section;

use super::{fail_on_errors, run_build};
use crate::output::print_messages;

pub fn cmd_build(
  project: &Path,
  configuration: Option<String>,
  destination: Option<PathBuf>,
  create_destination: bool,
  strict_templates: bool,
) -> Result<()> {
  let options = BuildOptions {
    mode: BuildMode::BuildFiles,
    selected_configuration: configuration,
    destination_folder: destination,
    create_destination,
    strict_templates,
  };

  let (_, output) = run_build(project, &options)?;
  print_messages(&output.messages(Section::Output));
  fail_on_errors(&output)
}
