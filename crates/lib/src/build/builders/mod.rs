//! Sub-builders: independent producers of named parts.
//!
//! The orchestrator runs every applicable builder from a static list, in
//! order, once per configuration, and merges their results.

mod assets;
mod micropython;
mod scpi;

pub use assets::AssetsBuilder;
pub use micropython::MicroPythonBuilder;
pub use scpi::{ScpiBuilder, command_handler_name};

use std::collections::BTreeSet;

use crate::build::BuildError;
use crate::build::parts::BuildResult;
use crate::output::OutputSections;
use crate::project::{BuildConfiguration, Project};

/// What a sub-builder is asked to produce.
pub struct BuildCtx<'a> {
  /// Part names to produce; `None` means every part.
  pub section_names: Option<&'a BTreeSet<String>>,
  /// The configuration being built, if the project declares any.
  pub configuration: Option<&'a BuildConfiguration>,
  pub output: &'a OutputSections,
}

impl BuildCtx<'_> {
  pub fn wants(&self, part: &str) -> bool {
    self.section_names.is_none_or(|names| names.contains(part))
  }

  pub fn configuration_name(&self) -> Option<&str> {
    self.configuration.map(|c| c.name.as_str())
  }
}

pub trait SubBuilder: Send + Sync {
  fn name(&self) -> &'static str;

  /// Whether this builder has anything to contribute for `project`.
  fn applies(&self, project: &Project) -> bool;

  fn build(&self, project: &Project, ctx: &BuildCtx<'_>) -> Result<BuildResult, BuildError>;
}

/// Every known sub-builder, in merge order.
pub fn default_builders() -> Vec<Box<dyn SubBuilder>> {
  vec![
    Box::new(AssetsBuilder),
    Box::new(ScpiBuilder),
    Box::new(MicroPythonBuilder),
  ]
}
