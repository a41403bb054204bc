//! Project build orchestration.
//!
//! [`ProjectBuilder::build`] runs the applicable sub-builders once per
//! configuration, merges their parts, runs the check pass and then, depending
//! on the [`BuildMode`], stops, returns the parts, or writes every output file.
//!
//! Nothing escapes `build`: failures end up as `ERROR` messages in `OUTPUT`
//! and the loading flag is always cleared.
//!
//! # Submodules
//!
//! - [`builders`] - The sub-builders and their shared context
//! - [`emit`] - File emission for every project kind
//! - [`fs`] - File-system adapter with the single write retry
//! - [`parts`] - Part values and their aggregation

pub mod builders;
pub mod emit;
pub mod fs;
pub mod parts;
mod types;

pub use types::*;

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;
use std::time::{Instant, SystemTime};

use tracing::{debug, info, warn};

use crate::check::{BackgroundChecker, CheckPass};
use crate::config::StudioConfig;
use crate::consts::DEFAULT_CONFIGURATION;
use crate::consts::parts::{GUI_ASSETS_DATA, GUI_ASSETS_DATA_MAP, MICROPYTHON_CODE};
use crate::output::{MessageKind, OutputSections, Section};
use crate::project::{BuildConfiguration, Project};
use crate::template;
use builders::{BuildCtx, SubBuilder, default_builders};
use emit::Emitter;
use fs::{FileSystem, LocalFs};
use parts::{Parts, PartsByConfiguration, merge};

/// Project version whose configurations are not built one by one.
const LEGACY_PROJECT_VERSION: &str = "v1";

pub struct ProjectBuilder<F: FileSystem = LocalFs> {
  fs: F,
  builders: Vec<Box<dyn SubBuilder>>,
  check: Arc<CheckPass>,
  output: OutputSections,
  config: StudioConfig,
}

impl ProjectBuilder<LocalFs> {
  pub fn new(output: OutputSections, config: StudioConfig) -> Self {
    Self::with_fs(LocalFs, output, config)
  }
}

impl<F: FileSystem> ProjectBuilder<F> {
  pub fn with_fs(fs: F, output: OutputSections, config: StudioConfig) -> Self {
    Self {
      fs,
      builders: default_builders(),
      check: Arc::new(CheckPass::default()),
      output,
      config,
    }
  }

  /// Replace the sub-builder list.
  pub fn with_builders(mut self, builders: Vec<Box<dyn SubBuilder>>) -> Self {
    self.builders = builders;
    self
  }

  pub fn output(&self) -> &OutputSections {
    &self.output
  }

  /// The check pass, shared so a background checker can reuse its memo.
  pub fn check_pass(&self) -> Arc<CheckPass> {
    Arc::clone(&self.check)
  }

  /// A background checker sharing this builder's check pass and diagnostics,
  /// debounced by the configured idle window.
  pub fn background_checker(&self) -> BackgroundChecker {
    BackgroundChecker::from_config(self.check_pass(), self.output.clone(), &self.config)
  }

  /// Build `project`.
  ///
  /// Returns the parts of the default configuration for
  /// [`BuildMode::BuildAssets`] and [`BuildMode::BuildFiles`]; `None` for
  /// [`BuildMode::Check`], when there is nothing to build, and on failure.
  pub async fn build(&self, project: &Project, options: &BuildOptions) -> Option<Parts> {
    let _loading = match self.output.begin_loading(Section::Output) {
      Ok(guard) => guard,
      Err(err) => {
        warn!(error = %err, "build request ignored");
        return None;
      }
    };

    self.output.clear(Section::Output);

    if !anything_to_build(project) {
      self
        .output
        .write(Section::Output, MessageKind::Info, "Nothing to build!", None);
      return None;
    }
    self.output.clear(Section::Checks);

    if !self.config.loader_delay.is_zero() {
      tokio::time::sleep(self.config.loader_delay).await;
    }

    match self.run(project, options).await {
      Ok(parts) => parts,
      Err(err) => {
        let (text, node) = err.diagnostic();
        self.output.write(Section::Output, MessageKind::Error, text, node);
        self.output.show_check_result();
        None
      }
    }
  }

  async fn run(&self, project: &Project, options: &BuildOptions) -> Result<Option<Parts>, BuildError> {
    let started = Instant::now();

    let destination = options
      .destination_folder
      .clone()
      .unwrap_or_else(|| project.destination_folder());
    if options.mode == BuildMode::BuildFiles {
      self.ensure_destination(&destination, options.create_destination).await?;
    }

    let section_names = section_names(project, options.mode);
    let configurations = configurations_to_build(project, options.selected_configuration.as_deref());

    let mut parts_by_configuration = PartsByConfiguration::new();
    for configuration in &configurations {
      let name = configuration.map_or(DEFAULT_CONFIGURATION, |c| c.name.as_str());
      if configuration.is_some() {
        self.output.write(
          Section::Output,
          MessageKind::Info,
          format!("Building {name} configuration"),
          None,
        );
      }
      let parts = self.build_configuration(project, *configuration, section_names.as_ref())?;
      parts_by_configuration.insert(name.to_string(), parts);
    }

    let messages = self.check.check(&project.root);
    self.output.set_messages(Section::Checks, messages);

    let default_configuration = default_configuration(project, options.selected_configuration.as_deref());

    match options.mode {
      BuildMode::Check => {
        self.output.show_check_result();
        return Ok(None);
      }
      BuildMode::BuildAssets => {}
      BuildMode::BuildFiles => {
        let written = Emitter::new(&self.fs, &self.output, &destination, self.config.write_retry_delay)
          .strict_templates(options.strict_templates)
          .emit(project, &parts_by_configuration, default_configuration)
          .await?;
        debug!(files = written.len(), "emitted build files");
      }
    }

    self.output.show_check_result();
    self.output.write(
      Section::Output,
      MessageKind::Info,
      format!("Build duration: {:.3} seconds", started.elapsed().as_secs_f64()),
      None,
    );
    self.output.write(
      Section::Output,
      MessageKind::Info,
      format!(
        "Build successfully finished at {}",
        humantime::format_rfc3339_seconds(SystemTime::now())
      ),
      None,
    );

    let parts = match parts_by_configuration.remove(default_configuration) {
      Some(parts) => parts,
      None => parts_by_configuration.into_values().next().unwrap_or_default(),
    };
    Ok(Some(parts))
  }

  async fn ensure_destination(&self, destination: &Path, create: bool) -> Result<(), BuildError> {
    if self.fs.exists(destination).await {
      return Ok(());
    }
    if !create {
      return Err(BuildError::build("Cannot find destination folder."));
    }
    info!(path = ?destination, "creating destination folder");
    self
      .fs
      .make_folder(destination)
      .await
      .map_err(|source| BuildError::MakeFolder {
        path: destination.to_path_buf(),
        source,
      })
  }

  fn build_configuration(
    &self,
    project: &Project,
    configuration: Option<&BuildConfiguration>,
    section_names: Option<&BTreeSet<String>>,
  ) -> Result<Parts, BuildError> {
    let ctx = BuildCtx {
      section_names,
      configuration,
      output: &self.output,
    };

    let mut results = Vec::new();
    for builder in self.builders.iter().filter(|b| b.applies(project)) {
      debug!(builder = builder.name(), configuration = ?ctx.configuration_name(), "running sub-builder");
      results.push(builder.build(project, &ctx)?);
    }
    Ok(merge(&results))
  }
}

fn anything_to_build(project: &Project) -> bool {
  !project.settings.build.files.is_empty()
    || project.is_master_project()
    || project.is_dashboard()
    || project.is_lvgl()
}

/// Parts the build files ask for; `None` means every part.
fn section_names(project: &Project, mode: BuildMode) -> Option<BTreeSet<String>> {
  if mode != BuildMode::BuildFiles || project.is_dashboard() {
    return None;
  }
  if project.is_master_project() {
    return Some([GUI_ASSETS_DATA.to_string(), GUI_ASSETS_DATA_MAP.to_string()].into());
  }

  let files = &project.settings.build.files;
  let mut names = BTreeSet::new();
  for file in files {
    match file.template() {
      Some(text) => names.extend(template::section_names(text)),
      None => {
        names.insert(GUI_ASSETS_DATA.to_string());
        names.insert(GUI_ASSETS_DATA_MAP.to_string());
      }
    }
  }
  if files.is_empty() && project.is_lvgl() {
    names.insert(MICROPYTHON_CODE.to_string());
  }
  Some(names)
}

fn selected<'a>(project: &'a Project, selected: Option<&str>) -> Option<&'a BuildConfiguration> {
  let configurations = &project.settings.build.configurations;
  selected
    .and_then(|name| configurations.iter().find(|c| c.name == name))
    .or_else(|| configurations.first())
}

/// Configurations built in one run; `None` stands for the implicit default.
fn configurations_to_build<'a>(project: &'a Project, selected_name: Option<&str>) -> Vec<Option<&'a BuildConfiguration>> {
  let configurations = &project.settings.build.configurations;
  if project.settings.general.project_version != LEGACY_PROJECT_VERSION
    && !configurations.is_empty()
    && !project.is_master_project()
  {
    configurations.iter().map(Some).collect()
  } else {
    vec![selected(project, selected_name)]
  }
}

fn default_configuration<'a>(project: &'a Project, selected_name: Option<&str>) -> &'a str {
  selected(project, selected_name).map_or(DEFAULT_CONFIGURATION, |c| c.name.as_str())
}
