use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::project::NodeId;
use crate::template::TemplateError;

/// Errors raised while building a project.
///
/// [`BuildError::Build`] is the deliberate, user-actionable failure a
/// sub-builder raises; it is reported with its message and node. Every other
/// variant is unexpected and is reported as `Module build error: <details>`.
#[derive(Debug, Error)]
pub enum BuildError {
  #[error("{message}")]
  Build { message: String, node: Option<NodeId> },

  #[error("a build is already in progress")]
  Busy,

  #[error("failed to write {path}: {source}")]
  Write {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to create folder {path}: {source}")]
  MakeFolder {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error(transparent)]
  Template(#[from] TemplateError),

  #[error("JSON error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("archive error: {0}")]
  Zip(#[from] zip::result::ZipError),

  #[error("I/O error: {0}")]
  Io(#[from] std::io::Error),
}

impl BuildError {
  pub fn build(message: impl Into<String>) -> Self {
    BuildError::Build {
      message: message.into(),
      node: None,
    }
  }

  pub fn build_at(message: impl Into<String>, node: NodeId) -> Self {
    BuildError::Build {
      message: message.into(),
      node: Some(node),
    }
  }

  /// Diagnostic text and node link for this error.
  pub fn diagnostic(&self) -> (String, Option<NodeId>) {
    match self {
      BuildError::Build { message, node } => (message.clone(), node.clone()),
      other => (format!("Module build error: {other}"), None),
    }
  }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BuildMode {
  /// Run the sub-builders and the check pass without writing anything.
  Check,
  /// Return the parts of the first configuration.
  BuildAssets,
  /// Write every output file.
  #[default]
  BuildFiles,
}

#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
  pub mode: BuildMode,
  /// Configuration used for single-configuration builds and for files
  /// without a `<configuration>` placeholder.
  pub selected_configuration: Option<String>,
  /// Overrides the project's destination folder.
  pub destination_folder: Option<PathBuf>,
  /// Create the destination folder when it does not exist.
  pub create_destination: bool,
  /// Fail the build when a section marker cannot be resolved.
  pub strict_templates: bool,
}

impl BuildOptions {
  pub fn new(mode: BuildMode) -> Self {
    Self {
      mode,
      ..Default::default()
    }
  }

  pub fn with_configuration(mut self, name: impl Into<String>) -> Self {
    self.selected_configuration = Some(name.into());
    self
  }

  pub fn with_destination(mut self, folder: impl Into<PathBuf>) -> Self {
    self.destination_folder = Some(folder.into());
    self
  }

  pub fn creating_destination(mut self) -> Self {
    self.create_destination = true;
    self
  }

  pub fn with_strict_templates(mut self) -> Self {
    self.strict_templates = true;
    self
  }
}
