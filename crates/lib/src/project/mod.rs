//! Project model: typed settings plus a generic object tree.
//!
//! A project file (`.eez-project`) is a JSON document. The settings the build
//! pipeline acts on are deserialized into typed structs; the rest of the
//! document is kept as an [`ObjectNode`] tree that the check pass and the
//! sub-builders walk.

mod tree;
mod types;

pub use tree::{ChildProperty, ChildValue, NodeId, ObjectNode, ROOT_CLASS};
pub use types::*;

use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::consts::PROJECT_EXTENSION;

#[derive(Debug, Error)]
pub enum ProjectError {
  #[error("failed to read project file {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("invalid project JSON: {0}")]
  Json(#[from] serde_json::Error),

  #[error("project document must be a JSON object")]
  NotAnObject,
}

/// The typed parts of a project document.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ProjectDocument {
  settings: Settings,
  scpi: Option<ScpiFeature>,
  micropython: Option<MicroPythonFeature>,
}

#[derive(Debug, Clone)]
pub struct Project {
  /// Location of the project file, used to resolve relative paths.
  pub file_path: Option<PathBuf>,
  pub settings: Settings,
  pub scpi: Option<ScpiFeature>,
  pub micropython: Option<MicroPythonFeature>,
  pub root: ObjectNode,
  document: Value,
}

impl Project {
  /// Read and parse a project file.
  pub async fn load(path: &Path) -> Result<Self, ProjectError> {
    let text = tokio::fs::read_to_string(path).await.map_err(|source| ProjectError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    debug!(path = ?path, bytes = text.len(), "loaded project file");
    Self::from_json(&text, Some(path.to_path_buf()))
  }

  /// Parse a project document from text.
  pub fn from_json(text: &str, file_path: Option<PathBuf>) -> Result<Self, ProjectError> {
    let document: Value = serde_json::from_str(text)?;
    Self::from_value(document, file_path)
  }

  pub fn from_value(document: Value, file_path: Option<PathBuf>) -> Result<Self, ProjectError> {
    let object = document.as_object().ok_or(ProjectError::NotAnObject)?;
    let root = ObjectNode::from_document(object);
    let typed: ProjectDocument = serde_json::from_value(document.clone())?;

    Ok(Self {
      file_path,
      settings: typed.settings,
      scpi: typed.scpi,
      micropython: typed.micropython,
      root,
      document,
    })
  }

  pub fn project_type(&self) -> ProjectType {
    self.settings.general.project_type
  }

  pub fn is_dashboard(&self) -> bool {
    self.project_type() == ProjectType::Dashboard
  }

  pub fn is_lvgl(&self) -> bool {
    self.project_type() == ProjectType::Lvgl
  }

  pub fn is_applet(&self) -> bool {
    self.project_type() == ProjectType::Applet
  }

  pub fn is_resource(&self) -> bool {
    self.project_type() == ProjectType::Resource
  }

  /// True when this project references a master project and therefore builds
  /// a single resource or applet file instead of the build-file list.
  pub fn is_master_project(&self) -> bool {
    self
      .settings
      .general
      .master_project
      .as_deref()
      .is_some_and(|m| !m.is_empty())
  }

  /// File stem of the project file without the `.eez-project` extension.
  pub fn base_name(&self) -> String {
    let file_name = self
      .file_path
      .as_deref()
      .and_then(Path::file_name)
      .and_then(|n| n.to_str())
      .unwrap_or("project");
    file_name.strip_suffix(PROJECT_EXTENSION).unwrap_or(file_name).to_string()
  }

  /// Destination folder for generated files, resolved against the project
  /// file's directory.
  pub fn destination_folder(&self) -> PathBuf {
    let project_dir = self
      .file_path
      .as_deref()
      .and_then(Path::parent)
      .map(Path::to_path_buf)
      .unwrap_or_default();

    match self.settings.build.destination_folder.as_deref() {
      Some(dest) if !dest.is_empty() => project_dir.join(dest),
      _ => project_dir,
    }
  }

  /// The whole project document as compact JSON.
  pub fn to_json(&self) -> String {
    self.document.to_string()
  }

  /// Names of the declared build configurations, in order.
  pub fn configuration_names(&self) -> Vec<&str> {
    self
      .settings
      .build
      .configurations
      .iter()
      .map(|c| c.name.as_str())
      .collect()
  }
}
