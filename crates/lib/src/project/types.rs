use serde::{Deserialize, Serialize};

/// The kind of project, which decides how it is packaged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectType {
  #[default]
  #[serde(rename = "firmware")]
  Firmware,
  #[serde(rename = "firmware-module")]
  FirmwareModule,
  #[serde(rename = "resource")]
  Resource,
  #[serde(rename = "applet")]
  Applet,
  #[serde(rename = "dashboard")]
  Dashboard,
  #[serde(rename = "LVGL")]
  Lvgl,
  #[serde(other)]
  Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GeneralSettings {
  pub project_version: String,
  pub project_type: ProjectType,
  /// Path of the master project this project is built against.
  pub master_project: Option<String>,
  pub dark_theme: bool,
}

impl Default for GeneralSettings {
  fn default() -> Self {
    Self {
      project_version: "v3".to_string(),
      project_type: ProjectType::default(),
      master_project: None,
      dark_theme: false,
    }
  }
}

/// A named variant of build settings (e.g. "Debug", "Release").
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BuildConfiguration {
  pub name: String,
  pub description: Option<String>,
  pub properties: Option<serde_json::Value>,
}

impl BuildConfiguration {
  pub fn named(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      ..Default::default()
    }
  }
}

/// A destination file pattern with an optional text template.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BuildFile {
  pub file_name: String,
  pub template: Option<String>,
}

impl BuildFile {
  /// The template text, treating an empty template as absent.
  pub fn template(&self) -> Option<&str> {
    self.template.as_deref().filter(|t| !t.is_empty())
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BuildSettings {
  pub configurations: Vec<BuildConfiguration>,
  pub files: Vec<BuildFile>,
  pub destination_folder: Option<String>,
  pub screens_lifetime_support: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
  pub general: GeneralSettings,
  pub build: BuildSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScpiCommand {
  pub name: String,
  pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScpiSubsystem {
  pub name: String,
  pub commands: Vec<ScpiCommand>,
}

/// The SCPI command table feature.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScpiFeature {
  pub subsystems: Vec<ScpiSubsystem>,
}

/// User-written MicroPython shipped next to a resource build.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MicroPythonFeature {
  pub code: String,
}
