//! File emission: turns merged parts into files in the destination folder.
//!
//! Every write goes through [`write_with_retry`] and is announced in `OUTPUT`
//! as `File "<path>" builded`.

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Serialize;
use tracing::debug;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use super::fs::{FileContents, FileSystem, write_with_retry};
use super::parts::{Parts, PartsByConfiguration};
use super::BuildError;
use crate::consts::parts::{GUI_ASSETS_DATA, GUI_ASSETS_DATA_MAP, MICROPYTHON_CODE};
use crate::consts::{
  APPLET_EXTENSION, CONFIGURATION_PLACEHOLDER, DASHBOARD_EXTENSION, DEFAULT_CONFIGURATION, MAP_EXTENSION,
  PROJECT_BUILD_EXTENSION, PROJECT_EXTENSION, PYTHON_EXTENSION, RESOURCE_EXTENSION,
};
use crate::output::{MessageKind, OutputSections, Section};
use crate::project::{BuildFile, Project};
use crate::template;

/// Sidecar written next to (and inside) a dashboard archive.
#[derive(Debug, Serialize)]
struct DashboardManifest {
  assets: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  map: Option<String>,
}

pub struct Emitter<'a, F: FileSystem> {
  fs: &'a F,
  output: &'a OutputSections,
  destination: &'a Path,
  retry_delay: Duration,
  strict_templates: bool,
}

impl<'a, F: FileSystem> Emitter<'a, F> {
  pub fn new(fs: &'a F, output: &'a OutputSections, destination: &'a Path, retry_delay: Duration) -> Self {
    Self {
      fs,
      output,
      destination,
      retry_delay,
      strict_templates: false,
    }
  }

  /// Fail on section markers whose part or configuration was not built,
  /// instead of rendering them empty.
  pub fn strict_templates(mut self, strict: bool) -> Self {
    self.strict_templates = strict;
    self
  }

  /// Write every output of `project`; returns the written paths in order.
  ///
  /// `default_configuration` supplies the parts for files and markers that
  /// do not name a configuration.
  pub async fn emit(
    &self,
    project: &Project,
    parts: &PartsByConfiguration,
    default_configuration: &str,
  ) -> Result<Vec<PathBuf>, BuildError> {
    let default_parts = configuration_parts(parts, default_configuration);

    if project.is_dashboard() {
      return self.dashboard(project, default_parts).await;
    }
    if project.is_master_project() {
      return self.master(project, default_parts).await;
    }

    let files = &project.settings.build.files;
    if files.is_empty() && project.is_lvgl() {
      return self.micropython(project, default_parts).await;
    }

    let mut written = Vec::new();
    for file in files {
      if file.file_name.contains(CONFIGURATION_PLACEHOLDER) {
        let names = match project.configuration_names() {
          names if names.is_empty() => vec![DEFAULT_CONFIGURATION],
          names => names,
        };
        for name in names {
          let file_name = file.file_name.replace(CONFIGURATION_PLACEHOLDER, name);
          written.extend(self.build_file(file, &file_name, parts, name).await?);
        }
      } else {
        written.extend(self.build_file(file, &file.file_name, parts, default_configuration).await?);
      }
    }
    Ok(written)
  }

  async fn write(&self, path: &Path, contents: FileContents<'_>) -> Result<(), BuildError> {
    write_with_retry(self.fs, path, contents, self.retry_delay).await
  }

  fn builded(&self, path: &Path) {
    self.output.write(
      Section::Output,
      MessageKind::Info,
      format!("File \"{}\" builded", path.display()),
      None,
    );
  }

  async fn build_file(
    &self,
    file: &BuildFile,
    file_name: &str,
    parts: &PartsByConfiguration,
    configuration: &str,
  ) -> Result<Vec<PathBuf>, BuildError> {
    let path = self.destination.join(file_name);
    debug!(path = ?path, configuration, templated = file.template().is_some(), "emitting build file");

    match file.template() {
      Some(text) => {
        let rendered = if self.strict_templates {
          template::render_strict(text, parts, configuration)?
        } else {
          template::render(text, parts, configuration)
        };
        self.write(&path, FileContents::Text(&rendered)).await?;
        self.builded(&path);
        Ok(vec![path])
      }
      None => self.assets_file(path, configuration_parts(parts, configuration)).await,
    }
  }

  /// The assets blob at `path`, plus `<path>.map` when a map was built.
  async fn assets_file(&self, path: PathBuf, parts: Option<&Parts>) -> Result<Vec<PathBuf>, BuildError> {
    let data = parts
      .and_then(|p| p.get(GUI_ASSETS_DATA))
      .ok_or_else(|| BuildError::build(format!("Assets data for \"{}\" was not built.", path.display())))?;
    self.write(&path, FileContents::Binary(&data.as_bytes())).await?;

    let mut written = vec![path.clone()];
    if let Some(map) = parts.and_then(|p| p.get(GUI_ASSETS_DATA_MAP)) {
      let map_path = append_extension(&path, MAP_EXTENSION);
      self.write(&map_path, FileContents::Text(&map.as_text())).await?;
      self.builded(&map_path);
      written.push(map_path);
    }

    self.builded(&path);
    Ok(written)
  }

  async fn dashboard(&self, project: &Project, parts: Option<&Parts>) -> Result<Vec<PathBuf>, BuildError> {
    let base = project.base_name();
    let encode = |part: &str| parts.and_then(|p| p.get(part)).map(|v| BASE64.encode(v.as_bytes()));
    let manifest = DashboardManifest {
      assets: encode(GUI_ASSETS_DATA).unwrap_or_default(),
      map: encode(GUI_ASSETS_DATA_MAP),
    };
    let manifest = serde_json::to_string(&manifest)?;

    let project_name = format!("{base}{PROJECT_EXTENSION}");
    let manifest_name = format!("{base}{PROJECT_BUILD_EXTENSION}");

    let mut archive = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    archive.start_file(project_name.as_str(), options)?;
    archive.write_all(project.to_json().as_bytes())?;
    archive.start_file(manifest_name.as_str(), options)?;
    archive.write_all(manifest.as_bytes())?;
    let archive = archive.finish()?.into_inner();

    let archive_path = self.destination.join(format!("{base}{DASHBOARD_EXTENSION}"));
    self.write(&archive_path, FileContents::Binary(&archive)).await?;
    self.builded(&archive_path);

    let manifest_path = self.destination.join(manifest_name);
    self.write(&manifest_path, FileContents::Text(&manifest)).await?;
    self.builded(&manifest_path);

    Ok(vec![archive_path, manifest_path])
  }

  async fn master(&self, project: &Project, parts: Option<&Parts>) -> Result<Vec<PathBuf>, BuildError> {
    let base = project.base_name();
    let extension = if project.is_applet() {
      APPLET_EXTENSION
    } else {
      RESOURCE_EXTENSION
    };
    let mut written = self
      .assets_file(self.destination.join(format!("{base}{extension}")), parts)
      .await?;

    if project.is_resource()
      && let Some(micropython) = &project.micropython
    {
      let path = self.destination.join(format!("{base}{PYTHON_EXTENSION}"));
      self.write(&path, FileContents::Text(&micropython.code)).await?;
      self.builded(&path);
      written.push(path);
    }
    Ok(written)
  }

  async fn micropython(&self, project: &Project, parts: Option<&Parts>) -> Result<Vec<PathBuf>, BuildError> {
    let path = self
      .destination
      .join(format!("{}{PYTHON_EXTENSION}", project.base_name()));
    let code = parts
      .and_then(|p| p.get(MICROPYTHON_CODE))
      .ok_or_else(|| BuildError::build(format!("MicroPython code for \"{}\" was not built.", path.display())))?;
    self.write(&path, FileContents::Text(&code.as_text())).await?;
    self.builded(&path);
    Ok(vec![path])
  }
}

fn configuration_parts<'p>(parts: &'p PartsByConfiguration, name: &str) -> Option<&'p Parts> {
  parts.get(name).or_else(|| parts.values().next())
}

fn append_extension(path: &Path, extension: &str) -> PathBuf {
  let mut name = path.as_os_str().to_owned();
  name.push(extension);
  PathBuf::from(name)
}

#[cfg(test)]
mod tests {
  use std::io::Read;

  use super::*;
  use crate::build::parts::PartValue;
  use crate::template::TemplateError;
  use crate::util::testutil::{MemoryFs, project_at};
  use serde_json::json;

  const DEST: &str = "/out";

  fn parts(entries: &[(&str, &[(&str, PartValue)])]) -> PartsByConfiguration {
    entries
      .iter()
      .map(|(configuration, values)| {
        let parts = values.iter().map(|(k, v)| (k.to_string(), v.clone())).collect();
        (configuration.to_string(), parts)
      })
      .collect()
  }

  async fn emit(fs: &MemoryFs, output: &OutputSections, project: &Project, parts: &PartsByConfiguration) -> Vec<PathBuf> {
    Emitter::new(fs, output, Path::new(DEST), Duration::from_millis(10))
      .emit(project, parts, "Debug")
      .await
      .unwrap()
  }

  fn infos(output: &OutputSections) -> Vec<String> {
    output
      .messages(Section::Output)
      .into_iter()
      .map(|m| m.text)
      .collect()
  }

  #[tokio::test]
  async fn configuration_placeholder_fans_out() {
    let project = project_at(
      "demo",
      json!({
        "settings": { "build": {
          "configurations": [{ "name": "Debug" }, { "name": "Release" }],
          "files": [{ "fileName": "assets_<configuration>.bin" }]
        } }
      }),
    );
    let parts = parts(&[
      ("Debug", &[(GUI_ASSETS_DATA, PartValue::Bytes(vec![1]))]),
      ("Release", &[(GUI_ASSETS_DATA, PartValue::Bytes(vec![2]))]),
    ]);
    let fs = MemoryFs::new();
    let output = OutputSections::new();

    let written = emit(&fs, &output, &project, &parts).await;

    assert_eq!(
      written,
      vec![PathBuf::from("/out/assets_Debug.bin"), PathBuf::from("/out/assets_Release.bin")]
    );
    assert_eq!(fs.file(Path::new("/out/assets_Debug.bin")).unwrap(), vec![1]);
    assert_eq!(fs.file(Path::new("/out/assets_Release.bin")).unwrap(), vec![2]);
    assert_eq!(
      infos(&output),
      vec![
        "File \"/out/assets_Debug.bin\" builded",
        "File \"/out/assets_Release.bin\" builded"
      ]
    );
  }

  #[tokio::test]
  async fn templates_render_with_their_configuration() {
    let project = project_at(
      "demo",
      json!({
        "settings": { "build": {
          "configurations": [{ "name": "Debug" }, { "name": "Release" }],
          "files": [
            { "fileName": "ids.h", "template": "// ids\n//${eez-studio GUI_PAGES_ENUM}\n//${eez-studio NAME Release}\n" },
            { "fileName": "<configuration>.txt", "template": "//${eez-studio NAME}" }
          ]
        } }
      }),
    );
    let parts = parts(&[
      ("Debug", &[("GUI_PAGES_ENUM", "enum A {};".into()), ("NAME", "debug".into())]),
      ("Release", &[("NAME", "release".into())]),
    ]);
    let fs = MemoryFs::new();
    let output = OutputSections::new();

    emit(&fs, &output, &project, &parts).await;

    assert_eq!(fs.text(Path::new("/out/ids.h")).unwrap(), "// ids\nenum A {};\nrelease\n");
    assert_eq!(fs.text(Path::new("/out/Debug.txt")).unwrap(), "debug");
    assert_eq!(fs.text(Path::new("/out/Release.txt")).unwrap(), "release");
  }

  #[tokio::test]
  async fn map_is_written_and_announced_before_the_blob() {
    let project = project_at("demo", json!({ "settings": { "build": { "files": [{ "fileName": "assets.bin" }] } } }));
    let parts = parts(&[(
      "Debug",
      &[
        (GUI_ASSETS_DATA, PartValue::Bytes(b"EZAS".to_vec())),
        (GUI_ASSETS_DATA_MAP, "{}".into()),
      ],
    )]);
    let fs = MemoryFs::new();
    let output = OutputSections::new();

    emit(&fs, &output, &project, &parts).await;

    assert_eq!(fs.text(Path::new("/out/assets.bin.map")).unwrap(), "{}");
    assert_eq!(
      infos(&output),
      vec!["File \"/out/assets.bin.map\" builded", "File \"/out/assets.bin\" builded"]
    );
  }

  #[tokio::test]
  async fn missing_assets_data_is_a_build_error() {
    let project = project_at("demo", json!({ "settings": { "build": { "files": [{ "fileName": "assets.bin" }] } } }));
    let fs = MemoryFs::new();
    let output = OutputSections::new();

    let err = Emitter::new(&fs, &output, Path::new(DEST), Duration::from_millis(10))
      .emit(&project, &PartsByConfiguration::new(), "default")
      .await
      .unwrap_err();
    assert!(matches!(err, BuildError::Build { .. }));
    assert!(fs.paths().is_empty());
  }

  #[tokio::test]
  async fn dashboard_archive_and_manifest() {
    let project = project_at("panel", json!({ "settings": { "general": { "projectType": "dashboard" } } }));
    let parts = parts(&[("Debug", &[(GUI_ASSETS_DATA, PartValue::Bytes(vec![0xde, 0xad]))])]);
    let fs = MemoryFs::new();
    let output = OutputSections::new();

    let written = emit(&fs, &output, &project, &parts).await;
    assert_eq!(
      written,
      vec![PathBuf::from("/out/panel.eez-dashboard"), PathBuf::from("/out/panel.eez-project-build")]
    );

    let manifest = fs.text(Path::new("/out/panel.eez-project-build")).unwrap();
    assert_eq!(manifest, r#"{"assets":"3q0="}"#);

    let archive = fs.file(Path::new("/out/panel.eez-dashboard")).unwrap();
    let mut zip = zip::ZipArchive::new(Cursor::new(archive)).unwrap();
    let mut inner = String::new();
    zip
      .by_name("panel.eez-project-build")
      .unwrap()
      .read_to_string(&mut inner)
      .unwrap();
    assert_eq!(inner, manifest);
    let mut project_json = String::new();
    zip
      .by_name("panel.eez-project")
      .unwrap()
      .read_to_string(&mut project_json)
      .unwrap();
    assert!(project_json.contains("\"dashboard\""));
  }

  #[tokio::test]
  async fn master_resource_with_micropython() {
    let project = project_at(
      "res",
      json!({
        "settings": { "general": { "projectType": "resource", "masterProject": "../fw.eez-project" } },
        "micropython": { "code": "print('hi')\n" }
      }),
    );
    let parts = parts(&[("default", &[(GUI_ASSETS_DATA, PartValue::Bytes(vec![7]))])]);
    let fs = MemoryFs::new();
    let output = OutputSections::new();

    let written = emit(&fs, &output, &project, &parts).await;
    assert_eq!(written, vec![PathBuf::from("/out/res.res"), PathBuf::from("/out/res.py")]);
    assert_eq!(fs.text(Path::new("/out/res.py")).unwrap(), "print('hi')\n");
  }

  #[tokio::test]
  async fn master_applet() {
    let project = project_at(
      "game",
      json!({ "settings": { "general": { "projectType": "applet", "masterProject": "fw.eez-project" } } }),
    );
    let parts = parts(&[("default", &[(GUI_ASSETS_DATA, PartValue::Bytes(vec![7]))])]);
    let fs = MemoryFs::new();
    let output = OutputSections::new();

    assert_eq!(
      emit(&fs, &output, &project, &parts).await,
      vec![PathBuf::from("/out/game.app")]
    );
  }

  #[tokio::test]
  async fn lvgl_without_files_writes_program() {
    let project = project_at("ui", json!({ "settings": { "general": { "projectType": "LVGL" } } }));
    let parts = parts(&[("default", &[(MICROPYTHON_CODE, "import lvgl as lv\n".into())])]);
    let fs = MemoryFs::new();
    let output = OutputSections::new();

    assert_eq!(emit(&fs, &output, &project, &parts).await, vec![PathBuf::from("/out/ui.py")]);
    assert_eq!(fs.text(Path::new("/out/ui.py")).unwrap(), "import lvgl as lv\n");
  }

  #[tokio::test(start_paused = true)]
  async fn locked_file_is_retried() {
    let project = project_at("demo", json!({ "settings": { "build": { "files": [{ "fileName": "a.h", "template": "x" }] } } }));
    let fs = MemoryFs::new();
    fs.fail_writes(Path::new("/out/a.h"), 1);
    let output = OutputSections::new();

    emit(&fs, &output, &project, &PartsByConfiguration::new()).await;
    assert_eq!(fs.text(Path::new("/out/a.h")).unwrap(), "x");
    assert_eq!(fs.write_attempts(Path::new("/out/a.h")), 2);
  }

  #[tokio::test]
  async fn lvgl_without_program_is_a_build_error() {
    let project = project_at("ui", json!({ "settings": { "general": { "projectType": "LVGL" } } }));
    let fs = MemoryFs::new();
    let output = OutputSections::new();

    let err = Emitter::new(&fs, &output, Path::new(DEST), Duration::from_millis(10))
      .emit(&project, &parts(&[("default", &[])]), "default")
      .await
      .unwrap_err();
    assert_eq!(err.diagnostic().0, "MicroPython code for \"/out/ui.py\" was not built.");
    assert!(fs.paths().is_empty());
  }

  #[tokio::test]
  async fn strict_templates_reject_missing_parts() {
    let project = project_at(
      "demo",
      json!({ "settings": { "build": { "files": [{ "fileName": "a.h", "template": "//${eez-studio GUI_PAGES_ENUM}" }] } } }),
    );
    let parts = parts(&[("Debug", &[])]);
    let fs = MemoryFs::new();
    let output = OutputSections::new();

    let err = Emitter::new(&fs, &output, Path::new(DEST), Duration::from_millis(10))
      .strict_templates(true)
      .emit(&project, &parts, "Debug")
      .await
      .unwrap_err();
    assert!(matches!(err, BuildError::Template(TemplateError::MissingPart { .. })));
    assert_eq!(
      err.diagnostic().0,
      "Module build error: part 'GUI_PAGES_ENUM' is not produced for configuration 'Debug'"
    );
    assert!(fs.paths().is_empty());

    // Lenient rendering substitutes nothing.
    emit(&fs, &output, &project, &parts).await;
    assert_eq!(fs.text(Path::new("/out/a.h")).unwrap(), "");
  }

  #[test]
  fn map_path_appends_extension() {
    assert_eq!(
      append_extension(Path::new("/out/assets.bin"), ".map"),
      PathBuf::from("/out/assets.bin.map")
    );
  }
}
