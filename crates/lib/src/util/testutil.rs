//! Test utilities for studio-build-lib.
//!
//! An in-memory [`FileSystem`] with write-failure injection, and a few
//! project fixtures shared by the build and check tests.

use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde_json::Value;

use crate::build::fs::FileSystem;
use crate::project::Project;

#[derive(Debug, Default)]
struct MemoryState {
  files: BTreeMap<PathBuf, Vec<u8>>,
  folders: BTreeSet<PathBuf>,
  pending_failures: BTreeMap<PathBuf, usize>,
  attempts: BTreeMap<PathBuf, usize>,
}

/// In-memory file system. Folders must be created (or pre-seeded) before
/// `exists` reports them.
#[derive(Debug, Clone, Default)]
pub struct MemoryFs {
  state: Arc<Mutex<MemoryState>>,
}

impl MemoryFs {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_folder(self, path: impl Into<PathBuf>) -> Self {
    self.state.lock().unwrap().folders.insert(path.into());
    self
  }

  /// Make the next `count` writes to `path` fail.
  pub fn fail_writes(&self, path: &Path, count: usize) {
    self.state.lock().unwrap().pending_failures.insert(path.to_path_buf(), count);
  }

  pub fn file(&self, path: &Path) -> Option<Vec<u8>> {
    self.state.lock().unwrap().files.get(path).cloned()
  }

  pub fn text(&self, path: &Path) -> Option<String> {
    self.file(path).map(|b| String::from_utf8_lossy(&b).into_owned())
  }

  pub fn paths(&self) -> Vec<PathBuf> {
    self.state.lock().unwrap().files.keys().cloned().collect()
  }

  pub fn write_attempts(&self, path: &Path) -> usize {
    self.state.lock().unwrap().attempts.get(path).copied().unwrap_or(0)
  }

  fn store(&self, path: &Path, data: Vec<u8>) -> io::Result<()> {
    let mut state = self.state.lock().unwrap();
    *state.attempts.entry(path.to_path_buf()).or_default() += 1;
    if let Some(remaining) = state.pending_failures.get_mut(path) {
      if *remaining > 0 {
        *remaining -= 1;
        return Err(io::Error::new(io::ErrorKind::PermissionDenied, "file is locked"));
      }
    }
    state.files.insert(path.to_path_buf(), data);
    Ok(())
  }
}

impl FileSystem for MemoryFs {
  async fn read_text(&self, path: &Path) -> io::Result<String> {
    self
      .text(path)
      .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such file"))
  }

  async fn write_text(&self, path: &Path, text: &str) -> io::Result<()> {
    self.store(path, text.as_bytes().to_vec())
  }

  async fn write_binary(&self, path: &Path, data: &[u8]) -> io::Result<()> {
    self.store(path, data.to_vec())
  }

  async fn make_folder(&self, path: &Path) -> io::Result<()> {
    self.state.lock().unwrap().folders.insert(path.to_path_buf());
    Ok(())
  }

  async fn exists(&self, path: &Path) -> bool {
    let state = self.state.lock().unwrap();
    state.folders.contains(path) || state.files.contains_key(path)
  }
}

/// A project loaded from `value`, as if read from `/work/<name>.eez-project`.
pub fn project_at(name: &str, value: Value) -> Project {
  Project::from_value(value, Some(PathBuf::from(format!("/work/{name}.eez-project"))))
    .expect("fixture project must parse")
}
