//! File-system adapter used by the emission stage.
//!
//! The orchestrator only talks to the disk through [`FileSystem`], so tests
//! can substitute an in-memory implementation and inject write failures.

use std::future::Future;
use std::io;
use std::path::Path;
use std::time::Duration;

use tracing::{debug, warn};

use super::BuildError;

pub trait FileSystem: Send + Sync {
  fn read_text(&self, path: &Path) -> impl Future<Output = io::Result<String>> + Send;

  fn write_text(&self, path: &Path, text: &str) -> impl Future<Output = io::Result<()>> + Send;

  fn write_binary(&self, path: &Path, data: &[u8]) -> impl Future<Output = io::Result<()>> + Send;

  /// Create `path` and any missing parents.
  fn make_folder(&self, path: &Path) -> impl Future<Output = io::Result<()>> + Send;

  fn exists(&self, path: &Path) -> impl Future<Output = bool> + Send;
}

/// The local disk, through `tokio::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl FileSystem for LocalFs {
  async fn read_text(&self, path: &Path) -> io::Result<String> {
    tokio::fs::read_to_string(path).await
  }

  async fn write_text(&self, path: &Path, text: &str) -> io::Result<()> {
    tokio::fs::write(path, text).await
  }

  async fn write_binary(&self, path: &Path, data: &[u8]) -> io::Result<()> {
    tokio::fs::write(path, data).await
  }

  async fn make_folder(&self, path: &Path) -> io::Result<()> {
    tokio::fs::create_dir_all(path).await
  }

  async fn exists(&self, path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
  }
}

/// What to write: template output goes through the text path, everything
/// else is raw bytes.
#[derive(Debug, Clone, Copy)]
pub enum FileContents<'a> {
  Text(&'a str),
  Binary(&'a [u8]),
}

async fn write_once<F: FileSystem>(fs: &F, path: &Path, contents: FileContents<'_>) -> io::Result<()> {
  match contents {
    FileContents::Text(text) => fs.write_text(path, text).await,
    FileContents::Binary(data) => fs.write_binary(path, data).await,
  }
}

/// Write a file, retrying exactly once after `retry_delay` if the first
/// attempt fails (a locked file, typically).
pub async fn write_with_retry<F: FileSystem>(
  fs: &F,
  path: &Path,
  contents: FileContents<'_>,
  retry_delay: Duration,
) -> Result<(), BuildError> {
  match write_once(fs, path, contents).await {
    Ok(()) => Ok(()),
    Err(first) => {
      warn!(path = ?path, error = %first, "write failed, retrying once");
      tokio::time::sleep(retry_delay).await;
      write_once(fs, path, contents).await.map_err(|source| {
        debug!(path = ?path, error = %source, "retry failed");
        BuildError::Write {
          path: path.to_path_buf(),
          source,
        }
      })
    }
  }
}
