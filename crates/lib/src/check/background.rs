//! Debounced background checking.
//!
//! Each [`BackgroundChecker::schedule`] call supersedes the pending one: the
//! earlier task is aborted and a new one waits out the idle window before
//! running the pass and publishing to `CHECKS`.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

use super::CheckPass;
use crate::config::StudioConfig;
use crate::output::{OutputSections, Section};
use crate::project::ObjectNode;

pub struct BackgroundChecker {
  pass: Arc<CheckPass>,
  output: OutputSections,
  debounce: Duration,
  pending: Mutex<Option<JoinHandle<()>>>,
}

impl BackgroundChecker {
  pub fn new(pass: Arc<CheckPass>, output: OutputSections, debounce: Duration) -> Self {
    Self {
      pass,
      output,
      debounce,
      pending: Mutex::new(None),
    }
  }

  /// A checker using the configured idle window.
  pub fn from_config(pass: Arc<CheckPass>, output: OutputSections, config: &StudioConfig) -> Self {
    Self::new(pass, output, config.check_debounce)
  }

  pub fn debounce(&self) -> Duration {
    self.debounce
  }

  fn pending(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
    self.pending.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// Check `root` once the idle window passes without another request.
  ///
  /// Must be called from within a tokio runtime.
  pub fn schedule(&self, root: Arc<ObjectNode>) {
    let mut pending = self.pending();
    if let Some(previous) = pending.take() {
      if !previous.is_finished() {
        debug!("superseding pending background check");
      }
      previous.abort();
    }

    self.output.set_loading(Section::Checks, true);

    let pass = Arc::clone(&self.pass);
    let output = self.output.clone();
    let debounce = self.debounce;
    *pending = Some(tokio::spawn(async move {
      tokio::time::sleep(debounce).await;
      let messages = pass.check(&root);
      output.set_messages(Section::Checks, messages);
      output.set_loading(Section::Checks, false);
    }));
  }

  /// Drop the pending request, if any, without publishing.
  pub fn cancel(&self) {
    if let Some(previous) = self.pending().take() {
      previous.abort();
    }
    self.output.set_loading(Section::Checks, false);
  }

  /// Wait for the pending request to publish its result.
  pub async fn flush(&self) {
    let handle = self.pending().take();
    if let Some(handle) = handle {
      // An aborted task simply has nothing to publish.
      let _ = handle.await;
    }
  }
}

impl Drop for BackgroundChecker {
  fn drop(&mut self) {
    if let Some(handle) = self.pending().take() {
      handle.abort();
    }
  }
}
