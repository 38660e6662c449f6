//! Progress indicators for batch operations
//!
//! Uses `linya` for allocation-free, concurrency-optimized progress bars.
//! Bars are drawn to stderr only when it is a terminal, so piped and `--json`
//! output stays clean.

use linya::{Bar, Progress};
use std::io::IsTerminal;
use std::sync::Mutex;

/// Thread-safe single bar for per-integration batch work
pub struct BatchProgress {
  inner: Option<(Mutex<Progress>, Bar)>,
}

impl BatchProgress {
  /// Create a bar, or a silent no-op when `enabled` is false or stderr is not a terminal
  pub fn new(total: usize, label: impl Into<String>, enabled: bool) -> Self {
    if !enabled || total < 2 || !std::io::stderr().is_terminal() {
      return Self { inner: None };
    }
    let mut progress = Progress::new();
    let bar = progress.bar(total, label.into());
    Self {
      inner: Some((Mutex::new(progress), bar)),
    }
  }

  /// Increment by 1 (callable from rayon workers)
  pub fn inc(&self) {
    if let Some((progress, bar)) = &self.inner
      && let Ok(mut progress) = progress.lock()
    {
      progress.inc_and_draw(bar, 1);
    }
  }
}
