//! In-memory VersionControl for unit tests
//!
//! Records every call as a git-like command line and fails the ones listed in
//! `failing`, so cleanup paths can be exercised without a repository.

use super::{CommitRef, VersionControl};
use crate::core::error::{GitError, MpError, MpResult};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub struct FakeVcs {
  pub work_tree: PathBuf,
  pub branch: Option<String>,
  pub head: String,
  pub dirty: bool,
  pub introducing: Option<CommitRef>,
  /// Files readable through `read_file_at`, keyed by (reference, path)
  pub files: HashMap<(String, PathBuf), String>,
  pub changed: Vec<PathBuf>,
  /// Calls that fail, e.g. "checkout main" or "stash pop"
  pub failing: HashSet<String>,
  calls: Mutex<Vec<String>>,
}

impl FakeVcs {
  pub fn new(work_tree: &Path) -> Self {
    Self {
      work_tree: work_tree.to_path_buf(),
      branch: Some("main".to_string()),
      head: "0000000000000000000000000000000000000000".to_string(),
      dirty: false,
      introducing: None,
      files: HashMap::new(),
      changed: Vec::new(),
      failing: HashSet::new(),
      calls: Mutex::new(Vec::new()),
    }
  }

  pub fn with_file(mut self, reference: &str, path: impl Into<PathBuf>, content: &str) -> Self {
    self.files.insert((reference.to_string(), path.into()), content.to_string());
    self
  }

  pub fn failing_on(mut self, call: &str) -> Self {
    self.failing.insert(call.to_string());
    self
  }

  pub fn calls(&self) -> Vec<String> {
    self.calls.lock().map(|c| c.clone()).unwrap_or_default()
  }

  fn record(&self, call: String) -> MpResult<()> {
    if let Ok(mut calls) = self.calls.lock() {
      calls.push(call.clone());
    }
    if self.failing.contains(&call) {
      return Err(MpError::Git(GitError::CommandFailed {
        command: format!("git {}", call),
        stderr: "simulated failure".to_string(),
      }));
    }
    Ok(())
  }
}

impl VersionControl for FakeVcs {
  fn work_tree(&self) -> &Path {
    &self.work_tree
  }

  fn find_commit_introducing(&self, path: &Path, version: &str) -> MpResult<Option<CommitRef>> {
    self.record(format!("log {} {}", path.display(), version))?;
    Ok(self.introducing.clone())
  }

  fn current_branch(&self) -> MpResult<Option<String>> {
    self.record("rev-parse --abbrev-ref HEAD".to_string())?;
    Ok(self.branch.clone())
  }

  fn head_commit(&self) -> MpResult<String> {
    self.record("rev-parse HEAD".to_string())?;
    Ok(self.head.clone())
  }

  fn has_uncommitted_changes(&self) -> MpResult<bool> {
    self.record("status".to_string())?;
    Ok(self.dirty)
  }

  fn stash(&self) -> MpResult<bool> {
    self.record("stash".to_string())?;
    Ok(self.dirty)
  }

  fn stash_pop(&self) -> MpResult<()> {
    self.record("stash pop".to_string())
  }

  fn clean_untracked(&self, _excludes: &[PathBuf]) -> MpResult<()> {
    self.record("clean".to_string())
  }

  fn fetch_all(&self) -> MpResult<()> {
    self.record("fetch --all".to_string())
  }

  fn fetch_commit(&self, remote: &str, commit: &CommitRef) -> MpResult<()> {
    self.record(format!("fetch {} {}", remote, commit))
  }

  fn checkout(&self, target: &str) -> MpResult<()> {
    self.record(format!("checkout {}", target))
  }

  fn restore(&self, path: &Path) -> MpResult<()> {
    self.record(format!("restore {}", path.display()))
  }

  fn read_file_at(&self, reference: &str, path: &Path) -> MpResult<String> {
    self.record(format!("show {}:{}", reference, path.display()))?;
    self
      .files
      .get(&(reference.to_string(), path.to_path_buf()))
      .cloned()
      .ok_or_else(|| {
        MpError::Git(GitError::FileNotFoundOnBranch {
          path: path.to_path_buf(),
          reference: reference.to_string(),
        })
      })
  }

  fn changed_paths(&self, base: &str) -> MpResult<Vec<PathBuf>> {
    self.record(format!("diff --name-only {}", base))?;
    Ok(self.changed.clone())
  }
}
