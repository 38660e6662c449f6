//! Version control seam
//!
//! Everything mp needs from git goes through [`VersionControl`]. The production
//! backend is [`SystemGit`] (system git subprocesses); unit tests substitute an
//! in-memory fake.

#[cfg(test)]
pub mod fake;
pub mod system_git;
mod system_git_ops;

pub use system_git::SystemGit;

use crate::core::error::MpResult;
use std::fmt;
use std::path::{Path, PathBuf};

/// A commit located by history search
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CommitRef(String);

impl CommitRef {
  pub fn new(sha: impl Into<String>) -> Self {
    Self(sha.into())
  }

  pub fn sha(&self) -> &str {
    &self.0
  }

  /// First 7 characters, for human output
  pub fn short(&self) -> &str {
    self.0.get(..7).unwrap_or(&self.0)
  }
}

impl fmt::Display for CommitRef {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// Git operations used by validation and packaging
///
/// All paths are relative to the work tree root.
pub trait VersionControl: Send + Sync {
  /// Root of the working tree
  fn work_tree(&self) -> &Path;

  /// Most recent commit (across all refs) whose diff adds `"Version": <version>` to `path`
  fn find_commit_introducing(&self, path: &Path, version: &str) -> MpResult<Option<CommitRef>>;

  /// Current branch name, or `None` when HEAD is detached
  fn current_branch(&self) -> MpResult<Option<String>>;

  fn head_commit(&self) -> MpResult<String>;

  fn has_uncommitted_changes(&self) -> MpResult<bool>;

  /// Stash tracked changes; returns whether a stash entry was actually created
  fn stash(&self) -> MpResult<bool>;

  fn stash_pop(&self) -> MpResult<()>;

  /// Remove untracked files and directories, sparing `excludes`
  fn clean_untracked(&self, excludes: &[PathBuf]) -> MpResult<()>;

  fn fetch_all(&self) -> MpResult<()>;

  /// Fetch a single commit from a remote (for commits no local ref reaches)
  fn fetch_commit(&self, remote: &str, commit: &CommitRef) -> MpResult<()>;

  /// Check out a branch name or commit SHA
  fn checkout(&self, target: &str) -> MpResult<()>;

  /// Discard working tree modifications to `path`
  fn restore(&self, path: &Path) -> MpResult<()>;

  /// Contents of `path` at `reference`
  ///
  /// A path absent on the reference yields `GitError::FileNotFoundOnBranch`.
  fn read_file_at(&self, reference: &str, path: &Path) -> MpResult<String>;

  /// Paths that differ between `base` and the working tree
  fn changed_paths(&self, base: &str) -> MpResult<Vec<PathBuf>>;
}
