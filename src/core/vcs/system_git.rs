//! System git backend
//!
//! Every operation is one `git` subprocess:
//! - Isolated environment (only PATH and HOME survive)
//! - Safe configuration overrides on every call
//! - Non-zero exits become `GitError::CommandFailed` with the captured stderr

use crate::core::error::{GitError, MpError, MpResult, ResultExt};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Git backend using system git
pub struct SystemGit {
  /// Working tree root
  pub(crate) work_tree: PathBuf,
}

impl SystemGit {
  /// Open the git repository containing `path`
  pub fn open(path: &Path) -> MpResult<Self> {
    let output = Command::new("git")
      .arg("-C")
      .arg(path)
      .args(["rev-parse", "--show-toplevel"])
      .output()
      .context("Failed to execute git rev-parse")?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      if stderr.contains("not a git repository") || !path.exists() {
        return Err(MpError::Git(GitError::RepoNotFound {
          path: path.to_path_buf(),
        }));
      }
      return Err(MpError::message(format!("Failed to open git repository: {}", stderr)));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let work_tree = PathBuf::from(stdout.trim());
    tracing::debug!(work_tree = %work_tree.display(), "opened git repository");

    Ok(Self { work_tree })
  }

  /// Create a safe git command with isolated environment
  ///
  /// - Runs in the work tree root, so relative paths are root-relative
  /// - Clears environment variables
  /// - Whitelists only PATH and HOME
  /// - Adds safe configuration overrides
  pub(crate) fn git_cmd(&self) -> Command {
    let mut cmd = Command::new("git");

    cmd.arg("-C").arg(&self.work_tree);

    // Isolated environment (don't trust global config)
    cmd.env_clear();
    if let Ok(path) = std::env::var("PATH") {
      cmd.env("PATH", path);
    }
    if let Ok(home) = std::env::var("HOME") {
      cmd.env("HOME", home);
    }

    // Force safe behavior (override user config)
    cmd.arg("-c").arg("protocol.version=2");
    cmd.arg("-c").arg("advice.detachedHead=false");
    cmd.arg("-c").arg("core.quotePath=false"); // Don't escape non-ASCII

    cmd
  }

  /// Run git with `args`, failing on a non-zero exit
  pub(crate) fn run(&self, args: &[&str]) -> MpResult<Output> {
    let output = self.run_unchecked(args)?;
    if !output.status.success() {
      return Err(command_failed(args, &output));
    }
    Ok(output)
  }

  /// Run git with `args`, leaving exit status interpretation to the caller
  pub(crate) fn run_unchecked(&self, args: &[&str]) -> MpResult<Output> {
    tracing::debug!(command = %display_command(args), "running git");
    self
      .git_cmd()
      .args(args)
      .output()
      .with_context(|| format!("Failed to execute {}", display_command(args)))
  }

  /// Run git and return trimmed stdout
  pub(crate) fn run_stdout(&self, args: &[&str]) -> MpResult<String> {
    let output = self.run(args)?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
  }
}

pub(crate) fn display_command(args: &[&str]) -> String {
  format!("git {}", args.join(" "))
}

pub(crate) fn command_failed(args: &[&str], output: &Output) -> MpError {
  MpError::Git(GitError::CommandFailed {
    command: display_command(args),
    stderr: String::from_utf8_lossy(&output.stderr).to_string(),
  })
}

/// Whether `git show <ref>:<path>` failed because the path is absent on the reference
pub(crate) fn is_missing_path(stderr: &str) -> bool {
  stderr.contains("does not exist") || stderr.contains("exists on disk, but not in")
}
